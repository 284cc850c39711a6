use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

// Separator accepted between prefix and number: space, hyphen or underscore.
const SEP: &str = "[ _-]";

// FC2 prefixes, most specific first; `??` keeps the separator optional but lazy.
static FC2_PATTERN: Lazy<Regex> = Lazy::new(|| {
    let prefixes = [
        format!("FC2{SEP}??PPV"),
        format!("FC{SEP}??PPV"),
        "FC2".to_string(),
        "FC".to_string(),
    ]
    .join("|");
    Regex::new(&format!("({prefixes}){SEP}??([0-9]{{6,7}})")).unwrap()
});

static FC2_BARE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{6,7}$").unwrap());

// `(?:^|[^A-Za-z])` stands in for a "not preceded by a letter" lookbehind.
static CENSORED_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        "(?:^|[^A-Za-z])([A-Z]{{3,5}}){SEP}??([0-9]{{3,4}})"
    ))
    .unwrap()
});

// mmddyy, a mandatory separator, then a three digit number.
static DATE_CODED_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        "(?:^|[^0-9])([01][0-9][0-3][0-9][0-3][0-9]){SEP}([0-9]{{3}})"
    ))
    .unwrap()
});

/// Numbering convention a canonical serial number belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SerialKind {
    /// `FC2-PPV-1234567`
    Fc2,
    /// Studio code such as `ABC-123`
    Censored,
    /// Release-date keyed catalogs such as `010124_123`
    Uncensored,
}

impl SerialKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SerialKind::Fc2 => "fc2",
            SerialKind::Censored => "censored",
            SerialKind::Uncensored => "uncensored",
        }
    }
}

impl fmt::Display for SerialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recognized serial number split into its parts
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SerialMatch {
    pub kind: SerialKind,
    pub prefix: String,
    pub number: String,
}

impl SerialMatch {
    pub fn new(kind: SerialKind, prefix: impl Into<String>, number: impl Into<String>) -> Self {
        Self {
            kind,
            prefix: prefix.into(),
            number: number.into(),
        }
    }

    /// The lookup key every source client expects
    pub fn canonical(&self) -> String {
        match self.kind {
            SerialKind::Fc2 | SerialKind::Censored => format!("{}-{}", self.prefix, self.number),
            SerialKind::Uncensored => format!("{}_{}", self.prefix, self.number),
        }
    }
}

impl fmt::Display for SerialMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

/// One numbering convention. Input is already trimmed and uppercased.
pub trait Recognizer: Send + Sync {
    fn name(&self) -> &'static str;

    fn try_match(&self, cleaned: &str) -> Option<SerialMatch>;
}

/// FC2 pay-per-view numbers, with or without the `FC2-PPV` prefix text
#[derive(Debug, Clone, Copy, Default)]
pub struct Fc2Recognizer {
    /// Accept a bare 6-7 digit string as an FC2 number
    pub extend_from_no: bool,
}

impl Fc2Recognizer {
    pub fn new(extend_from_no: bool) -> Self {
        Self { extend_from_no }
    }
}

impl Recognizer for Fc2Recognizer {
    fn name(&self) -> &'static str {
        "fc2"
    }

    fn try_match(&self, cleaned: &str) -> Option<SerialMatch> {
        if let Some(caps) = FC2_PATTERN.captures(cleaned) {
            return Some(SerialMatch::new(SerialKind::Fc2, "FC2-PPV", &caps[2]));
        }

        if self.extend_from_no && FC2_BARE_NUMBER.is_match(cleaned) {
            return Some(SerialMatch::new(SerialKind::Fc2, "FC2-PPV", cleaned));
        }

        None
    }
}

/// Studio-code serials: 3-5 letters then 3-4 digits
#[derive(Debug, Clone, Copy, Default)]
pub struct CensoredRecognizer;

impl Recognizer for CensoredRecognizer {
    fn name(&self) -> &'static str {
        "censored"
    }

    fn try_match(&self, cleaned: &str) -> Option<SerialMatch> {
        let caps = CENSORED_PATTERN.captures(cleaned)?;
        Some(SerialMatch::new(SerialKind::Censored, &caps[1], &caps[2]))
    }
}

/// Date-coded uncensored serials (`mmddyy_nnn`).
///
/// The last two prefix digits are read as a year. A year beyond
/// `reference_year` means the digits only look like a date, so the input is
/// rejected. The reference year is injected; callers that want wall-clock
/// behavior pass the current year.
#[derive(Debug, Clone, Copy)]
pub struct DateCodedRecognizer {
    pub reference_year: i32,
}

impl DateCodedRecognizer {
    pub fn new(reference_year: i32) -> Self {
        Self { reference_year }
    }

    fn year_suffix(&self) -> u32 {
        self.reference_year.rem_euclid(100) as u32
    }
}

impl Recognizer for DateCodedRecognizer {
    fn name(&self) -> &'static str {
        "uncensored"
    }

    fn try_match(&self, cleaned: &str) -> Option<SerialMatch> {
        let caps = DATE_CODED_PATTERN.captures(cleaned)?;
        let prefix = &caps[1];

        let year: u32 = prefix[4..].parse().ok()?;
        if year > self.year_suffix() {
            tracing::debug!(prefix, year, "rejecting date-coded serial with future year");
            return None;
        }

        Some(SerialMatch::new(SerialKind::Uncensored, prefix, &caps[2]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fc2(input: &str) -> Option<String> {
        Fc2Recognizer::new(false).try_match(input).map(|m| m.canonical())
    }

    fn censored(input: &str) -> Option<String> {
        CensoredRecognizer.try_match(input).map(|m| m.canonical())
    }

    fn dated(input: &str, year: i32) -> Option<String> {
        DateCodedRecognizer::new(year).try_match(input).map(|m| m.canonical())
    }

    #[test]
    fn fc2_accepts_every_prefix_variant() {
        for prefix in ["FC2PPV", "FC2-PPV", "FC2_PPV", "FC2 PPV", "FCPPV", "FC-PPV", "FC2", "FC"] {
            for sep in ["", "-", "_", " "] {
                let input = format!("{prefix}{sep}3076281");
                assert_eq!(fc2(&input).as_deref(), Some("FC2-PPV-3076281"), "input {input}");
            }
        }
    }

    #[test]
    fn fc2_six_digit_numbers() {
        assert_eq!(fc2("FC2-PPV-123456").as_deref(), Some("FC2-PPV-123456"));
    }

    #[test]
    fn fc2_matches_inside_longer_text() {
        assert_eq!(
            fc2("[UPLOAD] FC2-PPV-1234567 HD.MP4").as_deref(),
            Some("FC2-PPV-1234567")
        );
    }

    #[test]
    fn fc2_requires_six_digits() {
        assert_eq!(fc2("FC2-PPV-12345"), None);
    }

    #[test]
    fn fc2_bare_number_needs_opt_in() {
        assert_eq!(fc2("3076281"), None);
        let extended = Fc2Recognizer::new(true).try_match("3076281").unwrap();
        assert_eq!(extended.canonical(), "FC2-PPV-3076281");
        assert_eq!(extended.kind, SerialKind::Fc2);
    }

    #[test]
    fn fc2_bare_number_is_full_string_only() {
        let recognizer = Fc2Recognizer::new(true);
        assert!(recognizer.try_match("12345").is_none());
        assert!(recognizer.try_match("12345678").is_none());
        assert!(recognizer.try_match("X3076281").is_none());
    }

    #[test]
    fn censored_inserts_hyphen() {
        assert_eq!(censored("ABC123").as_deref(), Some("ABC-123"));
        assert_eq!(censored("ABC-123").as_deref(), Some("ABC-123"));
        assert_eq!(censored("ABC_123").as_deref(), Some("ABC-123"));
        assert_eq!(censored("ABC 123").as_deref(), Some("ABC-123"));
        assert_eq!(censored("ABCDE-1234").as_deref(), Some("ABCDE-1234"));
    }

    #[test]
    fn censored_rejects_near_misses() {
        assert_eq!(censored("AB-123"), None);
        assert_eq!(censored("ABCDE-12"), None);
        assert_eq!(censored("ABCDEF-123"), None);
        assert_eq!(censored("ABC--123"), None);
    }

    #[test]
    fn censored_finds_code_after_non_letters() {
        assert_eq!(censored("[HD]SSIS-001.MP4").as_deref(), Some("SSIS-001"));
        assert_eq!(censored("1080P_IPX-177").as_deref(), Some("IPX-177"));
    }

    #[test]
    fn censored_takes_first_four_digits() {
        assert_eq!(censored("ABC-12345").as_deref(), Some("ABC-1234"));
    }

    #[test]
    fn date_coded_uses_underscore() {
        assert_eq!(dated("010124 123", 2025).as_deref(), Some("010124_123"));
        assert_eq!(dated("010124-123", 2025).as_deref(), Some("010124_123"));
        assert_eq!(dated("010124_123", 2025).as_deref(), Some("010124_123"));
    }

    #[test]
    fn date_coded_requires_separator() {
        assert_eq!(dated("010124123", 2025), None);
    }

    #[test]
    fn date_coded_rejects_future_year() {
        assert_eq!(dated("010199-123", 2025), None);
        assert_eq!(dated("010126-123", 2025), None);
        assert_eq!(dated("010125-123", 2025).as_deref(), Some("010125_123"));
    }

    #[test]
    fn date_coded_guard_moves_with_reference_year() {
        assert_eq!(dated("010126-123", 2026).as_deref(), Some("010126_123"));
    }

    #[test]
    fn date_coded_shape_is_enforced() {
        // month must start with 0 or 1
        assert_eq!(dated("210124-123", 2025), None);
        // not preceded by another digit
        assert_eq!(dated("9010124-123", 2025), None);
    }

    #[test]
    fn kind_names() {
        assert_eq!(SerialKind::Fc2.to_string(), "fc2");
        assert_eq!(SerialKind::Uncensored.as_str(), "uncensored");
    }
}
