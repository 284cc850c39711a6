//! Serial number normalization.
//!
//! Raw identifiers typed by users or taken from file names are reduced to one
//! canonical lookup key. Three numbering conventions are recognized, tried in
//! a fixed order where the first match wins:
//!
//! 1. FC2 pay-per-view numbers (`FC2-PPV-3076281`)
//! 2. studio codes (`ABC-123`)
//! 3. date-coded uncensored catalogs (`010124_123`)
//!
//! Anything else is unrecognized, which is a normal outcome rather than an
//! error.

pub mod recognizers;

use chrono::Datelike;
use tracing::debug;

pub use recognizers::{
    CensoredRecognizer, DateCodedRecognizer, Fc2Recognizer, Recognizer, SerialKind, SerialMatch,
};

use crate::observability::metrics;

/// Trim surrounding whitespace and uppercase
pub fn clean_serial_no(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Ordered recognizer pipeline.
///
/// The parser is a plain value: it holds no mutable state and can be shared
/// freely between tasks.
#[derive(Debug, Clone, Copy)]
pub struct SerialNoParser {
    fc2: Fc2Recognizer,
    censored: CensoredRecognizer,
    date_coded: DateCodedRecognizer,
}

impl Default for SerialNoParser {
    fn default() -> Self {
        Self::new()
    }
}

impl SerialNoParser {
    /// Parser whose date guard uses the current local year
    pub fn new() -> Self {
        Self::with_reference_year(chrono::Local::now().year())
    }

    /// Parser with a pinned reference year for the date-coded guard
    pub fn with_reference_year(year: i32) -> Self {
        Self {
            fc2: Fc2Recognizer::new(false),
            censored: CensoredRecognizer,
            date_coded: DateCodedRecognizer::new(year),
        }
    }

    /// Treat bare 6-7 digit input as an FC2 number by default
    pub fn extend_fc2_from_no(mut self, enabled: bool) -> Self {
        self.fc2.extend_from_no = enabled;
        self
    }

    pub fn reference_year(&self) -> i32 {
        self.date_coded.reference_year
    }

    fn recognizers(&self) -> [&dyn Recognizer; 3] {
        [&self.fc2, &self.censored, &self.date_coded]
    }

    /// Canonical serial number for `raw`, or `None` when unrecognized
    pub fn parse(&self, raw: &str) -> Option<String> {
        self.classify(raw).map(|m| m.canonical())
    }

    /// Like [`parse`](Self::parse) with a per-call FC2 fallback setting
    pub fn parse_with(&self, raw: &str, extend_fc2_from_no: bool) -> Option<String> {
        self.extend_fc2_from_no(extend_fc2_from_no).parse(raw)
    }

    /// Recognize `raw` and keep the matched parts
    pub fn classify(&self, raw: &str) -> Option<SerialMatch> {
        let cleaned = clean_serial_no(raw);

        for recognizer in self.recognizers() {
            if let Some(found) = recognizer.try_match(&cleaned) {
                debug!(raw, recognizer = recognizer.name(), canonical = %found, "serial number recognized");
                metrics::serial_no::recognized(recognizer.name());
                return Some(found);
            }
        }

        debug!(raw, "serial number not recognized");
        metrics::serial_no::unrecognized();
        None
    }
}

/// Parse with the current year and an explicit FC2 fallback setting
pub fn parse_serial_no(raw: &str, extend_fc2_from_no: bool) -> Option<String> {
    SerialNoParser::new().parse_with(raw, extend_fc2_from_no)
}
