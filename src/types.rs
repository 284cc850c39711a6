use crate::error::{Result, ScraperError};
use crate::serial_no::SerialKind;
use chrono::NaiveDate;
use image::DynamicImage;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Lightweight search result returned by a source's keyword search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JavRecord {
    /// Serial number the source associates with this result
    pub keyword: String,
    pub title: String,
    /// Detail page URL, or a source-specific video id
    pub url: String,
}

impl JavRecord {
    pub fn new(keyword: impl Into<String>, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            title: title.into(),
            url: url.into(),
        }
    }
}

/// Metadata every source client converges on
#[derive(Debug, Clone, Default)]
pub struct JavInfo {
    pub serial_no: String,
    raw_title: String,
    title: OnceCell<String>,
    pub casts: BTreeSet<String>,
    pub publish_date: String,
    pub thumbnail: Option<DynamicImage>,
    /// Running time in seconds
    pub length: Option<u32>,
    pub maker: String,
    pub publisher: String,
    pub director: String,
    pub series: String,
    pub source: String,
}

impl JavInfo {
    pub fn new(serial_no: impl Into<String>, raw_title: impl Into<String>) -> Self {
        Self {
            serial_no: serial_no.into(),
            raw_title: raw_title.into(),
            ..Default::default()
        }
    }

    /// Title with the embedded serial number removed
    pub fn title(&self) -> &str {
        self.title.get_or_init(|| {
            if self.serial_no.is_empty() {
                return self.raw_title.trim().to_string();
            }
            self.raw_title.replace(&self.serial_no, "").trim().to_string()
        })
    }

    /// Title as scraped, before the serial number is stripped
    pub fn raw_title(&self) -> &str {
        &self.raw_title
    }

    pub fn with_casts<I, S>(mut self, casts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.casts = casts.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_publish_date(mut self, publish_date: impl Into<String>) -> Self {
        self.publish_date = publish_date.into();
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Publish date as a calendar day, when the source used a known format
    pub fn publish_day(&self) -> Option<NaiveDate> {
        let date = self.publish_date.trim();
        ["%Y-%m-%d", "%Y/%m/%d"]
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(date, format).ok())
    }

    /// Multi-line report
    pub fn summary(&self) -> String {
        [
            format!("Publish Date: {}", self.publish_date),
            format!("Serial No   : {}", self.serial_no),
            format!("Publisher   : {}", self.publisher),
            format!("Title       : {}", self.title()),
            format!("Casts       : {:?}", self.casts),
        ]
        .join("\n")
    }

    /// JSON view; the thumbnail is reduced to a flag
    pub fn to_json(&self) -> Value {
        json!({
            "serial_no": self.serial_no,
            "title": self.title(),
            "casts": self.casts,
            "publish_date": self.publish_date,
            "length": self.length,
            "maker": self.maker,
            "publisher": self.publisher,
            "director": self.director,
            "series": self.series,
            "source": self.source,
            "has_thumbnail": self.thumbnail.is_some(),
        })
    }
}

impl fmt::Display for JavInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let casts: Vec<&str> = self.casts.iter().map(String::as_str).collect();
        write!(
            f,
            "{} {} {} ({})",
            self.publish_date,
            self.serial_no,
            self.title(),
            casts.join("&")
        )
    }
}

/// Page language; picks which label text a client looks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Traditional Chinese
    Zh,
    /// Simplified Chinese
    Cn,
    #[default]
    Ja,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Zh => "zh",
            Language::Cn => "cn",
            Language::Ja => "ja",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = ScraperError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "zh" => Ok(Language::Zh),
            "cn" => Ok(Language::Cn),
            "ja" => Ok(Language::Ja),
            other => Err(ScraperError::UnsupportedLanguage(other.to_string())),
        }
    }
}

/// Core trait that every metadata source implements
#[async_trait::async_trait]
pub trait VideoApi: Send + Sync {
    /// Display name of the source
    fn source(&self) -> &'static str;

    /// Base URL requests are built from
    fn url_domain(&self) -> &'static str;

    fn language(&self) -> Language;

    fn set_language(&mut self, lang: Language);

    fn url_domain_lang(&self) -> String {
        format!("{}/{}", self.url_domain(), self.language())
    }

    /// Whether this source carries serials of the given kind
    fn supports(&self, _kind: SerialKind) -> bool {
        true
    }

    /// Candidate records for a keyword
    async fn search_by_keyword(&self, keyword: &str) -> Result<Vec<JavRecord>>;

    /// Detail for a canonical serial number, `None` when the source has no such video
    async fn get_video_detail(&self, serial_no: &str, with_thumbnail: bool) -> Result<Option<JavInfo>>;
}
