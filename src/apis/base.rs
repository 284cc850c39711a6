use crate::app::ports::{HttpClientPort, HttpGetResult, Redirects};
use crate::error::{Result, ScraperError};
use crate::types::Language;
use image::DynamicImage;
use scraper::{ElementRef, Selector};
use std::sync::Arc;
use tracing::{debug, instrument};

/// State every source client shares: the HTTP port and the page language
#[derive(Clone)]
pub struct BaseApi {
    http: Arc<dyn HttpClientPort>,
    lang: Language,
}

impl BaseApi {
    pub fn new(http: Arc<dyn HttpClientPort>) -> Self {
        Self {
            http,
            lang: Language::default(),
        }
    }

    pub fn lang(&self) -> Language {
        self.lang
    }

    pub fn set_lang(&mut self, lang: Language) {
        self.lang = lang;
    }

    pub async fn get(&self, url: &str, redirects: Redirects) -> Result<HttpGetResult> {
        self.http.get(url, redirects).await
    }

    /// GET that must answer 200
    pub async fn get_ok(&self, url: &str, redirects: Redirects) -> Result<HttpGetResult> {
        let resp = self.get(url, redirects).await?;
        ensure_status(url, &resp, 200)?;
        Ok(resp)
    }

    /// Download and decode an image
    #[instrument(skip(self))]
    pub async fn fetch_image(&self, url: &str) -> Result<DynamicImage> {
        let resp = self.get_ok(url, Redirects::Follow).await?;
        debug!(bytes = resp.bytes.len(), content_type = %resp.content_type, "decoding image");
        Ok(image::load_from_memory(&resp.bytes)?)
    }
}

pub fn ensure_status(url: &str, resp: &HttpGetResult, expected: u16) -> Result<()> {
    if resp.status == expected {
        Ok(())
    } else {
        Err(ScraperError::UnexpectedStatus {
            url: url.to_string(),
            status: resp.status,
        })
    }
}

/// Trim every string, optionally dropping the ones left empty
pub fn strip_all<I, S>(strings: I, drop_empty: bool) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    strings
        .into_iter()
        .map(|s| s.as_ref().trim().to_string())
        .filter(|s| !drop_empty || !s.is_empty())
        .collect()
}

pub fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| ScraperError::Api {
        message: format!("Invalid selector '{css}': {e:?}"),
    })
}

/// All descendant text, trimmed
pub fn element_text(element: &ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Direct text children only, trimmed, empty ones dropped
pub fn own_text(element: &ElementRef) -> Vec<String> {
    let texts = element
        .children()
        .filter_map(|node| node.value().as_text().map(|t| String::from(&**t)));
    strip_all(texts, true)
}

/// Give protocol-relative and bare-path URLs an https scheme
pub fn with_https(url: &str) -> String {
    if url.starts_with("https:") || url.starts_with("http:") {
        url.to_string()
    } else if url.starts_with("//") {
        format!("https:{url}")
    } else {
        format!("https://{}", url.trim_start_matches('/'))
    }
}

pub fn missing(field: &str) -> ScraperError {
    ScraperError::MissingField(field.to_string())
}
