use crate::apis::base::{element_text, missing, selector, strip_all, with_https, BaseApi};
use crate::app::ports::{HttpClientPort, Redirects};
use crate::constants::{JAVLIBRARY_DOMAIN, JAVLIBRARY_SOURCE};
use crate::error::{Result, ScraperError};
use crate::types::{JavInfo, JavRecord, Language, VideoApi};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;
use scraper::{ElementRef, Html};
use std::sync::Arc;
use tracing::{debug, info, instrument};

static VIDEO_ID_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\./\?v=(.*)").unwrap());

pub struct JavLibraryApi {
    base: BaseApi,
}

/// Fields scraped from a video page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JavLibraryVideo {
    pub serial_no: String,
    pub title: String,
    pub publish_date: String,
    pub length_minutes: Option<u32>,
    pub director: String,
    pub maker: String,
    pub publisher: String,
    pub casts: Vec<String>,
    pub cover_url: Option<String>,
}

impl JavLibraryApi {
    pub fn new(http: Arc<dyn HttpClientPort>) -> Self {
        Self {
            base: BaseApi::new(http),
        }
    }

    pub fn search_url(&self, keyword: &str, page_no: u32) -> Result<String> {
        let base = format!("{}/vl_searchbyid.php", self.url_domain_lang());
        let url = Url::parse_with_params(&base, &[("keyword", keyword), ("page", &page_no.to_string())])
            .map_err(|e| ScraperError::Api { message: format!("Bad search url: {e}") })?;
        Ok(url.to_string())
    }

    pub fn video_url(&self, video_id: &str) -> String {
        format!("{}/?v={}", self.url_domain_lang(), video_id)
    }

    /// One page of search results.
    ///
    /// The site answers 200 with a result list when several videos match and
    /// redirects straight to the video when exactly one does.
    #[instrument(skip(self))]
    pub async fn search_page(&self, keyword: &str, page_no: u32) -> Result<Vec<JavRecord>> {
        let url = self.search_url(keyword, page_no)?;
        let resp = self.base.get(&url, Redirects::Manual).await?;

        match resp.status {
            200 => {
                let records = parse_search_results(&resp.text())?;
                debug!("Found {} results", records.len());
                Ok(records)
            }
            301 | 302 => {
                let location = resp.location.as_deref().ok_or_else(|| missing("location header"))?;
                let video_id = video_id_from_href(location).ok_or_else(|| ScraperError::Api {
                    message: format!("Unexpected redirect target: {location}"),
                })?;
                Ok(vec![JavRecord::new(keyword, "", video_id)])
            }
            status => Err(ScraperError::UnexpectedStatus { url, status }),
        }
    }
}

fn video_id_from_href(href: &str) -> Option<String> {
    VIDEO_ID_PATTERN
        .captures(href)
        .map(|caps| caps[1].to_string())
}

pub fn parse_search_results(html: &str) -> Result<Vec<JavRecord>> {
    let document = Html::parse_document(html);
    let mut records = Vec::new();

    for element in document.select(&selector("div.videos > div.video > a")?) {
        let title_attr = element.value().attr("title").ok_or_else(|| missing("title"))?;
        let (keyword, title) = title_attr.split_once(' ').unwrap_or((title_attr, ""));
        let href = element.value().attr("href").ok_or_else(|| missing("href"))?;
        let video_id = video_id_from_href(href).ok_or_else(|| missing("video id"))?;
        records.push(JavRecord::new(keyword, title, video_id));
    }

    Ok(records)
}

fn cell_text(document: &Html, css: &str) -> Result<Option<String>> {
    Ok(document
        .select(&selector(css)?)
        .next()
        .map(|el| element_text(&el))
        .filter(|text| !text.is_empty()))
}

pub fn parse_video_page(html: &str) -> Result<JavLibraryVideo> {
    let document = Html::parse_document(html);

    let title = cell_text(&document, "div#video_title a[rel='bookmark']")?.ok_or_else(|| missing("title"))?;
    let serial_no = cell_text(&document, "div#video_id td.text")?.ok_or_else(|| missing("serial_no"))?;
    let publish_date = cell_text(&document, "div#video_date td.text")?.unwrap_or_default();
    let length_minutes = cell_text(&document, "div#video_length span.text")?.and_then(|m| m.parse().ok());
    let director = cell_text(&document, "div#video_director td.text span a")?.unwrap_or_default();
    let maker = cell_text(&document, "div#video_maker td.text span a")?.unwrap_or_default();
    let publisher = cell_text(&document, "div#video_label td.text span a")?.unwrap_or_default();

    let cast_selector = selector("div#video_cast td.text span.star a[rel='tag']")?;
    let mut casts = strip_all(document.select(&cast_selector).map(|el: ElementRef| element_text(&el)), true);
    casts.sort();

    let cover_url = document
        .select(&selector("img#video_jacket_img")?)
        .next()
        .and_then(|img| img.value().attr("src"))
        .map(with_https);

    Ok(JavLibraryVideo {
        serial_no,
        title,
        publish_date,
        length_minutes,
        director,
        maker,
        publisher,
        casts,
        cover_url,
    })
}

#[async_trait::async_trait]
impl VideoApi for JavLibraryApi {
    fn source(&self) -> &'static str {
        JAVLIBRARY_SOURCE
    }

    fn url_domain(&self) -> &'static str {
        JAVLIBRARY_DOMAIN
    }

    fn language(&self) -> Language {
        self.base.lang()
    }

    fn set_language(&mut self, lang: Language) {
        self.base.set_lang(lang);
    }

    async fn search_by_keyword(&self, keyword: &str) -> Result<Vec<JavRecord>> {
        self.search_page(keyword, 1).await
    }

    #[instrument(skip(self))]
    async fn get_video_detail(&self, serial_no: &str, with_thumbnail: bool) -> Result<Option<JavInfo>> {
        let records = self.search_by_keyword(serial_no).await?;
        let Some(record) = records.into_iter().next() else {
            debug!("no search results");
            return Ok(None);
        };

        if record.keyword != serial_no {
            return Err(ScraperError::KeywordMismatch {
                expected: serial_no.to_string(),
                found: record.keyword,
            });
        }

        let url = self.video_url(&record.url);
        let resp = self.base.get_ok(&url, Redirects::Follow).await?;
        let video = parse_video_page(&resp.text())?;

        let thumbnail = match (&video.cover_url, with_thumbnail) {
            (Some(cover), true) => Some(self.base.fetch_image(cover).await?),
            _ => None,
        };

        let mut info = JavInfo::new(video.serial_no, video.title)
            .with_casts(video.casts)
            .with_publish_date(video.publish_date)
            .with_source(JAVLIBRARY_SOURCE);
        info.length = video.length_minutes.map(|m| m * 60);
        info.director = video.director;
        info.maker = video.maker;
        info.publisher = video.publisher;
        info.thumbnail = thumbnail;

        info!("Fetched {} from {}", serial_no, JAVLIBRARY_SOURCE);
        Ok(Some(info))
    }
}
