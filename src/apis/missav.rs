use crate::apis::base::{element_text, missing, selector, strip_all, BaseApi};
use crate::app::ports::{HttpClientPort, Redirects};
use crate::constants::{MISSAV_COVER_DOMAIN, MISSAV_DOMAIN, MISSAV_SOURCE};
use crate::error::{Result, ScraperError};
use crate::types::{JavInfo, JavRecord, Language, VideoApi};
use image::DynamicImage;
use scraper::{ElementRef, Html};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Label text the detail page uses for each field, per language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetailLabels {
    pub serial_no: &'static str,
    pub title: &'static str,
    pub casts: &'static str,
    pub publish_date: &'static str,
    pub publisher: &'static str,
}

impl DetailLabels {
    pub fn for_language(lang: Language) -> Self {
        match lang {
            Language::Zh => Self {
                serial_no: "番號",
                title: "標題",
                casts: "女優",
                publish_date: "發行日期",
                publisher: "發行商",
            },
            Language::Cn => Self {
                serial_no: "番号",
                title: "标题",
                casts: "女优",
                publish_date: "发行日期",
                publisher: "发行商",
            },
            Language::Ja => Self {
                serial_no: "品番",
                title: "標題",
                casts: "女優",
                publish_date: "配信開始日",
                publisher: "メーカー",
            },
        }
    }
}

/// Fields scraped from a video page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissAvVideo {
    pub serial_no: String,
    pub title: String,
    pub casts: Vec<String>,
    pub publish_date: String,
    pub publisher: String,
}

pub struct MissAvApi {
    base: BaseApi,
}

impl MissAvApi {
    pub fn new(http: Arc<dyn HttpClientPort>) -> Self {
        Self {
            base: BaseApi::new(http),
        }
    }

    pub fn labels(&self) -> DetailLabels {
        DetailLabels::for_language(self.language())
    }

    pub fn search_url(&self, keyword: &str, page_no: u32) -> String {
        format!("{}/search/{}?page={}", self.url_domain_lang(), keyword, page_no)
    }

    pub fn video_url(&self, serial_no: &str) -> String {
        format!("{}/{}", self.url_domain_lang(), serial_no)
    }

    pub fn screenshot_url(serial_no: &str) -> String {
        format!("{}/{}/cover.jpg", MISSAV_COVER_DOMAIN, serial_no.to_lowercase())
    }

    /// Cover screenshot, e.g. for "FC2-PPV-3076281"
    pub async fn get_video_screenshot(&self, serial_no: &str) -> Result<DynamicImage> {
        self.base.fetch_image(&Self::screenshot_url(serial_no)).await
    }

    #[instrument(skip(self))]
    pub async fn search_page(&self, keyword: &str, page_no: u32) -> Result<Vec<JavRecord>> {
        let url = self.search_url(keyword, page_no);
        let resp = self.base.get_ok(&url, Redirects::Follow).await?;
        let records = parse_search_results(&resp.text())?;
        debug!("Found {} results", records.len());
        Ok(records)
    }
}

pub fn parse_search_results(html: &str) -> Result<Vec<JavRecord>> {
    let document = Html::parse_document(html);
    let card_title = selector("div[x-data] > div > div > div.my-2.text-sm.text-nord4.truncate > a")?;

    let records = document
        .select(&card_title)
        .map(|element| {
            JavRecord::new(
                element.value().attr("alt").unwrap_or_default(),
                element_text(&element),
                element.value().attr("href").unwrap_or_default(),
            )
        })
        .collect();

    Ok(records)
}

pub fn parse_video_page(html: &str, labels: &DetailLabels) -> Result<MissAvVideo> {
    let document = Html::parse_document(html);

    let mut fields: HashMap<String, String> = HashMap::new();
    for row in document.select(&selector("div.space-y-2 > div")?) {
        let Some(label) = row.children().find_map(ElementRef::wrap) else {
            continue;
        };
        let label_text = element_text(&label);
        let row_text = element_text(&row);
        let value = row_text
            .strip_prefix(label_text.as_str())
            .unwrap_or(&row_text)
            .trim()
            .to_string();

        // labels carry a trailing colon
        let key = label_text.trim_end_matches(|c: char| c == ':' || c == '：').trim().to_string();
        fields.insert(key, value);
    }

    // this heading changes with the page language
    let heading = document
        .select(&selector("div.mt-4 > h1")?)
        .next()
        .map(|h1| element_text(&h1).replace('\u{3000}', " "))
        .unwrap_or_default();

    let serial_no = fields.get(labels.serial_no).cloned().ok_or_else(|| missing(labels.serial_no))?;
    let publish_date = fields
        .get(labels.publish_date)
        .cloned()
        .ok_or_else(|| missing(labels.publish_date))?;

    // FC2 pages carry a labelled title, others only the heading
    let title = fields.get(labels.title).cloned().unwrap_or(heading);

    let mut casts = strip_all(
        fields.get(labels.casts).map(|c| c.split(',').collect::<Vec<_>>()).unwrap_or_default(),
        true,
    );
    casts.sort();

    Ok(MissAvVideo {
        serial_no,
        title,
        casts,
        publish_date,
        publisher: fields.get(labels.publisher).cloned().unwrap_or_default(),
    })
}

#[async_trait::async_trait]
impl VideoApi for MissAvApi {
    fn source(&self) -> &'static str {
        MISSAV_SOURCE
    }

    fn url_domain(&self) -> &'static str {
        MISSAV_DOMAIN
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

    /// The detail page is addressed by serial number directly
    #[instrument(skip(self))]
    async fn get_video_detail(&self, serial_no: &str, with_thumbnail: bool) -> Result<Option<JavInfo>> {
        let url = self.video_url(serial_no);
        let resp = self.base.get(&url, Redirects::Follow).await?;
        match resp.status {
            200 => {}
            404 => {
                debug!("video page not found");
                return Ok(None);
            }
            status => return Err(ScraperError::UnexpectedStatus { url, status }),
        }

        let video = parse_video_page(&resp.text(), &self.labels())?;
        if video.serial_no != serial_no {
            warn!(found = %video.serial_no, "page serial number does not match");
            return Ok(None);
        }

        let thumbnail = if with_thumbnail {
            Some(self.get_video_screenshot(serial_no).await?)
        } else {
            None
        };

        let mut info = JavInfo::new(video.serial_no, video.title)
            .with_casts(video.casts)
            .with_publish_date(video.publish_date)
            .with_source(MISSAV_SOURCE);
        info.publisher = video.publisher;
        info.thumbnail = thumbnail;

        info!("Fetched {} from {}", serial_no, MISSAV_SOURCE);
        Ok(Some(info))
    }
}
