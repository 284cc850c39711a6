use crate::apis::base::{element_text, missing, own_text, selector, with_https, BaseApi};
use crate::app::ports::{HttpClientPort, Redirects};
use crate::constants::{FC2_API, FC2_DOMAIN, FC2_SOURCE};
use crate::error::{Result, ScraperError};
use crate::serial_no::SerialKind;
use crate::types::{JavInfo, JavRecord, Language, VideoApi};
use scraper::Html;
use std::sync::Arc;
use tracing::{debug, info, instrument};

const FC2_SERIAL_PREFIX: &str = "FC2-PPV-";

/// FC2 content market. Only FC2 serial numbers live here.
pub struct Fc2Api {
    base: BaseApi,
}

/// Fields scraped from an article page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fc2Article {
    pub title: String,
    pub publisher: String,
    pub publish_date: String,
    pub cover_url: Option<String>,
    pub length: Option<u32>,
}

impl Fc2Api {
    pub fn new(http: Arc<dyn HttpClientPort>) -> Self {
        Self {
            base: BaseApi::new(http),
        }
    }

    pub fn article_url(number: &str) -> String {
        format!("{FC2_DOMAIN}/article/{number}/")
    }
}

/// `HH:MM:SS` (or `MM:SS`) to seconds
pub fn parse_duration(text: &str) -> Option<u32> {
    let parts: Vec<u32> = text
        .trim()
        .split(':')
        .map(|p| p.trim().parse().ok())
        .collect::<Option<_>>()?;

    match parts.as_slice() {
        [h, m, s] => Some(h * 3600 + m * 60 + s),
        [m, s] => Some(m * 60 + s),
        _ => None,
    }
}

pub fn parse_article(html: &str) -> Result<Fc2Article> {
    let document = Html::parse_document(html);

    let header = document
        .select(&selector("div.items_article_headerInfo")?)
        .next()
        .ok_or_else(|| missing("items_article_headerInfo"))?;

    // sometimes a tag element precedes the title text
    let title = header
        .select(&selector("h3")?)
        .next()
        .and_then(|h3| own_text(&h3).pop())
        .ok_or_else(|| missing("title"))?;

    let publisher = header
        .select(&selector("ul a[href]")?)
        .last()
        .and_then(|a| a.value().attr("href"))
        .and_then(|href| href.trim_matches('/').rsplit('/').next())
        .unwrap_or_default()
        .to_string();

    let publish_date = header
        .select(&selector(".items_article_Releasedate")?)
        .next()
        .map(|el| element_text(&el))
        .and_then(|text| text.rsplit(" : ").next().map(|d| d.trim().replace('/', "-")))
        .unwrap_or_default();

    let thumb_block = document
        .select(&selector("div.items_article_MainitemThumb")?)
        .next();

    let cover_url = thumb_block.and_then(|block| {
        block
            .select(&selector("img").ok()?)
            .next()
            .and_then(|img| img.value().attr("src"))
            .map(|src| src.to_string())
    });

    let length = thumb_block.and_then(|block| block.text().find_map(parse_duration));

    Ok(Fc2Article {
        title,
        publisher,
        publish_date,
        cover_url,
        length,
    })
}

#[async_trait::async_trait]
impl VideoApi for Fc2Api {
    fn source(&self) -> &'static str {
        FC2_SOURCE
    }

    fn url_domain(&self) -> &'static str {
        FC2_DOMAIN
    }

    fn language(&self) -> Language {
        self.base.lang()
    }

    fn set_language(&mut self, lang: Language) {
        self.base.set_lang(lang);
    }

    fn supports(&self, kind: SerialKind) -> bool {
        kind == SerialKind::Fc2
    }

    async fn search_by_keyword(&self, _keyword: &str) -> Result<Vec<JavRecord>> {
        Err(ScraperError::NotImplemented(format!("{FC2_API} keyword search")))
    }

    #[instrument(skip(self))]
    async fn get_video_detail(&self, serial_no: &str, with_thumbnail: bool) -> Result<Option<JavInfo>> {
        let Some(number) = serial_no.strip_prefix(FC2_SERIAL_PREFIX) else {
            debug!("not an FC2 serial number");
            return Ok(None);
        };

        let url = Self::article_url(number);
        let resp = self.base.get(&url, Redirects::Manual).await?;
        if !resp.is_success() {
            debug!(status = resp.status, "article not available");
            return Ok(None);
        }

        let article = parse_article(&resp.text())?;

        let thumbnail = match (&article.cover_url, with_thumbnail) {
            (Some(src), true) => Some(self.base.fetch_image(&with_https(src)).await?),
            _ => None,
        };

        let mut info = JavInfo::new(serial_no, article.title)
            .with_publish_date(article.publish_date)
            .with_source(FC2_SOURCE);
        info.publisher = article.publisher;
        info.length = article.length;
        info.thumbnail = thumbnail;

        info!("Fetched {} from {}", serial_no, FC2_SOURCE);
        Ok(Some(info))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::StaticHttp;

    const ARTICLE: &str = r#"
        <html><body>
        <div class="items_article_headerInfo">
          <h3><span class="items_article_TagArea">NEW</span>Summer vacation special</h3>
          <ul>
            <li>by <a href="https://adult.contents.fc2.com/users/seller01/">seller01</a></li>
          </ul>
          <div class="items_article_softDevice"><p>Release</p></div>
          <div class="items_article_Releasedate"><p>販売日 : 2022/08/26</p></div>
        </div>
        <div class="items_article_MainitemThumb">
          <span><img src="//storage.fc2.com/cover/3076281.jpg" alt=""><p class="items_article_info">01:02:03</p></span>
        </div>
        </body></html>
    "#;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("01:02:03"), Some(3723));
        assert_eq!(parse_duration("45:10"), Some(2710));
        assert_eq!(parse_duration("soon"), None);
        assert_eq!(parse_duration("1:2:3:4"), None);
    }

    #[test]
    fn test_parse_article() {
        let article = parse_article(ARTICLE).unwrap();
        assert_eq!(article.title, "Summer vacation special");
        assert_eq!(article.publisher, "seller01");
        assert_eq!(article.publish_date, "2022-08-26");
        assert_eq!(article.cover_url.as_deref(), Some("//storage.fc2.com/cover/3076281.jpg"));
        assert_eq!(article.length, Some(3723));
    }

    #[test]
    fn test_parse_article_without_header_fails() {
        let err = parse_article("<html><body><p>removed</p></body></html>").unwrap_err();
        assert!(matches!(err, ScraperError::MissingField(_)));
    }

    #[tokio::test]
    async fn test_get_video_detail() {
        let http = Arc::new(StaticHttp::new().with_html(&Fc2Api::article_url("3076281"), ARTICLE));
        let api = Fc2Api::new(http.clone());

        let info = api.get_video_detail("FC2-PPV-3076281", false).await.unwrap().unwrap();
        assert_eq!(info.serial_no, "FC2-PPV-3076281");
        assert_eq!(info.title(), "Summer vacation special");
        assert_eq!(info.publisher, "seller01");
        assert_eq!(info.length, Some(3723));
        assert_eq!(info.source, "FC2");
        assert!(info.thumbnail.is_none());

        // articles are fetched without following redirects
        assert_eq!(http.requests()[0].1, Redirects::Manual);
    }

    #[tokio::test]
    async fn test_non_fc2_serial_is_skipped() {
        let http = Arc::new(StaticHttp::new());
        let api = Fc2Api::new(http.clone());
        assert!(api.get_video_detail("ABC-123", false).await.unwrap().is_none());
        assert!(http.requests().is_empty());
        assert!(!api.supports(SerialKind::Censored));
        assert!(api.supports(SerialKind::Fc2));
    }

    #[tokio::test]
    async fn test_missing_article_is_none() {
        let http = Arc::new(StaticHttp::new().with_redirect(&Fc2Api::article_url("1111111"), "/"));
        let api = Fc2Api::new(http);
        assert!(api.get_video_detail("FC2-PPV-1111111", false).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_not_implemented() {
        let api = Fc2Api::new(Arc::new(StaticHttp::new()));
        assert!(matches!(
            api.search_by_keyword("anything").await,
            Err(ScraperError::NotImplemented(_))
        ));
    }
}
