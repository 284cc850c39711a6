use crate::apis::base::{element_text, missing, own_text, selector, strip_all, BaseApi};
use crate::app::ports::{HttpClientPort, Redirects};
use crate::constants::{TOKYOLIB_API, TOKYOLIB_DOMAIN, TOKYOLIB_SOURCE};
use crate::error::{Result, ScraperError};
use crate::types::{JavInfo, JavRecord, Language, VideoApi};
use scraper::{ElementRef, Html, Selector};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// What a TokyoLib search matches against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchType {
    #[default]
    Id,
    Actress,
}

impl SearchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchType::Id => "id",
            SearchType::Actress => "actress",
        }
    }
}

/// Fields scraped from a work page. The site only has Chinese titles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokyoLibWork {
    pub serial_no: String,
    pub title: String,
    pub casts: Vec<String>,
    pub publish_date: String,
    pub series: String,
    pub maker: String,
    pub publisher: String,
    pub director: String,
}

pub struct TokyoLibApi {
    base: BaseApi,
}

impl TokyoLibApi {
    pub fn new(http: Arc<dyn HttpClientPort>) -> Self {
        Self {
            base: BaseApi::new(http),
        }
    }

    pub fn search_url(keyword: &str, search_type: SearchType) -> String {
        format!("{TOKYOLIB_DOMAIN}/search?type={}&q={keyword}", search_type.as_str())
    }

    #[instrument(skip(self))]
    pub async fn search(&self, keyword: &str, search_type: SearchType) -> Result<Vec<JavRecord>> {
        if search_type == SearchType::Actress {
            return Err(ScraperError::NotImplemented(format!("{TOKYOLIB_API} actress search")));
        }

        let url = Self::search_url(keyword, search_type);
        let resp = self.base.get_ok(&url, Redirects::Follow).await?;
        let records = parse_search_results(&resp.text())?;
        debug!("Found {} results", records.len());
        Ok(records)
    }
}

fn first_text(element: &ElementRef) -> String {
    element
        .text()
        .map(str::trim)
        .find(|t| !t.is_empty())
        .unwrap_or_default()
        .to_string()
}

pub fn parse_search_results(html: &str) -> Result<Vec<JavRecord>> {
    let document = Html::parse_document(html);
    let work_id = selector("h4.work-id")?;
    let work_title = selector("h4.work-title")?;

    let records = document
        .select(&selector("div.works > a.work")?)
        .map(|work| {
            let text_of = |sel: &Selector| work.select(sel).next().map(|h4| element_text(&h4)).unwrap_or_default();
            JavRecord::new(
                text_of(&work_id),
                text_of(&work_title),
                format!("{TOKYOLIB_DOMAIN}{}", work.value().attr("href").unwrap_or_default()),
            )
        })
        .collect();

    Ok(records)
}

pub fn parse_work_page(html: &str) -> Result<TokyoLibWork> {
    let document = Html::parse_document(html);

    let info = document
        .select(&selector("div.info")?)
        .next()
        .ok_or_else(|| missing("info"))?;
    let attributes = info
        .select(&selector("div.attributes dl")?)
        .next()
        .ok_or_else(|| missing("attributes"))?;

    let mut work = TokyoLibWork::default();
    let dd = selector("dd")?;
    let dt = selector("dt")?;
    let labels = attributes.select(&dd);
    let values = attributes.select(&dt);

    // label in dd, value in dt
    for (label, value) in labels.zip(values) {
        let key = element_text(&label);
        if key.ends_with("番号") {
            work.serial_no = element_text(&value)
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_uppercase();
        } else if key.ends_with("发行时间") {
            work.publish_date = element_text(&value).split_whitespace().next().unwrap_or_default().to_string();
        } else if key.ends_with("系列") {
            work.series = first_text(&value);
        } else if key.ends_with("片商") {
            work.maker = first_text(&value).to_uppercase();
        } else if key.ends_with("厂牌") {
            work.publisher = first_text(&value).to_uppercase();
        } else if key.ends_with("导演") {
            work.director = first_text(&value);
        }
    }

    if work.serial_no.is_empty() {
        return Err(missing("番号"));
    }
    if work.publish_date.is_empty() {
        return Err(missing("发行时间"));
    }

    work.title = document
        .select(&selector("h1.title.is-4")?)
        .next()
        .and_then(|h1| own_text(&h1).into_iter().next())
        .ok_or_else(|| missing("title"))?;

    let actress = selector("a.actress")?;
    work.casts = strip_all(info.select(&actress).map(|a| element_text(&a)), true);
    work.casts.sort();

    Ok(work)
}

#[async_trait::async_trait]
impl VideoApi for TokyoLibApi {
    fn source(&self) -> &'static str {
        TOKYOLIB_SOURCE
    }

    fn url_domain(&self) -> &'static str {
        TOKYOLIB_DOMAIN
    }

    fn language(&self) -> Language {
        self.base.lang()
    }

    fn set_language(&mut self, lang: Language) {
        self.base.set_lang(lang);
    }

    async fn search_by_keyword(&self, keyword: &str) -> Result<Vec<JavRecord>> {
        self.search(keyword, SearchType::Id).await
    }

    #[instrument(skip(self))]
    async fn get_video_detail(&self, serial_no: &str, _with_thumbnail: bool) -> Result<Option<JavInfo>> {
        let records = self.search_by_keyword(serial_no).await?;
        let Some(record) = records.first() else {
            debug!("no search results");
            return Ok(None);
        };

        let found = record.keyword.trim();
        if found != serial_no {
            debug!(found, "first result is a different work");
            return Ok(None);
        }

        let resp = self.base.get_ok(&record.url, Redirects::Follow).await?;
        let work = parse_work_page(&resp.text())?;

        let mut info = JavInfo::new(work.serial_no, work.title)
            .with_casts(work.casts)
            .with_publish_date(work.publish_date)
            .with_source(TOKYOLIB_SOURCE);
        info.series = work.series;
        info.maker = work.maker;
        info.publisher = work.publisher;
        info.director = work.director;

        info!("Fetched {} from {}", serial_no, TOKYOLIB_SOURCE);
        Ok(Some(info))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::StaticHttp;

    const SEARCH: &str = r#"
        <html><body>
        <div class="works">
          <a class="work" href="/works/ssis-001">
            <h4 class="work-id">SSIS-001</h4>
            <h4 class="work-title">标题一</h4>
          </a>
          <a class="work" href="/works/ssis-001-b">
            <h4 class="work-id">SSIS-001B</h4>
            <h4 class="work-title">标题二</h4>
          </a>
        </div>
        </body></html>
    "#;

    const WORK: &str = r#"
        <html><body>
        <h1 class="title is-4">中文标题 </h1>
        <div class="info">
          <div class="attributes">
            <dl>
              <dd>番号</dd><dt>ssis-001 HD</dt>
              <dd>发行时间</dd><dt>2021-02-19 10:00</dt>
              <dd>系列</dd><dt><a href="/series/1"> 系列名 </a></dt>
              <dd>片商</dd><dt><a href="/makers/1">s1 no.1 style</a></dt>
              <dd>厂牌</dd><dt><a href="/labels/1">s1</a></dt>
              <dd>导演</dd><dt><a href="/directors/1">导演名</a></dt>
            </dl>
          </div>
          <a class="actress" href="/a/2">Zeta</a>
          <a class="actress" href="/a/1"> Alpha </a>
        </div>
        </body></html>
    "#;

    fn client(http: StaticHttp) -> (Arc<StaticHttp>, TokyoLibApi) {
        let http = Arc::new(http);
        (http.clone(), TokyoLibApi::new(http))
    }

    #[test]
    fn test_parse_search_results() {
        let records = parse_search_results(SEARCH).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].keyword, "SSIS-001");
        assert_eq!(records[0].title, "标题一");
        assert_eq!(records[0].url, "https://tokyolib.com/works/ssis-001");
    }

    #[test]
    fn test_parse_work_page() {
        let work = parse_work_page(WORK).unwrap();
        assert_eq!(work.serial_no, "SSIS-001");
        assert_eq!(work.publish_date, "2021-02-19");
        assert_eq!(work.title, "中文标题");
        assert_eq!(work.series, "系列名");
        assert_eq!(work.maker, "S1 NO.1 STYLE");
        assert_eq!(work.publisher, "S1");
        assert_eq!(work.director, "导演名");
        assert_eq!(work.casts, vec!["Alpha", "Zeta"]);
    }

    #[test]
    fn test_parse_work_page_without_info_fails() {
        assert!(matches!(
            parse_work_page("<html><body></body></html>"),
            Err(ScraperError::MissingField(_))
        ));
    }

    #[tokio::test]
    async fn test_get_video_detail() {
        let (http, api) = client(
            StaticHttp::new()
                .with_html(&TokyoLibApi::search_url("SSIS-001", SearchType::Id), SEARCH)
                .with_html("https://tokyolib.com/works/ssis-001", WORK),
        );

        let info = api.get_video_detail("SSIS-001", true).await.unwrap().unwrap();
        assert_eq!(info.serial_no, "SSIS-001");
        assert_eq!(info.title(), "中文标题");
        assert_eq!(info.source, "TokyoLib");
        assert!(info.thumbnail.is_none());
        assert_eq!(http.requested_urls().len(), 2);
    }

    #[tokio::test]
    async fn test_mismatched_first_result_is_none() {
        let (http, api) = client(
            StaticHttp::new().with_html(&TokyoLibApi::search_url("SSIS-00", SearchType::Id), SEARCH),
        );
        assert!(api.get_video_detail("SSIS-00", false).await.unwrap().is_none());
        assert_eq!(http.requested_urls().len(), 1);
    }

    #[tokio::test]
    async fn test_lowercase_work_id_is_none() {
        let search = SEARCH.replace("<h4 class=\"work-id\">SSIS-001</h4>", "<h4 class=\"work-id\">ssis-001</h4>");
        let (http, api) = client(
            StaticHttp::new()
                .with_html(&TokyoLibApi::search_url("SSIS-001", SearchType::Id), &search)
                .with_html("https://tokyolib.com/works/ssis-001", WORK),
        );
        assert!(api.get_video_detail("SSIS-001", false).await.unwrap().is_none());
        assert_eq!(http.requested_urls().len(), 1);
    }

    #[tokio::test]
    async fn test_no_results_is_none() {
        let (_, api) = client(StaticHttp::new().with_html(
            &TokyoLibApi::search_url("ABP-999", SearchType::Id),
            "<div class=\"works\"></div>",
        ));
        assert!(api.get_video_detail("ABP-999", false).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_actress_search_not_implemented() {
        let (http, api) = client(StaticHttp::new());
        assert!(matches!(
            api.search("someone", SearchType::Actress).await,
            Err(ScraperError::NotImplemented(_))
        ));
        assert!(http.requests().is_empty());
    }
}
