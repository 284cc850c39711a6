use crate::app::ports::{HttpClientPort, HttpGetResult, Redirects};
use crate::config::HttpConfig;
use crate::error::{Result, ScraperError};
use crate::observability::metrics;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, LOCATION, USER_AGENT};
use reqwest::redirect::Policy;
use std::time::{Duration, Instant};
use tracing::{debug, instrument};

/// reqwest-backed HTTP port.
///
/// Holds two pooled clients since redirect handling is a per-client setting
/// in reqwest. Cloning shares the pools.
#[derive(Clone)]
pub struct ReqwestHttp {
    follow: reqwest::Client,
    manual: reqwest::Client,
}

impl ReqwestHttp {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        Ok(Self {
            follow: build_client(config, Policy::default())?,
            manual: build_client(config, Policy::none())?,
        })
    }
}

fn default_headers(config: &HttpConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    let agent = HeaderValue::from_str(&config.user_agent)
        .map_err(|e| ScraperError::Config(format!("Invalid user agent: {e}")))?;
    headers.insert(USER_AGENT, agent);
    headers.insert("proxy-connection", HeaderValue::from_static("keep-alive"));
    Ok(headers)
}

fn build_client(config: &HttpConfig, policy: Policy) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .default_headers(default_headers(config)?)
        .redirect(policy)
        .timeout(Duration::from_secs(config.timeout_seconds));

    if let Some(proxy) = config.proxy.as_deref().filter(|p| !p.trim().is_empty()) {
        builder = builder.proxy(reqwest::Proxy::all(proxy)?);
    }

    Ok(builder.build()?)
}

#[async_trait]
impl HttpClientPort for ReqwestHttp {
    #[instrument(skip(self))]
    async fn get(&self, url: &str, redirects: Redirects) -> Result<HttpGetResult> {
        let client = match redirects {
            Redirects::Follow => &self.follow,
            Redirects::Manual => &self.manual,
        };

        let started = Instant::now();
        let resp = match client.get(url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                metrics::sources::request_error();
                return Err(e.into());
            }
        };

        let status = resp.status().as_u16();
        let headers = resp.headers().clone();
        let bytes = resp.bytes().await?.to_vec();
        metrics::sources::request_success();
        metrics::sources::request_duration(started.elapsed().as_secs_f64());

        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let location = headers
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        debug!(status, bytes = bytes.len(), "fetched");
        Ok(HttpGetResult { status, bytes, content_type, location })
    }
}
