use crate::app::ports::{HttpClientPort, HttpGetResult, Redirects};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory HTTP port serving canned responses.
///
/// Unknown URLs answer 404. Every request is recorded so callers can check
/// what was fetched. Used for offline replays and tests.
#[derive(Default)]
pub struct StaticHttp {
    routes: HashMap<String, HttpGetResult>,
    requests: Mutex<Vec<(String, Redirects)>>,
}

impl StaticHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, url: &str, status: u16, body: impl Into<Vec<u8>>) -> Self {
        self.routes.insert(
            url.to_string(),
            HttpGetResult {
                status,
                bytes: body.into(),
                content_type: "text/html; charset=utf-8".to_string(),
                location: None,
            },
        );
        self
    }

    pub fn with_html(self, url: &str, body: &str) -> Self {
        self.with_response(url, 200, body.as_bytes().to_vec())
    }

    pub fn with_redirect(mut self, url: &str, location: &str) -> Self {
        self.routes.insert(
            url.to_string(),
            HttpGetResult {
                status: 302,
                bytes: Vec::new(),
                content_type: "text/html".to_string(),
                location: Some(location.to_string()),
            },
        );
        self
    }

    pub fn requests(&self) -> Vec<(String, Redirects)> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn requested_urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|(url, _)| url).collect()
    }
}

#[async_trait]
impl HttpClientPort for StaticHttp {
    async fn get(&self, url: &str, redirects: Redirects) -> Result<HttpGetResult> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push((url.to_string(), redirects));
        }

        Ok(self.routes.get(url).cloned().unwrap_or_else(|| HttpGetResult {
            status: 404,
            bytes: Vec::new(),
            content_type: "text/html".to_string(),
            location: None,
        }))
    }
}
