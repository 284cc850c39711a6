use crate::error::Result;
use async_trait::async_trait;

/// Whether a GET should chase 3xx responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Redirects {
    #[default]
    Follow,
    /// Return the 3xx response itself, with its `Location` header
    Manual,
}

// Fetch-side port shared by every source client
#[async_trait]
pub trait HttpClientPort: Send + Sync {
    async fn get(&self, url: &str, redirects: Redirects) -> Result<HttpGetResult>;
}

#[derive(Clone, Debug)]
pub struct HttpGetResult {
    pub status: u16,
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub location: Option<String>,
}

impl HttpGetResult {
    pub fn is_success(&self) -> bool {
        self.status == 200
    }

    /// Body decoded as UTF-8, replacing invalid sequences
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}
