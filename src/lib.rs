pub mod apis;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod serial_no;
pub mod types;

// Layered boundaries for application and infrastructure
pub mod app;
pub mod infra;

pub mod observability;

pub use error::{Result, ScraperError};
pub use serial_no::{parse_serial_no, SerialNoParser};
pub use types::{JavInfo, JavRecord, Language, VideoApi};
