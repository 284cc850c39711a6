pub mod http_client;
pub mod static_http;

pub use http_client::ReqwestHttp;
pub use static_http::StaticHttp;
