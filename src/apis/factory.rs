use crate::apis::{Fc2Api, JavLibraryApi, MissAvApi, TokyoLibApi};
use crate::app::ports::HttpClientPort;
use crate::constants::*;
use crate::error::{Result, ScraperError};
use crate::types::{Language, VideoApi};
use std::sync::Arc;

/// Factory function to create source clients by api name
pub fn create_api(api_name: &str, http: Arc<dyn HttpClientPort>) -> Option<Box<dyn VideoApi>> {
    match api_name {
        FC2_API => Some(Box::new(Fc2Api::new(http))),
        JAVLIBRARY_API => Some(Box::new(JavLibraryApi::new(http))),
        MISSAV_API => Some(Box::new(MissAvApi::new(http))),
        TOKYOLIB_API => Some(Box::new(TokyoLibApi::new(http))),
        _ => None,
    }
}

/// Build every named client with the page language applied
pub fn create_apis(
    api_names: &[String],
    http: Arc<dyn HttpClientPort>,
    lang: Language,
) -> Result<Vec<Box<dyn VideoApi>>> {
    api_names
        .iter()
        .map(|name| {
            let mut api = create_api(name, http.clone())
                .ok_or_else(|| ScraperError::Config(format!("Unknown source '{name}'")))?;
            api.set_language(lang);
            Ok(api)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::StaticHttp;

    #[test]
    fn test_every_supported_api_is_constructible() {
        let http: Arc<dyn HttpClientPort> = Arc::new(StaticHttp::new());
        for name in supported_apis() {
            let api = create_api(name, http.clone()).unwrap();
            assert!(!api.source().is_empty());
        }
        assert!(create_api("nope", http).is_none());
    }

    #[test]
    fn test_create_apis_applies_language() {
        let http: Arc<dyn HttpClientPort> = Arc::new(StaticHttp::new());
        let names = vec![MISSAV_API.to_string(), JAVLIBRARY_API.to_string()];
        let apis = create_apis(&names, http, Language::Cn).unwrap();
        assert_eq!(apis.len(), 2);
        assert!(apis.iter().all(|api| api.language() == Language::Cn));
        assert_eq!(apis[0].url_domain_lang(), "https://missav.com/cn");
    }

    #[test]
    fn test_create_apis_rejects_unknown_names() {
        let http: Arc<dyn HttpClientPort> = Arc::new(StaticHttp::new());
        let names = vec!["javdb".to_string()];
        assert!(matches!(create_apis(&names, http, Language::Ja), Err(ScraperError::Config(_))));
    }
}
