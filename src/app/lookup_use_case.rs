use futures::future::join_all;
use tracing::{info, instrument, warn};

use crate::error::ScraperError;
use crate::observability::metrics;
use crate::serial_no::{SerialMatch, SerialNoParser};
use crate::types::{JavInfo, VideoApi};

/// A source that returned details for the serial number
#[derive(Debug)]
pub struct SourceHit {
    pub source: &'static str,
    pub info: JavInfo,
}

/// A source whose lookup failed
#[derive(Debug)]
pub struct SourceFailure {
    pub source: &'static str,
    pub error: ScraperError,
}

/// Everything learned about one raw identifier
#[derive(Debug)]
pub struct LookupOutcome {
    pub raw: String,
    pub serial: Option<SerialMatch>,
    pub hits: Vec<SourceHit>,
    pub misses: Vec<&'static str>,
    pub failures: Vec<SourceFailure>,
}

impl LookupOutcome {
    fn unrecognized(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            serial: None,
            hits: Vec::new(),
            misses: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn canonical(&self) -> Option<String> {
        self.serial.as_ref().map(SerialMatch::canonical)
    }

    pub fn is_found(&self) -> bool {
        !self.hits.is_empty()
    }
}

/// Use case for resolving raw identifiers against the configured sources
pub struct LookupUseCase {
    parser: SerialNoParser,
    sources: Vec<Box<dyn VideoApi>>,
}

impl LookupUseCase {
    pub fn new(parser: SerialNoParser, sources: Vec<Box<dyn VideoApi>>) -> Self {
        Self { parser, sources }
    }

    pub fn sources(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.sources.iter().map(|api| api.source())
    }

    /// Normalize `raw` and query every source that serves its kind
    #[instrument(skip(self))]
    pub async fn resolve(&self, raw: &str, with_thumbnail: bool) -> LookupOutcome {
        let Some(serial) = self.parser.classify(raw) else {
            info!("Skipping unrecognized identifier");
            return LookupOutcome::unrecognized(raw);
        };
        let canonical = serial.canonical();
        let canonical = canonical.as_str();

        let lookups = self
            .sources
            .iter()
            .filter(|api| api.supports(serial.kind))
            .map(|api| async move {
                (api.source(), api.get_video_detail(canonical, with_thumbnail).await)
            });

        let mut outcome = LookupOutcome {
            raw: raw.to_string(),
            serial: Some(serial.clone()),
            hits: Vec::new(),
            misses: Vec::new(),
            failures: Vec::new(),
        };

        for (source, result) in join_all(lookups).await {
            match result {
                Ok(Some(info)) => {
                    metrics::lookup::hit(source);
                    outcome.hits.push(SourceHit { source, info });
                }
                Ok(None) => {
                    metrics::lookup::miss(source);
                    outcome.misses.push(source);
                }
                Err(error) => {
                    warn!(source, %error, "Source lookup failed");
                    metrics::lookup::failure(source);
                    outcome.failures.push(SourceFailure { source, error });
                }
            }
        }

        info!(
            canonical,
            hits = outcome.hits.len(),
            misses = outcome.misses.len(),
            failures = outcome.failures.len(),
            "Lookup finished"
        );
        outcome
    }

    /// Resolve several identifiers concurrently, keeping input order
    pub async fn resolve_many<S: AsRef<str>>(&self, raws: &[S], with_thumbnail: bool) -> Vec<LookupOutcome> {
        join_all(raws.iter().map(|raw| self.resolve(raw.as_ref(), with_thumbnail))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::serial_no::SerialKind;
    use crate::types::{JavRecord, Language};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    enum Reply {
        Found,
        Missing,
        Broken,
    }

    struct FakeApi {
        source: &'static str,
        only: Option<SerialKind>,
        reply: Reply,
        seen: Arc<Mutex<Vec<String>>>,
    }

    impl FakeApi {
        fn boxed(source: &'static str, only: Option<SerialKind>, reply: Reply) -> (Box<dyn VideoApi>, Arc<Mutex<Vec<String>>>) {
            let seen = Arc::new(Mutex::new(Vec::new()));
            let api = FakeApi {
                source,
                only,
                reply,
                seen: seen.clone(),
            };
            (Box::new(api), seen)
        }
    }

    #[async_trait]
    impl VideoApi for FakeApi {
        fn source(&self) -> &'static str {
            self.source
        }

        fn url_domain(&self) -> &'static str {
            "https://fake.test"
        }

        fn language(&self) -> Language {
            Language::Ja
        }

        fn set_language(&mut self, _lang: Language) {}

        fn supports(&self, kind: SerialKind) -> bool {
            self.only.map_or(true, |only| only == kind)
        }

        async fn search_by_keyword(&self, _keyword: &str) -> Result<Vec<JavRecord>> {
            Ok(Vec::new())
        }

        async fn get_video_detail(&self, serial_no: &str, _with_thumbnail: bool) -> Result<Option<JavInfo>> {
            self.seen.lock().unwrap().push(serial_no.to_string());
            match self.reply {
                Reply::Found => Ok(Some(JavInfo::new(serial_no, "title").with_source(self.source))),
                Reply::Missing => Ok(None),
                Reply::Broken => Err(ScraperError::UnexpectedStatus {
                    url: "https://fake.test".to_string(),
                    status: 500,
                }),
            }
        }
    }

    fn parser() -> SerialNoParser {
        SerialNoParser::with_reference_year(2025)
    }

    #[tokio::test]
    async fn test_resolve_collects_hits_misses_and_failures() {
        let (a, _) = FakeApi::boxed("A", None, Reply::Found);
        let (b, _) = FakeApi::boxed("B", None, Reply::Missing);
        let (c, _) = FakeApi::boxed("C", None, Reply::Broken);
        let use_case = LookupUseCase::new(parser(), vec![a, b, c]);
        assert_eq!(use_case.sources().collect::<Vec<_>>(), vec!["A", "B", "C"]);

        let outcome = use_case.resolve("ssis001", false).await;
        assert_eq!(outcome.canonical().as_deref(), Some("SSIS-001"));
        assert!(outcome.is_found());
        assert_eq!(outcome.hits[0].source, "A");
        assert_eq!(outcome.hits[0].info.serial_no, "SSIS-001");
        assert_eq!(outcome.misses, vec!["B"]);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].source, "C");
    }

    #[tokio::test]
    async fn test_unrecognized_input_queries_nothing() {
        let (a, seen) = FakeApi::boxed("A", None, Reply::Found);
        let use_case = LookupUseCase::new(parser(), vec![a]);

        let outcome = use_case.resolve("holiday photos", false).await;
        assert!(outcome.serial.is_none());
        assert!(!outcome.is_found());
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sources_not_serving_the_kind_are_skipped() {
        let (fc2_only, fc2_seen) = FakeApi::boxed("FC2", Some(SerialKind::Fc2), Reply::Found);
        let (any, any_seen) = FakeApi::boxed("Any", None, Reply::Missing);
        let use_case = LookupUseCase::new(parser(), vec![fc2_only, any]);

        let outcome = use_case.resolve("ABP-123", false).await;
        assert!(fc2_seen.lock().unwrap().is_empty());
        assert_eq!(*any_seen.lock().unwrap(), vec!["ABP-123"]);
        assert_eq!(outcome.misses, vec!["Any"]);

        let outcome = use_case.resolve("fc2-ppv-1234567", false).await;
        assert_eq!(outcome.hits[0].source, "FC2");
        assert_eq!(outcome.hits[0].info.serial_no, "FC2-PPV-1234567");
    }

    #[tokio::test]
    async fn test_resolve_many_keeps_input_order() {
        let (a, _) = FakeApi::boxed("A", None, Reply::Found);
        let use_case = LookupUseCase::new(parser(), vec![a]);

        let outcomes = use_case.resolve_many(&["abc-123", "nothing here", "010124_001"], false).await;
        let canonicals: Vec<_> = outcomes.iter().map(|o| o.canonical()).collect();
        assert_eq!(
            canonicals,
            vec![Some("ABC-123".to_string()), None, Some("010124_001".to_string())]
        );
        assert_eq!(outcomes[1].raw, "nothing here");
    }
}
