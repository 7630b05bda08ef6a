//! Routes an uploaded file to the right parser by declared content type.
//!
//! This is the error boundary: every failure comes back as a message in
//! [`DispatchOutcome::error`], nothing is propagated to the caller.

use std::fs;
use std::path::Path;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;
use tracing::{info, warn};

use crate::constants::{CONTENT_TYPE_JSON, CONTENT_TYPE_TEXT, FLOW_NO_MAPPINGS_KEY, PARSE_SUCCESS_MESSAGE};
use crate::domain::Questionnaire;
use crate::error::{FlowError, Result};
use crate::flatten::Envelope;
use crate::metrics::DispatchMetrics;
use crate::parser::{measured, KeyScheme, MetricsParser, Parser, TextQuestionnaireParser};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Json,
    Text,
}

impl ContentKind {
    /// Accepts MIME types case-insensitively and ignores parameters such as `charset`.
    pub fn from_mime(content_type: &str) -> Result<Self> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            CONTENT_TYPE_JSON | "text/json" => Ok(ContentKind::Json),
            CONTENT_TYPE_TEXT => Ok(ContentKind::Text),
            other if other.starts_with("application/") && other.ends_with("+json") => Ok(ContentKind::Json),
            _ => Err(FlowError::UnsupportedContentType(content_type.to_string())),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ContentKind::Json => CONTENT_TYPE_JSON,
            ContentKind::Text => CONTENT_TYPE_TEXT,
        }
    }
}

/// A successfully parsed upload, keeping the envelope it is returned in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedContent {
    /// Serialized as the bare `{"Q1": ...}` mapping
    Questions(Questionnaire),
    /// Serialized as `{"flow_no_mappings": {"Q1": ...}}`
    FlowNoMappings(Questionnaire),
}

impl ParsedContent {
    pub fn questionnaire(&self) -> &Questionnaire {
        match self {
            ParsedContent::Questions(q) | ParsedContent::FlowNoMappings(q) => q,
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

impl Serialize for ParsedContent {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            ParsedContent::Questions(q) => q.serialize(serializer),
            ParsedContent::FlowNoMappings(q) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(FLOW_NO_MAPPINGS_KEY, q)?;
                map.end()
            }
        }
    }
}

/// `(result, message, error)`: exactly one of `result` and `error` is set.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    pub result: Option<ParsedContent>,
    pub message: Option<&'static str>,
    pub error: Option<String>,
}

impl DispatchOutcome {
    fn success(content: ParsedContent) -> Self {
        Self {
            result: Some(content),
            message: Some(PARSE_SUCCESS_MESSAGE),
            error: None,
        }
    }

    fn failure(error: &FlowError) -> Self {
        Self {
            result: None,
            message: None,
            error: Some(error.to_string()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn into_parts(self) -> (Option<Value>, Option<&'static str>, Option<String>) {
        (self.result.map(|r| r.to_value()), self.message, self.error)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ContentDispatcher {
    text_scheme: KeyScheme,
}

impl Default for ContentDispatcher {
    fn default() -> Self {
        Self {
            text_scheme: KeyScheme::Sequential,
        }
    }
}

impl ContentDispatcher {
    pub fn new(text_scheme: KeyScheme) -> Self {
        Self { text_scheme }
    }

    pub fn process_file(&self, path: impl AsRef<Path>, content_type: &str) -> DispatchOutcome {
        let path = path.as_ref();
        let outcome = ContentKind::from_mime(content_type).and_then(|kind| {
            // Fully read and release the file before parsing.
            let bytes = fs::read(path)?;
            info!(path = %path.display(), bytes = bytes.len(), "read upload");
            self.parse_kind(kind, &bytes)
        });
        self.finish(outcome, content_type)
    }

    pub fn process_bytes(&self, bytes: &[u8], content_type: &str) -> DispatchOutcome {
        let outcome = ContentKind::from_mime(content_type).and_then(|kind| self.parse_kind(kind, bytes));
        self.finish(outcome, content_type)
    }

    fn parse_kind(&self, kind: ContentKind, bytes: &[u8]) -> Result<(ContentKind, ParsedContent)> {
        let content = match kind {
            ContentKind::Json => measured("json", ParsedContent::questionnaire, || {
                let value: Value = serde_json::from_slice(bytes)?;
                Ok(match Envelope::detect(&value)? {
                    Envelope::FlowNoMappings(q) => ParsedContent::FlowNoMappings(q),
                    other => ParsedContent::Questions(other.into_questionnaire()?),
                })
            })?,
            ContentKind::Text => {
                let parser = MetricsParser::new(TextQuestionnaireParser::new(self.text_scheme));
                ParsedContent::FlowNoMappings(parser.parse(bytes)?)
            }
        };
        Ok((kind, content))
    }

    fn finish(&self, outcome: Result<(ContentKind, ParsedContent)>, content_type: &str) -> DispatchOutcome {
        match outcome {
            Ok((kind, content)) => {
                DispatchMetrics::record_dispatch(kind.label(), true);
                info!(
                    content_type = kind.label(),
                    questions = content.questionnaire().len(),
                    "upload parsed"
                );
                DispatchOutcome::success(content)
            }
            Err(e) => {
                DispatchMetrics::record_dispatch("unsupported_or_failed", false);
                warn!(content_type = %content_type, error = %e, "upload rejected");
                DispatchOutcome::failure(&e)
            }
        }
    }
}

/// Dispatch with the default text key scheme (`FlowNo_<k>` running option keys).
pub fn process_file_content(path: impl AsRef<Path>, content_type: &str) -> DispatchOutcome {
    ContentDispatcher::default().process_file(path, content_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::metrics::{Counter, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit};
    use std::sync::Mutex;

    /// Remembers every counter registration as `name[format]`.
    #[derive(Default)]
    struct CounterLog {
        seen: Mutex<Vec<String>>,
    }

    impl Recorder for CounterLog {
        fn describe_counter(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
        fn describe_gauge(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
        fn describe_histogram(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

        fn register_counter(&self, key: &Key, _: &Metadata<'_>) -> Counter {
            let format = key
                .labels()
                .find(|l| l.key() == "format")
                .map(|l| l.value().to_string())
                .unwrap_or_default();
            self.seen.lock().unwrap().push(format!("{}[{}]", key.name(), format));
            Counter::noop()
        }

        fn register_gauge(&self, _: &Key, _: &Metadata<'_>) -> Gauge {
            Gauge::noop()
        }

        fn register_histogram(&self, _: &Key, _: &Metadata<'_>) -> Histogram {
            Histogram::noop()
        }
    }

    #[test]
    fn test_content_kind_from_mime() {
        assert_eq!(ContentKind::from_mime("application/json").unwrap(), ContentKind::Json);
        assert_eq!(ContentKind::from_mime("Application/JSON; charset=utf-8").unwrap(), ContentKind::Json);
        assert_eq!(ContentKind::from_mime("application/vnd.survey+json").unwrap(), ContentKind::Json);
        assert_eq!(ContentKind::from_mime("text/plain;charset=UTF-8").unwrap(), ContentKind::Text);
        assert!(matches!(
            ContentKind::from_mime("image/png"),
            Err(FlowError::UnsupportedContentType(_))
        ));
    }

    #[test]
    fn test_process_bytes_text_is_wrapped() {
        let outcome = ContentDispatcher::default().process_bytes(b"1. Sport?\n   - Soccer\n", "text/plain");
        let (result, message, error) = outcome.into_parts();
        assert_eq!(message, Some(PARSE_SUCCESS_MESSAGE));
        assert!(error.is_none());
        assert_eq!(result.unwrap()["flow_no_mappings"]["Q1"]["answers"]["FlowNo_1"], "Soccer");
    }

    #[test]
    fn test_process_bytes_unsupported_type() {
        let outcome = ContentDispatcher::default().process_bytes(b"whatever", "application/pdf");
        assert!(!outcome.is_ok());
        assert!(outcome.result.is_none());
        assert!(outcome.message.is_none());
        assert!(outcome.error.unwrap().contains("application/pdf"));
    }

    #[test]
    fn test_process_bytes_schema_failure_is_all_or_nothing() {
        let bytes = br#"{"questions": {"Q1": {"question": "ok", "answers": {}}, "Q2": {"question": "broken"}}}"#;
        let outcome = ContentDispatcher::default().process_bytes(bytes, "application/json");
        assert!(outcome.result.is_none());
        assert!(outcome.error.unwrap().contains("answers"));
    }

    #[test]
    fn test_process_bytes_rejects_invalid_utf8_text() {
        let outcome = ContentDispatcher::default().process_bytes(b"1. Caf\xe9?\n   - Oui\xff\n", "text/plain");
        assert!(outcome.result.is_none());
        assert!(outcome.message.is_none());
        assert!(outcome.error.unwrap().contains("UTF-8"));
    }

    #[test]
    fn test_both_formats_record_parser_metrics() {
        let log = CounterLog::default();
        ::metrics::with_local_recorder(&log, || {
            let dispatcher = ContentDispatcher::default();
            assert!(dispatcher
                .process_bytes(br#"{"Q1": {"question": "a", "answers": {"FlowNo_2=1": "Yes"}}}"#, "application/json")
                .is_ok());
            assert!(dispatcher.process_bytes(b"1. a\n - Yes\n", "text/plain").is_ok());
            assert!(!dispatcher.process_bytes(b"{broken", "application/json").is_ok());
        });

        let seen = log.seen.into_inner().unwrap();
        for expected in [
            "survey_flow_parser_sources_parsed_total[json]",
            "survey_flow_parser_sources_parsed_total[text]",
            "survey_flow_parser_errors_total[json]",
        ] {
            assert!(seen.iter().any(|s| s == expected), "missing {} in {:?}", expected, seen);
        }
    }

    #[test]
    fn test_custom_text_scheme() {
        let outcome = ContentDispatcher::new(KeyScheme::ivr()).process_bytes(b"1. Q\n - A\n", "text/plain");
        let result = outcome.result.unwrap();
        assert_eq!(result.questionnaire().get("Q1").unwrap().answer("FlowNo_2=1"), Some("A"));
    }
}
