use crate::domain::Questionnaire;
use crate::error::{FlowError, Result};
use crate::metrics::ParserMetrics;

pub mod json;
pub mod text;

pub use json::JsonQuestionnaireParser;
pub use text::{KeyScheme, TextQuestionnaireParser};

/// A source format that can be turned into the canonical questionnaire.
pub trait Parser {
    /// Short format name used in logs and metrics labels
    fn format(&self) -> &'static str;

    fn parse(&self, bytes: &[u8]) -> Result<Questionnaire>;
}

/// A wrapper that adds metrics to any parser implementation
pub struct MetricsParser<P: Parser> {
    inner: P,
}

impl<P: Parser> MetricsParser<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }
}

impl<P: Parser> Parser for MetricsParser<P> {
    fn format(&self) -> &'static str {
        self.inner.format()
    }

    fn parse(&self, bytes: &[u8]) -> Result<Questionnaire> {
        measured(self.format(), |model| model, || self.inner.parse(bytes))
    }
}

/// Run a parse and record its outcome under `format`. `model_of` picks the
/// questionnaire out of whatever shape the parse produces.
pub(crate) fn measured<T>(
    format: &'static str,
    model_of: fn(&T) -> &Questionnaire,
    parse: impl FnOnce() -> Result<T>,
) -> Result<T> {
    let start_time = std::time::Instant::now();

    match parse() {
        Ok(parsed) => {
            let model = model_of(&parsed);
            ParserMetrics::record_parse_success(
                format,
                model.len(),
                model.answer_count(),
                start_time.elapsed().as_secs_f64(),
            );
            Ok(parsed)
        }
        Err(e) => {
            ParserMetrics::record_parse_error(format, error_type(&e));
            Err(e)
        }
    }
}

fn error_type(e: &FlowError) -> &'static str {
    match e {
        FlowError::MalformedKey(_) => "malformed_key",
        FlowError::Schema(_) => "schema",
        FlowError::InvalidJson(_) => "invalid_json",
        FlowError::InvalidText(_) => "invalid_text",
        FlowError::Io(_) => "io",
        _ => "other",
    }
}
