//! Parse and classification counters.
//!
//! Recorded through the `metrics` facade; without an installed recorder these are no-ops.

pub struct ParserMetrics;

impl ParserMetrics {
    /// Record a successful parse of one questionnaire source
    pub fn record_parse_success(format: &'static str, questions: usize, answers: usize, duration_secs: f64) {
        ::metrics::counter!("survey_flow_parser_sources_parsed_total", "format" => format).increment(1);
        ::metrics::counter!("survey_flow_parser_questions_total", "format" => format)
            .increment(questions as u64);
        ::metrics::counter!("survey_flow_parser_answers_total", "format" => format)
            .increment(answers as u64);
        ::metrics::histogram!("survey_flow_parser_duration_seconds", "format" => format)
            .record(duration_secs);
    }

    /// Record a parsing error
    pub fn record_parse_error(format: &'static str, error_type: &'static str) {
        ::metrics::counter!(
            "survey_flow_parser_errors_total",
            "format" => format,
            "error_type" => error_type
        )
        .increment(1);
    }
}

pub struct ClassifierMetrics;

impl ClassifierMetrics {
    pub fn record_classification(bracket: &'static str) {
        ::metrics::counter!("survey_flow_income_classified_total", "bracket" => bracket).increment(1);
    }

    pub fn record_unparsable() {
        ::metrics::counter!("survey_flow_income_unparsable_total").increment(1);
    }
}

pub struct DispatchMetrics;

impl DispatchMetrics {
    pub fn record_dispatch(content_type: &'static str, ok: bool) {
        let outcome = if ok { "ok" } else { "error" };
        ::metrics::counter!(
            "survey_flow_dispatch_total",
            "content_type" => content_type,
            "outcome" => outcome
        )
        .increment(1);
    }
}
