/// Shared literals used across parsing, flattening and dispatch.
/// These names are part of the interchange format; renaming any of them breaks
/// callers that read the produced JSON.

// Envelope keys
pub const QUESTIONS_KEY: &str = "questions";
pub const FLOW_NO_MAPPINGS_KEY: &str = "flow_no_mappings";
pub const QUESTION_FIELD: &str = "question";
pub const ANSWERS_FIELD: &str = "answers";

// Flow key prefix, as in `FlowNo_2=1`
pub const FLOW_KEY_PREFIX: &str = "FlowNo_";

// Question id prefix, as in `Q1`
pub const QUESTION_ID_PREFIX: &str = "Q";

// Content types accepted by the dispatcher
pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_TEXT: &str = "text/plain";

pub const PARSE_SUCCESS_MESSAGE: &str = "Questions and answers parsed successfully.✨";

// Household income cut points in RM/month (DOSM Household Income Survey 2019).
// B40 covers incomes up to and including B40_UPPER_LIMIT, M40 up to M40_UPPER_LIMIT,
// everything above is T20.
pub const B40_UPPER_LIMIT: u64 = 4_850;
pub const M40_UPPER_LIMIT: u64 = 10_959;

/// Format the question id for a 1-based question number.
pub fn question_id(question_num: u32) -> String {
    format!("{}{}", QUESTION_ID_PREFIX, question_num)
}
