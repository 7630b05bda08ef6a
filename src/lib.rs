//! Normalizes questionnaire definitions, authored either as structured JSON or
//! as numbered free text, into one canonical model addressed by flow keys
//! (`FlowNo_<question>=<option>`), and provides the flattening and income
//! classification passes that run over it.

pub mod config;
pub mod constants;
pub mod dispatch;
pub mod domain;
pub mod error;
pub mod flatten;
pub mod flow_key;
pub mod income;
pub mod logging;
pub mod metrics;
pub mod parser;

pub use dispatch::{process_file_content, ContentDispatcher, DispatchOutcome, ParsedContent};
pub use domain::{Answer, FlatAnswerMap, Question, Questionnaire};
pub use error::{FlowError, Result};
pub use flatten::{flatten, flatten_value, Envelope};
pub use flow_key::{decompose, Decomposition, FlowKey};
pub use income::{classify_income, Classification, IncomeBracket, IncomeClassifier};
pub use parser::text::{parse_text, parse_text_with};
