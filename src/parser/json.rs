use serde_json::Value;
use tracing::{debug, info};

use super::Parser;
use crate::constants::{ANSWERS_FIELD, QUESTIONS_KEY, QUESTION_FIELD};
use crate::domain::{Question, Questionnaire};
use crate::error::{FlowError, Result};

/// Parses `{"questions": {"Q1": {"question": ..., "answers": {...}}}}` documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonQuestionnaireParser;

impl Parser for JsonQuestionnaireParser {
    fn format(&self) -> &'static str {
        "json"
    }

    fn parse(&self, bytes: &[u8]) -> Result<Questionnaire> {
        debug!("JsonQuestionnaireParser: start bytes_len={}", bytes.len());
        let v: Value = serde_json::from_slice(bytes)?;
        from_document(&v)
    }
}

/// Normalize a document carrying the questionnaire under `questions`.
pub fn from_document(document: &Value) -> Result<Questionnaire> {
    let questions = document
        .get(QUESTIONS_KEY)
        .ok_or_else(|| FlowError::schema(format!("missing required field '{}'", QUESTIONS_KEY)))?;
    from_mapping_at(questions, QUESTIONS_KEY)
}

/// Normalize a bare `{"Q1": {...}}` mapping.
pub fn from_mapping(mapping: &Value) -> Result<Questionnaire> {
    from_mapping_at(mapping, "$")
}

fn from_mapping_at(mapping: &Value, path: &str) -> Result<Questionnaire> {
    let entries = mapping
        .as_object()
        .ok_or_else(|| FlowError::schema(format!("'{}' must be an object of questions", path)))?;

    let mut model = Questionnaire::new();
    for (id, entry) in entries {
        let entry_path = format!("{}.{}", path, id);
        model.insert(id.clone(), question_from_value(entry, &entry_path)?);
    }

    info!(
        "JsonQuestionnaireParser: normalized questions={} answers={}",
        model.len(),
        model.answer_count()
    );
    Ok(model)
}

fn question_from_value(entry: &Value, path: &str) -> Result<Question> {
    let obj = entry
        .as_object()
        .ok_or_else(|| FlowError::schema(format!("'{}' must be an object", path)))?;

    let text = obj
        .get(QUESTION_FIELD)
        .ok_or_else(|| FlowError::schema(format!("'{}' is missing '{}'", path, QUESTION_FIELD)))?
        .as_str()
        .ok_or_else(|| FlowError::schema(format!("'{}.{}' must be a string", path, QUESTION_FIELD)))?;

    let answers = obj
        .get(ANSWERS_FIELD)
        .ok_or_else(|| FlowError::schema(format!("'{}' is missing '{}'", path, ANSWERS_FIELD)))?
        .as_object()
        .ok_or_else(|| FlowError::schema(format!("'{}.{}' must be an object", path, ANSWERS_FIELD)))?;

    let mut question = Question::new(text);
    for (key, label) in answers {
        let label = label.as_str().ok_or_else(|| {
            FlowError::schema(format!("'{}.{}.{}' must be a string label", path, ANSWERS_FIELD, key))
        })?;
        question.push_answer(key.clone(), label);
    }
    Ok(question)
}
