use serde_json::Value;
use tracing::debug;

use crate::constants::{FLOW_NO_MAPPINGS_KEY, QUESTIONS_KEY};
use crate::domain::{FlatAnswerMap, Questionnaire};
use crate::error::{FlowError, Result};
use crate::parser::json::{from_document, from_mapping};

/// The JSON shapes questionnaires arrive in, detected once at the boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope {
    /// `{"flow_no_mappings": {"Q1": ...}}`
    FlowNoMappings(Questionnaire),
    /// `{"questions": {"Q1": ...}}`
    Questions(Questionnaire),
    /// `{"Q1": ...}`
    Bare(Questionnaire),
    /// `{"FlowNo_2=1": "label"}`, already flattened
    Flat(FlatAnswerMap),
}

impl Envelope {
    pub fn detect(value: &Value) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| FlowError::schema("questionnaire payload must be a JSON object"))?;

        if let Some(inner) = obj.get(FLOW_NO_MAPPINGS_KEY) {
            debug!("envelope detected: {}", FLOW_NO_MAPPINGS_KEY);
            return Ok(Envelope::FlowNoMappings(from_mapping(inner)?));
        }
        if obj.contains_key(QUESTIONS_KEY) {
            debug!("envelope detected: {}", QUESTIONS_KEY);
            return Ok(Envelope::Questions(from_document(value)?));
        }
        if !obj.is_empty() && obj.values().all(Value::is_string) {
            debug!("envelope detected: flat");
            let mut flat = FlatAnswerMap::new();
            for (key, label) in obj {
                flat.insert(key.clone(), label.as_str().unwrap_or_default());
            }
            return Ok(Envelope::Flat(flat));
        }
        Ok(Envelope::Bare(from_mapping(value)?))
    }

    /// The canonical model, if this envelope carries one.
    pub fn into_questionnaire(self) -> Result<Questionnaire> {
        match self {
            Envelope::FlowNoMappings(q) | Envelope::Questions(q) | Envelope::Bare(q) => Ok(q),
            Envelope::Flat(_) => Err(FlowError::schema(
                "payload is an already-flattened answer map, not a questionnaire",
            )),
        }
    }

    pub fn flatten(&self) -> FlatAnswerMap {
        match self {
            Envelope::FlowNoMappings(q) | Envelope::Questions(q) | Envelope::Bare(q) => flatten(q),
            Envelope::Flat(flat) => flat.clone(),
        }
    }
}

/// Collapse question grouping into one flow key to label map.
/// A key repeated across questions keeps the label of its last occurrence.
pub fn flatten(model: &Questionnaire) -> FlatAnswerMap {
    let mut flat = FlatAnswerMap::new();
    for (_, question) in model.iter() {
        for answer in question.answers() {
            flat.insert(answer.key.as_str(), answer.label.as_str());
        }
    }
    flat
}

/// Flatten any accepted JSON envelope.
pub fn flatten_value(value: &Value) -> Result<FlatAnswerMap> {
    Ok(Envelope::detect(value)?.flatten())
}
