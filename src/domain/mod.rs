//! Canonical questionnaire shapes shared by every parser and by the flattener.
//!
//! Both maps here are insertion ordered: authored order is the only ordering
//! downstream export relies on, so they are kept as vectors of pairs and
//! serialized as JSON objects.
//!
//! Lookups and inserts scan linearly, so building a map is quadratic in its
//! size. Inputs are single uploaded questionnaires of tens to a few hundred
//! entries; these are not general-purpose maps.

use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::{ANSWERS_FIELD, QUESTION_FIELD};

/// One answer option: a flow-key string and the label authored for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub key: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Question {
    pub question: String,
    answers: Vec<Answer>,
}

impl Question {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answers: Vec::new(),
        }
    }

    /// Add an option. A repeated key keeps its original position and takes the new label.
    pub fn push_answer(&mut self, key: impl Into<String>, label: impl Into<String>) {
        let key = key.into();
        let label = label.into();
        match self.answers.iter_mut().find(|a| a.key == key) {
            Some(existing) => existing.label = label,
            None => self.answers.push(Answer { key, label }),
        }
    }

    pub fn answer(&self, key: &str) -> Option<&str> {
        self.answers
            .iter()
            .find(|a| a.key == key)
            .map(|a| a.label.as_str())
    }

    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }
}

impl Serialize for Question {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        struct Answers<'a>(&'a [Answer]);

        impl Serialize for Answers<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let mut map = serializer.serialize_map(Some(self.0.len()))?;
                for answer in self.0 {
                    map.serialize_entry(&answer.key, &answer.label)?;
                }
                map.end()
            }
        }

        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry(QUESTION_FIELD, &self.question)?;
        map.serialize_entry(ANSWERS_FIELD, &Answers(&self.answers))?;
        map.end()
    }
}

/// The canonical model: question id (`Q1`, `Q2`, ...) to question, in authored order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Questionnaire {
    questions: Vec<(String, Question)>,
}

impl Questionnaire {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a question. Re-using an id replaces that question in place.
    pub fn insert(&mut self, id: impl Into<String>, question: Question) {
        let id = id.into();
        match self.questions.iter_mut().find(|(existing, _)| *existing == id) {
            Some((_, slot)) => *slot = question,
            None => self.questions.push((id, question)),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Question> {
        self.questions
            .iter()
            .find(|(existing, _)| existing == id)
            .map(|(_, q)| q)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.questions.iter().map(|(id, _)| id.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Question)> {
        self.questions.iter().map(|(id, q)| (id.as_str(), q))
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn answer_count(&self) -> usize {
        self.questions.iter().map(|(_, q)| q.answers.len()).sum()
    }

    pub fn to_value(&self) -> serde_json::Value {
        // Serializing plain strings into a Value cannot fail.
        serde_json::to_value(self).unwrap_or_default()
    }
}

impl Serialize for Questionnaire {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.questions.len()))?;
        for (id, question) in &self.questions {
            map.serialize_entry(id, question)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Questionnaire {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        crate::parser::json::from_mapping(&value).map_err(D::Error::custom)
    }
}

/// Flow key to answer label with question grouping removed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FlatAnswerMap {
    entries: Vec<(String, String)>,
}

impl FlatAnswerMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last write wins on a duplicate key; the key keeps its first position.
    pub fn insert(&mut self, key: impl Into<String>, label: impl Into<String>) {
        let key = key.into();
        let label = label.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = label,
            None => self.entries.push((key, label)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for FlatAnswerMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, label) in &self.entries {
            map.serialize_entry(key, label)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_question_serializes_in_authored_order() {
        let mut q = Question::new("Favourite colour?");
        q.push_answer("FlowNo_1=2", "Red");
        q.push_answer("FlowNo_1=1", "Blue");

        let text = serde_json::to_string(&q).unwrap();
        assert_eq!(
            text,
            r#"{"question":"Favourite colour?","answers":{"FlowNo_1=2":"Red","FlowNo_1=1":"Blue"}}"#
        );
    }

    #[test]
    fn test_repeated_answer_key_keeps_position() {
        let mut q = Question::new("?");
        q.push_answer("FlowNo_1=1", "A");
        q.push_answer("FlowNo_1=2", "B");
        q.push_answer("FlowNo_1=1", "C");

        let labels: Vec<&str> = q.answers().iter().map(|a| a.label.as_str()).collect();
        assert_eq!(labels, vec!["C", "B"]);
    }

    #[test]
    fn test_questionnaire_to_value() {
        let mut q1 = Question::new("Did you vote?");
        q1.push_answer("FlowNo_2=1", "Yes");
        let mut model = Questionnaire::new();
        model.insert("Q1", q1);

        assert_eq!(
            model.to_value(),
            json!({"Q1": {"question": "Did you vote?", "answers": {"FlowNo_2=1": "Yes"}}})
        );
        assert_eq!(model.answer_count(), 1);
    }

    #[test]
    fn test_questionnaire_deserializes_bare_mapping() {
        let model: Questionnaire = serde_json::from_value(json!({
            "Q1": {"question": "Did you vote?", "answers": {"FlowNo_2=1": "Yes", "FlowNo_2=2": "No"}}
        }))
        .unwrap();

        assert_eq!(model.get("Q1").unwrap().answer("FlowNo_2=2"), Some("No"));
    }

    #[test]
    fn test_flat_map_last_write_wins() {
        let mut flat = FlatAnswerMap::new();
        flat.insert("FlowNo_1", "Soccer");
        flat.insert("FlowNo_2", "Basketball");
        flat.insert("FlowNo_1", "Tennis");

        assert_eq!(flat.len(), 2);
        assert_eq!(flat.get("FlowNo_1"), Some("Tennis"));
        assert_eq!(flat.keys().collect::<Vec<_>>(), vec!["FlowNo_1", "FlowNo_2"]);
    }

    #[test]
    fn test_large_questionnaire_keeps_order_and_replaces_in_place() {
        let mut model = Questionnaire::new();
        for n in 1..=500u32 {
            let mut q = Question::new(format!("Question {}", n));
            for k in 1..=4 {
                q.push_answer(format!("FlowNo_{}={}", n, k), format!("Option {}", k));
            }
            model.insert(format!("Q{}", n), q);
        }
        model.insert("Q250", Question::new("Replaced"));

        assert_eq!(model.len(), 500);
        assert_eq!(model.answer_count(), 499 * 4);
        assert_eq!(model.ids().nth(249), Some("Q250"));
        assert_eq!(model.get("Q250").unwrap().question, "Replaced");
        assert_eq!(model.ids().last(), Some("Q500"));
    }
}
