//! Numbered free-text questionnaires.
//!
//! ```text
//! 1. What is your favorite fruit?
//!    - Apple
//!    - Banana
//!
//! 2. What is your favorite color?
//!    - Blue
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::Parser;
use crate::constants::question_id;
use crate::domain::{Question, Questionnaire};
use crate::error::{FlowError, Result};
use crate::flow_key::FlowKey;

static QUESTION_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d+)\.(?:\s+(.*?))?\s*$").expect("question line pattern is valid"));
static OPTION_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*-\s*(.*?)\s*$").expect("option line pattern is valid"));

/// How option keys are synthesized from question number and option position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scheme", rename_all = "snake_case")]
pub enum KeyScheme {
    /// `FlowNo_<question_num + node_offset>=<position>`
    Qualified { node_offset: u32 },
    /// `FlowNo_<k>`, `k` counting options across the whole questionnaire
    Sequential,
}

impl KeyScheme {
    /// Call-flow layout where node 1 is the greeting, so question 1 lives on node 2.
    pub fn ivr() -> Self {
        KeyScheme::Qualified { node_offset: 1 }
    }

    fn key(&self, question_num: u32, position: u32, running: u32) -> Result<FlowKey> {
        match *self {
            KeyScheme::Qualified { node_offset } => {
                let node = question_num.checked_add(node_offset).ok_or_else(|| {
                    FlowError::schema(format!("question number {} overflows the flow node range", question_num))
                })?;
                Ok(FlowKey::new(node, position))
            }
            KeyScheme::Sequential => Ok(FlowKey::bare(running)),
        }
    }
}

impl Default for KeyScheme {
    fn default() -> Self {
        KeyScheme::Qualified { node_offset: 0 }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TextQuestionnaireParser {
    pub scheme: KeyScheme,
}

impl TextQuestionnaireParser {
    pub fn new(scheme: KeyScheme) -> Self {
        Self { scheme }
    }
}

impl Parser for TextQuestionnaireParser {
    fn format(&self) -> &'static str {
        "text"
    }

    fn parse(&self, bytes: &[u8]) -> Result<Questionnaire> {
        debug!("TextQuestionnaireParser: start bytes_len={}", bytes.len());
        let text = std::str::from_utf8(bytes)?;
        parse_text_with(text, self.scheme)
    }
}

/// Parse with the default `FlowNo_<question_num>=<position>` keys.
pub fn parse_text(text: &str) -> Result<Questionnaire> {
    parse_text_with(text, KeyScheme::default())
}

pub fn parse_text_with(text: &str, scheme: KeyScheme) -> Result<Questionnaire> {
    let mut model = Questionnaire::new();
    // (question number, question being filled, options seen so far)
    let mut current: Option<(u32, Question, u32)> = None;
    let mut running = 0u32;

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }

        if let Some(caps) = QUESTION_LINE_RE.captures(line) {
            let question_num = match caps[1].parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(FlowError::schema(format!(
                        "line {}: question number '{}' must be a positive integer",
                        line_no, &caps[1]
                    )))
                }
            };
            if let Some((num, question, _)) = current.take() {
                model.insert(question_id(num), question);
            }
            let question_text = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
            current = Some((question_num, Question::new(question_text), 0));
            continue;
        }

        if let Some(caps) = OPTION_LINE_RE.captures(line) {
            match current.as_mut() {
                Some((num, question, position)) => {
                    *position += 1;
                    running += 1;
                    let key = scheme.key(*num, *position, running)?;
                    question.push_answer(key.to_string(), &caps[1]);
                }
                None => warn!("line {}: option before any question ignored", line_no),
            }
            continue;
        }

        debug!("line {}: unrecognised line ignored", line_no);
    }

    if let Some((num, question, _)) = current.take() {
        model.insert(question_id(num), question);
    }

    info!(
        "TextQuestionnaireParser: parsed questions={} answers={}",
        model.len(),
        model.answer_count()
    );
    Ok(model)
}
