use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::constants::FLOW_KEY_PREFIX;
use crate::error::{FlowError, Result};

static FLOW_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^FlowNo_(\d+)(?:=(\d+))?$").expect("flow key pattern is valid"));

/// Address of one answer option: `FlowNo_<question_num>=<flow_no>`.
///
/// `flow_no` is `None` for the degenerate `FlowNo_<question_num>` form.
/// Ordering is by `question_num`, then `flow_no`, with an absent `flow_no`
/// sorting before any present one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FlowKey {
    pub question_num: u32,
    pub flow_no: Option<u32>,
}

/// Wire shape of a decomposed key. An absent `flow_no` is reported as `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decomposition {
    pub question_num: u32,
    pub flow_no: u32,
}

impl FlowKey {
    pub fn new(question_num: u32, flow_no: u32) -> Self {
        Self {
            question_num,
            flow_no: Some(flow_no),
        }
    }

    pub fn bare(question_num: u32) -> Self {
        Self {
            question_num,
            flow_no: None,
        }
    }

    pub fn parse(key: &str) -> Result<Self> {
        let trimmed = key.trim();
        let caps = FLOW_KEY_RE
            .captures(trimmed)
            .ok_or_else(|| FlowError::MalformedKey(key.to_string()))?;

        let question_num = positive(&caps[1], key)?;
        let flow_no = caps
            .get(2)
            .map(|m| positive(m.as_str(), key))
            .transpose()?;

        Ok(Self {
            question_num,
            flow_no,
        })
    }

    pub fn decomposition(&self) -> Decomposition {
        Decomposition {
            question_num: self.question_num,
            flow_no: self.flow_no.unwrap_or(0),
        }
    }
}

fn positive(digits: &str, key: &str) -> Result<u32> {
    match digits.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(FlowError::MalformedKey(key.to_string())),
    }
}

impl fmt::Display for FlowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.flow_no {
            Some(flow_no) => write!(f, "{}{}={}", FLOW_KEY_PREFIX, self.question_num, flow_no),
            None => write!(f, "{}{}", FLOW_KEY_PREFIX, self.question_num),
        }
    }
}

impl FromStr for FlowKey {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self> {
        FlowKey::parse(s)
    }
}

/// Decompose a flow key string into its numeric parts.
pub fn decompose(key: &str) -> Result<Decomposition> {
    FlowKey::parse(key).map(|k| k.decomposition())
}

/// Format a `(question_num, flow_no)` pair back into a key; `flow_no == 0` yields the bare form.
/// `question_num` must be positive.
pub fn compose(question_num: u32, flow_no: u32) -> Result<String> {
    if question_num == 0 {
        return Err(FlowError::MalformedKey(format!(
            "{}{}={}",
            FLOW_KEY_PREFIX, question_num, flow_no
        )));
    }
    let key = if flow_no == 0 {
        FlowKey::bare(question_num)
    } else {
        FlowKey::new(question_num, flow_no)
    };
    Ok(key.to_string())
}

/// Numeric ordering of flow key strings. Malformed keys sort after
/// well-formed ones and fall back to plain string order among themselves.
pub fn compare_keys(a: &str, b: &str) -> Ordering {
    match (FlowKey::parse(a), FlowKey::parse(b)) {
        (Ok(ka), Ok(kb)) => ka.cmp(&kb),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

pub fn sort_keys<S: AsRef<str>>(keys: &mut [S]) {
    keys.sort_by(|a, b| compare_keys(a.as_ref(), b.as_ref()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decompose_full_key() {
        let d = decompose("FlowNo_2=3").unwrap();
        assert_eq!(
            d,
            Decomposition {
                question_num: 2,
                flow_no: 3
            }
        );
        assert_eq!(
            serde_json::to_value(d).unwrap(),
            serde_json::json!({"question_num": 2, "flow_no": 3})
        );
    }

    #[test]
    fn test_decompose_bare_key_reports_zero() {
        let key = FlowKey::parse("FlowNo_7").unwrap();
        assert_eq!(key.flow_no, None);
        assert_eq!(decompose("FlowNo_7").unwrap().flow_no, 0);
    }

    #[test]
    fn test_rejects_malformed_keys() {
        for bad in ["", "FlowNo_", "FlowNo_x=1", "FlowNo_2=", "Flow_2=1", "FlowNo_2=1=3", "FlowNo_0=1", "FlowNo_2=0"] {
            assert!(
                matches!(decompose(bad), Err(FlowError::MalformedKey(_))),
                "expected '{}' to be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_surrounding_whitespace_is_tolerated() {
        assert_eq!(FlowKey::parse("  FlowNo_4=2 ").unwrap(), FlowKey::new(4, 2));
    }

    #[test]
    fn test_compose() {
        assert_eq!(compose(2, 3).unwrap(), "FlowNo_2=3");
        assert_eq!(compose(1, 0).unwrap(), "FlowNo_1");
    }

    #[test]
    fn test_compose_rejects_zero_question() {
        assert!(matches!(compose(0, 4), Err(FlowError::MalformedKey(_))));
        assert!(matches!(compose(0, 0), Err(FlowError::MalformedKey(_))));
    }

    #[test]
    fn test_sort_keys_numeric_order() {
        let mut keys = vec!["FlowNo_10=1", "bogus", "FlowNo_2=10", "FlowNo_2=2", "FlowNo_2"];
        sort_keys(&mut keys);
        assert_eq!(keys, vec!["FlowNo_2", "FlowNo_2=2", "FlowNo_2=10", "FlowNo_10=1", "bogus"]);
    }
}
