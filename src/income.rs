//! Household income tier classification from free-text ranges such as
//! `"RM4,850 & below"` or `"RM10,961 to RM15,039"`.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::{B40_UPPER_LIMIT, M40_UPPER_LIMIT};
use crate::error::{FlowError, Result};
use crate::metrics::ClassifierMetrics;

static QUANTITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("quantity pattern is valid"));
static UPPER_ONLY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:below|less|under|maximum|max|up\s+to)\b").expect("upper qualifier pattern is valid")
});
static LOWER_ONLY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:above|more|over|minimum|min)\b|\d\s*\+").expect("lower qualifier pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IncomeBracket {
    B40,
    M40,
    T20,
}

impl IncomeBracket {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncomeBracket::B40 => "B40",
            IncomeBracket::M40 => "M40",
            IncomeBracket::T20 => "T20",
        }
    }
}

impl fmt::Display for IncomeBracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IncomeBracket {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "B40" => Ok(IncomeBracket::B40),
            "M40" => Ok(IncomeBracket::M40),
            "T20" => Ok(IncomeBracket::T20),
            other => Err(FlowError::Config(format!("unknown income bracket '{}'", other))),
        }
    }
}

/// Inclusive upper limits for the two lower tiers, in whole currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IncomeThresholds {
    pub b40_upper: u64,
    pub m40_upper: u64,
}

impl Default for IncomeThresholds {
    fn default() -> Self {
        Self {
            b40_upper: B40_UPPER_LIMIT,
            m40_upper: M40_UPPER_LIMIT,
        }
    }
}

impl IncomeThresholds {
    pub fn validate(&self) -> Result<()> {
        if self.b40_upper >= self.m40_upper {
            return Err(FlowError::Config(format!(
                "b40_upper ({}) must be below m40_upper ({})",
                self.b40_upper, self.m40_upper
            )));
        }
        Ok(())
    }

    pub fn bracket_for(&self, value: u64) -> IncomeBracket {
        if value <= self.b40_upper {
            IncomeBracket::B40
        } else if value <= self.m40_upper {
            IncomeBracket::M40
        } else {
            IncomeBracket::T20
        }
    }
}

/// Inclusive income range; `upper == None` is unbounded above.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IncomeRange {
    pub lower: u64,
    pub upper: Option<u64>,
}

impl IncomeRange {
    pub fn parse(text: &str) -> Result<Self> {
        let cleaned = text.replace(',', "");
        let quantities = QUANTITY_RE
            .find_iter(&cleaned)
            .map(|m| whole_units(m.as_str()).ok_or_else(|| FlowError::UnparsableIncomeRange(text.to_string())))
            .collect::<Result<Vec<u64>>>()?;

        let range = match quantities.as_slice() {
            [] => return Err(FlowError::UnparsableIncomeRange(text.to_string())),
            [q] if UPPER_ONLY_RE.is_match(&cleaned) => IncomeRange { lower: 0, upper: Some(*q) },
            [q] if LOWER_ONLY_RE.is_match(&cleaned) => IncomeRange { lower: *q, upper: None },
            [q] => IncomeRange { lower: *q, upper: Some(*q) },
            [a, b, ..] => IncomeRange {
                lower: *a.min(b),
                upper: Some(*a.max(b)),
            },
        };
        Ok(range)
    }

    /// Upper bound if bounded, else lower bound.
    pub fn representative(&self) -> u64 {
        self.upper.unwrap_or(self.lower)
    }
}

fn whole_units(quantity: &str) -> Option<u64> {
    quantity.split('.').next()?.parse().ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub income_group: IncomeBracket,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IncomeClassifier {
    thresholds: IncomeThresholds,
}

impl IncomeClassifier {
    pub fn new(thresholds: IncomeThresholds) -> Self {
        Self { thresholds }
    }

    pub fn classify(&self, text: &str) -> Result<Classification> {
        let range = match IncomeRange::parse(text) {
            Ok(range) => range,
            Err(e) => {
                ClassifierMetrics::record_unparsable();
                return Err(e);
            }
        };
        let income_group = self.thresholds.bracket_for(range.representative());
        debug!(
            "classified '{}' lower={} upper={:?} group={}",
            text, range.lower, range.upper, income_group
        );
        ClassifierMetrics::record_classification(income_group.as_str());
        Ok(Classification { income_group })
    }
}

/// Classify with the default thresholds.
pub fn classify_income(text: &str) -> Result<Classification> {
    IncomeClassifier::default().classify(text)
}
