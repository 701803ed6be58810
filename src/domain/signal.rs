//! Tri-state system signals and their temporal horizons.

use crate::domain::error::MetaEngineError;
use std::fmt;
use std::str::FromStr;

/// Directional output of one evaluation system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SignalValue {
    Positive,
    Neutral,
    Negative,
}

impl SignalValue {
    pub fn as_i8(self) -> i8 {
        match self {
            SignalValue::Positive => 1,
            SignalValue::Neutral => 0,
            SignalValue::Negative => -1,
        }
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.as_i8())
    }

    pub fn from_i8(value: i8) -> Option<Self> {
        match value {
            1 => Some(SignalValue::Positive),
            0 => Some(SignalValue::Neutral),
            -1 => Some(SignalValue::Negative),
            _ => None,
        }
    }
}

impl fmt::Display for SignalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalValue::Positive => write!(f, "+1"),
            SignalValue::Neutral => write!(f, "0"),
            SignalValue::Negative => write!(f, "-1"),
        }
    }
}

impl FromStr for SignalValue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1" | "+1" | "positive" | "long" => Ok(SignalValue::Positive),
            "0" | "+0" | "-0" | "neutral" | "flat" => Ok(SignalValue::Neutral),
            "-1" | "negative" | "short" => Ok(SignalValue::Negative),
            other => Err(format!("invalid signal value {other:?}, expected -1, 0 or 1")),
        }
    }
}

/// Validity window of a signal or of the capital being deployed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Horizon {
    Short,
    Medium,
    Long,
}

impl Horizon {
    pub const ALL: [Horizon; 3] = [Horizon::Short, Horizon::Medium, Horizon::Long];

    pub fn label(self) -> &'static str {
        match self {
            Horizon::Short => "short",
            Horizon::Medium => "medium",
            Horizon::Long => "long",
        }
    }

    /// Nominal holding window in days. `None` upper bound means open-ended.
    pub fn nominal_days(self) -> (u32, Option<u32>) {
        match self {
            Horizon::Short => (1, Some(3)),
            Horizon::Medium => (14, Some(30)),
            Horizon::Long => (60, None),
        }
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Horizon {
    type Err = MetaEngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "short" | "s" => Ok(Horizon::Short),
            "medium" | "m" => Ok(Horizon::Medium),
            "long" | "l" => Ok(Horizon::Long),
            _ => Err(MetaEngineError::UnknownHorizon(s.trim().to_string())),
        }
    }
}

/// One system's output for the current cycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Signal {
    pub system_id: String,
    pub value: SignalValue,
    pub horizon: Horizon,
}

impl Signal {
    pub fn new(system_id: impl Into<String>, value: SignalValue, horizon: Horizon) -> Self {
        Signal {
            system_id: system_id.into(),
            value,
            horizon,
        }
    }
}
