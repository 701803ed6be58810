//! Meta-score aggregation.
//!
//! The meta-score is the sum of eligible signal values, optionally scaled by
//! each system's static weight. Terms are summed in `system_id` order so the
//! floating-point result does not depend on input order.

use crate::domain::registry::SystemRegistry;
use crate::domain::signal::{Signal, SignalValue};
use std::fmt;

/// Agreement among the eligible signals. Reported only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Consensus {
    /// Every eligible signal is positive.
    Unanimous,
    /// No opposing directions, but not unanimously positive.
    Aligned,
    /// At least one positive and one negative signal.
    Conflicted,
}

impl fmt::Display for Consensus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Consensus::Unanimous => write!(f, "UNANIMOUS"),
            Consensus::Aligned => write!(f, "ALIGNED"),
            Consensus::Conflicted => write!(f, "CONFLICTED"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MetaScore {
    pub score: f64,
    pub eligible: usize,
    pub total_weight: f64,
    pub consensus: Consensus,
}

impl MetaScore {
    /// Score normalised by total eligible weight, in `[-1, 1]`.
    pub fn conviction(&self) -> f64 {
        if self.total_weight > 0.0 {
            self.score / self.total_weight
        } else {
            0.0
        }
    }
}

/// Unweighted sum of signal values.
pub fn aggregate(signals: &[Signal]) -> MetaScore {
    aggregate_with(signals, |_| 1.0)
}

/// Sum of signal values scaled by registry weights.
pub fn aggregate_weighted(signals: &[Signal], registry: &SystemRegistry) -> MetaScore {
    aggregate_with(signals, |id| registry.weight(id))
}

fn aggregate_with(signals: &[Signal], weight_of: impl Fn(&str) -> f64) -> MetaScore {
    let mut ordered: Vec<&Signal> = signals.iter().collect();
    ordered.sort_by(|a, b| a.system_id.cmp(&b.system_id));

    let mut score = 0.0;
    let mut total_weight = 0.0;
    for signal in &ordered {
        let weight = weight_of(&signal.system_id);
        score += signal.value.as_f64() * weight;
        total_weight += weight;
    }

    MetaScore {
        score,
        eligible: ordered.len(),
        total_weight,
        consensus: consensus(signals),
    }
}

pub fn consensus(signals: &[Signal]) -> Consensus {
    let positive = signals
        .iter()
        .filter(|s| s.value == SignalValue::Positive)
        .count();
    let negative = signals
        .iter()
        .filter(|s| s.value == SignalValue::Negative)
        .count();

    if positive > 0 && negative > 0 {
        Consensus::Conflicted
    } else if positive > 0 && positive == signals.len() {
        Consensus::Unanimous
    } else {
        Consensus::Aligned
    }
}
