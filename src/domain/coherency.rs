//! Time-coherency gate.
//!
//! A signal may only inform a decision made at its own horizon. Signals at
//! any other horizon are dropped before aggregation, never coerced. Dropping
//! is the expected, frequent case and is not an error.

use crate::domain::error::MetaEngineError;
use crate::domain::registry::SystemRegistry;
use crate::domain::signal::{Horizon, Signal};
use std::collections::HashSet;

/// Keeps only the signals whose horizon equals `context`.
pub fn filter(signals: &[Signal], context: Horizon) -> Vec<Signal> {
    signals
        .iter()
        .filter(|s| s.horizon == context)
        .cloned()
        .collect()
}

/// Result of screening one cycle's signals for a decision context.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GateOutcome {
    pub eligible: Vec<Signal>,
    pub horizon_discarded: usize,
    pub unknown_systems: Vec<String>,
    pub horizon_conflicts: Vec<String>,
}

/// Screens a cycle's signals against the registry, then applies [`filter`].
///
/// Duplicated system ids fail the whole cycle. With a non-empty registry,
/// unregistered systems and signals that disagree with their registered
/// horizon are dropped and listed in the outcome.
pub fn screen(
    signals: &[Signal],
    registry: &SystemRegistry,
    context: Horizon,
) -> Result<GateOutcome, MetaEngineError> {
    let mut seen = HashSet::new();
    for signal in signals {
        if !seen.insert(signal.system_id.as_str()) {
            return Err(MetaEngineError::DuplicateSignal(signal.system_id.clone()));
        }
    }

    let mut outcome = GateOutcome::default();
    let mut registered = Vec::with_capacity(signals.len());

    for signal in signals {
        if registry.is_empty() {
            registered.push(signal.clone());
            continue;
        }
        match registry.horizon(&signal.system_id) {
            None => {
                tracing::warn!(system = %signal.system_id, "dropping signal from unregistered system");
                outcome.unknown_systems.push(signal.system_id.clone());
            }
            Some(h) if h != signal.horizon => {
                tracing::warn!(
                    system = %signal.system_id,
                    registered = %h,
                    supplied = %signal.horizon,
                    "dropping signal with conflicting horizon"
                );
                outcome.horizon_conflicts.push(signal.system_id.clone());
            }
            Some(_) => registered.push(signal.clone()),
        }
    }

    outcome.eligible = filter(&registered, context);
    outcome.horizon_discarded = registered.len() - outcome.eligible.len();
    Ok(outcome)
}
