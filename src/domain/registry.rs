//! Static registry of signal-producing systems.
//!
//! Each system has a fixed horizon and a significance weight. An empty
//! registry means every signal counts with weight 1.0.

use crate::domain::error::MetaEngineError;
use crate::domain::signal::Horizon;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SystemSpec {
    pub horizon: Horizon,
    pub weight: f64,
}

impl SystemSpec {
    pub fn new(horizon: Horizon, weight: f64) -> Result<Self, String> {
        if !weight.is_finite() || weight <= 0.0 {
            return Err(format!("weight must be finite and positive, got {weight}"));
        }
        Ok(SystemSpec { horizon, weight })
    }

    /// Parses `horizon[, weight]`, e.g. `long, 1.5` or `medium`.
    pub fn parse(value: &str) -> Result<Self, MetaEngineError> {
        let mut parts = value.split(',').map(str::trim);
        let horizon: Horizon = parts.next().unwrap_or_default().parse()?;
        let weight = match parts.next() {
            None | Some("") => 1.0,
            Some(w) => w
                .parse::<f64>()
                .map_err(|_| MetaEngineError::input("systems", format!("invalid weight {w:?}")))?,
        };
        if parts.next().is_some() {
            return Err(MetaEngineError::input(
                "systems",
                format!("expected 'horizon[, weight]', got {value:?}"),
            ));
        }
        SystemSpec::new(horizon, weight).map_err(|reason| MetaEngineError::input("systems", reason))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SystemRegistry {
    systems: BTreeMap<String, SystemSpec>,
}

impl SystemRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, system_id: impl Into<String>, spec: SystemSpec) -> Option<SystemSpec> {
        self.systems.insert(system_id.into(), spec)
    }

    /// Builder form of [`register`](Self::register); rejects invalid weights.
    pub fn with_system(
        mut self,
        system_id: &str,
        horizon: Horizon,
        weight: f64,
    ) -> Result<Self, String> {
        let spec = SystemSpec::new(horizon, weight)?;
        self.systems.insert(system_id.to_string(), spec);
        Ok(self)
    }

    pub fn get(&self, system_id: &str) -> Option<&SystemSpec> {
        self.systems.get(system_id)
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    pub fn len(&self) -> usize {
        self.systems.len()
    }

    /// Weight for a system; unregistered systems count 1.0.
    pub fn weight(&self, system_id: &str) -> f64 {
        self.systems.get(system_id).map_or(1.0, |s| s.weight)
    }

    pub fn horizon(&self, system_id: &str) -> Option<Horizon> {
        self.systems.get(system_id).map(|s| s.horizon)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SystemSpec)> {
        self.systems.iter().map(|(id, spec)| (id.as_str(), spec))
    }
}
