//! Engine configuration loading and validation.
//!
//! Every check runs at load time. A configuration that passes here cannot
//! fail at decision time.

use crate::domain::allocation::SizingBands;
use crate::domain::asset::{parse_assets, Asset};
use crate::domain::engine::{Composition, EngineConfig};
use crate::domain::error::MetaEngineError;
use crate::domain::registry::{SystemRegistry, SystemSpec};
use crate::domain::relative_strength::{RelativeStrengthNetwork, SelectionMode};
use crate::domain::signal::Horizon;
use crate::domain::tournament::TournamentSelector;
use crate::ports::config_port::ConfigPort;

pub const ENGINE: &str = "engine";
pub const RELATIVE_STRENGTH: &str = "relative_strength";
pub const TOURNAMENT: &str = "tournament";
pub const SYSTEMS: &str = "systems";

pub const DEFAULT_THRESHOLD_LOW: f64 = 3.0;
pub const DEFAULT_THRESHOLD_HIGH: f64 = 6.0;
pub const DEFAULT_SIZE_LOW: f64 = 0.25;
pub const DEFAULT_SIZE_HIGH: f64 = 0.50;
pub const DEFAULT_TOURNAMENT_SLICE: f64 = 0.15;

pub fn build_engine_config(config: &dyn ConfigPort) -> Result<EngineConfig, MetaEngineError> {
    let horizon = read_horizon(config)?;
    let bands = read_bands(config)?;
    let composition = read_parsed(config, ENGINE, "composition", Composition::Additive)?;
    let registry = read_registry(config)?;
    let relative_strength = read_relative_strength(config)?;
    let tournament = read_tournament(config)?;

    Ok(EngineConfig {
        horizon,
        bands,
        registry,
        relative_strength,
        tournament,
        composition,
    })
}

fn read_horizon(config: &dyn ConfigPort) -> Result<Horizon, MetaEngineError> {
    match config.get_string(ENGINE, "horizon") {
        Some(label) => label.parse(),
        None => Err(MetaEngineError::missing(ENGINE, "horizon")),
    }
}

fn read_bands(config: &dyn ConfigPort) -> Result<SizingBands, MetaEngineError> {
    let threshold_low = read_f64(config, ENGINE, "threshold_low", DEFAULT_THRESHOLD_LOW)?;
    let threshold_high = read_f64(config, ENGINE, "threshold_high", DEFAULT_THRESHOLD_HIGH)?;
    let size_low = read_f64(config, ENGINE, "size_low", DEFAULT_SIZE_LOW)?;
    let size_high = read_f64(config, ENGINE, "size_high", DEFAULT_SIZE_HIGH)?;

    SizingBands::new(threshold_low, threshold_high, size_low, size_high)
        .map_err(|(key, reason)| MetaEngineError::invalid(ENGINE, key, reason))
}

fn read_registry(config: &dyn ConfigPort) -> Result<SystemRegistry, MetaEngineError> {
    let mut registry = SystemRegistry::new();
    for system_id in config.keys(SYSTEMS) {
        let value = config.get_string(SYSTEMS, &system_id).unwrap_or_default();
        let spec = SystemSpec::parse(&value).map_err(|e| match e {
            MetaEngineError::UnknownHorizon(_) => e,
            other => MetaEngineError::invalid(SYSTEMS, &system_id, other.to_string()),
        })?;
        registry.register(system_id, spec);
    }
    Ok(registry)
}

fn read_relative_strength(
    config: &dyn ConfigPort,
) -> Result<Option<RelativeStrengthNetwork>, MetaEngineError> {
    let mode = read_parsed(config, ENGINE, "rs_selection", SelectionMode::Dominance)?;
    let Some(candidates) = read_assets(config, RELATIVE_STRENGTH, "candidates")? else {
        return Ok(None);
    };

    let benchmark = match config.get_string(RELATIVE_STRENGTH, "benchmark") {
        Some(b) if !b.trim().is_empty() => Asset::new(&b),
        _ => None,
    };

    RelativeStrengthNetwork::new(candidates, benchmark, mode)
        .map(Some)
        .map_err(|reason| MetaEngineError::invalid(RELATIVE_STRENGTH, "benchmark", reason))
}

fn read_tournament(config: &dyn ConfigPort) -> Result<Option<TournamentSelector>, MetaEngineError> {
    let slice = read_f64(config, ENGINE, "tournament_slice", DEFAULT_TOURNAMENT_SLICE)?;
    let Some(candidates) = read_assets(config, TOURNAMENT, "candidates")? else {
        return Ok(None);
    };
    Ok(Some(TournamentSelector::new(candidates, slice)?))
}

/// Reads an optional comma-separated asset list. An absent section is `None`;
/// a section without the key is an error.
fn read_assets(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<Vec<Asset>>, MetaEngineError> {
    if !config.has_section(section) {
        return Ok(None);
    }
    match config.get_string(section, key) {
        Some(list) if !list.trim().is_empty() => parse_assets(&list)
            .map(Some)
            .map_err(|e| MetaEngineError::invalid(section, key, e.to_string())),
        _ => Err(MetaEngineError::missing(section, key)),
    }
}

/// Missing keys take `default`; a present, non-numeric value is an error.
fn read_f64(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, MetaEngineError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<f64>().map_err(|_| {
            MetaEngineError::invalid(section, key, format!("expected a number, got {raw:?}"))
        }),
    }
}

fn read_parsed<T>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: T,
) -> Result<T, MetaEngineError>
where
    T: std::str::FromStr<Err = String>,
{
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|reason| MetaEngineError::invalid(section, key, reason)),
    }
}
