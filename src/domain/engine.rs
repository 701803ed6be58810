//! Meta decision engine: one evaluation cycle end to end.
//!
//! # Cycle
//!
//! 1. Screen signals against the registry and the decision horizon
//! 2. Aggregate eligible signals into the meta-score
//! 3. Gate and size: CASH, PERMITTED or ALLOCATED
//! 4. ALLOCATED only: relative-strength selection and tournament
//! 5. Compose primary and tournament exposure
//!
//! Nothing is carried from one cycle to the next. The engine is immutable
//! after construction, so independent cycles can run in parallel.

use crate::domain::aggregator::{self, Consensus};
use crate::domain::allocation::{AllocationState, SizingBands};
use crate::domain::asset::{Asset, PriceBook};
use crate::domain::coherency;
use crate::domain::error::MetaEngineError;
use crate::domain::registry::SystemRegistry;
use crate::domain::relative_strength::{RelativeStrengthNetwork, RsOutcome};
use crate::domain::signal::{Horizon, Signal};
use crate::domain::tournament::{TournamentOutcome, TournamentSelector};
use chrono::NaiveDate;
use rayon::prelude::*;
use std::fmt;
use std::str::FromStr;

/// How the tournament slice relates to the primary position size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Composition {
    /// Slice is on top of the primary size.
    #[default]
    Additive,
    /// Slice is taken out of the primary size.
    Carved,
}

impl Composition {
    /// Returns `(primary, tournament)` exposure.
    pub fn split(self, position_size: f64, slice: f64) -> (f64, f64) {
        match self {
            Composition::Additive => (position_size, slice),
            Composition::Carved => {
                let carved = slice.min(position_size);
                (position_size - carved, carved)
            }
        }
    }
}

impl fmt::Display for Composition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Composition::Additive => write!(f, "additive"),
            Composition::Carved => write!(f, "carved"),
        }
    }
}

impl FromStr for Composition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "additive" => Ok(Composition::Additive),
            "carved" => Ok(Composition::Carved),
            other => Err(format!("unknown composition {other:?}, expected additive or carved")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub horizon: Horizon,
    pub bands: SizingBands,
    pub registry: SystemRegistry,
    pub relative_strength: Option<RelativeStrengthNetwork>,
    pub tournament: Option<TournamentSelector>,
    pub composition: Composition,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            horizon: Horizon::Medium,
            bands: SizingBands::default(),
            registry: SystemRegistry::new(),
            relative_strength: None,
            tournament: None,
            composition: Composition::Additive,
        }
    }
}

/// Everything one cycle needs from the outside world.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleInput {
    pub as_of: Option<NaiveDate>,
    pub horizon: Horizon,
    pub signals: Vec<Signal>,
    pub prices: PriceBook,
    pub rotation_index: usize,
}

impl CycleInput {
    pub fn new(horizon: Horizon, signals: Vec<Signal>, prices: PriceBook) -> Self {
        CycleInput {
            as_of: None,
            horizon,
            signals,
            prices,
            rotation_index: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Diagnostics {
    pub supplied: usize,
    pub eligible: usize,
    pub horizon_discarded: usize,
    pub unknown_systems: Vec<String>,
    pub horizon_conflicts: Vec<String>,
    pub missing_prices: Vec<Asset>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Decision {
    pub as_of: Option<NaiveDate>,
    pub horizon: Horizon,
    pub allocation_state: AllocationState,
    pub meta_score: f64,
    pub conviction: f64,
    pub consensus: Consensus,
    pub position_size: f64,
    pub rs_active: bool,
    pub dominant_asset: Option<Asset>,
    pub champion_asset: Option<Asset>,
    pub primary_exposure: f64,
    pub tournament_exposure: f64,
    pub total_exposure: f64,
    pub relative_strength: RsOutcome,
    pub tournament: TournamentOutcome,
    pub diagnostics: Diagnostics,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetaEngine {
    config: EngineConfig,
}

impl MetaEngine {
    pub fn new(config: EngineConfig) -> Self {
        MetaEngine { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Cycle at the configured default horizon.
    pub fn cycle(&self, signals: Vec<Signal>, prices: PriceBook) -> CycleInput {
        CycleInput::new(self.config.horizon, signals, prices)
    }

    pub fn evaluate(&self, input: &CycleInput) -> Result<Decision, MetaEngineError> {
        let config = &self.config;

        let gate = coherency::screen(&input.signals, &config.registry, input.horizon)?;
        tracing::debug!(
            horizon = %input.horizon,
            supplied = input.signals.len(),
            eligible = gate.eligible.len(),
            discarded = gate.horizon_discarded,
            "time-coherency gate applied"
        );

        let meta = aggregator::aggregate_weighted(&gate.eligible, &config.registry);
        let (state, size) = config.bands.decide(meta.score);
        tracing::debug!(score = meta.score, %state, size, "allocation decided");

        let relative_strength = match (&config.relative_strength, state) {
            (Some(net), AllocationState::Allocated) => {
                net.evaluate(state, size, &input.prices, input.rotation_index)
            }
            _ => RsOutcome::Dormant,
        };

        let tournament = match (&config.tournament, state) {
            (Some(selector), AllocationState::Allocated) => selector.evaluate(state, &input.prices),
            _ => TournamentOutcome::Dormant,
        };

        let champion_asset = tournament.champion().cloned();
        let slice = match (&config.tournament, &champion_asset) {
            (Some(selector), Some(_)) => selector.slice(),
            _ => 0.0,
        };
        let (primary_exposure, tournament_exposure) = config.composition.split(size, slice);

        let mut missing_prices: Vec<Asset> = relative_strength.missing().to_vec();
        for asset in tournament.missing() {
            if !missing_prices.contains(asset) {
                missing_prices.push(asset.clone());
            }
        }

        Ok(Decision {
            as_of: input.as_of,
            horizon: input.horizon,
            allocation_state: state,
            meta_score: meta.score,
            conviction: meta.conviction(),
            consensus: meta.consensus,
            position_size: size,
            rs_active: relative_strength.is_active(),
            dominant_asset: relative_strength.dominant().cloned(),
            champion_asset,
            primary_exposure,
            tournament_exposure,
            total_exposure: primary_exposure + tournament_exposure,
            diagnostics: Diagnostics {
                supplied: input.signals.len(),
                eligible: meta.eligible,
                horizon_discarded: gate.horizon_discarded,
                unknown_systems: gate.unknown_systems,
                horizon_conflicts: gate.horizon_conflicts,
                missing_prices,
            },
            relative_strength,
            tournament,
        })
    }

    /// Evaluates independent cycles in parallel. Output order follows input.
    pub fn evaluate_many(&self, inputs: &[CycleInput]) -> Vec<Result<Decision, MetaEngineError>> {
        inputs.par_iter().map(|input| self.evaluate(input)).collect()
    }

    /// Evaluates one cycle's signals at every horizon.
    pub fn evaluate_all_horizons(
        &self,
        as_of: Option<NaiveDate>,
        signals: &[Signal],
        prices: &PriceBook,
        rotation_index: usize,
    ) -> Result<Vec<Decision>, MetaEngineError> {
        let inputs: Vec<CycleInput> = Horizon::ALL
            .iter()
            .map(|&horizon| CycleInput {
                as_of,
                horizon,
                signals: signals.to_vec(),
                prices: prices.clone(),
                rotation_index,
            })
            .collect();
        self.evaluate_many(&inputs).into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::asset::parse_assets;
    use crate::domain::relative_strength::SelectionMode;
    use crate::domain::signal::SignalValue;
    use approx::assert_relative_eq;

    fn signals(values: &[(&str, i8)], horizon: Horizon) -> Vec<Signal> {
        values
            .iter()
            .map(|(id, v)| Signal::new(*id, SignalValue::from_i8(*v).unwrap(), horizon))
            .collect()
    }

    fn prices() -> PriceBook {
        PriceBook::new()
            .with_price("BTC", 1.0)
            .with_price("ETH", 1.1)
            .with_price("SOL", 0.9)
            .with_price("SUI", 1.3)
    }

    fn full_config(composition: Composition) -> EngineConfig {
        EngineConfig {
            relative_strength: Some(
                RelativeStrengthNetwork::new(
                    parse_assets("BTC,ETH,SOL,SUI").unwrap(),
                    None,
                    SelectionMode::Dominance,
                )
                .unwrap(),
            ),
            tournament: Some(
                TournamentSelector::new(parse_assets("BTC,ETH,SOL,SUI").unwrap(), 0.15).unwrap(),
            ),
            composition,
            ..EngineConfig::default()
        }
    }

    #[test]
    fn composition_split() {
        assert_eq!(Composition::Additive.split(0.5, 0.15), (0.5, 0.15));
        let (primary, carved) = Composition::Carved.split(0.25, 0.15);
        assert_relative_eq!(primary, 0.10);
        assert_relative_eq!(carved, 0.15);
        assert_eq!(Composition::Carved.split(0.10, 0.15), (0.0, 0.10));
    }

    #[test]
    fn composition_parsing() {
        assert_eq!("Carved".parse::<Composition>().unwrap(), Composition::Carved);
        assert!("both".parse::<Composition>().is_err());
    }

    #[test]
    fn empty_signal_set_is_cash() {
        let engine = MetaEngine::new(full_config(Composition::Additive));
        let decision = engine.evaluate(&engine.cycle(vec![], prices())).unwrap();
        assert_eq!(decision.allocation_state, AllocationState::Cash);
        assert_eq!(decision.meta_score, 0.0);
        assert!(!decision.rs_active);
        assert_eq!(decision.total_exposure, 0.0);
    }

    #[test]
    fn allocated_cycle_selects_assets_additively() {
        let engine = MetaEngine::new(full_config(Composition::Additive));
        let input = engine.cycle(
            signals(&[("A", 1), ("B", 1), ("C", 1), ("D", 1)], Horizon::Medium),
            prices(),
        );
        let decision = engine.evaluate(&input).unwrap();
        assert_eq!(decision.allocation_state, AllocationState::Allocated);
        assert_eq!(decision.position_size, 0.25);
        assert!(decision.rs_active);
        assert_eq!(decision.dominant_asset.as_ref().map(Asset::as_str), Some("SUI"));
        assert_eq!(decision.champion_asset.as_ref().map(Asset::as_str), Some("SUI"));
        assert_relative_eq!(decision.total_exposure, 0.40);
    }

    #[test]
    fn carved_composition_keeps_total_at_position_size() {
        let engine = MetaEngine::new(full_config(Composition::Carved));
        let input = engine.cycle(
            signals(&[("A", 1), ("B", 1), ("C", 1)], Horizon::Medium),
            prices(),
        );
        let decision = engine.evaluate(&input).unwrap();
        assert_relative_eq!(decision.total_exposure, 0.25);
        assert_relative_eq!(decision.tournament_exposure, 0.15);
    }

    #[test]
    fn permitted_cycle_runs_no_selection() {
        let engine = MetaEngine::new(full_config(Composition::Additive));
        let input = engine.cycle(signals(&[("A", 1), ("B", 1)], Horizon::Medium), prices());
        let decision = engine.evaluate(&input).unwrap();
        assert_eq!(decision.allocation_state, AllocationState::Permitted);
        assert_eq!(decision.relative_strength, RsOutcome::Dormant);
        assert_eq!(decision.tournament, TournamentOutcome::Dormant);
        assert_eq!(decision.champion_asset, None);
        assert_eq!(decision.total_exposure, 0.0);
    }

    #[test]
    fn missing_tournament_price_withholds_slice() {
        let engine = MetaEngine::new(full_config(Composition::Additive));
        let partial = PriceBook::new()
            .with_price("BTC", 1.0)
            .with_price("ETH", 1.1)
            .with_price("SOL", 0.9);
        let input = engine.cycle(
            signals(&[("A", 1), ("B", 1), ("C", 1)], Horizon::Medium),
            partial,
        );
        let decision = engine.evaluate(&input).unwrap();
        assert_eq!(decision.champion_asset, None);
        assert_eq!(decision.tournament_exposure, 0.0);
        assert_eq!(decision.dominant_asset.as_ref().map(Asset::as_str), Some("ETH"));
        assert_eq!(decision.diagnostics.missing_prices, parse_assets("SUI").unwrap());
    }

    #[test]
    fn evaluate_all_horizons_filters_each_context() {
        let engine = MetaEngine::new(EngineConfig::default());
        let mut all = signals(&[("S1", 1), ("S2", 1), ("S3", 1)], Horizon::Short);
        all.extend(signals(&[("M1", -1)], Horizon::Medium));
        let decisions = engine
            .evaluate_all_horizons(None, &all, &PriceBook::new(), 0)
            .unwrap();
        let states: Vec<_> = decisions.iter().map(|d| (d.horizon, d.allocation_state)).collect();
        assert_eq!(
            states,
            vec![
                (Horizon::Short, AllocationState::Allocated),
                (Horizon::Medium, AllocationState::Cash),
                (Horizon::Long, AllocationState::Cash),
            ]
        );
    }

    #[test]
    fn duplicate_signal_fails_cycle() {
        let engine = MetaEngine::new(EngineConfig::default());
        let input = engine.cycle(signals(&[("A", 1), ("A", -1)], Horizon::Medium), prices());
        assert!(matches!(
            engine.evaluate(&input),
            Err(MetaEngineError::DuplicateSignal(_))
        ));
    }
}
