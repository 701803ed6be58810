//! Relative-strength network over candidate assets.
//!
//! Every unordered pair of priced candidates forms a ratio edge
//! `R = price(numerator) / price(denominator)`; `R > 1` means the numerator
//! dominates that pair. The network decides *which* asset receives exposure
//! that the allocation gate has already approved. It never grants permission
//! itself, and it stays dormant unless the cycle is ALLOCATED with a non-zero
//! size.

use crate::domain::allocation::AllocationState;
use crate::domain::asset::{Asset, PriceBook};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SelectionMode {
    /// Asset winning the most pairwise ratios.
    #[default]
    Dominance,
    /// Cyclic pointer over the priced candidates.
    Rotation,
}

impl fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionMode::Dominance => write!(f, "dominance"),
            SelectionMode::Rotation => write!(f, "rotation"),
        }
    }
}

impl FromStr for SelectionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dominance" => Ok(SelectionMode::Dominance),
            "rotation" => Ok(SelectionMode::Rotation),
            other => Err(format!("unknown selection mode {other:?}, expected dominance or rotation")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RatioEdge {
    pub numerator: Asset,
    pub denominator: Asset,
    pub ratio: f64,
    /// Edge touches the selected dominant asset.
    pub dominant_link: bool,
}

impl RatioEdge {
    pub fn label(&self) -> String {
        format!("{}/{}", self.numerator, self.denominator)
    }

    /// Winner of the pair, `None` when the prices are equal.
    ///
    /// Edges are oriented strongest first, so the winner is the numerator.
    pub fn winner(&self) -> Option<&Asset> {
        match self.ratio.partial_cmp(&1.0) {
            Some(Ordering::Greater) => Some(&self.numerator),
            _ => None,
        }
    }

    fn touches(&self, asset: &Asset) -> bool {
        &self.numerator == asset || &self.denominator == asset
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RsSnapshot {
    pub dominant: Option<Asset>,
    /// Ranked by ratio, strongest first.
    pub edges: Vec<RatioEdge>,
    pub benchmark_ratios: Vec<(Asset, f64)>,
    pub missing: Vec<Asset>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RsOutcome {
    Dormant,
    Active(RsSnapshot),
}

impl RsOutcome {
    pub fn is_active(&self) -> bool {
        matches!(self, RsOutcome::Active(_))
    }

    pub fn dominant(&self) -> Option<&Asset> {
        match self {
            RsOutcome::Active(snapshot) => snapshot.dominant.as_ref(),
            RsOutcome::Dormant => None,
        }
    }

    pub fn missing(&self) -> &[Asset] {
        match self {
            RsOutcome::Active(snapshot) => &snapshot.missing,
            RsOutcome::Dormant => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelativeStrengthNetwork {
    candidates: Vec<Asset>,
    benchmark: Option<Asset>,
    mode: SelectionMode,
}

impl RelativeStrengthNetwork {
    pub fn new(
        candidates: Vec<Asset>,
        benchmark: Option<Asset>,
        mode: SelectionMode,
    ) -> Result<Self, String> {
        if let Some(b) = &benchmark {
            if !candidates.contains(b) {
                return Err(format!("benchmark {b} is not one of the candidates"));
            }
        }
        Ok(RelativeStrengthNetwork {
            candidates,
            benchmark,
            mode,
        })
    }

    pub fn candidates(&self) -> &[Asset] {
        &self.candidates
    }

    pub fn benchmark(&self) -> Option<&Asset> {
        self.benchmark.as_ref()
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn is_active(state: AllocationState, position_size: f64) -> bool {
        state == AllocationState::Allocated && position_size > 0.0
    }

    /// Runs the network for one cycle, or reports dormant.
    pub fn evaluate(
        &self,
        state: AllocationState,
        position_size: f64,
        prices: &PriceBook,
        rotation_index: usize,
    ) -> RsOutcome {
        if !Self::is_active(state, position_size) {
            tracing::debug!(%state, position_size, "relative strength dormant");
            return RsOutcome::Dormant;
        }

        let (mut edges, missing) = self.ratio_edges(prices);
        for asset in &missing {
            tracing::warn!(%asset, "no usable price, excluded from relative strength");
        }

        let dominant = self.dominant_asset(prices, rotation_index);
        if let Some(d) = &dominant {
            for edge in &mut edges {
                edge.dominant_link = edge.touches(d);
            }
        }

        RsOutcome::Active(RsSnapshot {
            dominant,
            edges,
            benchmark_ratios: self.benchmark_ratios(prices),
            missing,
        })
    }

    /// One edge per unordered pair of priced candidates, ranked by ratio.
    ///
    /// The higher-priced asset is the numerator, so every ratio is at least
    /// 1.0. Equal prices keep the earlier candidate in configured order on top.
    pub fn ratio_edges(&self, prices: &PriceBook) -> (Vec<RatioEdge>, Vec<Asset>) {
        let (priced, missing) = prices.partition(&self.candidates);
        let mut edges = Vec::with_capacity(priced.len() * priced.len().saturating_sub(1) / 2);

        for (i, (a, pa)) in priced.iter().enumerate() {
            for (b, pb) in &priced[i + 1..] {
                let ((strong, ps), (weak, pw)) = if pb > pa {
                    ((b, pb), (a, pa))
                } else {
                    ((a, pa), (b, pb))
                };
                edges.push(RatioEdge {
                    numerator: (*strong).clone(),
                    denominator: (*weak).clone(),
                    ratio: ps / pw,
                    dominant_link: false,
                });
            }
        }

        edges.sort_by(|x, y| {
            y.ratio
                .total_cmp(&x.ratio)
                .then_with(|| x.numerator.cmp(&y.numerator))
                .then_with(|| x.denominator.cmp(&y.denominator))
        });
        (edges, missing)
    }

    /// Asset that receives the allocated exposure this cycle.
    ///
    /// `rotation_index` is only consulted in [`SelectionMode::Rotation`].
    pub fn dominant_asset(&self, prices: &PriceBook, rotation_index: usize) -> Option<Asset> {
        let (priced, _) = prices.partition(&self.candidates);
        if priced.is_empty() {
            return None;
        }

        match self.mode {
            SelectionMode::Rotation => {
                Some(priced[rotation_index % priced.len()].0.clone())
            }
            SelectionMode::Dominance => {
                let wins: Vec<usize> = priced
                    .iter()
                    .map(|(_, p)| priced.iter().filter(|(_, q)| p > q).count())
                    .collect();

                // Earliest index wins remaining ties.
                let mut best = 0;
                for i in 1..priced.len() {
                    let better = wins[i] > wins[best]
                        || (wins[i] == wins[best] && priced[i].1 > priced[best].1);
                    if better {
                        best = i;
                    }
                }
                Some(priced[best].0.clone())
            }
        }
    }

    /// Ratio of each other priced candidate against the benchmark.
    pub fn benchmark_ratios(&self, prices: &PriceBook) -> Vec<(Asset, f64)> {
        let Some(benchmark) = &self.benchmark else {
            return Vec::new();
        };
        let Some(base) = prices.price(benchmark) else {
            return Vec::new();
        };
        self.candidates
            .iter()
            .filter(|a| *a != benchmark)
            .filter_map(|a| prices.price(a).map(|p| (a.clone(), p / base)))
            .collect()
    }
}
