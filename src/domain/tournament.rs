//! Single-elimination tournament over a fixed candidate list.
//!
//! Candidates are paired in input order (0 v 1, 2 v 3, ...). Winners move on
//! in order until one champion remains. The bracket has no byes and no
//! re-seeding, so the candidate count must be a power of two. The champion
//! receives a fixed secondary capital slice.

use crate::domain::allocation::AllocationState;
use crate::domain::asset::{Asset, PriceBook};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TournamentError {
    #[error("tournament needs at least 2 candidates, got {count}")]
    TooFewCandidates { count: usize },

    #[error("tournament candidate count {count} is not a power of two")]
    NotPowerOfTwo { count: usize },

    #[error("duplicate tournament candidate: {0}")]
    DuplicateCandidate(String),

    #[error("tournament slice must be in (0, 1], got {0}")]
    InvalidSlice(f64),
}

/// Decides a match. Must be total and antisymmetric: for any distinct `a`
/// and `b`, exactly one of `first_wins(a, b)` and `first_wins(b, a)` holds.
pub trait MatchComparator {
    fn first_wins(&self, a: &Asset, b: &Asset) -> bool;
}

impl<F> MatchComparator for F
where
    F: Fn(&Asset, &Asset) -> bool,
{
    fn first_wins(&self, a: &Asset, b: &Asset) -> bool {
        self(a, b)
    }
}

/// `a` beats `b` when `price(a) / price(b) > 1`. Equal prices go to the
/// lexicographically smaller ticker.
pub struct PriceRatioComparator<'a> {
    prices: &'a PriceBook,
}

impl<'a> PriceRatioComparator<'a> {
    /// Every candidate must already have a usable price in `prices`.
    pub fn new(prices: &'a PriceBook) -> Self {
        PriceRatioComparator { prices }
    }
}

impl MatchComparator for PriceRatioComparator<'_> {
    fn first_wins(&self, a: &Asset, b: &Asset) -> bool {
        let pa = self.prices.price(a).unwrap_or(f64::NAN);
        let pb = self.prices.price(b).unwrap_or(f64::NAN);
        let ratio = pa / pb;
        if ratio > 1.0 {
            true
        } else if ratio < 1.0 {
            false
        } else {
            a < b
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Match {
    pub round: usize,
    pub first: Asset,
    pub second: Asset,
    pub winner: Asset,
    pub loser: Asset,
}

impl Match {
    pub fn involves(&self, asset: &Asset) -> bool {
        &self.first == asset || &self.second == asset
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bracket {
    rounds: Vec<Vec<Match>>,
    champion: Asset,
}

impl Bracket {
    pub fn champion(&self) -> &Asset {
        &self.champion
    }

    pub fn rounds(&self) -> &[Vec<Match>] {
        &self.rounds
    }

    pub fn depth(&self) -> usize {
        self.rounds.len()
    }

    pub fn matches(&self) -> impl Iterator<Item = &Match> {
        self.rounds.iter().flatten()
    }

    pub fn matches_won(&self, asset: &Asset) -> usize {
        self.matches().filter(|m| &m.winner == asset).count()
    }

    /// Round in which `asset` lost, `None` for the champion or a stranger.
    pub fn eliminated_in(&self, asset: &Asset) -> Option<usize> {
        self.matches().find(|m| &m.loser == asset).map(|m| m.round)
    }

    /// Matches `asset` played, in round order.
    pub fn path(&self, asset: &Asset) -> Vec<&Match> {
        self.matches().filter(|m| m.involves(asset)).collect()
    }
}

pub fn validate_candidates(candidates: &[Asset]) -> Result<(), TournamentError> {
    let count = candidates.len();
    if count < 2 {
        return Err(TournamentError::TooFewCandidates { count });
    }
    if !count.is_power_of_two() {
        return Err(TournamentError::NotPowerOfTwo { count });
    }
    let mut seen = HashSet::new();
    for asset in candidates {
        if !seen.insert(asset) {
            return Err(TournamentError::DuplicateCandidate(asset.to_string()));
        }
    }
    Ok(())
}

/// Candidate list that passed [`validate_candidates`]. Playing it cannot fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TournamentField(Vec<Asset>);

impl TournamentField {
    pub fn new(candidates: Vec<Asset>) -> Result<Self, TournamentError> {
        validate_candidates(&candidates)?;
        Ok(TournamentField(candidates))
    }

    pub fn as_slice(&self) -> &[Asset] {
        &self.0
    }

    pub fn play(&self, comparator: &impl MatchComparator) -> Bracket {
        let mut rounds = Vec::new();
        let mut field = self.0.clone();

        while field.len() > 1 {
            let round = rounds.len();
            let matches: Vec<Match> = field
                .chunks_exact(2)
                .map(|pair| {
                    let (first, second) = (&pair[0], &pair[1]);
                    let (winner, loser) = if comparator.first_wins(first, second) {
                        (first, second)
                    } else {
                        (second, first)
                    };
                    Match {
                        round,
                        first: first.clone(),
                        second: second.clone(),
                        winner: winner.clone(),
                        loser: loser.clone(),
                    }
                })
                .collect();
            field = matches.iter().map(|m| m.winner.clone()).collect();
            rounds.push(matches);
        }

        // Power-of-two field of at least two halves down to exactly one.
        let champion = field.swap_remove(0);
        Bracket { rounds, champion }
    }
}

/// Plays the full bracket. Rejects invalid candidate lists before any match.
pub fn run_tournament(
    candidates: &[Asset],
    comparator: &impl MatchComparator,
) -> Result<Bracket, TournamentError> {
    Ok(TournamentField::new(candidates.to_vec())?.play(comparator))
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TournamentOutcome {
    Dormant,
    /// Not played because some candidates had no usable price.
    Incomplete { missing: Vec<Asset> },
    Decided(Bracket),
}

impl TournamentOutcome {
    pub fn champion(&self) -> Option<&Asset> {
        match self {
            TournamentOutcome::Decided(bracket) => Some(bracket.champion()),
            _ => None,
        }
    }

    pub fn missing(&self) -> &[Asset] {
        match self {
            TournamentOutcome::Incomplete { missing } => missing,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TournamentSelector {
    field: TournamentField,
    slice: f64,
}

impl TournamentSelector {
    pub fn new(candidates: Vec<Asset>, slice: f64) -> Result<Self, TournamentError> {
        let field = TournamentField::new(candidates)?;
        if !slice.is_finite() || slice <= 0.0 || slice > 1.0 {
            return Err(TournamentError::InvalidSlice(slice));
        }
        Ok(TournamentSelector { field, slice })
    }

    pub fn candidates(&self) -> &[Asset] {
        self.field.as_slice()
    }

    pub fn slice(&self) -> f64 {
        self.slice
    }

    /// Plays the price-ratio bracket when the cycle is ALLOCATED.
    pub fn evaluate(&self, state: AllocationState, prices: &PriceBook) -> TournamentOutcome {
        if state != AllocationState::Allocated {
            tracing::debug!(%state, "tournament dormant");
            return TournamentOutcome::Dormant;
        }

        let (_, missing) = prices.partition(self.field.as_slice());
        if !missing.is_empty() {
            tracing::warn!(
                missing = ?missing.iter().map(Asset::as_str).collect::<Vec<_>>(),
                "tournament not played, candidates without usable price"
            );
            return TournamentOutcome::Incomplete { missing };
        }

        let bracket = self.field.play(&PriceRatioComparator::new(prices));
        tracing::debug!(champion = %bracket.champion(), "tournament decided");
        TournamentOutcome::Decided(bracket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::asset::parse_assets;

    fn reference_field() -> Vec<Asset> {
        parse_assets("ETH,XDC,XLM,LINK,IOTA,DOGE,XRP,BTC").unwrap()
    }

    fn alphabetical(a: &Asset, b: &Asset) -> bool {
        a < b
    }

    #[test]
    fn rejects_non_power_of_two() {
        let field = parse_assets("A,B,C,D,E,F").unwrap();
        assert_eq!(
            run_tournament(&field, &alphabetical),
            Err(TournamentError::NotPowerOfTwo { count: 6 })
        );
    }

    #[test]
    fn rejects_too_few() {
        let field = parse_assets("A").unwrap();
        assert_eq!(
            validate_candidates(&field),
            Err(TournamentError::TooFewCandidates { count: 1 })
        );
        assert_eq!(
            validate_candidates(&[]),
            Err(TournamentError::TooFewCandidates { count: 0 })
        );
    }

    #[test]
    fn rejects_duplicates() {
        let field = vec![
            Asset::new("A").unwrap(),
            Asset::new("B").unwrap(),
            Asset::new("A").unwrap(),
            Asset::new("C").unwrap(),
        ];
        assert_eq!(
            validate_candidates(&field),
            Err(TournamentError::DuplicateCandidate("A".into()))
        );
    }

    #[test]
    fn reference_bracket_shape() {
        let bracket = run_tournament(&reference_field(), &alphabetical).unwrap();
        let sizes: Vec<_> = bracket.rounds().iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![4, 2, 1]);
        assert_eq!(bracket.depth(), 3);
    }

    #[test]
    fn alphabetical_preference_path() {
        let bracket = run_tournament(&reference_field(), &alphabetical).unwrap();
        // Round 0: ETH>XDC, LINK>XLM, DOGE>IOTA, BTC>XRP
        let r0: Vec<_> = bracket.rounds()[0].iter().map(|m| m.winner.as_str()).collect();
        assert_eq!(r0, vec!["ETH", "LINK", "DOGE", "BTC"]);
        // Round 1: ETH>LINK, BTC>DOGE; final: BTC>ETH
        let r1: Vec<_> = bracket.rounds()[1].iter().map(|m| m.winner.as_str()).collect();
        assert_eq!(r1, vec!["ETH", "BTC"]);
        assert_eq!(bracket.champion().as_str(), "BTC");
        assert_eq!(bracket.matches_won(bracket.champion()), 3);
    }

    #[test]
    fn loser_queries() {
        let bracket = run_tournament(&reference_field(), &alphabetical).unwrap();
        let eth = Asset::new("ETH").unwrap();
        let xdc = Asset::new("XDC").unwrap();
        assert_eq!(bracket.eliminated_in(&xdc), Some(0));
        assert_eq!(bracket.eliminated_in(&eth), Some(2));
        assert_eq!(bracket.eliminated_in(bracket.champion()), None);
        assert_eq!(bracket.path(&eth).len(), 3);
        assert_eq!(bracket.path(&xdc).len(), 1);
    }

    #[test]
    fn two_candidates_single_final() {
        let field = parse_assets("SOL,ETH").unwrap();
        let bracket = run_tournament(&field, &alphabetical).unwrap();
        assert_eq!(bracket.depth(), 1);
        assert_eq!(bracket.champion().as_str(), "ETH");
    }

    #[test]
    fn price_ratio_comparator_prefers_higher_price() {
        let prices = PriceBook::new().with_price("A", 2.0).with_price("B", 1.0);
        let cmp = PriceRatioComparator::new(&prices);
        let (a, b) = (Asset::new("A").unwrap(), Asset::new("B").unwrap());
        assert!(cmp.first_wins(&a, &b));
        assert!(!cmp.first_wins(&b, &a));
    }

    #[test]
    fn price_ratio_comparator_tie_is_antisymmetric() {
        let prices = PriceBook::new().with_price("A", 1.0).with_price("B", 1.0);
        let cmp = PriceRatioComparator::new(&prices);
        let (a, b) = (Asset::new("A").unwrap(), Asset::new("B").unwrap());
        assert_ne!(cmp.first_wins(&a, &b), cmp.first_wins(&b, &a));
    }

    #[test]
    fn selector_dormant_outside_allocated() {
        let selector = TournamentSelector::new(reference_field(), 0.15).unwrap();
        let prices = PriceBook::new();
        assert_eq!(selector.evaluate(AllocationState::Cash, &prices), TournamentOutcome::Dormant);
        assert_eq!(
            selector.evaluate(AllocationState::Permitted, &prices),
            TournamentOutcome::Dormant
        );
    }

    #[test]
    fn selector_incomplete_on_missing_price() {
        let selector = TournamentSelector::new(parse_assets("A,B,C,D").unwrap(), 0.15).unwrap();
        let prices = PriceBook::new()
            .with_price("A", 1.0)
            .with_price("B", 2.0)
            .with_price("D", 3.0);
        let outcome = selector.evaluate(AllocationState::Allocated, &prices);
        assert_eq!(outcome.champion(), None);
        assert_eq!(outcome.missing(), &[Asset::new("C").unwrap()]);
    }

    #[test]
    fn selector_decides_by_price_ratio() {
        let selector = TournamentSelector::new(parse_assets("A,B,C,D").unwrap(), 0.15).unwrap();
        let prices = PriceBook::new()
            .with_price("A", 1.0)
            .with_price("B", 2.0)
            .with_price("C", 4.0)
            .with_price("D", 3.0);
        let outcome = selector.evaluate(AllocationState::Allocated, &prices);
        assert_eq!(outcome.champion().map(Asset::as_str), Some("C"));
    }

    #[test]
    fn field_rejects_invalid_lists() {
        assert_eq!(
            TournamentField::new(parse_assets("A,B,C").unwrap()),
            Err(TournamentError::NotPowerOfTwo { count: 3 })
        );
        assert_eq!(
            TournamentField::new(Vec::new()),
            Err(TournamentError::TooFewCandidates { count: 0 })
        );
    }

    #[test]
    fn field_play_matches_run_tournament() {
        let field = TournamentField::new(reference_field()).unwrap();
        assert_eq!(field.as_slice(), reference_field().as_slice());
        assert_eq!(
            field.play(&alphabetical),
            run_tournament(&reference_field(), &alphabetical).unwrap()
        );
    }

    #[test]
    fn selector_with_full_prices_always_decides() {
        let selector = TournamentSelector::new(reference_field(), 0.15).unwrap();
        let prices: PriceBook = reference_field()
            .into_iter()
            .map(|a| (a, 1.0))
            .collect();
        let outcome = selector.evaluate(AllocationState::Allocated, &prices);
        assert!(outcome.missing().is_empty());
        // Equal prices fall back to the smaller ticker.
        assert_eq!(outcome.champion().map(Asset::as_str), Some("BTC"));
    }

    #[test]
    fn selector_new_rejects_bad_field() {
        assert!(TournamentSelector::new(parse_assets("A,B,C").unwrap(), 0.15).is_err());
    }

    #[test]
    fn selector_new_rejects_bad_slice() {
        let field = parse_assets("A,B").unwrap();
        assert_eq!(
            TournamentSelector::new(field.clone(), 0.0),
            Err(TournamentError::InvalidSlice(0.0))
        );
        assert!(TournamentSelector::new(field, 1.5).is_err());
    }
}
