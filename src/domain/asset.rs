//! Candidate assets and per-cycle prices.

use std::collections::{HashMap, HashSet};
use std::fmt;

/// Tradable instrument identifier, normalised to upper case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Asset(String);

impl Asset {
    pub fn new(ticker: &str) -> Option<Self> {
        let trimmed = ticker.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Asset(trimmed.to_uppercase()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssetListError {
    #[error("empty token in asset list")]
    EmptyToken,

    #[error("duplicate asset: {0}")]
    DuplicateAsset(String),
}

/// Parses a comma-separated ticker list, preserving order.
pub fn parse_assets(input: &str) -> Result<Vec<Asset>, AssetListError> {
    let mut assets = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let asset = Asset::new(token).ok_or(AssetListError::EmptyToken)?;
        if !seen.insert(asset.clone()) {
            return Err(AssetListError::DuplicateAsset(asset.0));
        }
        assets.push(asset);
    }

    Ok(assets)
}

/// Latest price per asset for one cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceBook {
    prices: HashMap<Asset, f64>,
}

impl PriceBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(mut self, ticker: &str, price: f64) -> Self {
        self.insert(ticker, price);
        self
    }

    pub fn insert(&mut self, ticker: &str, price: f64) -> Option<f64> {
        let asset = Asset::new(ticker)?;
        self.prices.insert(asset, price)
    }

    /// Price usable for comparisons: present, finite and positive.
    pub fn price(&self, asset: &Asset) -> Option<f64> {
        self.prices
            .get(asset)
            .copied()
            .filter(|p| p.is_finite() && *p > 0.0)
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Splits `candidates` into priced (in input order) and missing.
    pub fn partition<'a>(&self, candidates: &'a [Asset]) -> (Vec<(&'a Asset, f64)>, Vec<Asset>) {
        let mut priced = Vec::with_capacity(candidates.len());
        let mut missing = Vec::new();
        for asset in candidates {
            match self.price(asset) {
                Some(p) => priced.push((asset, p)),
                None => missing.push(asset.clone()),
            }
        }
        (priced, missing)
    }
}

impl FromIterator<(Asset, f64)> for PriceBook {
    fn from_iter<I: IntoIterator<Item = (Asset, f64)>>(iter: I) -> Self {
        PriceBook {
            prices: iter.into_iter().collect(),
        }
    }
}
