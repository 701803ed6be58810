#![allow(dead_code)]

use metaengine::domain::asset::{parse_assets, Asset, PriceBook};
use metaengine::domain::engine::{Composition, EngineConfig};
use metaengine::domain::error::MetaEngineError;
use metaengine::domain::relative_strength::{RelativeStrengthNetwork, SelectionMode};
use metaengine::domain::signal::{Horizon, Signal, SignalValue};
use metaengine::domain::tournament::TournamentSelector;
use metaengine::ports::market_port::MarketStatePort;
use std::io::Write;

pub const TOURNAMENT_FIELD: &str = "ETH,XDC,XLM,LINK,IOTA,DOGE,XRP,BTC";
pub const RS_FIELD: &str = "BTC,ETH,SOL,SUI";

pub struct MockMarketPort {
    pub signals: Vec<Signal>,
    pub prices: PriceBook,
    pub error: Option<String>,
}

impl MockMarketPort {
    pub fn new(signals: Vec<Signal>, prices: PriceBook) -> Self {
        Self {
            signals,
            prices,
            error: None,
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            signals: Vec::new(),
            prices: PriceBook::new(),
            error: Some(reason.to_string()),
        }
    }
}

impl MarketStatePort for MockMarketPort {
    fn fetch_signals(&self) -> Result<Vec<Signal>, MetaEngineError> {
        if let Some(reason) = &self.error {
            return Err(MetaEngineError::Input {
                source_name: "mock".into(),
                reason: reason.clone(),
            });
        }
        Ok(self.signals.clone())
    }

    fn fetch_prices(&self) -> Result<PriceBook, MetaEngineError> {
        Ok(self.prices.clone())
    }
}

pub fn signal(id: &str, value: i8, horizon: Horizon) -> Signal {
    Signal::new(id, SignalValue::from_i8(value).unwrap(), horizon)
}

/// Signals named `SYS0..` at one horizon.
pub fn signals(values: &[i8], horizon: Horizon) -> Vec<Signal> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| signal(&format!("SYS{i}"), *v, horizon))
        .collect()
}

pub fn asset(ticker: &str) -> Asset {
    Asset::new(ticker).unwrap()
}

/// Prices that favour assets earlier in the alphabet.
pub fn alphabetical_prices(tickers: &str) -> PriceBook {
    let mut sorted = parse_assets(tickers).unwrap();
    sorted.sort();
    let n = sorted.len() as f64;
    sorted
        .iter()
        .enumerate()
        .map(|(i, a)| (a.clone(), 100.0 * (n - i as f64)))
        .collect()
}

pub fn market_prices() -> PriceBook {
    PriceBook::new()
        .with_price("BTC", 60000.0)
        .with_price("ETH", 3000.0)
        .with_price("SOL", 150.0)
        .with_price("SUI", 1.5)
        .with_price("XDC", 0.05)
        .with_price("XLM", 0.11)
        .with_price("LINK", 14.0)
        .with_price("IOTA", 0.2)
        .with_price("DOGE", 0.12)
        .with_price("XRP", 0.5)
}

pub fn full_config(composition: Composition) -> EngineConfig {
    EngineConfig {
        horizon: Horizon::Medium,
        relative_strength: Some(
            RelativeStrengthNetwork::new(
                parse_assets(RS_FIELD).unwrap(),
                Some(asset("BTC")),
                SelectionMode::Dominance,
            )
            .unwrap(),
        ),
        tournament: Some(
            TournamentSelector::new(parse_assets(TOURNAMENT_FIELD).unwrap(), 0.15).unwrap(),
        ),
        composition,
        ..EngineConfig::default()
    }
}

pub fn write_temp(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}
