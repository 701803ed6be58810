//! CSV file market state adapter.
//!
//! Signals file: header `system_id,value[,horizon]`. An empty or absent
//! horizon falls back to the system's registered horizon.
//!
//! Prices file: header `asset,price`.

use crate::domain::asset::{Asset, PriceBook};
use crate::domain::error::MetaEngineError;
use crate::domain::registry::SystemRegistry;
use crate::domain::signal::{Horizon, Signal, SignalValue};
use crate::ports::market_port::MarketStatePort;
use std::fs;
use std::io::Read;
use std::path::PathBuf;

pub struct CsvAdapter {
    signals_path: PathBuf,
    prices_path: PathBuf,
    registry: SystemRegistry,
}

impl CsvAdapter {
    pub fn new(signals_path: PathBuf, prices_path: PathBuf, registry: SystemRegistry) -> Self {
        Self {
            signals_path,
            prices_path,
            registry,
        }
    }

    fn open(path: &PathBuf) -> Result<fs::File, MetaEngineError> {
        fs::File::open(path).map_err(|e| {
            MetaEngineError::input(&path.display().to_string(), format!("failed to open: {e}"))
        })
    }
}

impl MarketStatePort for CsvAdapter {
    fn fetch_signals(&self) -> Result<Vec<Signal>, MetaEngineError> {
        let file = Self::open(&self.signals_path)?;
        read_signals(file, &self.signals_path.display().to_string(), &self.registry)
    }

    fn fetch_prices(&self) -> Result<PriceBook, MetaEngineError> {
        let file = Self::open(&self.prices_path)?;
        read_prices(file, &self.prices_path.display().to_string())
    }
}

fn reader<R: Read>(input: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(input)
}

fn column(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.eq_ignore_ascii_case(name))
}

fn required_column(
    headers: &csv::StringRecord,
    name: &str,
    source_name: &str,
) -> Result<usize, MetaEngineError> {
    column(headers, name)
        .ok_or_else(|| MetaEngineError::input(source_name, format!("missing {name} column")))
}

pub fn read_signals<R: Read>(
    input: R,
    source_name: &str,
    registry: &SystemRegistry,
) -> Result<Vec<Signal>, MetaEngineError> {
    let mut rdr = reader(input);
    let headers = rdr
        .headers()
        .map_err(|e| MetaEngineError::input(source_name, format!("CSV header error: {e}")))?
        .clone();
    let id_col = required_column(&headers, "system_id", source_name)?;
    let value_col = required_column(&headers, "value", source_name)?;
    let horizon_col = column(&headers, "horizon");

    let mut signals = Vec::new();
    for (line, result) in rdr.records().enumerate() {
        let record = result
            .map_err(|e| MetaEngineError::input(source_name, format!("CSV parse error: {e}")))?;
        let row = line + 2;

        let system_id = record.get(id_col).unwrap_or_default();
        if system_id.is_empty() {
            return Err(MetaEngineError::input(
                source_name,
                format!("row {row}: empty system_id"),
            ));
        }

        let value: SignalValue = record
            .get(value_col)
            .unwrap_or_default()
            .parse()
            .map_err(|e| MetaEngineError::input(source_name, format!("row {row}: {e}")))?;

        let horizon = match horizon_col.and_then(|c| record.get(c)).filter(|h| !h.is_empty()) {
            Some(label) => label.parse::<Horizon>()?,
            None => registry.horizon(system_id).ok_or_else(|| {
                MetaEngineError::input(
                    source_name,
                    format!("row {row}: no horizon given and {system_id} is not registered"),
                )
            })?,
        };

        signals.push(Signal::new(system_id, value, horizon));
    }

    Ok(signals)
}

pub fn read_prices<R: Read>(input: R, source_name: &str) -> Result<PriceBook, MetaEngineError> {
    let mut rdr = reader(input);
    let headers = rdr
        .headers()
        .map_err(|e| MetaEngineError::input(source_name, format!("CSV header error: {e}")))?
        .clone();
    let asset_col = required_column(&headers, "asset", source_name)?;
    let price_col = required_column(&headers, "price", source_name)?;

    let mut book = PriceBook::new();
    for (line, result) in rdr.records().enumerate() {
        let record = result
            .map_err(|e| MetaEngineError::input(source_name, format!("CSV parse error: {e}")))?;
        let row = line + 2;

        let asset = Asset::new(record.get(asset_col).unwrap_or_default()).ok_or_else(|| {
            MetaEngineError::input(source_name, format!("row {row}: empty asset"))
        })?;
        let raw = record.get(price_col).unwrap_or_default();
        let price: f64 = raw.parse().map_err(|_| {
            MetaEngineError::input(source_name, format!("row {row}: invalid price {raw:?}"))
        })?;

        if book.insert(asset.as_str(), price).is_some() {
            return Err(MetaEngineError::input(
                source_name,
                format!("row {row}: duplicate price for {asset}"),
            ));
        }
    }

    Ok(book)
}
