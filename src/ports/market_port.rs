//! Per-cycle market state port trait.

use crate::domain::asset::PriceBook;
use crate::domain::error::MetaEngineError;
use crate::domain::signal::Signal;

/// Source of one cycle's system signals and candidate prices.
pub trait MarketStatePort {
    fn fetch_signals(&self) -> Result<Vec<Signal>, MetaEngineError>;

    fn fetch_prices(&self) -> Result<PriceBook, MetaEngineError>;
}
