//! CSV decision report adapter: one row per decision.

use crate::domain::engine::Decision;
use crate::domain::error::MetaEngineError;
use crate::ports::report_port::ReportPort;

pub const HEADER: [&str; 13] = [
    "as_of",
    "horizon",
    "allocation_state",
    "meta_score",
    "conviction",
    "consensus",
    "position_size",
    "rs_active",
    "dominant_asset",
    "champion_asset",
    "primary_exposure",
    "tournament_exposure",
    "total_exposure",
];

#[derive(Debug, Default)]
pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        CsvReportAdapter
    }

    fn row(decision: &Decision) -> Vec<String> {
        let fraction = |v: f64| format!("{v:.4}");
        vec![
            decision.as_of.map(|d| d.to_string()).unwrap_or_default(),
            decision.horizon.to_string(),
            decision.allocation_state.to_string(),
            format!("{}", decision.meta_score),
            fraction(decision.conviction),
            decision.consensus.to_string(),
            fraction(decision.position_size),
            decision.rs_active.to_string(),
            decision
                .dominant_asset
                .as_ref()
                .map(|a| a.to_string())
                .unwrap_or_default(),
            decision
                .champion_asset
                .as_ref()
                .map(|a| a.to_string())
                .unwrap_or_default(),
            fraction(decision.primary_exposure),
            fraction(decision.tournament_exposure),
            fraction(decision.total_exposure),
        ]
    }
}

fn csv_err(e: csv::Error) -> MetaEngineError {
    MetaEngineError::Io(std::io::Error::other(e))
}

impl ReportPort for CsvReportAdapter {
    fn render(&self, decisions: &[Decision]) -> Result<String, MetaEngineError> {
        let mut writer = csv::Writer::from_writer(vec![]);
        writer.write_record(HEADER).map_err(csv_err)?;
        for decision in decisions {
            writer.write_record(Self::row(decision)).map_err(csv_err)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| MetaEngineError::Io(std::io::Error::other(e.to_string())))?;
        String::from_utf8(bytes).map_err(|e| MetaEngineError::Io(std::io::Error::other(e)))
    }
}
