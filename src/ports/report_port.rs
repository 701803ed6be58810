//! Decision report port trait.

use crate::domain::engine::Decision;
use crate::domain::error::MetaEngineError;
use std::path::Path;

/// Port for rendering and writing decision reports.
pub trait ReportPort {
    fn render(&self, decisions: &[Decision]) -> Result<String, MetaEngineError>;

    /// Default implementation: renders then writes the whole report to `output_path`.
    fn write(&self, decisions: &[Decision], output_path: &Path) -> Result<(), MetaEngineError> {
        let content = self.render(decisions)?;
        std::fs::write(output_path, content)?;
        Ok(())
    }
}
