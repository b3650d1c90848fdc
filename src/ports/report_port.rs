//! Decision output port trait.

use crate::domain::error::SignalGateError;
use crate::domain::indicator::correlation::CorrelationMatrix;
use crate::domain::pipeline::SignalDecision;
use crate::domain::snapshot::IndicatorSnapshot;

/// Port for writing evaluation artifacts. `output_path` of `None` means stdout.
pub trait ReportPort {
    fn write_decision(&self, decision: &SignalDecision, output_path: Option<&str>) -> Result<(), SignalGateError>;

    fn write_snapshot(&self, snapshot: &IndicatorSnapshot, output_path: Option<&str>) -> Result<(), SignalGateError>;

    fn write_correlation(&self, matrix: &CorrelationMatrix, output_path: Option<&str>) -> Result<(), SignalGateError>;

    /// Default implementation: writes each decision in turn.
    fn write_decisions(&self, decisions: &[SignalDecision], output_path: Option<&str>) -> Result<(), SignalGateError> {
        for decision in decisions {
            self.write_decision(decision, output_path)?;
        }
        Ok(())
    }
}
