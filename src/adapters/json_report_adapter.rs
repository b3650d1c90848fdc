//! JSON report adapter implementing ReportPort.
//!
//! Writes pretty-printed JSON to a file, or to stdout when no path is given.
//! A file receives one document per call; earlier content is replaced.

use crate::domain::error::SignalGateError;
use crate::domain::indicator::correlation::CorrelationMatrix;
use crate::domain::pipeline::SignalDecision;
use crate::domain::snapshot::IndicatorSnapshot;
use crate::ports::report_port::ReportPort;
use serde::Serialize;
use std::fs;
use std::io::Write;

#[derive(Debug, Default, Clone, Copy)]
pub struct JsonReportAdapter;

impl JsonReportAdapter {
    pub fn new() -> Self {
        Self
    }

    fn emit<T: Serialize + ?Sized>(&self, value: &T, output_path: Option<&str>) -> Result<(), SignalGateError> {
        let json = serde_json::to_string_pretty(value)?;
        match output_path {
            Some(path) => fs::write(path, json + "\n")?,
            None => {
                let mut stdout = std::io::stdout().lock();
                writeln!(stdout, "{json}")?;
            }
        }
        Ok(())
    }
}

impl ReportPort for JsonReportAdapter {
    fn write_decision(&self, decision: &SignalDecision, output_path: Option<&str>) -> Result<(), SignalGateError> {
        self.emit(decision, output_path)
    }

    fn write_snapshot(&self, snapshot: &IndicatorSnapshot, output_path: Option<&str>) -> Result<(), SignalGateError> {
        self.emit(snapshot, output_path)
    }

    fn write_correlation(&self, matrix: &CorrelationMatrix, output_path: Option<&str>) -> Result<(), SignalGateError> {
        self.emit(matrix, output_path)
    }

    /// All decisions as one JSON array.
    fn write_decisions(&self, decisions: &[SignalDecision], output_path: Option<&str>) -> Result<(), SignalGateError> {
        self.emit(decisions, output_path)
    }
}
