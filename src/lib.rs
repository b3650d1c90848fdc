//! signalgate: technical indicators and a deterministic trading-signal
//! evaluation pipeline.
//!
//! A proposed signal is checked against an indicator snapshot, scored,
//! sized and gated on expected value, producing an auditable
//! [`domain::pipeline::SignalDecision`].
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
