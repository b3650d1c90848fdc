//! External market data handed to a pipeline run.
//!
//! Every field is optional. A missing field skips the matching scoring
//! sub-item; it is never read as zero. The volume profile, change of
//! character and CVD fields replace the values computed from candles when
//! present.

use crate::domain::indicator::change_of_character::ChangeOfCharacter;
use crate::domain::indicator::cvd::CvdReading;
use crate::domain::indicator::volume_profile::VolumeProfile;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderBook {
    /// (bids - asks) / (bids + asks) over the visible depth, in [-1, 1].
    pub imbalance: f64,
    #[serde(default)]
    pub bid_wall: Option<f64>,
    #[serde(default)]
    pub ask_wall: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExchangeFlow {
    /// Net coins moved onto exchanges; negative means withdrawals.
    pub net_flow: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketPhase {
    Accumulation,
    Distribution,
    Neutral,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExternalData {
    /// Perpetual funding rate per interval as a fraction (0.0001 = 0.01%).
    pub funding_rate: Option<f64>,
    /// Open interest change over the last day, in percent.
    pub open_interest_trend: Option<f64>,
    pub order_book: Option<OrderBook>,
    /// Net whale buying (+1) vs selling (-1).
    #[serde(alias = "whale_activity")]
    pub whale_activity_score: Option<f64>,
    pub exchange_flow: Option<ExchangeFlow>,
    pub market_phase: Option<MarketPhase>,
    pub volume_profile: Option<VolumeProfile>,
    pub change_of_character: Option<ChangeOfCharacter>,
    pub cumulative_volume_delta: Option<CvdReading>,
}
