//! Signal candidates.
//!
//! A proposal arrives as a loosely-typed [`RawSignalCandidate`] (JSON from
//! the proposal generator) and is converted into the [`SignalCandidate`]
//! tagged union, where each variant carries only the fields meaningful to it.

use crate::domain::error::SignalGateError;
use crate::domain::indicator::Bias;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    BuyToEnter,
    SellToEnter,
    Hold,
    Close,
    CloseAll,
    Reduce,
    Add,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::BuyToEnter => "buy_to_enter",
            Direction::SellToEnter => "sell_to_enter",
            Direction::Hold => "hold",
            Direction::Close => "close",
            Direction::CloseAll => "close_all",
            Direction::Reduce => "reduce",
            Direction::Add => "add",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = SignalGateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "buy_to_enter" | "buy" | "long" => Ok(Direction::BuyToEnter),
            "sell_to_enter" | "sell" | "short" => Ok(Direction::SellToEnter),
            "hold" => Ok(Direction::Hold),
            "close" => Ok(Direction::Close),
            "close_all" => Ok(Direction::CloseAll),
            "reduce" => Ok(Direction::Reduce),
            "add" => Ok(Direction::Add),
            other => Err(SignalGateError::InvalidCandidate {
                reason: format!("unknown direction '{other}'"),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// +1 for long, -1 for short: multiply a price move to get the
    /// move in the position's favour.
    pub fn sign(self) -> f64 {
        match self {
            Side::Long => 1.0,
            Side::Short => -1.0,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Side::Long => Side::Short,
            Side::Short => Side::Long,
        }
    }

    pub fn bias(self) -> Bias {
        match self {
            Side::Long => Bias::Bullish,
            Side::Short => Bias::Bearish,
        }
    }

    /// True when `bias` points the same way as this side.
    pub fn agrees(self, bias: Bias) -> bool {
        bias == self.bias()
    }

    /// True when `bias` points against this side.
    pub fn opposes(self, bias: Bias) -> bool {
        bias == self.bias().opposite()
    }

    pub fn entry_direction(self) -> Direction {
        match self {
            Side::Long => Direction::BuyToEnter,
            Side::Short => Direction::SellToEnter,
        }
    }
}

/// Price levels proposed with an entry. A non-positive entry price means
/// "not supplied" and is corrected to the last close during evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EntryOrder {
    pub entry_price: f64,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    pub raw_confidence: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SignalCandidate {
    OpenLong { asset: String, order: EntryOrder },
    OpenShort { asset: String, order: EntryOrder },
    Hold { asset: String },
    Close { asset: String, all: bool },
    Reduce { asset: String, fraction: Option<f64> },
    Add { asset: String, side: Side, order: EntryOrder },
}

impl SignalCandidate {
    pub fn open(asset: impl Into<String>, side: Side, order: EntryOrder) -> Self {
        let asset = asset.into();
        match side {
            Side::Long => SignalCandidate::OpenLong { asset, order },
            Side::Short => SignalCandidate::OpenShort { asset, order },
        }
    }

    pub fn asset(&self) -> &str {
        match self {
            SignalCandidate::OpenLong { asset, .. }
            | SignalCandidate::OpenShort { asset, .. }
            | SignalCandidate::Hold { asset }
            | SignalCandidate::Close { asset, .. }
            | SignalCandidate::Reduce { asset, .. }
            | SignalCandidate::Add { asset, .. } => asset,
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            SignalCandidate::OpenLong { .. } => Direction::BuyToEnter,
            SignalCandidate::OpenShort { .. } => Direction::SellToEnter,
            SignalCandidate::Hold { .. } => Direction::Hold,
            SignalCandidate::Close { all: false, .. } => Direction::Close,
            SignalCandidate::Close { all: true, .. } => Direction::CloseAll,
            SignalCandidate::Reduce { .. } => Direction::Reduce,
            SignalCandidate::Add { .. } => Direction::Add,
        }
    }

    /// Side of the position this candidate opens or adds to.
    pub fn side(&self) -> Option<Side> {
        match self {
            SignalCandidate::OpenLong { .. } => Some(Side::Long),
            SignalCandidate::OpenShort { .. } => Some(Side::Short),
            SignalCandidate::Add { side, .. } => Some(*side),
            _ => None,
        }
    }

    pub fn order(&self) -> Option<&EntryOrder> {
        match self {
            SignalCandidate::OpenLong { order, .. }
            | SignalCandidate::OpenShort { order, .. }
            | SignalCandidate::Add { order, .. } => Some(order),
            _ => None,
        }
    }

    /// Same candidate with its entry levels replaced.
    pub fn with_order(&self, order: EntryOrder) -> Self {
        match self {
            SignalCandidate::OpenLong { asset, .. } => SignalCandidate::OpenLong {
                asset: asset.clone(),
                order,
            },
            SignalCandidate::OpenShort { asset, .. } => SignalCandidate::OpenShort {
                asset: asset.clone(),
                order,
            },
            SignalCandidate::Add { asset, side, .. } => SignalCandidate::Add {
                asset: asset.clone(),
                side: *side,
                order,
            },
            other => other.clone(),
        }
    }

    /// Opposite-side entry with the same entry price; stop and target are
    /// cleared since they belong to the old side.
    pub fn flipped(&self) -> Option<Self> {
        let side = self.side()?.opposite();
        let order = self.order()?;
        let cleared = EntryOrder {
            entry_price: order.entry_price,
            stop_loss: None,
            take_profit: None,
            raw_confidence: order.raw_confidence,
        };
        Some(match self {
            SignalCandidate::Add { asset, .. } => SignalCandidate::Add {
                asset: asset.clone(),
                side,
                order: cleared,
            },
            _ => SignalCandidate::open(self.asset(), side, cleared),
        })
    }
}

/// Candidate as supplied by the proposal generator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSignalCandidate {
    pub asset: String,
    pub direction: String,
    #[serde(default, alias = "entry")]
    pub entry_price: Option<f64>,
    #[serde(default, alias = "stop")]
    pub stop_loss: Option<f64>,
    #[serde(default, alias = "target")]
    pub take_profit: Option<f64>,
    #[serde(default, alias = "confidence")]
    pub raw_confidence: Option<f64>,
    /// Side for `add`; inferred from stop/target placement when absent.
    #[serde(default)]
    pub side: Option<Side>,
    /// Fraction of the position for `reduce`, in (0, 1].
    #[serde(default)]
    pub fraction: Option<f64>,
}

fn check_finite(name: &str, value: Option<f64>) -> Result<(), SignalGateError> {
    match value {
        Some(v) if !v.is_finite() => Err(SignalGateError::InvalidCandidate {
            reason: format!("{name} is not a finite number"),
        }),
        _ => Ok(()),
    }
}

fn infer_side(raw: &RawSignalCandidate) -> Option<Side> {
    let entry = raw.entry_price.filter(|e| *e > 0.0)?;
    match (raw.stop_loss, raw.take_profit) {
        (Some(stop), _) if stop < entry => Some(Side::Long),
        (Some(stop), _) if stop > entry => Some(Side::Short),
        (_, Some(tp)) if tp > entry => Some(Side::Long),
        (_, Some(tp)) if tp < entry => Some(Side::Short),
        _ => None,
    }
}

impl TryFrom<RawSignalCandidate> for SignalCandidate {
    type Error = SignalGateError;

    fn try_from(raw: RawSignalCandidate) -> Result<Self, Self::Error> {
        let asset = raw.asset.trim().to_uppercase();
        if asset.is_empty() {
            return Err(SignalGateError::InvalidCandidate {
                reason: "asset is empty".into(),
            });
        }
        check_finite("entry_price", raw.entry_price)?;
        check_finite("stop_loss", raw.stop_loss)?;
        check_finite("take_profit", raw.take_profit)?;
        check_finite("raw_confidence", raw.raw_confidence)?;
        if let Some(c) = raw.raw_confidence.filter(|c| !(0.0..=1.0).contains(c)) {
            return Err(SignalGateError::InvalidCandidate {
                reason: format!("raw_confidence {c} outside [0, 1]"),
            });
        }

        let direction: Direction = raw.direction.parse()?;
        let order = EntryOrder {
            entry_price: raw.entry_price.unwrap_or(0.0),
            stop_loss: raw.stop_loss,
            take_profit: raw.take_profit,
            raw_confidence: raw.raw_confidence,
        };

        Ok(match direction {
            Direction::BuyToEnter => SignalCandidate::OpenLong { asset, order },
            Direction::SellToEnter => SignalCandidate::OpenShort { asset, order },
            Direction::Hold => SignalCandidate::Hold { asset },
            Direction::Close => SignalCandidate::Close { asset, all: false },
            Direction::CloseAll => SignalCandidate::Close { asset, all: true },
            Direction::Reduce => {
                if let Some(f) = raw.fraction.filter(|f| !(*f > 0.0 && *f <= 1.0)) {
                    return Err(SignalGateError::InvalidCandidate {
                        reason: format!("reduce fraction {f} outside (0, 1]"),
                    });
                }
                SignalCandidate::Reduce {
                    asset,
                    fraction: raw.fraction,
                }
            }
            Direction::Add => {
                let side = raw.side.or_else(|| infer_side(&raw)).ok_or_else(|| {
                    SignalGateError::InvalidCandidate {
                        reason: "add needs a side or a stop/target to infer it from".into(),
                    }
                })?;
                SignalCandidate::Add { asset, side, order }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(direction: &str) -> RawSignalCandidate {
        RawSignalCandidate {
            asset: "btc".into(),
            direction: direction.into(),
            entry_price: Some(100.0),
            stop_loss: Some(97.0),
            take_profit: Some(106.0),
            raw_confidence: Some(0.7),
            ..Default::default()
        }
    }

    #[test]
    fn buy_becomes_open_long() {
        let candidate = SignalCandidate::try_from(raw("buy_to_enter")).unwrap();
        assert_eq!(candidate.asset(), "BTC");
        assert_eq!(candidate.direction(), Direction::BuyToEnter);
        assert_eq!(candidate.side(), Some(Side::Long));
        assert_eq!(candidate.order().unwrap().stop_loss, Some(97.0));
    }

    #[test]
    fn close_all_keeps_flag() {
        let candidate = SignalCandidate::try_from(raw("close_all")).unwrap();
        assert_eq!(candidate, SignalCandidate::Close { asset: "BTC".into(), all: true });
        assert_eq!(candidate.direction(), Direction::CloseAll);
        assert!(candidate.order().is_none());
    }

    #[test]
    fn unknown_direction_rejected() {
        let err = SignalCandidate::try_from(raw("moon")).unwrap_err();
        assert!(matches!(err, SignalGateError::InvalidCandidate { .. }));
    }

    #[test]
    fn non_finite_price_rejected() {
        let mut r = raw("buy_to_enter");
        r.stop_loss = Some(f64::NAN);
        assert!(SignalCandidate::try_from(r).is_err());
    }

    #[test]
    fn confidence_out_of_range_rejected() {
        let mut r = raw("buy_to_enter");
        r.raw_confidence = Some(75.0);
        assert!(SignalCandidate::try_from(r).is_err());
    }

    #[test]
    fn missing_entry_becomes_zero() {
        let mut r = raw("sell_to_enter");
        r.entry_price = None;
        let candidate = SignalCandidate::try_from(r).unwrap();
        assert_eq!(candidate.order().unwrap().entry_price, 0.0);
    }

    #[test]
    fn add_infers_side_from_stop() {
        let candidate = SignalCandidate::try_from(raw("add")).unwrap();
        assert_eq!(candidate.side(), Some(Side::Long));

        let mut r = raw("add");
        r.stop_loss = None;
        r.take_profit = Some(90.0);
        assert_eq!(SignalCandidate::try_from(r).unwrap().side(), Some(Side::Short));
    }

    #[test]
    fn add_without_side_hint_rejected() {
        let mut r = raw("add");
        r.stop_loss = None;
        r.take_profit = None;
        assert!(SignalCandidate::try_from(r).is_err());
    }

    #[test]
    fn reduce_fraction_validated() {
        let mut r = raw("reduce");
        r.fraction = Some(1.5);
        assert!(SignalCandidate::try_from(r).is_err());
    }

    #[test]
    fn flipped_clears_levels() {
        let candidate = SignalCandidate::try_from(raw("sell_to_enter")).unwrap();
        let flipped = candidate.flipped().unwrap();
        assert_eq!(flipped.direction(), Direction::BuyToEnter);
        let order = flipped.order().unwrap();
        assert_eq!(order.entry_price, 100.0);
        assert_eq!(order.stop_loss, None);
        assert_eq!(order.take_profit, None);
    }

    #[test]
    fn json_aliases() {
        let json = r#"{"asset":"eth","direction":"sell","entry":2000,"stop":2050,"confidence":0.6}"#;
        let r: RawSignalCandidate = serde_json::from_str(json).unwrap();
        let candidate = SignalCandidate::try_from(r).unwrap();
        assert_eq!(candidate.direction(), Direction::SellToEnter);
        assert_eq!(candidate.order().unwrap().stop_loss, Some(2050.0));
    }

    #[test]
    fn side_helpers() {
        assert!(Side::Long.agrees(Bias::Bullish));
        assert!(Side::Long.opposes(Bias::Bearish));
        assert!(!Side::Short.opposes(Bias::Neutral));
        assert_eq!(Side::Short.sign(), -1.0);
    }
}
