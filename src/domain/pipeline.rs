//! Signal evaluation pipeline.
//!
//! One evaluation runs strictly in order:
//!
//! 1. snapshot of every indicator visible at `now`
//! 2. bounce analysis, which may force the entry side
//! 3. contradiction detection and the [`AdjustmentDecision`]
//! 4. stop and target correction
//! 5. confidence scoring with the trend-alignment gatekeeper
//! 6. position sizing
//! 7. bounce confidence and target adjustments
//! 8. account safety limits
//! 9. expected value and the execution gate
//!
//! Every rewritten field is recorded on the decision. Given the same series,
//! candidate, external data and `now`, the decision is identical.

use crate::domain::adjustment::{Adjustment, AdjustmentDecision, decide_adjustment};
use crate::domain::bounce::{BounceAnalysis, analyze_bounce};
use crate::domain::config::{ExecutionLevel, PipelineConfig};
use crate::domain::config_validation::validate_pipeline_config;
use crate::domain::contradiction::{ContradictionReport, detect_contradictions};
use crate::domain::error::SignalGateError;
use crate::domain::expected_value::{GateInput, apply_gate, expected_value};
use crate::domain::external::ExternalData;
use crate::domain::ohlcv::OhlcvSeries;
use crate::domain::scoring::{ConfidenceBreakdown, ScoringInput, risk_reward_ratio, score_signal};
use crate::domain::signal::{Direction, EntryOrder, SignalCandidate, Side};
use crate::domain::sizing::{
    DEFAULT_RAW_CONFIDENCE, SizingInput, TakeProfitBonuses, atr_stop, bounce_take_profit, min_reward_risk,
    size_position, take_profit,
};
use crate::domain::snapshot::{IndicatorSnapshot, TimeframeSet, build_snapshot};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Account state the safety limits are checked against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountState {
    /// Falls back to the configured equity when not positive.
    pub equity: f64,
    pub open_positions: u32,
    /// Realised PnL today, percent of equity.
    pub daily_pnl_pct: f64,
    pub consecutive_losses: u32,
}

/// Terminal artifact of one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalDecision {
    pub asset: String,
    pub direction: Direction,
    /// Direction as proposed, before any flip or bounce override.
    pub original_direction: Direction,
    /// Candidate with the corrected entry levels.
    pub candidate: SignalCandidate,
    pub entry_price: f64,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    pub confidence: f64,
    /// Percent of entry.
    pub expected_value: f64,
    pub risk_reward_ratio: f64,
    /// Stop distance in percent of entry.
    pub risk_pct: f64,
    pub position_size: f64,
    pub notional: f64,
    pub leverage: f64,
    pub margin_pct: f64,
    pub execution_level: ExecutionLevel,
    pub accepted: bool,
    pub reason: String,
    pub breakdown: Option<ConfidenceBreakdown>,
    pub contradictions: Option<ContradictionReport>,
    pub bounce: Option<BounceAnalysis>,
    pub adjustments: Vec<Adjustment>,
    pub adjustment_decision: Option<AdjustmentDecision>,
    /// Evaluation instant, epoch ms.
    pub evaluated_at: i64,
}

impl SignalDecision {
    /// EV from the decision's own confidence, ratio and risk.
    pub fn recompute_expected_value(&self) -> f64 {
        expected_value(self.confidence, self.risk_reward_ratio, self.risk_pct)
    }

    fn pass_through(candidate: &SignalCandidate, now: i64, accepted: bool, level: ExecutionLevel, reason: &str) -> Self {
        Self {
            asset: candidate.asset().to_string(),
            direction: candidate.direction(),
            original_direction: candidate.direction(),
            candidate: candidate.clone(),
            entry_price: 0.0,
            stop_loss: None,
            take_profit: None,
            confidence: 0.0,
            expected_value: 0.0,
            risk_reward_ratio: 0.0,
            risk_pct: 0.0,
            position_size: 0.0,
            notional: 0.0,
            leverage: 0.0,
            margin_pct: 0.0,
            execution_level: level,
            accepted,
            reason: reason.to_string(),
            breakdown: None,
            contradictions: None,
            bounce: None,
            adjustments: Vec::new(),
            adjustment_decision: None,
            evaluated_at: now,
        }
    }
}

/// One asset's inputs for [`SignalPipeline::evaluate_many`].
#[derive(Debug, Clone)]
pub struct EvaluationJob<'a> {
    pub candidate: SignalCandidate,
    pub timeframes: TimeframeSet<'a>,
    pub external: ExternalData,
    pub account: AccountState,
}

#[derive(Debug, Clone)]
pub struct SignalPipeline {
    config: PipelineConfig,
}

impl SignalPipeline {
    /// Fails on an invalid configuration before anything is evaluated.
    pub fn new(config: PipelineConfig) -> Result<Self, SignalGateError> {
        validate_pipeline_config(&config)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn evaluate(
        &self,
        candidate: &SignalCandidate,
        timeframes: &TimeframeSet<'_>,
        external: &ExternalData,
        account: &AccountState,
        now: i64,
    ) -> Result<SignalDecision, SignalGateError> {
        if !candidate.asset().eq_ignore_ascii_case(timeframes.asset()) {
            return Err(SignalGateError::InvalidCandidate {
                reason: format!(
                    "candidate asset {} does not match series {}",
                    candidate.asset(),
                    timeframes.asset()
                ),
            });
        }

        let (side, order) = match (candidate.side(), candidate.order()) {
            (Some(side), Some(order)) => (side, *order),
            _ => {
                let decision = match candidate {
                    SignalCandidate::Hold { .. } => {
                        SignalDecision::pass_through(candidate, now, false, ExecutionLevel::Reject, "hold")
                    }
                    _ => SignalDecision::pass_through(
                        candidate,
                        now,
                        true,
                        ExecutionLevel::High,
                        "exit signals pass through",
                    ),
                };
                debug!(asset = %decision.asset, direction = %decision.direction.as_str(), "non-entry candidate");
                return Ok(decision);
            }
        };

        let snapshot = build_snapshot(timeframes, now, external)?;
        Ok(self.evaluate_entry(candidate, side, order, timeframes.primary, &snapshot, external, account, now))
    }

    /// Evaluate independent assets in parallel. Results keep job order.
    pub fn evaluate_many(&self, jobs: &[EvaluationJob<'_>], now: i64) -> Vec<Result<SignalDecision, SignalGateError>> {
        jobs.par_iter()
            .map(|job| self.evaluate(&job.candidate, &job.timeframes, &job.external, &job.account, now))
            .collect()
    }

    #[allow(clippy::too_many_arguments)]
    fn evaluate_entry(
        &self,
        candidate: &SignalCandidate,
        proposed_side: Side,
        order: EntryOrder,
        primary: &OhlcvSeries,
        snapshot: &IndicatorSnapshot,
        external: &ExternalData,
        account: &AccountState,
        now: i64,
    ) -> SignalDecision {
        let asset = snapshot.asset.clone();
        let original_direction = candidate.direction();
        let mut adjustments = Vec::new();
        let mut side = proposed_side;

        let mut entry = order.entry_price;
        if entry <= 0.0 {
            warn!(asset = %asset, field = "entry_price", old = entry, new = snapshot.price, "non-positive entry replaced by last close");
            adjustments.push(Adjustment::new(
                "entry_price",
                Some(entry),
                Some(snapshot.price),
                "non_positive_entry",
                "entry replaced by the last close",
            ));
            entry = snapshot.price;
        }

        // Bounce
        let bounce = analyze_bounce(primary.up_to(now), snapshot.interval, snapshot.h4_ema_8);
        let bounce_active = bounce.is_active(snapshot.interval);
        if let Some(bounce_side) = bounce.side.filter(|s| bounce_active && *s != side) {
            info!(asset = %asset, from = ?side, to = ?bounce_side, "active bounce overrides direction");
            adjustments.push(Adjustment::new(
                "direction",
                Some(side.sign()),
                Some(bounce_side.sign()),
                "bounce_direction",
                format!("active {bounce_side:?} bounce overrides a {side:?} entry"),
            ));
            side = bounce_side;
        }
        let exempt = bounce_active && bounce.matches(side);

        // Contradictions
        let mut report = detect_contradictions(side, snapshot);
        let mut opposite = detect_contradictions(side.opposite(), snapshot);
        let decision = decide_adjustment(&report, &opposite, self.config.allow_flip, exempt);
        let mut stop_hint = order.stop_loss;
        let mut target_hint = order.take_profit;
        match &decision {
            AdjustmentDecision::Keep => {}
            AdjustmentDecision::Flip { reason } => {
                info!(asset = %asset, from = ?side, to = ?side.opposite(), %reason, "entry flipped");
                adjustments.push(Adjustment::new(
                    "direction",
                    Some(side.sign()),
                    Some(side.opposite().sign()),
                    "contradiction_flip",
                    reason.clone(),
                ));
                side = side.opposite();
                std::mem::swap(&mut report, &mut opposite);
                stop_hint = None;
                target_hint = None;
            }
            AdjustmentDecision::Reject { reason } => {
                warn!(asset = %asset, score = report.score, %reason, "extreme contradiction");
            }
            AdjustmentDecision::FlagContradiction { severity, .. } => {
                warn!(asset = %asset, score = report.score, severity = %severity, "contradiction flagged");
            }
        }
        if side != proposed_side && !matches!(decision, AdjustmentDecision::Flip { .. }) {
            // A bounce override leaves the proposed levels on the wrong side.
            stop_hint = None;
            target_hint = None;
        }

        // Stop
        let plan = atr_stop(side, entry, snapshot.atr);
        let stop_loss = match stop_hint {
            Some(stop) if side.sign() * (entry - stop) >= plan.distance => stop,
            proposed => {
                let rule = match proposed {
                    None => "missing_stop",
                    Some(stop) if side.sign() * (entry - stop) <= 0.0 => "inverted_stop",
                    Some(_) => "stop_inside_atr",
                };
                if proposed.is_some() {
                    warn!(asset = %asset, field = "stop_loss", old = ?proposed, new = plan.stop_loss, rule, "stop corrected");
                } else {
                    debug!(asset = %asset, field = "stop_loss", new = plan.stop_loss, "stop computed");
                }
                adjustments.push(Adjustment::new(
                    "stop_loss",
                    proposed,
                    Some(plan.stop_loss),
                    rule,
                    format!("ATR stop {:.2}% from entry", plan.distance_pct(entry)),
                ));
                plan.stop_loss
            }
        };
        let stop_distance = side.sign() * (entry - stop_loss);

        // Target
        let take_profit_level = match (exempt, bounce.middle_band) {
            (true, Some(middle)) => {
                let target = bounce_take_profit(side, entry, stop_distance, middle);
                adjustments.push(Adjustment::new(
                    "take_profit",
                    target_hint,
                    Some(target),
                    "bounce_target",
                    "bounce targets the middle band",
                ));
                target
            }
            _ => {
                let bonuses = TakeProfitBonuses::from_snapshot(side, snapshot);
                let computed = take_profit(side, entry, stop_distance, &bonuses, order.raw_confidence);
                let min_rr = min_reward_risk(order.raw_confidence.unwrap_or(DEFAULT_RAW_CONFIDENCE));
                match target_hint {
                    Some(tp) if side.sign() * (tp - entry) >= stop_distance * min_rr => tp,
                    proposed => {
                        let rule = match proposed {
                            None => "missing_target",
                            Some(tp) if side.sign() * (tp - entry) <= 0.0 => "inverted_target",
                            Some(_) => "reward_risk_below_minimum",
                        };
                        if proposed.is_some() {
                            warn!(asset = %asset, field = "take_profit", old = ?proposed, new = computed, rule, "target corrected");
                        }
                        adjustments.push(Adjustment::new(
                            "take_profit",
                            proposed,
                            Some(computed),
                            rule,
                            format!("target at least {min_rr:.1}R"),
                        ));
                        computed
                    }
                }
            }
        };

        // Score
        let mut breakdown = score_signal(&ScoringInput {
            side,
            snapshot,
            external,
            entry,
            stop_loss,
            take_profit: take_profit_level,
            contradiction_score: report.score,
            mode: self.config.mode,
        });
        if let Some(reason) = &breakdown.rejection_reason {
            warn!(asset = %asset, %reason, "trend gatekeeper rejection");
        }

        // Size
        let equity = if account.equity > 0.0 {
            account.equity
        } else {
            self.config.account_equity
        };
        let sizing = size_position(&SizingInput {
            side,
            snapshot,
            entry,
            stop_loss,
            take_profit: take_profit_level,
            confidence: breakdown.confidence,
            equity,
            sizing_multiplier: self.config.sizing_multiplier(breakdown.confidence),
            max_risk_per_trade: self.config.safety.max_risk_per_trade,
            max_leverage: self.config.leverage.max_for(&asset),
        });

        // Bounce adjustments
        let mut final_take_profit = take_profit_level;
        if bounce.matches(side) {
            if bounce.confidence_multiplier != 1.0 && !breakdown.auto_rejected {
                let before = breakdown.confidence;
                breakdown.scale_confidence(bounce.confidence_multiplier);
                info!(asset = %asset, field = "confidence", old = before, new = breakdown.confidence, "bounce confidence adjustment");
                adjustments.push(Adjustment::new(
                    "confidence",
                    Some(before),
                    Some(breakdown.confidence),
                    "bounce_multiplier",
                    bounce.notes.join("; "),
                ));
            }
            let tightens = |t: &f64| side.sign() * (t - entry) > 0.0 && side.sign() * (final_take_profit - t) > 0.0;
            if let Some(trail) = bounce.trail_take_profit.filter(tightens) {
                info!(asset = %asset, field = "take_profit", old = final_take_profit, new = trail, "bounce target trailed");
                adjustments.push(Adjustment::new(
                    "take_profit",
                    Some(final_take_profit),
                    Some(trail),
                    "bounce_trail",
                    "EMA(8) lost, target trailed to the best close of the bounce",
                ));
                final_take_profit = trail;
            }
        }

        // Safety
        let safety = self.safety_violation(account);
        if let Some(reason) = &safety {
            warn!(asset = %asset, %reason, "safety limit reached");
        }

        // EV gate
        let reward_risk = risk_reward_ratio(side, entry, stop_loss, final_take_profit);
        let risk_pct = if entry > 0.0 { stop_distance / entry * 100.0 } else { 0.0 };
        let ev = expected_value(breakdown.confidence, reward_risk, risk_pct);
        let contradiction_reject = match &decision {
            AdjustmentDecision::Reject { reason } => Some(reason.as_str()),
            _ => None,
        };
        let verdict = apply_gate(
            &self.config,
            &GateInput {
                confidence: breakdown.confidence,
                expected_value: ev,
                contradiction_reject,
                auto_reject: breakdown.rejection_reason.as_deref(),
                safety_reject: safety.as_deref(),
            },
        );
        info!(
            asset = %asset,
            side = ?side,
            confidence = breakdown.confidence,
            expected_value = ev,
            level = ?verdict.execution_level,
            accepted = verdict.accepted,
            "signal evaluated"
        );

        let final_order = EntryOrder {
            entry_price: entry,
            stop_loss: Some(stop_loss),
            take_profit: Some(final_take_profit),
            raw_confidence: order.raw_confidence,
        };
        let reversed = if side == proposed_side { None } else { candidate.flipped() };
        let final_candidate = reversed.as_ref().unwrap_or(candidate).with_order(final_order);

        SignalDecision {
            asset,
            direction: final_candidate.direction(),
            original_direction,
            candidate: final_candidate,
            entry_price: entry,
            stop_loss: Some(stop_loss),
            take_profit: Some(final_take_profit),
            confidence: breakdown.confidence,
            expected_value: ev,
            risk_reward_ratio: reward_risk,
            risk_pct,
            position_size: if verdict.accepted { sizing.position_size } else { 0.0 },
            notional: if verdict.accepted { sizing.notional } else { 0.0 },
            leverage: sizing.leverage,
            margin_pct: sizing.margin_pct,
            execution_level: verdict.execution_level,
            accepted: verdict.accepted,
            reason: verdict.reason,
            breakdown: Some(breakdown),
            contradictions: Some(report),
            bounce: Some(bounce),
            adjustments,
            adjustment_decision: Some(decision),
            evaluated_at: now,
        }
    }

    fn safety_violation(&self, account: &AccountState) -> Option<String> {
        let limits = &self.config.safety;
        if account.open_positions >= limits.max_open_positions {
            return Some(format!(
                "{} open positions, limit {}",
                account.open_positions, limits.max_open_positions
            ));
        }
        if account.daily_pnl_pct <= -limits.daily_loss_limit {
            return Some(format!(
                "daily loss {:.2}% reached limit {:.2}%",
                -account.daily_pnl_pct, limits.daily_loss_limit
            ));
        }
        if account.consecutive_losses >= limits.consecutive_losses {
            return Some(format!(
                "{} consecutive losses, limit {}",
                account.consecutive_losses, limits.consecutive_losses
            ));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::{Thresholds, TradingMode};
    use crate::domain::indicator::make_candles;
    use crate::domain::ohlcv::Interval;
    use approx::assert_relative_eq;

    fn config(mode: TradingMode) -> PipelineConfig {
        PipelineConfig::new(
            mode,
            Thresholds {
                high: 0.75,
                medium: 0.6,
                low: 0.45,
                reject: 0.3,
            },
            Thresholds {
                high: 1.0,
                medium: 0.5,
                low: 0.2,
                reject: 0.0,
            },
        )
    }

    fn pipeline() -> SignalPipeline {
        SignalPipeline::new(config(TradingMode::ManualReview)).unwrap()
    }

    fn rising_series() -> OhlcvSeries {
        let closes: Vec<f64> = (0..260).map(|i| 100.0 + i as f64 * 0.5).collect();
        OhlcvSeries::new("BTC", Interval::OneHour, make_candles(&closes)).unwrap()
    }

    fn bounce_series() -> OhlcvSeries {
        let mut closes: Vec<f64> = (0..40).map(|i| 100.0 + if i % 2 == 0 { 0.5 } else { -0.5 }).collect();
        closes.extend([98.0, 95.0, 91.0, 97.5]);
        OhlcvSeries::new("BTC", Interval::OneHour, make_candles(&closes)).unwrap()
    }

    fn entry(price: f64) -> EntryOrder {
        EntryOrder {
            entry_price: price,
            stop_loss: None,
            take_profit: None,
            raw_confidence: None,
        }
    }

    fn run(pipeline: &SignalPipeline, series: &OhlcvSeries, candidate: &SignalCandidate) -> SignalDecision {
        pipeline
            .evaluate(
                candidate,
                &TimeframeSet::new(series),
                &ExternalData::default(),
                &AccountState::default(),
                series.last().timestamp,
            )
            .unwrap()
    }

    #[test]
    fn invalid_config_fails_construction() {
        let mut cfg = config(TradingMode::Autonomous);
        cfg.confidence.low = 0.9;
        assert!(SignalPipeline::new(cfg).is_err());
    }

    #[test]
    fn hold_is_never_accepted() {
        let series = rising_series();
        let decision = run(&pipeline(), &series, &SignalCandidate::Hold { asset: "BTC".into() });
        assert!(!decision.accepted);
        assert_eq!(decision.reason, "hold");
        assert_eq!(decision.execution_level, ExecutionLevel::Reject);
    }

    #[test]
    fn exits_pass_through() {
        let series = rising_series();
        let close_all = SignalCandidate::Close {
            asset: "BTC".into(),
            all: true,
        };
        let decision = run(&pipeline(), &series, &close_all);
        assert!(decision.accepted);
        assert_eq!(decision.direction, Direction::CloseAll);
        assert_eq!(decision.expected_value, 0.0);
    }

    #[test]
    fn asset_mismatch_is_an_error() {
        let series = rising_series();
        let candidate = SignalCandidate::open("ETH", Side::Long, entry(200.0));
        let result = pipeline().evaluate(
            &candidate,
            &TimeframeSet::new(&series),
            &ExternalData::default(),
            &AccountState::default(),
            series.last().timestamp,
        );
        assert!(matches!(result, Err(SignalGateError::InvalidCandidate { .. })));
    }

    #[test]
    fn short_into_uptrend_is_rejected() {
        let series = rising_series();
        let price = series.last().close;
        let decision = run(&pipeline(), &series, &SignalCandidate::open("BTC", Side::Short, entry(price)));
        let report = decision.contradictions.as_ref().unwrap();
        assert!(report.score >= 20, "score {}", report.score);
        assert!(!decision.accepted);
        assert_eq!(decision.position_size, 0.0);
        assert!(decision.adjustment_decision.as_ref().unwrap().is_reject());
    }

    #[test]
    fn flip_when_allowed() {
        let series = rising_series();
        let mut cfg = config(TradingMode::ManualReview);
        cfg.allow_flip = true;
        let pipeline = SignalPipeline::new(cfg).unwrap();
        let price = series.last().close;
        let decision = run(&pipeline, &series, &SignalCandidate::open("BTC", Side::Short, entry(price)));
        assert_eq!(decision.original_direction, Direction::SellToEnter);
        // The flip needs a clean opposite side; otherwise the short is refused.
        match decision.adjustment_decision.as_ref().unwrap() {
            AdjustmentDecision::Flip { .. } => {
                assert_eq!(decision.direction, Direction::BuyToEnter);
                assert!(decision.stop_loss.unwrap() < price);
                assert!(decision.adjustments.iter().any(|a| a.rule == "contradiction_flip"));
            }
            AdjustmentDecision::Reject { .. } => assert!(!decision.accepted),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn non_positive_entry_uses_last_close() {
        let series = rising_series();
        let decision = run(&pipeline(), &series, &SignalCandidate::open("BTC", Side::Long, entry(0.0)));
        assert_relative_eq!(decision.entry_price, series.last().close);
        assert!(decision.adjustments.iter().any(|a| a.rule == "non_positive_entry"));
    }

    #[test]
    fn inverted_levels_are_corrected() {
        let series = rising_series();
        let price = series.last().close;
        let order = EntryOrder {
            entry_price: price,
            stop_loss: Some(price + 5.0),
            take_profit: Some(price - 5.0),
            raw_confidence: Some(0.6),
        };
        let decision = run(&pipeline(), &series, &SignalCandidate::open("BTC", Side::Long, order));
        assert!(decision.stop_loss.unwrap() < price);
        assert!(decision.take_profit.unwrap() > price);
        let rules: Vec<_> = decision.adjustments.iter().map(|a| a.rule).collect();
        assert!(rules.contains(&"inverted_stop"));
        assert!(rules.contains(&"inverted_target"));
    }

    #[test]
    fn active_bounce_forces_long() {
        let series = bounce_series();
        let decision = run(&pipeline(), &series, &SignalCandidate::open("BTC", Side::Short, entry(97.5)));
        assert_eq!(decision.direction, Direction::BuyToEnter);
        assert!(decision.adjustments.iter().any(|a| a.rule == "bounce_direction"));
        assert!(decision.take_profit.unwrap() > decision.entry_price);
        assert!(decision.stop_loss.unwrap() < decision.entry_price);
    }

    #[test]
    fn bounce_side_survives_allow_flip() {
        let series = bounce_series();
        let mut cfg = config(TradingMode::ManualReview);
        cfg.allow_flip = true;
        let pipeline = SignalPipeline::new(cfg).unwrap();
        for proposed in [Side::Short, Side::Long] {
            let decision = run(&pipeline, &series, &SignalCandidate::open("BTC", proposed, entry(97.5)));
            assert_eq!(decision.direction, Direction::BuyToEnter);
            assert!(!decision.adjustments.iter().any(|a| a.rule == "contradiction_flip"));
            assert!(!matches!(decision.adjustment_decision, Some(AdjustmentDecision::Flip { .. })));
        }
    }

    #[test]
    fn lost_bounce_run_trails_the_target() {
        let mut closes: Vec<f64> = bounce_series().candles().iter().map(|c| c.close).collect();
        closes.extend([99.0, 100.0, 97.0]);
        let series = OhlcvSeries::new("BTC", Interval::OneHour, make_candles(&closes)).unwrap();
        let decision = run(&pipeline(), &series, &SignalCandidate::open("BTC", Side::Long, entry(0.0)));
        assert_relative_eq!(decision.entry_price, 97.0);
        assert_eq!(decision.take_profit, Some(100.0));
        let trail = decision.adjustments.iter().find(|a| a.rule == "bounce_trail").unwrap();
        assert_eq!(trail.to, Some(100.0));
        assert!(trail.from.unwrap() > 100.0);
        assert_relative_eq!(decision.recompute_expected_value(), decision.expected_value, epsilon = 1e-9);
    }

    #[test]
    fn bounce_override_keeps_add_variant() {
        let series = bounce_series();
        let candidate = SignalCandidate::Add {
            asset: "BTC".into(),
            side: Side::Short,
            order: entry(97.5),
        };
        let decision = run(&pipeline(), &series, &candidate);
        assert!(matches!(decision.candidate, SignalCandidate::Add { side: Side::Long, .. }));
        assert_eq!(decision.candidate.order().unwrap().stop_loss, decision.stop_loss);
    }

    #[test]
    fn safety_limits_reject() {
        let series = rising_series();
        let price = series.last().close;
        let account = AccountState {
            open_positions: 5,
            ..AccountState::default()
        };
        let decision = pipeline()
            .evaluate(
                &SignalCandidate::open("BTC", Side::Long, entry(price)),
                &TimeframeSet::new(&series),
                &ExternalData::default(),
                &account,
                series.last().timestamp,
            )
            .unwrap();
        assert!(!decision.accepted);
        assert!(decision.reason.starts_with("safety limit"));
    }

    #[test]
    fn expected_value_round_trips() {
        let series = rising_series();
        let price = series.last().close;
        let decision = run(&pipeline(), &series, &SignalCandidate::open("BTC", Side::Long, entry(price)));
        assert_relative_eq!(decision.recompute_expected_value(), decision.expected_value, epsilon = 1e-9);
        assert!((0.0..=1.0).contains(&decision.confidence));
    }

    #[test]
    fn evaluation_is_deterministic() {
        let series = rising_series();
        let price = series.last().close;
        let candidate = SignalCandidate::open("BTC", Side::Long, entry(price));
        let pipeline = pipeline();
        assert_eq!(run(&pipeline, &series, &candidate), run(&pipeline, &series, &candidate));
    }

    #[test]
    fn evaluate_many_keeps_order() {
        let btc = rising_series();
        let eth = OhlcvSeries::new("ETH", Interval::OneHour, btc.candles().to_vec()).unwrap();
        let jobs = vec![
            EvaluationJob {
                candidate: SignalCandidate::open("BTC", Side::Long, entry(0.0)),
                timeframes: TimeframeSet::new(&btc),
                external: ExternalData::default(),
                account: AccountState::default(),
            },
            EvaluationJob {
                candidate: SignalCandidate::Hold { asset: "ETH".into() },
                timeframes: TimeframeSet::new(&eth),
                external: ExternalData::default(),
                account: AccountState::default(),
            },
        ];
        let results = pipeline().evaluate_many(&jobs, btc.last().timestamp);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].as_ref().unwrap().asset, "BTC");
        assert_eq!(results[1].as_ref().unwrap().reason, "hold");
    }
}
