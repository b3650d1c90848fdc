//! End-to-end pipeline tests through the data port.
//!
//! Tests cover:
//! - Indicator edge cases on hand-computable inputs
//! - Extreme contradiction rejection for a short into a clean uptrend
//! - Trend-alignment auto-rejection
//! - Bounce direction override
//! - Multi-asset evaluation with mixed candidates

mod common;

use approx::assert_relative_eq;
use common::*;
use signalgate::domain::config::{ExecutionLevel, TradingMode};
use signalgate::domain::error::SignalGateError;
use signalgate::domain::external::{ExternalData, OrderBook};
use signalgate::domain::indicator::rsi::rsi;
use signalgate::domain::ohlcv::Interval;
use signalgate::domain::pipeline::{AccountState, EvaluationJob, SignalPipeline};
use signalgate::domain::signal::{Direction, SignalCandidate, Side};
use signalgate::domain::sizing::atr_stop;
use signalgate::domain::snapshot::{TimeframeSet, build_snapshot};
use signalgate::ports::data_port::DataPort;

mod indicators {
    use super::*;

    #[test]
    fn rsi_of_strictly_rising_closes_is_100() {
        let closes: Vec<f64> = (1..=15).map(f64::from).collect();
        let out = rsi(&closes, 14);
        assert_eq!(out.len(), 1);
        assert_relative_eq!(out[0], 100.0);
    }

    #[test]
    fn atr_stop_for_low_volatility_long() {
        let plan = atr_stop(Side::Long, 100.0, Some(2.0));
        assert_relative_eq!(plan.stop_loss, 96.7, epsilon = 1e-9);
    }

    #[test]
    fn snapshot_marks_short_history_unavailable() {
        let port = MockDataPort::new().with_candles("BTC", Interval::OneHour, candles_from_closes(&[100.0, 101.0, 102.0], Interval::OneHour));
        let series = port.fetch_ohlcv("BTC", Interval::OneHour).unwrap();
        let snap = build_snapshot(&TimeframeSet::new(&series), series.last().timestamp, &ExternalData::default()).unwrap();
        assert_eq!(snap.candles, 3);
        assert!(snap.rsi.is_none());
        assert!(snap.macd.is_none());
        assert!(snap.ema_200.is_none());
        assert!(snap.bollinger.is_none());
    }

    #[test]
    fn snapshot_before_first_candle_is_insufficient() {
        let series = series("BTC", Interval::OneHour, &rising_closes(30, 100.0, 1.0));
        let result = build_snapshot(&TimeframeSet::new(&series), -1, &ExternalData::default());
        assert!(matches!(result, Err(SignalGateError::InsufficientData { .. })));
    }
}

mod gatekeepers {
    use super::*;

    fn uptrend_port() -> MockDataPort {
        MockDataPort::new()
            .with_candles("BTC", Interval::OneHour, candles_from_closes(&rising_closes(260, 100.0, 0.5), Interval::OneHour))
            .with_candles("BTC", Interval::FourHours, candles_from_closes(&rising_closes(80, 60.0, 2.0), Interval::FourHours))
    }

    #[test]
    fn short_into_uptrend_is_extreme_and_rejected() {
        let port = uptrend_port();
        let h1 = port.fetch_ohlcv("BTC", Interval::OneHour).unwrap();
        let h4 = port.fetch_ohlcv("BTC", Interval::FourHours).unwrap();
        let pipeline = SignalPipeline::new(sample_config(TradingMode::ManualReview)).unwrap();
        let now = h1.last().timestamp;
        let decision = pipeline
            .evaluate(
                &market_entry("BTC", Side::Short, h1.last().close),
                &TimeframeSet::new(&h1).with_h4(&h4),
                &ExternalData::default(),
                &AccountState::default(),
                now,
            )
            .unwrap();

        let report = decision.contradictions.as_ref().unwrap();
        assert!(report.score >= 20, "score {}", report.score);
        assert!(!decision.accepted);
        assert_eq!(decision.execution_level, ExecutionLevel::Reject);
        assert_eq!(decision.direction, Direction::SellToEnter);
    }

    #[test]
    fn trend_auto_rejection_zeroes_confidence() {
        let closes: Vec<f64> = (0..260).map(|i| 300.0 - i as f64 * 0.5).collect();
        let h1 = series("BTC", Interval::OneHour, &closes);
        let pipeline = SignalPipeline::new(sample_config(TradingMode::ManualReview)).unwrap();
        let decision = pipeline
            .evaluate(
                &market_entry("BTC", Side::Long, h1.last().close),
                &TimeframeSet::new(&h1),
                &ExternalData::default(),
                &AccountState::default(),
                h1.last().timestamp,
            )
            .unwrap();

        let breakdown = decision.breakdown.as_ref().unwrap();
        assert!(breakdown.auto_rejected);
        assert_eq!(decision.confidence, 0.0);
        assert!(!decision.accepted);
        assert!(breakdown.rejection_reason.is_some());
    }

    #[test]
    fn bounce_overrides_short() {
        let h1 = series("BTC", Interval::OneHour, &bounce_closes());
        let pipeline = SignalPipeline::new(sample_config(TradingMode::ManualReview)).unwrap();
        let decision = pipeline
            .evaluate(
                &market_entry("BTC", Side::Short, 97.5),
                &TimeframeSet::new(&h1),
                &ExternalData::default(),
                &AccountState::default(),
                h1.last().timestamp,
            )
            .unwrap();

        assert_eq!(decision.original_direction, Direction::SellToEnter);
        assert_eq!(decision.direction, Direction::BuyToEnter);
        let bounce = decision.bounce.as_ref().unwrap();
        assert!(bounce.detected);
        assert_eq!(bounce.side, Some(Side::Long));
    }

    #[test]
    fn evaluation_ignores_candles_after_now() {
        let mut closes = rising_closes(200, 100.0, 0.5);
        let h1_full = series("BTC", Interval::OneHour, &closes);
        closes.truncate(150);
        let h1_cut = series("BTC", Interval::OneHour, &closes);
        let now = h1_cut.last().timestamp;
        let pipeline = SignalPipeline::new(sample_config(TradingMode::SignalOnly)).unwrap();
        let candidate = market_entry("BTC", Side::Long, h1_cut.last().close);
        let external = ExternalData {
            order_book: Some(OrderBook {
                imbalance: 0.2,
                bid_wall: None,
                ask_wall: None,
            }),
            ..ExternalData::default()
        };

        let a = pipeline
            .evaluate(&candidate, &TimeframeSet::new(&h1_full), &external, &AccountState::default(), now)
            .unwrap();
        let b = pipeline
            .evaluate(&candidate, &TimeframeSet::new(&h1_cut), &external, &AccountState::default(), now)
            .unwrap();
        assert_eq!(a, b);
    }
}

mod multi_asset {
    use super::*;

    #[test]
    fn evaluate_many_mixes_entries_and_exits() {
        let port = MockDataPort::new()
            .with_candles("BTC", Interval::OneHour, candles_from_closes(&rising_closes(120, 100.0, 0.5), Interval::OneHour))
            .with_candles("ETH", Interval::OneHour, candles_from_closes(&rising_closes(120, 50.0, 0.1), Interval::OneHour))
            .with_candles("SOL", Interval::OneHour, candles_from_closes(&bounce_closes(), Interval::OneHour));
        assert_eq!(port.list_assets(Interval::OneHour).unwrap(), vec!["BTC", "ETH", "SOL"]);

        let btc = port.fetch_ohlcv("BTC", Interval::OneHour).unwrap();
        let eth = port.fetch_ohlcv("ETH", Interval::OneHour).unwrap();
        let sol = port.fetch_ohlcv("SOL", Interval::OneHour).unwrap();
        let now = btc.last().timestamp;

        let jobs = vec![
            EvaluationJob {
                candidate: market_entry("BTC", Side::Long, 0.0),
                timeframes: TimeframeSet::new(&btc),
                external: ExternalData::default(),
                account: AccountState::default(),
            },
            EvaluationJob {
                candidate: SignalCandidate::Reduce {
                    asset: "ETH".into(),
                    fraction: Some(0.5),
                },
                timeframes: TimeframeSet::new(&eth),
                external: ExternalData::default(),
                account: AccountState::default(),
            },
            EvaluationJob {
                candidate: market_entry("SOL", Side::Long, 97.5),
                timeframes: TimeframeSet::new(&sol),
                external: ExternalData::default(),
                account: AccountState::default(),
            },
        ];

        let pipeline = SignalPipeline::new(sample_config(TradingMode::ManualReview)).unwrap();
        let results = pipeline.evaluate_many(&jobs, now);
        assert_eq!(results.len(), 3);

        let btc_decision = results[0].as_ref().unwrap();
        assert_relative_eq!(btc_decision.entry_price, btc.last().close);
        assert_relative_eq!(
            btc_decision.recompute_expected_value(),
            btc_decision.expected_value,
            epsilon = 1e-9
        );

        let eth_decision = results[1].as_ref().unwrap();
        assert!(eth_decision.accepted);
        assert_eq!(eth_decision.direction, Direction::Reduce);

        let sol_decision = results[2].as_ref().unwrap();
        assert_eq!(sol_decision.asset, "SOL");
        assert!(sol_decision.stop_loss.unwrap() < 97.5);
    }

    #[test]
    fn data_errors_propagate() {
        let port = MockDataPort::new().with_error("BTC", "corrupt file");
        assert!(matches!(
            port.fetch_ohlcv("BTC", Interval::OneHour),
            Err(SignalGateError::InvalidSeries { .. })
        ));
        assert!(matches!(
            port.fetch_ohlcv("ETH", Interval::OneHour),
            Err(SignalGateError::NoData { .. })
        ));
    }
}
