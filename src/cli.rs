//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report_adapter::JsonReportAdapter;
use crate::domain::config::PipelineConfig;
use crate::domain::config_validation::build_pipeline_config;
use crate::domain::error::SignalGateError;
use crate::domain::external::ExternalData;
use crate::domain::indicator::correlation::{self, CorrelationMatrix, correlation_matrix};
use crate::domain::ohlcv::{Interval, OhlcvSeries, closes};
use crate::domain::pipeline::{AccountState, EvaluationJob, SignalPipeline};
use crate::domain::signal::{RawSignalCandidate, SignalCandidate};
use crate::domain::snapshot::{TimeframeSet, build_snapshot};
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "signalgate", about = "Trading signal evaluation against technical indicators")]
pub struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Evaluate one or more signal candidates
    Evaluate {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        data_dir: PathBuf,
        /// Only evaluate candidates for this asset
        #[arg(short, long)]
        asset: Option<String>,
        /// JSON file holding one candidate or an array of candidates
        #[arg(long)]
        candidate: PathBuf,
        /// JSON file of external market data
        #[arg(long)]
        external: Option<PathBuf>,
        /// JSON file of account state for the safety limits
        #[arg(long)]
        account: Option<PathBuf>,
        #[arg(short, long, default_value = "1h")]
        interval: Interval,
        /// Evaluation instant, epoch milliseconds (default: now)
        #[arg(long)]
        now: Option<i64>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the indicator snapshot for an asset
    Snapshot {
        #[arg(short, long)]
        data_dir: PathBuf,
        #[arg(short, long)]
        asset: String,
        #[arg(short, long, default_value = "1h")]
        interval: Interval,
        #[arg(long)]
        external: Option<PathBuf>,
        #[arg(long)]
        now: Option<i64>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a pipeline configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Correlation matrix of close-to-close changes across assets
    Correlation {
        #[arg(short, long)]
        data_dir: PathBuf,
        /// Comma-separated assets (default: every asset in the directory)
        #[arg(short, long, value_delimiter = ',')]
        assets: Vec<String>,
        #[arg(short, long, default_value = "1d")]
        interval: Interval,
        #[arg(short, long, default_value_t = correlation::DEFAULT_LOOKBACK)]
        lookback: usize,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List assets with candle files for an interval
    Assets {
        #[arg(short, long)]
        data_dir: PathBuf,
        #[arg(short, long, default_value = "1h")]
        interval: Interval,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Evaluate {
            config,
            data_dir,
            asset,
            candidate,
            external,
            account,
            interval,
            now,
            output,
        } => run_evaluate(&EvaluateArgs {
            config,
            data_dir,
            asset,
            candidate,
            external,
            account,
            interval,
            now,
            output,
        }),
        Command::Snapshot {
            data_dir,
            asset,
            interval,
            external,
            now,
            output,
        } => run_snapshot(&data_dir, &asset, interval, external.as_deref(), now, output.as_deref()),
        Command::Validate { config } => run_validate(&config).map(|_| ()),
        Command::Correlation {
            data_dir,
            assets,
            interval,
            lookback,
            output,
        } => run_correlation(&data_dir, &assets, interval, lookback, output.as_deref()),
        Command::Assets { data_dir, interval } => run_assets(&data_dir, interval),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            (&e).into()
        }
    }
}

#[derive(Debug)]
pub struct EvaluateArgs {
    pub config: PathBuf,
    pub data_dir: PathBuf,
    pub asset: Option<String>,
    pub candidate: PathBuf,
    pub external: Option<PathBuf>,
    pub account: Option<PathBuf>,
    pub interval: Interval,
    pub now: Option<i64>,
    pub output: Option<PathBuf>,
}

pub fn load_config(path: &Path) -> Result<PipelineConfig, SignalGateError> {
    info!(path = %path.display(), "loading config");
    let adapter = FileConfigAdapter::from_file(path)?;
    build_pipeline_config(&adapter)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, SignalGateError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CandidateFile {
    Many(Vec<RawSignalCandidate>),
    One(RawSignalCandidate),
}

/// Parse a candidate file holding a single object or an array.
pub fn load_candidates(path: &Path) -> Result<Vec<SignalCandidate>, SignalGateError> {
    let raw = match read_json::<CandidateFile>(path)? {
        CandidateFile::Many(list) => list,
        CandidateFile::One(one) => vec![one],
    };
    raw.into_iter().map(SignalCandidate::try_from).collect()
}

fn now_or_default(now: Option<i64>) -> i64 {
    now.unwrap_or_else(|| chrono::Utc::now().timestamp_millis())
}

/// Primary series plus whichever higher timeframes have data.
pub struct LoadedSeries {
    pub primary: OhlcvSeries,
    pub h4: Option<OhlcvSeries>,
    pub d1: Option<OhlcvSeries>,
}

impl LoadedSeries {
    pub fn timeframes(&self) -> TimeframeSet<'_> {
        let mut set = TimeframeSet::new(&self.primary);
        if let Some(h4) = &self.h4 {
            set = set.with_h4(h4);
        }
        if let Some(d1) = &self.d1 {
            set = set.with_daily(d1);
        }
        set
    }
}

fn optional_series(port: &dyn DataPort, asset: &str, interval: Interval) -> Result<Option<OhlcvSeries>, SignalGateError> {
    match port.fetch_ohlcv(asset, interval) {
        Ok(series) => Ok(Some(series)),
        Err(SignalGateError::NoData { .. }) => {
            warn!(asset, interval = %interval, "no higher-timeframe data");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

pub fn load_series(port: &dyn DataPort, asset: &str, interval: Interval) -> Result<LoadedSeries, SignalGateError> {
    let primary = port.fetch_ohlcv(asset, interval)?;
    let h4 = match interval {
        Interval::OneHour => optional_series(port, asset, Interval::FourHours)?,
        _ => None,
    };
    let d1 = match interval {
        Interval::OneDay => None,
        _ => optional_series(port, asset, Interval::OneDay)?,
    };
    Ok(LoadedSeries { primary, h4, d1 })
}

fn run_evaluate(args: &EvaluateArgs) -> Result<(), SignalGateError> {
    let pipeline = SignalPipeline::new(load_config(&args.config)?)?;
    let mut candidates = load_candidates(&args.candidate)?;
    if let Some(asset) = &args.asset {
        candidates.retain(|c| c.asset().eq_ignore_ascii_case(asset));
    }
    if candidates.is_empty() {
        return Err(SignalGateError::InvalidCandidate {
            reason: "no candidates to evaluate".into(),
        });
    }
    let external: ExternalData = match &args.external {
        Some(path) => read_json(path)?,
        None => ExternalData::default(),
    };
    let account: AccountState = match &args.account {
        Some(path) => read_json(path)?,
        None => AccountState::default(),
    };
    let now = now_or_default(args.now);

    let port = CsvAdapter::new(args.data_dir.clone());
    let loaded = candidates
        .iter()
        .map(|c| load_series(&port, c.asset(), args.interval))
        .collect::<Result<Vec<_>, _>>()?;
    let jobs: Vec<EvaluationJob<'_>> = candidates
        .into_iter()
        .zip(&loaded)
        .map(|(candidate, series)| EvaluationJob {
            candidate,
            timeframes: series.timeframes(),
            external: external.clone(),
            account,
        })
        .collect();

    info!(count = jobs.len(), now, "evaluating candidates");
    let decisions = pipeline
        .evaluate_many(&jobs, now)
        .into_iter()
        .collect::<Result<Vec<_>, _>>()?;
    for d in &decisions {
        info!(asset = %d.asset, direction = d.direction.as_str(), accepted = d.accepted, reason = %d.reason, "decision");
    }

    let output = args.output.as_deref().map(|p| p.to_string_lossy().into_owned());
    let report = JsonReportAdapter::new();
    match decisions.as_slice() {
        [single] => report.write_decision(single, output.as_deref()),
        many => report.write_decisions(many, output.as_deref()),
    }
}

fn run_snapshot(
    data_dir: &Path,
    asset: &str,
    interval: Interval,
    external: Option<&Path>,
    now: Option<i64>,
    output: Option<&Path>,
) -> Result<(), SignalGateError> {
    let port = CsvAdapter::new(data_dir.to_path_buf());
    let series = load_series(&port, asset, interval)?;
    let external: ExternalData = match external {
        Some(path) => read_json(path)?,
        None => ExternalData::default(),
    };
    let now = now_or_default(now);
    let snapshot = build_snapshot(&series.timeframes(), now, &external)?;
    let output = output.map(|p| p.to_string_lossy().into_owned());
    JsonReportAdapter::new().write_snapshot(&snapshot, output.as_deref())
}

/// Load and validate a config, logging what it resolved to.
pub fn run_validate(config_path: &Path) -> Result<PipelineConfig, SignalGateError> {
    let config = load_config(config_path)?;
    SignalPipeline::new(config.clone())?;
    info!(
        mode = %config.mode,
        allow_flip = config.allow_flip,
        equity = config.account_equity,
        "configuration is valid"
    );
    info!(
        high = config.confidence.high,
        medium = config.confidence.medium,
        low = config.confidence.low,
        reject = config.confidence.reject,
        "confidence thresholds"
    );
    info!(
        high = config.expected_value.high,
        medium = config.expected_value.medium,
        low = config.expected_value.low,
        reject = config.expected_value.reject,
        "expected value thresholds"
    );
    Ok(config)
}

/// Correlation of the given assets' closes, or of every asset with data.
pub fn compute_correlation(
    port: &dyn DataPort,
    assets: &[String],
    interval: Interval,
    lookback: usize,
) -> Result<CorrelationMatrix, SignalGateError> {
    let assets = if assets.is_empty() {
        port.list_assets(interval)?
    } else {
        assets.iter().map(|a| a.trim().to_uppercase()).collect()
    };
    let series = assets
        .into_iter()
        .map(|asset| {
            let data = port.fetch_ohlcv(&asset, interval)?;
            Ok((asset, closes(data.candles())))
        })
        .collect::<Result<Vec<_>, SignalGateError>>()?;
    Ok(correlation_matrix(&series, lookback))
}

fn run_correlation(
    data_dir: &Path,
    assets: &[String],
    interval: Interval,
    lookback: usize,
    output: Option<&Path>,
) -> Result<(), SignalGateError> {
    let port = CsvAdapter::new(data_dir.to_path_buf());
    let matrix = compute_correlation(&port, assets, interval, lookback)?;
    info!(assets = matrix.assets.len(), lookback, "correlation computed");
    let output = output.map(|p| p.to_string_lossy().into_owned());
    JsonReportAdapter::new().write_correlation(&matrix, output.as_deref())
}

fn run_assets(data_dir: &Path, interval: Interval) -> Result<(), SignalGateError> {
    let port = CsvAdapter::new(data_dir.to_path_buf());
    let assets = port.list_assets(interval)?;
    if assets.is_empty() {
        warn!(dir = %data_dir.display(), interval = %interval, "no assets found");
    }
    for asset in &assets {
        println!("{asset}");
    }
    Ok(())
}
