//! urlguard entrypoint: score URLs against a model bundle and review past scorings.
//! The bundle is loaded once per invocation and shared by every prediction.

use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{info, warn};
use urlguard::{
    config::GuardConfig,
    error::BundleContractError,
    features::{FeatureExtractor, FeatureMap},
    logging::StructuredLogger,
    model::ModelBundle,
    predict::{Prediction, PredictionAdapter},
    storage::{load_or_create_secret, HistoryRecord, HistoryStore},
};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

static STOP: AtomicBool = AtomicBool::new(false);

#[derive(Parser)]
#[command(name = "urlguard", version, about = "Score URLs as likely benign or likely malicious")]
struct Args {
    /// Configuration file (default: $URLGUARD_CONFIG_PATH, then config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Score a single URL
    Score {
        url: String,
        /// Model bundle (overrides the configured one)
        #[arg(long)]
        bundle: Option<PathBuf>,
        #[arg(long)]
        no_history: bool,
        #[arg(long)]
        json: bool,
    },
    /// Score one URL per line from FILE, or stdin when omitted
    Batch {
        file: Option<PathBuf>,
        #[arg(long)]
        bundle: Option<PathBuf>,
        #[arg(long)]
        no_history: bool,
        /// ndjson output
        #[arg(long)]
        json: bool,
    },
    /// List past scorings, oldest first
    History {
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long)]
        json: bool,
    },
    /// Show one past scoring with its features
    Show { id: i64 },
    /// Print the feature mapping of a URL; no model involved
    Features {
        url: String,
        #[arg(long)]
        json: bool,
    },
}

fn load_adapter(
    config: &GuardConfig,
    bundle: Option<&Path>,
    extractor: FeatureExtractor,
) -> Result<PredictionAdapter, BoxError> {
    let path = bundle.unwrap_or(&config.model_path);
    let bundle = ModelBundle::load(path)?;
    Ok(PredictionAdapter::new(Arc::new(bundle)).with_extractor(extractor))
}

fn open_store(config: &GuardConfig) -> Result<HistoryStore, BoxError> {
    std::fs::create_dir_all(&config.data_dir)?;
    let secret = match std::env::var(&config.history.secret_env) {
        Ok(s) if !s.is_empty() => s.into_bytes(),
        _ => load_or_create_secret(&config.data_dir.join("history.key"))?,
    };
    Ok(HistoryStore::open(&config.history_path(), &secret)?)
}

/// Store failures do not invalidate a prediction; they are logged and skipped.
fn open_recording_store(config: &GuardConfig, no_history: bool) -> Option<HistoryStore> {
    if no_history || !config.history.enabled {
        return None;
    }
    match open_store(config) {
        Ok(store) => Some(store),
        Err(e) => {
            warn!(error = %e, "history unavailable; results will not be recorded");
            None
        }
    }
}

fn record(store: Option<&HistoryStore>, prediction: &Prediction) -> Option<i64> {
    let store = store?;
    match store.record(prediction) {
        Ok(id) => Some(id),
        Err(e) => {
            warn!(scan_id = %prediction.scan_id, error = %e, "failed to record scoring");
            None
        }
    }
}

fn print_features(out: &mut impl Write, features: &FeatureMap) -> std::io::Result<()> {
    writeln!(out, "Features:")?;
    for (feature, value) in features.canonical() {
        writeln!(out, "  {:<22}{:>3}", feature.name(), value)?;
    }
    Ok(())
}

fn print_prediction(out: &mut impl Write, p: &Prediction, id: Option<i64>) -> std::io::Result<()> {
    if let Some(id) = id {
        writeln!(out, "Record:     #{}", id)?;
    }
    writeln!(out, "URL:        {}", p.url)?;
    writeln!(out, "Result:     {}", p.verdict)?;
    writeln!(out, "Confidence: {}", p.confidence)?;
    writeln!(out, "Model:      {}", p.model)?;
    print_features(out, &p.features)
}

fn print_record(out: &mut impl Write, r: &HistoryRecord) -> std::io::Result<()> {
    let verdict = urlguard::Verdict::from_label(r.prediction);
    writeln!(out, "Record:     #{}", r.id)?;
    writeln!(out, "Scanned:    {}", r.created_at.to_rfc3339())?;
    writeln!(out, "URL:        {}", r.url)?;
    writeln!(out, "Result:     {}", verdict)?;
    writeln!(out, "Confidence: {}", r.confidence)?;
    writeln!(out, "Model:      {}", r.model_used)?;
    print_features(out, &r.features)
}

fn read_urls(file: Option<&Path>) -> std::io::Result<Vec<String>> {
    let lines: Vec<String> = match file {
        Some(path) => std::fs::read_to_string(path)?
            .lines()
            .map(str::to_string)
            .collect(),
        None => std::io::stdin().lock().lines().collect::<Result<_, _>>()?,
    };
    Ok(lines
        .into_iter()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .collect())
}

/// Ctrl+C sets `STOP`. A handler that cannot be installed is logged; the batch
/// still runs, it just cannot stop early.
fn install_stop_handler() -> bool {
    match ctrlc::set_handler(|| STOP.store(true, Ordering::Relaxed)) {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "cannot install Ctrl+C handler");
            false
        }
    }
}

/// Score URLs on a blocking pool, at most `max_concurrency` at once, keeping input order.
/// Ctrl+C stops scheduling further URLs; those already running complete.
fn score_concurrently(
    adapter: &PredictionAdapter,
    urls: Vec<String>,
    max_concurrency: usize,
) -> Result<Vec<(String, Result<Prediction, BundleContractError>)>, BoxError> {
    let runtime = tokio::runtime::Builder::new_multi_thread().build()?;
    runtime.block_on(async {
        let semaphore = Arc::new(Semaphore::new(max_concurrency.max(1)));
        let mut handles = Vec::with_capacity(urls.len());
        for url in urls {
            if STOP.load(Ordering::Relaxed) {
                warn!(scheduled = handles.len(), "interrupted; remaining urls skipped");
                break;
            }
            let permit = semaphore.clone().acquire_owned().await?;
            let adapter = adapter.clone();
            handles.push(tokio::task::spawn_blocking(move || {
                let _permit = permit;
                let result = adapter.predict(&url);
                (url, result)
            }));
        }
        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            results.push(handle.await?);
        }
        Ok::<_, BoxError>(results)
    })
}

fn main() -> Result<(), BoxError> {
    let args = Args::parse();
    let config_path = args
        .config
        .clone()
        .or_else(|| std::env::var("URLGUARD_CONFIG_PATH").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("config.json"));
    let config = GuardConfig::load(&config_path);

    StructuredLogger::init(&config.log);

    let extractor = FeatureExtractor::new(config.features);
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match args.command {
        Command::Score {
            url,
            bundle,
            no_history,
            json,
        } => {
            let adapter = load_adapter(&config, bundle.as_deref(), extractor)?;
            let prediction = adapter.predict(&url)?;
            let store = open_recording_store(&config, no_history);
            let id = record(store.as_ref(), &prediction);
            if json {
                serde_json::to_writer_pretty(&mut out, &prediction)?;
                writeln!(out)?;
            } else {
                print_prediction(&mut out, &prediction, id)?;
            }
        }
        Command::Batch {
            file,
            bundle,
            no_history,
            json,
        } => {
            let adapter = load_adapter(&config, bundle.as_deref(), extractor)?;
            let urls = read_urls(file.as_deref())?;
            info!(count = urls.len(), "batch scoring (Ctrl+C to stop)");
            install_stop_handler();

            let store = open_recording_store(&config, no_history);
            let results = score_concurrently(&adapter, urls, config.batch.max_concurrency)?;
            let mut failed = 0usize;
            for (url, result) in &results {
                match result {
                    Ok(p) => {
                        record(store.as_ref(), p);
                        if json {
                            StructuredLogger::emit_json(p, &mut out)?;
                        } else {
                            writeln!(out, "{:<10}{:>8}  {}", p.verdict.as_str(), p.confidence, url)?;
                        }
                    }
                    Err(e) => {
                        failed += 1;
                        warn!(error = %e, "scoring failed");
                        if !json {
                            writeln!(out, "{:<10}{:>8}  {}", "error", "", url)?;
                        }
                    }
                }
            }
            info!(scored = results.len() - failed, failed, "batch complete");
        }
        Command::History { page, json } => {
            let store = open_store(&config)?;
            let page = store.page(page, config.history.page_size)?;
            if json {
                serde_json::to_writer_pretty(&mut out, &page)?;
                writeln!(out)?;
            } else {
                for r in &page.items {
                    writeln!(
                        out,
                        "#{:<6}{}  {:<10}{:>8}  {}",
                        r.id,
                        r.created_at.format("%Y-%m-%d %H:%M:%S"),
                        urlguard::Verdict::from_label(r.prediction).as_str(),
                        r.confidence,
                        r.url
                    )?;
                }
                writeln!(
                    out,
                    "page {}/{} ({} records){}{}",
                    page.page,
                    page.pages.max(1),
                    page.total,
                    if page.has_prev() { "  [prev]" } else { "" },
                    if page.has_next() { "  [next]" } else { "" },
                )?;
            }
        }
        Command::Show { id } => {
            let store = open_store(&config)?;
            match store.get(id)? {
                Some(record) => print_record(&mut out, &record)?,
                None => return Err(format!("no history record #{}", id).into()),
            }
        }
        Command::Features { url, json } => {
            let features = extractor.extract(&url);
            if json {
                serde_json::to_writer_pretty(&mut out, &features)?;
                writeln!(out)?;
            } else {
                print_features(&mut out, &features)?;
            }
        }
    }

    Ok(())
}
