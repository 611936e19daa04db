//! phishscan entrypoint: extracts feature records for a list of URLs and writes them as
//! CSV or JSON lines; with `--score`, runs the classifier and writes verdicts instead.

use clap::{Parser, ValueEnum};
use futures::StreamExt;
use phishscan::{
    config::ExtractorConfig,
    export::RecordSink,
    features::FeatureExtractor,
    logging::StructuredLogger,
    model::OnnxClassifier,
    risk::RiskEngine,
};
use std::io::{self, BufWriter, Read, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

static STOP: AtomicBool = AtomicBool::new(false);

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Csv,
    Jsonl,
}

#[derive(Debug, Parser)]
#[command(name = "phishscan", version, about = "Extract phishing-detection features from URLs")]
struct Cli {
    /// URLs to analyze
    urls: Vec<String>,

    /// File with one URL per line (`-` for stdin)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value_t = Format::Csv)]
    format: Format,

    /// Score each record with the configured model and write verdicts
    #[arg(long)]
    score: bool,

    /// JSON config file (default: $PHISHSCAN_CONFIG, then phishscan.json)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn read_urls(cli: &Cli) -> io::Result<Vec<String>> {
    let mut urls = cli.urls.clone();
    if let Some(path) = &cli.input {
        let text = if path.as_os_str() == "-" {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        } else {
            std::fs::read_to_string(path)?
        };
        urls.extend(
            text.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#'))
                .map(String::from),
        );
    }
    Ok(urls)
}

fn open_output(cli: &Cli) -> io::Result<Box<dyn Write>> {
    Ok(match &cli.output {
        Some(path) => Box::new(BufWriter::new(std::fs::File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .or_else(|| std::env::var("PHISHSCAN_CONFIG").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("phishscan.json"));
    let config = ExtractorConfig::load(&config_path);

    StructuredLogger::init(config.log.json, &config.log.level);

    let urls = read_urls(&cli)?;
    if urls.is_empty() {
        return Err("no URLs given (pass them as arguments or with --input)".into());
    }
    info!(count = urls.len(), config = %config_path.display(), "phishscan starting");

    let scoring = if cli.score {
        let classifier = OnnxClassifier::load(&config.model.path, config.model.feature_dim)?;
        Some((classifier, RiskEngine::new(config.verdict.clone())))
    } else {
        None
    };
    let extractor = FeatureExtractor::new(config)?;

    let _ = ctrlc::set_handler(|| {
        STOP.store(true, Ordering::Relaxed);
    });

    let out = open_output(&cli)?;
    let mut sink = match cli.format {
        Format::Csv => RecordSink::csv(out),
        Format::Jsonl => RecordSink::jsonl(out),
    };

    let pending = urls.iter().take_while(|_| !STOP.load(Ordering::Relaxed));
    let mut records = Box::pin(extractor.extract_stream(pending));
    while let Some(record) = records.next().await {
        match &scoring {
            Some((classifier, engine)) => {
                sink.write(&engine.score(classifier, &record))?;
            }
            None => sink.write(&record)?,
        }
    }

    let written = sink.finish()?;
    if STOP.load(Ordering::Relaxed) {
        info!(written, total = urls.len(), "interrupted; wrote finished records");
    } else {
        info!(written, "phishscan complete");
    }
    Ok(())
}
