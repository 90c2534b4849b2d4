//! CLI binary for invoice2ledger.
//!
//! A thin shim over the library crate: validates the upload at the boundary
//! (media type, readable file), maps flags to `PipelineConfig`, runs the
//! pipeline against an in-process store, and prints the resulting record as
//! JSON.

use anyhow::{Context, Result};
use clap::Parser;
use invoice2ledger::{
    attach_impact, process_and_store, reports, DocumentStore, ImpactMetrics, MediaType,
    MemoryStore, PipelineConfig,
};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Process an invoice (record JSON on stdout)
  inv2ledger invoice.pdf

  # Photographed receipt, write the record to a file
  inv2ledger receipt.jpg -o record.json

  # Use a specific model
  inv2ledger --model gpt-4o --provider openai invoice.pdf

  # Attach sustainability metrics in the same run
  inv2ledger invoice.pdf --co2-emissions 1.2 --labor-score 8

  # Declared media type instead of extension sniffing
  inv2ledger --media-type image/png scan.bin

SUPPORTED INPUT:
  application/pdf   multi-page PDFs (only the first page is read for
                    extraction; the invoice amount must be on page one)
  image/jpeg        photographed invoices
  image/png         screenshots and scans

EXTRACTION FALLBACK:
  When the model call fails (no key, timeout, unparsable response) the run
  still succeeds: the record carries a fixed placeholder (supplier
  "Auto-detected Supplier", amount 100.00) that a bookkeeper can correct.

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
"#;

/// Turn a scanned invoice into a balanced double-entry ledger record.
#[derive(Parser, Debug)]
#[command(
    name = "inv2ledger",
    version,
    about = "Turn scanned invoices into balanced double-entry ledger records using Vision LLMs",
    arg_required_else_help = true,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Invoice file: PDF, JPEG, or PNG.
    input: PathBuf,

    /// Write the record JSON to this file instead of stdout.
    #[arg(short, long, env = "INV2LEDGER_OUTPUT")]
    output: Option<PathBuf>,

    /// Declared media type (application/pdf, image/jpeg, image/png).
    /// Guessed from the file extension when omitted.
    #[arg(long, env = "INV2LEDGER_MEDIA_TYPE")]
    media_type: Option<String>,

    /// Vision model ID (e.g. gpt-4o).
    #[arg(long, env = "INV2LEDGER_MODEL")]
    model: Option<String>,

    /// Model provider: openai, anthropic, gemini, ollama.
    /// Auto-detected from API key env vars if not set.
    #[arg(long, env = "INV2LEDGER_PROVIDER")]
    provider: Option<String>,

    /// Model sampling temperature (0.0–2.0).
    #[arg(long, env = "INV2LEDGER_TEMPERATURE", default_value_t = 0.1)]
    temperature: f32,

    /// Max model output tokens.
    #[arg(long, env = "INV2LEDGER_MAX_TOKENS", default_value_t = 500)]
    max_tokens: usize,

    /// Model call timeout in seconds (single attempt, no retry).
    #[arg(long, env = "INV2LEDGER_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Attach impact metrics: water usage in liters.
    #[arg(long)]
    water_usage: Option<f64>,

    /// Attach impact metrics: CO2 emissions in tons.
    #[arg(long)]
    co2_emissions: Option<f64>,

    /// Attach impact metrics: labor score, 1-10.
    #[arg(long)]
    labor_score: Option<u8>,

    /// Attach impact metrics: recycling rate percentage.
    #[arg(long)]
    recycling_rate: Option<f64>,

    /// Also print the dashboard summary for the run.
    #[arg(long)]
    summary: bool,

    /// Compact JSON instead of pretty-printed.
    #[arg(long)]
    compact: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "INV2LEDGER_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the record itself.
    #[arg(short, long, env = "INV2LEDGER_QUIET")]
    quiet: bool,
}

impl Cli {
    fn impact_metrics(&self) -> Option<ImpactMetrics> {
        if self.water_usage.is_none()
            && self.co2_emissions.is_none()
            && self.labor_score.is_none()
            && self.recycling_rate.is_none()
        {
            return None;
        }
        let defaults = ImpactMetrics::default();
        Some(ImpactMetrics {
            water_usage: self.water_usage.unwrap_or(defaults.water_usage),
            co2_emissions: self.co2_emissions.unwrap_or(defaults.co2_emissions),
            labor_score: self.labor_score.unwrap_or(defaults.labor_score),
            recycling_rate: self.recycling_rate.unwrap_or(defaults.recycling_rate),
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Boundary validation: readable file, supported media type ─────────
    let bytes = std::fs::read(&cli.input)
        .with_context(|| format!("Failed to read {}", cli.input.display()))?;
    if bytes.is_empty() {
        anyhow::bail!("{} is empty", cli.input.display());
    }

    let filename = cli
        .input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| cli.input.display().to_string());

    let media_type = match cli.media_type.as_deref() {
        Some(mime) => MediaType::from_mime(mime)?,
        None => MediaType::from_filename(&filename)?,
    };

    // ── Build config ─────────────────────────────────────────────────────
    let mut config = PipelineConfig::builder()
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .api_timeout_secs(cli.api_timeout)
        .build()
        .context("Invalid configuration")?;
    config.model = cli.model.clone();
    config.provider_name = cli.provider.clone();

    // ── Run the pipeline ─────────────────────────────────────────────────
    let store = MemoryStore::new();
    let mut record = process_and_store(&bytes, media_type, &filename, &config, &store)
        .await
        .context("Invoice processing failed")?;

    if let Some(metrics) = cli.impact_metrics() {
        attach_impact(&store, record.id, metrics)
            .await
            .context("Failed to attach impact metrics")?;
        record = store
            .get(record.id)
            .await?
            .context("record vanished from store")?;
    }

    // ── Emit the record ──────────────────────────────────────────────────
    let json = if cli.compact {
        serde_json::to_string(&record)
    } else {
        serde_json::to_string_pretty(&record)
    }
    .context("Failed to serialise record")?;

    match cli.output {
        Some(ref path) => {
            std::fs::write(path, &json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            if !cli.quiet {
                eprintln!("Record written to {}", path.display());
            }
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle.write_all(json.as_bytes())?;
            handle.write_all(b"\n")?;
        }
    }

    if cli.summary {
        let summary = reports::dashboard_summary(&store)
            .await
            .context("Failed to compute summary")?;
        eprintln!("{}", serde_json::to_string_pretty(&summary)?);
    }

    if !cli.quiet {
        let debit = &record.ledger_entries[0];
        eprintln!(
            "{}  {} {} → {}  (hash {})",
            record.id,
            debit.amount,
            record.data.currency,
            debit.account,
            &record.verified_transaction.hash[..12],
        );
    }

    Ok(())
}
