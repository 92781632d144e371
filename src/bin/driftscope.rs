use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use driftscope::document::Document;
use driftscope::masking::PatternExtractor;
use driftscope::parser::{self, InputFormat};
use driftscope::records::{self, RecordFields, TextRecord};
use driftscope::schema::FieldTypeHints;
use driftscope::{engine, filter, sequence, AnalysisOpts};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Once;
use tracing_subscriber::EnvFilter;

fn init_parallelism() {
    static START: Once = Once::new();
    START.call_once(|| {
        let n = num_cpus::get();
        let _ = rayon::ThreadPoolBuilder::new().num_threads(n).build_global();
    });
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Parser, Debug)]
#[command(name = "driftscope", version, about = "Distribution drift and log pattern analysis")]
struct Cli {
    /// JSON config file with analysis options; flags below override it
    #[arg(long = "config", global = true)]
    config: Option<PathBuf>,
    #[arg(long = "bucket-threshold", global = true)]
    bucket_threshold: Option<usize>,
    #[arg(long = "bucket-count", global = true)]
    bucket_count: Option<usize>,
    #[arg(long = "top", global = true)]
    top_changes: Option<usize>,
    #[arg(long = "samples", global = true)]
    sample_cap: Option<usize>,
    /// Print compact JSON even on a terminal
    #[arg(long = "compact", global = true, default_value_t = false)]
    compact: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Per-field value distributions (single population or baseline vs. selection)
    Distribution(DistributionArgs),
    /// Pattern insights for one window, or pattern frequency diff between two
    Patterns(PatternArgs),
    /// BASE / EXCEPTIONAL classification of per-trace pattern sequences
    Sequences(SequenceArgs),
}

#[derive(Args, Debug)]
struct DistributionArgs {
    /// Selection documents: JSONL, JSON array, search response or tabular response
    #[arg(long = "selection")]
    selection: PathBuf,
    #[arg(long = "baseline")]
    baseline: Option<PathBuf>,
    /// JSON object of field -> declared type
    #[arg(long = "hints")]
    hints: Option<PathBuf>,
    /// Filter clauses (JSON) carving the selection out of --selection; the rest becomes the baseline
    #[arg(long = "filter", conflicts_with = "baseline")]
    filter: Option<String>,
    #[arg(long = "exclude")]
    exclude: Vec<String>,
}

#[derive(Args, Debug)]
struct RecordArgs {
    #[arg(long = "text-field", default_value = "message")]
    text_field: String,
    #[arg(long = "time-field", default_value = "@timestamp")]
    time_field: String,
    /// Field holding a pre-computed pattern
    #[arg(long = "pattern-field")]
    pattern_field: Option<String>,
    /// Regex of substrings to mask; `digits` masks digit runs. Default strips all letters and digits.
    #[arg(long = "mask")]
    mask: Option<String>,
}

#[derive(Args, Debug)]
struct PatternArgs {
    #[arg(long = "selection")]
    selection: PathBuf,
    /// Base window records; without it, single-window insights are printed
    #[arg(long = "base")]
    base: Option<PathBuf>,
    #[command(flatten)]
    records: RecordArgs,
}

#[derive(Args, Debug)]
struct SequenceArgs {
    #[arg(long = "base")]
    base: PathBuf,
    #[arg(long = "selection")]
    selection: PathBuf,
    #[arg(long = "trace-field", default_value = "traceId")]
    trace_field: String,
    #[command(flatten)]
    records: RecordArgs,
}

struct Batch {
    docs: Vec<Document>,
    hints: Option<FieldTypeHints>,
}

fn read_batch(path: &Path) -> anyhow::Result<Batch> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let batch = match parser::detect_format(&text) {
        InputFormat::SearchResponse => {
            let v: serde_json::Value = serde_json::from_str(&text)?;
            Batch { docs: parser::documents_from_search_response(&v)?, hints: None }
        }
        InputFormat::TabularResponse => {
            let v: serde_json::Value = serde_json::from_str(&text)?;
            let (docs, hints) = parser::documents_from_tabular_response(&v)?;
            Batch { docs, hints: Some(hints) }
        }
        InputFormat::JsonArray => {
            let v: serde_json::Value = serde_json::from_str(&text)?;
            Batch { docs: parser::documents_from_array(&v)?, hints: None }
        }
        InputFormat::JsonLines => {
            let lines: Vec<(usize, &str)> = text
                .lines()
                .enumerate()
                .filter(|(_, l)| !l.trim().is_empty())
                .collect();
            let docs = lines
                .par_iter()
                .map(|(i, l)| {
                    parser::parse_document(l)
                        .with_context(|| format!("{}:{}", path.display(), i + 1))
                })
                .collect::<anyhow::Result<Vec<_>>>()?;
            Batch { docs, hints: None }
        }
    };
    tracing::debug!(path = %path.display(), documents = batch.docs.len(), "batch loaded");
    Ok(batch)
}

fn read_hints(path: &Path) -> anyhow::Result<FieldTypeHints> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing hints {}", path.display()))
}

fn build_opts(cli: &Cli) -> anyhow::Result<AnalysisOpts> {
    let mut opts = match &cli.config {
        Some(p) => AnalysisOpts::load(p)?,
        None => AnalysisOpts::default(),
    };
    if let Some(v) = cli.bucket_threshold { opts.bucket_threshold = v; }
    if let Some(v) = cli.bucket_count { opts.bucket_count = v; }
    if let Some(v) = cli.top_changes { opts.top_changes = v; }
    if let Some(v) = cli.sample_cap { opts.sample_cap = v; }
    if let Command::Distribution(args) = &cli.command {
        opts.exclude_fields.extend(args.exclude.iter().cloned());
    }
    opts.validate()?;
    Ok(opts)
}

fn extractor_for(mask: Option<&str>) -> anyhow::Result<PatternExtractor> {
    Ok(match mask {
        Some("digits") => PatternExtractor::digits(),
        other => PatternExtractor::new(other)?,
    })
}

fn load_records(path: &Path, args: &RecordArgs, trace_field: Option<&str>) -> anyhow::Result<Vec<TextRecord>> {
    let batch = read_batch(path)?;
    let mut fields = RecordFields::new(&args.text_field, &args.time_field);
    if let Some(t) = trace_field { fields = fields.with_trace(t); }
    if let Some(p) = &args.pattern_field { fields = fields.with_pattern(p); }
    let recs = records::text_records_from_documents(&batch.docs, &fields, batch.hints.as_ref())
        .with_context(|| format!("extracting records from {}", path.display()))?;
    Ok(recs)
}

fn emit<T: Serialize>(value: &T, compact: bool) -> anyhow::Result<()> {
    let pretty = !compact && atty::is(atty::Stream::Stdout);
    let out = if pretty { serde_json::to_string_pretty(value)? } else { serde_json::to_string(value)? };
    println!("{out}");
    Ok(())
}

fn main() -> anyhow::Result<()> {
    init_logging();
    init_parallelism();
    let cli = Cli::parse();
    let opts = build_opts(&cli)?;

    match &cli.command {
        Command::Distribution(args) => {
            let selection = read_batch(&args.selection)?;
            let hints = match &args.hints {
                Some(p) => Some(read_hints(p)?),
                None => selection.hints.clone(),
            };
            let report = if let Some(raw) = &args.filter {
                let clauses: serde_json::Value = serde_json::from_str(raw).context("parsing --filter")?;
                let filters = filter::parse_filters(&clauses)?;
                if filters.is_empty() {
                    bail!("--filter must contain at least one clause");
                }
                engine::analyze_with_filters(&selection.docs, &filters, hints.as_ref(), &opts)?
            } else {
                let baseline = args.baseline.as_deref().map(read_batch).transpose()?;
                engine::analyze_distributions(
                    &selection.docs,
                    baseline.as_ref().map(|b| b.docs.as_slice()),
                    hints.as_ref(),
                    &opts,
                )?
            };
            emit(&report, cli.compact)
        }
        Command::Patterns(args) => {
            let extractor = extractor_for(args.records.mask.as_deref())?;
            let selection = load_records(&args.selection, &args.records, None)?;
            let base = args
                .base
                .as_deref()
                .map(|p| load_records(p, &args.records, None))
                .transpose()?;
            let report = engine::analyze_patterns(&selection, base.as_deref(), &extractor, &opts);
            emit(&report, cli.compact)
        }
        Command::Sequences(args) => {
            let extractor = extractor_for(args.records.mask.as_deref())?;
            let base = load_records(&args.base, &args.records, Some(args.trace_field.as_str()))?;
            let selection = load_records(&args.selection, &args.records, Some(args.trace_field.as_str()))?;
            let classification = sequence::classify_sequences(&base, &selection, &extractor);
            emit(&classification, cli.compact)
        }
    }
}
