use absa_analysis::{
    example_complaint, mentions_from_records, read_text_column, write_priority_csv, AbsaProfile,
    ActionCenter, AnalysisConfig, Analyzer, AspectThreshold, BatchCsv, BatchRecord,
    CorpusOverview, OwnerMap, PriorityScorer,
};
use absa_inference::{AbsaService, INFERENCE_MODE_ENV, MODEL_DIR_ENV};
use anyhow::{bail, Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::env;
use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod flags;
mod report;

use flags::{ModeFlag, ReportFormat};

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

#[derive(Parser)]
#[command(name = "absa")]
#[command(about = "Aspect-based sentiment analysis for customer reviews", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Model root with aspect/ and sentiment/ (overrides ABSA_MODEL_DIR)
    #[arg(long, global = true)]
    model_dir: Option<PathBuf>,

    /// Inference backend (overrides ABSA_INFERENCE_MODE)
    #[arg(long, global = true, value_enum)]
    mode: Option<ModeFlag>,

    /// Profile file (JSON or TOML) with analysis and action center settings
    #[arg(long, global = true)]
    profile: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a single text and print the result as JSON
    Analyze(AnalyzeArgs),

    /// Analyze every row of a CSV file and write the batch report
    Batch(BatchArgs),

    /// Summarize a batch report: sentiment split and aspect distribution
    Overview(OverviewArgs),

    /// Rank aspects to fix and to promote from a batch report
    Actions(ActionsArgs),

    /// Check that the inference provider can be constructed
    Doctor,
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Text to analyze
    text: String,

    /// Aspect detection threshold in [0.1, 0.9]
    #[arg(long)]
    threshold: Option<f32>,
}

#[derive(Args)]
struct BatchArgs {
    /// Input CSV file
    #[arg(long)]
    input: PathBuf,

    /// Column holding the texts
    #[arg(long)]
    text_column: Option<String>,

    /// Output CSV (stdout when omitted)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Aspect detection threshold in [0.1, 0.9]
    #[arg(long)]
    threshold: Option<f32>,

    /// Texts analyzed concurrently
    #[arg(long)]
    workers: Option<usize>,

    /// Drop rows whose analysis fails instead of aborting
    #[arg(long)]
    skip_failed: bool,
}

#[derive(Args)]
struct OverviewArgs {
    /// Batch report CSV produced by `absa batch`
    #[arg(long)]
    input: PathBuf,

    /// Column holding the texts
    #[arg(long)]
    text_column: Option<String>,
}

#[derive(Args)]
struct ActionsArgs {
    /// Batch report CSV produced by `absa batch`
    #[arg(long)]
    input: PathBuf,

    /// Column holding the texts
    #[arg(long)]
    text_column: Option<String>,

    /// Minimum mentions for an aspect to be ranked (default: derived from the corpus)
    #[arg(long)]
    min_mentions: Option<usize>,

    /// Aspects per ranking (default: derived from the corpus)
    #[arg(long)]
    top_n: Option<usize>,

    /// Write per-aspect statistics to this CSV
    #[arg(long)]
    summary_csv: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = ReportFormat::Json)]
    format: ReportFormat,
}

pub async fn main_entry() -> Result<()> {
    let cli = Cli::parse();

    if let Some(dir) = &cli.model_dir {
        env::set_var(MODEL_DIR_ENV, dir);
    }
    if let Some(mode) = cli.mode {
        env::set_var(INFERENCE_MODE_ENV, mode.as_domain().as_str());
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    if !cli.verbose {
        builder.filter_module("ort", log::LevelFilter::Off);
    }
    builder.target(env_logger::Target::Stderr).init();

    let profile = load_profile(cli.profile.as_deref())?;

    match cli.command {
        Commands::Analyze(args) => run_analyze(args, &profile).await?,
        Commands::Batch(args) => run_batch(args, &profile).await?,
        Commands::Overview(args) => run_overview(args, &profile)?,
        Commands::Actions(args) => run_actions(args, &profile)?,
        Commands::Doctor => run_doctor()?,
    }

    Ok(())
}

/// Defaults, then environment, then the profile file. Flags are applied per command.
fn load_profile(path: Option<&Path>) -> Result<AbsaProfile> {
    let base = AbsaProfile {
        analysis: AnalysisConfig::from_env().context("Invalid ABSA_ASPECT_THRESHOLD")?,
        ..AbsaProfile::default()
    };
    match path {
        Some(path) => AbsaProfile::load(path, base)
            .with_context(|| format!("Failed to load profile {}", path.display())),
        None => Ok(base),
    }
}

fn analysis_config(
    profile: &AbsaProfile,
    threshold: Option<f32>,
    workers: Option<usize>,
) -> Result<AnalysisConfig> {
    let mut config = profile.analysis;
    if let Some(value) = threshold {
        config = config.with_threshold(AspectThreshold::new(value)?);
    }
    if let Some(workers) = workers {
        if workers == 0 {
            bail!("--workers must be > 0");
        }
        config = config.with_workers(workers);
    }
    Ok(config)
}

fn build_analyzer(config: AnalysisConfig) -> Result<Analyzer<AbsaService>> {
    let service = AbsaService::from_env().context("Failed to initialize inference provider")?;
    Ok(Analyzer::new(Arc::new(service), config))
}

async fn run_analyze(args: AnalyzeArgs, profile: &AbsaProfile) -> Result<()> {
    let config = analysis_config(profile, args.threshold, None)?;
    let analyzer = build_analyzer(config)?;
    let result = analyzer.analyze_text(&args.text).await?;
    print_stdout(&serde_json::to_string_pretty(&result)?)
}

async fn run_batch(args: BatchArgs, profile: &AbsaProfile) -> Result<()> {
    let config = analysis_config(profile, args.threshold, args.workers)?;
    let text_column = args
        .text_column
        .unwrap_or_else(|| profile.text_column.clone());

    let input = File::open(&args.input)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;
    let rows = read_text_column(BufReader::new(input), &text_column)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let total = rows.len();

    let analyzer = build_analyzer(config)?;
    let mut records = Vec::with_capacity(total);
    for (idx, result) in analyzer.analyze_batch(rows).await.into_iter().enumerate() {
        match result {
            Ok(result) => records.push(BatchRecord::from_result(&result)),
            Err(err) if args.skip_failed => {
                log::warn!("Skipping row {}: {err}", idx + 1);
            }
            Err(err) => {
                return Err(err).with_context(|| format!("Analysis failed at row {}", idx + 1));
            }
        }
    }

    let codec = BatchCsv::new(text_column);
    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            codec.write(BufWriter::new(file), &records)?;
        }
        None => {
            let mut buf = Vec::new();
            codec.write(&mut buf, &records)?;
            print_stdout(String::from_utf8_lossy(&buf).trim_end())?;
        }
    }

    log::info!(
        "Batch complete: {} of {total} rows written (threshold {:.2}, {} worker(s))",
        records.len(),
        config.aspect_threshold.value(),
        config.workers
    );
    Ok(())
}

fn read_report(input: &Path, text_column: &str) -> Result<Vec<BatchRecord>> {
    let file =
        File::open(input).with_context(|| format!("Failed to open {}", input.display()))?;
    BatchCsv::new(text_column)
        .read(BufReader::new(file))
        .with_context(|| format!("Failed to read batch report {}", input.display()))
}

fn run_overview(args: OverviewArgs, profile: &AbsaProfile) -> Result<()> {
    let text_column = args.text_column.as_deref().unwrap_or(&profile.text_column);
    let records = read_report(&args.input, text_column)?;
    let overview = CorpusOverview::from_records(&records);
    print_stdout(&serde_json::to_string_pretty(&overview)?)
}

fn run_actions(args: ActionsArgs, profile: &AbsaProfile) -> Result<()> {
    let text_column = args.text_column.as_deref().unwrap_or(&profile.text_column);
    let records = read_report(&args.input, text_column)?;

    let mut config = profile.actions;
    if let Some(min_mentions) = args.min_mentions {
        if min_mentions == 0 {
            bail!("--min-mentions must be > 0");
        }
        config.min_mentions = Some(min_mentions);
    }
    if let Some(top_n) = args.top_n {
        if top_n == 0 {
            bail!("--top-n must be > 0");
        }
        config.top_n = Some(top_n);
    }

    let stats = PriorityScorer::compute_statistics_from_mentions(mentions_from_records(&records));
    let owners = OwnerMap::with_overrides(&profile.owners);
    let center = ActionCenter::build(&stats, config, &owners)
        .with_example_complaint(example_complaint(&records));

    if let Some(path) = &args.summary_csv {
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        write_priority_csv(BufWriter::new(file), &center.summary(&stats))?;
        log::info!("Priority summary written to {}", path.display());
    }

    match args.format {
        ReportFormat::Json => print_stdout(&serde_json::to_string_pretty(&center)?),
        ReportFormat::Markdown => {
            print_stdout(report::render_action_report(&args.input, &center).trim_end())
        }
    }
}

#[derive(Serialize)]
struct DoctorFailure {
    status: &'static str,
    message: String,
}

fn run_doctor() -> Result<()> {
    match AbsaService::from_env() {
        Ok(service) => print_stdout(&serde_json::to_string_pretty(&service.describe())?),
        Err(err) => {
            let failure = DoctorFailure {
                status: "error",
                message: err.to_string(),
            };
            print_stdout(&serde_json::to_string_pretty(&failure)?)?;
            std::process::exit(1);
        }
    }
}
