use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use kira_geo_pipeline::config::{ConfigLoader, ConfigOverrides, ResolvedConfig};
use kira_geo_pipeline::error::KiraError;
use kira_geo_pipeline::geo::{GeoClient, GeoHttpClient};
use kira_geo_pipeline::output::{JsonOutput, OutputMode, TracingSink};
use kira_geo_pipeline::pipeline::{Pipeline, PipelineReport, ProgressSink, StatusReport};
use kira_geo_pipeline::process::{SampleReport, process_file};
use kira_geo_pipeline::stage::Stage;

#[derive(Parser)]
#[command(name = "kira-gp")]
#[command(about = "Resumable GEO raw-archive pipeline: download, unpack, split into TSV tables")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<String>,

    #[arg(long, global = true)]
    data_dir: Option<String>,

    #[arg(long, global = true)]
    dataset: Option<String>,

    #[arg(long, global = true)]
    series: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Run every incomplete stage up to the target stage")]
    Run(RunArgs),
    #[command(about = "Show the completion state of every stage")]
    Status(StatusArgs),
    #[command(about = "Split a single raw sample file into TSV tables")]
    Parse(ParseArgs),
}

#[derive(Args)]
struct RunArgs {
    #[arg(long, value_enum, default_value_t = Stage::Cleanup)]
    until: Stage,

    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct StatusArgs {
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ParseArgs {
    file: Utf8PathBuf,

    #[arg(long)]
    out: Utf8PathBuf,

    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(kira) = report.downcast_ref::<KiraError>() {
            return ExitCode::from(map_exit_code(kira));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &KiraError) -> u8 {
    match error {
        KiraError::ConfigRead(_)
        | KiraError::ConfigParse(_)
        | KiraError::InvalidExpressionAccession(_)
        | KiraError::InvalidSeriesPrefix(_) => 2,
        KiraError::GeoHttp(_) | KiraError::GeoStatus { .. } | KiraError::Archive(_) => 3,
        KiraError::SourceCorruption { .. } | KiraError::SourceEncoding { .. } => 4,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let overrides = ConfigOverrides {
        data_dir: cli.data_dir,
        dataset: cli.dataset,
        series: cli.series,
    };

    match cli.command {
        Command::Run(args) => {
            let config = ConfigLoader::resolve(cli.config.as_deref(), overrides)?;
            let geo = GeoHttpClient::new()?;
            run_pipeline(&config, geo, args)
        }
        Command::Status(args) => {
            let config = ConfigLoader::resolve(cli.config.as_deref(), overrides)?;
            run_status(&config, args)
        }
        Command::Parse(args) => {
            let config = ConfigLoader::resolve(cli.config.as_deref(), overrides)?;
            run_parse(&config, args)
        }
    }
}

fn run_pipeline<G: GeoClient>(
    config: &ResolvedConfig,
    geo: G,
    args: RunArgs,
) -> miette::Result<()> {
    let pipeline = Pipeline::from_config(config, geo);
    let mode = output_mode(args.json);
    let sink: &dyn ProgressSink = match mode {
        OutputMode::Json => &JsonOutput,
        OutputMode::Human => &TracingSink,
    };
    let report = pipeline.run(args.until, sink)?;
    match mode {
        OutputMode::Json => JsonOutput::print_run(&report).into_diagnostic(),
        OutputMode::Human => {
            print_run_summary(&report);
            Ok(())
        }
    }
}

fn run_status(config: &ResolvedConfig, args: StatusArgs) -> miette::Result<()> {
    let pipeline = Pipeline::from_config(config, NopGeo);
    let status = pipeline.status()?;
    match output_mode(args.json) {
        OutputMode::Json => JsonOutput::print_status(&status).into_diagnostic(),
        OutputMode::Human => {
            print_status_summary(&status);
            Ok(())
        }
    }
}

fn run_parse(config: &ResolvedConfig, args: ParseArgs) -> miette::Result<()> {
    let tables = process_file(
        args.file.as_std_path(),
        &args.out,
        &config.probe_columns_to_drop,
    )?;
    let report = SampleReport {
        sample: args.file.file_stem().unwrap_or(args.file.as_str()).to_string(),
        source: args.file.to_string(),
        output_dir: args.out.to_string(),
        tables,
    };
    match output_mode(args.json) {
        OutputMode::Json => JsonOutput::print_sample(&report).into_diagnostic(),
        OutputMode::Human => {
            println!("{} -> {}", report.source, report.output_dir);
            for table in &report.tables {
                println!("  {table}.tsv");
            }
            Ok(())
        }
    }
}

fn output_mode(json: bool) -> OutputMode {
    if json {
        OutputMode::Json
    } else {
        OutputMode::Human
    }
}

fn print_run_summary(report: &PipelineReport) {
    let green = "\x1b[32m";
    let cyan = "\x1b[36m";
    let reset = "\x1b[0m";

    println!(
        "{cyan}KIRA-GP summary for {} (target: {}){reset}",
        report.dataset, report.target
    );
    for outcome in &report.stages {
        let detail = outcome.detail.as_deref().unwrap_or("already complete");
        println!(
            "{green}{:<8} {:<7} {detail}{reset}",
            outcome.stage.name(),
            format!("{:?}", outcome.action).to_lowercase()
        );
    }
}

fn print_status_summary(status: &StatusReport) {
    println!("{}", status.dataset);
    for state in &status.stages {
        let mark = if state.complete { "done" } else { "pending" };
        println!("  {:<8} {:<7} {}", state.stage.name(), mark, state.output);
    }
}

struct NopGeo;

impl GeoClient for NopGeo {
    fn download_url(&self, _url: &str, _destination: &std::path::Path) -> Result<(), KiraError> {
        Err(KiraError::GeoHttp("network disabled for status".to_string()))
    }
}
