use anyhow::{Context as _, Result};
use clap::{Args, Parser, Subcommand};
use dataset_tool::config::AppSettings;
use dataset_tool::error::DatasetError;
use dataset_tool::pipeline::{PipelineOptions, RunReport, check_options};
use dataset_tool::{frame, io, service};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "dataset-tool",
    version,
    about = "Clean and reshape CSV and spreadsheet datasets"
)]
pub struct Cli {
    #[command(flatten)]
    pub decode: DecodeArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Overrides for the decoding settings in `config.json`
#[derive(Args)]
pub struct DecodeArgs {
    /// Single-byte encoding tried when a CSV file is not UTF-8 (e.g. windows-1252, iso-8859-15)
    #[arg(long, global = true)]
    pub fallback_encoding: Option<String>,

    /// Keep numeric-looking CSV fields as text
    #[arg(long, global = true)]
    pub no_infer_numbers: bool,
}

impl DecodeArgs {
    pub fn apply(&self, settings: &mut AppSettings) {
        if let Some(label) = &self.fallback_encoding {
            settings.fallback_encoding.clone_from(label);
        }
        if self.no_infer_numbers {
            settings.infer_numbers = false;
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the cleaning pipeline on a file and write the converted copy
    Process {
        /// Input file (.csv, .xlsx, .xls)
        #[arg(short, long)]
        file: PathBuf,

        /// Path to a JSON pipeline options file
        #[arg(long, conflicts_with = "options_json")]
        options: Option<PathBuf>,

        /// Pipeline options as inline JSON
        #[arg(long)]
        options_json: Option<String>,

        /// Output file path. Defaults to `converted_<name>` next to the input.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the run report as JSON to this path
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Decode a file and validate pipeline options against it without transforming
    Check {
        /// Input file (.csv, .xlsx, .xls)
        #[arg(short, long)]
        file: PathBuf,

        /// Path to a JSON pipeline options file
        #[arg(long)]
        options: PathBuf,
    },
}

pub fn run_command(command: Commands, settings: &AppSettings) -> Result<()> {
    match command {
        Commands::Process {
            file,
            options,
            options_json,
            output,
            report,
        } => {
            let options = load_options(options.as_deref(), options_json.as_deref())?;
            handle_process(&file, &options, output, report.as_deref(), settings)
        }
        Commands::Check { file, options } => {
            let options = load_options(Some(options.as_path()), None)?;
            handle_check(&file, &options, settings)
        }
    }
}

fn load_options(path: Option<&Path>, inline: Option<&str>) -> Result<PipelineOptions> {
    match (path, inline) {
        (Some(path), _) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read options file: {}", path.display()))?;
            PipelineOptions::from_json(&content)
                .with_context(|| format!("Invalid options file: {}", path.display()))
        }
        (None, Some(json)) => PipelineOptions::from_json(json).context("Invalid inline options"),
        (None, None) => Ok(PipelineOptions::default()),
    }
}

fn file_name(path: &Path) -> Result<&str> {
    path.file_name()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid file name: {}", path.display()))
}

fn handle_process(
    file: &Path,
    options: &PipelineOptions,
    output: Option<PathBuf>,
    report_path: Option<&Path>,
    settings: &AppSettings,
) -> Result<()> {
    let name = file_name(file)?;
    let bytes =
        std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;

    let processed = service::process_upload(&bytes, name, options, settings)?;

    let output_path = output.unwrap_or_else(|| file.with_file_name(&processed.filename));
    std::fs::write(&output_path, &processed.bytes)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;
    println!("Wrote {}", output_path.display());

    print_report(&processed.report);
    if let Some(path) = report_path {
        let json = processed
            .report
            .to_json()
            .context("Failed to serialize run report")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        println!("Report written to {}", path.display());
    }
    Ok(())
}

fn handle_check(file: &Path, options: &PipelineOptions, settings: &AppSettings) -> Result<()> {
    let name = file_name(file)?;
    let bytes =
        std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let table = service::decode_upload(&bytes, name, settings)?;

    println!(
        "{}: {} rows, {} columns",
        name,
        table.height(),
        table.width()
    );
    let columns = frame::column_names(&table);
    println!("Columns: {}", columns.join(", "));
    check_options(options, &columns)?;

    let stages: Vec<String> = options
        .enabled_stages()
        .iter()
        .map(ToString::to_string)
        .collect();
    println!(
        "Options OK. Stages: {}. Output: {}",
        if stages.is_empty() {
            "none".to_owned()
        } else {
            stages.join(" -> ")
        },
        io::output_filename(name, &settings.output_prefix)?
    );
    Ok(())
}

fn print_report(report: &RunReport) {
    println!("{}", report.summary());
    for (stage, anomaly) in report.anomalies() {
        println!("  [{stage}] {anomaly}");
    }
}

/// Process exit code for a failed command: 2 for bad input or options, 1 otherwise.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    let client_error = err
        .chain()
        .filter_map(|cause| cause.downcast_ref::<DatasetError>())
        .any(DatasetError::is_client_error);
    if client_error { 2 } else { 1 }
}
