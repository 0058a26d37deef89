use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Local;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod filter;
mod models;
mod parser;
mod report;
mod roster;
mod sheet;

use crate::config::{FilterConfig, ParserConfig};
use crate::models::{records_to_table, Record};
use crate::roster::{RosterRequest, TemplateKind};

#[derive(Parser)]
#[command(name = "attendance-roster")]
#[command(about = "Attendance validation, filtering and bonus-point roster generation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate raw sheets and split attended rows from the blacklist
    Parse {
        /// Source workbook, CSV file, or a directory of them
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value = "config.json")]
        config: PathBuf,
        #[arg(long, default_value = "./output")]
        output: PathBuf,
    },
    /// Filter parsed rows with a JSON condition file
    Filter {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        config: PathBuf,
        #[arg(long, default_value = "./output")]
        output: PathBuf,
    },
    /// Render filtered rows into a formatted roster workbook
    Generate {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, value_enum)]
        template: TemplateKind,
        /// Academic term, e.g. 2024-2025学年第一学期
        #[arg(long)]
        semester: String,
        #[arg(long)]
        activity: String,
        /// Credit category, e.g. 学业分 or 品德分
        #[arg(long)]
        score_type: String,
        /// Flat score per person, required by the activity template
        #[arg(long)]
        score: Option<f64>,
        /// Order rows by award rank before class and name
        #[arg(long)]
        sort_by_award: bool,
        #[arg(long, default_value = "./output")]
        output: PathBuf,
    },
    /// List the distinct terms, activity types and classes of a sheet
    Facets {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value = parser::ATTENDED_SHEET)]
        sheet: String,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("attendance_roster=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn prepare_output(dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory {}", dir.display()))
}

fn load_records(path: &Path, sheet_name: &str) -> anyhow::Result<Vec<Record>> {
    parser::load_records(path, sheet_name)
        .with_context(|| format!("failed to load {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Parse {
            input,
            config,
            output,
        } => {
            let config = ParserConfig::load_or_default(&config)
                .with_context(|| format!("failed to read {}", config.display()))?;
            let sources = parser::collect_sources(&input)?;
            prepare_output(&output)?;

            let records = parser::load_sources(&sources)?;
            println!("Parsed {} rows from {} file(s).", records.len(), sources.len());

            let outcome = parser::process(records, &config);
            println!(
                "Valid: {}, invalid: {}, attended: {}, unattended: {}.",
                outcome.valid_count(),
                outcome.invalid.len(),
                outcome.attended.len(),
                outcome.unattended.len()
            );

            let written = parser::write_outputs(&outcome, &output)?;
            println!("Parsed data written to {}.", written.parsed.display());
            if let Some(blacklist_path) = &written.blacklist {
                println!("Blacklist written to {}.", blacklist_path.display());
            }

            let report = report::build_parse_report(&outcome, Local::now().naive_local());
            let report_path = output.join("report.txt");
            std::fs::write(&report_path, &report)?;
            println!("{report}");
            println!("Report written to {}.", report_path.display());
        }
        Commands::Filter {
            input,
            config,
            output,
        } => {
            let config = FilterConfig::load(&config)
                .with_context(|| format!("failed to read {}", config.display()))?;
            let records = load_records(&input, filter::INPUT_SHEET)?;
            prepare_output(&output)?;
            tracing::info!(rows = records.len(), "loaded parsed data");

            let filtered = filter::apply(&records, &config)?;
            println!("Kept {} of {} rows.", filtered.len(), records.len());

            let filtered_path = output.join("filtered_data.xlsx");
            sheet::write_table(&filtered_path, filter::OUTPUT_SHEET, &records_to_table(&filtered))?;
            println!("Filtered data written to {}.", filtered_path.display());

            let log = report::build_filter_log(records.len(), &filtered, &config);
            let log_path = output.join("filter_log.txt");
            std::fs::write(&log_path, &log)?;
            println!("{log}");
            println!("Filter log written to {}.", log_path.display());
        }
        Commands::Generate {
            input,
            template,
            semester,
            activity,
            score_type,
            score,
            sort_by_award,
            output,
        } => {
            let request = RosterRequest {
                kind: template,
                semester,
                activity,
                score_type,
                score,
                sort_by_award,
            };
            request.validate()?;

            let records = load_records(&input, roster::INPUT_SHEET)?;
            tracing::info!(rows = records.len(), "loaded filtered data");
            prepare_output(&output)?;

            let roster = roster::build(&records, &request)?;
            let roster_path = output.join(request.file_name());
            roster::render(&roster, &roster_path)?;
            println!("Roster written to {}.", roster_path.display());
        }
        Commands::Facets { input, sheet } => {
            let records = load_records(&input, &sheet)?;
            print!("{}", report::build_facets(&records));
        }
    }

    Ok(())
}
