use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::info;

use motivation_profile::catalog::Catalog;
use motivation_profile::config::AppConfig;
use motivation_profile::models::AggregationMode;
use motivation_profile::report::{self, Report};
use motivation_profile::responses::{self, ResponseSet};
use motivation_profile::{export, telemetry};

#[derive(Parser)]
#[command(name = "motivation-profile")]
#[command(about = "Likert survey that scores categories and reports strengths", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the catalog's categories and prompts
    Questions {
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// Answer the survey interactively and print the profile
    Take {
        #[arg(long)]
        catalog: Option<PathBuf>,
        #[command(flatten)]
        output: ReportArgs,
    },
    /// Score a CSV of answers (columns Prompt,Score)
    Score {
        #[arg(long)]
        answers: PathBuf,
        #[arg(long)]
        catalog: Option<PathBuf>,
        #[command(flatten)]
        output: ReportArgs,
    },
}

#[derive(Args, Debug, Default)]
struct ReportArgs {
    /// Aggregation mode: mean or sum (defaults to the catalog's mode)
    #[arg(long)]
    mode: Option<AggregationMode>,
    /// Write category scores as CSV
    #[arg(long)]
    csv: Option<PathBuf>,
    /// Write the composed PDF report
    #[arg(long)]
    pdf: Option<PathBuf>,
    /// Write bar and radar charts (SVG and PNG) into this directory
    #[arg(long)]
    charts_dir: Option<PathBuf>,
    /// Write the text summary as Markdown
    #[arg(long)]
    summary: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load().context("failed to read SURVEY_* settings")?;
    telemetry::init(&config.log_level)?;

    match cli.command {
        Commands::Questions { catalog } => {
            let catalog = load_catalog(catalog.as_deref(), &config)?;
            print!("{}", render_questions(&catalog));
        }
        Commands::Take { catalog, output } => {
            let catalog = load_catalog(catalog.as_deref(), &config)?;
            let stdin = io::stdin();
            let responses =
                responses::collect_interactive(&catalog, stdin.lock(), io::stdout().lock())
                    .context("failed to collect answers")?;
            run_pipeline(&catalog, &responses, &output, &config)?;
        }
        Commands::Score {
            answers,
            catalog,
            output,
        } => {
            let catalog = load_catalog(catalog.as_deref(), &config)?;
            let responses = responses::read_answers(&catalog, &answers)
                .with_context(|| format!("failed to load answers from {}", answers.display()))?;
            run_pipeline(&catalog, &responses, &output, &config)?;
        }
    }

    Ok(())
}

fn load_catalog(flag: Option<&Path>, config: &AppConfig) -> anyhow::Result<Catalog> {
    let catalog = match flag.or(config.catalog_path.as_deref()) {
        Some(path) => Catalog::load(path)
            .with_context(|| format!("failed to load catalog {}", path.display()))?,
        None => Catalog::builtin(),
    };
    info!(
        title = %catalog.title,
        categories = catalog.categories.len(),
        prompts = catalog.prompt_count(),
        "catalog loaded"
    );
    Ok(catalog)
}

fn render_questions(catalog: &Catalog) -> String {
    use std::fmt::Write;

    let mut output = String::new();
    let _ = writeln!(output, "# {} ({} scoring)", catalog.title, catalog.mode);
    let mut number = 0usize;
    for category in &catalog.categories {
        let _ = writeln!(output);
        let _ = writeln!(output, "## {}", category.name);
        if let Some(description) = &category.description {
            let _ = writeln!(output, "{description}");
        }
        for text in &category.prompts {
            number += 1;
            let _ = writeln!(output, "{number:>3}. {text}");
        }
    }
    output
}

fn run_pipeline(
    catalog: &Catalog,
    responses: &ResponseSet,
    output: &ReportArgs,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let mode = output.mode.or(config.mode).unwrap_or(catalog.mode);
    info!(answers = responses.len(), %mode, "responses collected");

    let report = Report::build(catalog, responses, mode);
    info!(categories = report.sheet.len(), "scores computed");

    let summary = report::build_summary(&report);
    println!();
    print!("{summary}");

    if let Some(path) = &output.summary {
        export::write_summary(&summary, path)
            .with_context(|| format!("failed to write summary {}", path.display()))?;
        println!("Summary written to {}.", path.display());
    }
    if let Some(path) = &output.csv {
        export::write_csv(&report, path)
            .with_context(|| format!("failed to write CSV {}", path.display()))?;
        println!("CSV written to {}.", path.display());
    }
    if let Some(dir) = &output.charts_dir {
        export::write_charts(&report, dir)
            .with_context(|| format!("failed to write charts into {}", dir.display()))?;
        println!("Charts written to {}.", dir.display());
    }
    if let Some(path) = &output.pdf {
        export::write_pdf(&report, path)
            .with_context(|| format!("failed to write PDF report {}", path.display()))?;
        println!("PDF report written to {}.", path.display());
    }

    Ok(())
}
