//! pdfannotate CLI - fetch a PDF from IPFS and apply page labels

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use pdfannotate::{
    preview_labels, working_directory, AnnotateConfig, Annotator, FetchOptions, Stage,
};

#[derive(Parser)]
#[command(name = "pdfannotate")]
#[command(version)]
#[command(about = "Fetch a PDF from IPFS, verify it, and rewrite its page labels", long_about = None)]
struct Cli {
    /// Configuration file (JSON)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    #[command(flatten)]
    fetch: FetchArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Args, Clone, Default)]
struct FetchArgs {
    /// Request timeout in seconds (no timeout if unset)
    #[arg(long, value_name = "SECS", env = "PDFANNOTATE_TIMEOUT", global = true)]
    timeout: Option<u64>,

    /// Bytes read per chunk while downloading
    #[arg(long, value_name = "BYTES", global = true)]
    chunk_size: Option<usize>,

    /// Gateway URL template containing {cid}, tried in the given order
    #[arg(
        long = "gateway",
        value_name = "TEMPLATE",
        env = "PDFANNOTATE_GATEWAYS",
        value_delimiter = ',',
        global = true
    )]
    gateways: Vec<String>,

    /// Fail when label start pages are not strictly increasing
    #[arg(long, global = true)]
    strict_order: bool,
}

impl FetchArgs {
    fn to_options(&self) -> FetchOptions {
        let mut options = FetchOptions::new();
        if !self.gateways.is_empty() {
            options = options.with_gateways(self.gateways.iter().cloned());
        }
        if let Some(secs) = self.timeout {
            options = options.with_timeout(Duration::from_secs(secs));
        }
        if let Some(bytes) = self.chunk_size {
            options = options.with_chunk_size(bytes);
        }
        options
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch (or reuse the cached) source and write the labelled PDF
    Annotate {
        /// Configuration file (JSON)
        #[arg(value_name = "CONFIG")]
        config: PathBuf,
    },

    /// Show the labels a configuration produces, without fetching
    Labels {
        /// Configuration file (JSON)
        #[arg(value_name = "CONFIG")]
        config: PathBuf,

        /// Page indexes to preview (e.g., "0,10,626")
        #[arg(long, value_delimiter = ',')]
        pages: Vec<u32>,
    },

    /// Show version information
    Version,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Annotate { config }) => cmd_annotate(&config, &cli.fetch),
        Some(Commands::Labels { config, pages }) => cmd_labels(&config, &pages),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            // Default behavior: annotate if a configuration is provided
            if let Some(config) = cli.config {
                cmd_annotate(&config, &cli.fetch)
            } else {
                println!("{}", "Usage: pdfannotate <CONFIG>".yellow());
                println!("       pdfannotate --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn cmd_annotate(config_path: &Path, args: &FetchArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = AnnotateConfig::from_path(config_path)?;
    let dir = working_directory(config_path);
    log::debug!("Working directory {}", dir.display());
    let annotator = Annotator::new(args.to_options())?.with_strict_order(args.strict_order);

    let pb = ProgressBar::new(3);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {msg}")?
            .progress_chars("#>-"),
    );

    let report = annotator.run_with_progress(&config, &dir, |stage| {
        if stage != Stage::Materialize {
            pb.inc(1);
        }
        match stage {
            Stage::Materialize => {
                pb.set_message(format!("Fetching {}...", config.content_identifier))
            }
            Stage::ApplyLabels => pb.set_message("Applying page labels..."),
            Stage::Save => pb.set_message("Saving..."),
        }
    });
    let report = match report {
        Ok(report) => report,
        Err(e) => {
            pb.abandon();
            return Err(e.into());
        }
    };
    pb.inc(1);

    pb.finish_with_message("Done!");

    let origin = if report.cache_hit {
        "cached".dimmed()
    } else {
        "downloaded".green()
    };
    println!("\n{}", "Output files:".green().bold());
    println!(
        "  {} {} ({})",
        "├─".dimmed(),
        report.source_path.display(),
        origin
    );
    println!(
        "  {} {} ({} labels, {} pages)",
        "└─".dimmed(),
        report.output_path.display(),
        report.label_count,
        report.page_count
    );

    Ok(())
}

fn cmd_labels(config_path: &Path, pages: &[u32]) -> Result<(), Box<dyn std::error::Error>> {
    let config = AnnotateConfig::from_path(config_path)?;

    println!("{}", "Label Rules".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    for entry in &config.labels {
        let style = entry
            .rule
            .style
            .map(|s| s.to_string())
            .unwrap_or_else(|| "none".to_string());
        println!(
            "{}: page {}, style {}, prefix {:?}, first {}",
            entry.key.bold(),
            entry.rule.start_page,
            style,
            entry.rule.prefix,
            entry.rule.first_page_number
        );
    }

    if !pages.is_empty() {
        println!();
        println!("{}", "Page Labels".cyan().bold());
        println!("{}", "─".repeat(40).dimmed());
        for (page, label) in preview_labels(&config, pages) {
            match label {
                Some(label) => println!("{}: {:?}", page.to_string().bold(), label),
                None => println!("{}: {}", page.to_string().bold(), "(none)".dimmed()),
            }
        }
    }

    Ok(())
}

fn cmd_version() {
    println!(
        "{} {}",
        "pdfannotate".cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("Fetch PDFs from IPFS and apply page labels");
}
