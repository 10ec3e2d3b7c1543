//! Command-line interface for the refiner.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::batch::{refine_all, RunEvent, RunSummary};
use crate::config::RefineConfig;
use crate::document::segment_body;
use crate::error::Result;
use crate::http::create_client;
use crate::metadata::MetadataCache;
use crate::segment::SectionSpec;
use crate::tree::Tree;

/// BV Refiner - Segment Transkribus TEI exports into article editions.
#[derive(Parser)]
#[command(name = "bv-refiner")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Refine every exported transcription into an edition file.
    Refine {
        /// Output directory, cleared before the run (default: ./editions)
        #[arg(short, long)]
        editions_dir: Option<PathBuf>,

        /// Transkribus export directory (default: ./mets)
        #[arg(short, long)]
        mets_dir: Option<PathBuf>,

        /// Edition template (default: ./templates/tei_template.xml)
        #[arg(short, long)]
        template: Option<PathBuf>,

        /// Malformed-document report (default: ./logs/malformed_files.csv)
        #[arg(long)]
        malformed_log: Option<PathBuf>,
    },

    /// Segment one TEI file and print its body.
    Segment {
        /// TEI file to segment
        file: PathBuf,

        /// `ana` value of created divisions
        #[arg(long, default_value = crate::config::ARTICLE_CLASS)]
        class: String,
    },

    /// Download the metadata dumps into the export directory.
    FetchMetadata {
        /// Transkribus export directory (default: ./mets)
        #[arg(short, long)]
        mets_dir: Option<PathBuf>,
    },
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Refine {
            editions_dir,
            mets_dir,
            template,
            malformed_log,
        } => {
            let mut config = RefineConfig::from_env();
            if let Some(dir) = editions_dir {
                config = config.with_editions_dir(dir);
            }
            if let Some(dir) = mets_dir {
                config = config.with_mets_dir(dir);
            }
            if let Some(path) = template {
                config = config.with_template(path);
            }
            if let Some(path) = malformed_log {
                config = config.with_malformed_log(path);
            }
            refine_command(&config)
        }
        Commands::Segment { file, class } => segment_command(&file, &class),
        Commands::FetchMetadata { mets_dir } => {
            let mut config = RefineConfig::from_env();
            if let Some(dir) = mets_dir {
                config = config.with_mets_dir(dir);
            }
            fetch_metadata_command(&config)
        }
    }
}

/// Execute the refine command.
fn refine_command(config: &RefineConfig) -> Result<()> {
    println!(
        "{} {} into {}",
        style("Refining").bold(),
        style(config.mets_dir.display()).cyan(),
        style(config.editions_dir.display()).green()
    );
    println!();

    let pb = ProgressBar::new(0);
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30}] {pos}/{len} {msg}")
            .expect("valid template"),
    );
    pb.set_message("Loading metadata...");
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let summary = refine_all(config, |event| match event {
        RunEvent::Started { total } => pb.set_length(total as u64),
        RunEvent::Document { path } => {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            pb.set_message(name);
            pb.inc(1);
        }
    });
    pb.finish_and_clear();
    let summary = summary?;

    print_summary(&summary, config);
    Ok(())
}

fn print_summary(summary: &RunSummary, config: &RefineConfig) {
    println!("  Written: {}", style(summary.written.len()).green());
    println!("  Articles: {}", summary.articles);
    if !summary.failed.is_empty() {
        println!("  Failed: {}", style(summary.failed.len()).yellow().bold());
        for failed in &summary.failed {
            println!("    {} {}", style(&failed.file_name).dim(), failed.error);
        }
    }
    if !summary.malformed.is_empty() {
        println!(
            "  Malformed: {} (see {})",
            style(summary.malformed.len()).red().bold(),
            config.malformed_log.display()
        );
    }
}

/// Execute the segment command.
fn segment_command(file: &Path, class: &str) -> Result<()> {
    let xml = std::fs::read_to_string(file)?;
    let mut tree = Tree::parse(&xml)?;
    let spec = SectionSpec::articles().with_class(class);

    let (body, report) = segment_body(&mut tree, &spec)?;
    eprintln!(
        "{} {} article(s) in {}",
        style("Found").bold(),
        style(report.divisions.len()).green(),
        file.display()
    );
    println!("{body}");
    Ok(())
}

/// Execute the fetch-metadata command.
fn fetch_metadata_command(config: &RefineConfig) -> Result<()> {
    let pb = ProgressBar::new_spinner();
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.set_message("Downloading metadata dumps...");
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let cache = MetadataCache::from_config(config);
    let loaded = create_client().and_then(|client| cache.load(&client));
    pb.finish_and_clear();
    let (_, store) = loaded?;

    println!(
        "{} {} documents in {} collections",
        style("Cached").green().bold(),
        store.len(),
        store.collections().count()
    );
    Ok(())
}
