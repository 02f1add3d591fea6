//! Command-line entry point
//!
//! Reads a sectioned document from a JSON file, annotates it, and writes the
//! annotated document to the output path.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process;
use tracing::info;
use tracing_subscriber::EnvFilter;

use docweave::document::{read_document, write_document};
use docweave::{Pipeline, RuleEngine, SectionKind};

#[derive(Parser)]
#[command(
    name = "docweave",
    about = "Annotate a sectioned document with tokenizations, entities, and coreference"
)]
struct Cli {
    /// Input document (JSON, with section groupings)
    input: PathBuf,

    /// Output path for the annotated document
    output: PathBuf,

    /// Section kinds to fully annotate; other kinds are skipped but still
    /// consume character offset
    #[arg(long, value_delimiter = ',', default_value = "passage")]
    annotate_sections: Vec<SectionKind>,

    /// Print debugging messages
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let cli = Cli::try_parse().unwrap_or_else(|e| {
        eprintln!("{e}");
        process::exit(1);
    });

    let filter = if cli.debug {
        EnvFilter::new("docweave=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("docweave=info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let document = read_document(&cli.input)?;

    let pipeline = Pipeline::with_contentful_kinds(RuleEngine::new(), cli.annotate_sections);
    info!("beginning annotation");
    let annotated = pipeline.process(&document)?;
    info!("finished");

    write_document(&annotated, &cli.output)?;
    Ok(())
}
