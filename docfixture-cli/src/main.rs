use anyhow::{bail, Result};
use clap::Parser;
use docfixture::{default_output_dir, FixtureCatalog};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "docfixture",
    about = "Generate document fixtures for text extraction tests",
    version,
    author
)]
struct Cli {
    /// Directory the fixtures are written to
    #[arg(short, long, env = "DOCFIXTURE_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Also write a fixtures.json manifest
    #[arg(long)]
    manifest: bool,

    /// Compare existing fixtures with the catalog instead of writing them
    #[arg(long, conflicts_with = "list")]
    check: bool,

    /// Print the catalog as JSON and exit
    #[arg(long)]
    list: bool,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.quiet { "warn" } else { "docfixture=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let catalog = FixtureCatalog::standard();

    if cli.list {
        let manifest = catalog.manifest()?;
        println!("{}", serde_json::to_string_pretty(&manifest)?);
        return Ok(());
    }

    let output_dir = cli.output_dir.unwrap_or_else(default_output_dir);

    if cli.check {
        let drift = catalog.verify(&output_dir)?;
        if !drift.is_empty() {
            for entry in &drift {
                eprintln!("{entry}");
            }
            bail!(
                "{} of {} fixtures in {} are out of date",
                drift.len(),
                catalog.definitions().len(),
                output_dir.display()
            );
        }
        info!(dir = %output_dir.display(), "All fixtures up to date");
        return Ok(());
    }

    let generated = catalog.generate(&output_dir)?;
    if cli.manifest {
        catalog.write_manifest(&output_dir)?;
    }

    info!(
        count = generated.len(),
        dir = %output_dir.display(),
        "Fixture generation complete"
    );
    Ok(())
}
