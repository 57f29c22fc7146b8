use anyhow::{Context, Result};
use clap::Parser;
use schemegraph::schema::dedup_relationships;
use schemegraph::SchemeStore;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dedup")]
#[command(about = "Remove duplicate (edgeName, from, to) relationships from a scheme file")]
struct Args {
    /// Scheme file to clean up in place
    #[arg(short, long, default_value = "scheme.json")]
    file: PathBuf,

    /// Report what would be removed without writing the file
    #[arg(long)]
    dry_run: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("RUST_LOG", "info")).init();

    let args = Args::parse();
    let store = SchemeStore::new(&args.file);

    let mut document = store
        .read()
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    let before = document.relationships.len();
    document.relationships = dedup_relationships(document.relationships)
        .with_context(|| format!("Cannot deduplicate {}", args.file.display()))?;
    let removed = before - document.relationships.len();

    if args.dry_run {
        println!(
            "{} duplicate relationships found in {} ({} would remain)",
            removed,
            args.file.display(),
            document.relationships.len()
        );
        return Ok(());
    }

    if removed == 0 {
        println!("No duplicates in {}; file left untouched.", args.file.display());
        return Ok(());
    }

    store.save(&document)?;
    println!(
        "Processing complete. Removed {} duplicate relationships; {} remain in {}.",
        removed,
        document.relationships.len(),
        args.file.display()
    );
    Ok(())
}
