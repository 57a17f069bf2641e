use std::io::{self, BufRead, Write};

use anyhow::Context;
use clap::Parser;
use merge_versions::{
    import_folder, run_merge, BatchOutcome, Config, Library, Matcher, MergeReport, PhotoStore,
};
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{Cli, Command, MergeArgs, OutputFormat};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::resolve(cli.catalog.clone())?;
    let mut library = Library::open(&config.catalog_path)
        .with_context(|| format!("opening catalog {}", config.catalog_path.display()))?;

    match cli.command {
        Command::Import(args) => {
            let result = import_folder(&mut library, &args.folder)?;
            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
                OutputFormat::Text => println!(
                    "✅ Import complete! Added {} images, skipped {} duplicates, {} failed.",
                    result.imported_count, result.skipped_count, result.failed_count
                ),
            }
        }
        Command::Scan => scan(&library, cli.format)?,
        Command::Merge(args) => merge(&mut library, &args, cli.format)?,
    }

    Ok(())
}

/// `RUST_LOG` wins; otherwise info, or debug with `--verbose`
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn scan(library: &Library, format: OutputFormat) -> anyhow::Result<()> {
    let requests = Matcher::new().find_merge_candidates(library)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&requests)?),
        OutputFormat::Text => {
            println!(
                "📊 {} of {} photos are versions of another photo",
                requests.len(),
                library.photo_count()?
            );
            for request in &requests {
                println!("  {}", request.version_uri);
                println!("    => {} as \"{}\"", request.original_uri, request.version_name);
            }
        }
    }

    Ok(())
}

fn merge(library: &mut Library, args: &MergeArgs, format: OutputFormat) -> anyhow::Result<()> {
    let outcome = run_merge(library, |message| args.yes || ask(message))?;

    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    match outcome {
        BatchOutcome::NothingToMerge => println!("Nothing to merge."),
        BatchOutcome::Declined { pending } => {
            println!("Cancelled. {pending} merges left untouched.")
        }
        BatchOutcome::Merged { reports } => {
            for report in &reports {
                print_report(report);
            }
            let clean = reports.iter().filter(|r| r.is_clean()).count();
            println!(
                "✅ Merged {} versions ({} with skipped steps).",
                reports.len(),
                reports.len() - clean
            );
        }
    }

    Ok(())
}

fn print_report(report: &MergeReport) {
    let mark = if report.is_clean() { "✅" } else { "⚠️ " };
    println!("{} {} => {}", mark, report.request.version_uri, report.request.original_uri);
    for failure in &report.failures {
        match failure.version_id {
            Some(id) => println!(
                "     {} of version {} failed: {}",
                failure.step, id, failure.error
            ),
            None => println!("     {} failed: {}", failure.step, failure.error),
        }
    }
}

/// Yes/no prompt on the terminal; anything but "y"/"yes" declines
fn ask(message: &str) -> bool {
    println!("{message}");
    print!("Do it now? [y/N] ");
    if io::stdout().flush().is_err() {
        return false;
    }

    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(_) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
        Err(_) => false,
    }
}
