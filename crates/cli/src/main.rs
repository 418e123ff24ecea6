//! Seed-data tooling for the simward platform.
//!
//! The server's in-memory store can be pre-populated from a JSON seed file
//! (`SIMWARD_SEED_FILE`). This CLI generates the built-in demo dataset,
//! validates hand-edited seed files, and prints summaries.

use clap::{Parser, Subcommand};
use simward_core::seed::{check_snapshot, demo_snapshot, load_snapshot, save_snapshot};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "simward")]
#[command(about = "simward clinical-simulation platform CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed-file operations
    Seed {
        #[command(subcommand)]
        command: SeedCommands,
    },
}

#[derive(Subcommand)]
enum SeedCommands {
    /// Write the demo dataset to a seed file
    Generate {
        /// Output path
        #[arg(long, default_value = "seed.json")]
        out: PathBuf,
        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },
    /// Check a seed file for parse errors and dangling references
    Validate {
        /// Seed file to check
        path: PathBuf,
    },
    /// Print a summary of a seed file
    Show {
        /// Seed file to summarise
        path: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Seed { command } => match command {
            SeedCommands::Generate { out, pretty } => {
                let snapshot = demo_snapshot();
                save_snapshot(&out, &snapshot, pretty)?;
                println!(
                    "Wrote demo dataset to {} ({} users, {} patients, {} groups)",
                    out.display(),
                    snapshot.users.len(),
                    snapshot.patients.len(),
                    snapshot.groups.len()
                );
            }
            SeedCommands::Validate { path } => {
                let snapshot = load_snapshot(&path)?;
                let problems = check_snapshot(&snapshot);
                if problems.is_empty() {
                    println!("{} is valid", path.display());
                } else {
                    for problem in &problems {
                        eprintln!("problem: {}", problem);
                    }
                    return Err(format!(
                        "{} has {} referential problems",
                        path.display(),
                        problems.len()
                    )
                    .into());
                }
            }
            SeedCommands::Show { path } => {
                let snapshot = load_snapshot(&path)?;
                println!("Seed file: {}", path.display());
                println!("  users:        {}", snapshot.users.len());
                println!("  sessions:     {}", snapshot.sessions.len());
                println!("  groups:       {}", snapshot.groups.len());
                println!("  patients:     {}", snapshot.patients.len());
                println!("  assignments:  {}", snapshot.group_data_assignments.len());
                println!("  documents:    {}", snapshot.documents.len());
                println!("  assets:       {}", snapshot.assets.len());
                for session in &snapshot.sessions {
                    println!(
                        "  session '{}' (active: {}, {}s remaining)",
                        session.name, session.active, session.time_remaining_secs
                    );
                }
            }
        },
    }

    Ok(())
}
