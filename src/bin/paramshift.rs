//! paramshift CLI - schema-version migration for JSON/YAML parameter documents
//!
//! Walks a directory tree, migrates every eligible document in place and
//! reports a per-file summary. Each invocation of a transition re-checks
//! eligibility, so running the tool repeatedly is safe.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;

use paramshift::migrations;

#[derive(Parser)]
#[command(name = "paramshift")]
#[command(version, about = "Schema-version migration for JSON/YAML parameter documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Migrate eligible documents under a directory, in place
    Migrate {
        /// Directory to scan for candidate documents
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,

        /// Apply a single transition by identifier (default: all registered
        /// transitions, in chronological order)
        #[arg(short, long)]
        migration: Option<String>,
    },

    /// List the registered schema transitions
    List,
}

fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Migrate { dir, migration } => run_migrations(dir, migration),
        Commands::List => list_migrations(),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Apply the selected transitions sequentially, each with its own
/// eligibility pass.
fn run_migrations(dir: PathBuf, migration_id: Option<String>) -> Result<(), String> {
    let migrations = match migration_id {
        Some(id) => {
            let migration = migrations::find(&id)
                .ok_or_else(|| format!("Unknown migration: '{}'. See 'paramshift list'.", id))?;
            vec![migration]
        }
        None => migrations::all_migrations(),
    };

    let mut failures = 0;
    for migration in &migrations {
        println!("🔧 Applying {} in {}...", migration.id, dir.display());

        let report = paramshift::migrate_directory(&dir, migration)?;

        for path in &report.migrated {
            println!("  ✓ {}", path.display());
        }
        for (path, message) in &report.failed {
            println!("  ✗ {}: {}", path.display(), message);
        }
        println!(
            "  {} migrated, {} skipped, {} failed",
            report.migrated.len(),
            report.skipped,
            report.failed.len()
        );
        failures += report.failed.len();
    }

    if failures > 0 {
        return Err(format!("{} file(s) failed to migrate", failures));
    }
    println!("✨ Migration complete!");
    Ok(())
}

fn list_migrations() -> Result<(), String> {
    for migration in migrations::all_migrations() {
        println!(
            "{}: {} -> {} ({})",
            migration.id,
            migration.source_versions.join(", "),
            migration.target_version,
            migration.description
        );
    }
    Ok(())
}
