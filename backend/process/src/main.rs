use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use kos::database::Database;
use process::utils::{describe, load_fixtures};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// SQLite database file
    #[arg(long, env = "KOS_DATABASE_PATH", default_value = "kos.db")]
    database: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load users, kos, facilities and images from a JSON file
    Seed { file: PathBuf },

    /// Rebuild room counters and the booking calendar from accepted bookings
    Reconcile {
        /// Write the fixes instead of only reporting them
        #[arg(long)]
        apply: bool,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let args = Args::parse();
    let database = Database::open(&args.database)?;

    match args.command {
        Command::Seed { file } => {
            let fixtures = load_fixtures(&file)?;

            println!("Loaded Users: {}", fixtures.users.len());
            println!("Loaded Kos: {}\n", fixtures.kos_count());

            let report = process::seed(&database, &fixtures)?;

            println!("New Users: {}", report.users);
            println!("Existing Users: {}", report.existing_users);
            println!("New Kos: {}", report.kos);
            println!("Facilities: {}", report.facilities);
            println!("Images: {}", report.images);
        }
        Command::Reconcile { apply } => {
            let drifts = process::reconcile(&database, apply)?;

            if drifts.is_empty() {
                println!("Inventory is consistent.");
                return Ok(());
            }

            for drift in &drifts {
                println!("{}", describe(drift));
            }

            if apply {
                println!("\nFixed {} kos.", drifts.len());
            } else {
                println!("\n{} kos drifted. Run again with --apply to fix.", drifts.len());
            }
        }
    }

    Ok(())
}
