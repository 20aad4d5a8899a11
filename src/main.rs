//! programma - Telegram workout program builder

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};

use programma::catalog::Catalog;
use programma::db::{Database, ProgramStore};
use programma::format::format_program_plain;
use programma::template::ProgramKind;
use programma::tui::App;

#[derive(Parser)]
#[command(name = "programma")]
#[command(author, version, about = "Workout program builder for Telegram")]
struct Cli {
    /// SQLite database path
    #[arg(long, global = true, env = "PROGRAMMA_DB", default_value = "programma.db")]
    db: String,

    /// Exercise catalog JSON (built-in catalog if omitted)
    #[arg(long, global = true, env = "PROGRAMMA_CATALOG")]
    catalog: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start Telegram bot
    Bot {
        /// Telegram bot token (or set TELOXIDE_TOKEN env var)
        #[arg(short, long, env = "TELOXIDE_TOKEN")]
        token: String,
    },

    /// Browse saved programs
    Tui,

    /// Print a user's saved program
    Show {
        user_id: i64,
    },

    /// Delete a user's saved program
    Clear {
        user_id: i64,
    },

    /// Report template entries the catalog has no exercises for
    CheckCatalog,
}

fn load_catalog(path: Option<&str>) -> Result<Catalog> {
    match path {
        Some(path) => Catalog::from_json_file(path),
        None => Ok(Catalog::builtin()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let catalog = load_catalog(cli.catalog.as_deref())?;

    match cli.command {
        Some(Commands::Bot { token }) => {
            println!("Starting Telegram bot...");
            println!("База данных: {}", cli.db);
            programma::bot::run_bot(token, &cli.db, catalog).await?;
        }

        Some(Commands::Show { user_id }) => {
            let db = Database::open(&cli.db)?;
            match db.get(user_id)? {
                Some(program) => println!("{}", format_program_plain(&program)),
                None => println!("User {} has no saved program", user_id),
            }
        }

        Some(Commands::Clear { user_id }) => {
            let db = Database::open(&cli.db)?;
            if db.delete(user_id)? {
                println!("Program of user {} deleted", user_id);
            } else {
                println!("User {} has no saved program", user_id);
            }
        }

        Some(Commands::CheckCatalog) => {
            let missing = catalog.missing_for(ProgramKind::all());
            if !missing.is_empty() {
                println!("Missing catalog entries:");
                println!("{:-<60}", "");
                for m in &missing {
                    println!("{:20} | {:20} | {:?}", m.group, m.subgroup, m.program);
                }
                bail!("{} catalog entries have no exercises", missing.len());
            }
            println!("Catalog covers all {} programs", ProgramKind::all().len());
        }

        Some(Commands::Tui) | None => {
            // Default: show TUI
            let mut app = App::new(Database::open(&cli.db)?)?;
            app.run()?;
        }
    }

    Ok(())
}
