//! Migration CLI tool.

use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use sea_orm::{ConnectOptions, DatabaseConnection};

use blog_core::schema::application_schema;
use migration::{ColumnRename, GenerateOptions, Migrator, ScriptDirectory, Target, describe_revision};

/// Default location of the script directory, relative to the workspace root.
const DEFAULT_SCRIPT_DIR: &str = "apps/migration/migrations";

/// Generate and apply blog schema migrations
#[derive(Parser, Debug)]
#[command(name = "migration")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Database to migrate
    #[arg(
        long,
        global = true,
        env = "DATABASE_URL",
        default_value = "sqlite://blog.db?mode=rwc"
    )]
    database_url: String,

    /// Script directory; the scripts built into this binary when omitted
    #[arg(long, global = true, env = "MIGRATIONS_DIR")]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply scripts up to a revision
    Upgrade {
        /// `head`, `base` or a revision id
        #[arg(long, default_value = "head")]
        to: Target,
    },
    /// Revert scripts down to a revision (one step by default)
    Downgrade {
        /// `base` or a revision id
        #[arg(long)]
        to: Option<Target>,
    },
    /// Show the live revision
    Current,
    /// List scripts from base to head
    History,
    /// Write a script for the difference between head and the application schema
    Generate {
        /// Message stored in the script and used in its file name
        #[arg(short, long)]
        message: String,

        /// Declare a column rename as `table.old:new`
        #[arg(long = "rename")]
        renames: Vec<ColumnRename>,
    },
    /// Fail if the application schema has changes without a script
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt().with_env_filter("info").init();

    let cli = Cli::parse();
    let migrator = match &cli.dir {
        Some(dir) => ScriptDirectory::new(dir).migrator()?,
        None => Migrator::embedded()?,
    };

    match cli.command {
        Command::Upgrade { to } => {
            let db = connect(&cli.database_url).await?;
            let outcome = migrator.upgrade(&db, to).await?;
            println!("{outcome}");
        }
        Command::Downgrade { to } => {
            let db = connect(&cli.database_url).await?;
            let target = match to {
                Some(target) => target,
                None => {
                    let current = migrator.current(&db).await?;
                    migrator.previous(current.as_deref())?
                }
            };
            let outcome = migrator.downgrade(&db, target).await?;
            println!("{outcome}");
        }
        Command::Current => {
            let db = connect(&cli.database_url).await?;
            let current = migrator.current(&db).await?;
            let marker = if current.as_deref() == migrator.head() {
                " (head)"
            } else {
                ""
            };
            println!("{}{marker}", describe_revision(current.as_deref()));
        }
        Command::History => {
            for script in migrator.history().iter().rev() {
                println!(
                    "{} -> {}: {}",
                    describe_revision(script.down_revision.as_deref()),
                    script.revision,
                    script.message
                );
            }
        }
        Command::Generate { message, renames } => {
            let directory =
                ScriptDirectory::new(cli.dir.unwrap_or_else(|| DEFAULT_SCRIPT_DIR.into()));
            let migrator = directory.migrator()?;
            let options = GenerateOptions {
                message,
                renames,
                ..GenerateOptions::default()
            };

            let script = migrator.generate(&application_schema(), options)?;
            if script.is_empty() {
                println!("No changes detected");
            } else {
                let path = directory.write(&script)?;
                println!("Generated {} ({})", path.display(), script.revision);
            }
        }
        Command::Check => {
            if !migrator.check(&application_schema())? {
                bail!("application schema has changes that no migration script covers");
            }
            println!("Schema is up to date");
        }
    }

    Ok(())
}

async fn connect(url: &str) -> anyhow::Result<DatabaseConnection> {
    let mut opts = ConnectOptions::new(url);
    opts.sqlx_logging(false);
    sea_orm::Database::connect(opts)
        .await
        .with_context(|| format!("failed to connect to {url}"))
}
