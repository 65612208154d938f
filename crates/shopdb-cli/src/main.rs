mod import;
mod users;

use std::path::PathBuf;

use clap::{ArgGroup, Parser, Subcommand};
use shopdb_core::AccountType;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "shopdb-cli")]
#[command(about = "Price-list import and catalog administration")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance.
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Account management.
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
    /// Import a shop's price list from a file or URL.
    #[command(group(ArgGroup::new("source").required(true).args(["file", "url"])))]
    Import {
        /// Email of the shop account that owns the price list.
        #[arg(long)]
        owner: String,
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long)]
        url: Option<String>,
        /// Validate and report counts without writing.
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    Ping,
    Migrate,
}

#[derive(Debug, Subcommand)]
enum UserCommands {
    /// Create an account and print its bearer token.
    Create {
        #[arg(long)]
        email: String,
        #[arg(long)]
        account_type: AccountType,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("shopdb-cli: run with --help to list commands");
        return Ok(());
    };

    let config = shopdb_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    if let Commands::Import {
        file,
        url,
        dry_run: true,
        ..
    } = &command
    {
        let source = import::Source::from_args(file.clone(), url.clone())?;
        return import::run_dry_run(&config, &source).await;
    }

    let pool_config = shopdb_db::PoolConfig::from_app_config(&config);
    let pool = shopdb_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        Commands::Db {
            command: DbCommands::Ping,
        } => {
            shopdb_db::health_check(&pool).await?;
            println!("database: ok");
        }
        Commands::Db {
            command: DbCommands::Migrate,
        } => {
            let applied = shopdb_db::run_migrations(&pool).await?;
            println!("applied {applied} migration(s)");
        }
        Commands::User {
            command:
                UserCommands::Create {
                    email,
                    account_type,
                },
        } => {
            users::run_create_user(&pool, &config.token_salt, &email, account_type).await?;
        }
        Commands::Import {
            owner, file, url, ..
        } => {
            let source = import::Source::from_args(file, url)?;
            import::run_import(&pool, &config, &owner, &source).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests;
