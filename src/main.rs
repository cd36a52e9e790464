//! Binary entrypoint for the CommandBooks CLI.
//!
//! Commands:
//! - `init` - create a starter `config.toml` and the data directory
//! - `console --user <name>` - interactive session: write, save, load, list, copy and use books
//! - `books --user <id>` - print a user's saved book names (ids are used verbatim)
//! - `show --user <id> <name> [--json]` - print the commands of a saved book
//!
//! See the library crate docs for module-level details: `commandbooks::`.
use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;

use commandbooks::config::Config;
use commandbooks::console::Console;
use commandbooks::store::{BookStore, StoreError};

#[derive(Parser)]
#[command(name = "commandbooks")]
#[command(about = "Command macros stored in writable books")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init,
    /// Start an interactive console session
    Console {
        /// Player name to act as (its lowercase form is the user id)
        #[arg(short, long, default_value = "player")]
        user: String,
    },
    /// List a user's saved books
    Books {
        /// User id, exactly as stored (console players use their lowercased name)
        #[arg(short, long)]
        user: String,
    },
    /// Print the commands of a saved book
    Show {
        /// User id, exactly as stored (console players use their lowercased name)
        #[arg(short, long)]
        user: String,
        /// Book name (case-insensitive)
        name: String,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Init = cli.command {
        init_logging(&None, cli.verbose);
        info!("Initializing new CommandBooks configuration");
        Config::create_default(&cli.config).await?;
        let cfg = Config::load(&cli.config).await?;
        BookStore::new(&cfg.storage.data_dir).await?;
        info!(
            "Configuration file created at {}; books will be stored under {}/users",
            cli.config, cfg.storage.data_dir
        );
        return Ok(());
    }

    let config = match Config::load(&cli.config).await {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{} (using defaults; run `commandbooks init` to create one)", e);
            Config::default()
        }
    };
    init_logging(&Some(config.clone()), cli.verbose);

    match cli.command {
        Commands::Init => unreachable!("handled above"),
        Commands::Console { user } => {
            info!("Starting CommandBooks console v{}", env!("CARGO_PKG_VERSION"));
            let console = Console::new(&config, &user).await?;
            console.run().await?;
        }
        Commands::Books { user } => {
            let store = BookStore::new(&config.storage.data_dir).await?;
            let mut names = store.list(&user).await?;
            names.sort();
            if names.is_empty() {
                println!("{} has no saved books.", user);
            }
            for name in names {
                println!(" - {}", name);
            }
        }
        Commands::Show { user, name, json } => {
            let store = BookStore::new(&config.storage.data_dir).await?;
            match store.load(&user, &name).await {
                Ok(commands) if json => {
                    let payload = serde_json::json!({
                        "user": user,
                        "book": name.to_lowercase(),
                        "commands": commands,
                    });
                    println!("{}", payload);
                }
                Ok(commands) => {
                    for (i, command) in commands.iter().enumerate() {
                        println!("{:>3}. {}", i + 1, command);
                    }
                }
                Err(StoreError::NotFound(book)) => {
                    eprintln!("No book named '{}' for {}", book, user);
                    std::process::exit(1);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    Ok(())
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides the configured level
    let configured = config
        .as_ref()
        .and_then(|c| c.logging.level.parse::<log::LevelFilter>().ok())
        .unwrap_or(log::LevelFilter::Info);
    let base_level = match verbosity {
        0 => configured,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let file = config.as_ref().and_then(|c| c.logging.file.clone());
    let security_path = config.as_ref().and_then(|c| c.logging.security_file.clone());
    let opened = file.as_ref().and_then(|path| {
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .ok()
    });

    match opened {
        Some(f) => {
            let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
            // Echo to the console only in the foreground; the console prompt owns stdout otherwise.
            let is_tty = atty::is(atty::Stream::Stderr);
            builder.format(move |fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                let line = format!("{} [{}] {}", ts, record.level(), record.args());

                if let Ok(mut guard) = write_mutex.lock() {
                    let _ = writeln!(guard, "{}", line);
                }

                if record.target() == "security" {
                    if let Some(ref sec_path) = security_path {
                        if let Ok(mut sf) = std::fs::OpenOptions::new()
                            .create(true)
                            .append(true)
                            .open(sec_path)
                        {
                            let _ = writeln!(sf, "{}", line);
                        }
                    }
                }

                if is_tty && record.level() <= log::Level::Warn {
                    writeln!(fmt, "{}", line)
                } else {
                    Ok(())
                }
            });
        }
        None => {
            builder.format(|fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
            });
        }
    }
    let _ = builder.try_init();
}
