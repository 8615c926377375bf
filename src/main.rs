use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use aihub::{
    AppState, Config, create_app_with_state,
    articles::{ArticleStore, backup},
    startup_checks,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Global options that apply to all commands
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: PathBuf,

    /// Overrides `app.log_level` from the config file
    #[arg(short, long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the web server (default if no command specified)
    Serve {
        #[arg(short, long)]
        port: Option<u16>,

        #[arg(long)]
        host: Option<String>,

        /// Automatically quit after specified number of seconds (useful for testing)
        #[arg(long)]
        quit_after: Option<u64>,

        /// Run database migrations before accepting requests
        #[arg(long)]
        migrate: bool,
    },

    /// Inspect articles as the server would resolve them
    #[command(subcommand)]
    Articles(ArticleCommands),

    /// Apply database migrations and exit
    Migrate,
}

#[derive(Subcommand, Debug)]
enum ArticleCommands {
    /// List article metadata, newest first
    List,
    /// Print a single article as JSON
    Show {
        /// Article slug
        slug: String,
    },
    /// Write the backup snapshot files from the currently resolved articles
    ExportBackup {
        /// Directory to write the JSON files into
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // The config picks the log level, so its messages are held until logging is up
    let loaded_env = dotenvy::dotenv().is_ok();
    let (config, config_source) = load_config(&cli.config)?;

    let level = match config.log_level(cli.log_level.as_deref()).to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if loaded_env {
        info!("Loaded environment from .env");
    }
    info!("{}", config_source);

    match cli.command {
        Some(Commands::Articles(cmd)) => handle_article_command(cmd, config).await,
        Some(Commands::Migrate) => run_migrations(config).await,
        Some(Commands::Serve {
            port,
            host,
            quit_after,
            migrate,
        }) => run_server(config, port, host, quit_after, migrate).await,
        None => {
            // Default to serve command if no subcommand specified
            run_server(config, None, None, None, false).await
        }
    }
}

fn load_config(config_path: &Path) -> Result<(Config, String), Box<dyn std::error::Error>> {
    let (mut config, source) = if config_path.exists() {
        let config_content = std::fs::read_to_string(config_path)?;
        (
            toml_edit::de::from_str::<Config>(&config_content)?,
            format!("Configuration loaded from: {:?}", config_path),
        )
    } else {
        (
            Config::default(),
            format!("Config file not found at {:?}, using defaults", config_path),
        )
    };
    config.apply_env_overrides();
    Ok((config, source))
}

async fn handle_article_command(
    cmd: ArticleCommands,
    config: Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = ArticleStore::new(&config.articles);

    match cmd {
        ArticleCommands::List => {
            let articles = store.get_articles().await;
            if articles.is_empty() {
                println!("No articles found");
            }
            for meta in articles {
                println!(
                    "{}  {:<40} {}",
                    meta.date.format("%Y-%m-%d"),
                    meta.slug,
                    meta.title
                );
            }
        }
        ArticleCommands::Show { slug } => match store.get_article_by_slug(&slug).await {
            Some(article) => println!("{}", serde_json::to_string_pretty(&article)?),
            None => {
                eprintln!("Error: Article '{}' not found", slug);
                std::process::exit(1);
            }
        },
        ArticleCommands::ExportBackup { output } => {
            let articles = store.get_articles().await;

            let mut content = BTreeMap::new();
            for meta in &articles {
                match store.get_article_by_slug(&meta.slug).await {
                    Some(article) => {
                        content.insert(
                            meta.slug.clone(),
                            backup::BackupEntry {
                                meta: article.meta,
                                content: article.content,
                            },
                        );
                    }
                    None => tracing::warn!("Article '{}' listed but not loadable", meta.slug),
                }
            }

            tokio::fs::create_dir_all(&output).await?;
            tokio::fs::write(
                output.join(backup::BACKUP_FILE),
                serde_json::to_string_pretty(&articles)?,
            )
            .await?;
            tokio::fs::write(
                output.join(backup::CONTENT_BACKUP_FILE),
                serde_json::to_string_pretty(&content)?,
            )
            .await?;

            println!(
                "Exported {} articles to {}",
                articles.len(),
                output.display()
            );
        }
    }

    Ok(())
}

async fn run_migrations(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let store = ArticleStore::new(&config.articles);
    if store.database().is_none() {
        eprintln!("Error: No database configured (set DATABASE_URL or articles.database_url)");
        std::process::exit(1);
    }

    store.run_migrations().await?;
    println!("Migrations applied");
    Ok(())
}

async fn run_server(
    config: Config,
    port: Option<u16>,
    host: Option<String>,
    quit_after: Option<u64>,
    migrate: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let host = host.unwrap_or(config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    info!("Starting {} server", config.app.name);
    info!(
        "Content directory: {:?}",
        config.articles.content_directory
    );
    info!(
        "Newsletter subscribers file: {:?}",
        config.newsletter.subscribers_file
    );

    // Perform startup checks
    match startup_checks::perform_startup_checks(&config).await {
        Ok(()) => info!("All startup checks passed"),
        Err(errors) => {
            for error in &errors {
                tracing::warn!("Startup check failed: {}", error);
            }
            if errors.iter().any(|e| e.is_critical()) {
                tracing::error!("Critical startup check failed, exiting");
                return Err("Critical startup check failed".into());
            } else {
                tracing::warn!("Non-critical startup checks failed, continuing");
            }
        }
    }

    let app_state = AppState::new(config);

    if migrate {
        info!("Running database migrations");
        if let Err(e) = app_state.articles.run_migrations().await {
            tracing::error!("Failed to run migrations: {}", e);
        }
    }

    let app = create_app_with_state(app_state);

    let addr = SocketAddr::from((host.parse::<std::net::IpAddr>()?, port));
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Set up graceful shutdown
    let server = axum::serve(listener, app);
    let graceful = server.with_graceful_shutdown(shutdown_signal(quit_after));

    if let Err(e) = graceful.await {
        tracing::error!("Server error: {}", e);
    }

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal(quit_after: Option<u64>) {
    use tokio::signal;
    use tokio::time::{Duration, sleep};

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let quit_timer = async {
        if let Some(seconds) = quit_after {
            info!(
                "Server will automatically shut down after {} seconds",
                seconds
            );
            sleep(Duration::from_secs(seconds)).await;
            info!("Quit timer expired, shutting down");
        } else {
            std::future::pending::<()>().await
        }
    };

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        },
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        },
        _ = quit_timer => {},
    }
}
