use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use services::{AppServices, Clock, NoopSink, TrackerConfig};

mod auth;
mod error;
mod routes;

use auth::AdminAllowlist;
use routes::{AppState, api_router};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidBind { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidBind { raw } => write!(f, "invalid --bind value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

struct Args {
    bind: String,
    db_url: String,
    asset_dir: PathBuf,
    admin_emails: String,
    tracking_enabled: bool,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!(
        "  cargo run -p server -- [--bind <addr:port>] [--db <sqlite_url>] \
         [--asset-dir <path>] [--admin-emails <a@b,c@d>] [--no-tracking]"
    );
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --bind 127.0.0.1:8787");
    eprintln!("  --db sqlite:ora.sqlite3");
    eprintln!("  --asset-dir ./assets");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  ORA_BIND, ORA_DB_URL, ORA_ASSET_DIR, ORA_ADMIN_EMAILS,");
    eprintln!("  ORA_TRACKING_ENABLED (0 disables ingest entirely)");
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut bind = std::env::var("ORA_BIND")
            .ok()
            .unwrap_or_else(|| "127.0.0.1:8787".into());
        let mut db_url = std::env::var("ORA_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://ora.sqlite3".into(), normalize_sqlite_url);
        let mut asset_dir = std::env::var("ORA_ASSET_DIR")
            .ok()
            .map_or_else(|| PathBuf::from("assets"), PathBuf::from);
        let mut admin_emails = std::env::var("ORA_ADMIN_EMAILS").unwrap_or_default();
        let mut tracking_enabled = std::env::var("ORA_TRACKING_ENABLED")
            .map(|value| value != "0" && !value.eq_ignore_ascii_case("false"))
            .unwrap_or(true);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--bind" => {
                    let value = require_value(args, "--bind")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidBind { raw: value });
                    }
                    bind = value;
                }
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--asset-dir" => {
                    asset_dir = PathBuf::from(require_value(args, "--asset-dir")?);
                }
                "--admin-emails" => {
                    admin_emails = require_value(args, "--admin-emails")?;
                }
                "--no-tracking" => {
                    tracking_enabled = false;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            bind,
            db_url,
            asset_dir,
            admin_emails,
            tracking_enabled,
        })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let args = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // Open + migrate SQLite at startup. Keep this in the binary glue so
    // core/services stay pure.
    prepare_sqlite_file(&args.db_url)?;

    let tracker_config = TrackerConfig {
        enabled: args.tracking_enabled,
        ..TrackerConfig::default()
    };
    let services = AppServices::new_sqlite(
        &args.db_url,
        &args.asset_dir,
        Clock::system(),
        tracker_config,
        Arc::new(NoopSink),
    )
    .await?;

    let allowlist = AdminAllowlist::from_csv(&args.admin_emails);
    if allowlist.is_empty() {
        info!("no admin emails configured; admin routes are locked");
    }
    if !args.tracking_enabled {
        info!("activity tracking disabled by configuration");
    }

    let state = AppState {
        services,
        allowlist: Arc::new(allowlist),
    };
    let app = Router::new()
        .nest("/api", api_router(state))
        .layer(TraceLayer::new_for_http());

    info!("listening on http://{}", args.bind);
    let listener = TcpListener::bind(&args.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
