use anyhow::{anyhow, Context, Result};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::config::DatabaseConfig;

pub const SQLITE_MEMORY: &str = "sqlite::memory:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Sqlite,
    Postgres,
}

/// Backend from the DSN scheme.
pub fn detect_backend(dsn: &str) -> Result<Backend> {
    let raw = dsn.trim();
    if raw.is_empty() {
        return Err(anyhow!("Database URL not configured"));
    }
    if raw.eq_ignore_ascii_case(SQLITE_MEMORY) {
        return Ok(Backend::Sqlite);
    }
    let url = Url::parse(raw).map_err(|e| anyhow!("Invalid database DSN '{raw}': {e}"))?;
    match url.scheme() {
        "sqlite" | "sqlite3" => Ok(Backend::Sqlite),
        "postgres" | "postgresql" => Ok(Backend::Postgres),
        other => Err(anyhow!("Unsupported database type: {other}")),
    }
}

/// Rewrite a sqlite DSN so relative paths live under `base_dir`.
///
/// In-memory DSNs are returned as `sqlite::memory:`. File DSNs get
/// `mode=rwc` unless a mode is already given, so the file is created on first run.
pub fn absolutize_sqlite_dsn(dsn: &str, base_dir: &Path, create_dirs: bool) -> Result<String> {
    if dsn.eq_ignore_ascii_case(SQLITE_MEMORY) || dsn.eq_ignore_ascii_case("sqlite://:memory:") {
        return Ok(SQLITE_MEMORY.to_string());
    }
    let rest = dsn
        .strip_prefix("sqlite://")
        .ok_or_else(|| anyhow!("DSN must start with sqlite:// (got: {dsn})"))?;

    let (path_str, query) = match rest.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (rest, None),
    };
    if path_str.is_empty() {
        return Err(anyhow!("Empty SQLite path in DSN"));
    }

    let mut path = PathBuf::from(path_str);
    if path.is_relative() {
        path = base_dir.join(path);
    }
    if create_dirs {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("cannot create database dir {}", dir.display()))?;
        }
    }

    let mut out = format!("sqlite://{}", path.to_string_lossy().replace('\\', "/"));
    match query {
        Some(q) if q.split('&').any(|kv| kv.starts_with("mode=")) => {
            out.push('?');
            out.push_str(q);
        }
        Some(q) => {
            out.push('?');
            out.push_str(q);
            out.push_str("&mode=rwc");
        }
        None => out.push_str("?mode=rwc"),
    }
    Ok(out)
}

/// Open the pool described by `cfg`. `mock` swaps in an in-memory SQLite.
pub async fn connect_database(
    cfg: &DatabaseConfig,
    home_dir: &Path,
    mock: bool,
) -> Result<DatabaseConnection> {
    let dsn = if mock {
        SQLITE_MEMORY.to_string()
    } else {
        cfg.url.trim().to_string()
    };
    let backend = detect_backend(&dsn)?;
    let dsn = match backend {
        Backend::Sqlite => absolutize_sqlite_dsn(&dsn, home_dir, true)?,
        Backend::Postgres => dsn,
    };

    let mut opts = ConnectOptions::new(dsn.clone());
    opts.acquire_timeout(Duration::from_secs(5))
        .sqlx_logging(false);

    if dsn == SQLITE_MEMORY {
        // Every pooled connection would otherwise see its own empty database.
        opts.max_connections(1);
    } else if let Some(max) = cfg.max_conns {
        opts.max_connections(max);
    }

    if backend == Backend::Sqlite {
        if let Some(ms) = cfg.busy_timeout_ms {
            let timeout = Duration::from_millis(u64::from(ms));
            opts.map_sqlx_sqlite_opts(move |o| o.busy_timeout(timeout));
        }
    }

    tracing::info!(dsn = %redact(&dsn), ?backend, "Connecting to database");
    Database::connect(opts)
        .await
        .with_context(|| format!("cannot connect to {}", redact(&dsn)))
}

/// Hide the password component of a DSN for logs.
fn redact(dsn: &str) -> String {
    match Url::parse(dsn) {
        Ok(mut url) if url.password().is_some() => {
            let _ = url.set_password(Some("***"));
            url.to_string()
        }
        _ => dsn.to_string(),
    }
}
