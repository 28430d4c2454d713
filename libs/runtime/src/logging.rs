use crate::config::{LoggingConfig, Section};
use std::collections::HashMap;
use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use file_rotate::{
    compression::Compression,
    suffix::{AppendTimestamp, FileLimit},
    ContentLimit, FileRotate,
};
use parking_lot::Mutex;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    filter::Targets, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer, Registry,
};

const DEFAULT_SECTION: &str = "default";
const DEFAULT_MAX_SIZE_MB: u64 = 100;
const DEFAULT_MAX_BACKUPS: usize = 3;

/// `off`/`none` disable output; unknown strings fall back to `info`.
fn parse_level(s: &str) -> LevelFilter {
    match s.trim().to_ascii_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        "off" | "none" => LevelFilter::OFF,
        _ => LevelFilter::INFO,
    }
}

/// File level of a section; an empty value inherits the console level.
fn file_level(section: &Section) -> LevelFilter {
    if section.file_level.trim().is_empty() {
        parse_level(&section.console_level)
    } else {
        parse_level(&section.file_level)
    }
}

/// `target == prefix` or `target` starts with `prefix::`.
fn matches_prefix(target: &str, prefix: &str) -> bool {
    target
        .strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

/// Relative log paths live under the server home directory.
fn resolve_log_path(file: &str, base_dir: &Path) -> PathBuf {
    let p = Path::new(file);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}

#[derive(Clone)]
struct RotatingFile(Arc<Mutex<FileRotate<AppendTimestamp>>>);

impl RotatingFile {
    fn open(path: &Path, section: &Section) -> std::io::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let max_bytes = section.max_size_mb.unwrap_or(DEFAULT_MAX_SIZE_MB) * 1024 * 1024;
        let backups = section.max_backups.unwrap_or(DEFAULT_MAX_BACKUPS);
        let rot = FileRotate::new(
            path,
            AppendTimestamp::default(FileLimit::MaxFiles(backups)),
            ContentLimit::BytesSurpassed(max_bytes as usize),
            Compression::None,
            #[cfg(unix)]
            None,
        );
        Ok(Self(Arc::new(Mutex::new(rot))))
    }
}

/// Writer for one record; `None` swallows the bytes.
struct RecordWriter(Option<RotatingFile>);

impl Write for RecordWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &self.0 {
            Some(f) => f.0.lock().write(buf),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &self.0 {
            Some(f) => f.0.lock().flush(),
            None => Ok(()),
        }
    }
}

/// Picks the log file for a record by the longest matching subsystem prefix.
#[derive(Clone, Default)]
struct FileRouter {
    fallback: Option<RotatingFile>,
    by_prefix: Vec<(String, RotatingFile)>,
}

impl FileRouter {
    fn route(&self, target: &str) -> Option<RotatingFile> {
        self.by_prefix
            .iter()
            .filter(|(prefix, _)| matches_prefix(target, prefix))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, f)| f.clone())
            .or_else(|| self.fallback.clone())
    }

    fn is_empty(&self) -> bool {
        self.fallback.is_none() && self.by_prefix.is_empty()
    }
}

impl<'a> fmt::MakeWriter<'a> for FileRouter {
    type Writer = RecordWriter;

    fn make_writer(&'a self) -> Self::Writer {
        RecordWriter(self.fallback.clone())
    }

    fn make_writer_for(&'a self, meta: &tracing::Metadata<'_>) -> Self::Writer {
        RecordWriter(self.route(meta.target()))
    }
}

/// Console and file target filters plus the file router for a config.
struct Plan {
    console: Targets,
    file: Targets,
    router: FileRouter,
}

fn plan(cfg: &LoggingConfig, base_dir: &Path) -> Plan {
    let default = cfg.get(DEFAULT_SECTION);

    let mut console = Targets::new().with_default(
        default
            .map(|s| parse_level(&s.console_level))
            .unwrap_or(LevelFilter::OFF),
    );
    let mut router = FileRouter::default();
    let mut opened: HashMap<PathBuf, RotatingFile> = HashMap::new();
    let mut open = |section: &Section, who: &str| -> Option<RotatingFile> {
        if section.file.trim().is_empty() {
            return None;
        }
        let path = resolve_log_path(&section.file, base_dir);
        if let Some(existing) = opened.get(&path) {
            return Some(existing.clone());
        }
        match RotatingFile::open(&path, section) {
            Ok(f) => {
                opened.insert(path, f.clone());
                Some(f)
            }
            Err(e) => {
                eprintln!("cannot open log file for '{who}' at {}: {e}", path.display());
                None
            }
        }
    };

    router.fallback = default.and_then(|s| open(s, DEFAULT_SECTION));
    let mut file = Targets::new().with_default(match (default, &router.fallback) {
        (Some(s), Some(_)) => file_level(s),
        _ => LevelFilter::OFF,
    });

    for (name, section) in cfg.iter().filter(|(k, _)| k.as_str() != DEFAULT_SECTION) {
        console = console.with_target(name.clone(), parse_level(&section.console_level));
        match open(section, name) {
            Some(f) => {
                router.by_prefix.push((name.clone(), f));
                file = file.with_target(name.clone(), file_level(section));
            }
            // No own file: its records follow the default file rules.
            None if router.fallback.is_some() => {
                file = file.with_target(name.clone(), file_level(section));
            }
            None => file = file.with_target(name.clone(), LevelFilter::OFF),
        }
    }

    Plan {
        console,
        file,
        router,
    }
}

/// Install the global subscriber.
///
/// Console output is human readable, file output is JSON; both use RFC 3339
/// UTC timestamps. `base_dir` anchors relative log file paths (the server home).
/// Calling it again is a no-op.
pub fn init_logging_from_config(cfg: &LoggingConfig, base_dir: &Path) {
    // Bridge `log` records before the subscriber goes in.
    let _ = tracing_log::LogTracer::init();

    if cfg.is_empty() {
        let _ = fmt()
            .with_target(true)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .try_init();
        return;
    }

    let Plan {
        console,
        file,
        router,
    } = plan(cfg, base_dir);

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    layers.push(
        fmt::layer()
            .with_ansi(std::io::stdout().is_terminal())
            .with_target(true)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .with_filter(console)
            .boxed(),
    );
    if !router.is_empty() {
        layers.push(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_target(true)
                .with_current_span(true)
                .with_timer(fmt::time::UtcTime::rfc_3339())
                .with_writer(router)
                .with_filter(file)
                .boxed(),
        );
    }

    let _ = Registry::default().with(layers).try_init();
}
