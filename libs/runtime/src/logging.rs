use crate::config::{LoggingConfig, Section};
use std::{
    collections::HashMap,
    io::{IsTerminal, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{filter::Targets, fmt};

use file_rotate::{compression::Compression, suffix::AppendCount, ContentLimit, FileRotate};

const DEFAULT_MAX_SIZE_MB: u64 = 100;
const DEFAULT_MAX_BACKUPS: usize = 3;

/// "off"/"none" disable a sink; unknown strings fall back to INFO.
fn parse_level(s: &str) -> LevelFilter {
    match s.trim().to_ascii_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        "off" | "none" => LevelFilter::OFF,
        _ => LevelFilter::INFO,
    }
}

/// True if `target` is `prefix` itself or a path below it (`prefix::...`).
fn matches_prefix(target: &str, prefix: &str) -> bool {
    target
        .strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

// -------- rotating file sink --------

type SharedRotate = Arc<Mutex<FileRotate<AppendCount>>>;

#[derive(Clone)]
struct FileSink(SharedRotate);

impl Write for FileSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0
            .lock()
            .map_err(|_| std::io::Error::other("log file lock poisoned"))?
            .write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.0
            .lock()
            .map_err(|_| std::io::Error::other("log file lock poisoned"))?
            .flush()
    }
}

/// Writer that silently drops records which have no destination file.
struct MaybeSink(Option<FileSink>);

impl Write for MaybeSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.0 {
            Some(w) => w.write(buf),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.0 {
            Some(w) => w.flush(),
            None => Ok(()),
        }
    }
}

/// Picks the log file for a record by its target: the longest matching
/// subsystem prefix wins, otherwise the default file.
#[derive(Default)]
struct FileRouter {
    default: Option<FileSink>,
    by_prefix: Vec<(String, FileSink)>,
}

impl FileRouter {
    fn sink_for(&self, target: &str) -> Option<FileSink> {
        self.by_prefix
            .iter()
            .filter(|(prefix, _)| matches_prefix(target, prefix))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, sink)| sink.clone())
            .or_else(|| self.default.clone())
    }

    fn is_empty(&self) -> bool {
        self.default.is_none() && self.by_prefix.is_empty()
    }
}

impl<'a> fmt::MakeWriter<'a> for FileRouter {
    type Writer = MaybeSink;

    fn make_writer(&'a self) -> Self::Writer {
        MaybeSink(self.default.clone())
    }

    fn make_writer_for(&'a self, meta: &tracing::Metadata<'_>) -> Self::Writer {
        MaybeSink(self.sink_for(meta.target()))
    }
}

/// Relative paths are resolved against `base_dir` (the service home).
fn resolve_log_path(file: &str, base_dir: &Path) -> PathBuf {
    let p = Path::new(file);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}

fn open_file_sink(section: &Section, base_dir: &Path) -> std::io::Result<Option<FileSink>> {
    if section.file.trim().is_empty() {
        return Ok(None);
    }
    let path = resolve_log_path(&section.file, base_dir);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let max_bytes = section.max_size_mb.unwrap_or(DEFAULT_MAX_SIZE_MB) * 1024 * 1024;
    let rot = FileRotate::new(
        &path,
        AppendCount::new(section.max_backups.unwrap_or(DEFAULT_MAX_BACKUPS)),
        ContentLimit::BytesSurpassed(max_bytes as usize),
        Compression::None,
        #[cfg(unix)]
        None,
    );
    Ok(Some(FileSink(Arc::new(Mutex::new(rot)))))
}

// -------- filters --------

struct Plan {
    console: Targets,
    file: Targets,
    router: FileRouter,
}

fn build_plan(cfg: &LoggingConfig, base_dir: &Path) -> Plan {
    let default = cfg.get("default");

    let mut console = Targets::new().with_default(
        default
            .map(|s| parse_level(&s.console_level))
            .unwrap_or(LevelFilter::INFO),
    );
    let mut router = FileRouter::default();

    if let Some(section) = default {
        router.default = open_or_report("default", section, base_dir);
    }
    let default_file_level = match (default, router.default.is_some()) {
        (Some(section), true) => parse_level(&section.file_level),
        _ => LevelFilter::OFF,
    };
    let mut file = Targets::new().with_default(default_file_level);

    for (name, section) in cfg.iter().filter(|(k, _)| k.as_str() != "default") {
        console = console.with_target(name.clone(), parse_level(&section.console_level));

        match open_or_report(name, section, base_dir) {
            Some(sink) => {
                file = file.with_target(name.clone(), parse_level(&section.file_level));
                router.by_prefix.push((name.clone(), sink));
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

fn open_or_report(name: &str, section: &Section, base_dir: &Path) -> Option<FileSink> {
    match open_file_sink(section, base_dir) {
        Ok(sink) => sink,
        Err(e) => {
            // The subscriber is not installed yet.
            eprintln!(
                "Failed to open log file '{}' for '{}': {}",
                section.file, name, e
            );
            None
        }
    }
}

// -------- public init --------

/// Install the global subscriber.
///
/// Console output is human readable; file output is JSON, one file per
/// configured subsystem with `default` as the catch-all. `base_dir` is used to
/// resolve relative log paths (normally `server.home_dir`).
pub fn init_logging_from_config(cfg: &LoggingConfig, base_dir: &Path) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer, Registry};

    // Bridge `log` records before the subscriber goes in.
    let _ = tracing_log::LogTracer::init();

    let plan = build_plan(cfg, base_dir);
    let ansi = std::io::stdout().is_terminal();

    let console_layer = fmt::layer()
        .with_ansi(ansi)
        .with_target(true)
        .with_level(true)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_filter(plan.console);

    let file_layer = (!plan.router.is_empty()).then(|| {
        fmt::layer()
            .json()
            .with_ansi(false)
            .with_target(true)
            .with_level(true)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .with_writer(plan.router)
            .with_filter(plan.file)
    });

    let _ = Registry::default()
        .with(console_layer)
        .with(file_layer)
        .try_init();
}
