use crate::config::{Config, DebugLogRotation};
use anyhow::{Context, Result};
use regex::Regex;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::EnvFilter;

const LOG_FILE_NAME: &str = "newsdesk-debug.log";
const DEFAULT_FILTER: &str = "newsdesk=debug,warn";

/// Keeps the non-blocking writer flushing until dropped
pub struct LogGuard(#[allow(dead_code)] WorkerGuard);

/// Initialize debug logging.
///
/// When `debug` is enabled, logs are written to `~/.config/newsdesk/newsdesk-debug.log` by default.
/// When `debug` is disabled, this is a no-op.
pub fn init(config: &Config) -> Result<Option<LogGuard>> {
    if !config.debug {
        return Ok(None);
    }

    let rotation = config.debug_log_rotation.unwrap_or(DebugLogRotation::Session);
    let keep = config.debug_log_keep;
    let base = resolve_base_log_path(config.debug_log_path.as_deref())?;

    let (writer, log_path_for_display, guard): (NonBlocking, PathBuf, WorkerGuard) = match rotation {
        DebugLogRotation::None => {
            let file = open_append(&base)?;
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            (non_blocking, base, guard)
        }
        DebugLogRotation::Daily => {
            let (dir, base_name) = split_dir_and_name(&base)?;
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;

            cleanup_rotated_logs(&dir, RotationKind::Daily { base_name: base_name.clone() }, keep)?;

            let appender = tracing_appender::rolling::daily(&dir, &base_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            (non_blocking, base, guard)
        }
        DebugLogRotation::Session => {
            let (dir, base_name) = split_dir_and_name(&base)?;
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;

            cleanup_rotated_logs(&dir, RotationKind::Session { base_name: base_name.clone() }, keep)?;

            let session_path = build_session_log_path(&dir, &base_name);
            let file = open_append(&session_path)?;
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            (non_blocking, session_path, guard)
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_ansi(false)
        .with_target(true)
        .with_writer(writer)
        .try_init()
        .ok(); // Already initialized (tests, or --verbose won the race)

    tracing::info!("debug logging enabled");
    tracing::info!(log_file = %log_path_for_display.display(), rotation = ?rotation, "writing logs to file");

    Ok(Some(LogGuard(guard)))
}

/// Log to stderr instead of a file. Used by `--verbose`.
pub fn init_stderr() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}

/// `RUST_LOG` when set, otherwise debug for this crate and warn for everything else
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))
        .unwrap_or_else(|_| EnvFilter::new("debug"))
}

fn open_append(path: &Path) -> Result<std::fs::File> {
    ensure_parent_dir(path)?;
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))
}

fn default_log_path() -> Result<PathBuf> {
    Ok(crate::config::config_dir()?.join(LOG_FILE_NAME))
}

fn resolve_base_log_path(config_value: Option<&str>) -> Result<PathBuf> {
    let Some(raw) = config_value.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return default_log_path();
    };

    let path = PathBuf::from(crate::config::expand_tilde(raw));

    // Trailing separator or an existing directory: put the default file name inside.
    if raw.ends_with(std::path::MAIN_SEPARATOR) || path.is_dir() {
        return Ok(path.join(LOG_FILE_NAME));
    }

    Ok(path)
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
    }
    Ok(())
}

fn split_dir_and_name(path: &Path) -> Result<(PathBuf, String)> {
    let dir = path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));
    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .context("Invalid debug_log_path: not valid UTF-8")?
        .to_string();
    Ok((dir, name))
}

fn build_session_log_path(dir: &Path, base_name: &str) -> PathBuf {
    let ts = chrono::Local::now().format("%Y%m%d-%H%M%S").to_string();
    dir.join(format!("{base_name}.session-{ts}"))
}

enum RotationKind {
    Daily { base_name: String },
    Session { base_name: String },
}

fn cleanup_rotated_logs(dir: &Path, kind: RotationKind, keep: Option<usize>) -> Result<()> {
    let keep = keep.unwrap_or(match kind {
        RotationKind::Daily { .. } => 7,
        RotationKind::Session { .. } => 20,
    });

    if keep == 0 {
        return Ok(());
    }

    let prefix = match &kind {
        // tracing_appender::rolling::daily uses: `{base_name}.{YYYY-MM-DD}`
        RotationKind::Daily { base_name } => format!("{base_name}."),
        RotationKind::Session { base_name } => format!("{base_name}.session-"),
    };

    let mut candidates: Vec<String> = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read log directory: {}", dir.display()))?
    {
        let entry = entry?;
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else { continue };
        if name.starts_with(&prefix) {
            candidates.push(name.to_string());
        }
    }

    // newest first (lexicographic works for both suffix formats)
    candidates.sort_unstable_by(|a, b| b.cmp(a));

    for name in candidates.iter().skip(keep) {
        let path = dir.join(name);
        if let Err(e) = std::fs::remove_file(&path) {
            tracing::debug!(error = %e, file = %path.display(), "failed to remove old log file");
        }
    }

    Ok(())
}

fn credential_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\b(api[-_]?key)=[^&\s#]+").expect("credential pattern is valid")
    })
}

/// Mask API keys carried as query parameters (`apiKey=`, `api-key=`, `apikey=`).
pub fn redact_secrets(input: &str) -> String {
    credential_pattern()
        .replace_all(input, "${1}=***REDACTED***")
        .into_owned()
}
