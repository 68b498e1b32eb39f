//! Metrics snapshot provider.
//!
//! Reads host state from `/proc` and `/sys` on Linux and through `sysctl`,
//! `df` and `system_profiler` where files are not available. Each probe is
//! independent: a failure marks that field unavailable and the others are
//! still collected. Nothing is retried.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Deserialize;

use crate::core::cli_runner::run_checked;
use crate::core::http::{build_client, fetch_json};
use crate::core::models::{
    CpuMetrics, DiskMetrics, DocumentStoreMetrics, LoadedModel, MemoryMetrics, MetricsSnapshot,
    ModelDaemonMetrics, Probe, SwapMetrics, TemperatureMetrics,
};
use crate::error::{Result, StatusError};
use crate::storage::ResolvedConfig;
use crate::util::env::is_macos;

/// Reason recorded when the model daemon probe is switched off in config.
pub const DAEMON_DISABLED: &str = "model daemon probe disabled";

static PROFILER_TEMPERATURE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"CPU Temperature:\s*(-?\d+(?:[.,]\d+)?)\s*C").ok());

/// Where each probe reads from.
#[derive(Debug, Clone)]
pub struct SnapshotSources {
    pub proc_root: PathBuf,
    pub sys_root: PathBuf,
    pub disk_mount: String,
    pub command_timeout: Duration,
    /// `None` when the daemon probe is disabled.
    pub model_daemon: Option<DaemonEndpoint>,
    pub document_store: PathBuf,
}

#[derive(Debug, Clone)]
pub struct DaemonEndpoint {
    pub url: String,
    pub timeout: Duration,
}

impl SnapshotSources {
    #[must_use]
    pub fn from_config(config: &ResolvedConfig) -> Self {
        let system = &config.file.system;
        let daemon = &config.file.model_daemon;
        Self {
            proc_root: system.proc_root.clone(),
            sys_root: system.sys_root.clone(),
            disk_mount: system.disk_mount.clone(),
            command_timeout: system.command_timeout(),
            model_daemon: daemon.enabled.then(|| DaemonEndpoint {
                url: daemon.endpoint.trim_end_matches('/').to_string(),
                timeout: daemon.timeout(),
            }),
            document_store: config.document_store_path.clone(),
        }
    }
}

/// Collect one snapshot. Probes run one after another.
pub async fn capture(sources: &SnapshotSources, captured_at: DateTime<Utc>) -> MetricsSnapshot {
    let (memory, swap) = probe_memory(&sources.proc_root);
    let cpu = probe_cpu(sources).await.into();
    let disk = probe_disk(&sources.disk_mount, sources.command_timeout)
        .await
        .into();
    let temperature = probe_temperature(sources).await.into();
    let model_daemon = match &sources.model_daemon {
        Some(endpoint) => probe_model_daemon(endpoint).await.into(),
        None => Probe::unavailable(DAEMON_DISABLED),
    };
    let document_store = probe_document_store(&sources.document_store).into();

    let snapshot = MetricsSnapshot {
        captured_at,
        memory,
        swap,
        cpu,
        disk,
        temperature,
        model_daemon,
        document_store,
    };

    for (source, reason) in snapshot.unavailable_sources() {
        tracing::info!(source, reason, "metric unavailable");
    }
    snapshot
}

// =============================================================================
// Memory and swap
// =============================================================================

fn probe_memory(proc_root: &Path) -> (Probe<MemoryMetrics>, Probe<SwapMetrics>) {
    let path = proc_root.join("meminfo");
    match fs::read_to_string(&path) {
        Ok(content) => (
            parse_meminfo_memory(&content).into(),
            parse_meminfo_swap(&content).into(),
        ),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "meminfo not readable");
            let reason = if is_macos() {
                "memory statistics are not available on macOS".to_string()
            } else {
                format!("cannot read {}: {e}", path.display())
            };
            (Probe::unavailable(&reason), Probe::unavailable(&reason))
        }
    }
}

/// Value of a `Key:   1234 kB` line, in bytes.
fn meminfo_field(content: &str, key: &str) -> Option<u64> {
    content.lines().find_map(|line| {
        let (name, rest) = line.split_once(':')?;
        if name.trim() != key {
            return None;
        }
        let mut parts = rest.split_whitespace();
        let value: u64 = parts.next()?.parse().ok()?;
        match parts.next() {
            Some("kB") => Some(value * 1024),
            None => Some(value),
            Some(_) => None,
        }
    })
}

fn meminfo_error(key: &str) -> StatusError {
    StatusError::Parse {
        what: "meminfo".to_string(),
        message: format!("missing {key}"),
    }
}

/// Memory usage from `/proc/meminfo` contents.
///
/// Kernels older than 3.14 lack `MemAvailable`; `MemFree + Buffers + Cached`
/// is used there.
pub fn parse_meminfo_memory(content: &str) -> Result<MemoryMetrics> {
    let total = meminfo_field(content, "MemTotal").ok_or_else(|| meminfo_error("MemTotal"))?;
    let available = meminfo_field(content, "MemAvailable")
        .or_else(|| {
            let free = meminfo_field(content, "MemFree")?;
            Some(
                free + meminfo_field(content, "Buffers").unwrap_or(0)
                    + meminfo_field(content, "Cached").unwrap_or(0),
            )
        })
        .ok_or_else(|| meminfo_error("MemAvailable"))?
        .min(total);

    if total == 0 {
        return Err(StatusError::Parse {
            what: "meminfo".to_string(),
            message: "MemTotal is zero".to_string(),
        });
    }

    let used = total - available;
    Ok(MemoryMetrics {
        total_bytes: total,
        used_bytes: used,
        available_bytes: available,
        used_percent: percent(used, total),
    })
}

/// Swap usage from `/proc/meminfo` contents. No swap is reported as 0 %.
pub fn parse_meminfo_swap(content: &str) -> Result<SwapMetrics> {
    let total = meminfo_field(content, "SwapTotal").ok_or_else(|| meminfo_error("SwapTotal"))?;
    let free = meminfo_field(content, "SwapFree")
        .ok_or_else(|| meminfo_error("SwapFree"))?
        .min(total);
    let used = total - free;
    Ok(SwapMetrics {
        total_bytes: total,
        used_bytes: used,
        used_percent: percent(used, total),
    })
}

#[expect(clippy::cast_precision_loss)]
fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

// =============================================================================
// CPU
// =============================================================================

async fn probe_cpu(sources: &SnapshotSources) -> Result<CpuMetrics> {
    let path = sources.proc_root.join("loadavg");
    let (load_1m, load_5m, load_15m) = match fs::read_to_string(&path) {
        Ok(content) => parse_loadavg(&content)?,
        Err(e) if is_macos() => {
            tracing::debug!(error = %e, "no loadavg file, asking sysctl");
            let out = run_checked("sysctl", &["-n", "vm.loadavg"], sources.command_timeout).await?;
            parse_loadavg(&out)?
        }
        Err(e) => return Err(StatusError::unavailable("cpu", format!("{}: {e}", path.display()))),
    };

    Ok(CpuMetrics {
        load_1m,
        load_5m,
        load_15m,
        cores: std::thread::available_parallelism().ok().map(usize::from),
    })
}

/// First three load averages from `/proc/loadavg` or `sysctl -n vm.loadavg`.
///
/// The sysctl form wraps the values in braces: `{ 1.52 1.71 1.80 }`.
pub fn parse_loadavg(content: &str) -> Result<(f64, f64, f64)> {
    let values: Vec<f64> = content
        .split_whitespace()
        .filter(|token| *token != "{" && *token != "}")
        .take(3)
        .map(|token| token.replace(',', ".").parse::<f64>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|e| StatusError::Parse {
            what: "loadavg".to_string(),
            message: e.to_string(),
        })?;

    match values[..] {
        [a, b, c] => Ok((a, b, c)),
        _ => Err(StatusError::Parse {
            what: "loadavg".to_string(),
            message: format!("expected three load averages in {:?}", content.trim()),
        }),
    }
}

// =============================================================================
// Disk
// =============================================================================

async fn probe_disk(mount: &str, timeout: Duration) -> Result<DiskMetrics> {
    let out = run_checked("df", &["-Pk", mount], timeout).await?;
    parse_df(&out, mount)
}

/// Parse `df -Pk` output. The last line holds the filesystem row:
/// `Filesystem 1024-blocks Used Available Capacity Mounted-on`.
///
/// Used percent follows `df`: `used / (used + available)`, which leaves out
/// blocks reserved for root.
pub fn parse_df(output: &str, mount: &str) -> Result<DiskMetrics> {
    let parse_error = |message: String| StatusError::Parse {
        what: "df".to_string(),
        message,
    };

    let row = output
        .lines()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .last()
        .ok_or_else(|| parse_error("no filesystem row".to_string()))?;

    let fields: Vec<&str> = row.split_whitespace().collect();
    if fields.len() < 6 {
        return Err(parse_error(format!("short row: {row:?}")));
    }

    let number = |field: &str| {
        field
            .parse::<u64>()
            .map_err(|e| parse_error(format!("{field:?}: {e}")))
    };
    let total_kb = number(fields[1])?;
    let used_kb = number(fields[2])?;
    let available_kb = number(fields[3])?;

    Ok(DiskMetrics {
        mount: mount.to_string(),
        total_bytes: total_kb * 1024,
        free_bytes: available_kb * 1024,
        used_percent: percent(used_kb, used_kb + available_kb),
    })
}

// =============================================================================
// Temperature
// =============================================================================

async fn probe_temperature(sources: &SnapshotSources) -> Result<TemperatureMetrics> {
    if is_macos() {
        let out = run_checked(
            "system_profiler",
            &["SPPowerDataType"],
            sources.command_timeout,
        )
        .await?;
        return parse_profiler_temperature(&out)
            .map(|cpu_celsius| TemperatureMetrics { cpu_celsius })
            .ok_or_else(|| {
                StatusError::unavailable("temperature", "no CPU Temperature line in system_profiler")
            });
    }

    read_thermal_zones(&sources.sys_root.join("class/thermal"))
        .map(|cpu_celsius| TemperatureMetrics { cpu_celsius })
}

/// Highest reading across `thermal_zone*/temp`.
fn read_thermal_zones(thermal_dir: &Path) -> Result<f64> {
    let entries = fs::read_dir(thermal_dir).map_err(|e| {
        StatusError::unavailable("temperature", format!("{}: {e}", thermal_dir.display()))
    })?;

    entries
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_name().to_string_lossy().starts_with("thermal_zone"))
        .filter_map(|entry| fs::read_to_string(entry.path().join("temp")).ok())
        .filter_map(|raw| parse_thermal_millidegrees(&raw))
        .reduce(f64::max)
        .ok_or_else(|| StatusError::unavailable("temperature", "no readable thermal zones"))
}

/// A sysfs thermal reading (`52000`) in degrees Celsius.
#[must_use]
#[expect(clippy::cast_precision_loss)]
pub fn parse_thermal_millidegrees(raw: &str) -> Option<f64> {
    let millidegrees: i64 = raw.trim().parse().ok()?;
    Some(millidegrees as f64 / 1000.0)
}

/// The `CPU Temperature: 52 C` line from `system_profiler`.
#[must_use]
pub fn parse_profiler_temperature(output: &str) -> Option<f64> {
    let re = PROFILER_TEMPERATURE.as_ref()?;
    let caps = re.captures(output)?;
    caps.get(1)?.as_str().replace(',', ".").parse().ok()
}

// =============================================================================
// Model daemon
// =============================================================================

#[derive(Debug, Deserialize)]
struct DaemonModelList {
    #[serde(default)]
    models: Vec<DaemonModel>,
}

#[derive(Debug, Deserialize)]
struct DaemonModel {
    name: String,
    #[serde(default)]
    size: u64,
    #[serde(default)]
    size_vram: Option<u64>,
}

/// Query the Ollama HTTP API: `/api/ps` for loaded models, `/api/tags` for
/// the installed count. Only a failing `/api/ps` makes the probe unavailable.
pub async fn probe_model_daemon(endpoint: &DaemonEndpoint) -> Result<ModelDaemonMetrics> {
    let client = build_client(endpoint.timeout)?;

    let running: DaemonModelList = fetch_json(
        &client,
        &format!("{}/api/ps", endpoint.url),
        endpoint.timeout,
    )
    .await
    .map_err(|e| StatusError::unavailable("model daemon", e))?;

    let installed_models = match fetch_json::<DaemonModelList>(
        &client,
        &format!("{}/api/tags", endpoint.url),
        endpoint.timeout,
    )
    .await
    {
        Ok(list) => Some(list.models.len()),
        Err(e) => {
            tracing::debug!(error = %e, "model listing failed");
            None
        }
    };

    let loaded_models: Vec<LoadedModel> = running
        .models
        .into_iter()
        .map(|m| LoadedModel {
            name: m.name,
            size_bytes: m.size,
            vram_bytes: m.size_vram,
        })
        .collect();
    let loaded_bytes = loaded_models.iter().map(|m| m.size_bytes).sum();

    Ok(ModelDaemonMetrics {
        endpoint: endpoint.url.clone(),
        installed_models,
        loaded_models,
        loaded_bytes,
    })
}

// =============================================================================
// Document store
// =============================================================================

/// Size and document count of the vector store.
///
/// A file is read as a JSON index with a `documents` array. A directory is
/// measured recursively and has no count.
pub fn probe_document_store(path: &Path) -> Result<DocumentStoreMetrics> {
    let metadata = fs::metadata(path).map_err(|e| {
        StatusError::unavailable("document store", format!("{}: {e}", path.display()))
    })?;

    let (size_bytes, document_count) = if metadata.is_dir() {
        (directory_size(path)?, None)
    } else {
        let content = fs::read(path)?;
        (metadata.len(), count_documents(&content))
    };

    Ok(DocumentStoreMetrics {
        path: path.display().to_string(),
        size_bytes,
        document_count,
    })
}

fn count_documents(content: &[u8]) -> Option<u64> {
    let value: serde_json::Value = match serde_json::from_slice(content) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, "document store index is not valid JSON");
            return None;
        }
    };
    value
        .get("documents")?
        .as_array()
        .map(|docs| docs.len() as u64)
}

fn directory_size(root: &Path) -> Result<u64> {
    let mut total = 0;
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                pending.push(entry.path());
            } else if file_type.is_file() {
                total += entry.metadata()?.len();
            }
        }
    }
    Ok(total)
}
