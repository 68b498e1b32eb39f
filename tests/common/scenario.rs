#![allow(dead_code)]

use std::path::PathBuf;

use assert_cmd::Command;
use server_status::test_utils::{LedgerRow, TestDir, create_test_ledger};

/// 16 GiB total, 8 GiB available, no swap used.
pub const MEMINFO_HALF_USED: &str = "MemTotal:       16777216 kB
MemFree:         2097152 kB
MemAvailable:    8388608 kB
Buffers:          524288 kB
Cached:          4194304 kB
SwapTotal:       4194304 kB
SwapFree:        4194304 kB
";

/// 16 GiB total, 1 GiB available: about 94 % used.
pub const MEMINFO_CRITICAL: &str = "MemTotal:       16777216 kB
MemAvailable:    1048576 kB
SwapTotal:       4194304 kB
SwapFree:        3145728 kB
";

/// Rows for March 2026.
pub const MARCH_ROWS: &[LedgerRow<'static>] = &[
    (
        "2026-03-02T10:00:00Z",
        "anthropic",
        "claude-haiku-4-5-20251001",
        Some("alpha"),
        1_000,
        500,
    ),
    (
        "2026-03-02 11:00:00",
        "ollama",
        "mistral-small3.1:24b",
        Some("beta"),
        2_000,
        1_000,
    ),
];

/// A fake host laid out in a temp dir.
pub struct Scenario {
    pub dir: TestDir,
    meminfo: String,
    ledger_rows: Option<Vec<LedgerRow<'static>>>,
    extra_config: String,
    outbox: Option<PathBuf>,
}

impl Scenario {
    pub fn new() -> Self {
        Self {
            dir: TestDir::new(),
            meminfo: MEMINFO_HALF_USED.to_string(),
            ledger_rows: None,
            extra_config: String::new(),
            outbox: None,
        }
    }

    #[must_use]
    pub fn meminfo(mut self, content: &str) -> Self {
        self.meminfo = content.to_string();
        self
    }

    #[must_use]
    pub fn ledger(mut self, rows: &[LedgerRow<'static>]) -> Self {
        self.ledger_rows = Some(rows.to_vec());
        self
    }

    /// Appended verbatim to the generated config file.
    #[must_use]
    pub fn config(mut self, toml: &str) -> Self {
        self.extra_config.push_str(toml);
        self
    }

    /// Outbox location handed over through `SERVER_STATUS_OUTBOX`.
    #[must_use]
    pub fn outbox_at(mut self, path: PathBuf) -> Self {
        self.outbox = Some(path);
        self
    }

    pub fn outbox_dir(&self) -> PathBuf {
        self.outbox
            .clone()
            .unwrap_or_else(|| self.dir.file_path("outbox"))
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.file_path("config.toml")
    }

    /// Outbox files, sorted by name.
    pub fn queued(&self) -> Vec<PathBuf> {
        let Ok(entries) = std::fs::read_dir(self.outbox_dir()) else {
            return Vec::new();
        };
        let mut files: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        files.sort();
        files
    }

    /// Write the fixture files and return a command for the binary.
    #[allow(deprecated)]
    pub fn command(&self) -> Command {
        self.dir.create_file("proc/meminfo", &self.meminfo);
        self.dir
            .create_file("proc/loadavg", "0.52 0.58 0.61 1/345 6789\n");
        std::fs::create_dir_all(self.dir.file_path("sys")).unwrap();

        let ledger = self.dir.file_path("token_usage.db");
        if let Some(rows) = &self.ledger_rows {
            create_test_ledger(&ledger, rows);
        }

        let config = format!(
            r#"[system]
proc_root = "{proc}"
sys_root = "{sys}"

[paths]
ledger = "{ledger}"
document_store = "{docs}"

[model_daemon]
enabled = false

{extra}"#,
            proc = self.dir.file_path("proc").display(),
            sys = self.dir.file_path("sys").display(),
            ledger = ledger.display(),
            docs = self.dir.file_path("index_data").display(),
            extra = self.extra_config,
        );
        std::fs::write(self.config_path(), config).unwrap();

        let mut cmd = Command::cargo_bin("server-status").unwrap();
        for key in [
            "SERVER_STATUS_CONFIG",
            "SERVER_STATUS_FORMAT",
            "SERVER_STATUS_VERBOSE",
            "SERVER_STATUS_PRETTY",
            "SERVER_STATUS_LEDGER",
            "SERVER_STATUS_LOG",
            "SERVER_STATUS_LOG_FORMAT",
            "SERVER_STATUS_LOG_FILE",
            "RUST_LOG",
        ] {
            cmd.env_remove(key);
        }
        cmd.env("NO_COLOR", "1")
            .env("SERVER_STATUS_OUTBOX", self.outbox_dir())
            .arg("--config")
            .arg(self.config_path());
        cmd
    }
}
