// src/config/model.rs

use serde::Deserialize;

/// Top-level configuration as read from `Stoker.toml`.
///
/// ```toml
/// [watch]
/// path = "."
/// exclude = ["target", "vendor"]
/// extensions = ["rs"]
/// interval_ms = 200
///
/// [build]
/// command = "cargo build"
/// binary = "target/debug/myservice"
/// kill_on_error = false
///
/// [run]
/// immediate = true
/// args = ["--dev"]
///
/// [proxy]
/// listen = "127.0.0.1"
/// port = 3000
/// app_port = 3001
/// ```
///
/// Every section and field is optional; missing values fall back to the
/// CLI flags and built-in defaults in [`crate::config::Settings::resolve`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub watch: WatchSection,

    #[serde(default)]
    pub build: BuildSection,

    #[serde(default)]
    pub run: RunSection,

    #[serde(default)]
    pub proxy: ProxySection,
}

/// `[watch]` section: what to scan and how often.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WatchSection {
    /// Root directory to watch.
    #[serde(default)]
    pub path: Option<String>,

    /// Directory names whose subtrees are never scanned.
    #[serde(default)]
    pub exclude: Option<Vec<String>>,

    /// File extensions that count as tracked source files.
    #[serde(default)]
    pub extensions: Option<Vec<String>>,

    /// Poll interval in milliseconds.
    #[serde(default)]
    pub interval_ms: Option<u64>,
}

/// `[build]` section: how the service binary is produced.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuildSection {
    /// Shell command that compiles the tree.
    #[serde(default)]
    pub command: Option<String>,

    /// Path of the binary the command produces.
    #[serde(default)]
    pub binary: Option<String>,

    /// Exit stoker itself on any build or run failure.
    #[serde(default)]
    pub kill_on_error: Option<bool>,
}

/// `[run]` section: how the child process is started.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunSection {
    /// Start the child right after each successful build instead of on the
    /// first inbound request.
    #[serde(default)]
    pub immediate: Option<bool>,

    /// Arguments passed to the child binary.
    #[serde(default)]
    pub args: Option<Vec<String>>,
}

/// `[proxy]` section: where the proxy listens and where the child serves.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProxySection {
    /// Listen address for the proxy; empty means all interfaces.
    #[serde(default)]
    pub listen: Option<String>,

    /// Proxy listen port.
    #[serde(default)]
    pub port: Option<u16>,

    /// Port the child service listens on (exported as `PORT`).
    #[serde(default)]
    pub app_port: Option<u16>,
}
