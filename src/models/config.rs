use crate::error::ConfigError;
use serde::Deserialize;
use std::ffi::OsString;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration loaded from an optional YAML file plus
/// environment overrides. Built once at startup and never mutated.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    /// Listening address, must be loopback
    pub bind_addr: String,

    /// pdflatex executable (bare name looked up on PATH, or a path)
    pub pdflatex: String,

    /// Ghostscript executable (bare name looked up on PATH, or a path)
    pub ghostscript: String,

    /// Parent directory for per-request scratch directories
    pub work_dir: Option<PathBuf>,

    /// Wall-clock limit for each external tool invocation
    pub timeout_secs: u64,

    pub min_dpi: i64,
    pub max_dpi: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8765".to_string(),
            pdflatex: "pdflatex".to_string(),
            ghostscript: "gs".to_string(),
            work_dir: None,
            timeout_secs: 30,
            min_dpi: 50,
            max_dpi: 2400,
        }
    }
}

/// Absolute paths of the two external tools, resolved at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub pdflatex: PathBuf,
    pub ghostscript: PathBuf,
}

impl AppConfig {
    /// Load from `$CONFIG_FILE` (if set) and apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var("CONFIG_FILE") {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        tracing::info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Apply `BIND_ADDR`, `PDFLATEX`, `GHOSTSCRIPT` and `TEXPNG_WORK_DIR`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("BIND_ADDR") {
            self.bind_addr = v;
        }
        if let Some(v) = lookup("PDFLATEX") {
            self.pdflatex = v;
        }
        if let Some(v) = lookup("GHOSTSCRIPT") {
            self.ghostscript = v;
        }
        if let Some(v) = lookup("TEXPNG_WORK_DIR") {
            self.work_dir = Some(PathBuf::from(v));
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_dpi < 1 || self.min_dpi > self.max_dpi {
            return Err(ConfigError::InvalidDpiRange {
                min: self.min_dpi,
                max: self.max_dpi,
            });
        }
        self.socket_addr()?;
        Ok(())
    }

    /// Parsed listening address; non-loopback addresses are rejected.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr: SocketAddr = self
            .bind_addr
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddr(self.bind_addr.clone()))?;
        if !addr.ip().is_loopback() {
            return Err(ConfigError::NonLoopbackBind(addr));
        }
        Ok(addr)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn resolve_toolchain(&self) -> Result<Toolchain, ConfigError> {
        let path_var = std::env::var_os("PATH");
        Ok(Toolchain {
            pdflatex: resolve_executable("pdflatex", &self.pdflatex, path_var.as_ref())?,
            ghostscript: resolve_executable("gs", &self.ghostscript, path_var.as_ref())?,
        })
    }
}

/// Resolve a configured executable. Values containing a path separator are
/// taken as paths; bare names are searched for in `path_var`.
pub fn resolve_executable(
    tool: &'static str,
    configured: &str,
    path_var: Option<&OsString>,
) -> Result<PathBuf, ConfigError> {
    let not_found = || ConfigError::ToolNotFound {
        tool,
        path: configured.to_string(),
    };

    if configured.is_empty() {
        return Err(not_found());
    }

    let candidate = Path::new(configured);
    if candidate.components().count() > 1 || candidate.is_absolute() {
        return if candidate.is_file() {
            Ok(candidate.to_path_buf())
        } else {
            Err(not_found())
        };
    }

    path_var
        .into_iter()
        .flat_map(std::env::split_paths)
        .map(|dir| dir.join(configured))
        .find(|p| p.is_file())
        .ok_or_else(not_found)
}
