use crate::error::{ConfigError, RenderError};
use crate::models::{AppConfig, MathMode, RenderRequest, Toolchain};
use crate::rendering::build_document;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio::process::Command;

const SOURCE_FILE: &str = "eqn.tex";
const PDF_FILE: &str = "eqn.pdf";
const OUTPUT_FILE: &str = "eqn.png";

const PDFLATEX: &str = "pdflatex";
const GHOSTSCRIPT: &str = "gs";

/// Equation render service: LaTeX source -> pdflatex -> Ghostscript -> PNG.
///
/// Every call gets its own scratch directory, removed when the call ends
/// regardless of outcome. The service itself holds only immutable settings
/// and can be shared freely between concurrent requests.
pub struct RenderService {
    toolchain: Toolchain,
    work_dir: Option<PathBuf>,
    timeout: Duration,
    dpi_range: RangeInclusive<i64>,
}

/// Exit status and combined stdout/stderr of one tool run
struct ToolOutput {
    status: ExitStatus,
    log: String,
}

impl RenderService {
    /// Resolve the toolchain from `config`. Fails if either tool is missing.
    pub fn new(config: &AppConfig) -> Result<Self, ConfigError> {
        let toolchain = config.resolve_toolchain()?;
        tracing::info!(
            pdflatex = %toolchain.pdflatex.display(),
            gs = %toolchain.ghostscript.display(),
            "Resolved external tools"
        );
        Ok(Self::with_toolchain(toolchain, config))
    }

    pub fn with_toolchain(toolchain: Toolchain, config: &AppConfig) -> Self {
        Self {
            toolchain,
            work_dir: config.work_dir.clone(),
            timeout: config.timeout(),
            dpi_range: config.min_dpi..=config.max_dpi,
        }
    }

    pub fn toolchain(&self) -> &Toolchain {
        &self.toolchain
    }

    pub async fn render_request(&self, request: &RenderRequest) -> Result<Vec<u8>, RenderError> {
        self.render(&request.tex, request.mode(), request.dpi).await
    }

    /// Render `tex` to PNG bytes.
    pub async fn render(&self, tex: &str, mode: MathMode, dpi: i64) -> Result<Vec<u8>, RenderError> {
        if tex.trim().is_empty() {
            return Err(RenderError::Validation("empty tex".to_string()));
        }
        if !self.dpi_range.contains(&dpi) {
            return Err(RenderError::Validation(format!(
                "dpi must be between {} and {}",
                self.dpi_range.start(),
                self.dpi_range.end()
            )));
        }

        let started_at = Instant::now();
        let is_display = mode == MathMode::Display;
        let scope = self.create_scope()?;
        let result = self.run_pipeline(scope.path(), tex, mode, dpi).await;

        match &result {
            Ok(png) => tracing::info!(
                op = "render",
                result = "ok",
                elapsed_ms = started_at.elapsed().as_millis() as u64,
                display = is_display,
                dpi,
                png_bytes = png.len(),
                "Equation rendered"
            ),
            Err(e) => tracing::warn!(
                op = "render",
                result = "error",
                elapsed_ms = started_at.elapsed().as_millis() as u64,
                error = %e,
                "Equation render failed"
            ),
        }

        if let Err(e) = scope.close() {
            tracing::warn!(%e, "Failed to remove render scratch directory");
        }

        result
    }

    fn create_scope(&self) -> Result<TempDir, RenderError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("texpng-");
        let scope = match &self.work_dir {
            Some(dir) => builder.tempdir_in(dir)?,
            None => builder.tempdir()?,
        };
        tracing::debug!(scope = %scope.path().display(), "Created scratch directory");
        Ok(scope)
    }

    async fn run_pipeline(
        &self,
        scope: &Path,
        tex: &str,
        mode: MathMode,
        dpi: i64,
    ) -> Result<Vec<u8>, RenderError> {
        let tex_path = scope.join(SOURCE_FILE);
        tokio::fs::write(&tex_path, build_document(tex, mode)).await?;

        let mut pdflatex = Command::new(&self.toolchain.pdflatex);
        pdflatex
            .arg("-interaction=nonstopmode")
            .arg("-halt-on-error")
            .arg(&tex_path);
        let compiled = self.run_tool(PDFLATEX, pdflatex, scope).await?;
        if !compiled.status.success() {
            return Err(RenderError::Compile {
                exit_code: compiled.status.code(),
                log: compiled.log,
            });
        }

        let png_path = scope.join(OUTPUT_FILE);
        let mut output_arg = std::ffi::OsString::from("-sOutputFile=");
        output_arg.push(&png_path);

        let mut gs = Command::new(&self.toolchain.ghostscript);
        gs.args(["-dSAFER", "-dBATCH", "-dNOPAUSE", "-dQUIET"])
            .arg("-sDEVICE=pngalpha")
            .arg(format!("-r{dpi}"))
            .args(["-dTextAlphaBits=4", "-dGraphicsAlphaBits=4"])
            .arg(output_arg)
            .arg(scope.join(PDF_FILE));
        let rasterized = self.run_tool(GHOSTSCRIPT, gs, scope).await?;
        if !rasterized.status.success() {
            return Err(RenderError::Rasterize {
                exit_code: rasterized.status.code(),
                log: rasterized.log,
            });
        }

        Ok(tokio::fs::read(&png_path).await?)
    }

    /// Run one tool with cwd = `scope`, stdout and stderr both appended to
    /// a single capture file so the log keeps the tool's own interleaving.
    async fn run_tool(
        &self,
        tool: &'static str,
        mut command: Command,
        scope: &Path,
    ) -> Result<ToolOutput, RenderError> {
        let capture_path = scope.join(format!("{tool}.out"));
        let capture = std::fs::File::create(&capture_path)?;

        command
            .current_dir(scope)
            .stdin(Stdio::null())
            .stdout(Stdio::from(capture.try_clone()?))
            .stderr(Stdio::from(capture))
            .kill_on_drop(true);

        let started_at = Instant::now();
        let mut child = command
            .spawn()
            .map_err(|source| RenderError::Spawn { tool, source })?;

        let status = match tokio::time::timeout(self.timeout, child.wait()).await {
            Ok(status) => status?,
            Err(_) => {
                if let Err(e) = child.kill().await {
                    tracing::warn!(tool, %e, "Failed to kill timed out tool");
                }
                return Err(RenderError::Timeout {
                    tool,
                    seconds: self.timeout.as_secs(),
                });
            }
        };

        let log = String::from_utf8_lossy(&tokio::fs::read(&capture_path).await?).into_owned();

        tracing::debug!(
            tool,
            exit_code = status.code().unwrap_or(-1),
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            log_bytes = log.len(),
            "External tool finished"
        );

        Ok(ToolOutput { status, log })
    }
}
