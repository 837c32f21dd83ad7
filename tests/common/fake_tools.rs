//! Shell-script stand-ins for pdflatex and gs.
//!
//! Behavior is driven by marker words in the LaTeX expression:
//! - `FAILCOMPILE`: pdflatex prints a two-line log and exits 1
//! - `FAILRASTER`: gs prints to stderr and exits 1
//! - `NOOUTPUT`: gs exits 0 without writing the PNG
//!
//! Otherwise pdflatex copies the source to `eqn.pdf` and gs writes a PNG
//! signature followed by that "pdf", so each output carries its own input.
//! Every invocation appends the tool name to `calls.log`.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use texpng::models::{AppConfig, Toolchain};

pub const COMPILE_FAILURE_LOG: &str = "! Undefined control sequence.\nl.6 emergency stop\n";

const PDFLATEX_SCRIPT: &str = r#"#!/bin/sh
echo pdflatex >> "@CALLS@"
for a; do src="$a"; done
if grep -q FAILCOMPILE "$src"; then
  echo "! Undefined control sequence."
  echo "l.6 emergency stop" >&2
  exit 1
fi
cp "$src" eqn.pdf
"#;

const GS_SCRIPT: &str = r#"#!/bin/sh
echo gs >> "@CALLS@"
for a; do
  case "$a" in
    -sOutputFile=*) out="${a#-sOutputFile=}" ;;
  esac
  src="$a"
done
if grep -q FAILRASTER "$src"; then
  echo "GPL Ghostscript: Unrecoverable error" >&2
  exit 1
fi
if grep -q NOOUTPUT "$src"; then
  exit 0
fi
printf '\211PNG\r\n\032\n' > "$out"
cat "$src" >> "$out"
"#;

pub struct FakeToolchain {
    dir: TempDir,
    pub toolchain: Toolchain,
}

impl FakeToolchain {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("temp dir");
        fs::create_dir_all(dir.path().join("work")).expect("work dir");

        let calls = dir.path().join("calls.log");
        let calls = calls.display().to_string();
        let pdflatex = write_script(dir.path(), "pdflatex", &PDFLATEX_SCRIPT.replace("@CALLS@", &calls));
        let ghostscript = write_script(dir.path(), "gs", &GS_SCRIPT.replace("@CALLS@", &calls));

        Self {
            dir,
            toolchain: Toolchain {
                pdflatex,
                ghostscript,
            },
        }
    }

    /// Config pointing scratch directories at this toolchain's work dir
    pub fn config(&self) -> AppConfig {
        AppConfig {
            work_dir: Some(self.work_dir()),
            timeout_secs: 10,
            ..Default::default()
        }
    }

    pub fn work_dir(&self) -> PathBuf {
        self.dir.path().join("work")
    }

    /// Tool names in invocation order
    pub fn calls(&self) -> Vec<String> {
        fs::read_to_string(self.dir.path().join("calls.log"))
            .map(|s| s.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Entries left behind in the work dir
    pub fn leftovers(&self) -> Vec<PathBuf> {
        fs::read_dir(self.work_dir())
            .expect("read work dir")
            .map(|e| e.expect("dir entry").path())
            .collect()
    }
}

impl Default for FakeToolchain {
    fn default() -> Self {
        Self::new()
    }
}

fn write_script(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("write script");
    let mut perms = fs::metadata(&path).expect("metadata").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).expect("set perms");
    path
}
