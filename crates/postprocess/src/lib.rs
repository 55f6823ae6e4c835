//! Wrappers around the external hinting and web-font compression
//! executables.
//!
//! Each invocation is an isolated, retryable unit: a failure is
//! reported to the caller, which decides whether siblings continue.
//! Nothing here spawns anything at test time; command construction is
//! separate from execution so it can be checked directly.

use std::{
    path::{Path, PathBuf},
    process::Command,
};

use anyhow::{Context, Result, bail};
use log::warn;

/// File-stem suffix marking an output that has already been hinted.
/// Files carrying it are excluded from further hinting passes.
pub const HINTED_MARKER: &str = "-hinted";

/// Whether a font file already carries the hinted naming marker.
pub fn is_hinted(path: &Path) -> bool {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .is_some_and(|stem| stem.ends_with(HINTED_MARKER))
}

/// The output path for a hinting pass over `input`.
pub fn hinted_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or_default();
    let extension = input
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("ttf");
    input.with_file_name(format!("{stem}{HINTED_MARKER}.{extension}"))
}

/// An external autohinting executable.
#[derive(Debug, Clone)]
pub struct Autohinter {
    program: String,
    retries: u32,
}

impl Autohinter {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            retries: 1,
        }
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries.max(1);
        self
    }

    /// Build the hinting command. A `reference` names an already
    /// finalized un-hinted file whose stem widths the tool reuses.
    pub fn command(&self, input: &Path, output: &Path, reference: Option<&Path>) -> Command {
        let mut command = Command::new(&self.program);
        if let Some(reference) = reference {
            command.arg("--reference").arg(reference);
        }
        command.arg(input).arg(output);
        command
    }

    pub fn run(&self, input: &Path, output: &Path, reference: Option<&Path>) -> Result<()> {
        run_with_retry(self.retries, &self.program, || {
            self.command(input, output, reference)
        })
        .with_context(|| format!("hinting failed for {}", input.display()))
    }
}

/// An external WOFF2 compression executable. The tool writes its
/// output next to the input with a `.woff2` extension.
#[derive(Debug, Clone)]
pub struct Woff2Compressor {
    program: String,
}

impl Woff2Compressor {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn command(&self, input: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command.arg(input);
        command
    }

    pub fn output_path(&self, input: &Path) -> PathBuf {
        input.with_extension("woff2")
    }

    pub fn run(&self, input: &Path) -> Result<PathBuf> {
        run_with_retry(1, &self.program, || self.command(input))
            .with_context(|| format!("web font conversion failed for {}", input.display()))?;
        Ok(self.output_path(input))
    }
}

fn run_with_retry(attempts: u32, program: &str, build: impl Fn() -> Command) -> Result<()> {
    let mut last_failure = String::new();
    for attempt in 1..=attempts {
        let status = build()
            .status()
            .with_context(|| format!("failed to launch '{program}'"))?;
        if status.success() {
            return Ok(());
        }
        last_failure = format!("'{program}' exited with {status}");
        if attempt < attempts {
            warn!("{last_failure} (attempt {attempt}/{attempts}), retrying");
        }
    }
    bail!("{last_failure}");
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;

    use super::*;

    fn args(command: &Command) -> Vec<OsString> {
        command.get_args().map(OsString::from).collect()
    }

    #[test]
    fn hinted_marker_detection() {
        assert!(is_hinted(Path::new("out/CascadiaCode-hinted.ttf")));
        assert!(!is_hinted(Path::new("out/CascadiaCode.ttf")));
    }

    #[test]
    fn hinted_path_appends_marker() {
        assert_eq!(
            hinted_path(Path::new("out/CascadiaMonoPL.ttf")),
            PathBuf::from("out/CascadiaMonoPL-hinted.ttf")
        );
    }

    #[test]
    fn autohint_command_includes_reference() {
        let hinter = Autohinter::new("ttfautohint");
        let command = hinter.command(
            Path::new("in.ttf"),
            Path::new("out.ttf"),
            Some(Path::new("CascadiaCode.ttf")),
        );
        assert_eq!(command.get_program(), "ttfautohint");
        assert_eq!(
            args(&command),
            vec![
                OsString::from("--reference"),
                OsString::from("CascadiaCode.ttf"),
                OsString::from("in.ttf"),
                OsString::from("out.ttf"),
            ]
        );
    }

    #[test]
    fn autohint_command_without_reference() {
        let hinter = Autohinter::new("psautohint");
        let command = hinter.command(Path::new("in.otf"), Path::new("out.otf"), None);
        assert_eq!(args(&command).len(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn retries_run_the_tool_the_configured_number_of_times() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::TempDir::new().unwrap();
        let script = dir.path().join("always-fails.sh");
        // The tool receives the input path first; appending to it
        // counts invocations.
        std::fs::write(&script, "#!/bin/sh\necho attempt >> \"$1\"\nexit 1\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let counter = dir.path().join("counter");
        let hinter = Autohinter::new(script.to_str().unwrap()).with_retries(3);
        let err = hinter
            .run(&counter, &dir.path().join("out.ttf"), None)
            .unwrap_err();

        let attempts = std::fs::read_to_string(&counter).unwrap();
        assert_eq!(attempts.lines().count(), 3);
        assert!(format!("{err:#}").contains("exited with"));
    }

    #[test]
    fn woff2_output_path() {
        let compressor = Woff2Compressor::new("woff2_compress");
        assert_eq!(
            compressor.output_path(Path::new("dist/CascadiaCode.ttf")),
            PathBuf::from("dist/CascadiaCode.woff2")
        );
    }
}
