//! Build configuration.
//!
//! All paths, toggles, and tool names live in one immutable value
//! constructed by the caller and passed by reference; nothing in the
//! pipeline reads ambient process state.

use std::path::PathBuf;

/// Base family name of the proportional/ligature variants.
pub const CODE_FAMILY: &str = "Cascadia Code";

/// Base family name of the mono (no-ligature) variants.
pub const MONO_FAMILY: &str = "Cascadia Mono";

/// OpenType vendor identifier stamped into unique name IDs.
pub const VENDOR_ID: &str = "SAAR";

/// Family-wide PANOSE classification (Latin Text, monospaced).
pub const PANOSE: [u8; 10] = [2, 11, 6, 9, 2, 0, 0, 2, 0, 4];

/// Which build branches execute. All default to on except the
/// optional ones.
#[derive(Debug, Clone, Copy)]
pub struct BuildOptions {
    pub powerline: bool,
    pub mono: bool,
    pub nerd_fonts: bool,
    pub italic: bool,
    pub static_instances: bool,
    pub compile_hints: bool,
    pub web_fonts: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            powerline: true,
            mono: true,
            nerd_fonts: true,
            italic: true,
            static_instances: false,
            compile_hints: true,
            web_fonts: false,
        }
    }
}

/// Names of the external executables the post-processing stages spawn.
#[derive(Debug, Clone)]
pub struct ToolConfig {
    /// Sequential-lane TTF hinter (needs a reference file).
    pub ttf_autohinter: String,
    /// Parallel-lane OTF hinter.
    pub otf_autohinter: String,
    pub woff2_compressor: String,
    /// Helper executable bridging the design sources (see the cli crate).
    pub source_helper: String,
    /// Attempts per hinting invocation before the failure is reported.
    pub hint_attempts: u32,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            ttf_autohinter: "ttfautohint".to_string(),
            otf_autohinter: "psautohint".to_string(),
            woff2_compressor: "woff2_compress".to_string(),
            source_helper: "cascadia-sources".to_string(),
            hint_attempts: 2,
        }
    }
}

/// Immutable configuration for one build run.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Font binary carrying the precompiled hint tables for transfer.
    pub vtt_data: Option<PathBuf>,
    /// Compiled donor font for the Powerline glyph set.
    pub powerline_donor: PathBuf,
    /// Compiled donor fonts for the full symbol set (Nerd Font builds).
    pub symbol_donors: Vec<PathBuf>,
    pub version: String,
    pub options: BuildOptions,
    pub tools: ToolConfig,
}

impl BuildConfig {
    pub fn new(input_dir: PathBuf, output_dir: PathBuf) -> Self {
        let powerline_donor = input_dir.join("donors").join("powerline.ttf");
        Self {
            input_dir,
            output_dir,
            vtt_data: None,
            powerline_donor,
            symbol_donors: Vec::new(),
            version: "2404.23".to_string(),
            options: BuildOptions::default(),
            tools: ToolConfig::default(),
        }
    }

    /// Root of the static-instance output tree for a format.
    pub fn static_dir(&self, format: &str) -> PathBuf {
        self.output_dir.join(format).join("static")
    }

    /// Root of the variable-font output tree for a format.
    pub fn variable_dir(&self, format: &str) -> PathBuf {
        self.output_dir.join(format).join("variable")
    }
}
