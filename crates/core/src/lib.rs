//! Cascadia Core - variant assembly and build pipeline for the
//! Cascadia font family.

pub mod compile;
pub mod config;
pub mod designspace;
pub mod donor;
pub mod font;
pub mod io;
pub mod merge;
pub mod pipeline;
pub mod prepare;
pub mod variants;

pub use cascadia_cvar_builder::{AxisCoordinate, ControlValueRecord};
pub use compile::{CompiledFont, OutlineCompiler, OutputFormat};
pub use config::{BuildConfig, BuildOptions, ToolConfig};
pub use designspace::{Axis, DesignDocument, InstanceDescriptor, Instantiator};
pub use font::{FontMetadata, Glyph, GlyphName, GlyphSet, MasterFont};
pub use merge::{glyph_name_for_codepoint, merge_glyph_set};
pub use pipeline::{
    BuildObserver, BuildStage, BuildSummary, ExternalTools, LogObserver, PipelineContext,
    ToolRunner, run_build,
};
pub use prepare::{FontPreparer, PrepareSources};
pub use variants::{Variant, VariantFlags, resolve_variants};
