//! Build orchestration.
//!
//! Four stages with strict barriers between them: parallel variant
//! compilation, family-wide table fix-up, hinting (one parallel lane,
//! one sequential lane with a shared reference file), and optional
//! web-font conversion. Every stage-1 task works on its own clone of
//! the design document, so no locking is needed anywhere.

pub mod fixup;

use std::{
    path::{Path, PathBuf},
    time::Instant,
};

use anyhow::{Context, Result};
use cascadia_cvar_builder::ControlValueRecord;
use cascadia_hint_transfer::HintContainer;
use cascadia_postprocess::{Autohinter, Woff2Compressor, hinted_path, is_hinted};
use indexmap::IndexMap;
use log::{error, warn};
use rayon::prelude::*;

use crate::{
    compile::{CVAR_TAG, CompiledFont, OutlineCompiler, OutputFormat},
    config::{BuildConfig, ToolConfig},
    designspace::{DesignDocument, Instantiator},
    io::glob_fonts,
    pipeline::fixup::Naming,
    prepare::FontPreparer,
    variants::{Variant, resolve_variants},
};

/// The four barrier-separated stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStage {
    VariantCompile,
    GlobalTableFixup,
    Hinting,
    WebFontConversion,
}

impl BuildStage {
    pub fn label(&self) -> &'static str {
        match self {
            Self::VariantCompile => "Compile variants",
            Self::GlobalTableFixup => "Fix up family tables",
            Self::Hinting => "Hint static instances",
            Self::WebFontConversion => "Convert web fonts",
        }
    }
}

/// Progress callbacks. Stage events always fire in barrier order;
/// task events may interleave within a stage.
pub trait BuildObserver: Sync {
    fn stage_started(&self, _stage: BuildStage) {}
    fn stage_finished(&self, _stage: BuildStage) {}
    fn task_finished(&self, _variant: &str) {}
}

/// Console progress reporting.
pub struct LogObserver;

impl BuildObserver for LogObserver {
    fn stage_started(&self, stage: BuildStage) {
        println!("\n==> {}", stage.label());
    }

    fn task_finished(&self, variant: &str) {
        println!("  built {variant}");
    }
}

/// Seam to the external hinting and compression tools, so the hinting
/// lanes can be driven without spawning anything.
pub trait ToolRunner: Sync {
    fn hint_ttf(&self, input: &Path, output: &Path, reference: Option<&Path>) -> Result<()>;
    fn hint_otf(&self, input: &Path, output: &Path) -> Result<()>;
    /// Compress `input`, returning the path of the produced file.
    fn compress(&self, input: &Path) -> Result<PathBuf>;
}

/// The external executables named in [`ToolConfig`].
pub struct ExternalTools {
    ttf: Autohinter,
    otf: Autohinter,
    woff2: Woff2Compressor,
}

impl ExternalTools {
    pub fn new(tools: &ToolConfig) -> Self {
        Self {
            ttf: Autohinter::new(&tools.ttf_autohinter).with_retries(tools.hint_attempts),
            otf: Autohinter::new(&tools.otf_autohinter).with_retries(tools.hint_attempts),
            woff2: Woff2Compressor::new(&tools.woff2_compressor),
        }
    }
}

impl ToolRunner for ExternalTools {
    fn hint_ttf(&self, input: &Path, output: &Path, reference: Option<&Path>) -> Result<()> {
        self.ttf.run(input, output, reference)
    }

    fn hint_otf(&self, input: &Path, output: &Path) -> Result<()> {
        self.otf.run(input, output, None)
    }

    fn compress(&self, input: &Path) -> Result<PathBuf> {
        self.woff2.run(input)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Variable,
    Static,
}

/// One file written by stage 1.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub variant: Variant,
    pub style: String,
    pub format: OutputFormat,
    pub kind: OutputKind,
    pub path: PathBuf,
}

#[derive(Debug, Default)]
pub struct BuildSummary {
    pub outputs: Vec<BuildOutput>,
    pub hint_failures: usize,
    pub web_fonts_written: usize,
}

/// Everything one build run needs, borrowed for its duration.
pub struct PipelineContext<'a> {
    pub config: &'a BuildConfig,
    pub document: &'a DesignDocument,
    pub instantiator: &'a dyn Instantiator,
    pub compiler: &'a dyn OutlineCompiler,
    pub preparer: &'a FontPreparer,
    pub hints: Option<&'a HintContainer>,
    pub tools: &'a dyn ToolRunner,
    pub observer: &'a dyn BuildObserver,
}

/// Run the full build. Stage-1 and stage-2 errors fail the run;
/// hinting and conversion failures are reported in the summary.
pub fn run_build(ctx: &PipelineContext<'_>) -> Result<BuildSummary> {
    let variants = resolve_variants(&ctx.config.options);
    let records = ctx
        .instantiator
        .control_value_records(ctx.document)
        .context("Failed to load control value records")?;

    let outputs = run_stage(BuildStage::VariantCompile, ctx.observer, || {
        compile_variants(ctx, &variants, &records)
    })?;

    run_stage(BuildStage::GlobalTableFixup, ctx.observer, || {
        for output in &outputs {
            let naming = Naming {
                family: output.variant.family_name(),
                style: output.style.clone(),
                version: ctx.config.version.clone(),
            };
            fixup::apply_naming(&output.path, &naming)
                .with_context(|| format!("Failed to fix up {}", output.path.display()))?;
        }
        Ok(())
    })?;

    let hint_failures = run_stage(BuildStage::Hinting, ctx.observer, || {
        Ok(hint_outputs(ctx.tools, &outputs))
    })?;

    let web_fonts_written = run_stage(BuildStage::WebFontConversion, ctx.observer, || {
        if ctx.config.options.web_fonts {
            convert_web_fonts(ctx.config, ctx.tools)
        } else {
            Ok(0)
        }
    })?;

    Ok(BuildSummary { outputs, hint_failures, web_fonts_written })
}

fn run_stage<T>(
    stage: BuildStage,
    observer: &dyn BuildObserver,
    f: impl FnOnce() -> Result<T>,
) -> Result<T> {
    observer.stage_started(stage);
    let start = Instant::now();
    let result = f()?;
    println!("  ✓ {} ({:.2}s)", stage.label(), start.elapsed().as_secs_f64());
    observer.stage_finished(stage);
    Ok(result)
}

/// Stage 1: one independent task per variant. All tasks are drained
/// before the first failure is surfaced.
fn compile_variants(
    ctx: &PipelineContext<'_>,
    variants: &[Variant],
    records: &[ControlValueRecord],
) -> Result<Vec<BuildOutput>> {
    let results: Vec<Result<Vec<BuildOutput>>> = variants
        .par_iter()
        .map(|variant| build_variant(ctx, variant, records))
        .collect();

    let mut outputs = Vec::new();
    let mut first_error = None;
    for (variant, result) in variants.iter().zip(results) {
        match result {
            Ok(mut variant_outputs) => outputs.append(&mut variant_outputs),
            Err(e) => {
                error!("{}: {e:#}", variant.full_name());
                if first_error.is_none() {
                    first_error = Some(e.context(format!("variant {}", variant.full_name())));
                }
            }
        }
    }

    match first_error {
        Some(e) => {
            // Completed siblings are still reported before the run fails.
            for output in &outputs {
                warn!("completed before failure: {}", output.path.display());
            }
            Err(e)
        }
        None => Ok(outputs),
    }
}

fn build_variant(
    ctx: &PipelineContext<'_>,
    variant: &Variant,
    records: &[ControlValueRecord],
) -> Result<Vec<BuildOutput>> {
    // Per-task isolation: every mutation below acts on this clone.
    let mut document = ctx.document.clone();
    document.retain_exportable();

    let masters = ctx.instantiator.masters(&document)?;
    let prepared: Vec<_> =
        masters.into_iter().map(|m| ctx.preparer.prepare(m, variant)).collect();

    let mut compiled = ctx.compiler.compile_variable(&document, &prepared)?;
    if ctx.config.options.compile_hints {
        if let Some(container) = ctx.hints {
            apply_hint_data(&mut compiled, container, &document, records)?;
        }
    }

    let mut outputs = Vec::new();
    let path = ctx
        .config
        .variable_dir(OutputFormat::Ttf.dir_name())
        .join(format!("{}.ttf", variant.file_stem()));
    compiled.save(&path)?;
    outputs.push(BuildOutput {
        variant: *variant,
        style: style_name(variant, "Regular"),
        format: OutputFormat::Ttf,
        kind: OutputKind::Variable,
        path,
    });

    if ctx.config.options.static_instances {
        for instance in &document.instances {
            let master = ctx.instantiator.instantiate(&document, instance)?;
            let master = ctx.preparer.prepare(master, variant);
            for format in [OutputFormat::Ttf, OutputFormat::Otf] {
                let compiled = ctx.compiler.compile_static(&master, format)?;
                let path = ctx.config.static_dir(format.dir_name()).join(format!(
                    "{}-{}.{}",
                    variant.file_stem(),
                    instance.name.replace(' ', ""),
                    format.extension()
                ));
                compiled.save(&path)?;
                outputs.push(BuildOutput {
                    variant: *variant,
                    style: style_name(variant, &instance.name),
                    format,
                    kind: OutputKind::Static,
                    path,
                });
            }
        }
    }

    ctx.observer.task_finished(&variant.full_name());
    Ok(outputs)
}

/// Transfer the precompiled hint tables and synthesize the control
/// value variation table onto a compiled font.
fn apply_hint_data(
    compiled: &mut CompiledFont,
    container: &HintContainer,
    document: &DesignDocument,
    records: &[ControlValueRecord],
) -> Result<()> {
    let target_order: Vec<String> =
        compiled.glyph_order.iter().map(|n| n.to_string()).collect();
    for (tag, data) in cascadia_hint_transfer::transfer(container, &target_order)? {
        compiled.insert_table(tag, data);
    }

    if !records.is_empty() {
        let cvt_len = compiled.control_value_count();
        if cvt_len > 0 {
            let table =
                cascadia_cvar_builder::synthesize(document.axes.len(), cvt_len, records)?;
            compiled.insert_table(CVAR_TAG, table.compile());
        }
    }

    Ok(())
}

fn style_name(variant: &Variant, instance: &str) -> String {
    if !variant.flags.italic {
        instance.to_string()
    } else if instance == "Regular" {
        "Italic".to_string()
    } else {
        format!("{instance} Italic")
    }
}

/// Stage 3: OTF statics in parallel; TTF statics sequentially per
/// family, each pass needing that family's un-hinted regular output.
/// Returns the failure count; failures here never abort siblings,
/// except a failed reference which blocks the files depending on it.
fn hint_outputs(tools: &dyn ToolRunner, outputs: &[BuildOutput]) -> usize {
    let statics: Vec<&BuildOutput> =
        outputs.iter().filter(|o| o.kind == OutputKind::Static).collect();
    if statics.is_empty() {
        return 0;
    }

    let mut failures = 0;

    let otf_results: Vec<(&BuildOutput, Result<()>)> = statics
        .par_iter()
        .filter(|o| o.format == OutputFormat::Otf && !is_hinted(&o.path))
        .map(|output| {
            (*output, tools.hint_otf(&output.path, &hinted_path(&output.path)))
        })
        .collect();
    for (output, result) in otf_results {
        if let Err(e) = result {
            warn!("{}: {e:#}", output.path.display());
            failures += 1;
        }
    }

    let mut lanes: IndexMap<String, Vec<&BuildOutput>> = IndexMap::new();
    for &output in statics.iter().filter(|o| o.format == OutputFormat::Ttf) {
        lanes.entry(output.variant.full_name()).or_default().push(output);
    }

    for (family, files) in &lanes {
        let reference = match files
            .iter()
            .find(|o| matches!(o.style.as_str(), "Regular" | "Italic"))
        {
            Some(output) => *output,
            None => {
                warn!("{family}: no regular-weight reference, skipping hinting lane");
                failures += files.len();
                continue;
            }
        };

        if !is_hinted(&reference.path) {
            if let Err(e) =
                tools.hint_ttf(&reference.path, &hinted_path(&reference.path), None)
            {
                warn!("{family}: reference hinting failed, lane blocked: {e:#}");
                failures += files.len();
                continue;
            }
        }

        for file in files.iter().filter(|o| o.path != reference.path) {
            if is_hinted(&file.path) {
                continue;
            }
            if let Err(e) =
                tools.hint_ttf(&file.path, &hinted_path(&file.path), Some(&reference.path))
            {
                warn!("{}: {e:#}", file.path.display());
                failures += 1;
            }
        }
    }

    failures
}

/// Stage 4: compress every TTF/OTF output into a mirrored woff2 tree.
fn convert_web_fonts(config: &BuildConfig, tools: &dyn ToolRunner) -> Result<usize> {
    let mut files = glob_fonts(&config.output_dir, "ttf/**/*.ttf")?;
    files.extend(glob_fonts(&config.output_dir, "otf/**/*.otf")?);

    let results: Vec<Result<()>> = files
        .par_iter()
        .map(|path| {
            let produced = tools.compress(path)?;
            let rel = path.strip_prefix(&config.output_dir).unwrap_or(path);
            let dest = config.output_dir.join("woff2").join(rel).with_extension("woff2");
            if let Some(parent) = dest.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::rename(&produced, &dest)
                .with_context(|| format!("Failed to move {}", produced.display()))
        })
        .collect();

    let mut written = 0;
    for (path, result) in files.iter().zip(&results) {
        match result {
            Ok(()) => written += 1,
            Err(e) => warn!("{}: {e:#}", path.display()),
        }
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use anyhow::bail;

    use super::*;
    use crate::variants::VariantFlags;

    /// Records tool invocations instead of spawning them. `fail_on`
    /// rejects any input whose file name contains the marker.
    #[derive(Default)]
    struct RecordingTools {
        calls: Mutex<Vec<String>>,
        fail_on: Option<String>,
    }

    impl RecordingTools {
        fn failing_on(marker: &str) -> Self {
            Self { fail_on: Some(marker.to_string()), ..Self::default() }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, entry: String, name: &str) -> Result<()> {
            self.calls.lock().unwrap().push(entry);
            if let Some(marker) = &self.fail_on {
                if name.contains(marker.as_str()) {
                    bail!("tool rejected {name}");
                }
            }
            Ok(())
        }
    }

    fn file_name(path: &Path) -> String {
        path.file_name().unwrap_or_default().to_string_lossy().into_owned()
    }

    impl ToolRunner for RecordingTools {
        fn hint_ttf(&self, input: &Path, _output: &Path, reference: Option<&Path>) -> Result<()> {
            let name = file_name(input);
            let entry = match reference {
                Some(reference) => format!("ttf:{name}<-{}", file_name(reference)),
                None => format!("ttf:{name}"),
            };
            self.record(entry, &name)
        }

        fn hint_otf(&self, input: &Path, _output: &Path) -> Result<()> {
            let name = file_name(input);
            self.record(format!("otf:{name}"), &name)
        }

        fn compress(&self, input: &Path) -> Result<PathBuf> {
            Ok(input.with_extension("woff2"))
        }
    }

    fn static_ttf(style: &str, path: &str) -> BuildOutput {
        BuildOutput {
            variant: Variant::new(VariantFlags::default()),
            style: style.to_string(),
            format: OutputFormat::Ttf,
            kind: OutputKind::Static,
            path: PathBuf::from(path),
        }
    }

    #[test]
    fn ttf_lane_hints_the_reference_first() {
        let tools = RecordingTools::default();
        let outputs = [
            static_ttf("Bold", "out/CascadiaCode-Bold.ttf"),
            static_ttf("Regular", "out/CascadiaCode-Regular.ttf"),
            static_ttf("Light", "out/CascadiaCode-Light.ttf"),
        ];

        let failures = hint_outputs(&tools, &outputs);

        assert_eq!(failures, 0);
        let calls = tools.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0], "ttf:CascadiaCode-Regular.ttf");
        assert!(
            calls[1..].iter().all(|c| c.ends_with("<-CascadiaCode-Regular.ttf")),
            "{calls:?}"
        );
    }

    #[test]
    fn failed_reference_blocks_its_whole_lane() {
        let tools = RecordingTools::failing_on("Regular");
        let outputs = [
            static_ttf("Regular", "out/CascadiaCode-Regular.ttf"),
            static_ttf("Bold", "out/CascadiaCode-Bold.ttf"),
            static_ttf("Light", "out/CascadiaCode-Light.ttf"),
        ];

        let failures = hint_outputs(&tools, &outputs);

        assert_eq!(failures, 3);
        // Only the reference attempt; no dependent was hinted.
        assert_eq!(tools.calls(), ["ttf:CascadiaCode-Regular.ttf"]);
    }

    #[test]
    fn hinted_outputs_are_not_reprocessed() {
        let tools = RecordingTools::default();
        let outputs = [
            static_ttf("Regular", "out/CascadiaCode-Regular-hinted.ttf"),
            static_ttf("Bold", "out/CascadiaCode-Bold-hinted.ttf"),
            static_ttf("Light", "out/CascadiaCode-Light.ttf"),
        ];

        let failures = hint_outputs(&tools, &outputs);

        assert_eq!(failures, 0);
        // The already-hinted reference still anchors the lane without
        // being re-run.
        assert_eq!(
            tools.calls(),
            ["ttf:CascadiaCode-Light.ttf<-CascadiaCode-Regular-hinted.ttf"]
        );
    }

    #[test]
    fn lane_without_a_reference_fails_whole() {
        let tools = RecordingTools::default();
        let outputs = [
            static_ttf("Bold", "out/CascadiaCode-Bold.ttf"),
            static_ttf("Light", "out/CascadiaCode-Light.ttf"),
        ];

        let failures = hint_outputs(&tools, &outputs);

        assert_eq!(failures, 2);
        assert!(tools.calls().is_empty());
    }
}
