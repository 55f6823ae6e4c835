//! Subprocess bridge to the design sources.
//!
//! Designspace/UFO parsing and outline compilation live in a helper
//! executable (`tools.source_helper`). The bridge speaks a line-based,
//! tab-separated dump format with it:
//!
//! ```text
//! axis<TAB>wght<TAB>Weight<TAB>200<TAB>400<TAB>700
//! instance<TAB>1<TAB>SemiBold<TAB>wght=600
//! master<TAB>Cascadia Code<TAB>Regular<TAB>Cascadia Code
//! features<TAB>feature calt { } calt;\n
//! glyph<TAB>A<TAB>0041<TAB>1200<TAB>deadbeef
//! record<TAB>wght=700
//! delta<TAB>3<TAB>-12
//! ```
//!
//! Feature text is escaped (`\n`, `\t`, `\\`); outlines are hex.
//! `document`, `masters`, `instantiate`, and `cvt-deltas` read from
//! the helper's stdout; `compile` receives master dumps on stdin and
//! writes the font binary to the path given with `--output`.

use std::{
    fs::{create_dir_all, read, remove_file},
    io::Write,
    path::PathBuf,
    process::{Command, Stdio},
    sync::atomic::{AtomicU64, Ordering},
};

use anyhow::{Context, Result, bail};

use cascadia_core::{
    AxisCoordinate, BuildConfig, CompiledFont, ControlValueRecord, DesignDocument, Glyph,
    GlyphName, InstanceDescriptor, Instantiator, MasterFont, OutlineCompiler, OutputFormat,
    designspace::Axis,
};

pub struct SourceBridge {
    helper: String,
    input_dir: PathBuf,
    work_dir: PathBuf,
    sequence: AtomicU64,
}

impl SourceBridge {
    pub fn new(config: &BuildConfig) -> Self {
        Self {
            helper: config.tools.source_helper.clone(),
            input_dir: config.input_dir.clone(),
            work_dir: config.output_dir.join(".work"),
            sequence: AtomicU64::new(0),
        }
    }

    pub fn load_document(&self) -> Result<DesignDocument> {
        let output = self.run_helper(&["document".to_string()], None)?;
        parse_document(&output)
    }

    fn run_helper(&self, args: &[String], stdin: Option<&str>) -> Result<String> {
        let mut command = Command::new(&self.helper);
        command.arg(&args[0]).arg(&self.input_dir).args(&args[1..]);
        command.stdout(Stdio::piped());
        if stdin.is_some() {
            command.stdin(Stdio::piped());
        }

        let mut child = command
            .spawn()
            .with_context(|| format!("failed to launch '{}'", self.helper))?;
        if let (Some(text), Some(mut pipe)) = (stdin, child.stdin.take()) {
            pipe.write_all(text.as_bytes())?;
        }
        let output = child.wait_with_output()?;
        if !output.status.success() {
            bail!("'{}' {} exited with {}", self.helper, args[0], output.status);
        }
        String::from_utf8(output.stdout).context("helper output was not UTF-8")
    }

    fn work_path(&self, suffix: &str) -> Result<PathBuf> {
        create_dir_all(&self.work_dir)
            .with_context(|| format!("Failed to create directory: {}", self.work_dir.display()))?;
        let n = self.sequence.fetch_add(1, Ordering::Relaxed);
        Ok(self.work_dir.join(format!("{}-{n}-{suffix}", std::process::id())))
    }

    fn compile_dump(&self, dump: String, extra_args: &[&str], suffix: &str) -> Result<CompiledFont> {
        let out_path = self.work_path(suffix)?;
        let mut args = vec!["compile".to_string()];
        args.extend(extra_args.iter().map(|s| s.to_string()));
        args.push("--output".to_string());
        args.push(out_path.display().to_string());

        self.run_helper(&args, Some(&dump))?;
        let data = read(&out_path)
            .with_context(|| format!("helper produced no output at {}", out_path.display()))?;
        let compiled = CompiledFont::from_font_bytes(&data)?;
        let _ = remove_file(&out_path);
        Ok(compiled)
    }
}

impl Instantiator for SourceBridge {
    fn masters(&self, _document: &DesignDocument) -> Result<Vec<MasterFont>> {
        let output = self.run_helper(&["masters".to_string()], None)?;
        parse_masters(&output)
    }

    fn instantiate(
        &self,
        _document: &DesignDocument,
        instance: &InstanceDescriptor,
    ) -> Result<MasterFont> {
        let args = vec![
            "instantiate".to_string(),
            instance.name.clone(),
            format_location(&instance.location),
        ];
        let output = self.run_helper(&args, None)?;
        let masters = parse_masters(&output)?;
        masters
            .into_iter()
            .next()
            .with_context(|| format!("helper returned no master for '{}'", instance.name))
    }

    fn control_value_records(&self, document: &DesignDocument) -> Result<Vec<ControlValueRecord>> {
        let output = self.run_helper(&["cvt-deltas".to_string()], None)?;
        parse_control_values(&output, document)
    }
}

impl OutlineCompiler for SourceBridge {
    fn compile_variable(
        &self,
        _document: &DesignDocument,
        masters: &[MasterFont],
    ) -> Result<CompiledFont> {
        let mut dump = String::new();
        for master in masters {
            write_master(&mut dump, master);
        }
        self.compile_dump(dump, &["--variable"], "variable.ttf")
    }

    fn compile_static(&self, master: &MasterFont, format: OutputFormat) -> Result<CompiledFont> {
        let mut dump = String::new();
        write_master(&mut dump, master);
        let suffix = format!("static.{}", format.extension());
        self.compile_dump(dump, &["--format", format.extension()], &suffix)
    }
}

fn format_location(location: &[(String, f32)]) -> String {
    location
        .iter()
        .map(|(tag, value)| format!("{tag}={value}"))
        .collect::<Vec<_>>()
        .join(";")
}

fn parse_location(field: &str) -> Result<Vec<(String, f32)>> {
    field
        .split(';')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let (tag, value) = part
                .split_once('=')
                .with_context(|| format!("malformed location entry '{part}'"))?;
            let value: f32 =
                value.parse().with_context(|| format!("bad coordinate in '{part}'"))?;
            Ok((tag.to_string(), value))
        })
        .collect()
}

fn parse_document(text: &str) -> Result<DesignDocument> {
    let mut document = DesignDocument::default();
    for line in text.lines().filter(|l| !l.is_empty()) {
        let fields: Vec<&str> = line.split('\t').collect();
        match fields[0] {
            "axis" => {
                let &[_, tag, name, min, default, max] = fields.as_slice() else {
                    bail!("malformed axis line: '{line}'");
                };
                document.axes.push(Axis::new(
                    tag,
                    name,
                    min.parse().context("bad axis minimum")?,
                    default.parse().context("bad axis default")?,
                    max.parse().context("bad axis maximum")?,
                ));
            }
            "instance" => {
                let &[_, exportable, name, location] = fields.as_slice() else {
                    bail!("malformed instance line: '{line}'");
                };
                document.instances.push(InstanceDescriptor {
                    name: name.to_string(),
                    location: parse_location(location)?,
                    exportable: exportable == "1",
                });
            }
            other => bail!("unexpected document line kind '{other}'"),
        }
    }
    Ok(document)
}

fn parse_masters(text: &str) -> Result<Vec<MasterFont>> {
    let mut masters = Vec::new();
    for line in text.lines().filter(|l| !l.is_empty()) {
        let fields: Vec<&str> = line.split('\t').collect();
        match fields[0] {
            "master" => {
                let &[_, family, style, style_map] = fields.as_slice() else {
                    bail!("malformed master line: '{line}'");
                };
                let mut master = MasterFont::new(family, style);
                master.style_map_family_name =
                    (style_map != "-").then(|| style_map.to_string());
                masters.push(master);
            }
            "features" => {
                let &[_, escaped] = fields.as_slice() else {
                    bail!("malformed features line: '{line}'");
                };
                let master =
                    masters.last_mut().context("features line before any master")?;
                master.features = unescape(escaped);
            }
            "glyph" => {
                let &[_, name, codepoint, width, outline] = fields.as_slice() else {
                    bail!("malformed glyph line: '{line}'");
                };
                let master = masters.last_mut().context("glyph line before any master")?;
                let codepoint = if codepoint == "-" {
                    None
                } else {
                    Some(
                        u32::from_str_radix(codepoint, 16)
                            .with_context(|| format!("bad codepoint for glyph '{name}'"))?,
                    )
                };
                master.glyphs.insert(
                    GlyphName::new(name),
                    Glyph {
                        name: GlyphName::new(name),
                        codepoint,
                        outline: hex_decode(outline)
                            .with_context(|| format!("bad outline for glyph '{name}'"))?,
                        width: width.parse().with_context(|| format!("bad width for '{name}'"))?,
                    },
                );
            }
            other => bail!("unexpected master line kind '{other}'"),
        }
    }
    Ok(masters)
}

fn write_master(dump: &mut String, master: &MasterFont) {
    dump.push_str(&format!(
        "master\t{}\t{}\t{}\n",
        master.family_name,
        master.style_name,
        master.style_map_family_name.as_deref().unwrap_or("-"),
    ));
    dump.push_str(&format!("features\t{}\n", escape(&master.features)));
    for glyph in master.glyphs.values() {
        let codepoint = match glyph.codepoint {
            Some(cp) => format!("{cp:04X}"),
            None => "-".to_string(),
        };
        dump.push_str(&format!(
            "glyph\t{}\t{codepoint}\t{}\t{}\n",
            glyph.name,
            glyph.width,
            hex_encode(&glyph.outline)
        ));
    }
}

fn parse_control_values(
    text: &str,
    document: &DesignDocument,
) -> Result<Vec<ControlValueRecord>> {
    let mut records: Vec<ControlValueRecord> = Vec::new();
    for line in text.lines().filter(|l| !l.is_empty()) {
        let fields: Vec<&str> = line.split('\t').collect();
        match fields[0] {
            "record" => {
                let &[_, location] = fields.as_slice() else {
                    bail!("malformed record line: '{line}'");
                };
                let location = parse_location(location)?
                    .into_iter()
                    .map(|(tag, value)| {
                        let axis = document
                            .axis_index(&tag)
                            .with_context(|| format!("unknown axis tag '{tag}'"))?;
                        let value = normalize(&document.axes[axis], value);
                        Ok(AxisCoordinate { axis, value })
                    })
                    .collect::<Result<Vec<_>>>()?;
                records.push(ControlValueRecord { location, deltas: Vec::new() });
            }
            "delta" => {
                let &[_, index, value] = fields.as_slice() else {
                    bail!("malformed delta line: '{line}'");
                };
                let record = records.last_mut().context("delta line before any record")?;
                record.deltas.push((
                    index.parse().context("bad delta index")?,
                    value.parse().context("bad delta value")?,
                ));
            }
            other => bail!("unexpected cvt line kind '{other}'"),
        }
    }
    Ok(records)
}

/// Map a design-space coordinate onto the normalized [-1, 1] range,
/// clamped to the axis bounds.
fn normalize(axis: &Axis, value: f32) -> f32 {
    let value = value.clamp(axis.minimum, axis.maximum);
    if value < axis.default && axis.default > axis.minimum {
        (value - axis.default) / (axis.default - axis.minimum)
    } else if value > axis.default && axis.maximum > axis.default {
        (value - axis.default) / (axis.maximum - axis.default)
    } else {
        0.0
    }
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('\n', "\\n").replace('\t', "\\t")
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn hex_encode(data: &[u8]) -> String {
    data.iter().map(|b| format!("{b:02x}")).collect()
}

fn hex_decode(text: &str) -> Result<Vec<u8>> {
    if text.len() % 2 != 0 {
        bail!("odd-length hex string");
    }
    (0..text.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&text[i..i + 2], 16).context("invalid hex digit")
        })
        .collect()
}
