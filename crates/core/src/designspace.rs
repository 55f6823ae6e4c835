//! Design-space documents and the source-loading seam.
//!
//! The design sources themselves (designspace XML, UFOs) are parsed by
//! an external collaborator; this module only models the structured
//! document the pipeline consumes and the trait through which masters
//! and instances are materialized.

use anyhow::Result;
use cascadia_cvar_builder::ControlValueRecord;

use crate::font::MasterFont;

/// One variation axis, in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    pub tag: String,
    pub name: String,
    pub minimum: f32,
    pub default: f32,
    pub maximum: f32,
}

impl Axis {
    pub fn new(tag: &str, name: &str, minimum: f32, default: f32, maximum: f32) -> Self {
        Self { tag: tag.to_string(), name: name.to_string(), minimum, default, maximum }
    }
}

/// A named static instance at a design-space location.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceDescriptor {
    pub name: String,
    /// (axis tag, coordinate) pairs in axis order.
    pub location: Vec<(String, f32)>,
    /// Instances marked non-exportable in the sources are dropped
    /// before variant expansion.
    pub exportable: bool,
}

impl InstanceDescriptor {
    pub fn new(name: &str, location: Vec<(String, f32)>) -> Self {
        Self { name: name.to_string(), location, exportable: true }
    }
}

/// The shared document enumerating axes and instances. Each build task
/// clones it before mutating anything derived from it.
#[derive(Debug, Clone, Default)]
pub struct DesignDocument {
    pub axes: Vec<Axis>,
    pub instances: Vec<InstanceDescriptor>,
}

impl DesignDocument {
    /// Drop instances the sources mark non-exportable.
    pub fn retain_exportable(&mut self) {
        self.instances.retain(|i| i.exportable);
    }

    /// Position of an axis by tag.
    pub fn axis_index(&self, tag: &str) -> Option<usize> {
        self.axes.iter().position(|a| a.tag == tag)
    }
}

/// Source-loading seam. Implementations own the designspace/UFO
/// parsing; tests substitute in-memory fakes.
pub trait Instantiator: Sync {
    /// Load every master source the document names, in source order.
    fn masters(&self, document: &DesignDocument) -> Result<Vec<MasterFont>>;

    /// Produce a single interpolated master for a static instance.
    fn instantiate(
        &self,
        document: &DesignDocument,
        instance: &InstanceDescriptor,
    ) -> Result<MasterFont>;

    /// Per-location control-value deltas between the masters, used to
    /// synthesize the hint variation table. Empty when the sources
    /// carry none.
    fn control_value_records(&self, document: &DesignDocument) -> Result<Vec<ControlValueRecord>> {
        let _ = document;
        Ok(Vec::new())
    }
}
