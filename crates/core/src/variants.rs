//! Variant descriptors and toggle expansion.

use crate::config::{BuildOptions, CODE_FAMILY, MONO_FAMILY};

/// Modifier flags for one family variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VariantFlags {
    pub mono: bool,
    pub powerline: bool,
    pub nerd_font: bool,
    pub italic: bool,
}

/// An immutable variant descriptor. Name composition is deterministic
/// from the flags: base family, then the glyph-set suffix, then
/// "Italic".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Variant {
    pub flags: VariantFlags,
}

impl Variant {
    pub fn new(flags: VariantFlags) -> Self {
        Self { flags }
    }

    /// The family name, without the italic designation: e.g.
    /// "Cascadia Mono PL".
    pub fn family_name(&self) -> String {
        let mut name =
            String::from(if self.flags.mono { MONO_FAMILY } else { CODE_FAMILY });
        if self.flags.nerd_font {
            name.push_str(" NF");
        } else if self.flags.powerline {
            name.push_str(" PL");
        }
        name
    }

    /// The full variant name: e.g. "Cascadia Mono PL Italic".
    pub fn full_name(&self) -> String {
        let mut name = self.family_name();
        if self.flags.italic {
            name.push_str(" Italic");
        }
        name
    }

    /// Filename stem: the full name with spaces removed.
    pub fn file_stem(&self) -> String {
        self.full_name().replace(' ', "")
    }
}

/// Expand the build toggles into the ordered variant list: plain, PL,
/// NF, each as Code then Mono, uprights before italics.
pub fn resolve_variants(options: &BuildOptions) -> Vec<Variant> {
    let slants: &[bool] = if options.italic { &[false, true] } else { &[false] };
    let mut variants = Vec::new();

    for &italic in slants {
        for (powerline, nerd_font) in [(false, false), (true, false), (false, true)] {
            if powerline && !options.powerline {
                continue;
            }
            if nerd_font && !options.nerd_fonts {
                continue;
            }
            variants.push(Variant::new(VariantFlags { mono: false, powerline, nerd_font, italic }));
            if options.mono {
                variants.push(Variant::new(VariantFlags {
                    mono: true,
                    powerline,
                    nerd_font,
                    italic,
                }));
            }
        }
    }

    variants
}
