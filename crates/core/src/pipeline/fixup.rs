//! Family-wide name table fix-up.
//!
//! Runs once over every compiled output so the name entries that
//! drive style selection are consistent across the whole family.

use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use read_fonts::{FontRef, TableProvider};
use write_fonts::{
    FontBuilder,
    tables::name::{Name, NameRecord},
};

use crate::{
    config::VENDOR_ID,
    io::{read_font, write_font},
};

/// The naming applied to one output file.
#[derive(Debug, Clone)]
pub struct Naming {
    pub family: String,
    pub style: String,
    pub version: String,
}

impl Naming {
    pub fn full_name(&self) -> String {
        if self.style == "Regular" {
            self.family.clone()
        } else {
            format!("{} {}", self.family, self.style)
        }
    }

    pub fn postscript_name(&self) -> String {
        format!("{}-{}", self.family.replace(' ', ""), self.style.replace(' ', ""))
    }

    pub fn unique_id(&self) -> String {
        format!("{};{VENDOR_ID};{}", self.version, self.postscript_name())
    }

    pub fn version_string(&self) -> String {
        format!("Version {}", self.version)
    }
}

/// Rewrite the name table of the font at `path` in place. Records
/// other than the family/style/identity set keep their current
/// strings.
pub fn apply_naming(path: &Path, naming: &Naming) -> Result<()> {
    let data = read_font(path)?;
    let font = FontRef::new(&data).context("Failed to parse font")?;

    let mut builder = FontBuilder::new();

    for record in font.table_directory.table_records() {
        let tag = record.tag();
        if let Some(table_data) = font.table_data(tag) {
            builder.add_raw(tag, table_data);
        }
    }

    if let Ok(name) = font.name() {
        let mut new_records: Vec<NameRecord> = Vec::new();

        for record in name.name_record() {
            let name_id = record.name_id().to_u16();
            let platform_id = record.platform_id();
            let encoding_id = record.encoding_id();
            let language_id = record.language_id();

            let current_string = match record.string(name.string_data()) {
                Ok(s) => s.chars().collect::<String>(),
                Err(_) => continue,
            };

            let new_string = match name_id {
                1 => naming.family.clone(),
                2 => naming.style.clone(),
                3 => naming.unique_id(),
                4 => naming.full_name(),
                5 => naming.version_string(),
                6 => naming.postscript_name(),
                16 => naming.family.clone(),
                17 => naming.style.clone(),
                _ => current_string,
            };

            new_records.push(NameRecord::new(
                platform_id,
                encoding_id,
                language_id,
                read_fonts::types::NameId::new(name_id),
                new_string.into(),
            ));
        }

        let new_name = Name::new(new_records);
        builder.add_table(&new_name)?;
    }

    write_font(path, builder.build())?;

    info!(
        "{}: set name to '{}' ({})",
        path.file_name().unwrap_or_default().to_string_lossy(),
        naming.full_name(),
        naming.postscript_name()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regular_style_collapses_into_family() {
        let naming = Naming {
            family: "Cascadia Code PL".to_string(),
            style: "Regular".to_string(),
            version: "2404.23".to_string(),
        };
        assert_eq!(naming.full_name(), "Cascadia Code PL");
        assert_eq!(naming.postscript_name(), "CascadiaCodePL-Regular");
        assert_eq!(naming.unique_id(), "2404.23;SAAR;CascadiaCodePL-Regular");
    }

    #[test]
    fn styled_full_name() {
        let naming = Naming {
            family: "Cascadia Mono NF".to_string(),
            style: "SemiBold Italic".to_string(),
            version: "2404.23".to_string(),
        };
        assert_eq!(naming.full_name(), "Cascadia Mono NF SemiBold Italic");
        assert_eq!(naming.postscript_name(), "CascadiaMonoNF-SemiBoldItalic");
        assert_eq!(naming.version_string(), "Version 2404.23");
    }
}
