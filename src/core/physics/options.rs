//! Expansion options.

use std::path::Path;

use physics_tex_ir::{Em, ExpressionNode, SizeLevel};
use serde::{Deserialize, Serialize};

use crate::utils::error::OptionsError;

/// Em height per explicit size level.
///
/// The engine works with [`SizeLevel`]s; [`SizeTable::annotate`] copies the
/// matching heights onto fixed-size atoms for renderers that want a number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeTable {
    pub big: f32,
    #[serde(rename = "Big")]
    pub big2: f32,
    pub bigg: f32,
    #[serde(rename = "Bigg")]
    pub bigg2: f32,
}

impl Default for SizeTable {
    fn default() -> Self {
        Self {
            big: 0.85,
            big2: 1.15,
            bigg: 1.45,
            bigg2: 1.75,
        }
    }
}

impl SizeTable {
    /// Em value for a fixed size; `None` for natural and auto sizes.
    pub fn em(&self, level: SizeLevel) -> Option<f32> {
        match level {
            SizeLevel::Big1 => Some(self.big),
            SizeLevel::Big2 => Some(self.big2),
            SizeLevel::Big3 => Some(self.bigg),
            SizeLevel::Big4 => Some(self.bigg2),
            SizeLevel::Natural | SizeLevel::Auto => None,
        }
    }

    /// Set `em` on every atom of `tree` from its size level.
    pub fn annotate(&self, tree: &mut ExpressionNode) {
        tree.for_each_atom_mut(&mut |atom| atom.em = self.em(atom.size).map(Em));
    }

    /// Sizes must strictly increase from `big` to `Bigg`.
    pub fn is_increasing(&self) -> bool {
        self.big < self.big2 && self.big2 < self.bigg && self.bigg < self.bigg2
    }
}

/// Options for physics macro expansion
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsOptions {
    /// Typeset the differential `d` in italics instead of upright
    /// Default: false
    pub italic_diff: bool,

    /// Draw the nabla of `\grad`, `\div`, `\curl` with a vector arrow
    /// instead of in bold
    /// Default: false
    pub arrow_del: bool,

    /// Em heights of the explicit delimiter sizes
    pub sizes: SizeTable,
}

impl PhysicsOptions {
    /// Italic differentials and arrow nablas, as in many textbooks.
    pub fn textbook() -> Self {
        Self {
            italic_diff: true,
            arrow_del: true,
            ..Self::default()
        }
    }

    pub fn from_json(text: &str) -> Result<Self, OptionsError> {
        Ok(serde_json::from_str(text)?)
    }

    #[cfg(feature = "config-file")]
    pub fn from_toml(text: &str) -> Result<Self, OptionsError> {
        Ok(toml::from_str(text)?)
    }

    /// Load options from a `.json` (or, with `config-file`, `.toml`) file.
    pub fn load(path: &Path) -> Result<Self, OptionsError> {
        let text = std::fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("json")
            .to_ascii_lowercase();
        match extension.as_str() {
            "json" => Self::from_json(&text),
            #[cfg(feature = "config-file")]
            "toml" => Self::from_toml(&text),
            _ => Err(OptionsError::UnsupportedFormat { extension }),
        }
    }
}
