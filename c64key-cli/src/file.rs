//! Layouts from JSON files.
//!
//! ```json
//! {
//!   "name": "my-c64",
//!   "keys": [[{"Code": "Backspace"}, {"Code": "Enter"}, ...], ...],
//!   "specials": [{"unshifted": [{"Code": "Down"}, 128], "shifted": [{"Code": "Up"}, 128]}],
//!   "shift": {"BothReleased": {"left": {"row": 7, "col": 1}, "right": {"row": 4, "col": 6}}}
//! }
//! ```
//!
//! `keys` must have 9 rows of 8 cells; the last row is RESTORE.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use c64key_core::layout::keys_from_rows;
use c64key_core::{Key, Layout, LayoutDef, ShiftRule, SpecialKey};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct LayoutFile {
    pub name: String,
    pub keys: Vec<Vec<Key>>,
    #[serde(default)]
    pub specials: Vec<SpecialKey>,
    pub shift: ShiftRule,
}

impl LayoutFile {
    pub fn load(path: &Path) -> Result<Self> {
        let text =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("loading layout from {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("parsing layout JSON")
    }

    /// Check the file's shape and contents and turn it into a usable layout.
    pub fn layout(&self) -> Result<Layout<'_>> {
        let keys = keys_from_rows(self.keys.as_slice()).context("layout key table")?;
        let def = LayoutDef {
            name: &self.name,
            keys,
            specials: &self.specials,
            shift: self.shift,
        };
        tracing::debug!(name = %self.name, specials = self.specials.len(), "validating layout file");
        Layout::new(def).with_context(|| format!("layout {}", self.name))
    }
}
