// Copyright (c) 2019-present Dmitry Stepanov and Fyrox Engine contributors.
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

use fxhash::FxHashMap;
use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter},
    fs::File,
    path::Path,
};

/// Persistent settings of property inspectors.
#[derive(Deserialize, Serialize, PartialEq, Clone, Debug)]
#[serde(default)]
pub struct InspectorSettings {
    pub name_column_width: f32,
    /// Edits are recorded in the undo log only if this is set.
    pub undo_enabled: bool,
    /// Engine object and asset references are edited with pickers instead of member-wise
    /// editors.
    pub use_reference_picker: bool,
    /// Expand state of collapsible groups, keyed by group title.
    pub group_expansion: FxHashMap<String, bool>,
}

impl Default for InspectorSettings {
    fn default() -> Self {
        Self {
            name_column_width: 150.0,
            undo_enabled: true,
            use_reference_picker: true,
            group_expansion: Default::default(),
        }
    }
}

#[derive(Debug)]
pub enum SettingsError {
    Io(std::io::Error),
    Ron(ron::Error),
}

impl Display for SettingsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::Io(e) => write!(f, "io error: {e}"),
            SettingsError::Ron(e) => write!(f, "ron error: {e}"),
        }
    }
}

impl std::error::Error for SettingsError {}

impl From<std::io::Error> for SettingsError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<ron::Error> for SettingsError {
    fn from(e: ron::Error) -> Self {
        Self::Ron(e)
    }
}

impl From<ron::error::SpannedError> for SettingsError {
    fn from(e: ron::error::SpannedError) -> Self {
        Self::Ron(e.code)
    }
}

impl InspectorSettings {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let file = File::open(path)?;
        Ok(ron::de::from_reader(file)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SettingsError> {
        let file = File::create(path)?;
        ron::ser::to_writer_pretty(file, self, PrettyConfig::default())?;
        Ok(())
    }

    /// Groups are expanded unless they were collapsed before.
    pub fn is_group_expanded(&self, title: &str) -> bool {
        self.group_expansion.get(title).copied().unwrap_or(true)
    }

    pub fn set_group_expanded(&mut self, title: &str, expanded: bool) {
        self.group_expansion.insert(title.to_owned(), expanded);
    }
}
