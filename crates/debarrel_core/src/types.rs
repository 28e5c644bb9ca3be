use serde::Serialize;
use std::{
    collections::{BTreeMap, btree_map},
    path::{Path, PathBuf},
};

/// Where an export of the analyzed package is actually declared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportBinding {
    /// Absolute path of the declaring file.
    pub file: PathBuf,
    /// The name `file` exports the binding under. Differs from the map key
    /// for renamed re-exports such as `export { default as Button } from './Button'`.
    pub name: String,
}

impl ExportBinding {
    pub fn new(file: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self { file: file.into(), name: name.into() }
    }
}

/// Export name → declaring file, for one package.
///
/// Insertion is first-wins: once a name is bound it is never overwritten.
/// The resolver is the only producer; callers read it or merge whole maps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ExportMap {
    bindings: BTreeMap<String, ExportBinding>,
    #[serde(skip)]
    entry: Option<PathBuf>,
}

impl ExportMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the package entry file the map was resolved from.
    pub fn with_entry(mut self, entry: impl Into<PathBuf>) -> Self {
        self.entry = Some(entry.into());
        self
    }

    /// The package entry file, when the map came from a resolution.
    pub fn entry(&self) -> Option<&Path> {
        self.entry.as_deref()
    }

    /// Whether `name` is declared by the entry file itself.
    pub fn is_declared_in_entry(&self, name: &str) -> bool {
        match (self.entry(), self.get(name)) {
            (Some(entry), Some(file)) => entry == file,
            _ => false,
        }
    }

    /// The declaring file of `name`.
    pub fn get(&self, name: &str) -> Option<&Path> {
        self.bindings.get(name).map(|b| b.file.as_path())
    }

    pub fn binding(&self, name: &str) -> Option<&ExportBinding> {
        self.bindings.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, ExportBinding> {
        self.bindings.iter()
    }

    /// Merges `other` into `self`; names already bound in `self` are kept.
    pub fn merge(&mut self, other: ExportMap) {
        if self.entry.is_none() {
            self.entry = other.entry;
        }
        for (name, binding) in other.bindings {
            self.bind(name, binding);
        }
    }

    /// Binds `name` unless it is already bound. Returns whether it was inserted.
    pub(crate) fn bind(&mut self, name: String, binding: ExportBinding) -> bool {
        match self.bindings.entry(name) {
            btree_map::Entry::Vacant(slot) => {
                slot.insert(binding);
                true
            }
            btree_map::Entry::Occupied(_) => false,
        }
    }

    /// Like [`merge`](Self::merge), but `default` is never forwarded, as with
    /// `export * from`.
    pub(crate) fn merge_star(&mut self, other: ExportMap) {
        for (name, binding) in other.bindings {
            if name != "default" {
                self.bind(name, binding);
            }
        }
    }
}

impl FromIterator<(String, ExportBinding)> for ExportMap {
    fn from_iter<I: IntoIterator<Item = (String, ExportBinding)>>(iter: I) -> Self {
        let mut map = ExportMap::new();
        for (name, binding) in iter {
            map.bind(name, binding);
        }
        map
    }
}

impl FromIterator<(String, PathBuf)> for ExportMap {
    fn from_iter<I: IntoIterator<Item = (String, PathBuf)>>(iter: I) -> Self {
        iter.into_iter()
            .map(|(name, file)| {
                let binding = ExportBinding::new(file, name.clone());
                (name, binding)
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a ExportMap {
    type Item = (&'a String, &'a ExportBinding);
    type IntoIter = btree_map::Iter<'a, String, ExportBinding>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// One name forwarded by `export { imported as exported } from '...'`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReExportName {
    pub imported: String,
    pub exported: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReExport {
    pub names: Vec<ReExportName>,
    pub source: String,
}

/// The export surface of a single file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleRecord {
    pub path: PathBuf,
    /// Names this file declares and exports itself.
    pub named_exports: Vec<String>,
    pub re_exports: Vec<ReExport>,
    /// Sources of `export * from '...'`.
    pub star_re_exports: Vec<String>,
}

impl ModuleRecord {
    pub fn declares(&self, name: &str) -> bool {
        self.named_exports.iter().any(|n| n == name)
    }
}
