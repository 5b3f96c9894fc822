//! Renaming table capability and its in-memory implementation
//!
//! The core only depends on [`RenamingTable`]; [`MappingSet`] is the
//! concrete table the binary builds from an SRG-subset text file. Field
//! entries may carry a descriptor (then matching is descriptor-exact)
//! or omit it (then the name alone matches).

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::classfile::descriptor;
use crate::error::{Error, Result};

/// Class/field/method rename lookups. `None` means "unknown to the
/// table"; callers fall back to identity.
pub trait RenamingTable {
    fn map_class(&self, name: &str) -> Option<&str>;

    /// Whether the table knows the owner at all. Members of unknown
    /// owners short-circuit to identity without a hierarchy walk.
    fn contains_class(&self, name: &str) -> bool;

    fn map_field(&self, owner: &str, name: &str, descriptor: &str) -> Option<&str>;

    fn map_method(&self, owner: &str, name: &str, descriptor: &str) -> Option<&str>;
}

#[derive(Debug, Clone)]
struct FieldEntry {
    name: String,
    descriptor: Option<String>,
    mapped: String,
}

#[derive(Debug, Clone)]
struct MethodEntry {
    name: String,
    descriptor: String,
    mapped: String,
}

/// In-memory renaming table.
#[derive(Debug, Clone, Default)]
pub struct MappingSet {
    classes: HashMap<String, String>,
    fields: HashMap<String, Vec<FieldEntry>>,
    methods: HashMap<String, Vec<MethodEntry>>,
}

impl MappingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_class(&mut self, original: &str, mapped: &str) {
        self.classes.insert(original.to_string(), mapped.to_string());
    }

    /// Field mapping matched by name alone (SRG carries no field
    /// descriptors).
    pub fn add_field(&mut self, owner: &str, name: &str, mapped: &str) {
        self.fields.entry(owner.to_string()).or_default().push(FieldEntry {
            name: name.to_string(),
            descriptor: None,
            mapped: mapped.to_string(),
        });
    }

    /// Field mapping matched by name and exact descriptor.
    pub fn add_field_typed(&mut self, owner: &str, name: &str, descriptor: &str, mapped: &str) {
        self.fields.entry(owner.to_string()).or_default().push(FieldEntry {
            name: name.to_string(),
            descriptor: Some(descriptor.to_string()),
            mapped: mapped.to_string(),
        });
    }

    pub fn add_method(&mut self, owner: &str, name: &str, descriptor: &str, mapped: &str) {
        self.methods.entry(owner.to_string()).or_default().push(MethodEntry {
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            mapped: mapped.to_string(),
        });
    }

    fn map_class_or_self(&self, name: &str) -> String {
        self.classes.get(name).cloned().unwrap_or_else(|| name.to_string())
    }

    /// Swap original and mapped namespaces. Member entries are keyed by
    /// mapped owner, and method/typed-field descriptors are re-expressed
    /// with mapped class names, so the flipped table matches the classes
    /// a forward run would produce.
    pub fn reverse(&self) -> Result<Self> {
        let remap = |name: &str| self.map_class_or_self(name);
        let mut flipped = MappingSet::new();
        for (original, mapped) in &self.classes {
            flipped.classes.insert(mapped.clone(), original.clone());
        }
        for (owner, entries) in &self.fields {
            let mapped_owner = self.map_class_or_self(owner);
            let flipped_entries = flipped.fields.entry(mapped_owner).or_default();
            for e in entries {
                flipped_entries.push(FieldEntry {
                    name: e.mapped.clone(),
                    descriptor: e
                        .descriptor
                        .as_deref()
                        .map(|d| descriptor::remap_type_with(d, &remap)),
                    mapped: e.name.clone(),
                });
            }
        }
        for (owner, entries) in &self.methods {
            let mapped_owner = self.map_class_or_self(owner);
            let flipped_entries = flipped.methods.entry(mapped_owner).or_default();
            for e in entries {
                flipped_entries.push(MethodEntry {
                    name: e.mapped.clone(),
                    descriptor: descriptor::remap_method_desc_with(&e.descriptor, &remap)?,
                    mapped: e.name.clone(),
                });
            }
        }
        Ok(flipped)
    }

    /// Load an SRG-subset mappings file (`CL:`, `FD:`, `MD:` lines;
    /// `#` comments and blank lines skipped).
    pub fn load_srg(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let mut set = MappingSet::new();
        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut parts = line.split_whitespace();
            let bad_line = || Error::mappings(format!("malformed line {}: {line}", line_no + 1));
            match parts.next() {
                Some("CL:") => {
                    let original = parts.next().ok_or_else(bad_line)?;
                    let mapped = parts.next().ok_or_else(bad_line)?;
                    set.add_class(original, mapped);
                }
                Some("FD:") => {
                    let original = parts.next().ok_or_else(bad_line)?;
                    let mapped = parts.next().ok_or_else(bad_line)?;
                    let (owner, name) = split_member_path(original).ok_or_else(bad_line)?;
                    let (_, mapped_name) = split_member_path(mapped).ok_or_else(bad_line)?;
                    set.add_field(owner, name, mapped_name);
                }
                Some("MD:") => {
                    let original = parts.next().ok_or_else(bad_line)?;
                    let desc = parts.next().ok_or_else(bad_line)?;
                    let mapped = parts.next().ok_or_else(bad_line)?;
                    let (owner, name) = split_member_path(original).ok_or_else(bad_line)?;
                    let (_, mapped_name) = split_member_path(mapped).ok_or_else(bad_line)?;
                    set.add_method(owner, name, desc, mapped_name);
                }
                Some("PK:") => {} // package lines carry nothing this tool uses
                _ => return Err(bad_line()),
            }
        }
        Ok(set)
    }
}

/// Split `a/b/C/member` into (`a/b/C`, `member`).
fn split_member_path(path: &str) -> Option<(&str, &str)> {
    path.rsplit_once('/')
}

impl RenamingTable for MappingSet {
    fn map_class(&self, name: &str) -> Option<&str> {
        self.classes.get(name).map(String::as_str)
    }

    fn contains_class(&self, name: &str) -> bool {
        self.classes.contains_key(name)
            || self.fields.contains_key(name)
            || self.methods.contains_key(name)
    }

    fn map_field(&self, owner: &str, name: &str, descriptor: &str) -> Option<&str> {
        self.fields.get(owner)?.iter().find_map(|e| {
            if e.name != name {
                return None;
            }
            match e.descriptor.as_deref() {
                Some(d) if d != descriptor => None,
                _ => Some(e.mapped.as_str()),
            }
        })
    }

    fn map_method(&self, owner: &str, name: &str, descriptor: &str) -> Option<&str> {
        self.methods
            .get(owner)?
            .iter()
            .find(|e| e.name == name && e.descriptor == descriptor)
            .map(|e| e.mapped.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MappingSet {
        let mut set = MappingSet::new();
        set.add_class("a/A", "com/example/Alpha");
        set.add_field_typed("a/A", "x", "I", "count");
        set.add_method("a/A", "m", "(La/A;)V", "merge");
        set
    }

    #[test]
    fn test_lookups() {
        let set = sample();
        assert_eq!(set.map_class("a/A"), Some("com/example/Alpha"));
        assert_eq!(set.map_class("a/B"), None);
        assert_eq!(set.map_field("a/A", "x", "I"), Some("count"));
        assert_eq!(set.map_field("a/A", "x", "J"), None);
        assert_eq!(set.map_method("a/A", "m", "(La/A;)V"), Some("merge"));
        assert_eq!(set.map_method("a/A", "m", "()V"), None);
    }

    #[test]
    fn test_untyped_field_matches_any_descriptor() {
        let mut set = MappingSet::new();
        set.add_field("a/A", "x", "count");
        assert_eq!(set.map_field("a/A", "x", "I"), Some("count"));
        assert_eq!(set.map_field("a/A", "x", "Ljava/lang/String;"), Some("count"));
    }

    #[test]
    fn test_load_srg() {
        let path = std::env::temp_dir().join("rejar_mapping_ok.srg");
        fs::write(
            &path,
            "# comment\n\nPK: a m\nCL: a/A m/A\nFD: a/A/x m/A/count\nMD: a/A/m ()V m/A/run\n",
        )
        .unwrap();
        let set = MappingSet::load_srg(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(set.map_class("a/A"), Some("m/A"));
        // SRG field lines carry no descriptor, so any descriptor matches.
        assert_eq!(set.map_field("a/A", "x", "I"), Some("count"));
        assert_eq!(set.map_field("a/A", "x", "Ljava/lang/String;"), Some("count"));
        assert_eq!(set.map_method("a/A", "m", "()V"), Some("run"));
    }

    #[test]
    fn test_load_srg_rejects_malformed_lines() {
        for bad in ["CL: a/A", "FD: a/A/x", "MD: a/A/m ()V", "XX: a b"] {
            let path = std::env::temp_dir().join("rejar_mapping_bad.srg");
            fs::write(&path, bad).unwrap();
            let result = MappingSet::load_srg(&path);
            fs::remove_file(&path).ok();
            assert!(result.is_err(), "accepted malformed line: {bad}");
        }
    }

    #[test]
    fn test_reverse_reexpresses_descriptors() {
        let flipped = sample().reverse().unwrap();
        assert_eq!(flipped.map_class("com/example/Alpha"), Some("a/A"));
        assert_eq!(flipped.map_field("com/example/Alpha", "count", "I"), Some("x"));
        assert_eq!(
            flipped.map_method("com/example/Alpha", "merge", "(Lcom/example/Alpha;)V"),
            Some("m")
        );
    }
}
