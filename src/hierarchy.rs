//! Lazily-populated class hierarchy index
//!
//! Resolves a class's direct supertypes on demand through the byte
//! provider, header-only, and memoizes the answer. An absent class
//! caches an empty set: it is a leaf as far as this run can see, not an
//! error.

use std::collections::HashMap;

use crate::classfile::reader;
use crate::provider::ClassByteProvider;

#[derive(Debug, Default)]
pub struct HierarchyIndex {
    supertypes: HashMap<String, Vec<String>>,
}

impl HierarchyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Direct supertypes of `name`, superclass first, then interfaces
    /// in declaration order.
    pub fn direct_supertypes(
        &mut self,
        name: &str,
        provider: &dyn ClassByteProvider,
    ) -> &[String] {
        if !self.supertypes.contains_key(name) {
            let resolved = match provider.bytes_of(name) {
                Some(bytes) => match reader::read_supertypes(bytes) {
                    Ok((super_name, interfaces)) => {
                        super_name.into_iter().chain(interfaces).collect()
                    }
                    Err(e) => {
                        log::warn!("unreadable class header for {name}: {e}");
                        Vec::new()
                    }
                },
                None => {
                    log::debug!("no bytes for {name}, treating as leaf");
                    Vec::new()
                }
            };
            self.supertypes.insert(name.to_string(), resolved);
        }
        &self.supertypes[name]
    }

    /// Record supertypes discovered while a class was being transformed
    /// anyway, avoiding a later provider round-trip.
    pub fn record(&mut self, name: &str, supertypes: Vec<String>) {
        self.supertypes.entry(name.to_string()).or_insert(supertypes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_absent_class_is_leaf() {
        let provider: HashMap<String, Vec<u8>> = HashMap::new();
        let mut index = HierarchyIndex::new();
        assert!(index.direct_supertypes("a/Missing", &provider).is_empty());
    }

    #[test]
    fn test_recorded_supertypes_win() {
        let provider: HashMap<String, Vec<u8>> = HashMap::new();
        let mut index = HierarchyIndex::new();
        index.record("a/B", vec!["a/A".to_string()]);
        assert_eq!(index.direct_supertypes("a/B", &provider), ["a/A".to_string()]);
    }
}
