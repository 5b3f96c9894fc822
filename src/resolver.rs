//! Hierarchy-walking symbol resolution
//!
//! Field and method renames follow the same shape: consult the table
//! for the owner itself, then search each direct supertype (superclass
//! before interfaces, declaration order) and take the first answer that
//! actually renames. Unresolvable input comes back unchanged; every
//! answer is memoized on the run.
//!
//! Field table entries that carry a descriptor match descriptor-exact,
//! so a subclass field shadowing a same-named, differently-typed
//! ancestor field never picks up the ancestor's mapping.

use crate::context::RemapRun;

impl RemapRun<'_> {
    /// Mapped name of a class; identity when the table has no entry.
    pub fn map_class_name(&self, name: &str) -> String {
        self.table.map_class(name).unwrap_or(name).to_string()
    }

    pub fn map_field_name(&mut self, owner: &str, name: &str, descriptor: &str) -> String {
        if !self.table.contains_class(owner) {
            return name.to_string();
        }
        let key = (owner.to_string(), name.to_string(), descriptor.to_string());
        if let Some(resolved) = self.field_cache.get(&key) {
            return resolved.clone();
        }
        let resolved = self.resolve_field(owner, name, descriptor);
        self.field_cache.insert(key, resolved.clone());
        resolved
    }

    fn resolve_field(&mut self, owner: &str, name: &str, descriptor: &str) -> String {
        if let Some(mapped) = self.table.map_field(owner, name, descriptor) {
            return mapped.to_string();
        }
        let provider = self.provider;
        let supertypes = self.hierarchy.direct_supertypes(owner, provider).to_vec();
        for parent in supertypes {
            let resolved = self.map_field_name(&parent, name, descriptor);
            if resolved != name {
                return resolved;
            }
        }
        name.to_string()
    }

    pub fn map_method_name(&mut self, owner: &str, name: &str, descriptor: &str) -> String {
        if !self.table.contains_class(owner) {
            return name.to_string();
        }
        let key = (owner.to_string(), name.to_string(), descriptor.to_string());
        if let Some(resolved) = self.method_cache.get(&key) {
            return resolved.clone();
        }
        let resolved = self.resolve_method(owner, name, descriptor);
        self.method_cache.insert(key, resolved.clone());
        resolved
    }

    fn resolve_method(&mut self, owner: &str, name: &str, descriptor: &str) -> String {
        if let Some(mapped) = self.table.map_method(owner, name, descriptor) {
            return mapped.to_string();
        }
        let provider = self.provider;
        let supertypes = self.hierarchy.direct_supertypes(owner, provider).to_vec();
        for parent in supertypes {
            let resolved = self.map_method_name(&parent, name, descriptor);
            if resolved != name {
                return resolved;
            }
        }
        name.to_string()
    }
}
