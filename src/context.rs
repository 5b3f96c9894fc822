//! Run-scoped remapping context
//!
//! `RemapRun` owns every cross-class cache of one run: the hierarchy
//! index, resolver memo tables, the method depth table and the
//! constructor parameter table. Caches are projections of the archive
//! bytes; recomputing an entry always yields an equal value.

use std::collections::{HashMap, HashSet};

use crate::classfile::defs::access_flags::{ACC_FINAL, ACC_INTERFACE, ACC_STATIC, ACC_SYNTHETIC};
use crate::classfile::defs::CONSTRUCTOR_METHOD_NAME;
use crate::classfile::descriptor;
use crate::classfile::reader::ClassFile;
use crate::config::RemapConfig;
use crate::error::Result;
use crate::fix::locals;
use crate::hierarchy::HierarchyIndex;
use crate::mapping::RenamingTable;
use crate::provider::ClassByteProvider;
use crate::summary::StructuralSummary;

/// Key of a method-scoped cache entry: (owner, name, descriptor).
pub type MethodKey = (String, String, String);

pub struct RemapRun<'a> {
    pub table: &'a dyn RenamingTable,
    pub provider: &'a dyn ClassByteProvider,
    pub config: &'a RemapConfig,
    pub hierarchy: HierarchyIndex,
    pub(crate) field_cache: HashMap<MethodKey, String>,
    pub(crate) method_cache: HashMap<MethodKey, String>,
    method_depths: HashMap<MethodKey, u32>,
    depth_in_progress: HashSet<String>,
    ctor_params: HashMap<String, Vec<String>>,
    ctor_params_in_progress: HashSet<String>,
}

impl<'a> RemapRun<'a> {
    pub fn new(
        table: &'a dyn RenamingTable,
        provider: &'a dyn ClassByteProvider,
        config: &'a RemapConfig,
    ) -> Self {
        Self {
            table,
            provider,
            config,
            hierarchy: HierarchyIndex::new(),
            field_cache: HashMap::new(),
            method_cache: HashMap::new(),
            method_depths: HashMap::new(),
            depth_in_progress: HashSet::new(),
            ctor_params: HashMap::new(),
            ctor_params_in_progress: HashSet::new(),
        }
    }

    pub fn store_method_depth(&mut self, owner: &str, name: &str, descriptor: &str, depth: u32) {
        self.method_depths
            .insert((owner.to_string(), name.to_string(), descriptor.to_string()), depth);
    }

    /// Nesting depth of a method: 0 for a root method, n for a lambda
    /// target n synthetic levels in. Computed lazily by replaying the
    /// declaring class's capture analysis; a class whose replay is
    /// already on the stack, or whose bytes are absent, answers 0. A
    /// replay that trips over a malformed bootstrap shape is fatal,
    /// exactly as it would be when transforming that class directly.
    pub fn method_depth(&mut self, owner: &str, name: &str, descriptor: &str) -> Result<u32> {
        let key = (owner.to_string(), name.to_string(), descriptor.to_string());
        if let Some(&depth) = self.method_depths.get(&key) {
            return Ok(depth);
        }
        if !self.depth_in_progress.insert(owner.to_string()) {
            return Ok(0);
        }
        let provider = self.provider;
        let replayed = match provider.bytes_of(owner) {
            Some(bytes) => match ClassFile::parse(bytes) {
                Ok(class) => locals::compute_depths(&class, self),
                Err(e) => {
                    log::warn!("unparseable class {owner}: {e}");
                    Ok(())
                }
            },
            None => {
                log::debug!("no bytes for {owner}, depth defaults to 0");
                Ok(())
            }
        };
        self.depth_in_progress.remove(owner);
        replayed?;
        Ok(self.method_depths.get(&key).copied().unwrap_or(0))
    }

    pub fn store_ctor_params(&mut self, class: &str, params: Vec<String>) {
        self.ctor_params.insert(class.to_string(), params);
    }

    /// Parameter type list of a class's first constructor, real or
    /// synthesized. An absent class, or a recursion back into a class
    /// already being resolved, yields an empty list.
    pub fn ctor_params(&mut self, class: &str) -> Result<Vec<String>> {
        if let Some(params) = self.ctor_params.get(class) {
            return Ok(params.clone());
        }
        if !self.ctor_params_in_progress.insert(class.to_string()) {
            return Ok(Vec::new());
        }
        let provider = self.provider;
        let computed = match provider.bytes_of(class) {
            None => {
                log::debug!("no bytes for {class}, assuming zero-parameter constructor");
                Ok(Vec::new())
            }
            Some(bytes) => match ClassFile::parse(bytes)
                .and_then(|parsed| StructuralSummary::extract(&parsed))
            {
                Ok(summary) => self.ctor_params_of_summary(&summary),
                Err(e) => {
                    log::warn!("unparseable class {class}: {e}");
                    Ok(Vec::new())
                }
            },
        };
        self.ctor_params_in_progress.remove(class);
        let params = computed?;
        self.store_ctor_params(class, params.clone());
        Ok(params)
    }

    fn ctor_params_of_summary(&mut self, summary: &StructuralSummary) -> Result<Vec<String>> {
        if let Some(ctor) = summary
            .methods
            .iter()
            .find(|m| m.name == CONSTRUCTOR_METHOD_NAME)
        {
            return descriptor::parameter_descriptors(&ctor.descriptor);
        }
        if !needs_synthesized_ctor(summary) {
            return Ok(Vec::new());
        }
        let mut params = match &summary.super_name {
            Some(super_name) => self.ctor_params(super_name)?,
            None => Vec::new(),
        };
        params.extend(qualifying_final_fields(summary).map(|f| f.descriptor.clone()));
        Ok(params)
    }
}

/// Non-static final fields without a compile-time constant; the fields
/// a synthesized constructor must initialize, in declaration order.
pub fn qualifying_final_fields(
    summary: &StructuralSummary,
) -> impl Iterator<Item = &crate::summary::FieldSummary> {
    summary.fields.iter().filter(|f| {
        f.access_flags & ACC_FINAL != 0 && f.access_flags & ACC_STATIC == 0 && !f.has_constant
    })
}

/// Whether a class has had its constructor stripped: no declared
/// constructor, not synthetic, not an interface, and at least one field
/// a constructor would have to initialize.
pub fn needs_synthesized_ctor(summary: &StructuralSummary) -> bool {
    summary.access_flags & (ACC_SYNTHETIC | ACC_INTERFACE) == 0
        && !summary.methods.iter().any(|m| m.name == CONSTRUCTOR_METHOD_NAME)
        && qualifying_final_fields(summary).next().is_some()
}
