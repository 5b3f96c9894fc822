//! Structural summary extraction
//!
//! A lightweight, immutable digest of one class: supertypes, access
//! flags, member signatures and deprecation bits. Built without
//! decoding method bodies; the pipeline extracts one per class and the
//! resolver/synthesizer consult it instead of re-parsing.

use crate::classfile::attrs::names;
use crate::classfile::reader::{ClassFile, MemberInfo};
use crate::classfile::ConstantPool;
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct FieldSummary {
    pub access_flags: u16,
    pub deprecated: bool,
    pub name: String,
    pub descriptor: String,
    /// Carries a ConstantValue attribute (compile-time constant).
    pub has_constant: bool,
}

#[derive(Debug, Clone)]
pub struct MethodSummary {
    pub access_flags: u16,
    pub deprecated: bool,
    pub name: String,
    pub descriptor: String,
}

#[derive(Debug, Clone)]
pub struct StructuralSummary {
    pub name: String,
    pub access_flags: u16,
    pub deprecated: bool,
    /// Absent only for java/lang/Object.
    pub super_name: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: Vec<FieldSummary>,
    pub methods: Vec<MethodSummary>,
}

fn is_deprecated(member: &MemberInfo, pool: &ConstantPool) -> bool {
    member.attribute(pool, names::DEPRECATED).is_some()
}

impl StructuralSummary {
    pub fn extract(class: &ClassFile) -> Result<Self> {
        let pool = &class.pool;
        let mut fields = Vec::with_capacity(class.fields.len());
        for field in &class.fields {
            fields.push(FieldSummary {
                access_flags: field.access_flags,
                deprecated: is_deprecated(field, pool),
                name: field.name(pool)?.to_string(),
                descriptor: field.descriptor(pool)?.to_string(),
                has_constant: field.attribute(pool, names::CONSTANT_VALUE).is_some(),
            });
        }
        let mut methods = Vec::with_capacity(class.methods.len());
        for method in &class.methods {
            methods.push(MethodSummary {
                access_flags: method.access_flags,
                deprecated: is_deprecated(method, pool),
                name: method.name(pool)?.to_string(),
                descriptor: method.descriptor(pool)?.to_string(),
            });
        }
        Ok(Self {
            name: class.this_name()?.to_string(),
            access_flags: class.access_flags,
            deprecated: class.attribute(names::DEPRECATED).is_some(),
            super_name: class.super_name()?.map(str::to_string),
            interfaces: class.interface_names()?.iter().map(|s| s.to_string()).collect(),
            fields,
            methods,
        })
    }

    /// Direct supertypes, superclass first.
    pub fn direct_supertypes(&self) -> Vec<&str> {
        self.super_name
            .iter()
            .map(String::as_str)
            .chain(self.interfaces.iter().map(String::as_str))
            .collect()
    }
}
