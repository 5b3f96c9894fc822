//! Deprecated attribute propagation
//!
//! The structural summary records deprecation bits before any stage
//! runs; this stage re-applies them to the output, restoring markers a
//! prior tool held only as in-memory flags. The attribute is the
//! zero-length `Deprecated` marker real class files carry.

use crate::classfile::attrs::{names, AttributeInfo};
use crate::classfile::reader::{ClassFile, MemberInfo};
use crate::classfile::ConstantPool;
use crate::error::Result;
use crate::summary::StructuralSummary;

fn mark_member(pool: &mut ConstantPool, member: &mut MemberInfo) {
    if member.attribute(pool, names::DEPRECATED).is_none() {
        let name_index = pool.add_utf8(names::DEPRECATED);
        member.attributes.push(AttributeInfo::new(name_index, Vec::new()));
    }
}

pub fn apply(class: &mut ClassFile, summary: &StructuralSummary) -> Result<()> {
    if summary.deprecated && class.attribute(names::DEPRECATED).is_none() {
        let name_index = class.pool.add_utf8(names::DEPRECATED);
        class.attributes.push(AttributeInfo::new(name_index, Vec::new()));
    }
    let ClassFile { pool, fields, methods, .. } = class;
    for field in fields.iter_mut() {
        let name = field.name(pool)?.to_string();
        let descriptor = field.descriptor(pool)?.to_string();
        if summary
            .fields
            .iter()
            .any(|f| f.deprecated && f.name == name && f.descriptor == descriptor)
        {
            mark_member(pool, field);
        }
    }
    for method in methods.iter_mut() {
        let name = method.name(pool)?.to_string();
        let descriptor = method.descriptor(pool)?.to_string();
        if summary
            .methods
            .iter()
            .any(|m| m.deprecated && m.name == name && m.descriptor == descriptor)
        {
            mark_member(pool, method);
        }
    }
    Ok(())
}
