//! Canonical constructor parameter naming
//!
//! When a constructor's parameter types match the class's non-static
//! field types exactly, in declaration order, the constructor is the
//! canonical one (records, and record-shaped classes): each parameter
//! initializes the field at its position, so the field names are the
//! right parameter names.

use crate::classfile::attrs::{self, names, CodeBody};
use crate::classfile::defs::access_flags::ACC_STATIC;
use crate::classfile::defs::CONSTRUCTOR_METHOD_NAME;
use crate::classfile::reader::{ByteReader, ClassFile};
use crate::classfile::descriptor::{parameter_descriptors, slot_width};
use crate::error::Result;
use crate::summary::StructuralSummary;

pub fn apply(class: &mut ClassFile, summary: &StructuralSummary) -> Result<()> {
    let instance_fields: Vec<_> = summary
        .fields
        .iter()
        .filter(|f| f.access_flags & ACC_STATIC == 0)
        .collect();
    if instance_fields.is_empty() {
        return Ok(());
    }
    let field_types: Vec<&str> = instance_fields.iter().map(|f| f.descriptor.as_str()).collect();

    let ClassFile { pool, methods, .. } = class;
    for method in methods.iter_mut() {
        if method.name(pool)? != CONSTRUCTOR_METHOD_NAME {
            continue;
        }
        let params = parameter_descriptors(method.descriptor(pool)?)?;
        if params != field_types {
            continue;
        }

        // Slot of each parameter; constructors are instance methods.
        let mut slot_names = Vec::with_capacity(params.len());
        let mut slot = 1u16;
        for (param, field) in params.iter().zip(&instance_fields) {
            slot_names.push((slot, field.name.clone()));
            slot += slot_width(param);
        }

        if let Some(attr) = method.attribute_mut(pool, names::METHOD_PARAMETERS) {
            let mut r = ByteReader::new(&attr.info);
            let count = r.u8()?;
            let mut entries = Vec::with_capacity(count as usize);
            for _ in 0..count {
                entries.push((r.u16()?, r.u16()?));
            }
            for (entry, field) in entries.iter_mut().zip(&instance_fields) {
                entry.0 = pool.add_utf8(&field.name);
            }
            let mut out = Vec::with_capacity(attr.info.len());
            out.push(entries.len() as u8);
            for (name_index, access) in &entries {
                out.extend_from_slice(&name_index.to_be_bytes());
                out.extend_from_slice(&access.to_be_bytes());
            }
            attr.info = out;
        }

        if let Some(code_attr) = method.attribute_mut(pool, names::CODE) {
            let mut body = CodeBody::parse(&code_attr.info)?;
            let mut changed = false;
            for attr in &mut body.attributes {
                if pool.utf8(attr.name_index)? != names::LOCAL_VARIABLE_TABLE {
                    continue;
                }
                let mut entries = attrs::parse_local_vars(&attr.info)?;
                for entry in &mut entries {
                    if let Some((_, name)) =
                        slot_names.iter().find(|(s, _)| *s == entry.index)
                    {
                        entry.name_index = pool.add_utf8(name);
                    }
                }
                attr.info = attrs::write_local_vars(&entries);
                changed = true;
            }
            if changed {
                let rebuilt = body.to_bytes();
                if let Some(code_attr) = method.attribute_mut(pool, names::CODE) {
                    code_attr.info = rebuilt;
                }
            }
        }
    }
    Ok(())
}
