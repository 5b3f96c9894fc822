//! Symbol renaming over a parsed class
//!
//! The constant pool is rewritten in place, append-only: renamed
//! strings become fresh Utf8/NameAndType entries and the referencing
//! constants are repointed. Entry indices never move, so bytecode
//! operands, stack map frames and exception tables stay valid without
//! re-encoding. Utf8 entries are never mutated; a shared string only
//! changes meaning at the constants that point to it.
//!
//! Resolution reads original names, so every read happens before the
//! corresponding write: pool edits are collected first, then applied.

use crate::classfile::attrs::{self, names};
use crate::classfile::defs::CONSTRUCTOR_METHOD_NAME;
use crate::classfile::descriptor::{remap_method_desc_with, remap_type_with, return_descriptor};
use crate::classfile::reader::{ByteReader, ClassFile};
use crate::classfile::{ConstantPool, Item};
use crate::context::RemapRun;
use crate::error::{Error, Result};
use crate::fix::locals;

enum RefKind {
    Field,
    Method,
    InterfaceMethod,
}

enum PoolEdit {
    Class {
        index: u16,
        mapped: String,
    },
    MemberRef {
        index: u16,
        kind: RefKind,
        class: u16,
        name: String,
        descriptor: String,
    },
    CallSite {
        index: u16,
        bootstrap: u16,
        name: String,
        descriptor: String,
    },
    MethodType {
        index: u16,
        descriptor: String,
    },
    DynamicConstant {
        index: u16,
        bootstrap: u16,
        name: String,
        descriptor: String,
    },
}

/// Class constants may hold either an internal name or (for arrays) a
/// type descriptor.
fn map_class_constant(run: &RemapRun, name: &str) -> String {
    if name.starts_with('[') {
        remap_type_with(name, &|n| run.map_class_name(n))
    } else {
        run.map_class_name(name)
    }
}

fn collect_pool_edits(class: &ClassFile, run: &mut RemapRun) -> Result<Vec<PoolEdit>> {
    let pool = &class.pool;
    let count = pool.count();
    let class_name = class.this_name()?.to_string();
    let bsms = match class.attribute(names::BOOTSTRAP_METHODS) {
        Some(attr) => attrs::parse_bootstrap_methods(&attr.info)?,
        None => Vec::new(),
    };
    let mut edits = Vec::new();
    for index in 1..count {
        match pool.item(index)? {
            Item::Class { name } => {
                let original = pool.utf8(*name)?;
                let mapped = map_class_constant(run, original);
                if mapped != original {
                    edits.push(PoolEdit::Class { index, mapped });
                }
            }
            Item::MethodType { descriptor } => {
                let original = pool.utf8(*descriptor)?;
                let mapped = remap_method_desc_with(original, &|n| run.map_class_name(n))?;
                if mapped != original {
                    edits.push(PoolEdit::MethodType { index, descriptor: mapped });
                }
            }
            _ => {}
        }
    }
    // Member references need the resolver, which needs `run` mutably,
    // so they are walked separately from the closure-based remaps.
    for index in 1..count {
        let (kind, class_index, name_and_type) = match pool.item(index)? {
            Item::FieldRef { class, name_and_type } => (RefKind::Field, *class, *name_and_type),
            Item::MethodRef { class, name_and_type } => (RefKind::Method, *class, *name_and_type),
            Item::InterfaceMethodRef { class, name_and_type } => {
                (RefKind::InterfaceMethod, *class, *name_and_type)
            }
            Item::InvokeDynamic { bootstrap, name_and_type } => {
                let (site_name, site_desc) = pool.name_and_type(*name_and_type)?;
                let bsm = bsms.get(*bootstrap as usize).ok_or_else(|| {
                    Error::bootstrap_shape(&class_name, site_name, "bootstrap index out of range")
                })?;
                let mapped_name = if locals::is_metafactory(pool, bsm)? {
                    // The call-site name is a method of the functional
                    // interface named by the site's return type; its
                    // descriptor is the bootstrap's first argument.
                    let iface = return_descriptor(site_desc)?;
                    let iface = iface
                        .strip_prefix('L')
                        .and_then(|r| r.strip_suffix(';'))
                        .ok_or_else(|| {
                            Error::bootstrap_shape(
                                &class_name,
                                site_name,
                                "lambda call site does not return an object type",
                            )
                        })?
                        .to_string();
                    let sam_index = *bsm.arguments.first().ok_or_else(|| {
                        Error::bootstrap_shape(&class_name, site_name, "metafactory without arguments")
                    })?;
                    let sam_desc = match pool.item(sam_index)? {
                        Item::MethodType { descriptor } => pool.utf8(*descriptor)?.to_string(),
                        _ => {
                            return Err(Error::bootstrap_shape(
                                &class_name,
                                site_name,
                                "metafactory argument 0 is not a method type",
                            ))
                        }
                    };
                    let site_name = site_name.to_string();
                    let site_desc = site_desc.to_string();
                    let mapped = run.map_method_name(&iface, &site_name, &sam_desc);
                    let mapped_desc = remap_method_desc_with(&site_desc, &|n| run.map_class_name(n))?;
                    if mapped != site_name || mapped_desc != site_desc {
                        edits.push(PoolEdit::CallSite {
                            index,
                            bootstrap: *bootstrap,
                            name: mapped,
                            descriptor: mapped_desc,
                        });
                    }
                    continue;
                } else {
                    site_name.to_string()
                };
                let mapped_desc = remap_method_desc_with(site_desc, &|n| run.map_class_name(n))?;
                if mapped_desc != site_desc {
                    edits.push(PoolEdit::CallSite {
                        index,
                        bootstrap: *bootstrap,
                        name: mapped_name,
                        descriptor: mapped_desc,
                    });
                }
                continue;
            }
            Item::Dynamic { bootstrap, name_and_type } => {
                let (name, descriptor) = pool.name_and_type(*name_and_type)?;
                let mapped_desc = remap_type_with(descriptor, &|n| run.map_class_name(n));
                if mapped_desc != descriptor {
                    edits.push(PoolEdit::DynamicConstant {
                        index,
                        bootstrap: *bootstrap,
                        name: name.to_string(),
                        descriptor: mapped_desc,
                    });
                }
                continue;
            }
            _ => continue,
        };
        let owner = pool.class_name(class_index)?.to_string();
        let (name, descriptor) = pool.name_and_type(name_and_type)?;
        let (name, descriptor) = (name.to_string(), descriptor.to_string());
        let (mapped_name, mapped_desc) = match kind {
            RefKind::Field => (
                run.map_field_name(&owner, &name, &descriptor),
                remap_type_with(&descriptor, &|n| run.map_class_name(n)),
            ),
            RefKind::Method | RefKind::InterfaceMethod => (
                if name == CONSTRUCTOR_METHOD_NAME || name == "<clinit>" {
                    name.clone()
                } else {
                    run.map_method_name(&owner, &name, &descriptor)
                },
                remap_method_desc_with(&descriptor, &|n| run.map_class_name(n))?,
            ),
        };
        if mapped_name != name || mapped_desc != descriptor {
            edits.push(PoolEdit::MemberRef {
                index,
                kind,
                class: class_index,
                name: mapped_name,
                descriptor: mapped_desc,
            });
        }
    }
    Ok(edits)
}

fn apply_pool_edits(pool: &mut ConstantPool, edits: Vec<PoolEdit>) {
    for edit in edits {
        match edit {
            PoolEdit::Class { index, mapped } => {
                let name = pool.add_utf8(&mapped);
                pool.set_item(index, Item::Class { name });
            }
            PoolEdit::MemberRef { index, kind, class, name, descriptor } => {
                let name_and_type = pool.add_name_and_type(&name, &descriptor);
                let item = match kind {
                    RefKind::Field => Item::FieldRef { class, name_and_type },
                    RefKind::Method => Item::MethodRef { class, name_and_type },
                    RefKind::InterfaceMethod => Item::InterfaceMethodRef { class, name_and_type },
                };
                pool.set_item(index, item);
            }
            PoolEdit::CallSite { index, bootstrap, name, descriptor } => {
                let name_and_type = pool.add_name_and_type(&name, &descriptor);
                pool.set_item(index, Item::InvokeDynamic { bootstrap, name_and_type });
            }
            PoolEdit::MethodType { index, descriptor } => {
                let descriptor = pool.add_utf8(&descriptor);
                pool.set_item(index, Item::MethodType { descriptor });
            }
            PoolEdit::DynamicConstant { index, bootstrap, name, descriptor } => {
                let name_and_type = pool.add_name_and_type(&name, &descriptor);
                pool.set_item(index, Item::Dynamic { bootstrap, name_and_type });
            }
        }
    }
}

/// EnclosingMethod's method reference, resolved with original names
/// before the pool edits land.
fn enclosing_method_edit(class: &ClassFile, run: &mut RemapRun) -> Result<Option<(String, String)>> {
    let Some(attr) = class.attribute(names::ENCLOSING_METHOD) else {
        return Ok(None);
    };
    let mut r = ByteReader::new(&attr.info);
    let class_index = r.u16()?;
    let method_index = r.u16()?;
    if method_index == 0 {
        return Ok(None);
    }
    let owner = class.pool.class_name(class_index)?.to_string();
    let (name, descriptor) = class.pool.name_and_type(method_index)?;
    let (name, descriptor) = (name.to_string(), descriptor.to_string());
    let mapped = run.map_method_name(&owner, &name, &descriptor);
    let mapped_desc = remap_method_desc_with(&descriptor, &|n| run.map_class_name(n))?;
    if mapped == name && mapped_desc == descriptor {
        return Ok(None);
    }
    Ok(Some((mapped, mapped_desc)))
}

/// Simple (post-`$`) name of a mapped inner class.
fn inner_simple_name(mapped: &str) -> &str {
    mapped
        .rsplit(|c| c == '/' || c == '$')
        .next()
        .unwrap_or(mapped)
}

/// InnerClasses inner-name repoints: (entry position, new simple name).
fn inner_class_edits(class: &ClassFile, run: &RemapRun) -> Result<Vec<(usize, String)>> {
    let Some(attr) = class.attribute(names::INNER_CLASSES) else {
        return Ok(Vec::new());
    };
    let mut r = ByteReader::new(&attr.info);
    let count = r.u16()? as usize;
    let mut edits = Vec::new();
    for i in 0..count {
        let inner = r.u16()?;
        r.u16()?; // outer_class_info
        let inner_name = r.u16()?;
        r.u16()?; // access
        if inner_name == 0 {
            continue;
        }
        let original_full = class.pool.class_name(inner)?;
        let mapped_full = run.map_class_name(original_full);
        if mapped_full == original_full {
            continue;
        }
        edits.push((i, inner_simple_name(&mapped_full).to_string()));
    }
    Ok(edits)
}

/// Remap every symbol in the class: pool constants, member tables,
/// local variable descriptors, enclosing/inner class records.
pub fn apply(class: &mut ClassFile, run: &mut RemapRun) -> Result<()> {
    let this_name = class.this_name()?.to_string();

    let pool_edits = collect_pool_edits(class, run)?;
    let enclosing = enclosing_method_edit(class, run)?;
    let inner_edits = inner_class_edits(class, run)?;

    // Member tables resolve before the pool changes underneath them.
    let mut member_edits: Vec<(bool, usize, String, String)> = Vec::new();
    for (i, field) in class.fields.iter().enumerate() {
        let name = field.name(&class.pool)?.to_string();
        let descriptor = field.descriptor(&class.pool)?.to_string();
        let mapped = run.map_field_name(&this_name, &name, &descriptor);
        let mapped_desc = remap_type_with(&descriptor, &|n| run.map_class_name(n));
        if mapped != name || mapped_desc != descriptor {
            member_edits.push((true, i, mapped, mapped_desc));
        }
    }
    for (i, method) in class.methods.iter().enumerate() {
        let name = method.name(&class.pool)?.to_string();
        let descriptor = method.descriptor(&class.pool)?.to_string();
        let mapped = if name == CONSTRUCTOR_METHOD_NAME || name == "<clinit>" {
            name.clone()
        } else {
            run.map_method_name(&this_name, &name, &descriptor)
        };
        let mapped_desc = remap_method_desc_with(&descriptor, &|n| run.map_class_name(n))?;
        if mapped != name || mapped_desc != descriptor {
            member_edits.push((false, i, mapped, mapped_desc));
        }
    }

    apply_pool_edits(&mut class.pool, pool_edits);

    for (is_field, i, name, descriptor) in member_edits {
        let name_index = class.pool.add_utf8(&name);
        let descriptor_index = class.pool.add_utf8(&descriptor);
        let member = if is_field { &mut class.fields[i] } else { &mut class.methods[i] };
        member.name_index = name_index;
        member.descriptor_index = descriptor_index;
    }

    if let Some((name, descriptor)) = enclosing {
        let name_and_type = class.pool.add_name_and_type(&name, &descriptor);
        if let Some(attr) = class.attribute_mut(names::ENCLOSING_METHOD) {
            attr.info[2..4].copy_from_slice(&name_and_type.to_be_bytes());
        }
    }

    if !inner_edits.is_empty() {
        let mut indices = Vec::with_capacity(inner_edits.len());
        for (pos, simple) in &inner_edits {
            indices.push((*pos, class.pool.add_utf8(simple)));
        }
        if let Some(attr) = class.attribute_mut(names::INNER_CLASSES) {
            for (pos, utf8) in indices {
                let at = 2 + pos * 8 + 4;
                attr.info[at..at + 2].copy_from_slice(&utf8.to_be_bytes());
            }
        }
    }

    // Local variable type descriptors. Utf8 entries are never mutated,
    // so the original descriptors are still readable after the pool
    // edits above.
    let ClassFile { pool, methods, .. } = class;
    for method in methods.iter_mut() {
        let Some(code_attr) = method.attribute_mut(&*pool, names::CODE) else {
            continue;
        };
        let mut body = attrs::CodeBody::parse(&code_attr.info)?;
        let mut changed = false;
        for attr in &mut body.attributes {
            if pool.utf8(attr.name_index)? != names::LOCAL_VARIABLE_TABLE {
                continue;
            }
            let mut entries = attrs::parse_local_vars(&attr.info)?;
            let mut any = false;
            for entry in &mut entries {
                let descriptor = pool.utf8(entry.descriptor_index)?.to_string();
                let mapped = remap_type_with(&descriptor, &|n| run.map_class_name(n));
                if mapped != descriptor {
                    entry.descriptor_index = pool.add_utf8(&mapped);
                    any = true;
                }
            }
            if any {
                attr.info = attrs::write_local_vars(&entries);
                changed = true;
            }
        }
        if changed {
            let rebuilt = body.to_bytes();
            if let Some(code_attr) = method.attribute_mut(&*pool, names::CODE) {
                code_attr.info = rebuilt;
            }
        }
    }

    Ok(())
}
