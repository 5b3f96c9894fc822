//! Constructor synthesis for classes stripped of their constructor
//!
//! A class with no declared constructor but with non-static final
//! fields lacking compile-time constants cannot be instantiated
//! correctly by generated code. This stage regenerates a constructor:
//! it forwards the superclass constructor's parameters, then assigns
//! one trailing parameter to each qualifying field.
//!
//! Emission happens before renaming with original names; the rename
//! stage rewrites the references this stage appends to the pool.

use crate::classfile::attrs::{self, names, AttributeInfo, CodeBody, LocalVarEntry};
use crate::classfile::defs::access_flags::ACC_PUBLIC;
use crate::classfile::defs::{opcodes, CONSTRUCTOR_METHOD_NAME};
use crate::classfile::descriptor::{load_opcode, slot_width};
use crate::classfile::reader::{ClassFile, MemberInfo};
use crate::context::{needs_synthesized_ctor, qualifying_final_fields, RemapRun};
use crate::error::Result;
use crate::summary::StructuralSummary;

fn emit_load(code: &mut Vec<u8>, type_descriptor: &str, slot: u16) {
    let op = load_opcode(type_descriptor);
    if slot <= 0xff {
        code.push(op);
        code.push(slot as u8);
    } else {
        code.push(opcodes::WIDE);
        code.push(op);
        code.extend_from_slice(&slot.to_be_bytes());
    }
}

pub fn apply(class: &mut ClassFile, summary: &StructuralSummary, run: &mut RemapRun) -> Result<()> {
    if !needs_synthesized_ctor(summary) {
        return Ok(());
    }
    let class_name = summary.name.clone();
    let super_params = match &summary.super_name {
        Some(super_name) => run.ctor_params(super_name)?,
        None => Vec::new(),
    };
    let fields: Vec<_> = qualifying_final_fields(summary)
        .map(|f| (f.name.clone(), f.descriptor.clone()))
        .collect();
    log::debug!(
        "synthesizing constructor for {class_name}: {} super parameters, {} fields",
        super_params.len(),
        fields.len()
    );

    let mut params: Vec<String> = super_params.clone();
    params.extend(fields.iter().map(|(_, desc)| desc.clone()));
    let ctor_descriptor = format!("({})V", params.join(""));
    let super_descriptor = format!("({})V", super_params.join(""));

    // Parameter slots: `this` at 0, then each parameter by width.
    let mut slots = Vec::with_capacity(params.len());
    let mut next_slot = 1u16;
    for p in &params {
        slots.push(next_slot);
        next_slot += slot_width(p);
    }
    let max_locals = next_slot;

    let super_name = summary.super_name.as_deref().unwrap_or("java/lang/Object");
    let super_ref = class.pool.add_method_ref(super_name, CONSTRUCTOR_METHOD_NAME, &super_descriptor);

    let mut code = Vec::new();
    code.push(opcodes::ALOAD_0);
    for (p, &slot) in super_params.iter().zip(&slots) {
        emit_load(&mut code, p, slot);
    }
    code.push(opcodes::INVOKESPECIAL);
    code.extend_from_slice(&super_ref.to_be_bytes());
    for (i, (field_name, field_desc)) in fields.iter().enumerate() {
        let field_ref = class.pool.add_field_ref(&class_name, field_name, field_desc);
        code.push(opcodes::ALOAD_0);
        emit_load(&mut code, field_desc, slots[super_params.len() + i]);
        code.push(opcodes::PUTFIELD);
        code.extend_from_slice(&field_ref.to_be_bytes());
    }
    code.push(opcodes::RETURN);
    let code_len = code.len() as u16;

    // Stack shape of the straight-line code above: the super call holds
    // `this` plus every forwarded argument, a field store holds `this`
    // plus one value.
    let super_arg_slots: u16 = super_params.iter().map(|p| slot_width(p)).sum();
    let store_stack = fields
        .iter()
        .map(|(_, desc)| 1 + slot_width(desc))
        .max()
        .unwrap_or(1);
    let max_stack = (1 + super_arg_slots).max(store_stack);

    // Local variable names: field parameters get the field's mapped
    // name so the constructor is legible after the rename pass.
    let this_descriptor = format!("L{class_name};");
    let mut locals = vec![LocalVarEntry {
        start_pc: 0,
        length: code_len,
        name_index: class.pool.add_utf8("this"),
        descriptor_index: class.pool.add_utf8(&this_descriptor),
        index: 0,
    }];
    for (p, &slot) in super_params.iter().zip(&slots) {
        locals.push(LocalVarEntry {
            start_pc: 0,
            length: code_len,
            name_index: class.pool.add_utf8(&format!("super_param_{slot}")),
            descriptor_index: class.pool.add_utf8(p),
            index: slot,
        });
    }
    for (i, (field_name, field_desc)) in fields.iter().enumerate() {
        let mapped = run.map_field_name(&class_name, field_name, field_desc);
        locals.push(LocalVarEntry {
            start_pc: 0,
            length: code_len,
            name_index: class.pool.add_utf8(&format!("p_{mapped}")),
            descriptor_index: class.pool.add_utf8(field_desc),
            index: slots[super_params.len() + i],
        });
    }
    let lvt = AttributeInfo::new(
        class.pool.add_utf8(names::LOCAL_VARIABLE_TABLE),
        attrs::write_local_vars(&locals),
    );

    let body = CodeBody {
        max_stack,
        max_locals,
        code,
        exception_table: Vec::new(),
        attributes: vec![lvt],
    };
    let code_attr = AttributeInfo::new(class.pool.add_utf8(names::CODE), body.to_bytes());

    class.methods.push(MemberInfo {
        access_flags: ACC_PUBLIC,
        name_index: class.pool.add_utf8(CONSTRUCTOR_METHOD_NAME),
        descriptor_index: class.pool.add_utf8(&ctor_descriptor),
        attributes: vec![code_attr],
    });

    run.store_ctor_params(&class_name, params);
    Ok(())
}
