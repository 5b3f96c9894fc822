//! Descriptor parsing and rewriting
//!
//! Descriptors are handled as strings; the only structure this crate
//! needs is the parameter split, slot widths, and substitution of class
//! names inside `L...;` references.

use crate::error::{Error, Result};

use super::defs::opcodes;

/// Split a method descriptor into its parameter type descriptors.
pub fn parameter_descriptors(descriptor: &str) -> Result<Vec<String>> {
    let inner = descriptor
        .strip_prefix('(')
        .and_then(|rest| rest.split_once(')').map(|(params, _)| params))
        .ok_or_else(|| Error::class_parse(format!("malformed method descriptor: {descriptor}")))?;
    let bytes = inner.as_bytes();
    let mut params = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        let start = pos;
        while bytes.get(pos) == Some(&b'[') {
            pos += 1;
        }
        let tag = *bytes.get(pos).ok_or_else(|| {
            Error::class_parse(format!("truncated array type in {descriptor}"))
        })?;
        match tag {
            b'L' => {
                let end = inner[pos..]
                    .find(';')
                    .ok_or_else(|| Error::class_parse(format!("unterminated class reference in {descriptor}")))?;
                pos += end + 1;
            }
            b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' => pos += 1,
            other => {
                return Err(Error::class_parse(format!(
                    "unexpected descriptor character '{}' in {descriptor}",
                    other as char
                )))
            }
        }
        params.push(inner[start..pos].to_string());
    }
    Ok(params)
}

/// Return type descriptor of a method descriptor.
pub fn return_descriptor(descriptor: &str) -> Result<&str> {
    descriptor
        .split_once(')')
        .map(|(_, ret)| ret)
        .ok_or_else(|| Error::class_parse(format!("malformed method descriptor: {descriptor}")))
}

/// Local-variable slots occupied by a value of this type.
pub fn slot_width(type_descriptor: &str) -> u16 {
    match type_descriptor {
        "J" | "D" => 2,
        _ => 1,
    }
}

/// Total slot width of a method's parameters, `this` excluded.
pub fn parameter_window(descriptor: &str) -> Result<u16> {
    Ok(parameter_descriptors(descriptor)?
        .iter()
        .map(|p| slot_width(p))
        .sum())
}

/// Load opcode matching a type descriptor (the 1-byte-index form).
pub fn load_opcode(type_descriptor: &str) -> u8 {
    match type_descriptor.as_bytes()[0] {
        b'J' => opcodes::LLOAD,
        b'F' => opcodes::FLOAD,
        b'D' => opcodes::DLOAD,
        b'L' | b'[' => opcodes::ALOAD,
        _ => opcodes::ILOAD,
    }
}

/// Internal name of the class a field-type descriptor refers to, if any
/// (arrays unwrap to their element type).
pub fn referenced_class(type_descriptor: &str) -> Option<&str> {
    let elem = type_descriptor.trim_start_matches('[');
    elem.strip_prefix('L').and_then(|rest| rest.strip_suffix(';'))
}

/// Rewrite every `L<name>;` reference in a field-type descriptor.
pub fn remap_type_with(type_descriptor: &str, map: &impl Fn(&str) -> String) -> String {
    match referenced_class(type_descriptor) {
        Some(name) => {
            let dims = type_descriptor.len() - (name.len() + 2);
            let mut out = String::with_capacity(type_descriptor.len());
            out.push_str(&type_descriptor[..dims]);
            out.push('L');
            out.push_str(&map(name));
            out.push(';');
            out
        }
        None => type_descriptor.to_string(),
    }
}

/// Rewrite every class reference in a method descriptor.
pub fn remap_method_desc_with(descriptor: &str, map: &impl Fn(&str) -> String) -> Result<String> {
    let mut out = String::with_capacity(descriptor.len());
    out.push('(');
    for param in parameter_descriptors(descriptor)? {
        out.push_str(&remap_type_with(&param, map));
    }
    out.push(')');
    out.push_str(&remap_type_with(return_descriptor(descriptor)?, map));
    Ok(out)
}
