//! Parameter annotation realignment on constructors
//!
//! javac writes parameter annotation tables on some constructors with
//! entries for the compiler-synthesized leading parameters: the enum
//! name/ordinal pair, or the captured outer instance of an inner/local
//! class. Dropping that prefix shifts every annotation onto the
//! parameter the source code declared it on.

use crate::classfile::attrs::{names, shift_parameter_annotations};
use crate::classfile::defs::access_flags::{ACC_ENUM, ACC_STATIC};
use crate::classfile::defs::CONSTRUCTOR_METHOD_NAME;
use crate::classfile::descriptor::parameter_descriptors;
use crate::classfile::reader::{ByteReader, ClassFile};
use crate::error::Result;

/// Synthesized parameter prefix of this class's constructors: the enum
/// name/ordinal pair, or the outer instance of a non-static inner or
/// local class.
enum SyntheticPrefix {
    EnumPair,
    OuterInstance(String),
}

fn synthetic_prefix(class: &ClassFile) -> Result<Option<SyntheticPrefix>> {
    if class.access_flags & ACC_ENUM != 0 {
        return Ok(Some(SyntheticPrefix::EnumPair));
    }
    if let Some(attr) = class.attribute(names::ENCLOSING_METHOD) {
        let mut r = ByteReader::new(&attr.info);
        let outer = class.pool.class_name(r.u16()?)?.to_string();
        return Ok(Some(SyntheticPrefix::OuterInstance(outer)));
    }
    if let Some(attr) = class.attribute(names::INNER_CLASSES) {
        let this_name = class.this_name()?;
        let mut r = ByteReader::new(&attr.info);
        let count = r.u16()?;
        for _ in 0..count {
            let inner = r.u16()?;
            let outer = r.u16()?;
            r.u16()?; // inner_name
            let access = r.u16()?;
            if class.pool.class_name(inner)? == this_name
                && outer != 0
                && access & ACC_STATIC == 0
            {
                let outer_name = class.pool.class_name(outer)?.to_string();
                return Ok(Some(SyntheticPrefix::OuterInstance(outer_name)));
            }
        }
    }
    Ok(None)
}

/// Width of the prefix actually present in this constructor's
/// descriptor; a constructor whose leading parameters are not the
/// synthesized ones is left alone.
fn prefix_width(prefix: &SyntheticPrefix, params: &[String]) -> usize {
    match prefix {
        SyntheticPrefix::EnumPair => {
            if params.len() > 2 && params[0] == "Ljava/lang/String;" && params[1] == "I" {
                2
            } else {
                0
            }
        }
        SyntheticPrefix::OuterInstance(outer) => {
            if params.len() > 1 && params[0] == format!("L{outer};") {
                1
            } else {
                0
            }
        }
    }
}

pub fn apply(class: &mut ClassFile) -> Result<()> {
    let Some(prefix) = synthetic_prefix(class)? else {
        return Ok(());
    };
    let ClassFile { pool, methods, .. } = class;
    for method in methods.iter_mut() {
        if method.name(pool)? != CONSTRUCTOR_METHOD_NAME {
            continue;
        }
        let params = parameter_descriptors(method.descriptor(pool)?)?;
        let shift = prefix_width(&prefix, &params);
        if shift == 0 {
            continue;
        }
        for attr_name in [
            names::RUNTIME_VISIBLE_PARAMETER_ANNOTATIONS,
            names::RUNTIME_INVISIBLE_PARAMETER_ANNOTATIONS,
        ] {
            if let Some(attr) = method.attribute_mut(pool, attr_name) {
                attr.info = shift_parameter_annotations(&attr.info, shift)?;
            }
        }
    }
    Ok(())
}
