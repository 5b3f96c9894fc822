//! Local variable reconstruction and lambda capture tracking
//!
//! Regenerates collision-free local variable names and carries
//! captured-variable identity from an enclosing method into the
//! compiler-generated method holding the lambda body.
//!
//! Methods are visited in file order. The compiler emits a lambda body
//! after the method that creates it, so by the time the body is
//! visited its capture binding has already been discovered while
//! scanning the creating method's `invokedynamic` sites.

use std::collections::HashMap;

use crate::classfile::attrs::{self, names, BootstrapMethod, CodeBody};
use crate::classfile::defs::access_flags::ACC_STATIC;
use crate::classfile::defs::handle_kinds::H_INVOKESTATIC;
use crate::classfile::defs::{instruction_length, opcodes};
use crate::classfile::descriptor::{parameter_descriptors, slot_width};
use crate::classfile::reader::{ByteReader, ClassFile};
use crate::classfile::{ConstantPool, Item};
use crate::context::RemapRun;
use crate::error::{Error, Result};

const METAFACTORY_OWNER: &str = "java/lang/invoke/LambdaMetafactory";

/// Capture state of one lambda target method.
struct CaptureBinding {
    enclosing: (String, String),
    captures: Vec<String>,
}

/// Naming context of one method: everything `name_for_slot` needs.
struct NamingCtx {
    name: String,
    descriptor: String,
    is_instance: bool,
    depth: u32,
    captures: Vec<String>,
    /// Starting slot of each declared parameter, `this` excluded.
    param_slots: Vec<u16>,
    /// One past the last parameter slot.
    window_end: u16,
}

impl NamingCtx {
    fn name_for_slot(&self, slot: u16) -> String {
        if self.is_instance && slot == 0 {
            return "this".to_string();
        }
        if (slot as usize) < self.captures.len() {
            return self.captures[slot as usize].clone();
        }
        if slot < self.window_end {
            let k = self
                .param_slots
                .iter()
                .take_while(|&&start| start <= slot)
                .count()
                .saturating_sub(1);
            return match self.depth {
                0 => format!("param{k}"),
                1 => format!("l_param{k}"),
                d => format!("l{d}_param{k}"),
            };
        }
        format!("var{slot}")
    }
}

/// Is this bootstrap entry one of the two lambda metafactory handles?
pub(crate) fn is_metafactory(pool: &ConstantPool, bsm: &BootstrapMethod) -> Result<bool> {
    let (kind, reference) = match pool.item(bsm.method_handle)? {
        Item::MethodHandle { kind, reference } => (*kind, *reference),
        _ => return Ok(false),
    };
    if kind != H_INVOKESTATIC {
        return Ok(false);
    }
    let (class, name_and_type) = match pool.item(reference)? {
        Item::MethodRef { class, name_and_type }
        | Item::InterfaceMethodRef { class, name_and_type } => (*class, *name_and_type),
        _ => return Ok(false),
    };
    let (name, _) = pool.name_and_type(name_and_type)?;
    Ok(pool.class_name(class)? == METAFACTORY_OWNER
        && (name == "metafactory" || name == "altMetafactory"))
}

/// (owner, name, descriptor) of the implementation method a metafactory
/// bootstrap points at; errors when the constant shape is not the one
/// the compiler emits.
pub(crate) fn implementation_method(
    pool: &ConstantPool,
    bsm: &BootstrapMethod,
    owner_class: &str,
    in_method: &str,
) -> Result<(String, String, String)> {
    let shape_err = |message: &str| Error::bootstrap_shape(owner_class, in_method, message);
    let handle_index = *bsm
        .arguments
        .get(1)
        .ok_or_else(|| shape_err("metafactory bootstrap with fewer than 2 arguments"))?;
    let reference = match pool.item(handle_index)? {
        Item::MethodHandle { reference, .. } => *reference,
        _ => return Err(shape_err("metafactory argument 1 is not a method handle")),
    };
    let (class, name_and_type) = match pool.item(reference)? {
        Item::MethodRef { class, name_and_type }
        | Item::InterfaceMethodRef { class, name_and_type } => (*class, *name_and_type),
        _ => return Err(shape_err("implementation handle does not reference a method")),
    };
    let (name, descriptor) = pool.name_and_type(name_and_type)?;
    Ok((
        pool.class_name(class)?.to_string(),
        name.to_string(),
        descriptor.to_string(),
    ))
}

/// Slot index loaded by the instruction at `pc`, if it is a local load.
fn load_slot(code: &[u8], pc: usize) -> Option<u16> {
    let op = code[pc];
    match op {
        opcodes::ILOAD..=opcodes::ALOAD => code.get(pc + 1).map(|&b| b as u16),
        0x1a..=0x2d => Some(((op - 0x1a) % 4) as u16),
        opcodes::WIDE => {
            let modified = *code.get(pc + 1)?;
            if (opcodes::ILOAD..=opcodes::ALOAD).contains(&modified) {
                let hi = *code.get(pc + 2)? as u16;
                let lo = *code.get(pc + 3)? as u16;
                Some((hi << 8) | lo)
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Class-wide depth baseline: one level below the enclosing method for
/// anonymous/local classes, 0 otherwise.
fn enclosing_depth(class: &ClassFile, run: &mut RemapRun) -> Result<u32> {
    let Some(attr) = class.attribute(names::ENCLOSING_METHOD) else {
        return Ok(0);
    };
    let mut r = ByteReader::new(&attr.info);
    let class_index = r.u16()?;
    let method_index = r.u16()?;
    if method_index == 0 {
        return Ok(0);
    }
    let outer_class = class.pool.class_name(class_index)?.to_string();
    let (outer_name, outer_desc) = class.pool.name_and_type(method_index)?;
    let (outer_name, outer_desc) = (outer_name.to_string(), outer_desc.to_string());
    Ok(run.method_depth(&outer_class, &outer_name, &outer_desc)? + 1)
}

fn discover_captures(
    class: &ClassFile,
    bsms: &[BootstrapMethod],
    body_code: &[u8],
    ctx: &NamingCtx,
    class_name: &str,
    bindings: &mut HashMap<(String, String), CaptureBinding>,
) -> Result<()> {
    let pool = &class.pool;
    let mut insns: Vec<usize> = Vec::new();
    let mut pc = 0;
    while pc < body_code.len() {
        insns.push(pc);
        pc += instruction_length(body_code, pc)?;
    }

    for (i, &pc) in insns.iter().enumerate() {
        if body_code[pc] != opcodes::INVOKEDYNAMIC {
            continue;
        }
        let hi = *body_code
            .get(pc + 1)
            .ok_or_else(|| Error::class_parse("truncated invokedynamic instruction"))?;
        let lo = *body_code
            .get(pc + 2)
            .ok_or_else(|| Error::class_parse("truncated invokedynamic instruction"))?;
        let index = ((hi as u16) << 8) | lo as u16;
        let (bootstrap, name_and_type) = match pool.item(index)? {
            Item::InvokeDynamic { bootstrap, name_and_type } => (*bootstrap, *name_and_type),
            other => {
                return Err(Error::class_parse(format!(
                    "invokedynamic operand #{index} is not an InvokeDynamic constant: {other:?}"
                )))
            }
        };
        let bsm = bsms.get(bootstrap as usize).ok_or_else(|| {
            Error::bootstrap_shape(class_name, &ctx.name, "bootstrap method index out of range")
        })?;
        if !is_metafactory(pool, bsm)? {
            continue;
        }
        let (_, site_desc) = pool.name_and_type(name_and_type)?;
        let capture_count = parameter_descriptors(site_desc)?.len();
        let (impl_owner, impl_name, impl_desc) =
            implementation_method(pool, bsm, class_name, &ctx.name)?;
        if impl_owner != class_name {
            continue;
        }
        if capture_count > i {
            log::debug!(
                "{class_name}.{}: call site captures more values than preceding instructions",
                ctx.name
            );
            continue;
        }
        let mut captures = Vec::with_capacity(capture_count);
        let mut all_loads = true;
        for &load_pc in &insns[i - capture_count..i] {
            match load_slot(body_code, load_pc) {
                Some(slot) => captures.push(ctx.name_for_slot(slot)),
                None => {
                    all_loads = false;
                    break;
                }
            }
        }
        if !all_loads {
            log::debug!(
                "{class_name}.{}: non-load instruction before lambda call site, captures unknown",
                ctx.name
            );
            continue;
        }
        bindings.insert(
            (impl_name, impl_desc),
            CaptureBinding { enclosing: (ctx.name.clone(), ctx.descriptor.clone()), captures },
        );
    }
    Ok(())
}

/// Visit every method in file order, computing depth and capture state.
/// Depths are stored into the run's depth table as a side effect.
fn analyze(class: &ClassFile, run: &mut RemapRun) -> Result<Vec<NamingCtx>> {
    let class_name = class.this_name()?.to_string();
    let class_base = enclosing_depth(class, run)?;
    let bsms = match class.attribute(names::BOOTSTRAP_METHODS) {
        Some(attr) => attrs::parse_bootstrap_methods(&attr.info)?,
        None => Vec::new(),
    };

    let mut bindings: HashMap<(String, String), CaptureBinding> = HashMap::new();
    let mut local_depths: HashMap<(String, String), u32> = HashMap::new();
    let mut contexts = Vec::with_capacity(class.methods.len());

    for method in &class.methods {
        let name = method.name(&class.pool)?.to_string();
        let descriptor = method.descriptor(&class.pool)?.to_string();
        let is_instance = method.access_flags & ACC_STATIC == 0;

        let base = if is_instance { 1u16 } else { 0 };
        let mut param_slots = Vec::new();
        let mut next = base;
        for param in parameter_descriptors(&descriptor)? {
            param_slots.push(next);
            next += slot_width(&param);
        }
        let window_end = next;

        let key = (name.clone(), descriptor.clone());
        let (depth, captures) = match bindings.get(&key) {
            Some(binding) => (
                local_depths.get(&binding.enclosing).copied().unwrap_or(class_base) + 1,
                binding.captures.clone(),
            ),
            None => (class_base, Vec::new()),
        };
        local_depths.insert(key, depth);
        run.store_method_depth(&class_name, &name, &descriptor, depth);

        let ctx = NamingCtx {
            name,
            descriptor,
            is_instance,
            depth,
            captures,
            param_slots,
            window_end,
        };

        if let Some(code_attr) = method.attribute(&class.pool, names::CODE) {
            let body = CodeBody::parse(&code_attr.info)?;
            discover_captures(class, &bsms, &body.code, &ctx, &class_name, &mut bindings)?;
        }
        contexts.push(ctx);
    }
    Ok(contexts)
}

/// Depth-only replay used when another class's transformation asks for
/// a method depth here.
pub fn compute_depths(class: &ClassFile, run: &mut RemapRun) -> Result<()> {
    analyze(class, run)?;
    Ok(())
}

/// Rewrite every LocalVariableTable entry of every method.
pub fn apply(class: &mut ClassFile, run: &mut RemapRun) -> Result<()> {
    let contexts = analyze(class, run)?;
    let ClassFile { pool, methods, .. } = class;
    for (method, ctx) in methods.iter_mut().zip(&contexts) {
        let Some(code_attr) = method.attribute_mut(&*pool, names::CODE) else {
            continue;
        };
        let mut body = CodeBody::parse(&code_attr.info)?;
        let mut changed = false;
        for attr in &mut body.attributes {
            if pool.utf8(attr.name_index)? != names::LOCAL_VARIABLE_TABLE {
                continue;
            }
            let mut entries = attrs::parse_local_vars(&attr.info)?;
            for entry in &mut entries {
                entry.name_index = pool.add_utf8(&ctx.name_for_slot(entry.index));
            }
            attr.info = attrs::write_local_vars(&entries);
            changed = true;
        }
        if changed {
            if let Some(code_attr) = method.attribute_mut(&*pool, names::CODE) {
                code_attr.info = body.to_bytes();
            }
        }
    }
    Ok(())
}
