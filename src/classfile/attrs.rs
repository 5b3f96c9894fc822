//! Attribute payload codecs
//!
//! Attributes are carried as raw bytes (`AttributeInfo`) and decoded on
//! demand: `CodeBody` for method bodies, `LocalVarEntry` lists for
//! LocalVariableTable, `BootstrapMethod` lists for BootstrapMethods.
//! The decoders re-serialize exactly what they parsed when nothing was
//! edited.

use super::reader::ByteReader;
use crate::error::{Error, Result};

pub mod names {
    pub const CODE: &str = "Code";
    pub const LOCAL_VARIABLE_TABLE: &str = "LocalVariableTable";
    pub const BOOTSTRAP_METHODS: &str = "BootstrapMethods";
    pub const INNER_CLASSES: &str = "InnerClasses";
    pub const ENCLOSING_METHOD: &str = "EnclosingMethod";
    pub const SOURCE_FILE: &str = "SourceFile";
    pub const DEPRECATED: &str = "Deprecated";
    pub const CONSTANT_VALUE: &str = "ConstantValue";
    pub const METHOD_PARAMETERS: &str = "MethodParameters";
    pub const RUNTIME_VISIBLE_PARAMETER_ANNOTATIONS: &str = "RuntimeVisibleParameterAnnotations";
    pub const RUNTIME_INVISIBLE_PARAMETER_ANNOTATIONS: &str =
        "RuntimeInvisibleParameterAnnotations";
}

/// One attribute, payload undecoded.
#[derive(Debug, Clone)]
pub struct AttributeInfo {
    pub name_index: u16,
    pub info: Vec<u8>,
}

impl AttributeInfo {
    pub fn new(name_index: u16, info: Vec<u8>) -> Self {
        Self { name_index, info }
    }
}

pub fn parse_attributes(r: &mut ByteReader<'_>) -> Result<Vec<AttributeInfo>> {
    let count = r.u16()? as usize;
    let mut attributes = Vec::with_capacity(count);
    for _ in 0..count {
        let name_index = r.u16()?;
        let len = r.u32()? as usize;
        attributes.push(AttributeInfo::new(name_index, r.bytes(len)?.to_vec()));
    }
    Ok(attributes)
}

pub fn write_attributes(bytes: &mut Vec<u8>, attributes: &[AttributeInfo]) {
    bytes.extend_from_slice(&(attributes.len() as u16).to_be_bytes());
    for attr in attributes {
        bytes.extend_from_slice(&attr.name_index.to_be_bytes());
        bytes.extend_from_slice(&(attr.info.len() as u32).to_be_bytes());
        bytes.extend_from_slice(&attr.info);
    }
}

/// Decoded Code attribute. The exception table is kept raw; nothing in
/// this crate edits it.
#[derive(Debug, Clone)]
pub struct CodeBody {
    pub max_stack: u16,
    pub max_locals: u16,
    pub code: Vec<u8>,
    pub exception_table: Vec<u8>,
    pub attributes: Vec<AttributeInfo>,
}

impl CodeBody {
    pub fn parse(info: &[u8]) -> Result<Self> {
        let mut r = ByteReader::new(info);
        let max_stack = r.u16()?;
        let max_locals = r.u16()?;
        let code_len = r.u32()? as usize;
        let code = r.bytes(code_len)?.to_vec();
        let exception_count = r.u16()? as usize;
        let exception_table = r.bytes(exception_count * 8)?.to_vec();
        let attributes = parse_attributes(&mut r)?;
        Ok(Self { max_stack, max_locals, code, exception_table, attributes })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&self.max_stack.to_be_bytes());
        bytes.extend_from_slice(&self.max_locals.to_be_bytes());
        bytes.extend_from_slice(&(self.code.len() as u32).to_be_bytes());
        bytes.extend_from_slice(&self.code);
        bytes.extend_from_slice(&((self.exception_table.len() / 8) as u16).to_be_bytes());
        bytes.extend_from_slice(&self.exception_table);
        write_attributes(&mut bytes, &self.attributes);
        bytes
    }
}

/// One LocalVariableTable entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalVarEntry {
    pub start_pc: u16,
    pub length: u16,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub index: u16,
}

pub fn parse_local_vars(info: &[u8]) -> Result<Vec<LocalVarEntry>> {
    let mut r = ByteReader::new(info);
    let count = r.u16()? as usize;
    let mut entries = Vec::with_capacity(count);
    for _ in 0..count {
        entries.push(LocalVarEntry {
            start_pc: r.u16()?,
            length: r.u16()?,
            name_index: r.u16()?,
            descriptor_index: r.u16()?,
            index: r.u16()?,
        });
    }
    Ok(entries)
}

pub fn write_local_vars(entries: &[LocalVarEntry]) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&(entries.len() as u16).to_be_bytes());
    for e in entries {
        bytes.extend_from_slice(&e.start_pc.to_be_bytes());
        bytes.extend_from_slice(&e.length.to_be_bytes());
        bytes.extend_from_slice(&e.name_index.to_be_bytes());
        bytes.extend_from_slice(&e.descriptor_index.to_be_bytes());
        bytes.extend_from_slice(&e.index.to_be_bytes());
    }
    bytes
}

/// One BootstrapMethods entry.
#[derive(Debug, Clone)]
pub struct BootstrapMethod {
    pub method_handle: u16,
    pub arguments: Vec<u16>,
}

pub fn parse_bootstrap_methods(info: &[u8]) -> Result<Vec<BootstrapMethod>> {
    let mut r = ByteReader::new(info);
    let count = r.u16()? as usize;
    let mut methods = Vec::with_capacity(count);
    for _ in 0..count {
        let method_handle = r.u16()?;
        let arg_count = r.u16()? as usize;
        let mut arguments = Vec::with_capacity(arg_count);
        for _ in 0..arg_count {
            arguments.push(r.u16()?);
        }
        methods.push(BootstrapMethod { method_handle, arguments });
    }
    Ok(methods)
}

fn skip_element_value(r: &mut ByteReader<'_>) -> Result<()> {
    let tag = r.u8()?;
    match tag {
        b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' | b's' | b'c' => {
            r.u16()?;
        }
        b'e' => {
            r.u16()?;
            r.u16()?;
        }
        b'@' => skip_annotation(r)?,
        b'[' => {
            let count = r.u16()? as usize;
            for _ in 0..count {
                skip_element_value(r)?;
            }
        }
        _ => return Err(Error::class_parse(format!("unknown element value tag {tag}"))),
    }
    Ok(())
}

fn skip_annotation(r: &mut ByteReader<'_>) -> Result<()> {
    r.u16()?; // type_index
    let pair_count = r.u16()? as usize;
    for _ in 0..pair_count {
        r.u16()?; // element_name_index
        skip_element_value(r)?;
    }
    Ok(())
}

/// Drop the first `shift` per-parameter annotation lists of a
/// Runtime(In)VisibleParameterAnnotations payload. javac indexes these
/// attributes by source parameter on some constructors whose descriptor
/// carries compiler-synthesized leading parameters; dropping the
/// synthetic prefix realigns them.
pub fn shift_parameter_annotations(info: &[u8], shift: usize) -> Result<Vec<u8>> {
    let mut r = ByteReader::new(info);
    let param_count = r.u8()? as usize;
    if shift >= param_count {
        // Nothing beyond the synthetic prefix; leave untouched.
        return Ok(info.to_vec());
    }
    let mut boundaries = Vec::with_capacity(param_count + 1);
    for _ in 0..param_count {
        boundaries.push(r.remaining());
        let annotation_count = r.u16()? as usize;
        for _ in 0..annotation_count {
            skip_annotation(&mut r)?;
        }
    }
    boundaries.push(r.remaining());

    let cut = info.len() - boundaries[shift];
    let mut out = Vec::with_capacity(1 + info.len() - cut);
    out.push((param_count - shift) as u8);
    out.extend_from_slice(&info[cut..]);
    Ok(out)
}
