//! Constant pool for Java class files
//!
//! The pool is 1-based; slot 0 and the trailing slot of every 8-byte
//! constant hold `Item::Reserved`. During transformation the pool is
//! only ever edited append-only: existing entries keep their indices,
//! new strings are appended and referencing entries repointed, so
//! bytecode operands never need re-encoding.

use std::collections::HashMap;

use super::defs::constant_tags::*;
use crate::error::{Error, Result};

/// One constant pool entry.
///
/// Utf8 payloads are kept as raw bytes (class files use modified UTF-8;
/// re-encoding could change bytes we never touched).
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Utf8(Vec<u8>),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class { name: u16 },
    Str { utf8: u16 },
    FieldRef { class: u16, name_and_type: u16 },
    MethodRef { class: u16, name_and_type: u16 },
    InterfaceMethodRef { class: u16, name_and_type: u16 },
    NameAndType { name: u16, descriptor: u16 },
    MethodHandle { kind: u8, reference: u16 },
    MethodType { descriptor: u16 },
    Dynamic { bootstrap: u16, name_and_type: u16 },
    InvokeDynamic { bootstrap: u16, name_and_type: u16 },
    Module { name: u16 },
    Package { name: u16 },
    /// Slot 0 and the slot after a Long/Double entry.
    Reserved,
}

#[derive(Debug, Clone)]
pub struct ConstantPool {
    items: Vec<Item>,
    utf8_lookup: HashMap<Vec<u8>, u16>,
}

impl ConstantPool {
    pub fn new() -> Self {
        Self {
            items: vec![Item::Reserved],
            utf8_lookup: HashMap::new(),
        }
    }

    /// Number of slots including the reserved slot 0, i.e. the value of
    /// the classfile's `constant_pool_count` field.
    pub fn count(&self) -> u16 {
        self.items.len() as u16
    }

    pub fn item(&self, index: u16) -> Result<&Item> {
        self.items
            .get(index as usize)
            .ok_or_else(|| Error::class_parse(format!("constant pool index {index} out of range")))
    }

    pub fn set_item(&mut self, index: u16, item: Item) {
        self.items[index as usize] = item;
    }

    pub fn utf8(&self, index: u16) -> Result<&str> {
        match self.item(index)? {
            Item::Utf8(bytes) => std::str::from_utf8(bytes)
                .map_err(|_| Error::class_parse(format!("constant #{index} is not valid UTF-8"))),
            other => Err(Error::class_parse(format!(
                "constant #{index} is not Utf8: {other:?}"
            ))),
        }
    }

    /// Name of the class referenced by a `Class` entry.
    pub fn class_name(&self, index: u16) -> Result<&str> {
        match self.item(index)? {
            Item::Class { name } => self.utf8(*name),
            other => Err(Error::class_parse(format!(
                "constant #{index} is not a Class: {other:?}"
            ))),
        }
    }

    /// (name, descriptor) of a `NameAndType` entry.
    pub fn name_and_type(&self, index: u16) -> Result<(&str, &str)> {
        match self.item(index)? {
            Item::NameAndType { name, descriptor } => Ok((self.utf8(*name)?, self.utf8(*descriptor)?)),
            other => Err(Error::class_parse(format!(
                "constant #{index} is not a NameAndType: {other:?}"
            ))),
        }
    }

    fn push(&mut self, item: Item) -> u16 {
        let index = self.items.len() as u16;
        self.items.push(item);
        index
    }

    pub fn add_utf8(&mut self, value: &str) -> u16 {
        if let Some(&existing) = self.utf8_lookup.get(value.as_bytes()) {
            return existing;
        }
        let index = self.push(Item::Utf8(value.as_bytes().to_vec()));
        self.utf8_lookup.insert(value.as_bytes().to_vec(), index);
        index
    }

    pub fn add_class(&mut self, name: &str) -> u16 {
        let name_index = self.add_utf8(name);
        self.push(Item::Class { name: name_index })
    }

    pub fn add_name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
        let name_index = self.add_utf8(name);
        let descriptor_index = self.add_utf8(descriptor);
        self.push(Item::NameAndType { name: name_index, descriptor: descriptor_index })
    }

    pub fn add_field_ref(&mut self, class: &str, name: &str, descriptor: &str) -> u16 {
        let class_index = self.add_class(class);
        let name_and_type = self.add_name_and_type(name, descriptor);
        self.push(Item::FieldRef { class: class_index, name_and_type })
    }

    pub fn add_method_ref(&mut self, class: &str, name: &str, descriptor: &str) -> u16 {
        let class_index = self.add_class(class);
        let name_and_type = self.add_name_and_type(name, descriptor);
        self.push(Item::MethodRef { class: class_index, name_and_type })
    }

    pub fn add_method_handle(&mut self, kind: u8, reference: u16) -> u16 {
        self.push(Item::MethodHandle { kind, reference })
    }

    pub fn add_method_type(&mut self, descriptor: &str) -> u16 {
        let descriptor_index = self.add_utf8(descriptor);
        self.push(Item::MethodType { descriptor: descriptor_index })
    }

    pub fn add_invoke_dynamic(&mut self, bootstrap: u16, name: &str, descriptor: &str) -> u16 {
        let name_and_type = self.add_name_and_type(name, descriptor);
        self.push(Item::InvokeDynamic { bootstrap, name_and_type })
    }

    pub fn add_integer(&mut self, value: i32) -> u16 {
        self.push(Item::Integer(value))
    }

    /// Parse a constant pool from a cursor positioned at
    /// `constant_pool_count`.
    pub fn parse(r: &mut super::reader::ByteReader<'_>) -> Result<Self> {
        let count = r.u16()?;
        let mut pool = ConstantPool::new();
        let mut index = 1u16;
        while index < count {
            let tag = r.u8()?;
            let item = match tag {
                CONSTANT_UTF8 => {
                    let len = r.u16()? as usize;
                    Item::Utf8(r.bytes(len)?.to_vec())
                }
                CONSTANT_INTEGER => Item::Integer(r.u32()? as i32),
                CONSTANT_FLOAT => Item::Float(f32::from_bits(r.u32()?)),
                CONSTANT_LONG => {
                    let high = r.u32()? as u64;
                    let low = r.u32()? as u64;
                    Item::Long(((high << 32) | low) as i64)
                }
                CONSTANT_DOUBLE => {
                    let high = r.u32()? as u64;
                    let low = r.u32()? as u64;
                    Item::Double(f64::from_bits((high << 32) | low))
                }
                CONSTANT_CLASS => Item::Class { name: r.u16()? },
                CONSTANT_STRING => Item::Str { utf8: r.u16()? },
                CONSTANT_FIELDREF => Item::FieldRef { class: r.u16()?, name_and_type: r.u16()? },
                CONSTANT_METHODREF => Item::MethodRef { class: r.u16()?, name_and_type: r.u16()? },
                CONSTANT_INTERFACEMETHODREF => {
                    Item::InterfaceMethodRef { class: r.u16()?, name_and_type: r.u16()? }
                }
                CONSTANT_NAMEANDTYPE => Item::NameAndType { name: r.u16()?, descriptor: r.u16()? },
                CONSTANT_METHODHANDLE => Item::MethodHandle { kind: r.u8()?, reference: r.u16()? },
                CONSTANT_METHODTYPE => Item::MethodType { descriptor: r.u16()? },
                CONSTANT_DYNAMIC => Item::Dynamic { bootstrap: r.u16()?, name_and_type: r.u16()? },
                CONSTANT_INVOKEDYNAMIC => {
                    Item::InvokeDynamic { bootstrap: r.u16()?, name_and_type: r.u16()? }
                }
                CONSTANT_MODULE => Item::Module { name: r.u16()? },
                CONSTANT_PACKAGE => Item::Package { name: r.u16()? },
                _ => return Err(Error::class_parse(format!("unknown constant tag {tag}"))),
            };
            let wide = matches!(item, Item::Long(_) | Item::Double(_));
            if let Item::Utf8(ref bytes) = item {
                let idx = pool.items.len() as u16;
                pool.utf8_lookup.entry(bytes.clone()).or_insert(idx);
            }
            pool.items.push(item);
            index += 1;
            if wide {
                pool.items.push(Item::Reserved);
                index += 1;
            }
        }
        Ok(pool)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&self.count().to_be_bytes());
        for item in &self.items {
            match item {
                Item::Reserved => {}
                Item::Utf8(value) => {
                    bytes.push(CONSTANT_UTF8);
                    bytes.extend_from_slice(&(value.len() as u16).to_be_bytes());
                    bytes.extend_from_slice(value);
                }
                Item::Integer(value) => {
                    bytes.push(CONSTANT_INTEGER);
                    bytes.extend_from_slice(&value.to_be_bytes());
                }
                Item::Float(value) => {
                    bytes.push(CONSTANT_FLOAT);
                    bytes.extend_from_slice(&value.to_bits().to_be_bytes());
                }
                Item::Long(value) => {
                    bytes.push(CONSTANT_LONG);
                    bytes.extend_from_slice(&value.to_be_bytes());
                }
                Item::Double(value) => {
                    bytes.push(CONSTANT_DOUBLE);
                    bytes.extend_from_slice(&value.to_bits().to_be_bytes());
                }
                Item::Class { name } => {
                    bytes.push(CONSTANT_CLASS);
                    bytes.extend_from_slice(&name.to_be_bytes());
                }
                Item::Str { utf8 } => {
                    bytes.push(CONSTANT_STRING);
                    bytes.extend_from_slice(&utf8.to_be_bytes());
                }
                Item::FieldRef { class, name_and_type } => {
                    bytes.push(CONSTANT_FIELDREF);
                    bytes.extend_from_slice(&class.to_be_bytes());
                    bytes.extend_from_slice(&name_and_type.to_be_bytes());
                }
                Item::MethodRef { class, name_and_type } => {
                    bytes.push(CONSTANT_METHODREF);
                    bytes.extend_from_slice(&class.to_be_bytes());
                    bytes.extend_from_slice(&name_and_type.to_be_bytes());
                }
                Item::InterfaceMethodRef { class, name_and_type } => {
                    bytes.push(CONSTANT_INTERFACEMETHODREF);
                    bytes.extend_from_slice(&class.to_be_bytes());
                    bytes.extend_from_slice(&name_and_type.to_be_bytes());
                }
                Item::NameAndType { name, descriptor } => {
                    bytes.push(CONSTANT_NAMEANDTYPE);
                    bytes.extend_from_slice(&name.to_be_bytes());
                    bytes.extend_from_slice(&descriptor.to_be_bytes());
                }
                Item::MethodHandle { kind, reference } => {
                    bytes.push(CONSTANT_METHODHANDLE);
                    bytes.push(*kind);
                    bytes.extend_from_slice(&reference.to_be_bytes());
                }
                Item::MethodType { descriptor } => {
                    bytes.push(CONSTANT_METHODTYPE);
                    bytes.extend_from_slice(&descriptor.to_be_bytes());
                }
                Item::Dynamic { bootstrap, name_and_type } => {
                    bytes.push(CONSTANT_DYNAMIC);
                    bytes.extend_from_slice(&bootstrap.to_be_bytes());
                    bytes.extend_from_slice(&name_and_type.to_be_bytes());
                }
                Item::InvokeDynamic { bootstrap, name_and_type } => {
                    bytes.push(CONSTANT_INVOKEDYNAMIC);
                    bytes.extend_from_slice(&bootstrap.to_be_bytes());
                    bytes.extend_from_slice(&name_and_type.to_be_bytes());
                }
                Item::Module { name } => {
                    bytes.push(CONSTANT_MODULE);
                    bytes.extend_from_slice(&name.to_be_bytes());
                }
                Item::Package { name } => {
                    bytes.push(CONSTANT_PACKAGE);
                    bytes.extend_from_slice(&name.to_be_bytes());
                }
            }
        }
        bytes
    }
}

impl Default for ConstantPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classfile::reader::ByteReader;

    #[test]
    fn test_utf8_dedup() {
        let mut pool = ConstantPool::new();
        let a = pool.add_utf8("hello");
        let b = pool.add_utf8("hello");
        assert_eq!(a, b);
        assert_eq!(pool.utf8(a).unwrap(), "hello");
    }

    #[test]
    fn test_round_trip() {
        let mut pool = ConstantPool::new();
        pool.add_class("java/lang/Object");
        pool.add_method_ref("java/lang/Object", "<init>", "()V");
        pool.add_integer(42);
        let bytes = pool.to_bytes();

        let mut r = ByteReader::new(&bytes);
        let parsed = ConstantPool::parse(&mut r).unwrap();
        assert_eq!(parsed.count(), pool.count());
        assert_eq!(parsed.to_bytes(), bytes);
    }

    #[test]
    fn test_wide_constants_take_two_slots() {
        let mut pool = ConstantPool::new();
        let long_index = pool.push(Item::Long(7));
        pool.items.push(Item::Reserved);
        let next = pool.add_utf8("after");
        assert_eq!(next, long_index + 2);

        let bytes = pool.to_bytes();
        let mut r = ByteReader::new(&bytes);
        let parsed = ConstantPool::parse(&mut r).unwrap();
        assert_eq!(parsed.utf8(next).unwrap(), "after");
    }
}
