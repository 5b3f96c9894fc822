//! Class file parsing
//!
//! Parsing keeps attribute payloads as raw bytes. Stages that need the
//! interior of an attribute (Code, LocalVariableTable, BootstrapMethods)
//! decode it on demand through [`super::attrs`], edit, and re-serialize.
//! Everything else round-trips untouched, so a run with no table and no
//! repair stages reproduces the input byte for byte.

use super::attrs::{self, AttributeInfo};
use super::defs::MAGIC;
use super::pool::ConstantPool;
use crate::error::{Error, Result};

/// Big-endian cursor over a byte slice.
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn u8(&mut self) -> Result<u8> {
        let b = *self
            .data
            .get(self.pos)
            .ok_or_else(|| Error::class_parse("unexpected end of class file"))?;
        self.pos += 1;
        Ok(b)
    }

    pub fn u16(&mut self) -> Result<u16> {
        Ok(((self.u8()? as u16) << 8) | self.u8()? as u16)
    }

    pub fn u32(&mut self) -> Result<u32> {
        Ok(((self.u16()? as u32) << 16) | self.u16()? as u32)
    }

    pub fn bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let slice = self
            .data
            .get(self.pos..self.pos + len)
            .ok_or_else(|| Error::class_parse("unexpected end of class file"))?;
        self.pos += len;
        Ok(slice)
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }
}

/// A field or method declaration.
#[derive(Debug, Clone)]
pub struct MemberInfo {
    pub access_flags: u16,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub attributes: Vec<AttributeInfo>,
}

impl MemberInfo {
    fn parse(r: &mut ByteReader<'_>) -> Result<Self> {
        Ok(Self {
            access_flags: r.u16()?,
            name_index: r.u16()?,
            descriptor_index: r.u16()?,
            attributes: attrs::parse_attributes(r)?,
        })
    }

    pub fn name<'p>(&self, pool: &'p ConstantPool) -> Result<&'p str> {
        pool.utf8(self.name_index)
    }

    pub fn descriptor<'p>(&self, pool: &'p ConstantPool) -> Result<&'p str> {
        pool.utf8(self.descriptor_index)
    }

    /// The attribute with the given name, if present.
    pub fn attribute<'s>(&'s self, pool: &ConstantPool, name: &str) -> Option<&'s AttributeInfo> {
        self.attributes
            .iter()
            .find(|a| pool.utf8(a.name_index).map(|n| n == name).unwrap_or(false))
    }

    pub fn attribute_mut<'s>(
        &'s mut self,
        pool: &ConstantPool,
        name: &str,
    ) -> Option<&'s mut AttributeInfo> {
        self.attributes
            .iter_mut()
            .find(|a| pool.utf8(a.name_index).map(|n| n == name).unwrap_or(false))
    }
}

/// Parsed class file.
#[derive(Debug, Clone)]
pub struct ClassFile {
    pub minor_version: u16,
    pub major_version: u16,
    pub pool: ConstantPool,
    pub access_flags: u16,
    pub this_class: u16,
    pub super_class: u16,
    pub interfaces: Vec<u16>,
    pub fields: Vec<MemberInfo>,
    pub methods: Vec<MemberInfo>,
    pub attributes: Vec<AttributeInfo>,
}

impl ClassFile {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut r = ByteReader::new(data);
        if r.u32()? != MAGIC {
            return Err(Error::class_parse("bad magic number"));
        }
        let minor_version = r.u16()?;
        let major_version = r.u16()?;
        let pool = ConstantPool::parse(&mut r)?;
        let access_flags = r.u16()?;
        let this_class = r.u16()?;
        let super_class = r.u16()?;

        let interface_count = r.u16()? as usize;
        let mut interfaces = Vec::with_capacity(interface_count);
        for _ in 0..interface_count {
            interfaces.push(r.u16()?);
        }

        let field_count = r.u16()? as usize;
        let mut fields = Vec::with_capacity(field_count);
        for _ in 0..field_count {
            fields.push(MemberInfo::parse(&mut r)?);
        }

        let method_count = r.u16()? as usize;
        let mut methods = Vec::with_capacity(method_count);
        for _ in 0..method_count {
            methods.push(MemberInfo::parse(&mut r)?);
        }

        let attributes = attrs::parse_attributes(&mut r)?;
        if r.remaining() != 0 {
            return Err(Error::class_parse("trailing bytes after class file"));
        }

        Ok(Self {
            minor_version,
            major_version,
            pool,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
        })
    }

    /// Internal name of this class, e.g. `com/example/Foo`.
    pub fn this_name(&self) -> Result<&str> {
        self.pool.class_name(self.this_class)
    }

    /// Internal name of the superclass; `None` for `java/lang/Object`.
    pub fn super_name(&self) -> Result<Option<&str>> {
        if self.super_class == 0 {
            return Ok(None);
        }
        Ok(Some(self.pool.class_name(self.super_class)?))
    }

    pub fn interface_names(&self) -> Result<Vec<&str>> {
        self.interfaces
            .iter()
            .map(|&i| self.pool.class_name(i))
            .collect()
    }

    /// The class-level attribute with the given name, if present.
    pub fn attribute<'s>(&'s self, name: &str) -> Option<&'s AttributeInfo> {
        self.attributes
            .iter()
            .find(|a| self.pool.utf8(a.name_index).map(|n| n == name).unwrap_or(false))
    }

    pub fn attribute_mut<'s>(&'s mut self, name: &str) -> Option<&'s mut AttributeInfo> {
        let pool = &self.pool;
        self.attributes
            .iter_mut()
            .find(|a| pool.utf8(a.name_index).map(|n| n == name).unwrap_or(false))
    }

    pub fn remove_attribute(&mut self, name: &str) {
        let pool = &self.pool;
        self.attributes
            .retain(|a| pool.utf8(a.name_index).map(|n| n != name).unwrap_or(true));
    }
}

/// Supertypes read from the header alone: `(super, interfaces)`.
///
/// Hierarchy indexing touches only the pool and the header, so it avoids
/// parsing fields, methods and attributes of classes that are merely
/// referenced.
pub fn read_supertypes(data: &[u8]) -> Result<(Option<String>, Vec<String>)> {
    let mut r = ByteReader::new(data);
    if r.u32()? != MAGIC {
        return Err(Error::class_parse("bad magic number"));
    }
    r.u16()?;
    r.u16()?;
    let pool = ConstantPool::parse(&mut r)?;
    r.u16()?; // access_flags
    r.u16()?; // this_class
    let super_class = r.u16()?;
    let super_name = if super_class == 0 {
        None
    } else {
        Some(pool.class_name(super_class)?.to_string())
    };
    let interface_count = r.u16()? as usize;
    let mut interfaces = Vec::with_capacity(interface_count);
    for _ in 0..interface_count {
        interfaces.push(pool.class_name(r.u16()?)?.to_string());
    }
    Ok((super_name, interfaces))
}
