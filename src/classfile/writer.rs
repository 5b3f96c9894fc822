//! Class file serialization

use super::attrs;
use super::defs::MAGIC;
use super::reader::{ClassFile, MemberInfo};

fn write_member(bytes: &mut Vec<u8>, member: &MemberInfo) {
    bytes.extend_from_slice(&member.access_flags.to_be_bytes());
    bytes.extend_from_slice(&member.name_index.to_be_bytes());
    bytes.extend_from_slice(&member.descriptor_index.to_be_bytes());
    attrs::write_attributes(bytes, &member.attributes);
}

impl ClassFile {
    /// Serialize back to class file bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&MAGIC.to_be_bytes());
        bytes.extend_from_slice(&self.minor_version.to_be_bytes());
        bytes.extend_from_slice(&self.major_version.to_be_bytes());
        bytes.extend_from_slice(&self.pool.to_bytes());
        bytes.extend_from_slice(&self.access_flags.to_be_bytes());
        bytes.extend_from_slice(&self.this_class.to_be_bytes());
        bytes.extend_from_slice(&self.super_class.to_be_bytes());
        bytes.extend_from_slice(&(self.interfaces.len() as u16).to_be_bytes());
        for interface in &self.interfaces {
            bytes.extend_from_slice(&interface.to_be_bytes());
        }
        bytes.extend_from_slice(&(self.fields.len() as u16).to_be_bytes());
        for field in &self.fields {
            write_member(&mut bytes, field);
        }
        bytes.extend_from_slice(&(self.methods.len() as u16).to_be_bytes());
        for method in &self.methods {
            write_member(&mut bytes, method);
        }
        attrs::write_attributes(&mut bytes, &self.attributes);
        bytes
    }
}
