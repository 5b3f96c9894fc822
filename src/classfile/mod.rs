//! Class file data model: constant pool, reader, writer, attributes,
//! descriptors

pub mod attrs;
pub mod defs;
pub mod descriptor;
pub mod pool;
pub mod reader;
pub mod writer;

pub use attrs::{AttributeInfo, BootstrapMethod, CodeBody, LocalVarEntry};
pub use pool::{ConstantPool, Item};
pub use reader::{ClassFile, MemberInfo};
