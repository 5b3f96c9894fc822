// Shared test helpers: assemble real class files through the crate's
// own pool/attribute API.

#![allow(dead_code)]

use rejar::classfile::attrs::{self, names, AttributeInfo, CodeBody, LocalVarEntry};
use rejar::classfile::defs::access_flags::*;
use rejar::classfile::defs::handle_kinds::H_INVOKESTATIC;
use rejar::classfile::defs::major_versions::JAVA_17;
use rejar::classfile::descriptor::{parameter_descriptors, slot_width};
use rejar::classfile::reader::{ClassFile, MemberInfo};
use rejar::classfile::ConstantPool;

pub const METAFACTORY_DESC: &str = "(Ljava/lang/invoke/MethodHandles$Lookup;Ljava/lang/String;\
Ljava/lang/invoke/MethodType;Ljava/lang/invoke/MethodType;Ljava/lang/invoke/MethodHandle;\
Ljava/lang/invoke/MethodType;)Ljava/lang/invoke/CallSite;";

pub struct ClassBuilder {
    pub pool: ConstantPool,
    name: String,
    access_flags: u16,
    this_class: u16,
    super_class: u16,
    interfaces: Vec<u16>,
    fields: Vec<MemberInfo>,
    methods: Vec<MemberInfo>,
    attributes: Vec<AttributeInfo>,
    bootstrap_methods: Vec<(u16, Vec<u16>)>,
}

impl ClassBuilder {
    pub fn new(name: &str, super_name: &str) -> Self {
        let mut pool = ConstantPool::new();
        let this_class = pool.add_class(name);
        let super_class = pool.add_class(super_name);
        Self {
            pool,
            name: name.to_string(),
            access_flags: ACC_PUBLIC | ACC_SUPER,
            this_class,
            super_class,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            attributes: Vec::new(),
            bootstrap_methods: Vec::new(),
        }
    }

    pub fn access(mut self, flags: u16) -> Self {
        self.access_flags = flags;
        self
    }

    pub fn implements(mut self, interface: &str) -> Self {
        let index = self.pool.add_class(interface);
        self.interfaces.push(index);
        self
    }

    pub fn field(mut self, access: u16, name: &str, descriptor: &str) -> Self {
        let name_index = self.pool.add_utf8(name);
        let descriptor_index = self.pool.add_utf8(descriptor);
        self.fields.push(MemberInfo {
            access_flags: access,
            name_index,
            descriptor_index,
            attributes: Vec::new(),
        });
        self
    }

    /// A final field carrying a ConstantValue attribute.
    pub fn constant_field(mut self, access: u16, name: &str, descriptor: &str, value: i32) -> Self {
        let name_index = self.pool.add_utf8(name);
        let descriptor_index = self.pool.add_utf8(descriptor);
        let value_index = self.pool.add_integer(value);
        let attr_name = self.pool.add_utf8(names::CONSTANT_VALUE);
        self.fields.push(MemberInfo {
            access_flags: access,
            name_index,
            descriptor_index,
            attributes: vec![AttributeInfo::new(attr_name, value_index.to_be_bytes().to_vec())],
        });
        self
    }

    pub fn method(mut self, access: u16, name: &str, descriptor: &str, code: Vec<u8>) -> Self {
        self.push_method(access, name, descriptor, code, None);
        self
    }

    /// Method with a LocalVariableTable; entries are (name, type, slot),
    /// all spanning the whole body.
    pub fn method_with_locals(
        mut self,
        access: u16,
        name: &str,
        descriptor: &str,
        code: Vec<u8>,
        locals: &[(&str, &str, u16)],
    ) -> Self {
        let code_len = code.len() as u16;
        let entries: Vec<LocalVarEntry> = locals
            .iter()
            .map(|(n, d, slot)| LocalVarEntry {
                start_pc: 0,
                length: code_len,
                name_index: self.pool.add_utf8(n),
                descriptor_index: self.pool.add_utf8(d),
                index: *slot,
            })
            .collect();
        let lvt = AttributeInfo::new(
            self.pool.add_utf8(names::LOCAL_VARIABLE_TABLE),
            attrs::write_local_vars(&entries),
        );
        self.push_method(access, name, descriptor, code, Some(lvt));
        self
    }

    fn push_method(
        &mut self,
        access: u16,
        name: &str,
        descriptor: &str,
        code: Vec<u8>,
        lvt: Option<AttributeInfo>,
    ) {
        let max_locals = {
            let base = if access & ACC_STATIC == 0 { 1 } else { 0 };
            let slots: u16 = parameter_descriptors(descriptor)
                .unwrap()
                .iter()
                .map(|p| slot_width(p))
                .sum();
            base + slots + 4
        };
        let body = CodeBody {
            max_stack: 4,
            max_locals,
            code,
            exception_table: Vec::new(),
            attributes: lvt.into_iter().collect(),
        };
        let code_attr = AttributeInfo::new(self.pool.add_utf8(names::CODE), body.to_bytes());
        let name_index = self.pool.add_utf8(name);
        let descriptor_index = self.pool.add_utf8(descriptor);
        self.methods.push(MemberInfo {
            access_flags: access,
            name_index,
            descriptor_index,
            attributes: vec![code_attr],
        });
    }

    /// Register a lambda-metafactory bootstrap entry whose
    /// implementation is `impl_name`/`impl_desc` on `impl_owner`;
    /// returns the bootstrap index for `invoke_dynamic`.
    pub fn metafactory(
        &mut self,
        impl_owner: &str,
        impl_name: &str,
        impl_desc: &str,
        sam_desc: &str,
    ) -> u16 {
        let bsm_ref = self.pool.add_method_ref(
            "java/lang/invoke/LambdaMetafactory",
            "metafactory",
            METAFACTORY_DESC,
        );
        let bsm_handle = self.pool.add_method_handle(H_INVOKESTATIC, bsm_ref);
        let impl_ref = self.pool.add_method_ref(impl_owner, impl_name, impl_desc);
        let impl_handle = self.pool.add_method_handle(H_INVOKESTATIC, impl_ref);
        let sam = self.pool.add_method_type(sam_desc);
        let instantiated = self.pool.add_method_type(sam_desc);
        self.bootstrap_methods.push((bsm_handle, vec![sam, impl_handle, instantiated]));
        (self.bootstrap_methods.len() - 1) as u16
    }

    /// Register a raw bootstrap entry; lets a test build constant
    /// shapes the compiler never emits.
    pub fn bootstrap(&mut self, method_handle: u16, arguments: Vec<u16>) -> u16 {
        self.bootstrap_methods.push((method_handle, arguments));
        (self.bootstrap_methods.len() - 1) as u16
    }

    /// `invokedynamic` instruction bytes for a call site.
    pub fn invoke_dynamic(&mut self, bootstrap: u16, site_name: &str, site_desc: &str) -> Vec<u8> {
        let index = self.pool.add_invoke_dynamic(bootstrap, site_name, site_desc);
        let mut code = vec![0xba];
        code.extend_from_slice(&index.to_be_bytes());
        code.extend_from_slice(&[0, 0]);
        code
    }

    pub fn attribute(mut self, name: &str, info: Vec<u8>) -> Self {
        let name_index = self.pool.add_utf8(name);
        self.attributes.push(AttributeInfo::new(name_index, info));
        self
    }

    pub fn build(mut self) -> Vec<u8> {
        if !self.bootstrap_methods.is_empty() {
            let mut info = Vec::new();
            info.extend_from_slice(&(self.bootstrap_methods.len() as u16).to_be_bytes());
            for (handle, args) in &self.bootstrap_methods {
                info.extend_from_slice(&handle.to_be_bytes());
                info.extend_from_slice(&(args.len() as u16).to_be_bytes());
                for arg in args {
                    info.extend_from_slice(&arg.to_be_bytes());
                }
            }
            let name_index = self.pool.add_utf8(names::BOOTSTRAP_METHODS);
            self.attributes.push(AttributeInfo::new(name_index, info));
        }
        let class = ClassFile {
            minor_version: 0,
            major_version: JAVA_17,
            pool: self.pool,
            access_flags: self.access_flags,
            this_class: self.this_class,
            super_class: self.super_class,
            interfaces: self.interfaces,
            fields: self.fields,
            methods: self.methods,
            attributes: self.attributes,
        };
        class.to_bytes()
    }
}

/// Find a method by name in a parsed class.
pub fn method<'c>(class: &'c ClassFile, name: &str) -> &'c MemberInfo {
    class
        .methods
        .iter()
        .find(|m| m.name(&class.pool).unwrap() == name)
        .unwrap_or_else(|| panic!("no method named {name}"))
}

/// (slot, name) pairs of a method's LocalVariableTable, sorted by slot.
pub fn local_names(class: &ClassFile, method_name: &str) -> Vec<(u16, String)> {
    let m = method(class, method_name);
    let code_attr = m.attribute(&class.pool, names::CODE).expect("no Code attribute");
    let body = CodeBody::parse(&code_attr.info).unwrap();
    let mut out = Vec::new();
    for attr in &body.attributes {
        if class.pool.utf8(attr.name_index).unwrap() != names::LOCAL_VARIABLE_TABLE {
            continue;
        }
        for entry in attrs::parse_local_vars(&attr.info).unwrap() {
            out.push((entry.index, class.pool.utf8(entry.name_index).unwrap().to_string()));
        }
    }
    out.sort();
    out
}

/// Opcode bytes of a method body in instruction order, operands skipped.
pub fn opcodes_of(class: &ClassFile, method_name: &str) -> Vec<u8> {
    let m = method(class, method_name);
    let code_attr = m.attribute(&class.pool, names::CODE).expect("no Code attribute");
    let body = CodeBody::parse(&code_attr.info).unwrap();
    let mut ops = Vec::new();
    let mut pc = 0;
    while pc < body.code.len() {
        ops.push(body.code[pc]);
        pc += rejar::classfile::defs::instruction_length(&body.code, pc).unwrap();
    }
    ops
}
