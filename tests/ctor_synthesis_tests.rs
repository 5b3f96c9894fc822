// Constructor synthesis for classes stripped of their constructor.

mod common;

use std::collections::HashMap;

use common::{local_names, method, opcodes_of, ClassBuilder};
use rejar::classfile::defs::access_flags::*;
use rejar::classfile::defs::opcodes::*;
use rejar::classfile::reader::ClassFile;
use rejar::pipeline::transform_class;
use rejar::{MappingSet, RemapConfig, RemapRun};

fn provider_with(classes: &[(&str, Vec<u8>)]) -> HashMap<String, Vec<u8>> {
    classes.iter().map(|(n, b)| (n.to_string(), b.clone())).collect()
}

fn ctor_config() -> RemapConfig {
    RemapConfig { fix_ctors: true, ..Default::default() }
}

#[test]
fn test_synthesized_ctor_shape() {
    // Superclass declares <init>(ILjava/lang/String;)V.
    let a = ClassBuilder::new("a/A", "java/lang/Object")
        .method(ACC_PUBLIC, "<init>", "(ILjava/lang/String;)V", vec![0x2a, 0xb7, 0, 1, 0xb1])
        .build();
    // B: stripped ctor, two qualifying final fields, one constant final
    // field and one non-final field that must be ignored.
    let b = ClassBuilder::new("a/B", "a/A")
        .field(ACC_PRIVATE | ACC_FINAL, "first", "J")
        .field(ACC_PRIVATE | ACC_FINAL, "second", "Ljava/lang/String;")
        .constant_field(ACC_STATIC | ACC_FINAL, "LIMIT", "I", 5)
        .field(ACC_PRIVATE, "mutable", "I")
        .build();
    let provider = provider_with(&[("a/A", a), ("a/B", b.clone())]);

    let table = MappingSet::new();
    let config = ctor_config();
    let mut run = RemapRun::new(&table, &provider, &config);
    let (name, out) = transform_class(&b, &mut run).unwrap();
    assert_eq!(name, "a/B");

    let class = ClassFile::parse(&out).unwrap();
    let ctor = method(&class, "<init>");
    // Super parameters followed by the qualifying fields' types.
    assert_eq!(ctor.descriptor(&class.pool).unwrap(), "(ILjava/lang/String;JLjava/lang/String;)V");

    let ops = opcodes_of(&class, "<init>");
    assert_eq!(ops.iter().filter(|&&op| op == INVOKESPECIAL).count(), 1);
    assert_eq!(ops.iter().filter(|&&op| op == PUTFIELD).count(), 2);
    assert_eq!(
        ops,
        vec![
            ALOAD_0, ILOAD, ALOAD, INVOKESPECIAL, // super(int, String)
            ALOAD_0, LLOAD, PUTFIELD, // this.first = p
            ALOAD_0, ALOAD, PUTFIELD, // this.second = p
            RETURN,
        ]
    );

    // this, two super params at slots 1-2, fields at 3 (J) and 5.
    let locals = local_names(&class, "<init>");
    assert_eq!(
        locals,
        vec![
            (0, "this".to_string()),
            (1, "super_param_1".to_string()),
            (2, "super_param_2".to_string()),
            (3, "p_first".to_string()),
            (5, "p_second".to_string()),
        ]
    );
}

#[test]
fn test_field_params_use_mapped_names() {
    let b = ClassBuilder::new("a/B", "java/lang/Object")
        .field(ACC_PRIVATE | ACC_FINAL, "x", "I")
        .build();
    let provider = provider_with(&[("a/B", b.clone())]);

    let mut table = MappingSet::new();
    table.add_class("a/B", "m/B");
    table.add_field_typed("a/B", "x", "I", "count");
    let config = ctor_config();
    let mut run = RemapRun::new(&table, &provider, &config);
    let (name, out) = transform_class(&b, &mut run).unwrap();
    assert_eq!(name, "m/B");

    let class = ClassFile::parse(&out).unwrap();
    let locals = local_names(&class, "<init>");
    assert!(locals.contains(&(1, "p_count".to_string())), "locals: {locals:?}");
}

#[test]
fn test_ctor_params_chain_through_stripped_superclass() {
    // A's own ctor is stripped too; B must chain through A's
    // synthesized parameter list.
    let a = ClassBuilder::new("a/A", "java/lang/Object")
        .field(ACC_PRIVATE | ACC_FINAL, "base", "I")
        .build();
    let b = ClassBuilder::new("a/B", "a/A")
        .field(ACC_PRIVATE | ACC_FINAL, "extra", "Ljava/lang/String;")
        .build();
    let provider = provider_with(&[("a/A", a), ("a/B", b.clone())]);

    let table = MappingSet::new();
    let config = ctor_config();
    let mut run = RemapRun::new(&table, &provider, &config);
    let (_, out) = transform_class(&b, &mut run).unwrap();

    let class = ClassFile::parse(&out).unwrap();
    let ctor = method(&class, "<init>");
    assert_eq!(ctor.descriptor(&class.pool).unwrap(), "(ILjava/lang/String;)V");
}

#[test]
fn test_no_synthesis_without_qualifying_fields() {
    let plain = ClassBuilder::new("a/Plain", "java/lang/Object")
        .field(ACC_PRIVATE, "mutable", "I")
        .constant_field(ACC_FINAL, "fixed", "I", 1)
        .build();
    let provider = provider_with(&[("a/Plain", plain.clone())]);

    let table = MappingSet::new();
    let config = ctor_config();
    let mut run = RemapRun::new(&table, &provider, &config);
    let (_, out) = transform_class(&plain, &mut run).unwrap();

    let class = ClassFile::parse(&out).unwrap();
    assert!(class
        .methods
        .iter()
        .all(|m| m.name(&class.pool).unwrap() != "<init>"));
}

#[test]
fn test_no_synthesis_for_interfaces_or_synthetic_classes() {
    let iface = ClassBuilder::new("a/I", "java/lang/Object")
        .access(ACC_PUBLIC | ACC_INTERFACE | ACC_ABSTRACT)
        .field(ACC_FINAL, "x", "I")
        .build();
    let synthetic = ClassBuilder::new("a/S", "java/lang/Object")
        .access(ACC_PUBLIC | ACC_SUPER | ACC_SYNTHETIC)
        .field(ACC_FINAL, "x", "I")
        .build();
    let provider =
        provider_with(&[("a/I", iface.clone()), ("a/S", synthetic.clone())]);

    let table = MappingSet::new();
    let config = ctor_config();
    let mut run = RemapRun::new(&table, &provider, &config);
    for bytes in [&iface, &synthetic] {
        let (_, out) = transform_class(bytes, &mut run).unwrap();
        let class = ClassFile::parse(&out).unwrap();
        assert!(class
            .methods
            .iter()
            .all(|m| m.name(&class.pool).unwrap() != "<init>"));
    }
}

#[test]
fn test_synthesized_stores_are_renamed_afterwards() {
    // The rename stage must rewrite the field refs synthesis emitted.
    let b = ClassBuilder::new("a/B", "java/lang/Object")
        .field(ACC_PRIVATE | ACC_FINAL, "x", "I")
        .build();
    let provider = provider_with(&[("a/B", b.clone())]);

    let mut table = MappingSet::new();
    table.add_class("a/B", "m/B");
    table.add_field_typed("a/B", "x", "I", "count");
    let config = ctor_config();
    let mut run = RemapRun::new(&table, &provider, &config);
    let (_, out) = transform_class(&b, &mut run).unwrap();

    let class = ClassFile::parse(&out).unwrap();
    assert_eq!(class.this_name().unwrap(), "m/B");
    let field = &class.fields[0];
    assert_eq!(field.name(&class.pool).unwrap(), "count");
    // Find the putfield target in the pool and check it was remapped.
    let mut found = false;
    for i in 1..class.pool.count() {
        if let Ok(rejar::classfile::Item::FieldRef { class: c, name_and_type }) =
            class.pool.item(i).map(|it| it.clone())
        {
            let owner = class.pool.class_name(c).unwrap();
            let (n, d) = class.pool.name_and_type(name_and_type).unwrap();
            if owner == "m/B" {
                assert_eq!((n, d), ("count", "I"));
                found = true;
            }
        }
    }
    assert!(found, "no field ref on m/B in the pool");
}
