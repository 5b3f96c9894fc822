// Hierarchy-walking symbol resolution.

mod common;

use std::collections::HashMap;

use common::ClassBuilder;
use rejar::classfile::defs::access_flags::*;
use rejar::{MappingSet, RemapConfig, RemapRun};

fn provider_with(classes: &[(&str, Vec<u8>)]) -> HashMap<String, Vec<u8>> {
    classes.iter().map(|(n, b)| (n.to_string(), b.clone())).collect()
}

#[test]
fn test_hierarchy_fallback_for_methods() {
    // A declares foo()V and maps it; B extends A without declaring it.
    let a = ClassBuilder::new("a/A", "java/lang/Object")
        .method(ACC_PUBLIC, "foo", "()V", vec![0xb1])
        .build();
    let b = ClassBuilder::new("a/B", "a/A").build();
    let provider = provider_with(&[("a/A", a), ("a/B", b)]);

    let mut table = MappingSet::new();
    table.add_class("a/A", "m/A");
    table.add_class("a/B", "m/B");
    table.add_method("a/A", "foo", "()V", "bar");
    let config = RemapConfig::default();
    let mut run = RemapRun::new(&table, &provider, &config);

    assert_eq!(run.map_method_name("a/B", "foo", "()V"), "bar");
    // Same name, different descriptor: declared nowhere, kept.
    assert_eq!(run.map_method_name("a/B", "foo", "(I)V"), "foo");
}

#[test]
fn test_interface_methods_resolve_through_superinterfaces() {
    let iface = ClassBuilder::new("a/Fn", "java/lang/Object")
        .access(ACC_PUBLIC | ACC_INTERFACE | ACC_ABSTRACT)
        .build();
    let impl_class = ClassBuilder::new("a/Impl", "java/lang/Object")
        .implements("a/Fn")
        .build();
    let provider = provider_with(&[("a/Fn", iface), ("a/Impl", impl_class)]);

    let mut table = MappingSet::new();
    table.add_class("a/Fn", "m/Fn");
    table.add_class("a/Impl", "m/Impl");
    table.add_method("a/Fn", "apply", "(I)I", "call");
    let config = RemapConfig::default();
    let mut run = RemapRun::new(&table, &provider, &config);

    assert_eq!(run.map_method_name("a/Impl", "apply", "(I)I"), "call");
}

#[test]
fn test_field_shadow_guard() {
    // C declares x:I with a mapping; D shadows it with x:String.
    let c = ClassBuilder::new("a/C", "java/lang/Object")
        .field(ACC_PUBLIC, "x", "I")
        .build();
    let d = ClassBuilder::new("a/D", "a/C")
        .field(ACC_PUBLIC, "x", "Ljava/lang/String;")
        .build();
    let provider = provider_with(&[("a/C", c), ("a/D", d)]);

    let mut table = MappingSet::new();
    table.add_class("a/C", "m/C");
    table.add_class("a/D", "m/D");
    table.add_field_typed("a/C", "x", "I", "count");
    let config = RemapConfig::default();
    let mut run = RemapRun::new(&table, &provider, &config);

    // The shadowing field must not inherit the ancestor's mapping.
    assert_eq!(run.map_field_name("a/D", "x", "Ljava/lang/String;"), "x");
    // The inherited int field still resolves through the hierarchy.
    assert_eq!(run.map_field_name("a/D", "x", "I"), "count");
}

#[test]
fn test_foreign_owner_is_identity() {
    let provider: HashMap<String, Vec<u8>> = HashMap::new();
    let table = MappingSet::new();
    let config = RemapConfig::default();
    let mut run = RemapRun::new(&table, &provider, &config);

    assert_eq!(run.map_method_name("java/util/List", "size", "()I"), "size");
    assert_eq!(run.map_field_name("java/lang/System", "out", "Ljava/io/PrintStream;"), "out");
    assert_eq!(run.map_class_name("java/util/List"), "java/util/List");
}

#[test]
fn test_absent_superclass_terminates_search() {
    // B extends a class the provider cannot supply.
    let b = ClassBuilder::new("a/B", "lib/Gone").build();
    let provider = provider_with(&[("a/B", b)]);

    let mut table = MappingSet::new();
    table.add_class("a/B", "m/B");
    let config = RemapConfig::default();
    let mut run = RemapRun::new(&table, &provider, &config);

    assert_eq!(run.map_method_name("a/B", "foo", "()V"), "foo");
}
