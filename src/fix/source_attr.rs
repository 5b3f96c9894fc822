//! SourceFile attribute synthesis
//!
//! Minifiers drop the SourceFile attribute; stack traces then print
//! "Unknown Source". The original file name is recoverable from the
//! class name: the innermost simple name up to the first `$`, plus
//! `.java`. Nested and anonymous classes resolve to their outermost
//! declaring file.

use crate::classfile::attrs::{names, AttributeInfo};
use crate::classfile::reader::ClassFile;
use crate::error::Result;

/// Source file name derived from an internal class name.
fn source_file_name(internal_name: &str) -> String {
    let simple = internal_name.rsplit('/').next().unwrap_or(internal_name);
    let base = match simple.split('$').next() {
        Some(outer) if !outer.is_empty() => outer,
        _ => simple,
    };
    format!("{base}.java")
}

pub fn apply(class: &mut ClassFile) -> Result<()> {
    let file_name = source_file_name(class.this_name()?);
    let info = class.pool.add_utf8(&file_name).to_be_bytes().to_vec();
    let existing = class.attributes.iter().position(|a| {
        class.pool.utf8(a.name_index).map(|n| n == names::SOURCE_FILE).unwrap_or(false)
    });
    match existing {
        Some(i) => class.attributes[i].info = info,
        None => {
            let name_index = class.pool.add_utf8(names::SOURCE_FILE);
            class.attributes.push(AttributeInfo::new(name_index, info));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_file_name() {
        assert_eq!(source_file_name("com/example/Foo"), "Foo.java");
        assert_eq!(source_file_name("com/example/Foo$Bar"), "Foo.java");
        assert_eq!(source_file_name("com/example/Foo$1"), "Foo.java");
        assert_eq!(source_file_name("Top"), "Top.java");
    }
}
