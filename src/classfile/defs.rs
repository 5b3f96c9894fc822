//! Generic classfile-specific definitions

use crate::error::{Error, Result};

/// Header of Java class file (magic number)
pub const MAGIC: u32 = 0xCAFEBABE;

/// Name of a constructor
pub const CONSTRUCTOR_METHOD_NAME: &str = "<init>";

/// JVM version constants
pub mod major_versions {
    pub const JAVA_8: u16 = 52;
    pub const JAVA_11: u16 = 55;
    pub const JAVA_17: u16 = 61;
    pub const JAVA_21: u16 = 65;
}

/// Class/field/method access flags
pub mod access_flags {
    pub const ACC_PUBLIC: u16 = 0x0001;
    pub const ACC_PRIVATE: u16 = 0x0002;
    pub const ACC_PROTECTED: u16 = 0x0004;
    pub const ACC_STATIC: u16 = 0x0008;
    pub const ACC_FINAL: u16 = 0x0010;
    pub const ACC_SUPER: u16 = 0x0020;
    pub const ACC_VOLATILE: u16 = 0x0040;
    pub const ACC_TRANSIENT: u16 = 0x0080;
    pub const ACC_INTERFACE: u16 = 0x0200;
    pub const ACC_ABSTRACT: u16 = 0x0400;
    pub const ACC_SYNTHETIC: u16 = 0x1000;
    pub const ACC_ANNOTATION: u16 = 0x2000;
    pub const ACC_ENUM: u16 = 0x4000;
}

/// Constant pool entry tags
pub mod constant_tags {
    pub const CONSTANT_UTF8: u8 = 1;
    pub const CONSTANT_INTEGER: u8 = 3;
    pub const CONSTANT_FLOAT: u8 = 4;
    pub const CONSTANT_LONG: u8 = 5;
    pub const CONSTANT_DOUBLE: u8 = 6;
    pub const CONSTANT_CLASS: u8 = 7;
    pub const CONSTANT_STRING: u8 = 8;
    pub const CONSTANT_FIELDREF: u8 = 9;
    pub const CONSTANT_METHODREF: u8 = 10;
    pub const CONSTANT_INTERFACEMETHODREF: u8 = 11;
    pub const CONSTANT_NAMEANDTYPE: u8 = 12;
    pub const CONSTANT_METHODHANDLE: u8 = 15;
    pub const CONSTANT_METHODTYPE: u8 = 16;
    pub const CONSTANT_DYNAMIC: u8 = 17;
    pub const CONSTANT_INVOKEDYNAMIC: u8 = 18;
    pub const CONSTANT_MODULE: u8 = 19;
    pub const CONSTANT_PACKAGE: u8 = 20;
}

/// Method handle reference kinds
pub mod handle_kinds {
    pub const H_GETFIELD: u8 = 1;
    pub const H_GETSTATIC: u8 = 2;
    pub const H_PUTFIELD: u8 = 3;
    pub const H_PUTSTATIC: u8 = 4;
    pub const H_INVOKEVIRTUAL: u8 = 5;
    pub const H_INVOKESTATIC: u8 = 6;
    pub const H_INVOKESPECIAL: u8 = 7;
    pub const H_NEWINVOKESPECIAL: u8 = 8;
    pub const H_INVOKEINTERFACE: u8 = 9;
}

/// The opcodes this crate inspects or emits
pub mod opcodes {
    pub const ILOAD: u8 = 0x15;
    pub const LLOAD: u8 = 0x16;
    pub const FLOAD: u8 = 0x17;
    pub const DLOAD: u8 = 0x18;
    pub const ALOAD: u8 = 0x19;
    pub const ILOAD_0: u8 = 0x1a;
    pub const ALOAD_3: u8 = 0x2d;
    pub const ALOAD_0: u8 = 0x2a;
    pub const IINC: u8 = 0x84;
    pub const RETURN: u8 = 0xb1;
    pub const PUTFIELD: u8 = 0xb5;
    pub const INVOKESPECIAL: u8 = 0xb7;
    pub const INVOKEDYNAMIC: u8 = 0xba;
    pub const TABLESWITCH: u8 = 0xaa;
    pub const LOOKUPSWITCH: u8 = 0xab;
    pub const WIDE: u8 = 0xc4;
}

// Fixed instruction widths, including opcode byte. 0 marks the three
// variable-width instructions and undefined opcodes.
#[rustfmt::skip]
const INSN_WIDTHS: [u8; 256] = [
    // 0x00 - 0x0f: nop, const
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    // 0x10 bipush, 0x11 sipush, 0x12 ldc, 0x13 ldc_w, 0x14 ldc2_w, 0x15-0x19 loads
    2, 3, 2, 3, 3, 2, 2, 2, 2, 2,
    // 0x1a - 0x2d: xload_n
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    // 0x2e - 0x35: array loads
    1, 1, 1, 1, 1, 1, 1, 1,
    // 0x36 - 0x3a: stores
    2, 2, 2, 2, 2,
    // 0x3b - 0x4e: xstore_n
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    // 0x4f - 0x56: array stores
    1, 1, 1, 1, 1, 1, 1, 1,
    // 0x57 - 0x5f: stack ops
    1, 1, 1, 1, 1, 1, 1, 1, 1,
    // 0x60 - 0x83: arithmetic / logic
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    1, 1, 1, 1,
    // 0x84 iinc
    3,
    // 0x85 - 0x98: conversions and comparisons
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    // 0x99 - 0xa8: branches, goto, jsr
    3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3,
    // 0xa9 ret, 0xaa tableswitch, 0xab lookupswitch
    2, 0, 0,
    // 0xac - 0xb1: returns
    1, 1, 1, 1, 1, 1,
    // 0xb2 - 0xb5: get/putstatic, get/putfield
    3, 3, 3, 3,
    // 0xb6 - 0xb8: invokevirtual, invokespecial, invokestatic
    3, 3, 3,
    // 0xb9 invokeinterface, 0xba invokedynamic, 0xbb new, 0xbc newarray
    5, 5, 3, 2,
    // 0xbd anewarray, 0xbe arraylength, 0xbf athrow
    3, 1, 1,
    // 0xc0 checkcast, 0xc1 instanceof, 0xc2/0xc3 monitor
    3, 3, 1, 1,
    // 0xc4 wide, 0xc5 multianewarray, 0xc6/0xc7 ifnull/ifnonnull
    0, 4, 3, 3,
    // 0xc8 goto_w, 0xc9 jsr_w
    5, 5,
    // 0xca - 0xff: reserved / undefined
    0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
];

fn read_i32(code: &[u8], at: usize) -> Result<i32> {
    let b: [u8; 4] = code
        .get(at..at + 4)
        .ok_or_else(|| Error::class_parse("truncated switch instruction"))?
        .try_into()
        .unwrap_or([0; 4]);
    Ok(i32::from_be_bytes(b))
}

/// Width in bytes of the instruction at `pc`, including its operands.
pub fn instruction_length(code: &[u8], pc: usize) -> Result<usize> {
    let op = code[pc];
    match op {
        opcodes::TABLESWITCH => {
            let pad = (4 - ((pc + 1) % 4)) % 4;
            let base = pc + 1 + pad;
            let low = read_i32(code, base + 4)?;
            let high = read_i32(code, base + 8)?;
            if high < low {
                return Err(Error::class_parse("tableswitch with high < low"));
            }
            Ok(1 + pad + 12 + ((high - low + 1) as usize) * 4)
        }
        opcodes::LOOKUPSWITCH => {
            let pad = (4 - ((pc + 1) % 4)) % 4;
            let base = pc + 1 + pad;
            let npairs = read_i32(code, base + 4)?;
            if npairs < 0 {
                return Err(Error::class_parse("lookupswitch with negative npairs"));
            }
            Ok(1 + pad + 8 + (npairs as usize) * 8)
        }
        opcodes::WIDE => {
            let modified = *code
                .get(pc + 1)
                .ok_or_else(|| Error::class_parse("truncated wide instruction"))?;
            Ok(if modified == opcodes::IINC { 6 } else { 4 })
        }
        _ => match INSN_WIDTHS[op as usize] {
            0 => Err(Error::class_parse(format!("unknown opcode 0x{op:02x}"))),
            n => Ok(n as usize),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_widths() {
        assert_eq!(instruction_length(&[0x00], 0).unwrap(), 1); // nop
        assert_eq!(instruction_length(&[0x19, 0x01], 0).unwrap(), 2); // aload
        assert_eq!(instruction_length(&[0xb7, 0, 1], 0).unwrap(), 3); // invokespecial
        assert_eq!(instruction_length(&[0xba, 0, 1, 0, 0], 0).unwrap(), 5); // invokedynamic
    }

    #[test]
    fn test_wide() {
        assert_eq!(instruction_length(&[0xc4, 0x15, 0, 5], 0).unwrap(), 4);
        assert_eq!(instruction_length(&[0xc4, 0x84, 0, 5, 0, 1], 0).unwrap(), 6);
    }

    #[test]
    fn test_tableswitch_alignment() {
        // Opcode at pc 0, 3 pad bytes, default, low=0, high=1, 2 offsets.
        let mut code = vec![0xaa, 0, 0, 0];
        code.extend_from_slice(&0i32.to_be_bytes());
        code.extend_from_slice(&0i32.to_be_bytes());
        code.extend_from_slice(&1i32.to_be_bytes());
        code.extend_from_slice(&[0; 8]);
        assert_eq!(instruction_length(&code, 0).unwrap(), code.len());
    }

    #[test]
    fn test_unknown_opcode() {
        assert!(instruction_length(&[0xff], 0).is_err());
    }
}
