//! Hand-assembled descriptor bytes shared by the unit tests.
//!
//! The bytes follow the layout javac produces for:
//!
//! ```text
//! module sample {
//!     requires java.compiler;
//!     exports sample.exported;
//!     opens sample.internal to java.compiler;
//!     uses javax.tools.Tool;
//!     provides java.lang.Object with sample.internal.Internal;
//! }
//! ```
//!
//! compiled with `--module-version 1.2.3` on Java 17.

fn u2(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}

fn utf8(out: &mut Vec<u8>, text: &str) {
    out.push(1);
    u2(out, text.len() as u16);
    out.extend_from_slice(text.as_bytes());
}

fn reference(out: &mut Vec<u8>, tag: u8, index: u16) {
    out.push(tag);
    u2(out, index);
}

/// Pool index of the module version Utf8 entry
pub(crate) const VERSION_INDEX: u16 = 8;
/// `constant_pool_count` of [`sample_module_info`]
pub(crate) const POOL_COUNT: u16 = 25;

/// The constant pool entries, without the count
fn pool() -> Vec<u8> {
    let mut out = Vec::new();
    reference(&mut out, 7, 2); // 1
    utf8(&mut out, "module-info"); // 2
    utf8(&mut out, "SourceFile"); // 3
    utf8(&mut out, "module-info.java"); // 4
    utf8(&mut out, "Module"); // 5
    reference(&mut out, 19, 7); // 6
    utf8(&mut out, "sample"); // 7
    utf8(&mut out, "1.2.3"); // 8
    reference(&mut out, 19, 10); // 9
    utf8(&mut out, "java.base"); // 10
    utf8(&mut out, "17"); // 11
    reference(&mut out, 19, 13); // 12
    utf8(&mut out, "java.compiler"); // 13
    reference(&mut out, 20, 15); // 14
    utf8(&mut out, "sample/exported"); // 15
    reference(&mut out, 20, 17); // 16
    utf8(&mut out, "sample/internal"); // 17
    reference(&mut out, 7, 19); // 18
    utf8(&mut out, "javax/tools/Tool"); // 19
    reference(&mut out, 7, 21); // 20
    utf8(&mut out, "java/lang/Object"); // 21
    reference(&mut out, 7, 23); // 22
    utf8(&mut out, "sample/internal/Internal"); // 23
    utf8(&mut out, "ModulePackages"); // 24
    out
}

fn module_payload() -> Vec<u8> {
    let mut out = Vec::new();
    for value in [
        6, 0, VERSION_INDEX, // name, flags, version
        2, 9, 0x8000, 11, 12, 0, 11, // requires
        1, 14, 0, 0, // exports
        1, 16, 0, 1, 12, // opens
        1, 18, // uses
        1, 20, 1, 22, // provides
    ] {
        u2(&mut out, value);
    }
    out
}

/// The complete `module-info.class`
pub(crate) fn sample_module_info() -> Vec<u8> {
    let mut out = vec![0xCA, 0xFE, 0xBA, 0xBE];
    u2(&mut out, 0); // minor
    u2(&mut out, 61); // major
    u2(&mut out, POOL_COUNT);
    out.extend(pool());

    u2(&mut out, 0x8000); // access_flags
    u2(&mut out, 1); // this_class
    for _ in 0..4 {
        u2(&mut out, 0);
    }

    u2(&mut out, 3); // attributes_count

    u2(&mut out, 3);
    out.extend_from_slice(&2u32.to_be_bytes());
    u2(&mut out, 4);

    let module = module_payload();
    u2(&mut out, 5);
    out.extend_from_slice(&(module.len() as u32).to_be_bytes());
    out.extend(module);

    u2(&mut out, 24);
    out.extend_from_slice(&6u32.to_be_bytes());
    for value in [2, 14, 16] {
        u2(&mut out, value);
    }

    out
}

/// Offset of `access_flags` in [`sample_module_info`]
pub(crate) fn access_flags_offset() -> usize {
    10 + pool().len()
}

/// Offset of `attributes_count` in [`sample_module_info`]
pub(crate) fn attributes_count_offset() -> usize {
    access_flags_offset() + 12
}

/// The sample descriptor with `attributes_count` raised by one and an extra
/// attribute appended, named by a new Utf8 entry
pub(crate) fn with_extra_attribute(name: &str, info: &[u8]) -> Vec<u8> {
    let mut bytes = sample_module_info();
    let pool_end = access_flags_offset();

    let mut entry = Vec::new();
    utf8(&mut entry, name);
    let shift = entry.len();
    bytes.splice(pool_end..pool_end, entry);
    bytes[8..10].copy_from_slice(&(POOL_COUNT + 1).to_be_bytes());

    let count_at = attributes_count_offset() + shift;
    bytes[count_at..count_at + 2].copy_from_slice(&4u16.to_be_bytes());

    u2(&mut bytes, POOL_COUNT);
    bytes.extend_from_slice(&(info.len() as u32).to_be_bytes());
    bytes.extend_from_slice(info);
    bytes
}
