//! Class byte provider capability

use std::collections::HashMap;

/// Access to the raw bytes of classes in the working set, keyed by
/// internal name. `None` means the class is foreign (library or
/// absent) and contributes no further information.
pub trait ClassByteProvider {
    fn bytes_of(&self, internal_name: &str) -> Option<&[u8]>;
}

impl ClassByteProvider for HashMap<String, Vec<u8>> {
    fn bytes_of(&self, internal_name: &str) -> Option<&[u8]> {
        self.get(internal_name).map(Vec::as_slice)
    }
}
