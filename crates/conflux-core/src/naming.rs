//! Shared naming utilities for generated declarations.
//!
//! Synthesized binding modules and hint properties are named
//! deterministically from the qualified names that identify them. When a
//! derived name would exceed the host platform's file-name length limit
//! it is truncated and suffixed with a hash of the *full* untruncated
//! identity, so collisions stay negligible while the name stays legal.

use sha2::{Digest, Sha256};

use crate::name::QualifiedName;

/// Most filesystems cap file names at 255 bytes; generated declaration
/// names become file names downstream, so they must stay under this.
pub const MAX_GENERATED_NAME_LEN: usize = 255;

/// Hex digest length appended to truncated names.
const HASH_SUFFIX_LEN: usize = 16;

/// Flatten a qualified name into a single identifier segment
/// (`com.app.Repo` -> `com_app_Repo`).
pub fn flatten(name: &QualifiedName) -> String {
    name.as_str().replace('.', "_")
}

/// Cap `name` at `limit` bytes, keeping determinism by hashing the full
/// untruncated string into the suffix.
pub fn capped(name: String, limit: usize) -> String {
    if name.len() <= limit {
        return name;
    }
    let digest = Sha256::digest(name.as_bytes());
    let suffix: String = digest
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<String>()[..HASH_SUFFIX_LEN]
        .to_string();
    // The cut point is a byte budget; back up to the nearest char
    // boundary so multibyte identifiers cannot split mid-character.
    let mut keep = limit - HASH_SUFFIX_LEN - 1;
    while !name.is_char_boundary(keep) {
        keep -= 1;
    }
    format!("{}_{}", &name[..keep], suffix)
}

/// Cap at the platform file-name limit.
pub fn capped_for_file_name(name: String) -> String {
    capped(name, MAX_GENERATED_NAME_LEN)
}
