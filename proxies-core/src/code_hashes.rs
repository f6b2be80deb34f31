//! Code hashes of the built-in proxy programs.
//!
//! Address derivation mixes these in, so they are embedded as constants rather than
//! computed from a deployed account: anyone holding this crate can predict where a
//! proxy or holder will live before it exists. Each value is the SHA-256 of the
//! matching program image; `proxies-contracts` checks them against the images.

use crate::id::CodeHash;

/// Code hash of the direct (one-to-one) proxy
pub const ONE_TO_ONE_CODE_HASH: CodeHash = CodeHash::new([
    0xc2, 0xe5, 0x2f, 0xd1, 0xf4, 0xcd, 0x90, 0x02, 0x3d, 0x50, 0x76, 0xbb, 0x2a, 0x4b, 0x58,
    0xd4, 0x79, 0x4c, 0x20, 0x91, 0xa4, 0x09, 0x31, 0xb7, 0x03, 0x7a, 0x19, 0xc3, 0x15, 0x3f,
    0xf8, 0x5f,
]);

/// Code hash of the indirect (many-to-one) proxy
pub const MANY_TO_ONE_CODE_HASH: CodeHash = CodeHash::new([
    0xe6, 0x08, 0xec, 0x86, 0x1e, 0x92, 0x9c, 0xa6, 0x1a, 0x49, 0x7b, 0xef, 0xb1, 0x61, 0x4e,
    0x83, 0xba, 0x95, 0x55, 0xc8, 0x94, 0x2b, 0x65, 0x46, 0xe5, 0x92, 0x64, 0x00, 0x13, 0xde,
    0xd8, 0x2d,
]);

/// Code hash of the implementation holder
pub const IMPLEMENTATION_HOLDER_CODE_HASH: CodeHash = CodeHash::new([
    0x37, 0xd7, 0xfe, 0xc5, 0xbd, 0xb0, 0x51, 0x9c, 0x8f, 0xee, 0x5c, 0xab, 0x66, 0xdb, 0x35,
    0xe5, 0x9f, 0x56, 0x09, 0xf6, 0x59, 0x8f, 0x64, 0x74, 0x91, 0x83, 0x55, 0xd8, 0x5a, 0xbf,
    0x8f, 0x2f,
]);
