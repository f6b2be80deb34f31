pub mod code_hashes;
pub mod derivation;
pub mod error;
pub mod id;

// Re-export the main types for convenience
pub use code_hashes::{IMPLEMENTATION_HOLDER_CODE_HASH, MANY_TO_ONE_CODE_HASH, ONE_TO_ONE_CODE_HASH};
pub use derivation::{
    derive_address, derive_create_address, derive_direct_proxy_address, derive_holder_address,
    derive_indirect_proxy_address, many_to_one_salt, one_to_one_salt,
};
pub use error::ParseIdError;
pub use id::{Address, CodeHash, ImplementationId, Salt, ADDRESS_LENGTH};
