pub mod hash_signer;

pub use hash_signer::{HashSigner, TokenScheme};
