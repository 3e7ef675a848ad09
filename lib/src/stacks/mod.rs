//! Stacks primitives: addresses, token transfer transactions and node lookups.

pub mod address;
pub mod c32;
pub mod node;
pub mod transaction;

pub use address::{Principal, StacksAddress};
pub use node::NodeClient;
pub use transaction::{Memo, StacksTransaction, TokenTransfer};

use ripemd::Ripemd160;
use sha2::{Digest, Sha256, Sha512_256};

/// RIPEMD-160 of SHA-256, the hash behind account addresses.
pub fn hash160(data: &[u8]) -> [u8; 20] {
    let sha = Sha256::digest(data);
    let mut out = [0u8; 20];
    out.copy_from_slice(&Ripemd160::digest(sha));
    out
}

/// SHA-512/256, the hash used for transaction ids and signature hashes.
pub fn sha512_256(data: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Sha512_256::digest(data));
    out
}
