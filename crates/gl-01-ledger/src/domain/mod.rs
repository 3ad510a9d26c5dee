//! Domain layer: pure ledger logic with no I/O.

pub mod genesis;
pub mod hashing;
pub mod ledger;
pub mod pow;
pub mod validation;

pub use genesis::{genesis_block, is_genesis};
pub use hashing::{
    encode_block_data, hash_block, hash_payload, meets_difficulty, sha256_hex, DIFFICULTY_PREFIX,
};
pub use ledger::{Ledger, MiningJob, SharedLedger};
pub use pow::{proof_of_work, solve, Solution};
pub use validation::is_chain_valid;
