//! Seed derivation for reproducible schedules
//!
//! A single master seed drives every random component. SHA-256 derivation
//! keeps component streams independent: the same master seed always yields
//! the same arrival sequence, while distinct components never share a stream.
//!
//! A master seed of `0` means "no seed": each run draws fresh entropy.

use rand::rngs::SmallRng;
use rand::SeedableRng;
use sha2::{Digest, Sha256};

/// Derive a component-specific seed from a master seed using SHA-256
///
/// # Parameters
/// - `master_seed`: The master seed from configuration
/// - `component`: Component identifier (see [`components`])
///
/// # Returns
/// A deterministic u64 seed derived from the inputs
pub fn derive_seed(master_seed: u64, component: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(master_seed.to_be_bytes());
    hasher.update(component.as_bytes());
    let result = hasher.finalize();
    u64::from_be_bytes([
        result[0], result[1], result[2], result[3], result[4], result[5], result[6], result[7],
    ])
}

/// Build an RNG from an optional seed (`None` = fresh entropy)
pub fn rng_from_seed(seed: Option<u64>) -> SmallRng {
    match seed {
        Some(s) => SmallRng::seed_from_u64(s),
        None => SmallRng::from_os_rng(),
    }
}

/// Standard component names for seed derivation
pub mod components {
    pub const ARRIVAL_PROCESS: &str = "arrival_process";
}
