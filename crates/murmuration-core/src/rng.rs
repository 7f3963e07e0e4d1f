use crate::constants::RNG_DERIVATION_PRIME;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;

/// Create a deterministic RNG from a seed.
pub fn create_rng(seed: u64) -> ChaCha12Rng {
    ChaCha12Rng::seed_from_u64(seed)
}

/// Derive a sub-RNG for a specific entity, ensuring independent streams.
pub fn derive_entity_rng(base_seed: u64, entity_index: usize) -> ChaCha12Rng {
    ChaCha12Rng::seed_from_u64(
        base_seed.wrapping_add(entity_index as u64 * RNG_DERIVATION_PRIME),
    )
}
