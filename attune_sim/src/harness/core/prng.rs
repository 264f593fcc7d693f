// attune_sim/src/harness/core/prng.rs

use crate::error::{HarnessError, HarnessResult};
use rand::rngs::OsRng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// The central pseudo-random number generator of an experiment. Everything
/// random (initial-state pick, optimizer proposals, MPC candidates) forks
/// from it, so a fixed seed reproduces a whole run.
#[derive(Debug, Clone)]
pub struct ExperimentRng(pub ChaCha8Rng);

impl ExperimentRng {
    pub fn new(seed: Option<u64>) -> HarnessResult<Self> {
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_rng(OsRng)
                .map_err(|e| HarnessError::InvalidSetting(format!("OS RNG failed: {e}")))?,
        };
        Ok(Self(rng))
    }

    /// An independent generator for one consumer.
    pub fn fork(&mut self) -> ChaCha8Rng {
        let mut seed = <ChaCha8Rng as SeedableRng>::Seed::default();
        rand::RngCore::fill_bytes(&mut self.0, &mut seed);
        ChaCha8Rng::from_seed(seed)
    }
}
