use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Chooses which task an alert highlights.
pub trait TaskPicker {
    /// Returns an index below `len`, or `None` when `len == 0`.
    fn pick(&mut self, len: usize) -> Option<usize>;
}

/// Uniform choice backed by a seedable generator.
#[derive(Debug, Clone)]
pub struct RandomPicker {
    rng: StdRng,
}

impl RandomPicker {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomPicker {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl TaskPicker for RandomPicker {
    fn pick(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        Some(self.rng.gen_range(0..len))
    }
}
