use rand::{rngs::StdRng, Rng, RngCore, SeedableRng};

/// Deterministic generator used for all noise draws within one call.
///
/// Wraps a [`StdRng`] so callers can either pass a seed (reproducible
/// randomisation) or hand over an existing generator. All mechanism code
/// draws through this adapter, never through `rand` directly.
#[derive(Debug)]
pub struct Prng(StdRng);

impl Prng {
    /// Seeded generator. A fixed seed reproduces every draw of the call.
    pub fn from_seed(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }

    /// Generator seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self(StdRng::from_entropy())
    }

    /// Resolves an optional seed into a usable generator.
    pub fn resolve(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::from_seed(seed),
            None => Self::from_entropy(),
        }
    }

    /// Uniform draw in `[0, 1)`.
    pub fn uniform_unit(&mut self) -> f64 {
        self.0.gen::<f64>()
    }
}

impl From<StdRng> for Prng {
    fn from(rng: StdRng) -> Self {
        Self(rng)
    }
}

impl RngCore for Prng {
    fn next_u32(&mut self) -> u32 {
        self.0.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.0.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.0.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.0.try_fill_bytes(dest)
    }
}
