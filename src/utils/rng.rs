//! # Random Number Service
//!
//! The single deterministic random stream behind every probabilistic decision:
//! room placement, loot tables, combat rolls, AI choices and entity ids.
//!
//! The stream is a [`ChaCha12Rng`], which can report and jump to its word
//! position. The pair `(seed, word_pos)` is therefore a complete description
//! of the stream position, which is what gets serialized. Loading reseeds and
//! seeks straight to the recorded word, so a restored session continues the
//! exact same sequence of rolls no matter how long it has run.

use crate::{DelveError, DelveResult};
use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha12Rng;
use serde::{Deserialize, Serialize};

/// Seedable, serializable random stream shared by the whole session.
///
/// # Examples
///
/// ```
/// use delve::GameRng;
///
/// let mut a = GameRng::new(7);
/// let mut b = GameRng::new(7);
/// assert_eq!(a.random_int(1, 100), b.random_int(1, 100));
/// assert_eq!(a.word_pos(), b.word_pos());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "RngState", into = "RngState")]
pub struct GameRng {
    seed: u64,
    inner: ChaCha12Rng,
}

/// Serialized position of a [`GameRng`] stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RngState {
    /// Seed the stream was started from
    pub seed: u64,
    /// Number of 32-bit words consumed since seeding
    pub word_pos: u64,
}

impl GameRng {
    /// Creates a stream starting at the given seed.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            inner: ChaCha12Rng::seed_from_u64(seed),
        }
    }

    /// Restores a stream to a previously recorded position in constant time.
    pub fn from_state(state: RngState) -> Self {
        let mut rng = Self::new(state.seed);
        rng.inner.set_word_pos(u128::from(state.word_pos));
        rng
    }

    /// Restarts the stream from a new seed.
    pub fn seed(&mut self, value: u64) {
        *self = Self::new(value);
    }

    /// Gets the number of 32-bit words drawn since seeding.
    pub fn word_pos(&self) -> u64 {
        u64::try_from(self.inner.get_word_pos()).unwrap_or(u64::MAX)
    }

    /// Gets the current stream position.
    pub fn state(&self) -> RngState {
        RngState {
            seed: self.seed,
            word_pos: self.word_pos(),
        }
    }

    /// Returns a float in `[0, 1)`.
    pub fn random_float(&mut self) -> f64 {
        self.gen::<f64>()
    }

    /// Returns an integer in `lo..=hi`. The bounds may be given in either order.
    pub fn random_int(&mut self, lo: i32, hi: i32) -> i32 {
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        self.gen_range(lo..=hi)
    }

    /// Returns `true` with the given probability.
    pub fn chance(&mut self, probability: f64) -> bool {
        self.random_float() < probability
    }

    /// Picks one element uniformly, or `None` for an empty slice.
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        items.choose(self)
    }

    /// Picks one element with probability proportional to its weight.
    ///
    /// An empty population, a length mismatch or weights summing to zero is a
    /// programming error and is reported as [`DelveError::InvariantViolation`].
    pub fn weighted_choice<'a, T>(&mut self, items: &'a [T], weights: &[u32]) -> DelveResult<&'a T> {
        if items.len() != weights.len() {
            return Err(DelveError::InvariantViolation(format!(
                "weighted choice over {} items with {} weights",
                items.len(),
                weights.len()
            )));
        }

        let distribution = WeightedIndex::new(weights.iter().copied()).map_err(|e| {
            DelveError::InvariantViolation(format!("weighted choice failed: {}", e))
        })?;

        Ok(&items[distribution.sample(self)])
    }
}

impl Default for GameRng {
    fn default() -> Self {
        Self::new(0)
    }
}

impl RngCore for GameRng {
    fn next_u32(&mut self) -> u32 {
        self.next_u64() as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let word = self.next_u64().to_le_bytes();
            chunk.copy_from_slice(&word[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl PartialEq for GameRng {
    fn eq(&self, other: &Self) -> bool {
        self.state() == other.state()
    }
}

impl Eq for GameRng {}

impl From<RngState> for GameRng {
    fn from(state: RngState) -> Self {
        Self::from_state(state)
    }
}

impl From<GameRng> for RngState {
    fn from(rng: GameRng) -> Self {
        rng.state()
    }
}
