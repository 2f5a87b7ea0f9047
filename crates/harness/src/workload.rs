use rand::{Rng, SeedableRng, rngs::StdRng};
use std::iter::FusedIterator;

/// Deltas are sampled from `[0, DELTA_UPPER_BOUND)`.
pub const DELTA_UPPER_BOUND: u64 = 10;

/// Cumulative value at which a unit of work is complete.
pub const DEFAULT_THRESHOLD: u64 = 50;

/// Source of the random deltas driving a walk.
pub trait RandomSource {
    /// Returns a value in `[0, upper)`.
    fn sample(&mut self, upper: u64) -> u64;
}

/// [`RandomSource`] over any [`rand::Rng`].
#[derive(Debug, Clone)]
pub struct RngSource<R = StdRng> {
    rng: R,
}

impl RngSource<StdRng> {
    /// Reproducible source: the same seed yields the same walks.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> RngSource<R> {
    pub const fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> RandomSource for RngSource<R> {
    fn sample(&mut self, upper: u64) -> u64 {
        self.rng.gen_range(0..upper)
    }
}

/// Replays a fixed script of values, wrapping around when it runs out.
///
/// Values are reduced modulo `upper`.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    values: Vec<u64>,
    position: usize,
}

impl ScriptedSource {
    /// # Panics
    /// Panics if `values` is empty. A walk driven by an empty script would
    /// never reach its threshold.
    pub fn new(values: impl IntoIterator<Item = u64>) -> Self {
        let values = values.into_iter().collect::<Vec<_>>();
        assert!(!values.is_empty(), "ScriptedSource needs at least one value");
        Self {
            values,
            position: 0,
        }
    }
}

impl RandomSource for ScriptedSource {
    fn sample(&mut self, upper: u64) -> u64 {
        let value = self.values[self.position % self.values.len()];
        self.position += 1;
        value % upper
    }
}

/// One tick of a walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub delta: u64,
    pub cumulative: u64,
}

/// Bounded random walk: the workload behind each unit of work.
#[derive(Debug, Clone)]
pub struct RandomWalkWorkload<R> {
    source: R,
}

impl<R: RandomSource> RandomWalkWorkload<R> {
    pub const fn new(source: R) -> Self {
        Self { source }
    }

    /// Starts a fresh walk from zero that ends once `threshold` is reached.
    pub fn run(&mut self, threshold: u64) -> Walk<'_, R> {
        Walk {
            source: &mut self.source,
            threshold,
            cumulative: 0,
        }
    }
}

/// Lazy sequence of [`Step`]s. Yields until the cumulative value first reaches
/// the threshold and never after; a zero threshold yields nothing.
#[derive(Debug)]
pub struct Walk<'a, R> {
    source: &'a mut R,
    threshold: u64,
    cumulative: u64,
}

impl<R: RandomSource> Iterator for Walk<'_, R> {
    type Item = Step;

    fn next(&mut self) -> Option<Step> {
        if self.cumulative >= self.threshold {
            return None;
        }

        let delta = self.source.sample(DELTA_UPPER_BOUND);
        self.cumulative = self.cumulative.saturating_add(delta);
        Some(Step {
            delta,
            cumulative: self.cumulative,
        })
    }
}

impl<R: RandomSource> FusedIterator for Walk<'_, R> {}
