//! Logistic-map chaos source.
//!
//! Every probabilistic choice a generator makes is driven by one scalar
//! state evolving under `x ← r·x·(1−x)`. For a fixed growth rate and seed
//! the sequence is fully reproducible, which is what the tests rely on.

/// Growth rate used when the control is absent.
pub const DEFAULT_GROWTH_RATE: f64 = 3.8;

/// Lowest accepted growth rate.
pub const GROWTH_RATE_MIN: f64 = 1.0;

/// Highest accepted growth rate.
pub const GROWTH_RATE_MAX: f64 = 4.0;

/// Initial state, and the value a degenerate state resets to.
pub const SEED: f64 = 0.5;

/// Logistic-map state, always strictly inside (0, 1).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Chaos {
    x: f64,
}

impl Chaos {
    pub const fn new() -> Self {
        Self { x: SEED }
    }

    /// Current state without advancing.
    pub fn value(&self) -> f64 {
        self.x
    }

    /// Advance one step and return the new state.
    ///
    /// `growth_rate` is clamped to [1, 4]; NaN falls back to the default.
    /// A result on or outside the (0, 1) boundary resets the state to
    /// [`SEED`] instead of propagating.
    pub fn advance(&mut self, growth_rate: f64) -> f64 {
        let r = if growth_rate.is_nan() {
            DEFAULT_GROWTH_RATE
        } else {
            growth_rate.clamp(GROWTH_RATE_MIN, GROWTH_RATE_MAX)
        };
        let next = r * self.x * (1.0 - self.x);
        self.x = if next > 0.0 && next < 1.0 { next } else { SEED };
        self.x
    }

    /// Advance once and pick a table entry with [`bucket`].
    pub fn pick<'a, T>(&mut self, growth_rate: f64, table: &'a [T]) -> &'a T {
        let value = self.advance(growth_rate);
        &table[bucket(value, table.len())]
    }
}

impl Default for Chaos {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a value in (0, 1) onto `count` buckets.
///
/// Scales by `count - 0.001` so a value just below 1.0 still lands in the
/// last bucket rather than one past it.
pub fn bucket(value: f64, count: usize) -> usize {
    if count == 0 {
        return 0;
    }
    let index = libm::floor(value * (count as f64 - 0.001));
    if index <= 0.0 {
        0
    } else {
        (index as usize).min(count - 1)
    }
}
