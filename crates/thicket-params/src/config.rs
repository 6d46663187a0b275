//! Parameter-arena configuration.

/// Configuration for a [`Params`](crate::Params) arena.
///
/// Validated at construction by [`Params::new`](crate::Params::new).
#[derive(Clone, Debug)]
pub struct ParamsConfig {
    /// Initial column capacity of the arena.
    ///
    /// Default: 128. Must be non-negative. Signed so that a negative size
    /// computed by a caller surfaces as an error instead of wrapping.
    pub initial_capacity: i64,
}

impl ParamsConfig {
    /// Default initial capacity in columns.
    pub const DEFAULT_INITIAL_CAPACITY: i64 = 128;

    /// Create a config with the given initial capacity.
    pub fn new(initial_capacity: i64) -> Self {
        Self { initial_capacity }
    }
}

impl Default for ParamsConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INITIAL_CAPACITY)
    }
}
