//! Growth policy for [`Array`](crate::Array) reallocation.

/// How much extra capacity an [`Array`](crate::Array) reserves when an
/// insertion outgrows its buffer.
///
/// Chosen once, at construction. The policy is configuration, not
/// runtime-mutable state: callers that need different growth behavior
/// build a different array.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GrowthStrategy {
    /// Grow to exactly the required size. Minimal waste, one
    /// reallocation per insertion past capacity — for memory-tight,
    /// rarely-growing arrays.
    Safe,
    /// Geometric growth that tapers off as the array gets large:
    /// small arrays over-reserve a fixed pad of 5, mid-sized arrays
    /// double, large arrays add 25%. Bounds amortized insertion to
    /// O(1) while capping worst-case waste.
    #[default]
    Double,
}

impl GrowthStrategy {
    /// Capacity thresholds for the [`Double`](GrowthStrategy::Double)
    /// curve: below `PAD_BELOW` the pad is a flat 5, below
    /// `DOUBLE_BELOW` the array doubles, above it grows by 25%.
    const PAD_BELOW: u32 = 5;
    const DOUBLE_BELOW: u32 = 500;

    /// New capacity for an array of `used` elements and `allocated`
    /// capacity that needs room for one more element.
    ///
    /// Always returns at least `used + 1`.
    pub fn grown_capacity(self, used: u32, allocated: u32) -> u32 {
        match self {
            Self::Safe => used + 1,
            Self::Double => {
                let pad = if allocated < Self::PAD_BELOW {
                    Self::PAD_BELOW
                } else if allocated < Self::DOUBLE_BELOW {
                    used
                } else {
                    used >> 2
                };
                used + 1 + pad
            }
        }
    }
}
