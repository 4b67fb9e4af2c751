//! Folded window statistics and their wire encoding

use super::bucket::Bucket;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::fmt;

/// Fractional digits used for `sum_x` and `avg_x`
pub const X_SCALE: u32 = 10;

/// Fractional digits used for `avg_y`
pub const Y_AVG_SCALE: u32 = 3;

/// Point-in-time aggregate over every bucket in the window
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateStats {
    pub count: u64,
    pub sum_x: Decimal,
    pub avg_x: Decimal,
    pub sum_y: i64,
    pub avg_y: Decimal,
}

impl AggregateStats {
    /// Statistics of a window that has seen no events
    pub fn empty() -> Self {
        Self::from_totals(0, Decimal::ZERO, 0)
    }

    /// Sum the given buckets and derive the averages
    ///
    /// Sums saturate instead of panicking. A `SlidingWindow` keeps the
    /// magnitudes of its buckets within range, so its snapshots never do.
    pub fn fold<'a, I>(buckets: I) -> Self
    where
        I: IntoIterator<Item = &'a Bucket>,
    {
        let (count, sum_x, sum_y) = buckets
            .into_iter()
            .fold((0u64, Decimal::ZERO, 0i64), |(count, sum_x, sum_y), b| {
                (
                    count.saturating_add(b.count()),
                    sum_x.saturating_add(b.sum_x()),
                    sum_y.saturating_add(b.sum_y()),
                )
            });
        Self::from_totals(count, sum_x, sum_y)
    }

    fn from_totals(count: u64, sum_x: Decimal, sum_y: i64) -> Self {
        let (avg_x, avg_y) = if count > 0 {
            let divisor = Decimal::from(count);
            (
                round_half_up(sum_x / divisor, X_SCALE),
                round_half_up(Decimal::from(sum_y) / divisor, Y_AVG_SCALE),
            )
        } else {
            (Decimal::ZERO, Decimal::ZERO)
        };

        Self {
            count,
            sum_x,
            avg_x,
            sum_y,
            avg_y,
        }
    }

    /// Encode as `count,sumY,avgY,sumX,avgX`
    pub fn to_wire_line(&self) -> String {
        format!(
            "{},{},{},{},{}",
            self.count,
            self.sum_y,
            fixed(self.avg_y, Y_AVG_SCALE),
            fixed(self.sum_x, X_SCALE),
            fixed(self.avg_x, X_SCALE),
        )
    }
}

impl Default for AggregateStats {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for AggregateStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire_line())
    }
}

fn round_half_up(value: Decimal, scale: u32) -> Decimal {
    value.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero)
}

/// Render with exactly `scale` fractional digits
///
/// Zeros are padded onto the text: a `Decimal` holds at most 28 digits, so
/// `rescale` caps the scale of wide values, and `{:.N}` formatting overruns
/// its internal buffer on them.
fn fixed(value: Decimal, scale: u32) -> String {
    let value = round_half_up(value, scale);
    let mut rendered = value.to_string();
    let missing = scale.saturating_sub(value.scale()) as usize;
    if missing > 0 {
        if value.scale() == 0 {
            rendered.push('.');
        }
        rendered.push_str(&"0".repeat(missing));
    }
    rendered
}
