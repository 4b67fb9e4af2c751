//! Per-second accumulators

use rust_decimal::Decimal;
use thiserror::Error;

/// An event whose value would push a sum out of its representable range
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SumOverflow {
    #[error("x would push the window sum outside the decimal range")]
    X,
    #[error("y would push the window sum outside the 64-bit integer range")]
    Y,
}

/// Accumulator for every event observed during one epoch second
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    second: i64,
    sum_x: Decimal,
    sum_y: i64,
    count: u64,
    // Sums of |x| and |y|; they bound every partial sum over these events
    magnitude_x: Decimal,
    magnitude_y: u128,
}

impl Bucket {
    /// Create an empty bucket for `second`
    pub fn new(second: i64) -> Self {
        Self {
            second,
            sum_x: Decimal::ZERO,
            sum_y: 0,
            count: 0,
            magnitude_x: Decimal::ZERO,
            magnitude_y: 0,
        }
    }

    /// Fold one event into the bucket
    ///
    /// On overflow the bucket is left exactly as it was.
    pub fn add(&mut self, x: Decimal, y: i64) -> Result<(), SumOverflow> {
        let sum_x = self.sum_x.checked_add(x).ok_or(SumOverflow::X)?;
        let magnitude_x = self
            .magnitude_x
            .checked_add(x.abs())
            .ok_or(SumOverflow::X)?;
        let sum_y = self.sum_y.checked_add(y).ok_or(SumOverflow::Y)?;

        self.sum_x = sum_x;
        self.magnitude_x = magnitude_x;
        self.sum_y = sum_y;
        self.magnitude_y += u128::from(y.unsigned_abs());
        self.count += 1;
        Ok(())
    }

    pub fn second(&self) -> i64 {
        self.second
    }

    pub fn sum_x(&self) -> Decimal {
        self.sum_x
    }

    pub fn sum_y(&self) -> i64 {
        self.sum_y
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Sum of `|x|` over the bucket's events
    pub fn magnitude_x(&self) -> Decimal {
        self.magnitude_x
    }

    /// Sum of `|y|` over the bucket's events
    pub fn magnitude_y(&self) -> u128 {
        self.magnitude_y
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Close the bucket; no further events can be added to it
    pub fn seal(self) -> SealedBucket {
        SealedBucket(self)
    }
}

/// A bucket that has been moved into history and can only be read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedBucket(Bucket);

impl SealedBucket {
    pub fn second(&self) -> i64 {
        self.0.second
    }

    pub fn count(&self) -> u64 {
        self.0.count
    }

    /// Read-only view of the sealed totals
    pub fn as_bucket(&self) -> &Bucket {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_new_bucket_is_empty() {
        let bucket = Bucket::new(42);

        assert!(bucket.is_empty());
        assert_eq!(bucket.second(), 42);
        assert_eq!(bucket.sum_x(), Decimal::ZERO);
        assert_eq!(bucket.sum_y(), 0);
    }

    #[test]
    fn test_add_accumulates_exactly() {
        let mut bucket = Bucket::new(0);
        let x = Decimal::from_str("0.1").unwrap();

        for _ in 0..10 {
            bucket.add(x, 7).unwrap();
        }

        assert_eq!(bucket.count(), 10);
        assert_eq!(bucket.sum_x(), Decimal::ONE);
        assert_eq!(bucket.sum_y(), 70);
    }

    #[test]
    fn test_negative_values_cancel_out() {
        let mut bucket = Bucket::new(0);
        bucket.add(Decimal::from_str("2.5").unwrap(), 10).unwrap();
        bucket.add(Decimal::from_str("-2.5").unwrap(), -10).unwrap();

        assert_eq!(bucket.count(), 2);
        assert!(bucket.sum_x().is_zero());
        assert_eq!(bucket.sum_y(), 0);
        assert_eq!(bucket.magnitude_x(), Decimal::from(5));
        assert_eq!(bucket.magnitude_y(), 20);
    }

    #[test]
    fn test_seal_preserves_totals() {
        let mut bucket = Bucket::new(9);
        bucket.add(Decimal::from(3), 4).unwrap();

        let sealed = bucket.clone().seal();

        assert_eq!(sealed.second(), 9);
        assert_eq!(sealed.count(), 1);
        assert_eq!(sealed.as_bucket(), &bucket);
    }

    #[test]
    fn test_x_overflow_leaves_bucket_unchanged() {
        let mut bucket = Bucket::new(0);
        let half = Decimal::from_str("50000000000000000000000000000").unwrap();
        bucket.add(half, 1).unwrap();
        let before = bucket.clone();

        assert_eq!(bucket.add(half, 1), Err(SumOverflow::X));
        assert_eq!(bucket, before);
    }

    #[test]
    fn test_y_overflow_leaves_bucket_unchanged() {
        let mut bucket = Bucket::new(0);
        bucket.add(Decimal::ONE, i64::MAX).unwrap();
        let before = bucket.clone();

        assert_eq!(bucket.add(Decimal::ONE, 1), Err(SumOverflow::Y));
        assert_eq!(bucket, before);
        assert_eq!(bucket.count(), 1);
    }
}
