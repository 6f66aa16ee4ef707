//! Wraparound-compensating counter extension.
//!
//! CSC sensors report cumulative counts in fixed-width fields that
//! periodically overflow to zero (16-bit event times roll over every
//! 64 seconds). `ExtendedCounter` unwraps those samples into a
//! monotonically non-decreasing 64-bit value.

/// Extends a finite-width wrapping counter into a monotone `u64`.
///
/// Assumes the counter is observed at least once per wrap period, so a
/// raw sample lower than the previous one means exactly one overflow
/// occurred in between. The sensor's notification interval guarantees
/// this for the bit widths used here.
#[derive(Debug, Clone)]
pub struct ExtendedCounter {
    /// 2^bits of the underlying field
    modulus: u64,
    /// Most recent raw sample, `None` before the first observation
    last_raw: Option<u64>,
    /// Accumulated wraps times modulus
    base: u64,
}

impl ExtendedCounter {
    /// Create a tracker for a counter of the given bit width.
    pub fn new(bits: u8) -> Self {
        debug_assert!(bits > 0 && bits < 64);
        Self {
            modulus: 1u64 << bits,
            last_raw: None,
            base: 0,
        }
    }

    /// The extended value `extend` would return for `raw`, without
    /// committing it.
    ///
    /// Lets a caller validate a whole event pair before mutating any
    /// tracker, so a rejected frame leaves no trace.
    pub fn peek(&self, raw: u64) -> u64 {
        debug_assert!(raw < self.modulus, "raw sample exceeds counter width");

        match self.last_raw {
            None => raw,
            Some(last) if raw < last => self.base + self.modulus + raw,
            Some(_) => self.base + raw,
        }
    }

    /// Fold a raw sample into the extended value.
    ///
    /// The first call seeds the tracker and returns the sample as-is.
    /// A repeated sample returns the same extended value as last time,
    /// which callers use to detect "no new event". The returned value
    /// never decreases.
    pub fn extend(&mut self, raw: u64) -> u64 {
        let extended = self.peek(raw);
        if let Some(last) = self.last_raw {
            if raw < last {
                self.base += self.modulus;
            }
        }
        self.last_raw = Some(raw);
        extended
    }

    /// Current extended value, `None` before the first sample.
    pub fn current(&self) -> Option<u64> {
        self.last_raw.map(|raw| self.base + raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sample_returned_as_is() {
        let mut counter = ExtendedCounter::new(16);
        assert_eq!(counter.extend(65530), 65530);
    }

    #[test]
    fn test_wraparound_adds_one_modulus() {
        let mut counter = ExtendedCounter::new(16);
        assert_eq!(counter.extend(65530), 65530);
        assert_eq!(counter.extend(65533), 65533);
        assert_eq!(counter.extend(2), 65538);
        assert_eq!(counter.extend(10), 65546);
    }

    #[test]
    fn test_repeat_returns_same_value() {
        let mut counter = ExtendedCounter::new(16);
        assert_eq!(counter.extend(100), 100);
        assert_eq!(counter.extend(100), 100);

        // Repeats after a wrap stay put too.
        assert_eq!(counter.extend(5), 65541);
        assert_eq!(counter.extend(5), 65541);
    }

    #[test]
    fn test_multiple_wraps_accumulate() {
        let mut counter = ExtendedCounter::new(16);
        counter.extend(60000);
        assert_eq!(counter.extend(100), 65636);
        counter.extend(60000);
        assert_eq!(counter.extend(50), 131122);
    }

    #[test]
    fn test_32_bit_width() {
        let mut counter = ExtendedCounter::new(32);
        counter.extend(u32::MAX as u64 - 1);
        assert_eq!(counter.extend(3), (1u64 << 32) + 3);
    }

    #[test]
    fn test_peek_does_not_commit() {
        let mut counter = ExtendedCounter::new(16);
        counter.extend(65530);

        // Peeking past the wrap neither moves the base nor the cursor.
        assert_eq!(counter.peek(2), 65538);
        assert_eq!(counter.peek(2), 65538);
        assert_eq!(counter.current(), Some(65530));

        assert_eq!(counter.extend(2), 65538);
    }

    #[test]
    fn test_current_tracks_latest() {
        let mut counter = ExtendedCounter::new(16);
        assert_eq!(counter.current(), None);
        counter.extend(65000);
        counter.extend(12);
        assert_eq!(counter.current(), Some(65548));
    }
}
