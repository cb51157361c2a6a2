//! Wrap-aware comparisons of 16-bit RTP sequence numbers.

/// Whether `a` comes after `b`, treating the distance modulo 2^16.
pub fn is_newer(a: u16, b: u16) -> bool {
    a != b && a.wrapping_sub(b) < 0x8000
}

/// Number of sequence numbers in `low..=high`.
pub fn span(low: u16, high: u16) -> usize {
    high.wrapping_sub(low) as usize + 1
}

/// Whether `seq` lies within `low..=high`.
pub fn in_range(seq: u16, low: u16, high: u16) -> bool {
    seq.wrapping_sub(low) <= high.wrapping_sub(low)
}
