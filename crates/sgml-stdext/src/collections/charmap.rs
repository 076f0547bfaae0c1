//! Total maps from character numbers to small values.
//!
//! See the documentation on the [CharMap] type.

const LOW_SIZE: usize = 256;

/// A map from every `u32` character number to a value of type `T`.
///
/// Lookups are on the hot path of every scanner, so the first 256 character
///     numbers are stored in a direct table.
/// Everything above is stored as a sorted list of `(lo, hi, value)` ranges;
///     characters not covered by any range map to the default value.
///
/// ```
/// # use sgml_stdext::collections::charmap::CharMap;
/// let mut map = CharMap::new(0_u8);
/// map.set_range('a' as u32, 'z' as u32, 1);
/// map.set_range(0x400, 0x4FF, 2);
/// map.set_char(0x450, 3);
/// assert_eq!(map.get('q' as u32), 1);
/// assert_eq!(map.get(0x401), 2);
/// assert_eq!(map.get(0x450), 3);
/// assert_eq!(map.get(0x10000), 0);
/// ```
#[derive(Clone, Debug)]
pub struct CharMap<T> {
    low: Vec<T>,
    high: Vec<(u32, u32, T)>,
    default: T,
}

impl<T: Copy> CharMap<T> {
    /// Create a map sending every character to `default`.
    pub fn new(default: T) -> CharMap<T> {
        CharMap {
            low: vec![default; LOW_SIZE],
            high: vec![],
            default,
        }
    }

    pub fn get(&self, c: u32) -> T {
        if let Some(v) = self.low.get(c as usize) {
            return *v;
        }
        let i = self.high.partition_point(|&(_, hi, _)| hi < c);
        match self.high.get(i) {
            Some(&(lo, _, value)) if lo <= c => value,
            _ => self.default,
        }
    }

    pub fn set_char(&mut self, c: u32, value: T) {
        self.set_range(c, c, value)
    }

    /// Set the value of every character in `lo..=hi`.
    pub fn set_range(&mut self, lo: u32, hi: u32, value: T) {
        if lo > hi {
            return;
        }
        let low_top = (LOW_SIZE - 1) as u32;
        if lo <= low_top {
            for v in &mut self.low[lo as usize..=(hi.min(low_top) as usize)] {
                *v = value;
            }
            if hi <= low_top {
                return;
            }
        }
        self.set_high(lo.max(LOW_SIZE as u32), hi, value);
    }

    fn set_high(&mut self, lo: u32, hi: u32, value: T) {
        let mut ranges = Vec::with_capacity(self.high.len() + 2);
        let mut inserted = false;
        for &(start, end, old) in &self.high {
            if end < lo {
                ranges.push((start, end, old));
                continue;
            }
            if start > hi {
                if !inserted {
                    ranges.push((lo, hi, value));
                    inserted = true;
                }
                ranges.push((start, end, old));
                continue;
            }
            if start < lo {
                ranges.push((start, lo - 1, old));
            }
            if !inserted {
                ranges.push((lo, hi, value));
                inserted = true;
            }
            if end > hi {
                ranges.push((hi + 1, end, old));
            }
        }
        if !inserted {
            ranges.push((lo, hi, value));
        }
        self.high = ranges;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_everywhere() {
        let map = CharMap::new(7_u16);
        for c in [0, 100, 255, 256, 0x10FFFF, u32::MAX] {
            assert_eq!(map.get(c), 7);
        }
    }

    #[test]
    fn range_crossing_the_direct_table() {
        let mut map = CharMap::new(0_u16);
        map.set_range(250, 260, 4);
        assert_eq!(map.get(249), 0);
        assert_eq!(map.get(250), 4);
        assert_eq!(map.get(255), 4);
        assert_eq!(map.get(256), 4);
        assert_eq!(map.get(260), 4);
        assert_eq!(map.get(261), 0);
    }

    #[test]
    fn overwrite_splits_existing_ranges() {
        let mut map = CharMap::new(0_u16);
        map.set_range(1000, 2000, 1);
        map.set_range(1500, 1600, 2);
        map.set_range(900, 1100, 3);
        assert_eq!(map.get(899), 0);
        assert_eq!(map.get(1000), 3);
        assert_eq!(map.get(1101), 1);
        assert_eq!(map.get(1499), 1);
        assert_eq!(map.get(1550), 2);
        assert_eq!(map.get(1601), 1);
        assert_eq!(map.get(2000), 1);
        assert_eq!(map.get(2001), 0);
    }
}
