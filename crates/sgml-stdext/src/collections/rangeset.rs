//! Sets of character numbers stored as ranges.
//!
//! See the documentation on the [RangeSet] type.

/// An ordered set of `u32` values stored as disjoint closed ranges.
///
/// Character classes in a concrete syntax are usually a handful of large
///     ranges (all letters, all digits, everything above 160), so storing
///     ranges rather than members keeps the set operations cheap.
/// The ranges are kept sorted and coalesced: two stored ranges never overlap
///     or touch.
///
/// ```
/// # use sgml_stdext::collections::rangeset::RangeSet;
/// let mut letters = RangeSet::new();
/// letters.add_range('a' as u32, 'z' as u32);
/// letters.add_range('A' as u32, 'Z' as u32);
/// let vowels: RangeSet = "aeiou".chars().map(|c| c as u32).collect();
/// assert!(vowels.is_subset(&letters));
/// assert_eq!(letters.difference(&vowels).len(), 47);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RangeSet {
    ranges: Vec<(u32, u32)>,
}

impl RangeSet {
    pub fn new() -> RangeSet {
        Default::default()
    }

    /// Create a set containing a single value.
    pub fn singleton(c: u32) -> RangeSet {
        RangeSet {
            ranges: vec![(c, c)],
        }
    }

    /// Create a set from possibly overlapping, unordered ranges.
    pub fn from_ranges<I: IntoIterator<Item = (u32, u32)>>(ranges: I) -> RangeSet {
        let mut set = RangeSet::new();
        for (lo, hi) in ranges {
            set.add_range(lo, hi);
        }
        set
    }

    pub fn add(&mut self, c: u32) {
        self.add_range(c, c)
    }

    /// Add every value in `lo..=hi`. Does nothing if `lo > hi`.
    pub fn add_range(&mut self, lo: u32, hi: u32) {
        if lo > hi {
            return;
        }
        // Ranges in [first, last) overlap or touch the new range.
        let first = self
            .ranges
            .partition_point(|&(_, end)| end.saturating_add(1) < lo);
        let last = self
            .ranges
            .partition_point(|&(start, _)| start <= hi.saturating_add(1));
        if first >= last {
            self.ranges.insert(first, (lo, hi));
            return;
        }
        let merged = (lo.min(self.ranges[first].0), hi.max(self.ranges[last - 1].1));
        self.ranges.splice(first..last, std::iter::once(merged));
    }

    pub fn contains(&self, c: u32) -> bool {
        let i = self.ranges.partition_point(|&(_, end)| end < c);
        match self.ranges.get(i) {
            None => false,
            Some(&(start, _)) => start <= c,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Number of values in the set.
    pub fn len(&self) -> u64 {
        self.ranges
            .iter()
            .map(|&(lo, hi)| (hi - lo) as u64 + 1)
            .sum()
    }

    /// The smallest value in the set.
    pub fn min(&self) -> Option<u32> {
        self.ranges.first().map(|&(lo, _)| lo)
    }

    /// The stored ranges, sorted and disjoint.
    pub fn ranges(&self) -> &[(u32, u32)] {
        &self.ranges
    }

    /// Iterate over every value in the set in increasing order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.ranges.iter().flat_map(|&(lo, hi)| lo..=hi)
    }

    pub fn union(&self, other: &RangeSet) -> RangeSet {
        let mut result = self.clone();
        for &(lo, hi) in &other.ranges {
            result.add_range(lo, hi);
        }
        result
    }

    pub fn intersection(&self, other: &RangeSet) -> RangeSet {
        let mut ranges = vec![];
        let (mut i, mut j) = (0_usize, 0_usize);
        while i < self.ranges.len() && j < other.ranges.len() {
            let (a_lo, a_hi) = self.ranges[i];
            let (b_lo, b_hi) = other.ranges[j];
            let lo = a_lo.max(b_lo);
            let hi = a_hi.min(b_hi);
            if lo <= hi {
                ranges.push((lo, hi));
            }
            if a_hi < b_hi {
                i += 1;
            } else {
                j += 1;
            }
        }
        RangeSet { ranges }
    }

    pub fn difference(&self, other: &RangeSet) -> RangeSet {
        let mut ranges = vec![];
        let mut j = 0_usize;
        for &(lo, hi) in &self.ranges {
            let mut lo = lo;
            while j < other.ranges.len() && other.ranges[j].1 < lo {
                j += 1;
            }
            let mut k = j;
            let mut exhausted = false;
            while k < other.ranges.len() && other.ranges[k].0 <= hi {
                let (b_lo, b_hi) = other.ranges[k];
                if b_lo > lo {
                    ranges.push((lo, b_lo - 1));
                }
                if b_hi >= hi {
                    exhausted = true;
                    break;
                }
                lo = b_hi + 1;
                k += 1;
            }
            if !exhausted {
                ranges.push((lo, hi));
            }
        }
        RangeSet { ranges }
    }

    pub fn is_subset(&self, other: &RangeSet) -> bool {
        self.difference(other).is_empty()
    }

    pub fn intersects(&self, other: &RangeSet) -> bool {
        !self.intersection(other).is_empty()
    }
}

impl FromIterator<u32> for RangeSet {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        let mut set = RangeSet::new();
        for c in iter {
            set.add(c);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_coalesces_touching_ranges() {
        let mut set = RangeSet::new();
        set.add_range(10, 20);
        set.add_range(30, 40);
        set.add_range(21, 29);
        assert_eq!(set.ranges(), &[(10, 40)]);
    }

    #[test]
    fn add_keeps_gaps() {
        let mut set = RangeSet::new();
        set.add(5);
        set.add(1);
        set.add(3);
        set.add(2);
        assert_eq!(set.ranges(), &[(1, 3), (5, 5)]);
        assert!(set.contains(2));
        assert!(!set.contains(4));
        assert!(!set.contains(6));
        assert!(!set.contains(0));
    }

    #[test]
    fn add_at_the_top_of_the_range() {
        let mut set = RangeSet::new();
        set.add_range(u32::MAX - 1, u32::MAX);
        set.add(u32::MAX - 2);
        assert_eq!(set.ranges(), &[(u32::MAX - 2, u32::MAX)]);
    }

    #[test]
    fn empty_range_is_ignored() {
        let mut set = RangeSet::new();
        set.add_range(5, 4);
        assert!(set.is_empty());
    }

    #[test]
    fn intersection() {
        let a = RangeSet::from_ranges([(0, 10), (20, 30)]);
        let b = RangeSet::from_ranges([(5, 25), (28, 28)]);
        assert_eq!(a.intersection(&b).ranges(), &[(5, 10), (20, 25), (28, 28)]);
    }

    #[test]
    fn difference() {
        let a = RangeSet::from_ranges([(0, 10), (20, 30)]);
        let b = RangeSet::from_ranges([(5, 6), (10, 22), (30, 40)]);
        assert_eq!(a.difference(&b).ranges(), &[(0, 4), (7, 9), (23, 29)]);
        assert_eq!(b.difference(&a).ranges(), &[(11, 19), (31, 40)]);
        assert!(a.difference(&a).is_empty());
    }

    #[test]
    fn subset_and_len() {
        let a = RangeSet::from_ranges([(0, 9)]);
        let b = RangeSet::from_ranges([(2, 3), (7, 7)]);
        assert!(b.is_subset(&a));
        assert!(!a.is_subset(&b));
        assert_eq!(a.len(), 10);
        assert_eq!(b.iter().collect::<Vec<_>>(), vec![2, 3, 7]);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_round_trip() {
        let a = RangeSet::from_ranges([(0, 9), (65, 90)]);
        let s = serde_json::to_string(&a).unwrap();
        let b: RangeSet = serde_json::from_str(&s).unwrap();
        assert_eq!(a, b);
    }
}
