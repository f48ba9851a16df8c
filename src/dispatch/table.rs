//! Size-keyed routing table built by calibration.

use crate::util::{NmsError, NmsResult};

/// One calibration breakpoint: inputs of at least `size` boxes go to
/// `strategy` until the next breakpoint takes over.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Breakpoint {
    /// Lower bound of the size interval served by this entry.
    pub size: usize,
    /// Index of the winning strategy in the dispatcher's strategy list.
    pub strategy: usize,
}

/// Immutable mapping from input size to strategy index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoutingTable {
    breakpoints: Vec<Breakpoint>,
}

impl RoutingTable {
    /// Builds a table from `(size, strategy)` pairs.
    ///
    /// Sizes must be strictly increasing and the list must not be empty.
    pub fn from_breakpoints(pairs: Vec<(usize, usize)>) -> NmsResult<Self> {
        if pairs.is_empty() {
            return Err(NmsError::InvalidInput("routing table needs a breakpoint"));
        }
        if pairs.windows(2).any(|w| w[0].0 >= w[1].0) {
            return Err(NmsError::InvalidInput(
                "routing breakpoints must be strictly increasing",
            ));
        }
        let breakpoints = pairs
            .into_iter()
            .map(|(size, strategy)| Breakpoint { size, strategy })
            .collect();
        Ok(Self { breakpoints })
    }

    /// Returns the breakpoints in ascending size order.
    pub fn breakpoints(&self) -> &[Breakpoint] {
        &self.breakpoints
    }

    /// Returns the number of breakpoints.
    pub fn len(&self) -> usize {
        self.breakpoints.len()
    }

    /// Always `false`; a table holds at least one breakpoint.
    pub fn is_empty(&self) -> bool {
        self.breakpoints.is_empty()
    }

    /// Returns the strategy index serving inputs of `size` boxes.
    ///
    /// Sizes below the first breakpoint use the first entry and sizes at or
    /// above the last breakpoint use the last; anything else uses the entry
    /// whose `[size, next.size)` interval contains it.
    pub fn lookup(&self, size: usize) -> usize {
        // Number of breakpoints with `bp.size <= size`.
        let idx = self.breakpoints.partition_point(|bp| bp.size <= size);
        let entry = idx.saturating_sub(1);
        self.breakpoints[entry].strategy
    }

    /// Collapses runs of equal winners into `(first_size, strategy)` ranges.
    pub fn ranges(&self) -> Vec<(usize, usize)> {
        let mut out: Vec<(usize, usize)> = Vec::new();
        for bp in &self.breakpoints {
            match out.last() {
                Some(&(_, strategy)) if strategy == bp.strategy => {}
                _ => out.push((bp.size, bp.strategy)),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::RoutingTable;
    use crate::NmsError;

    fn table() -> RoutingTable {
        RoutingTable::from_breakpoints(vec![(10, 0), (20, 1), (30, 0), (40, 2)]).unwrap()
    }

    #[test]
    fn below_first_breakpoint_uses_first_entry() {
        assert_eq!(table().lookup(0), 0);
        assert_eq!(table().lookup(9), 0);
    }

    #[test]
    fn at_or_above_last_breakpoint_uses_last_entry() {
        assert_eq!(table().lookup(40), 2);
        assert_eq!(table().lookup(1000), 2);
    }

    #[test]
    fn interior_sizes_use_containing_interval() {
        let t = table();
        assert_eq!(t.lookup(10), 0);
        assert_eq!(t.lookup(19), 0);
        assert_eq!(t.lookup(20), 1);
        assert_eq!(t.lookup(29), 1);
        assert_eq!(t.lookup(30), 0);
        assert_eq!(t.lookup(39), 0);
    }

    #[test]
    fn ranges_merge_equal_neighbours() {
        let t = RoutingTable::from_breakpoints(vec![(1, 0), (2, 0), (3, 1), (4, 1), (5, 0)])
            .unwrap();
        assert_eq!(t.ranges(), vec![(1, 0), (3, 1), (5, 0)]);
    }

    #[test]
    fn rejects_unsorted_or_empty_tables() {
        assert_eq!(
            RoutingTable::from_breakpoints(Vec::new()).unwrap_err(),
            NmsError::InvalidInput("routing table needs a breakpoint")
        );
        assert!(RoutingTable::from_breakpoints(vec![(5, 0), (5, 1)]).is_err());
    }
}
