use std::fmt;

/// Cumulative heap counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeapStats {
  /// Successful allocations.
  pub mallocs: usize,
  /// Non-null frees.
  pub frees: usize,
  /// Allocations served from an existing free block.
  pub reuses: usize,
  /// Allocations that extended the arena.
  pub grows: usize,
  pub splits: usize,
  pub coalesces: usize,
  /// Blocks currently in the directory, used and free.
  pub blocks: usize,
  /// Raw bytes asked for across every allocate call.
  pub requested: usize,
  /// Payload bytes obtained by growing the arena.
  pub max_heap: usize,
}

impl fmt::Display for HeapStats {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    writeln!(f, "heap management statistics")?;
    writeln!(f, "mallocs:\t{}", self.mallocs)?;
    writeln!(f, "frees:\t\t{}", self.frees)?;
    writeln!(f, "reuses:\t\t{}", self.reuses)?;
    writeln!(f, "grows:\t\t{}", self.grows)?;
    writeln!(f, "splits:\t\t{}", self.splits)?;
    writeln!(f, "coalesces:\t{}", self.coalesces)?;
    writeln!(f, "blocks:\t\t{}", self.blocks)?;
    writeln!(f, "requested:\t{}", self.requested)?;
    writeln!(f, "max heap:\t{}", self.max_heap)
  }
}
