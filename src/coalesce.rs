use log::debug;

use crate::{
  arena::Arena,
  block::{Block, HEADER_SIZE},
  directory::Directory,
};

impl<A: Arena> Directory<A> {
  /// Merges every run of address-adjacent free blocks into its first block
  /// in one forward pass, and returns the number of merges.
  ///
  /// A `cursor` naming a block that gets folded into its predecessor is
  /// moved to the merged block.
  pub fn coalesce(
    &mut self,
    cursor: &mut Option<usize>,
  ) -> usize {
    let mut merges = 0;
    let Some(mut current) = self.head() else {
      return 0;
    };

    loop {
      let block = self.block(current);
      let Some(next_offset) = block.next else {
        break;
      };
      let next = self.block(next_offset);

      if block.is_free && next.is_free {
        let merged = Block::new(block.size + next.size + HEADER_SIZE, true, next.next);
        self.set_block(current, &merged);

        if *cursor == Some(next_offset) {
          *cursor = Some(current);
        }

        debug!(
          "coalesced {:#x} into {:#x}, now {} bytes",
          next_offset, current, merged.size
        );
        merges += 1;
      } else {
        current = next_offset;
      }
    }

    merges
  }
}
