use log::debug;

use crate::{
  arena::Arena,
  block::{Block, HEADER_SIZE},
  directory::Directory,
};

/// Whether carving `size` bytes out of a `block_size` byte block leaves a
/// remainder able to hold a header plus `min_payload` bytes.
pub fn is_profitable(
  block_size: usize,
  size: usize,
  min_payload: usize,
) -> bool {
  block_size
    .checked_sub(size)
    .zip(HEADER_SIZE.checked_add(min_payload))
    .is_some_and(|(leftover, needed)| leftover >= needed)
}

impl<A: Arena> Directory<A> {
  /// Shrinks the block at `offset` to exactly `size` bytes and turns the
  /// rest into a free block linked right after it.
  ///
  /// Returns `false`, leaving the block whole, when the remainder would be
  /// smaller than a header plus `min_payload` bytes.
  pub fn split(
    &mut self,
    offset: usize,
    size: usize,
    min_payload: usize,
  ) -> bool {
    let block = self.block(offset);
    if !is_profitable(block.size, size, min_payload) {
      return false;
    }

    let remainder_offset = offset + HEADER_SIZE + size;
    let remainder = Block::new(block.size - size - HEADER_SIZE, true, block.next);

    self.set_block(remainder_offset, &remainder);
    self.set_block(offset, &Block::new(size, block.is_free, Some(remainder_offset)));

    debug!(
      "split block at {:#x}: {} -> {} + {} free at {:#x}",
      offset, block.size, size, remainder.size, remainder_offset
    );

    true
  }
}
