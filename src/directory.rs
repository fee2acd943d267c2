//! The block directory: every block of the arena, used and free, linked in
//! ascending address order through the headers stored in the arena itself.

use log::debug;

use crate::{
  align::ALIGNMENT,
  arena::Arena,
  block::{Block, HEADER_SIZE},
  error::{GrowError, HeapError},
};

pub struct Directory<A: Arena> {
  arena: A,
  head: Option<usize>,
}

impl<A: Arena> Directory<A> {
  pub fn new(arena: A) -> Self {
    Self { arena, head: None }
  }

  pub fn head(&self) -> Option<usize> {
    self.head
  }

  pub fn arena(&self) -> &A {
    &self.arena
  }

  pub fn block(
    &self,
    offset: usize,
  ) -> Block {
    Block::read(self.arena.bytes(), offset)
  }

  pub fn set_block(
    &mut self,
    offset: usize,
    block: &Block,
  ) {
    block.write(self.arena.bytes_mut(), offset);
  }

  pub fn set_free(
    &mut self,
    offset: usize,
    is_free: bool,
  ) {
    let mut block = self.block(offset);
    block.is_free = is_free;
    self.set_block(offset, &block);
  }

  /// Walks the directory from the head in address order.
  pub fn iter(&self) -> Blocks<'_, A> {
    self.iter_from(self.head)
  }

  /// Walks the directory starting at the block whose header is at `start`.
  pub fn iter_from(
    &self,
    start: Option<usize>,
  ) -> Blocks<'_, A> {
    Blocks {
      directory: self,
      current: start,
    }
  }

  pub fn payload(
    &self,
    offset: usize,
  ) -> &[u8] {
    let block = self.block(offset);
    &self.arena.bytes()[offset + HEADER_SIZE..block.end(offset)]
  }

  pub fn payload_mut(
    &mut self,
    offset: usize,
  ) -> &mut [u8] {
    let block = self.block(offset);
    &mut self.arena.bytes_mut()[offset + HEADER_SIZE..block.end(offset)]
  }

  /// Copies the first `len` payload bytes of the block at `from` into the
  /// block at `to`.
  pub fn copy_payload(
    &mut self,
    from: usize,
    to: usize,
    len: usize,
  ) {
    let src = from + HEADER_SIZE;
    self
      .arena
      .bytes_mut()
      .copy_within(src..src + len, to + HEADER_SIZE);
  }

  /// Appends a new in-use block of `size` payload bytes at the high end of
  /// the arena and links it after `preceding`, which must be the current
  /// last block (or `None` for an empty directory).
  ///
  /// The directory is not touched when the arena refuses to grow.
  pub fn grow(
    &mut self,
    preceding: Option<usize>,
    size: usize,
  ) -> Result<usize, GrowError> {
    let total = HEADER_SIZE
      .checked_add(size)
      .ok_or(GrowError::Overflow { requested: size })?;

    let offset = self.arena.grow(total)?;
    self.set_block(offset, &Block::new(size, false, None));

    match preceding {
      Some(last) if self.head.is_some() => {
        debug_assert_eq!(self.block(last).next, None);
        let mut tail = self.block(last);
        tail.next = Some(offset);
        self.set_block(last, &tail);
      }
      _ => self.head = Some(offset),
    }

    debug!(
      "grew arena by {} bytes, new block at {:#x} ({} bytes)",
      total, offset, size
    );

    Ok(offset)
  }

  /// Returns the header offset of the block whose payload starts at
  /// `payload`, provided such a block exists.
  pub fn find(
    &self,
    payload: usize,
  ) -> Option<usize> {
    let offset = payload.checked_sub(HEADER_SIZE)?;
    self
      .iter()
      .map(|(at, _)| at)
      .take_while(|&at| at <= offset)
      .find(|&at| at == offset)
  }

  /// Checks the structural invariants of the directory.
  ///
  /// Blocks must tile the arena from offset zero to its end with no gap or
  /// overlap, sizes must be aligned, and no two neighbours may both be free.
  pub fn verify(&self) -> Result<(), HeapError> {
    let len = self.arena.len();

    let Some(head) = self.head else {
      if len == 0 {
        return Ok(());
      }
      return Err(HeapError::Corrupted {
        offset: 0,
        reason: "arena has bytes but the directory is empty",
      });
    };

    if head != 0 {
      return Err(HeapError::Corrupted {
        offset: head,
        reason: "first block does not start the arena",
      });
    }

    let mut offset = head;
    let mut previous_free = false;

    // Every block takes at least a header, which bounds the walk.
    for _ in 0..=len / HEADER_SIZE {
      if offset > len || len - offset < HEADER_SIZE {
        return Err(HeapError::Corrupted {
          offset,
          reason: "header runs past the end of the arena",
        });
      }

      let block = self.block(offset);
      let end = (offset + HEADER_SIZE)
        .checked_add(block.size)
        .filter(|&end| end <= len)
        .ok_or(HeapError::Corrupted {
          offset,
          reason: "payload runs past the end of the arena",
        })?;

      if block.size % ALIGNMENT != 0 {
        return Err(HeapError::Corrupted {
          offset,
          reason: "payload size is not aligned",
        });
      }
      if previous_free && block.is_free {
        return Err(HeapError::Corrupted {
          offset,
          reason: "adjacent free blocks were not coalesced",
        });
      }

      match block.next {
        None if end == len => return Ok(()),
        None => {
          return Err(HeapError::Corrupted {
            offset,
            reason: "last block does not reach the end of the arena",
          });
        }
        Some(next) if next != end => {
          return Err(HeapError::Corrupted {
            offset,
            reason: "next block does not start where this payload ends",
          });
        }
        Some(next) => {
          previous_free = block.is_free;
          offset = next;
        }
      }
    }

    Err(HeapError::Corrupted {
      offset,
      reason: "directory does not terminate",
    })
  }
}

/// Address-ordered iterator over `(header offset, block)` pairs.
pub struct Blocks<'a, A: Arena> {
  directory: &'a Directory<A>,
  current: Option<usize>,
}

impl<A: Arena> Iterator for Blocks<'_, A> {
  type Item = (usize, Block);

  fn next(&mut self) -> Option<Self::Item> {
    let offset = self.current?;
    let block = self.directory.block(offset);
    self.current = block.next;
    Some((offset, block))
  }
}
