use log::{debug, warn};

use crate::{
  align::checked_align,
  arena::{Arena, VecArena},
  block::{Block, HEADER_SIZE},
  config::HeapConfig,
  directory::Directory,
  error::HeapError,
  fit::FitPolicy,
  stats::HeapStats,
};

/// Arena-relative address of a block payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ptr(usize);

impl Ptr {
  fn from_block(offset: usize) -> Self {
    Self(offset + HEADER_SIZE)
  }

  /// Offset of the first payload byte from the start of the arena.
  pub fn offset(self) -> usize {
    self.0
  }
}

/// Free-list heap over a growable arena.
///
/// The heap owns its arena and all of its bookkeeping, so independent heaps
/// never share state. It is not synchronized; wrap it in a lock to share it.
pub struct Heap<A: Arena = VecArena> {
  directory: Directory<A>,
  policy: FitPolicy,
  min_split_payload: usize,
  /// Most recently allocated block, where next fit resumes.
  cursor: Option<usize>,
  stats: HeapStats,
  report_on_drop: bool,
}

impl Heap<VecArena> {
  pub fn new(policy: FitPolicy) -> Self {
    Self::from_config(&HeapConfig::with_policy(policy))
  }

  pub fn from_config(config: &HeapConfig) -> Self {
    let arena = match config.arena_limit {
      Some(limit) => VecArena::with_limit(limit),
      None => VecArena::new(),
    };
    Self::with_arena(arena, config)
  }
}

impl<A: Arena> Heap<A> {
  /// Builds a heap over `arena`.
  ///
  /// # Panics
  ///
  /// If `arena` already holds bytes. The first block must start at offset
  /// zero.
  pub fn with_arena(
    arena: A,
    config: &HeapConfig,
  ) -> Self {
    assert!(
      arena.is_empty(),
      "heap arena must be empty, found {} bytes",
      arena.len()
    );
    Self {
      directory: Directory::new(arena),
      policy: config.policy,
      min_split_payload: config.min_split_payload,
      cursor: None,
      stats: HeapStats::default(),
      report_on_drop: config.report_on_drop,
    }
  }

  /// Allocates at least `size` bytes.
  ///
  /// Returns `None` for a zero-byte request or when no free block fits and
  /// the arena cannot grow. A failed allocation leaves the directory as it
  /// was.
  pub fn allocate(
    &mut self,
    size: usize,
  ) -> Option<Ptr> {
    self.stats.requested = self.stats.requested.saturating_add(size);

    if size == 0 {
      return None;
    }
    let size = checked_align(size)?;

    let selection = self.policy.select(&self.directory, size, self.cursor);

    let offset = match selection.candidate {
      Some(offset) => {
        if self.directory.split(offset, size, self.min_split_payload) {
          self.stats.splits += 1;
          self.stats.blocks += 1;
        }
        self.stats.reuses += 1;
        offset
      }
      None => match self.directory.grow(selection.preceding, size) {
        Ok(offset) => {
          self.stats.grows += 1;
          self.stats.blocks += 1;
          self.stats.max_heap += size;
          offset
        }
        Err(err) => {
          warn!("allocation of {} bytes failed: {}", size, err);
          return None;
        }
      },
    };

    self.directory.set_free(offset, false);
    self.stats.mallocs += 1;
    self.cursor = Some(offset);

    Some(Ptr::from_block(offset))
  }

  /// Returns a block to the heap and merges it with free neighbours.
  ///
  /// `None` is ignored.
  ///
  /// # Panics
  ///
  /// If `ptr` is already free or was not handed out by this heap.
  pub fn free(
    &mut self,
    ptr: Option<Ptr>,
  ) {
    let Some(ptr) = ptr else {
      return;
    };

    if let Err(err) = self.try_free(ptr) {
      panic!("free: {err}");
    }
  }

  /// Like [`Heap::free`] but reports a misused pointer instead of
  /// panicking. Nothing changes when an error is returned.
  pub fn try_free(
    &mut self,
    ptr: Ptr,
  ) -> Result<(), HeapError> {
    let offset = self.block_of(ptr)?;

    if self.directory.block(offset).is_free {
      return Err(HeapError::DoubleFree { offset });
    }

    self.directory.set_free(offset, true);
    self.stats.frees += 1;

    let merges = self.directory.coalesce(&mut self.cursor);
    self.stats.coalesces += merges;
    self.stats.blocks -= merges;

    Ok(())
  }

  /// Allocates a zeroed region for `count` elements of `element_size`
  /// bytes. Returns `None` when the total size overflows.
  pub fn zero_allocate(
    &mut self,
    count: usize,
    element_size: usize,
  ) -> Option<Ptr> {
    let Some(total) = count.checked_mul(element_size) else {
      debug!("zero_allocate: {} * {} overflows", count, element_size);
      return None;
    };

    let ptr = self.allocate(total)?;
    self.payload_mut(ptr).fill(0);
    Some(ptr)
  }

  /// Moves the contents of `ptr` into a new block of `new_size` bytes.
  ///
  /// A `None` pointer behaves like [`Heap::allocate`] and a zero size like
  /// [`Heap::free`]. When the new block cannot be allocated, `None` is
  /// returned and `ptr` stays valid and owned by the caller.
  ///
  /// # Panics
  ///
  /// If `ptr` is not a live allocation of this heap.
  pub fn reallocate(
    &mut self,
    ptr: Option<Ptr>,
    new_size: usize,
  ) -> Option<Ptr> {
    let Some(old) = ptr else {
      return self.allocate(new_size);
    };

    if new_size == 0 {
      self.free(Some(old));
      return None;
    }

    let old_offset = self.live_block_of(old);
    let new = self.allocate(new_size)?;
    let new_offset = new.offset() - HEADER_SIZE;

    let len = self
      .directory
      .block(old_offset)
      .size
      .min(self.directory.block(new_offset).size);
    self.directory.copy_payload(old_offset, new_offset, len);

    self.free(Some(old));
    Some(new)
  }

  /// The payload of a live block. Its length is the recorded, aligned size.
  ///
  /// # Panics
  ///
  /// If `ptr` is not a live allocation of this heap.
  pub fn payload(
    &self,
    ptr: Ptr,
  ) -> &[u8] {
    let offset = self.live_block_of(ptr);
    self.directory.payload(offset)
  }

  /// Mutable view of the payload of a live block.
  ///
  /// # Panics
  ///
  /// If `ptr` is not a live allocation of this heap.
  pub fn payload_mut(
    &mut self,
    ptr: Ptr,
  ) -> &mut [u8] {
    let offset = self.live_block_of(ptr);
    self.directory.payload_mut(offset)
  }

  /// Recorded payload size of the live block behind `ptr`, or `None` when
  /// `ptr` is free or not a block of this heap.
  pub fn usable_size(
    &self,
    ptr: Ptr,
  ) -> Option<usize> {
    let offset = self.block_of(ptr).ok()?;
    let block = self.directory.block(offset);
    (!block.is_free).then_some(block.size)
  }

  /// All blocks in address order as `(header offset, block)` pairs.
  pub fn blocks(&self) -> impl Iterator<Item = (usize, Block)> + '_ {
    self.directory.iter()
  }

  /// Total payload bytes held by free blocks.
  pub fn free_bytes(&self) -> usize {
    self
      .blocks()
      .filter(|(_, block)| block.is_free)
      .map(|(_, block)| block.size)
      .sum()
  }

  pub fn arena_len(&self) -> usize {
    self.directory.arena().len()
  }

  pub fn arena(&self) -> &A {
    self.directory.arena()
  }

  pub fn policy(&self) -> FitPolicy {
    self.policy
  }

  pub fn stats(&self) -> &HeapStats {
    &self.stats
  }

  /// Checks that the blocks tile the arena and that no two neighbours are
  /// both free.
  pub fn verify(&self) -> Result<(), HeapError> {
    self.directory.verify()
  }

  fn block_of(
    &self,
    ptr: Ptr,
  ) -> Result<usize, HeapError> {
    self
      .directory
      .find(ptr.offset())
      .ok_or(HeapError::InvalidPointer {
        offset: ptr.offset(),
      })
  }

  fn live_block_of(
    &self,
    ptr: Ptr,
  ) -> usize {
    match self.block_of(ptr) {
      Ok(offset) if !self.directory.block(offset).is_free => offset,
      Ok(offset) => panic!("use of freed block at offset {offset:#x}"),
      Err(err) => panic!("{err}"),
    }
  }
}

impl<A: Arena> Drop for Heap<A> {
  fn drop(&mut self) {
    if self.report_on_drop {
      print!("\n{}", self.stats);
    }
  }
}
