//! Arena growth primitives.
//!
//! An [`Arena`] is one contiguous byte region that only ever grows at its
//! high end. Offsets handed out by [`Arena::grow`] stay valid for the life
//! of the arena.

use crate::error::GrowError;

pub trait Arena {
  /// Extends the arena by `increment` bytes and returns the offset at which
  /// the new region starts, which is always the previous [`Arena::len`].
  ///
  /// On failure the arena is left unchanged.
  fn grow(
    &mut self,
    increment: usize,
  ) -> Result<usize, GrowError>;

  fn len(&self) -> usize;

  fn is_empty(&self) -> bool {
    self.len() == 0
  }

  fn bytes(&self) -> &[u8];

  fn bytes_mut(&mut self) -> &mut [u8];
}

/// Arena backed by an owned, zero-initialized buffer.
#[derive(Debug, Default)]
pub struct VecArena {
  buf: Vec<u8>,
  limit: Option<usize>,
}

impl VecArena {
  pub fn new() -> Self {
    Self::default()
  }

  /// An arena that refuses to grow past `limit` bytes in total.
  pub fn with_limit(limit: usize) -> Self {
    Self {
      buf: Vec::new(),
      limit: Some(limit),
    }
  }

  pub fn limit(&self) -> Option<usize> {
    self.limit
  }
}

impl Arena for VecArena {
  fn grow(
    &mut self,
    increment: usize,
  ) -> Result<usize, GrowError> {
    let base = self.buf.len();
    let new_len = base
      .checked_add(increment)
      .ok_or(GrowError::Overflow { requested: increment })?;

    if let Some(limit) = self.limit {
      if new_len > limit {
        return Err(GrowError::LimitExceeded {
          requested: increment,
          limit,
        });
      }
    }

    self
      .buf
      .try_reserve_exact(increment)
      .map_err(|_| GrowError::Exhausted { requested: increment })?;
    self.buf.resize(new_len, 0);

    Ok(base)
  }

  fn len(&self) -> usize {
    self.buf.len()
  }

  fn bytes(&self) -> &[u8] {
    &self.buf
  }

  fn bytes_mut(&mut self) -> &mut [u8] {
    &mut self.buf
  }
}

#[cfg(unix)]
pub use self::sbrk::SbrkArena;

#[cfg(unix)]
mod sbrk {
  use std::{ptr, slice};

  use libc::{c_void, intptr_t, sbrk};

  use super::Arena;
  use crate::error::GrowError;

  /// Arena carved out of the process data segment with `sbrk(2)`.
  ///
  /// Each growth must start exactly where the previous one ended. If
  /// anything else in the process moved the program break in between, the
  /// growth fails with [`GrowError::NonContiguous`]. Memory is never handed
  /// back to the system.
  ///
  /// Only one `SbrkArena` should be active per process.
  pub struct SbrkArena {
    base: *mut u8,
    len: usize,
  }

  impl SbrkArena {
    pub fn new() -> Self {
      Self {
        base: ptr::null_mut(),
        len: 0,
      }
    }

    /// Address of the first arena byte, null until the first growth.
    pub fn base(&self) -> *const u8 {
      self.base
    }
  }

  impl Default for SbrkArena {
    fn default() -> Self {
      Self::new()
    }
  }

  impl Arena for SbrkArena {
    fn grow(
      &mut self,
      increment: usize,
    ) -> Result<usize, GrowError> {
      let delta =
        intptr_t::try_from(increment).map_err(|_| GrowError::Overflow { requested: increment })?;

      unsafe {
        let brk = sbrk(0) as *mut u8;
        if brk == usize::MAX as *mut u8 {
          return Err(GrowError::Exhausted { requested: increment });
        }
        if !self.base.is_null() && brk != self.base.add(self.len) {
          return Err(GrowError::NonContiguous);
        }

        let previous = sbrk(delta);
        if previous == usize::MAX as *mut c_void {
          return Err(GrowError::Exhausted { requested: increment });
        }
        if previous as *mut u8 != brk {
          return Err(GrowError::NonContiguous);
        }

        if self.base.is_null() {
          self.base = brk;
        }
      }

      let base = self.len;
      self.len += increment;
      Ok(base)
    }

    fn len(&self) -> usize {
      self.len
    }

    fn bytes(&self) -> &[u8] {
      if self.len == 0 {
        return &[];
      }
      unsafe { slice::from_raw_parts(self.base, self.len) }
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
      if self.len == 0 {
        return &mut [];
      }
      unsafe { slice::from_raw_parts_mut(self.base, self.len) }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_vec_arena_grows_at_high_end() {
    let mut arena = VecArena::new();
    assert!(arena.is_empty());

    assert_eq!(arena.grow(32), Ok(0));
    assert_eq!(arena.grow(8), Ok(32));
    assert_eq!(arena.len(), 40);
    assert!(arena.bytes().iter().all(|&b| b == 0));
  }

  #[test]
  fn test_vec_arena_limit() {
    let mut arena = VecArena::with_limit(64);
    assert_eq!(arena.limit(), Some(64));
    assert_eq!(VecArena::new().limit(), None);

    assert_eq!(arena.grow(48), Ok(0));
    assert_eq!(
      arena.grow(24),
      Err(GrowError::LimitExceeded {
        requested: 24,
        limit: 64,
      })
    );
    // A failed growth leaves the arena as it was.
    assert_eq!(arena.len(), 48);
    assert_eq!(arena.grow(16), Ok(48));
  }

  #[test]
  fn test_vec_arena_overflow() {
    let mut arena = VecArena::new();
    arena.grow(8).unwrap();

    assert_eq!(
      arena.grow(usize::MAX),
      Err(GrowError::Overflow {
        requested: usize::MAX
      })
    );
  }

  #[cfg(unix)]
  #[test]
  fn test_sbrk_arena() {
    let mut arena = SbrkArena::new();

    match arena.grow(64) {
      Ok(base) => {
        assert_eq!(base, 0);
        assert!(!arena.base().is_null());

        arena.bytes_mut().fill(0x5A);
        assert_eq!(arena.bytes().len(), 64);
        assert!(arena.bytes().iter().all(|&b| b == 0x5A));
      }
      // Another thread of the test harness moved the break concurrently.
      Err(err) => assert_eq!(err, GrowError::NonContiguous),
    }
  }
}
