/// Bytes occupied by an encoded header: size, next, free flag, padding.
pub const HEADER_SIZE: usize = 24;

const SIZE_FIELD: usize = 0;
const NEXT_FIELD: usize = 8;
const FREE_FIELD: usize = 16;
const NIL: u64 = u64::MAX;

/// Decoded block header.
///
/// `size` counts payload bytes only. `next` is the header offset of the
/// address-following block, `None` for the last block of the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
  pub size: usize,
  pub is_free: bool,
  pub next: Option<usize>,
}

impl Block {
  pub fn new(
    size: usize,
    is_free: bool,
    next: Option<usize>,
  ) -> Self {
    Self { size, is_free, next }
  }

  /// Offset one past the last payload byte of a block whose header sits at
  /// `offset`.
  pub fn end(
    &self,
    offset: usize,
  ) -> usize {
    offset + HEADER_SIZE + self.size
  }

  /// Decodes the header stored at `offset`.
  ///
  /// # Panics
  ///
  /// If `offset + HEADER_SIZE` is past the end of `bytes`.
  pub(crate) fn read(
    bytes: &[u8],
    offset: usize,
  ) -> Self {
    let header = &bytes[offset..offset + HEADER_SIZE];
    let size = u64::from_le_bytes(field(header, SIZE_FIELD));
    let next = u64::from_le_bytes(field(header, NEXT_FIELD));

    Self {
      size: size as usize,
      is_free: header[FREE_FIELD] != 0,
      next: (next != NIL).then_some(next as usize),
    }
  }

  /// Encodes this header at `offset`.
  pub(crate) fn write(
    &self,
    bytes: &mut [u8],
    offset: usize,
  ) {
    let header = &mut bytes[offset..offset + HEADER_SIZE];
    let next = self.next.map_or(NIL, |next| next as u64);

    header[SIZE_FIELD..SIZE_FIELD + 8].copy_from_slice(&(self.size as u64).to_le_bytes());
    header[NEXT_FIELD..NEXT_FIELD + 8].copy_from_slice(&next.to_le_bytes());
    header[FREE_FIELD] = self.is_free as u8;
    header[FREE_FIELD + 1..].fill(0);
  }
}

fn field(
  header: &[u8],
  at: usize,
) -> [u8; 8] {
  let mut raw = [0u8; 8];
  raw.copy_from_slice(&header[at..at + 8]);
  raw
}
