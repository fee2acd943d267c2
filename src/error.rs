use thiserror::Error;

/// Failure to extend the arena.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GrowError {
  #[error("environment refused to extend the arena by {requested} bytes")]
  Exhausted { requested: usize },

  #[error("arena limit exceeded: requested {requested} more bytes, limit {limit} bytes")]
  LimitExceeded { requested: usize, limit: usize },

  #[error("arena extension is not contiguous with the previous region")]
  NonContiguous,

  #[error("size arithmetic overflowed for a {requested} byte request")]
  Overflow { requested: usize },
}

/// Caller contract violations and directory corruption.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HeapError {
  #[error("double free of block at offset {offset:#x}")]
  DoubleFree { offset: usize },

  #[error("pointer {offset:#x} does not name a block payload in this arena")]
  InvalidPointer { offset: usize },

  #[error("directory corrupted at offset {offset:#x}: {reason}")]
  Corrupted { offset: usize, reason: &'static str },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
  #[error("unknown fit policy: {0:?}")]
  UnknownPolicy(String),

  #[error("invalid value for {key}: {value:?}")]
  InvalidValue { key: &'static str, value: String },
}
