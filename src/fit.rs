//! Fit policies: which free block satisfies a request.

use std::{fmt, str::FromStr};

use log::trace;

use crate::{arena::Arena, block::Block, directory::Directory, error::ConfigError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FitPolicy {
  /// First free block large enough, scanning from the head.
  #[default]
  FirstFit,
  /// Free block leaving the smallest leftover.
  BestFit,
  /// Free block leaving the largest leftover.
  WorstFit,
  /// Like first fit, but the scan resumes after the last allocated block
  /// and wraps around to the head.
  NextFit,
}

/// Outcome of a directory search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
  /// The block a freshly grown block would be linked after. This is the
  /// last block of the directory whenever `candidate` is `None`.
  pub preceding: Option<usize>,
  pub candidate: Option<usize>,
}

impl Selection {
  fn miss(preceding: Option<usize>) -> Self {
    Self {
      preceding,
      candidate: None,
    }
  }
}

fn fits(
  block: &Block,
  size: usize,
) -> bool {
  block.is_free && block.size >= size
}

impl FitPolicy {
  pub const ALL: [FitPolicy; 4] = [
    FitPolicy::FirstFit,
    FitPolicy::BestFit,
    FitPolicy::WorstFit,
    FitPolicy::NextFit,
  ];

  /// Searches `directory` for a free block of at least `size` bytes.
  ///
  /// `cursor` is the most recently allocated block; only [`FitPolicy::NextFit`]
  /// looks at it.
  pub fn select<A: Arena>(
    self,
    directory: &Directory<A>,
    size: usize,
    cursor: Option<usize>,
  ) -> Selection {
    let selection = match self {
      FitPolicy::FirstFit => first_fit(directory, size),
      FitPolicy::BestFit => ranked_fit(directory, size, |leftover, winner| leftover < winner),
      FitPolicy::WorstFit => ranked_fit(directory, size, |leftover, winner| leftover > winner),
      FitPolicy::NextFit => next_fit(directory, size, cursor),
    };

    trace!(
      "{} for {} bytes -> candidate {:?}, preceding {:?}",
      self, size, selection.candidate, selection.preceding
    );

    selection
  }
}

fn first_fit<A: Arena>(
  directory: &Directory<A>,
  size: usize,
) -> Selection {
  let mut preceding = None;

  for (offset, block) in directory.iter() {
    if fits(&block, size) {
      return Selection {
        preceding,
        candidate: Some(offset),
      };
    }
    preceding = Some(offset);
  }

  Selection::miss(preceding)
}

/// Full scan keeping the first block whose leftover beats the current
/// winner according to `better`.
fn ranked_fit<A: Arena>(
  directory: &Directory<A>,
  size: usize,
  better: impl Fn(usize, usize) -> bool,
) -> Selection {
  let mut preceding = None;
  let mut winner: Option<(usize, usize)> = None;

  for (offset, block) in directory.iter() {
    if fits(&block, size) {
      let leftover = block.size - size;
      if winner.is_none_or(|(_, best)| better(leftover, best)) {
        winner = Some((offset, leftover));
      }
    }
    preceding = Some(offset);
  }

  Selection {
    preceding,
    candidate: winner.map(|(offset, _)| offset),
  }
}

fn next_fit<A: Arena>(
  directory: &Directory<A>,
  size: usize,
  cursor: Option<usize>,
) -> Selection {
  let start = cursor
    .and_then(|offset| directory.block(offset).next)
    .or(directory.head());

  let Some(start) = start else {
    return Selection::miss(None);
  };

  let mut preceding = None;
  for (offset, block) in directory.iter_from(Some(start)) {
    if fits(&block, size) {
      return Selection {
        preceding,
        candidate: Some(offset),
      };
    }
    preceding = Some(offset);
  }

  // Ran off the end: `preceding` is now the last block. Wrap to the head
  // and stop before the block the scan started at.
  let tail = preceding;
  let wrapped = directory
    .iter()
    .take_while(|&(offset, _)| offset != start)
    .find(|(_, block)| fits(block, size));

  match wrapped {
    Some((offset, _)) => Selection {
      preceding: tail,
      candidate: Some(offset),
    },
    None => Selection::miss(tail),
  }
}

impl fmt::Display for FitPolicy {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    let name = match self {
      FitPolicy::FirstFit => "first-fit",
      FitPolicy::BestFit => "best-fit",
      FitPolicy::WorstFit => "worst-fit",
      FitPolicy::NextFit => "next-fit",
    };
    f.write_str(name)
  }
}

impl FromStr for FitPolicy {
  type Err = ConfigError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let normalized: String = s
      .trim()
      .chars()
      .filter(|c| !matches!(c, '-' | '_' | ' '))
      .map(|c| c.to_ascii_lowercase())
      .collect();

    match normalized.as_str() {
      "first" | "firstfit" | "ff" => Ok(FitPolicy::FirstFit),
      "best" | "bestfit" | "bf" => Ok(FitPolicy::BestFit),
      "worst" | "worstfit" | "wf" => Ok(FitPolicy::WorstFit),
      "next" | "nextfit" | "nf" => Ok(FitPolicy::NextFit),
      _ => Err(ConfigError::UnknownPolicy(s.to_string())),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::arena::VecArena;

  /// Builds a directory of blocks with the given sizes; `true` marks a free
  /// block.
  fn layout(blocks: &[(usize, bool)]) -> (Directory<VecArena>, Vec<usize>) {
    let mut directory = Directory::new(VecArena::new());
    let mut offsets: Vec<usize> = Vec::new();

    for &(size, is_free) in blocks {
      let offset = directory.grow(offsets.last().copied(), size).unwrap();
      directory.set_free(offset, is_free);
      offsets.push(offset);
    }

    (directory, offsets)
  }

  /// Free blocks of 12, 4 and 8 bytes kept apart by used 4-byte blocks.
  fn separated(sizes: [usize; 3]) -> (Directory<VecArena>, Vec<usize>) {
    let (directory, offsets) = layout(&[
      (sizes[0], true),
      (4, false),
      (sizes[1], true),
      (4, false),
      (sizes[2], true),
      (4, false),
    ]);
    let free = vec![offsets[0], offsets[2], offsets[4]];
    (directory, free)
  }

  #[test]
  fn test_empty_directory_has_no_candidate() {
    let directory = Directory::new(VecArena::new());

    for policy in FitPolicy::ALL {
      assert_eq!(
        policy.select(&directory, 4, None),
        Selection {
          preceding: None,
          candidate: None,
        }
      );
    }
  }

  #[test]
  fn test_best_fit_picks_smallest_leftover() {
    let (directory, free) = separated([12, 4, 8]);

    let selection = FitPolicy::BestFit.select(&directory, 4, None);
    assert_eq!(selection.candidate, Some(free[1]));
  }

  #[test]
  fn test_worst_fit_picks_largest_leftover() {
    let (directory, free) = separated([12, 4, 8]);

    let selection = FitPolicy::WorstFit.select(&directory, 4, None);
    assert_eq!(selection.candidate, Some(free[0]));
  }

  #[test]
  fn test_worst_fit_accepts_exact_fit() {
    let (directory, offsets) = layout(&[(4, false), (8, true), (4, false)]);

    let selection = FitPolicy::WorstFit.select(&directory, 8, None);
    assert_eq!(selection.candidate, Some(offsets[1]));
  }

  #[test]
  fn test_ranked_ties_keep_first() {
    let (directory, free) = separated([8, 8, 4]);

    assert_eq!(
      FitPolicy::BestFit.select(&directory, 8, None).candidate,
      Some(free[0])
    );
    assert_eq!(
      FitPolicy::WorstFit.select(&directory, 4, None).candidate,
      Some(free[0])
    );
  }

  #[test]
  fn test_first_fit_takes_first_large_enough() {
    let (directory, free) = separated([4, 12, 8]);

    let selection = FitPolicy::FirstFit.select(&directory, 8, None);
    assert_eq!(selection.candidate, Some(free[1]));
  }

  #[test]
  fn test_miss_reports_last_block() {
    let (directory, offsets) = layout(&[(8, true), (4, false), (8, true), (4, false)]);
    let last = offsets.last().copied();

    for policy in FitPolicy::ALL {
      let selection = policy.select(&directory, 64, Some(offsets[1]));
      assert_eq!(selection.candidate, None, "{policy}");
      assert_eq!(selection.preceding, last, "{policy}");
    }
  }

  #[test]
  fn test_next_fit_resumes_after_cursor() {
    let (directory, offsets) = layout(&[(8, true), (4, false), (8, true), (4, false)]);

    // First fit always lands on the front block.
    assert_eq!(
      FitPolicy::FirstFit.select(&directory, 8, Some(offsets[1])).candidate,
      Some(offsets[0])
    );
    // Next fit starts after the cursor.
    assert_eq!(
      FitPolicy::NextFit.select(&directory, 8, Some(offsets[1])).candidate,
      Some(offsets[2])
    );
    // Without a cursor it starts at the head.
    assert_eq!(
      FitPolicy::NextFit.select(&directory, 8, None).candidate,
      Some(offsets[0])
    );
  }

  #[test]
  fn test_next_fit_wraps_to_head() {
    let (directory, offsets) = layout(&[(8, true), (4, false), (4, false), (4, false)]);

    let selection = FitPolicy::NextFit.select(&directory, 8, Some(offsets[2]));
    assert_eq!(selection.candidate, Some(offsets[0]));
    assert_eq!(selection.preceding, Some(offsets[3]));
  }

  #[test]
  fn test_next_fit_cursor_is_last_block() {
    let (directory, offsets) = layout(&[(8, true), (4, false)]);

    let selection = FitPolicy::NextFit.select(&directory, 8, Some(offsets[1]));
    assert_eq!(selection.candidate, Some(offsets[0]));

    let (directory, offsets) = layout(&[(4, false)]);
    let selection = FitPolicy::NextFit.select(&directory, 4, Some(offsets[0]));
    assert_eq!(selection.candidate, None);
    assert_eq!(selection.preceding, Some(offsets[0]));
  }

  #[test]
  fn test_parse_policy() {
    assert_eq!("first".parse(), Ok(FitPolicy::FirstFit));
    assert_eq!("Best-Fit".parse(), Ok(FitPolicy::BestFit));
    assert_eq!("WF".parse(), Ok(FitPolicy::WorstFit));
    assert_eq!(" next_fit ".parse(), Ok(FitPolicy::NextFit));
    assert_eq!(
      "buddy".parse::<FitPolicy>(),
      Err(ConfigError::UnknownPolicy("buddy".to_string()))
    );

    for policy in FitPolicy::ALL {
      assert_eq!(policy.to_string().parse(), Ok(policy));
    }
  }
}
