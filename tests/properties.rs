use fitalloc::{FitPolicy, Heap, HeapConfig, Ptr};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
  Allocate(usize),
  Free(usize),
  Reallocate(usize, usize),
}

fn op() -> impl Strategy<Value = Op> {
  prop_oneof![
    3 => (0usize..300).prop_map(Op::Allocate),
    2 => any::<usize>().prop_map(Op::Free),
    1 => (any::<usize>(), 0usize..300).prop_map(|(i, size)| Op::Reallocate(i, size)),
  ]
}

fn policy() -> impl Strategy<Value = FitPolicy> {
  prop::sample::select(FitPolicy::ALL.to_vec())
}

/// Runs `ops` against a fresh heap, checking the layout after every step.
fn run(
  policy: FitPolicy,
  limit: Option<usize>,
  ops: &[Op],
) -> Result<Heap, TestCaseError> {
  let mut heap = Heap::from_config(&HeapConfig {
    arena_limit: limit,
    ..HeapConfig::with_policy(policy)
  });
  let mut live: Vec<Ptr> = Vec::new();

  for op in ops {
    match *op {
      Op::Allocate(size) => {
        let ptr = heap.allocate(size);
        if size == 0 {
          prop_assert_eq!(ptr, None);
        }
        live.extend(ptr);
      }
      Op::Free(i) if !live.is_empty() => {
        let ptr = live.swap_remove(i % live.len());
        heap.free(Some(ptr));
      }
      Op::Reallocate(i, size) if !live.is_empty() => {
        let index = i % live.len();
        match heap.reallocate(Some(live[index]), size) {
          Some(ptr) => live[index] = ptr,
          None if size == 0 => {
            live.swap_remove(index);
          }
          // Failed growth: the old block is still ours.
          None => prop_assert!(heap.usable_size(live[index]).is_some()),
        }
      }
      _ => {}
    }

    prop_assert_eq!(heap.verify(), Ok(()));
    prop_assert_eq!(heap.stats().blocks, heap.blocks().count());
    prop_assert_eq!(heap.blocks().filter(|(_, b)| !b.is_free).count(), live.len());
  }

  for ptr in live {
    heap.free(Some(ptr));
    prop_assert_eq!(heap.verify(), Ok(()));
  }

  Ok(heap)
}

proptest! {
  #[test]
  fn prop_layout_holds(
    policy in policy(),
    ops in prop::collection::vec(op(), 1..80),
  ) {
    let heap = run(policy, None, &ops)?;

    // Everything was freed, so at most one free block spans the arena.
    prop_assert!(heap.blocks().count() <= 1);
    prop_assert!(heap.blocks().all(|(_, b)| b.is_free));
  }

  #[test]
  fn prop_layout_holds_when_exhausted(
    policy in policy(),
    limit in 0usize..2048,
    ops in prop::collection::vec(op(), 1..80),
  ) {
    let heap = run(policy, Some(limit), &ops)?;
    prop_assert!(heap.arena_len() <= limit);
  }

  #[test]
  fn prop_reuse_round_trip(
    policy in policy(),
    ops in prop::collection::vec(op(), 1..40),
    size in 1usize..300,
  ) {
    let mut heap = run(policy, None, &ops)?;

    let free = heap.free_bytes();
    let grows = heap.stats().grows;

    let ptr = heap.allocate(size).unwrap();
    heap.free(Some(ptr));

    if heap.stats().grows == grows {
      prop_assert_eq!(heap.free_bytes(), free);
    }
  }

  #[test]
  fn prop_reallocate_keeps_prefix(
    policy in policy(),
    old_size in 1usize..200,
    new_size in 1usize..200,
  ) {
    let mut heap = Heap::new(policy);
    let ptr = heap.allocate(old_size).unwrap();
    let pattern: Vec<u8> = (0..heap.payload(ptr).len()).map(|i| i as u8 ^ 0xA5).collect();
    heap.payload_mut(ptr).copy_from_slice(&pattern);

    let moved = heap.reallocate(Some(ptr), new_size).unwrap();
    let kept = old_size.min(new_size);
    prop_assert_eq!(&heap.payload(moved)[..kept], &pattern[..kept]);
  }
}
