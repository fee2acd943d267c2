use std::process::ExitCode;

use fitalloc::{Arena, Heap, HeapConfig, Ptr};

/// Prints every block of the heap in address order.
fn print_blocks<A: Arena>(
  label: &str,
  heap: &Heap<A>,
) {
  println!("\n[{}] arena = {} bytes, free = {} bytes", label, heap.arena_len(), heap.free_bytes());
  for (offset, block) in heap.blocks() {
    println!(
      "  {:#06x}  {:>6} bytes  {}",
      offset,
      block.size,
      if block.is_free { "free" } else { "used" }
    );
  }
}

fn print_alloc(
  label: &str,
  size: usize,
  ptr: Option<Ptr>,
) {
  match ptr {
    Some(ptr) => println!("\n{}: allocated {} bytes at {:#x}", label, size, ptr.offset()),
    None => println!("\n{}: allocation of {} bytes failed", label, size),
  }
}

fn main() -> ExitCode {
  env_logger::init();

  // FITALLOC_POLICY=best cargo run --example walkthrough
  let config = match HeapConfig::from_env() {
    Ok(config) => config,
    Err(err) => {
      eprintln!("walkthrough: {err}");
      return ExitCode::FAILURE;
    }
  };

  let mut heap = Heap::from_config(&config);
  println!("fit policy: {}", heap.policy());

  // --------------------------------------------------------------------
  // 1) Grow the arena with a few blocks of different sizes. The 4-byte
  //    blocks in between keep the larger ones from merging later.
  // --------------------------------------------------------------------
  let sizes = [64, 4, 16, 4, 128, 4];
  let mut ptrs = Vec::new();
  for size in sizes {
    let ptr = heap.allocate(size);
    print_alloc("[1]", size, ptr);
    ptrs.push(ptr);
  }
  print_blocks("1", &heap);

  // --------------------------------------------------------------------
  // 2) Free the large blocks. Each becomes a hole the fit policy can pick.
  // --------------------------------------------------------------------
  for &index in &[0, 2, 4] {
    heap.free(ptrs[index]);
  }
  print_blocks("2", &heap);

  // --------------------------------------------------------------------
  // 3) Ask for 12 bytes. Which hole is chosen depends on the policy:
  //    first fit takes the 64-byte hole, best fit the 16-byte one,
  //    worst fit the 128-byte one. Big enough holes are split.
  // --------------------------------------------------------------------
  let reused = heap.allocate(12);
  print_alloc("[3]", 12, reused);
  print_blocks("3", &heap);

  // --------------------------------------------------------------------
  // 4) Zero-allocate an array and resize it. Reallocation copies the data
  //    to a new block and frees the old one.
  // --------------------------------------------------------------------
  let array = heap.zero_allocate(10, 4);
  print_alloc("[4]", 40, array);
  if let Some(array) = array {
    for (i, byte) in heap.payload_mut(array).iter_mut().enumerate() {
      *byte = i as u8;
    }
  }
  let resized = heap.reallocate(array, 200);
  print_alloc("[4] resized", 200, resized);
  print_blocks("4", &heap);

  // --------------------------------------------------------------------
  // 5) Free everything that is still live. Neighbouring free blocks are
  //    coalesced until a single free block spans the arena.
  // --------------------------------------------------------------------
  for &index in &[1, 3, 5] {
    heap.free(ptrs[index]);
  }
  heap.free(reused);
  heap.free(resized);
  print_blocks("5", &heap);

  if let Err(err) = heap.verify() {
    eprintln!("walkthrough: {err}");
    return ExitCode::FAILURE;
  }

  // With FITALLOC_REPORT set the heap prints this itself when dropped.
  if !config.report_on_drop {
    print!("\n{}", heap.stats());
  }
  ExitCode::SUCCESS
}
