use std::io::Read;

use bumpchain::{Arena, ArenaConfig, BlockSource, HeapSource};

/// Waits until the user presses ENTER.
/// Useful when you want to inspect memory state with tools like `pmap`
/// or `htop` while blocks are being added.
fn block_until_enter_pressed() {
  println!("\n>>> Press ENTER to continue...");
  let _ = std::io::stdin().bytes().next();
}

fn print_stats<S: BlockSource>(
  label: &str,
  arena: &Arena<S>,
) {
  println!(
    "[{}] PID = {}, blocks = {}, used = {} bytes, allocated = {} bytes, tail free = {} bytes",
    label,
    std::process::id(),
    arena.block_count(),
    arena.used_bytes(),
    arena.allocated_bytes(),
    arena.remaining(),
  );
}

fn run<S: BlockSource>(source: S) -> bumpchain::Result<()> {
  // 64 KiB blocks: 16 units of 4 KiB.
  let mut arena = Arena::with_source(ArenaConfig::new(16), source)?;

  print_stats("start", &arena);
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 1) Stream a batch of small records into the arena.
  // --------------------------------------------------------------------
  let mut records = Vec::new();
  for i in 0..2000 {
    records.push(arena.alloc_str(&format!("record {i:04};"))?);
  }
  println!("\n[1] Stored {} records", records.len());
  println!("[1] First = {:?}, last = {:?}", records[0], records[records.len() - 1]);
  print_stats("1", &arena);

  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 2) A request that does not fit in the tail starts a new block.
  // --------------------------------------------------------------------
  let before = arena.block_count();
  let big = arena.allocate(arena.remaining() + 1)?;
  big.fill(0xAB);
  println!(
    "\n[2] Allocated {} bytes, blocks {} -> {}, tail starts at {:?}",
    big.len(),
    before,
    arena.block_count(),
    arena.current_block_start()?,
  );

  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 3) Anything larger than a block is refused.
  // --------------------------------------------------------------------
  match arena.allocate(arena.capacity() + 1) {
    Ok(_) => println!("\n[3] Unexpectedly allocated an oversized range"),
    Err(err) => println!("\n[3] Refused: {err}"),
  }

  // --------------------------------------------------------------------
  // 4) Flatten everything into one contiguous buffer.
  // --------------------------------------------------------------------
  let flat = arena.flatten()?;
  println!(
    "\n[4] Flattened {} bytes, starts with {:?}",
    flat.len(),
    String::from_utf8_lossy(&flat[..24]),
  );
  for (i, bytes) in arena.blocks().enumerate() {
    println!("[4] block {i}: {} bytes used", bytes.len());
  }

  // --------------------------------------------------------------------
  // 5) Dropping the arena releases each block once.
  // --------------------------------------------------------------------
  println!("\n[5] Dropping {} blocks", arena.block_count());
  Ok(())
}

fn main() -> bumpchain::Result<()> {
  #[cfg(unix)]
  {
    println!("Using mmap-backed blocks");
    run(bumpchain::MmapSource::new())?;
  }

  println!("\nUsing heap-backed blocks");
  run(HeapSource)
}
