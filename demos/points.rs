use std::fmt;

use rtrack::{MemoryResource, ResourceVec, TrackingAllocator};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Point {
  x: i32,
  y: i32,
  z: i32,
}

impl fmt::Display for Point {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    write!(f, "({}, {}, {})", self.x, self.y, self.z)
  }
}

/// Prints how many blocks the allocator is currently tracking.
fn print_outstanding(
  label: &str,
  allocator: &TrackingAllocator,
) {
  println!(
    "[{}] outstanding blocks = {}, outstanding bytes = {}",
    label,
    allocator.outstanding(),
    allocator.outstanding_bytes(),
  );
}

fn main() {
  // RUST_LOG=rtrack=trace shows every allocate/deallocate.
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .init();

  let allocator = TrackingAllocator::new();
  print_outstanding("start", &allocator);

  // --------------------------------------------------------------------
  // 1) A vector of integers. Three pushes grow the buffer 1 -> 2 -> 4.
  // --------------------------------------------------------------------
  {
    let mut numbers = ResourceVec::new_in(&allocator);
    numbers.push(10);
    numbers.push(20);
    numbers.push(30);

    print!("int vector: ");
    for value in &numbers {
      print!("{value} ");
    }
    println!();

    print_outstanding("int vector alive", &allocator);
  }

  print_outstanding("int vector dropped", &allocator);

  // --------------------------------------------------------------------
  // 2) A vector of three-field records, walked with a cursor pair.
  // --------------------------------------------------------------------
  {
    let mut points = ResourceVec::new_in(&allocator);
    points.push(Point { x: 1, y: 2, z: 3 });
    points.push(Point { x: 4, y: 5, z: 6 });
    points.push(Point { x: 7, y: 8, z: 9 });

    println!("Point vector:");
    let mut cursor = points.begin();
    while cursor != points.end() {
      // The cursor is before end(), so it is on a live element.
      println!("{}", unsafe { cursor.get() });
      cursor.advance();
    }

    println!(
      "points bound to this allocator? {}",
      allocator.is_equal(points.resource())
    );
  }

  let stats = allocator.stats();
  println!(
    "allocations = {}, deallocations = {}, peak bytes = {}",
    stats.allocations, stats.deallocations, stats.peak_bytes,
  );

  // --------------------------------------------------------------------
  // 3) Anything still outstanding is freed when the allocator drops.
  // --------------------------------------------------------------------
  println!("TrackingAllocator destroyed automatically.");
}
