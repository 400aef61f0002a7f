/// Bookkeeping for one outstanding allocation, keyed by its address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Block {
  /// Bytes the caller asked for.
  pub size: usize,
  /// Alignment the caller asked for.
  pub align: usize,
}

impl Block {
  pub fn new(
    size: usize,
    align: usize,
  ) -> Self {
    Self { size, align }
  }
}
