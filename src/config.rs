//! Tracking allocator configuration.

/// What [`TrackingAllocator`](crate::TrackingAllocator) does when asked to
/// release an address it has no record of.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UnknownPointerPolicy {
  /// Silently do nothing.
  #[default]
  Ignore,
  /// Do nothing, but emit a `warn` event.
  Warn,
  /// Panic immediately.
  Panic,
}

/// Configuration for the tracking allocator.
///
/// Immutable once the allocator is built.
#[derive(Clone, Debug, Default)]
pub struct TrackingConfig {
  /// Handling of double frees and foreign pointers.
  ///
  /// Default: [`UnknownPointerPolicy::Ignore`].
  pub unknown_pointer: UnknownPointerPolicy,
}

impl TrackingConfig {
  /// Create a config with the given unknown-pointer policy.
  pub fn new(unknown_pointer: UnknownPointerPolicy) -> Self {
    Self { unknown_pointer }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_policy_ignores() {
    let config = TrackingConfig::default();
    assert_eq!(config.unknown_pointer, UnknownPointerPolicy::Ignore);
  }

  #[test]
  fn policy_preserved() {
    let config = TrackingConfig::new(UnknownPointerPolicy::Warn);
    assert_eq!(config.unknown_pointer, UnknownPointerPolicy::Warn);
  }
}
