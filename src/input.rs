//! # Input Trait
//!
//! Components that consume a stream declare what they take through [`Input`].
//! The router is the only consumer in a statweave run: it takes the reader's
//! stream of [`Record`](crate::record::Record)s.

use futures::Stream;

/// Trait for components that can receive input streams.
pub trait Input
where
  Self::Input: Send + 'static,
{
  /// The type of items this component receives.
  type Input;
  /// The input stream type. `Unpin` so consumers can poll it with `next()` in place.
  type InputStream: Stream<Item = Self::Input> + Send + Unpin + 'static;
}
