//! # Output Trait
//!
//! Components that produce a stream declare what they emit through [`Output`].

use futures::Stream;

/// Trait for components that can produce output streams.
pub trait Output
where
  Self::Output: Send + 'static,
{
  /// The type of items produced by this output stream.
  type Output;
  /// The output stream type. `Unpin` so it can be polled with `next()` in place.
  type OutputStream: Stream<Item = Self::Output> + Send + Unpin + 'static;
}
