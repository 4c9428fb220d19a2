//! Lazy async frame sequences and composable operators.
//!
//! A [`FrameStream`] is a pull-based async sequence: each call to `next()`
//! may suspend (frame arrival, upstream I/O) before yielding the next item
//! or signaling exhaustion with `Ok(None)`. Operators consume one stream
//! and lazily produce another, so they compose in any order:
//!
//! ```rust,ignore
//! use vidflow::prelude::*;
//!
//! let mut stream = VideoSource::new("cam-0", 100)
//!     .filter(|frame| Ok(frame.id % 2 == 0))
//!     .batch(5);
//!
//! while let Some(group) = stream.next().await? {
//!     // group: Vec<RawFrame>, len 5 (last group may be smaller)
//! }
//! ```
//!
//! All operator logic is synchronous between suspension points; no
//! concurrency is introduced here. Concurrent fan-out happens only when a
//! supervisor processes an emitted batch.

use crate::error::Result;
use std::future::Future;
use std::marker::PhantomData;

/// A lazy, pull-based async sequence of items.
///
/// `next()` returns:
/// - `Ok(Some(item))`: the next item in sequence order
/// - `Ok(None)`: the sequence is exhausted (end of stream)
/// - `Err(...)`: the sequence failed and yields nothing further
pub trait FrameStream: Send {
    /// Item type yielded by this stream.
    type Item: Send;

    /// Pull the next item, suspending as needed.
    fn next(&mut self) -> impl Future<Output = Result<Option<Self::Item>>> + Send;
}

/// Combinator extensions for [`FrameStream`].
pub trait FrameStreamExt: FrameStream + Sized {
    /// Keep only items for which `predicate` returns `Ok(true)`.
    ///
    /// Preserves relative order and buffers no more than one element of
    /// lookahead. A predicate error propagates and terminates the sequence.
    fn filter<P>(self, predicate: P) -> Filter<Self, P>
    where
        P: FnMut(&Self::Item) -> Result<bool> + Send,
    {
        Filter {
            inner: self,
            predicate,
        }
    }

    /// Apply `f` to each item in sequence order, one at a time, lazily.
    ///
    /// A pure 1:1 mapping; no concurrency is introduced at this stage.
    fn map<F, U>(self, f: F) -> Map<Self, F, U>
    where
        F: FnMut(Self::Item) -> Result<U> + Send,
        U: Send,
    {
        Map {
            inner: self,
            f,
            _out: PhantomData,
        }
    }

    /// Accumulate items into groups of exactly `size`.
    ///
    /// At upstream exhaustion any non-empty remainder is emitted as a
    /// final, possibly smaller group.
    ///
    /// # Panics
    ///
    /// Panics if `size == 0`. Pipeline construction validates batch sizes
    /// up front via [`PipelineConfig::validate`](crate::config::PipelineConfig::validate),
    /// so a zero here is a caller bug.
    fn batch(self, size: usize) -> Chunks<Self> {
        assert!(size > 0, "batch size must be at least 1");
        Chunks {
            inner: self,
            size,
            done: false,
        }
    }
}

impl<S: FrameStream> FrameStreamExt for S {}

/// Stream returned by [`FrameStreamExt::filter`].
pub struct Filter<S, P> {
    inner: S,
    predicate: P,
}

impl<S, P> FrameStream for Filter<S, P>
where
    S: FrameStream,
    P: FnMut(&S::Item) -> Result<bool> + Send,
{
    type Item = S::Item;

    async fn next(&mut self) -> Result<Option<S::Item>> {
        while let Some(item) = self.inner.next().await? {
            if (self.predicate)(&item)? {
                return Ok(Some(item));
            }
        }
        Ok(None)
    }
}

/// Stream returned by [`FrameStreamExt::map`].
pub struct Map<S, F, U> {
    inner: S,
    f: F,
    _out: PhantomData<fn() -> U>,
}

impl<S, F, U> FrameStream for Map<S, F, U>
where
    S: FrameStream,
    F: FnMut(S::Item) -> Result<U> + Send,
    U: Send,
{
    type Item = U;

    async fn next(&mut self) -> Result<Option<U>> {
        match self.inner.next().await? {
            Some(item) => Ok(Some((self.f)(item)?)),
            None => Ok(None),
        }
    }
}

/// Stream returned by [`FrameStreamExt::batch`].
pub struct Chunks<S> {
    inner: S,
    size: usize,
    done: bool,
}

impl<S> FrameStream for Chunks<S>
where
    S: FrameStream,
{
    type Item = Vec<S::Item>;

    async fn next(&mut self) -> Result<Option<Vec<S::Item>>> {
        if self.done {
            return Ok(None);
        }

        let mut group = Vec::with_capacity(self.size);
        loop {
            let item = match self.inner.next().await {
                Ok(item) => item,
                Err(e) => {
                    // An upstream error terminates the sequence for good;
                    // later polls must not re-drive the failed upstream.
                    self.done = true;
                    return Err(e);
                }
            };
            match item {
                Some(item) => {
                    group.push(item);
                    if group.len() == self.size {
                        return Ok(Some(group));
                    }
                }
                None => {
                    self.done = true;
                    // Partial flush of the remainder, if any.
                    return if group.is_empty() {
                        Ok(None)
                    } else {
                        Ok(Some(group))
                    };
                }
            }
        }
    }
}

/// A stream over an in-memory sequence of items.
///
/// Yields each item without suspending. Useful for wiring pipelines from
/// pre-recorded data and in tests.
pub struct IterStream<I> {
    items: std::vec::IntoIter<I>,
}

impl<I> IterStream<I> {
    /// Create a stream over `items`.
    pub fn new(items: Vec<I>) -> Self {
        Self {
            items: items.into_iter(),
        }
    }
}

impl<I: Send> FrameStream for IterStream<I> {
    type Item = I;

    async fn next(&mut self) -> Result<Option<I>> {
        Ok(self.items.next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn numbers(n: u64) -> IterStream<u64> {
        IterStream::new((0..n).collect())
    }

    async fn collect<S: FrameStream>(mut stream: S) -> Result<Vec<S::Item>> {
        let mut out = Vec::new();
        while let Some(item) = stream.next().await? {
            out.push(item);
        }
        Ok(out)
    }

    #[tokio::test]
    async fn test_filter_keeps_matching_in_order() {
        let stream = numbers(10).filter(|n| Ok(n % 2 == 0));
        let out = collect(stream).await.unwrap();
        assert_eq!(out, vec![0, 2, 4, 6, 8]);
    }

    #[tokio::test]
    async fn test_filter_predicate_error_terminates() {
        let mut stream = numbers(10).filter(|n| {
            if *n == 3 {
                Err(Error::Processing("bad frame".into()))
            } else {
                Ok(true)
            }
        });

        assert_eq!(stream.next().await.unwrap(), Some(0));
        assert_eq!(stream.next().await.unwrap(), Some(1));
        assert_eq!(stream.next().await.unwrap(), Some(2));
        assert!(stream.next().await.is_err());
    }

    #[tokio::test]
    async fn test_map_in_order() {
        let stream = numbers(5).map(|n| Ok(n * 10));
        let out = collect(stream).await.unwrap();
        assert_eq!(out, vec![0, 10, 20, 30, 40]);
    }

    #[tokio::test]
    async fn test_batch_exact_and_partial() {
        let stream = numbers(7).batch(3);
        let out = collect(stream).await.unwrap();
        assert_eq!(out, vec![vec![0, 1, 2], vec![3, 4, 5], vec![6]]);
    }

    #[tokio::test]
    async fn test_batch_evenly_divisible() {
        let stream = numbers(6).batch(3);
        let out = collect(stream).await.unwrap();
        assert_eq!(out, vec![vec![0, 1, 2], vec![3, 4, 5]]);
        assert_eq!(out.last().map(Vec::len), Some(3));
    }

    #[tokio::test]
    async fn test_batch_empty_upstream() {
        let mut stream = numbers(0).batch(4);
        assert_eq!(stream.next().await.unwrap(), None);
        // Exhaustion is sticky.
        assert_eq!(stream.next().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_batch_stays_terminated_after_upstream_error() {
        let mut stream = numbers(10)
            .filter(|n| {
                if *n == 3 {
                    Err(Error::Processing("bad frame".into()))
                } else {
                    Ok(true)
                }
            })
            .batch(2);

        assert_eq!(stream.next().await.unwrap(), Some(vec![0, 1]));
        assert!(stream.next().await.is_err());
        // The error ends the sequence; later polls yield nothing.
        assert_eq!(stream.next().await.unwrap(), None);
        assert_eq!(stream.next().await.unwrap(), None);
    }

    #[test]
    #[should_panic(expected = "batch size must be at least 1")]
    fn test_batch_zero_size_panics() {
        let _ = numbers(3).batch(0);
    }

    #[tokio::test]
    async fn test_operators_compose() {
        let stream = numbers(10)
            .filter(|n| Ok(n % 2 == 0))
            .map(|n| Ok(n + 100))
            .batch(2);
        let out = collect(stream).await.unwrap();
        assert_eq!(out, vec![vec![100, 102], vec![104, 106], vec![108]]);
    }

    #[tokio::test]
    async fn test_filter_is_idempotent_for_same_predicate() {
        let once = collect(numbers(20).filter(|n| Ok(n % 3 == 0)))
            .await
            .unwrap();
        let twice = collect(
            numbers(20)
                .filter(|n| Ok(n % 3 == 0))
                .filter(|n| Ok(n % 3 == 0)),
        )
        .await
        .unwrap();
        assert_eq!(once, twice);
    }
}
