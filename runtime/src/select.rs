//! Selections - derived, observable views of store state
//!
//! A [`Selection`] pairs a snapshot subscription with a pure selector
//! function. It always has a current value and only reports a change when
//! the selected value actually differs from the last one it reported, so a
//! commit that leaves the selected slice alone is invisible to its readers.

use crate::error::StoreError;
use futures::Stream;
use std::sync::Arc;
use tokio::sync::watch;

type Selector<S, T> = Arc<dyn Fn(&S) -> T + Send + Sync>;

/// Observable value derived from a store's snapshots
pub struct Selection<S, T> {
    receiver: watch::Receiver<Arc<S>>,
    selector: Selector<S, T>,
    last: T,
}

impl<S, T: Clone> Clone for Selection<S, T> {
    fn clone(&self) -> Self {
        Self {
            receiver: self.receiver.clone(),
            selector: Arc::clone(&self.selector),
            last: self.last.clone(),
        }
    }
}

impl<S, T> Selection<S, T>
where
    S: Send + Sync + 'static,
    T: Clone + PartialEq + Send + 'static,
{
    /// Derive a selection from a snapshot subscription
    ///
    /// The selection starts at the receiver's current snapshot.
    pub fn new<F>(mut receiver: watch::Receiver<Arc<S>>, selector: F) -> Self
    where
        F: Fn(&S) -> T + Send + Sync + 'static,
    {
        let last = selector(&receiver.borrow_and_update());
        Self {
            receiver,
            selector: Arc::new(selector),
            last,
        }
    }

    /// Selected value of the latest committed snapshot
    #[must_use]
    pub fn get(&self) -> T {
        (self.selector)(&self.receiver.borrow())
    }

    /// Last value this selection reported
    #[must_use]
    pub const fn current(&self) -> &T {
        &self.last
    }

    /// Derive a narrower selection from this one
    #[must_use]
    pub fn map<U, F>(&self, f: F) -> Selection<S, U>
    where
        U: Clone + PartialEq + Send + 'static,
        F: Fn(&T) -> U + Send + Sync + 'static,
    {
        let selector = Arc::clone(&self.selector);
        Selection::new(self.receiver.clone(), move |state: &S| f(&selector(state)))
    }

    /// Wait for the next commit that changes the selected value
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ChannelClosed`] once the store is dropped.
    pub async fn changed(&mut self) -> Result<T, StoreError> {
        loop {
            self.receiver
                .changed()
                .await
                .map_err(|_| StoreError::ChannelClosed)?;

            let next = (self.selector)(&self.receiver.borrow_and_update());
            if next != self.last {
                self.last = next.clone();
                return Ok(next);
            }
        }
    }

    /// Current value followed by every distinct change, until the store is dropped
    pub fn into_stream(mut self) -> impl Stream<Item = T> + Send
    where
        S: Send + Sync,
    {
        async_stream::stream! {
            yield self.last.clone();
            while let Ok(next) = self.changed().await {
                yield next;
            }
        }
    }
}

impl<S, T: std::fmt::Debug> std::fmt::Debug for Selection<S, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Selection")
            .field("current", &self.last)
            .finish_non_exhaustive()
    }
}
