//! Polling until asynchronous controller actions settle.
//!
//! Image staging, validation, and upgrade run asynchronously on the
//! controller; the REST call returns long before the workflow finishes.
//! [`WaitForControllerDone`] re-reads a [`ControllerView`] at a fixed
//! interval, moving items (switches) from todo to done as their in-progress
//! flags clear, until everything settles or the budget runs out.
//!
//! Cancellation mid-poll is not supported; the loop exits on completion or
//! timeout only.

use crate::error::{Error, Result};
use crate::issu::FilterKey;
use crate::rest_send::RestSend;
use crate::sender::Sender;
use std::collections::HashSet;
use std::thread;
use tracing::debug;

/// A refreshable, filterable snapshot of controller state.
///
/// Implemented by [`SwitchIssuDetails`](crate::issu::SwitchIssuDetails);
/// tests substitute scripted views.
pub trait ControllerView<S: Sender> {
    /// Re-fetches the snapshot from the controller.
    fn refresh(&mut self, rest_send: &mut RestSend<S>) -> Result<()>;

    /// True when the item identified by `key` still has actions running.
    fn in_progress(&self, filter: FilterKey, key: &str) -> Result<bool>;
}

/// Waits for a set of items to finish their controller-side actions.
#[derive(Debug, Clone)]
pub struct WaitForControllerDone {
    filter: FilterKey,
    items: HashSet<String>,
    done: HashSet<String>,
}

impl WaitForControllerDone {
    /// Creates a waiter over `items` identified by `filter`.
    pub fn new(filter: FilterKey, items: impl IntoIterator<Item = String>) -> Self {
        Self {
            filter,
            items: items.into_iter().collect(),
            done: HashSet::new(),
        }
    }

    /// Items confirmed settled so far.
    pub fn done(&self) -> &HashSet<String> {
        &self.done
    }

    /// Items still pending, in sorted order.
    fn pending(&self) -> Vec<String> {
        let mut pending: Vec<String> = self.items.difference(&self.done).cloned().collect();
        pending.sort();
        pending
    }

    /// Polls `view` until every item settles or the budget is exhausted.
    ///
    /// The budget comes from the rest_send settings: `timeout` total,
    /// one refresh per `send_interval`. An empty item set returns
    /// immediately without a single refresh or sleep.
    ///
    /// # Errors
    ///
    /// `Timeout` when the budget runs out with items still pending; the
    /// error lists both the completed and the pending sets.
    pub fn commit<S, V>(&mut self, rest_send: &mut RestSend<S>, view: &mut V) -> Result<()>
    where
        S: Sender,
        V: ControllerView<S>,
    {
        if self.items.is_empty() {
            return Ok(());
        }

        let interval = rest_send.settings().send_interval;
        let timeout = rest_send.settings().timeout;
        let mut remaining = timeout;

        loop {
            view.refresh(rest_send)?;

            for item in &self.items {
                if self.done.contains(item) {
                    continue;
                }
                if !view.in_progress(self.filter, item)? {
                    self.done.insert(item.clone());
                }
            }

            if self.done.len() == self.items.len() {
                debug!(items = self.items.len(), "all controller actions settled");
                return Ok(());
            }

            remaining = remaining.saturating_sub(interval);
            if remaining.is_zero() {
                let mut done: Vec<String> = self.done.iter().cloned().collect();
                done.sort();
                return Err(Error::Timeout {
                    done,
                    pending: self.pending(),
                    timeout_secs: timeout.as_secs(),
                });
            }

            debug!(
                done = self.done.len(),
                todo = self.items.len(),
                remaining_secs = remaining.as_secs(),
                "controller actions still in progress"
            );
            thread::sleep(interval);
        }
    }
}
