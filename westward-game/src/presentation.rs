//! Bridge between the simulation thread and whatever renders screens.
//!
//! The simulation pushes screen ids and consequences; the presentation side
//! drains them. A single condition variable covers every wake-up the
//! simulation waits on: the queue draining, operator input arriving, and a
//! stop request.
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::constants::SCREEN_CONSEQUENCE;
use crate::events::Consequence;

/// Why a blocking wait returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wait {
    Ready,
    Stopped,
}

impl Wait {
    #[must_use]
    pub const fn is_stopped(self) -> bool {
        matches!(self, Self::Stopped)
    }
}

/// Presentation side of a journey.
///
/// Implementations must be `Send + Sync`; the simulation and presentation
/// threads share one instance.
pub trait Presenter: Send + Sync {
    /// Append a screen id at the tail of the queue.
    fn enqueue(&self, screen_id: &str);

    /// Record a consequence and queue the consequence screen that shows it.
    fn enqueue_consequence(&self, consequence: Consequence);

    /// Drop every pending screen and consequence.
    fn clear(&self);

    fn set_awaiting_input(&self, awaiting: bool);

    fn is_awaiting_input(&self) -> bool;

    /// Block until no screen is pending and no input is awaited.
    fn wait_until_idle(&self) -> Wait;

    /// Block until no screen is pending; pending input is ignored.
    fn wait_until_drained(&self) -> Wait;

    /// Sleep up to `delay`, waking early on a stop request.
    fn pause(&self, delay: Duration) -> Wait;

    /// Ask every blocked wait to return [`Wait::Stopped`].
    fn request_stop(&self);

    /// Clear a previous stop request before a new session starts.
    fn reset_stop(&self);

    fn is_stopped(&self) -> bool;
}

#[derive(Debug, Default)]
struct QueueState {
    screens: VecDeque<String>,
    consequences: VecDeque<Consequence>,
    awaiting_input: bool,
    stopped: bool,
}

impl QueueState {
    fn is_idle(&self) -> bool {
        self.screens.is_empty() && !self.awaiting_input
    }
}

/// FIFO of pending screens shared with an interactive front end.
#[derive(Debug, Default)]
pub struct ScreenQueue {
    state: Mutex<QueueState>,
    changed: Condvar,
}

impl ScreenQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update<T>(&self, change: impl FnOnce(&mut QueueState) -> T) -> T {
        let value = change(&mut *self.lock());
        self.changed.notify_all();
        value
    }

    #[must_use]
    pub fn peek(&self) -> Option<String> {
        self.lock().screens.front().cloned()
    }

    /// Remove the head screen once it has been shown.
    pub fn pop(&self) -> Option<String> {
        self.update(|state| state.screens.pop_front())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().screens.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().screens.len()
    }

    /// Oldest consequence not yet shown.
    pub fn pop_consequence(&self) -> Option<Consequence> {
        self.lock().consequences.pop_front()
    }

    /// The operator answered; the next day may begin once the queue drains.
    pub fn release_input(&self) {
        self.set_awaiting_input(false);
    }

    /// Block the presentation side until a screen is pending, input is
    /// awaited, a stop is requested, or `timeout` elapses.
    ///
    /// Returns `true` if there is something to act on.
    pub fn wait_for_work(&self, timeout: Duration) -> bool {
        let guard = self.lock();
        let (state, _) = self
            .changed
            .wait_timeout_while(guard, timeout, |state| {
                state.screens.is_empty() && !state.awaiting_input && !state.stopped
            })
            .unwrap_or_else(PoisonError::into_inner);
        !state.screens.is_empty() || state.awaiting_input
    }
}

impl Presenter for ScreenQueue {
    fn enqueue(&self, screen_id: &str) {
        log::trace!("screen queued: {screen_id}");
        self.update(|state| state.screens.push_back(screen_id.to_string()));
    }

    fn enqueue_consequence(&self, consequence: Consequence) {
        self.update(|state| {
            state.consequences.push_back(consequence);
            state.screens.push_back(SCREEN_CONSEQUENCE.to_string());
        });
    }

    fn clear(&self) {
        self.update(|state| {
            state.screens.clear();
            state.consequences.clear();
        });
    }

    fn set_awaiting_input(&self, awaiting: bool) {
        self.update(|state| state.awaiting_input = awaiting);
    }

    fn is_awaiting_input(&self) -> bool {
        self.lock().awaiting_input
    }

    fn wait_until_idle(&self) -> Wait {
        let guard = self.lock();
        let state = self
            .changed
            .wait_while(guard, |state| !state.stopped && !state.is_idle())
            .unwrap_or_else(PoisonError::into_inner);
        if state.stopped { Wait::Stopped } else { Wait::Ready }
    }

    fn wait_until_drained(&self) -> Wait {
        let guard = self.lock();
        let state = self
            .changed
            .wait_while(guard, |state| !state.stopped && !state.screens.is_empty())
            .unwrap_or_else(PoisonError::into_inner);
        if state.stopped { Wait::Stopped } else { Wait::Ready }
    }

    fn pause(&self, delay: Duration) -> Wait {
        let guard = self.lock();
        let (state, _) = self
            .changed
            .wait_timeout_while(guard, delay, |state| !state.stopped)
            .unwrap_or_else(PoisonError::into_inner);
        if state.stopped { Wait::Stopped } else { Wait::Ready }
    }

    fn request_stop(&self) {
        self.update(|state| state.stopped = true);
    }

    fn reset_stop(&self) {
        self.update(|state| state.stopped = false);
    }

    fn is_stopped(&self) -> bool {
        self.lock().stopped
    }
}

/// Presenter for batch runs: every screen is shown the moment it is queued
/// and input is answered immediately. Screens and consequences are recorded.
#[derive(Debug, Default)]
pub struct HeadlessPresenter {
    shown: Mutex<Vec<String>>,
    consequences: Mutex<Vec<Consequence>>,
    stopped: AtomicBool,
}

impl HeadlessPresenter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every screen id queued so far, in order.
    #[must_use]
    pub fn shown(&self) -> Vec<String> {
        self.shown.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    #[must_use]
    pub fn consequences(&self) -> Vec<Consequence> {
        self.consequences
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn count_of(&self, screen_id: &str) -> usize {
        self.shown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|shown| shown.as_str() == screen_id)
            .count()
    }

    fn outcome(&self) -> Wait {
        if self.stopped.load(Ordering::Acquire) {
            Wait::Stopped
        } else {
            Wait::Ready
        }
    }
}

impl Presenter for HeadlessPresenter {
    fn enqueue(&self, screen_id: &str) {
        self.shown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(screen_id.to_string());
    }

    fn enqueue_consequence(&self, consequence: Consequence) {
        log::debug!("consequence: {consequence}");
        self.consequences
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(consequence);
        self.enqueue(SCREEN_CONSEQUENCE);
    }

    fn clear(&self) {}

    fn set_awaiting_input(&self, _awaiting: bool) {}

    fn is_awaiting_input(&self) -> bool {
        false
    }

    fn wait_until_idle(&self) -> Wait {
        self.outcome()
    }

    fn wait_until_drained(&self) -> Wait {
        self.outcome()
    }

    fn pause(&self, _delay: Duration) -> Wait {
        self.outcome()
    }

    fn request_stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    fn reset_stop(&self) {
        self.stopped.store(false, Ordering::Release);
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}
