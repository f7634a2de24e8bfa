//! Owner of the single live journey and the locks around it.
//!
//! The frame lock guards the session itself: renders and operator commands
//! take it briefly, and the scheduler takes it for one step at a time so it is
//! never held across a presentation wait. The tick lock serializes a whole
//! tick against teardown. Saves are only taken between days, so a save never
//! captures a half-finished day.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;

use crate::journey::{Advance, JourneyEnd, JourneySession, JourneyState};
use crate::presentation::{Presenter, Wait};
use crate::save::SaveData;
use crate::{GameAssets, GameStorage};

/// How long the simulation loop sleeps between checks when idle.
const IDLE_POLL: Duration = Duration::from_millis(100);

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("a session for {save_name} is already active")]
    AlreadyActive { save_name: String },
    #[error("no session is active")]
    NoSession,
    #[error("{save_name} is mid-day and cannot be saved until the day ends")]
    DayInProgress { save_name: String },
    #[error("save storage failed")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Result of one call to [`SessionHost::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickStatus {
    /// No session is active.
    NoSession,
    /// A day finished; the operator's input is awaited.
    DayComplete,
    /// A stop request interrupted the tick.
    Stopped,
    /// The journey ended and the session was torn down.
    Ended(JourneyEnd),
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct SessionHost<S, P>
where
    S: GameStorage,
    P: Presenter,
{
    frame: Mutex<Option<JourneySession>>,
    session_changed: Condvar,
    tick_lock: Mutex<()>,
    storage: S,
    presenter: Arc<P>,
    assets: GameAssets,
}

impl<S, P> SessionHost<S, P>
where
    S: GameStorage,
    P: Presenter,
{
    #[must_use]
    pub fn new(assets: GameAssets, storage: S, presenter: Arc<P>) -> Self {
        Self {
            frame: Mutex::new(None),
            session_changed: Condvar::new(),
            tick_lock: Mutex::new(()),
            storage,
            presenter,
            assets,
        }
    }

    #[must_use]
    pub const fn presenter(&self) -> &Arc<P> {
        &self.presenter
    }

    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    #[must_use]
    pub const fn assets(&self) -> &GameAssets {
        &self.assets
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        lock(&self.frame).is_some()
    }

    /// Begin a journey from `save`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::AlreadyActive`] while another session is live.
    pub fn start_session(&self, save: SaveData, seed: u64) -> Result<(), SessionError> {
        let mut frame = lock(&self.frame);
        if let Some(active) = frame.as_ref() {
            return Err(SessionError::AlreadyActive {
                save_name: active.party().save_name.clone(),
            });
        }
        self.presenter.reset_stop();
        self.presenter.set_awaiting_input(false);
        *frame = Some(JourneySession::new(save, &self.assets, seed));
        drop(frame);
        self.session_changed.notify_all();
        Ok(())
    }

    /// Stop the simulation cooperatively and tear the session down,
    /// optionally saving it first. Returns the saved record.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Storage`] if saving fails; the session is
    /// torn down regardless.
    pub fn end_session(&self, save: bool) -> Result<Option<SaveData>, SessionError> {
        self.presenter.request_stop();
        let _tick = lock(&self.tick_lock);
        let Some(session) = self.take_session() else {
            return Ok(None);
        };
        self.presenter.clear();
        if !save {
            log::info!("session {} ended without saving", session.party().save_name);
            return Ok(None);
        }
        let data = session.build_save_data();
        self.storage
            .save(&data)
            .map_err(|err| SessionError::Storage(Box::new(err)))?;
        log::info!("session {} saved", data.save_name);
        Ok(Some(data))
    }

    /// Save the live journey without stopping it.
    ///
    /// The snapshot is taken under the frame lock and only while the journey
    /// awaits input, so it always lands on a day boundary. This does not wait
    /// on the tick lock: a tick blocked on the operator's input holds it.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoSession`] when nothing is running,
    /// [`SessionError::DayInProgress`] while the scheduler is partway through
    /// a day, or [`SessionError::Storage`] if saving fails.
    pub fn save_session(&self) -> Result<SaveData, SessionError> {
        let data = self
            .with_frame(|session| {
                if session.state() == JourneyState::AwaitingInput {
                    Ok(session.build_save_data())
                } else {
                    Err(SessionError::DayInProgress {
                        save_name: session.party().save_name.clone(),
                    })
                }
            })
            .ok_or(SessionError::NoSession)??;
        self.storage
            .save(&data)
            .map_err(|err| SessionError::Storage(Box::new(err)))?;
        log::info!("session {} saved", data.save_name);
        Ok(data)
    }

    /// Immediate hard stop: no save, no waiting for an in-flight tick.
    pub fn halt(&self) {
        self.presenter.request_stop();
        if let Some(session) = self.take_session() {
            log::warn!("session {} halted", session.party().save_name);
        }
        self.presenter.clear();
    }

    fn take_session(&self) -> Option<JourneySession> {
        let session = lock(&self.frame).take();
        self.session_changed.notify_all();
        session
    }

    /// Advance the live journey until the operator's input is needed, the
    /// journey ends, or a stop request arrives.
    ///
    /// A host without a session reports [`TickStatus::NoSession`] even while a
    /// stop request from its teardown is still pending.
    pub fn tick(&self) -> TickStatus {
        let _tick = lock(&self.tick_lock);
        loop {
            let advance = {
                let mut frame = lock(&self.frame);
                let Some(session) = frame.as_mut() else {
                    return TickStatus::NoSession;
                };
                if self.presenter.is_stopped() {
                    return TickStatus::Stopped;
                }
                session.advance(&*self.presenter)
            };
            let wait = match advance {
                Advance::AwaitIdle => self.presenter.wait_until_idle(),
                Advance::AwaitDrained => self.presenter.wait_until_drained(),
                Advance::AwaitPace(delay) => match self.presenter.pause(delay) {
                    Wait::Ready => self.presenter.wait_until_drained(),
                    Wait::Stopped => Wait::Stopped,
                },
                Advance::DayComplete => return TickStatus::DayComplete,
                Advance::Ended(end) => {
                    self.finish();
                    return TickStatus::Ended(end);
                }
            };
            if wait.is_stopped() {
                return TickStatus::Stopped;
            }
        }
    }

    /// Delete the finished journey's save, let the terminal screen show, then
    /// tear the session down without saving.
    fn finish(&self) {
        let save_name = lock(&self.frame)
            .as_ref()
            .map(|session| session.party().save_name.clone());
        if let Some(save_name) = save_name
            && let Err(err) = self.storage.delete(&save_name)
        {
            log::warn!("could not delete save {save_name}: {err}");
        }
        self.presenter.wait_until_drained();
        self.take_session();
    }

    /// Block until a session is active or `timeout` passes.
    pub fn wait_for_session(&self, timeout: Duration) -> bool {
        let frame = lock(&self.frame);
        let (frame, _) = self
            .session_changed
            .wait_timeout_while(frame, timeout, |session| session.is_none())
            .unwrap_or_else(PoisonError::into_inner);
        frame.is_some()
    }

    fn wait_for_teardown(&self, timeout: Duration) {
        let frame = lock(&self.frame);
        let _frame = self
            .session_changed
            .wait_timeout_while(frame, timeout, |session| {
                session.is_some() && self.presenter.is_stopped()
            })
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// Simulation thread body: tick whenever a session is live until
    /// `shutdown` is set. Callers setting `shutdown` should also
    /// [`halt`](Self::halt) or [`end_session`](Self::end_session) so blocked
    /// waits return.
    pub fn run_simulation(&self, shutdown: &AtomicBool) {
        log::debug!("simulation loop started");
        while !shutdown.load(Ordering::Acquire) {
            if !self.wait_for_session(IDLE_POLL) {
                continue;
            }
            match self.tick() {
                TickStatus::DayComplete | TickStatus::NoSession => {}
                TickStatus::Stopped => self.wait_for_teardown(IDLE_POLL),
                TickStatus::Ended(end) => log::info!("journey finished: {end}"),
            }
        }
        log::debug!("simulation loop stopped");
    }

    /// Read-only access for rendering a frame.
    pub fn with_frame<T>(&self, render: impl FnOnce(&JourneySession) -> T) -> Option<T> {
        lock(&self.frame).as_ref().map(render)
    }

    /// Mutable access for operator commands between scheduler steps.
    pub fn with_session_mut<T>(&self, command: impl FnOnce(&mut JourneySession) -> T) -> Option<T> {
        lock(&self.frame).as_mut().map(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::{HeadlessPresenter, ScreenQueue};
    use crate::test_support::{MemoryStorage, fixture_assets, fixture_save};
    use std::thread;

    #[test]
    fn only_one_session_at_a_time() {
        let host = SessionHost::new(
            fixture_assets(),
            MemoryStorage::default(),
            Arc::new(HeadlessPresenter::new()),
        );
        host.start_session(fixture_save(2, 10.0), 1).unwrap();
        let err = host.start_session(fixture_save(2, 10.0), 2).unwrap_err();
        assert!(matches!(err, SessionError::AlreadyActive { .. }));
        host.end_session(false).unwrap();
        assert!(!host.is_active());
        host.start_session(fixture_save(2, 10.0), 2).unwrap();
    }

    #[test]
    fn torn_down_host_reports_no_session() {
        let host = SessionHost::new(
            fixture_assets(),
            MemoryStorage::default(),
            Arc::new(HeadlessPresenter::new()),
        );
        assert_eq!(host.tick(), TickStatus::NoSession);
        host.start_session(fixture_save(2, 10.0), 1).unwrap();
        host.halt();
        assert!(host.presenter().is_stopped());
        assert_eq!(host.tick(), TickStatus::NoSession);
        host.start_session(fixture_save(2, 10.0), 2).unwrap();
        host.end_session(false).unwrap();
        assert_eq!(host.tick(), TickStatus::NoSession);
    }

    #[test]
    fn live_session_with_a_pending_stop_reports_stopped() {
        let host = SessionHost::new(
            fixture_assets(),
            MemoryStorage::default(),
            Arc::new(HeadlessPresenter::new()),
        );
        host.start_session(fixture_save(2, 10.0), 1).unwrap();
        host.presenter().request_stop();
        assert_eq!(host.tick(), TickStatus::Stopped);
        assert!(host.is_active());
    }

    #[test]
    fn ending_with_save_stores_the_record() {
        let storage = MemoryStorage::default();
        let host = SessionHost::new(
            fixture_assets(),
            storage.clone(),
            Arc::new(HeadlessPresenter::new()),
        );
        host.start_session(fixture_save(3, 10.0), 1).unwrap();
        assert_eq!(host.tick(), TickStatus::DayComplete);
        let saved = host.end_session(true).unwrap().unwrap();
        assert_eq!(saved.members.len(), 3);
        assert!(storage.load(&saved.save_name).unwrap().is_some());
        assert_eq!(host.tick(), TickStatus::NoSession);
    }

    #[test]
    fn saving_needs_a_live_session() {
        let storage = MemoryStorage::default();
        let host = SessionHost::new(
            fixture_assets(),
            storage.clone(),
            Arc::new(HeadlessPresenter::new()),
        );
        assert!(matches!(host.save_session(), Err(SessionError::NoSession)));
        host.start_session(fixture_save(2, 10.0), 1).unwrap();
        let saved = host.save_session().unwrap();
        assert!(host.is_active());
        assert_eq!(storage.load(&saved.save_name).unwrap(), Some(saved));
    }

    #[test]
    fn saves_wait_for_the_day_boundary() {
        let storage = MemoryStorage::default();
        let host = SessionHost::new(
            fixture_assets(),
            storage.clone(),
            Arc::new(HeadlessPresenter::new()),
        );
        host.start_session(fixture_save(2, 10.0), 3).unwrap();
        let presenter = HeadlessPresenter::new();
        let state = host
            .with_session_mut(|session| {
                for _ in 0..4 {
                    if session.state() != JourneyState::AwaitingInput {
                        break;
                    }
                    let _ = session.advance(&presenter);
                }
                session.state()
            })
            .unwrap();
        assert_ne!(state, JourneyState::AwaitingInput);
        let err = host.save_session().unwrap_err();
        assert!(matches!(err, SessionError::DayInProgress { .. }));
        assert!(storage.load("fixture").unwrap().is_none());

        assert_eq!(host.tick(), TickStatus::DayComplete);
        let saved = host.save_session().unwrap();
        assert!(saved.mile > 0);
        assert_eq!(storage.load(&saved.save_name).unwrap(), Some(saved));
    }

    #[test]
    fn render_and_command_access_follow_the_session() {
        let host = SessionHost::new(
            fixture_assets(),
            MemoryStorage::default(),
            Arc::new(HeadlessPresenter::new()),
        );
        assert!(host.with_frame(|session| session.party().mile()).is_none());
        host.start_session(fixture_save(2, 10.0), 1).unwrap();
        host.with_session_mut(|session| session.party_mut().modify_mile(5));
        assert_eq!(host.with_frame(|session| session.party().mile()), Some(5));
        host.halt();
        assert!(host.with_frame(|session| session.party().mile()).is_none());
    }

    #[test]
    fn end_session_interrupts_a_blocked_tick() {
        let queue = Arc::new(ScreenQueue::new());
        let host = Arc::new(SessionHost::new(
            fixture_assets(),
            MemoryStorage::default(),
            Arc::clone(&queue),
        ));
        host.start_session(fixture_save(2, 10.0), 1).unwrap();
        let simulation = {
            let host = Arc::clone(&host);
            thread::spawn(move || host.tick())
        };
        while queue.is_empty() {
            thread::yield_now();
        }
        let mile = host.with_frame(|session| session.party().mile());
        host.end_session(false).unwrap();
        assert_eq!(simulation.join().unwrap(), TickStatus::Stopped);
        assert_eq!(mile, Some(0));
        assert!(!host.is_active());
        assert!(queue.is_empty());
    }
}
