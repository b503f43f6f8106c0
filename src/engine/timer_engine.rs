//! Countdown state machine

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
    time::Duration,
};
use tokio::{
    sync::{broadcast, watch},
    time::Instant,
};
use tracing::{debug, info};

use super::TimerEvent;
use crate::{
    state::{DurationFields, TimerPhase, TimerSnapshot},
    tasks::{TaskHandle, TickScheduler},
    utils::Observable,
};

/// Delay between `start()` and the countdown actually running
pub const START_DELAY: Duration = Duration::from_millis(2000);
/// Cadence of remaining-time updates while running
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);
/// Duration a freshly constructed engine counts down from
pub const DEFAULT_DURATION: DurationFields = match DurationFields::new(0, 0, 6) {
    Some(fields) => fields,
    None => panic!("default duration out of range"),
};
pub const DEFAULT_DURATION_MS: u64 = DEFAULT_DURATION.total_millis();

const EVENT_CAPACITY: usize = 256;

/// Mutable countdown state, only touched under the engine lock
#[derive(Debug)]
struct Countdown {
    fields: DurationFields,
    duration_ms: u64,
    remaining_ms: u64,
    /// Duration frozen at the last `start()`
    target_ms: u64,
    phase: TimerPhase,
    /// Bumped on every start/stop; callbacks from older sequences are ignored
    generation: u64,
    running_since: Option<Instant>,
    handle: Option<TaskHandle>,
}

impl Countdown {
    fn cancel_active(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.cancel();
        }
        self.running_since = None;
        self.generation += 1;
    }

    fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            phase: self.phase,
            duration_ms: self.duration_ms,
            remaining_ms: self.remaining_ms,
            target_ms: self.target_ms,
        }
    }
}

#[derive(Debug)]
struct Shared {
    countdown: Mutex<Countdown>,
    scheduler: TickScheduler,
    phase_tx: Observable<TimerPhase>,
    remaining_tx: Observable<u64>,
    duration_tx: Observable<u64>,
    events_tx: broadcast::Sender<TimerEvent>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Countdown> {
        // Every mutation is a plain field store, so a poisoned guard is still consistent
        self.countdown.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: TimerEvent) {
        // An error only means nobody is listening right now
        let _ = self.events_tx.send(event);
    }

    fn set_phase(&self, countdown: &mut Countdown, phase: TimerPhase) {
        countdown.phase = phase;
        self.phase_tx.publish(phase);
        self.emit(TimerEvent::PhaseChanged(phase));
    }

    fn set_remaining(&self, countdown: &mut Countdown, remaining_ms: u64) {
        countdown.remaining_ms = remaining_ms;
        self.remaining_tx.publish(remaining_ms);
        self.emit(TimerEvent::RemainingTimeChanged(remaining_ms));
    }

    fn apply_fields(&self, countdown: &mut Countdown, fields: DurationFields) {
        let duration_ms = fields.total_millis();
        countdown.fields = fields;
        countdown.duration_ms = duration_ms;
        self.duration_tx.publish(duration_ms);
        self.emit(TimerEvent::DurationChanged(duration_ms));

        info!(
            "Duration set to {}h {}m {}s ({} ms)",
            fields.hours(),
            fields.minutes(),
            fields.seconds(),
            duration_ms
        );
    }

    fn on_start_delay_elapsed(self: &Arc<Self>, generation: u64) {
        let mut countdown = self.lock();
        if countdown.generation != generation || countdown.phase != TimerPhase::Starting {
            debug!("Ignoring stale start delay (generation {})", generation);
            return;
        }

        countdown.running_since = Some(Instant::now());
        self.set_phase(&mut countdown, TimerPhase::Running);
        info!("Countdown running from {} ms", countdown.target_ms);

        let weak = Arc::downgrade(self);
        countdown.handle = Some(self.scheduler.schedule_repeating(TICK_INTERVAL, move || {
            if let Some(shared) = weak.upgrade() {
                shared.on_tick(generation);
            }
        }));
    }

    fn on_tick(&self, generation: u64) {
        let mut countdown = self.lock();
        if countdown.generation != generation || countdown.phase != TimerPhase::Running {
            return;
        }

        let elapsed = countdown
            .running_since
            .map(|since| since.elapsed())
            .unwrap_or_default();
        let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        // Never let a late clock reading push the value back up
        let remaining = countdown
            .target_ms
            .saturating_sub(elapsed_ms)
            .min(countdown.remaining_ms);

        if remaining == 0 {
            if let Some(handle) = countdown.handle.take() {
                handle.cancel();
            }
            countdown.running_since = None;
            self.set_remaining(&mut countdown, 0);
            self.set_phase(&mut countdown, TimerPhase::Finished);
            info!("Countdown finished");
        } else {
            debug!("Tick: {} ms remaining", remaining);
            self.set_remaining(&mut countdown, remaining);
        }
    }
}

/// Owns the countdown configuration and progress, and publishes every change.
///
/// Commands may be issued from any thread; scheduled callbacks serialise with
/// them on an internal lock. Dropping the engine cancels any scheduled work.
#[derive(Debug)]
pub struct TimerEngine {
    shared: Arc<Shared>,
}

impl TimerEngine {
    /// Create an engine with the default duration
    pub fn new(scheduler: TickScheduler) -> Self {
        Self::with_duration(scheduler, DEFAULT_DURATION)
    }

    /// Create an engine counting down from `fields`
    pub fn with_duration(scheduler: TickScheduler, fields: DurationFields) -> Self {
        let (events_tx, _) = broadcast::channel(EVENT_CAPACITY);
        let duration_ms = fields.total_millis();
        let countdown = Countdown {
            fields,
            duration_ms,
            remaining_ms: duration_ms,
            target_ms: duration_ms,
            phase: TimerPhase::Idle,
            generation: 0,
            running_since: None,
            handle: None,
        };

        Self {
            shared: Arc::new(Shared {
                countdown: Mutex::new(countdown),
                scheduler,
                phase_tx: Observable::new(TimerPhase::Idle),
                remaining_tx: Observable::new(duration_ms),
                duration_tx: Observable::new(duration_ms),
                events_tx,
            }),
        }
    }

    /// Set the duration from hours, minutes and seconds.
    ///
    /// Input with any component out of range (hours over 99, minutes or
    /// seconds over 60) is ignored and `false` is returned. A countdown
    /// already in flight keeps its target; the next `start()` picks up the
    /// new duration.
    pub fn configure(&self, hours: u32, minutes: u32, seconds: u32) -> bool {
        let Some(fields) = DurationFields::new(hours, minutes, seconds) else {
            debug!("Ignoring out-of-range duration {}h {}m {}s", hours, minutes, seconds);
            return false;
        };

        let mut countdown = self.shared.lock();
        self.shared.apply_fields(&mut countdown, fields);
        true
    }

    /// Change only the hours field, keeping the remembered minutes and seconds
    pub fn set_hours(&self, hours: u32) -> bool {
        self.set_fields(Some(hours), None, None)
    }

    /// Change only the minutes field, keeping the remembered hours and seconds
    pub fn set_minutes(&self, minutes: u32) -> bool {
        self.set_fields(None, Some(minutes), None)
    }

    /// Change only the seconds field, keeping the remembered hours and minutes
    pub fn set_seconds(&self, seconds: u32) -> bool {
        self.set_fields(None, None, Some(seconds))
    }

    /// Change any subset of the fields at once. Nothing changes unless the
    /// combined result is in range.
    pub fn set_fields(&self, hours: Option<u32>, minutes: Option<u32>, seconds: Option<u32>) -> bool {
        let mut countdown = self.shared.lock();
        let current = countdown.fields;
        let hours = hours.unwrap_or(current.hours());
        let minutes = minutes.unwrap_or(current.minutes());
        let seconds = seconds.unwrap_or(current.seconds());

        match DurationFields::new(hours, minutes, seconds) {
            Some(fields) => {
                self.shared.apply_fields(&mut countdown, fields);
                true
            }
            None => {
                debug!("Ignoring out-of-range duration fields {}h {}m {}s", hours, minutes, seconds);
                false
            }
        }
    }

    /// Begin a new countdown sequence, cancelling any sequence in flight
    pub fn start(&self) {
        let mut countdown = self.shared.lock();
        countdown.cancel_active();
        let generation = countdown.generation;

        let target_ms = countdown.duration_ms;
        countdown.target_ms = target_ms;
        self.shared.set_remaining(&mut countdown, target_ms);
        self.shared.set_phase(&mut countdown, TimerPhase::Starting);
        info!("Starting countdown of {} ms", target_ms);

        let weak: Weak<Shared> = Arc::downgrade(&self.shared);
        countdown.handle = Some(self.shared.scheduler.schedule_once(START_DELAY, move || {
            if let Some(shared) = weak.upgrade() {
                shared.on_start_delay_elapsed(generation);
            }
        }));
    }

    /// Cancel the countdown in flight, if any, and enter `Stopped`.
    ///
    /// When this returns no further event from the cancelled sequence will be
    /// published.
    pub fn stop(&self) {
        let mut countdown = self.shared.lock();
        let was = countdown.phase;
        countdown.cancel_active();
        self.shared.set_phase(&mut countdown, TimerPhase::Stopped);
        info!("Countdown stopped (was {})", was);
    }

    /// Cancel scheduled work without publishing anything
    pub fn shutdown(&self) {
        let mut countdown = self.shared.lock();
        if countdown.handle.is_some() {
            debug!("Shutting down timer engine with a countdown in flight");
        }
        countdown.cancel_active();
    }

    pub fn phase(&self) -> TimerPhase {
        self.shared.lock().phase
    }

    pub fn remaining_ms(&self) -> u64 {
        self.shared.lock().remaining_ms
    }

    pub fn duration_ms(&self) -> u64 {
        self.shared.lock().duration_ms
    }

    /// Hours, minutes and seconds last accepted
    pub fn fields(&self) -> DurationFields {
        self.shared.lock().fields
    }

    /// Current values of everything the engine publishes
    pub fn snapshot(&self) -> TimerSnapshot {
        self.shared.lock().snapshot()
    }

    /// Attach to the ordered event stream, along with a snapshot taken
    /// atomically with the subscription
    pub fn subscribe(&self) -> (TimerSnapshot, broadcast::Receiver<TimerEvent>) {
        let countdown = self.shared.lock();
        (countdown.snapshot(), self.shared.events_tx.subscribe())
    }

    /// Attach to the ordered event stream only
    pub fn subscribe_events(&self) -> broadcast::Receiver<TimerEvent> {
        self.shared.events_tx.subscribe()
    }

    pub fn watch_phase(&self) -> watch::Receiver<TimerPhase> {
        self.shared.phase_tx.subscribe()
    }

    pub fn watch_remaining(&self) -> watch::Receiver<u64> {
        self.shared.remaining_tx.subscribe()
    }

    pub fn watch_duration(&self) -> watch::Receiver<u64> {
        self.shared.duration_tx.subscribe()
    }
}

impl Drop for TimerEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    fn engine() -> TimerEngine {
        TimerEngine::new(TickScheduler::current())
    }

    #[tokio::test]
    async fn new_engine_is_idle_with_default_duration() {
        let engine = engine();
        let snapshot = engine.snapshot();

        assert_eq!(snapshot.phase, TimerPhase::Idle);
        assert_eq!(snapshot.duration_ms, DEFAULT_DURATION_MS);
        assert_eq!(snapshot.remaining_ms, DEFAULT_DURATION_MS);
        assert_eq!(engine.fields(), DEFAULT_DURATION);
    }

    #[tokio::test]
    async fn per_field_updates_keep_other_fields() {
        let engine = engine();
        assert!(engine.configure(1, 2, 3));

        assert!(engine.set_minutes(30));
        assert_eq!(engine.fields(), DurationFields::new(1, 30, 3).unwrap());
        assert_eq!(engine.duration_ms(), (3600 + 30 * 60 + 3) * 1000);

        assert!(!engine.set_seconds(61));
        assert!(!engine.set_hours(100));
        assert_eq!(engine.duration_ms(), (3600 + 30 * 60 + 3) * 1000);

        assert!(engine.set_hours(0));
        assert_eq!(engine.duration_ms(), (30 * 60 + 3) * 1000);
    }

    #[tokio::test]
    async fn constructed_fields_match_duration_and_stay_editable() {
        let longest = DurationFields::new(99, 60, 60).unwrap();
        let engine = TimerEngine::with_duration(TickScheduler::current(), longest);

        assert_eq!(engine.fields(), longest);
        assert_eq!(engine.duration_ms(), longest.total_millis());
        assert_eq!(engine.remaining_ms(), longest.total_millis());

        assert!(engine.set_seconds(5));
        assert_eq!(engine.fields(), DurationFields::new(99, 60, 5).unwrap());
        assert_eq!(engine.duration_ms(), (99 * 3600 + 60 * 60 + 5) * 1000);

        // Editing a field that already holds its value keeps the duration
        assert!(engine.set_hours(99));
        assert_eq!(engine.duration_ms(), engine.fields().total_millis());
    }

    #[tokio::test(start_paused = true)]
    async fn configure_while_starting_does_not_change_target() {
        let engine = engine();
        engine.configure(0, 0, 3);
        engine.start();

        sleep(Duration::from_millis(1000)).await;
        assert!(engine.configure(0, 0, 10));
        assert_eq!(engine.phase(), TimerPhase::Starting);

        sleep(Duration::from_millis(1050)).await;
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.phase, TimerPhase::Running);
        assert_eq!(snapshot.remaining_ms, 3000);
        assert_eq!(snapshot.target_ms, 3000);
        assert_eq!(snapshot.duration_ms, 10_000);

        sleep(Duration::from_millis(3000)).await;
        assert_eq!(engine.phase(), TimerPhase::Finished);
        assert_eq!(engine.remaining_ms(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn configure_mid_run_does_not_change_target() {
        let engine = engine();
        engine.configure(0, 0, 3);
        engine.start();

        sleep(Duration::from_millis(2050)).await;
        engine.configure(0, 1, 0);
        assert_eq!(engine.duration_ms(), 60_000);

        sleep(Duration::from_millis(3000)).await;
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.phase, TimerPhase::Finished);
        assert_eq!(snapshot.target_ms, 3000);
        assert_eq!(snapshot.remaining_ms, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_generation_callbacks_are_ignored() {
        let engine = engine();
        engine.start();
        let stale = engine.shared.lock().generation;
        engine.stop();

        engine.shared.on_start_delay_elapsed(stale);
        engine.shared.on_tick(stale);
        assert_eq!(engine.phase(), TimerPhase::Stopped);
        assert_eq!(engine.remaining_ms(), DEFAULT_DURATION_MS);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_engine_cancels_schedule() {
        let engine = engine();
        let mut phase = engine.watch_phase();
        engine.start();
        assert_eq!(*phase.borrow_and_update(), TimerPhase::Starting);

        drop(engine);
        sleep(Duration::from_secs(5)).await;

        // The sender is gone with the engine, and nothing was published after Starting
        assert!(phase.has_changed().is_err());
        assert_eq!(*phase.borrow(), TimerPhase::Starting);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_duration_finishes_on_first_tick() {
        let engine = engine();
        engine.configure(0, 0, 0);
        engine.start();

        sleep(Duration::from_millis(2150)).await;
        assert_eq!(engine.phase(), TimerPhase::Finished);
        assert_eq!(engine.remaining_ms(), 0);
    }
}
