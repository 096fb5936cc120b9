//! Timer-driven scheduler
//!
//! Three independent periodic tasks drive the [`CheckEngine`]:
//!
//! | Timer     | First fire                    | Period            | Action                  |
//! |-----------|-------------------------------|-------------------|-------------------------|
//! | check     | immediately                   | check interval    | `run_check()`           |
//! | tick      | one check interval from start | check interval    | increment tick counter  |
//! | heartbeat | next configured day/time      | heartbeat days    | `run_heartbeat()`       |
//!
//! Each task waits on its timer or the shutdown signal. A cycle that has
//! started always runs to completion; shutdown is observed between cycles
//! and takes priority over a timer that became due meanwhile.
//! Late ticks are skipped rather than burst.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, Days, NaiveDateTime, NaiveTime, Weekday};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::engine::CheckEngine;
use crate::error::{Error, Result};
use crate::state::CounterStore;

/// Next heartbeat instant strictly after `now`
///
/// Picks the coming `day` at `time` (possibly today). If that instant is not
/// in the future, the heartbeat period is added once. A period past the end
/// of the calendar yields [`NaiveDateTime::MAX`].
pub fn next_heartbeat(
    now: NaiveDateTime,
    day: Weekday,
    time: NaiveTime,
    interval_days: u64,
) -> NaiveDateTime {
    let days_ahead = (7 + day.num_days_from_monday() - now.weekday().num_days_from_monday()) % 7;
    let candidate = (now.date() + Days::new(u64::from(days_ahead))).and_time(time);

    if candidate > now {
        candidate
    } else {
        candidate
            .checked_add_days(Days::new(interval_days))
            .unwrap_or(NaiveDateTime::MAX)
    }
}

/// Starts and owns the periodic tasks
pub struct Scheduler;

impl Scheduler {
    /// Start all timers, anchoring the heartbeat to local wall-clock time
    pub fn start(engine: Arc<CheckEngine>) -> SchedulerHandle {
        Self::start_at(engine, chrono::Local::now().naive_local())
    }

    /// Start all timers with an explicit wall-clock `now`
    pub fn start_at(engine: Arc<CheckEngine>, now: NaiveDateTime) -> SchedulerHandle {
        let schedule = engine.schedule().clone();
        let check_period = schedule.check_interval();
        let heartbeat_period = schedule.heartbeat_interval();

        let next = next_heartbeat(
            now,
            schedule.heartbeat_day_of_week,
            schedule.heartbeat_time_of_day,
            schedule.heartbeat_interval_days,
        );
        let heartbeat_delay = (next - now).to_std().unwrap_or(Duration::ZERO);

        info!(
            "Scheduler starting: check every {} min, next heartbeat at {}",
            schedule.check_interval_minutes(),
            next
        );

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let start = Instant::now();

        let tasks = vec![
            tokio::spawn(check_loop(
                Arc::clone(&engine),
                check_period,
                shutdown_rx.clone(),
            )),
            tokio::spawn(tick_loop(
                Arc::clone(engine.counters()),
                start + check_period,
                check_period,
                shutdown_rx.clone(),
            )),
            tokio::spawn(heartbeat_loop(
                engine,
                start + heartbeat_delay,
                heartbeat_period,
                shutdown_rx,
            )),
        ];

        SchedulerHandle { shutdown_tx, tasks }
    }
}

/// Handle to the running timers
pub struct SchedulerHandle {
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl SchedulerHandle {
    /// Stop all timers and wait for any in-flight cycle to finish
    pub async fn shutdown(self) -> Result<()> {
        info!("Scheduler shutting down");
        // Receivers also stop when the sender is dropped, so a send error is harmless
        let _ = self.shutdown_tx.send(true);

        for task in self.tasks {
            task.await
                .map_err(|e| Error::scheduler(format!("Timer task failed: {}", e)))?;
        }

        info!("Scheduler stopped");
        Ok(())
    }
}

async fn check_loop(engine: Arc<CheckEngine>, period: Duration, mut shutdown: watch::Receiver<bool>) {
    let mut timer = tokio::time::interval(period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            _ = timer.tick() => {}
        }

        let outcome = engine.run_check().await;
        debug!("Check cycle finished: {:?}", outcome);
    }

    debug!("Check timer stopped");
}

async fn tick_loop(
    counters: Arc<CounterStore>,
    first: Instant,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut timer = tokio::time::interval_at(first, period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            _ = timer.tick() => {}
        }

        let ticks = counters.increment_check_ticks();
        debug!("Check tick {}", ticks);
    }

    debug!("Tick timer stopped");
}

async fn heartbeat_loop(
    engine: Arc<CheckEngine>,
    first: Instant,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut timer = tokio::time::interval_at(first, period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            _ = timer.tick() => {}
        }

        engine.run_heartbeat().await;
    }

    debug!("Heartbeat timer stopped");
}
