//! Session scheduler for the exchange trading day.
//!
//! Triggers are cron expressions read in the exchange's local time. Every
//! poll converts the current instant into the exchange zone and fires entries
//! with an occurrence inside the current minute, at most once per minute each.
//!
//! # IDX sessions (Asia/Jakarta)
//!
//! - before 09:00: pre-open
//! - 09:00-12:00: session 1
//! - 12:00-14:50: session 2
//! - 14:50-16:00: closing
//! - from 16:00: post-close
//!
//! # Trigger configuration
//!
//! ```toml
//! [[schedule.triggers]]
//! cron = "0 50 14 * * *"
//! mode = "BSJP"
//!
//! [[schedule.triggers]]
//! cron = "0 45 9 * * *"
//! mode = "MOMENTUM"
//! session = 1
//! ```

use crate::config::{ScheduleConfig, TriggerConfig};
use crate::core::engine::ScanOrchestrator;
use crate::types::{ScanMode, ScanParams, ScanRun};
use anyhow::{Context, Result};
use chrono::{
    DateTime, Datelike, Duration as ChronoDuration, Local, NaiveDate, NaiveDateTime, NaiveTime,
    TimeZone, Timelike, Utc, Weekday,
};
use chrono_tz::Tz;
use cron::Schedule as CronSchedule;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{info, warn};

/// Upper bound on occurrences listed per entry and day.
const MAX_TIMES_PER_DAY: usize = 1_440;

/// Part of the exchange day a trigger falls in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionSlot {
    PreOpen,
    Session1,
    Session2,
    Close,
    PostClose,
}

impl SessionSlot {
    pub fn of(time: NaiveTime) -> Self {
        let at = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap_or(NaiveTime::MIN);
        if time < at(9, 0) {
            SessionSlot::PreOpen
        } else if time < at(12, 0) {
            SessionSlot::Session1
        } else if time < at(14, 50) {
            SessionSlot::Session2
        } else if time < at(16, 0) {
            SessionSlot::Close
        } else {
            SessionSlot::PostClose
        }
    }
}

impl fmt::Display for SessionSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionSlot::PreOpen => "pre-open",
            SessionSlot::Session1 => "session 1",
            SessionSlot::Session2 => "session 2",
            SessionSlot::Close => "close",
            SessionSlot::PostClose => "post-close",
        };
        f.write_str(name)
    }
}

/// A parsed trigger with the scan it starts.
#[derive(Debug, Clone)]
pub struct ScheduleEntry {
    pub expression: String,
    pub mode: ScanMode,
    pub params: ScanParams,
    cron: CronSchedule,
}

impl ScheduleEntry {
    pub fn parse(expression: &str, mode: ScanMode, params: ScanParams) -> Result<Self> {
        let cron = CronSchedule::from_str(expression)
            .with_context(|| format!("Invalid {mode} trigger cron: {expression}"))?;
        Ok(Self {
            expression: expression.to_string(),
            mode,
            params,
            cron,
        })
    }

    pub fn from_config(trigger: &TriggerConfig) -> Result<Self> {
        Self::parse(
            &trigger.cron,
            trigger.mode,
            ScanParams {
                session: trigger.session,
            },
        )
    }

    /// Exchange-local occurrences on `date`, in order.
    pub fn times_on(&self, tz: Tz, date: NaiveDate) -> Vec<NaiveTime> {
        let Some(midnight) = tz.from_local_datetime(&date.and_time(NaiveTime::MIN)).earliest() else {
            return Vec::new();
        };
        self.cron
            .after(&(midnight - ChronoDuration::seconds(1)))
            .take_while(|at| at.date_naive() == date)
            .take(MAX_TIMES_PER_DAY)
            .map(|at| at.time())
            .collect()
    }

    /// Whether an occurrence falls inside the minute starting at `minute`.
    fn fires_within(&self, minute: &DateTime<Tz>) -> bool {
        let end = *minute + ChronoDuration::minutes(1);
        self.cron
            .after(&(*minute - ChronoDuration::seconds(1)))
            .next()
            .is_some_and(|at| at < end)
    }
}

/// An entry that came due on a poll.
#[derive(Debug, Clone, PartialEq)]
pub struct Trigger {
    /// Exchange-local minute it fired in.
    pub at: NaiveTime,
    pub mode: ScanMode,
    pub params: ScanParams,
    pub slot: SessionSlot,
}

/// `at` on `date` in the exchange zone, shown on the host clock.
pub fn host_time(tz: Tz, date: NaiveDate, at: NaiveTime) -> Option<NaiveTime> {
    tz.from_local_datetime(&date.and_time(at))
        .earliest()
        .map(|exchange| exchange.with_timezone(&Local).time())
}

/// Trigger table plus the last-fired-minute guard.
pub struct Schedule {
    tz: Tz,
    trading_days: Vec<Weekday>,
    entries: Vec<ScheduleEntry>,
    last_fired: HashMap<usize, NaiveDateTime>,
}

impl Schedule {
    /// Logs every trigger of the current exchange day next to its host-clock time.
    pub fn new(tz: Tz, trading_days: Vec<Weekday>, entries: Vec<ScheduleEntry>) -> Self {
        let today = Utc::now().with_timezone(&tz).date_naive();
        for entry in &entries {
            for at in entry.times_on(tz, today) {
                match host_time(tz, today, at) {
                    Some(host) => info!(
                        mode = %entry.mode,
                        exchange_time = %at.format("%H:%M"),
                        host_time = %host.format("%H:%M"),
                        slot = %SessionSlot::of(at),
                        "Scheduled"
                    ),
                    None => warn!(
                        mode = %entry.mode,
                        exchange_time = %at.format("%H:%M"),
                        "Trigger does not exist on the host clock today"
                    ),
                }
            }
        }

        Self {
            tz,
            trading_days,
            entries,
            last_fired: HashMap::new(),
        }
    }

    pub fn from_config(config: &ScheduleConfig) -> Result<Self> {
        let tz = config.exchange_tz()?;
        let entries = config
            .triggers
            .iter()
            .map(ScheduleEntry::from_config)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(tz, config.trading_days.clone(), entries))
    }

    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.entries
    }

    /// Entries with an occurrence in the exchange-local minute of `now` that
    /// have not fired in that minute yet.
    pub fn due(&mut self, now: DateTime<Utc>) -> Vec<Trigger> {
        let local = now.with_timezone(&self.tz);
        if !self.trading_days.contains(&local.weekday()) {
            return Vec::new();
        }

        let Some(minute_naive) = local
            .naive_local()
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
        else {
            return Vec::new();
        };
        let Some(minute) = self.tz.from_local_datetime(&minute_naive).earliest() else {
            return Vec::new();
        };

        let mut due = Vec::new();
        for (idx, entry) in self.entries.iter().enumerate() {
            if !entry.fires_within(&minute) {
                continue;
            }
            if self.last_fired.get(&idx) == Some(&minute_naive) {
                continue;
            }
            self.last_fired.insert(idx, minute_naive);
            due.push(Trigger {
                at: minute_naive.time(),
                mode: entry.mode,
                params: entry.params.clone(),
                slot: SessionSlot::of(minute_naive.time()),
            });
        }
        due
    }

    /// Slot for the exchange-local time of `now`.
    pub fn slot_at(&self, now: DateTime<Utc>) -> SessionSlot {
        SessionSlot::of(now.with_timezone(&self.tz).time())
    }
}

/// Text announced once at process start.
pub fn startup_notice(schedule: &Schedule) -> String {
    let today = Utc::now().with_timezone(&schedule.tz).date_naive();
    let days: Vec<String> = schedule
        .trading_days
        .iter()
        .map(|day| day.to_string())
        .collect();

    let mut lines = vec![
        "🤖 *IDX screener active*".to_string(),
        format!("Schedule ({}, {}):", schedule.tz, days.join(" ")),
    ];
    for mode in ScanMode::ALL {
        let mut times: Vec<NaiveTime> = schedule
            .entries
            .iter()
            .filter(|entry| entry.mode == mode)
            .flat_map(|entry| entry.times_on(schedule.tz, today))
            .collect();
        times.sort();
        times.dedup();
        if !times.is_empty() {
            let times: Vec<String> = times.iter().map(|t| t.format("%H:%M").to_string()).collect();
            lines.push(format!("• {mode}: {}", times.join(", ")));
        }
    }
    lines.join("\n")
}

/// Polls the schedule and runs due scans inline, so at most one scan is
/// ever active.
pub struct SessionScheduler {
    schedule: Schedule,
    orchestrator: ScanOrchestrator,
    poll: Duration,
    heartbeat: Duration,
}

impl SessionScheduler {
    pub fn new(
        schedule: Schedule,
        orchestrator: ScanOrchestrator,
        poll: Duration,
        heartbeat: Duration,
    ) -> Self {
        Self {
            schedule,
            orchestrator,
            poll,
            heartbeat,
        }
    }

    /// Runs every entry due at `now`, in table order.
    pub async fn tick(&mut self, now: DateTime<Utc>) -> Vec<ScanRun> {
        let mut runs = Vec::new();
        for trigger in self.schedule.due(now) {
            info!(
                mode = %trigger.mode,
                session = ?trigger.params.session,
                at = %trigger.at.format("%H:%M"),
                slot = %trigger.slot,
                "Trigger fired"
            );
            runs.push(self.orchestrator.run(trigger.mode, &trigger.params).await);
        }
        runs
    }

    pub async fn run(mut self) {
        let mut ticker = interval(self.poll);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last_beat: Option<Instant> = None;

        info!(
            poll = ?self.poll,
            heartbeat = ?self.heartbeat,
            timezone = %self.schedule.tz,
            triggers = self.schedule.entries().len(),
            "Scheduler running"
        );

        loop {
            ticker.tick().await;
            let now = Utc::now();

            if last_beat.map_or(true, |beat| beat.elapsed() >= self.heartbeat) {
                info!(
                    exchange_time = %now.with_timezone(&self.schedule.tz).format("%a %H:%M:%S"),
                    slot = %self.schedule.slot_at(now),
                    "Heartbeat"
                );
                last_beat = Some(Instant::now());
            }

            self.tick(now).await;
        }
    }
}
