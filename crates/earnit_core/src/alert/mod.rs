//! Alert timing policy.
//!
//! The scheduler is polled by the front-end loop; it never fires on its own.
//! Once an alert fires it stays pending until a task completion acknowledges
//! it, which also restarts the countdown.

mod picker;

pub use picker::{RandomPicker, TaskPicker};

use crate::error::AppError;
use crate::model::Task;
use time::{Duration, OffsetDateTime};
use tracing::debug;

/// Longest accepted gap between alerts.
pub const MAX_INTERVAL: Duration = Duration::days(365);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub task_id: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertState {
    Disabled,
    Idle,
    Alerting { selected: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertScheduler {
    interval: Option<Duration>,
    last_alert: OffsetDateTime,
    state: AlertState,
}

impl AlertScheduler {
    pub fn new(interval: Option<Duration>, now: OffsetDateTime) -> Result<Self, AppError> {
        Self::restore(interval, now)
    }

    /// Rebuilds a scheduler from a stored interval and last alert time. A
    /// pending alert is never restored.
    pub fn restore(
        interval: Option<Duration>,
        last_alert: OffsetDateTime,
    ) -> Result<Self, AppError> {
        if let Some(interval) = interval {
            validate_interval(interval)?;
        }
        let state = match interval {
            Some(_) => AlertState::Idle,
            None => AlertState::Disabled,
        };
        Ok(Self {
            interval,
            last_alert,
            state,
        })
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    pub fn last_alert(&self) -> OffsetDateTime {
        self.last_alert
    }

    pub fn state(&self) -> &AlertState {
        &self.state
    }

    pub fn is_alerting(&self) -> bool {
        matches!(self.state, AlertState::Alerting { .. })
    }

    pub fn selected_task_id(&self) -> Option<&str> {
        match &self.state {
            AlertState::Alerting { selected } => selected.as_deref(),
            _ => None,
        }
    }

    /// `None` disables alerts. A new interval restarts the countdown from
    /// `now` and drops any pending alert.
    pub fn set_interval(
        &mut self,
        interval: Option<Duration>,
        now: OffsetDateTime,
    ) -> Result<(), AppError> {
        match interval {
            None => {
                self.interval = None;
                self.state = AlertState::Disabled;
            }
            Some(interval) => {
                validate_interval(interval)?;
                self.interval = Some(interval);
                self.last_alert = now;
                self.state = AlertState::Idle;
            }
        }
        debug!(interval_seconds = ?self.interval.map(|d| d.whole_seconds()), "alert interval set");
        Ok(())
    }

    /// Fires an alert once the interval has elapsed, highlighting one of the
    /// unfinished tasks. With nothing to pick the scheduler stays idle.
    pub fn tick(
        &mut self,
        now: OffsetDateTime,
        tasks: &[Task],
        picker: &mut dyn TaskPicker,
    ) -> Option<Alert> {
        if self.state != AlertState::Idle {
            return None;
        }
        let interval = self.interval?;
        if now - self.last_alert < interval {
            return None;
        }

        let candidates: Vec<&Task> = tasks.iter().filter(|task| !task.is_complete()).collect();
        let task = candidates.get(picker.pick(candidates.len())?)?;

        self.state = AlertState::Alerting {
            selected: Some(task.id().to_string()),
        };
        debug!(task_id = task.id(), "alert fired");
        Some(Alert {
            task_id: task.id().to_string(),
            description: task.description().to_string(),
        })
    }

    /// Clears a pending alert. Returns whether one was pending.
    pub fn acknowledge(&mut self, now: OffsetDateTime) -> bool {
        if !self.is_alerting() {
            return false;
        }
        self.last_alert = now;
        self.state = AlertState::Idle;
        debug!("alert acknowledged");
        true
    }

    /// Drops the highlight when the selected task goes away; the alert itself
    /// stays pending.
    pub fn forget_task(&mut self, task_id: &str) {
        if let AlertState::Alerting { selected } = &mut self.state
            && selected.as_deref() == Some(task_id)
        {
            *selected = None;
        }
    }

    /// Time left before the next alert, while the countdown is running. A
    /// last alert stamped in the future never stretches it past the interval.
    pub fn remaining(&self, now: OffsetDateTime) -> Option<Duration> {
        if self.state != AlertState::Idle {
            return None;
        }
        let interval = self.interval?;
        let left = interval
            .checked_sub(now - self.last_alert)
            .unwrap_or(Duration::ZERO);
        Some(left.clamp(Duration::ZERO, interval))
    }
}

fn validate_interval(interval: Duration) -> Result<(), AppError> {
    if !interval.is_positive() {
        return Err(AppError::invalid_input("alert interval must be positive"));
    }
    if interval > MAX_INTERVAL {
        return Err(AppError::invalid_input(format!(
            "alert interval must be at most {} days",
            MAX_INTERVAL.whole_days()
        )));
    }
    Ok(())
}
