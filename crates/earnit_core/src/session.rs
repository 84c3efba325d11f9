use crate::alert::{Alert, AlertScheduler, AlertState, TaskPicker};
use crate::error::AppError;
use crate::model::{Task, TaskSpec, User};
use crate::storage::AccountStore;
use serde::Serialize;
use time::{Duration, OffsetDateTime};
use tracing::{debug, info};

/// A single request from a front-end.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    CreateTask(TaskSpec),
    EditTask { id: String, spec: TaskSpec },
    RemoveTask { id: String },
    CompleteTask { id: String },
    RecordSpend { amount: f64 },
    SetAlertInterval(Option<Duration>),
    Snapshot,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub task: Task,
    pub reward: f64,
    pub acknowledged_alert: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Created(Task),
    Edited(Task),
    Removed(Task),
    Completed(Completion),
    Spent { amount: f64, balance: f64 },
    IntervalSet(Option<Duration>),
    Snapshot(Snapshot),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AlertStatus {
    Disabled,
    Idle {
        interval_seconds: i64,
        seconds_remaining: i64,
    },
    Alerting {
        selected_task_id: Option<String>,
    },
}

/// Everything a front-end needs to render one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub name: String,
    pub currency_symbol: String,
    pub balance: f64,
    pub total_earned: f64,
    pub total_spent: f64,
    pub tasks: Vec<Task>,
    pub alert: AlertStatus,
}

impl Snapshot {
    pub fn selected_task_id(&self) -> Option<&str> {
        match &self.alert {
            AlertStatus::Alerting { selected_task_id } => selected_task_id.as_deref(),
            _ => None,
        }
    }
}

/// The one live account. Every successful mutation is written back to the
/// store before returning.
pub struct Session {
    user: User,
    alert: AlertScheduler,
    store: AccountStore,
    picker: Box<dyn TaskPicker>,
}

impl Session {
    pub fn new(
        user: User,
        alert: AlertScheduler,
        store: AccountStore,
        picker: Box<dyn TaskPicker>,
    ) -> Self {
        Self {
            user,
            alert,
            store,
            picker,
        }
    }

    /// Creates and saves a brand new account. Refuses to overwrite one.
    pub fn enroll(
        store: AccountStore,
        name: &str,
        currency_symbol: &str,
        interval: Option<Duration>,
        now: OffsetDateTime,
        picker: Box<dyn TaskPicker>,
    ) -> Result<Self, AppError> {
        if store.exists() {
            return Err(AppError::invalid_input(format!(
                "an account already exists at {}",
                store.path().display()
            )));
        }

        let user = User::new(name, currency_symbol)?;
        let alert = AlertScheduler::new(interval, now)?;
        let session = Self::new(user, alert, store, picker);
        session.save()?;
        info!(name = session.user.name(), "account created");
        Ok(session)
    }

    /// Loads the stored account, or `None` on first run.
    pub fn open(
        store: AccountStore,
        now: OffsetDateTime,
        picker: Box<dyn TaskPicker>,
    ) -> Result<Option<Self>, AppError> {
        Ok(store
            .load(now)?
            .map(|account| Self::new(account.user, account.alert, store, picker)))
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn alert(&self) -> &AlertScheduler {
        &self.alert
    }

    pub fn store(&self) -> &AccountStore {
        &self.store
    }

    pub fn create_task(&mut self, spec: &TaskSpec) -> Result<Task, AppError> {
        let task = self.commit(|user, _| Ok(user.add_task(spec)?.clone()))?;
        debug!(task_id = task.id(), "task created");
        Ok(task)
    }

    pub fn edit_task(&mut self, id: &str, spec: &TaskSpec) -> Result<Task, AppError> {
        let task = self.commit(|user, _| Ok(user.edit_task(id, spec)?.clone()))?;
        debug!(task_id = task.id(), "task edited");
        Ok(task)
    }

    pub fn remove_task(&mut self, id: &str) -> Result<Task, AppError> {
        let task = self.commit(|user, alert| {
            let task = user.remove_task(id)?;
            alert.forget_task(task.id());
            Ok(task)
        })?;
        debug!(task_id = task.id(), "task removed");
        Ok(task)
    }

    /// Completes a task, credits its reward and clears any pending alert.
    pub fn complete_task(&mut self, id: &str, now: OffsetDateTime) -> Result<Completion, AppError> {
        let completion = self.commit(|user, alert| {
            let reward = user.complete_task(id)?;
            let acknowledged_alert = alert.acknowledge(now);
            Ok(Completion {
                task: user.task(id)?.clone(),
                reward,
                acknowledged_alert,
            })
        })?;
        debug!(
            task_id = completion.task.id(),
            reward = completion.reward,
            acknowledged_alert = completion.acknowledged_alert,
            "task completed"
        );
        Ok(completion)
    }

    /// Returns the balance after the spend.
    pub fn record_spend(&mut self, amount: f64) -> Result<f64, AppError> {
        let balance = self.commit(|user, _| {
            user.record_spend(amount)?;
            Ok(user.balance())
        })?;
        debug!(amount, balance, "spend recorded");
        Ok(balance)
    }

    pub fn set_alert_interval(
        &mut self,
        interval: Option<Duration>,
        now: OffsetDateTime,
    ) -> Result<(), AppError> {
        self.commit(|_, alert| alert.set_interval(interval, now))
    }

    /// Polled once per front-end loop iteration.
    pub fn tick(&mut self, now: OffsetDateTime) -> Option<Alert> {
        self.alert
            .tick(now, self.user.tasks(), self.picker.as_mut())
    }

    pub fn snapshot(&self, now: OffsetDateTime) -> Snapshot {
        let alert = match (self.alert.state(), self.alert.interval()) {
            (AlertState::Alerting { selected }, _) => AlertStatus::Alerting {
                selected_task_id: selected.clone(),
            },
            (AlertState::Idle, Some(interval)) => AlertStatus::Idle {
                interval_seconds: interval.whole_seconds(),
                seconds_remaining: self
                    .alert
                    .remaining(now)
                    .map_or(0, |remaining| remaining.whole_seconds()),
            },
            _ => AlertStatus::Disabled,
        };

        Snapshot {
            name: self.user.name().to_string(),
            currency_symbol: self.user.currency_symbol().to_string(),
            balance: self.user.balance(),
            total_earned: self.user.total_earned(),
            total_spent: self.user.total_spent(),
            tasks: self.user.tasks().to_vec(),
            alert,
        }
    }

    pub fn dispatch(&mut self, intent: Intent, now: OffsetDateTime) -> Result<Outcome, AppError> {
        match intent {
            Intent::CreateTask(spec) => self.create_task(&spec).map(Outcome::Created),
            Intent::EditTask { id, spec } => self.edit_task(&id, &spec).map(Outcome::Edited),
            Intent::RemoveTask { id } => self.remove_task(&id).map(Outcome::Removed),
            Intent::CompleteTask { id } => self.complete_task(&id, now).map(Outcome::Completed),
            Intent::RecordSpend { amount } => self
                .record_spend(amount)
                .map(|balance| Outcome::Spent { amount, balance }),
            Intent::SetAlertInterval(interval) => {
                self.set_alert_interval(interval, now)?;
                Ok(Outcome::IntervalSet(interval))
            }
            Intent::Snapshot => Ok(Outcome::Snapshot(self.snapshot(now))),
        }
    }

    fn save(&self) -> Result<(), AppError> {
        self.store.save(&self.user, &self.alert)
    }

    /// Applies `change` to copies of the account and scheduler and keeps
    /// them only once they are on disk. A rejected change or a failed save
    /// leaves the session as it was.
    fn commit<T, F>(&mut self, change: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut User, &mut AlertScheduler) -> Result<T, AppError>,
    {
        let mut user = self.user.clone();
        let mut alert = self.alert.clone();
        let value = change(&mut user, &mut alert)?;
        self.store.save(&user, &alert)?;
        self.user = user;
        self.alert = alert;
        Ok(value)
    }
}
