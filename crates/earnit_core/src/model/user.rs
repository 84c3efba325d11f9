use crate::error::AppError;
use crate::model::task::{Task, TaskSpec};
use serde::{Deserialize, Serialize};

/// The account aggregate: identity, running totals and the ordered task list.
///
/// The balance is never stored on its own; it is always
/// `total_earned - total_spent`, so the two sides cannot drift apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    name: String,
    currency_symbol: String,
    total_earned: f64,
    total_spent: f64,
    tasks: Vec<Task>,
    #[serde(default)]
    next_task_id: u64,
}

impl User {
    pub fn new(name: &str, currency_symbol: &str) -> Result<Self, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::invalid_input("name is required"));
        }
        let currency_symbol = match currency_symbol.trim() {
            "" => "$",
            symbol => symbol,
        };

        Ok(Self {
            name: name.to_string(),
            currency_symbol: currency_symbol.to_string(),
            total_earned: 0.0,
            total_spent: 0.0,
            tasks: Vec::new(),
            next_task_id: 1,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn currency_symbol(&self) -> &str {
        &self.currency_symbol
    }

    pub fn balance(&self) -> f64 {
        self.total_earned - self.total_spent
    }

    pub fn total_earned(&self) -> f64 {
        self.total_earned
    }

    pub fn total_spent(&self) -> f64 {
        self.total_spent
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: &str) -> Result<&Task, AppError> {
        let id = id.trim();
        self.tasks
            .iter()
            .find(|task| task.id() == id)
            .ok_or_else(|| AppError::task_not_found(id))
    }

    fn task_mut(&mut self, id: &str) -> Result<&mut Task, AppError> {
        let id = id.trim();
        self.tasks
            .iter_mut()
            .find(|task| task.id() == id)
            .ok_or_else(|| AppError::task_not_found(id))
    }

    /// Appends a new task built from `spec` and returns it.
    pub fn add_task(&mut self, spec: &TaskSpec) -> Result<&Task, AppError> {
        let id = format!("task-{}", self.next_task_id.max(1));
        let task = Task::new(id, spec)?;
        self.next_task_id = self.next_task_id.max(1) + 1;
        self.tasks.push(task);
        Ok(&self.tasks[self.tasks.len() - 1])
    }

    pub fn edit_task(&mut self, id: &str, spec: &TaskSpec) -> Result<&Task, AppError> {
        let task = self.task_mut(id)?;
        task.edit(spec)?;
        Ok(&*task)
    }

    pub fn remove_task(&mut self, id: &str) -> Result<Task, AppError> {
        let id = id.trim();
        let index = self
            .tasks
            .iter()
            .position(|task| task.id() == id)
            .ok_or_else(|| AppError::task_not_found(id))?;
        Ok(self.tasks.remove(index))
    }

    /// Completes a task and credits its reward in one step.
    pub fn complete_task(&mut self, id: &str) -> Result<f64, AppError> {
        let reward = self.task_mut(id)?.complete()?;
        self.record_earning(reward)?;
        Ok(reward)
    }

    /// Credits an earning. Zero is allowed; totals never go down.
    pub fn record_earning(&mut self, amount: f64) -> Result<(), AppError> {
        if !amount.is_finite() {
            return Err(AppError::invalid_input("amount must be a number"));
        }
        if amount < 0.0 {
            return Err(AppError::invalid_input("amount cannot be negative"));
        }
        self.total_earned += amount;
        Ok(())
    }

    /// Records money spent. Overspending is allowed and drives the balance
    /// negative; only malformed amounts are rejected.
    pub fn record_spend(&mut self, amount: f64) -> Result<(), AppError> {
        if !amount.is_finite() {
            return Err(AppError::invalid_input("amount must be a number"));
        }
        if amount <= 0.0 {
            return Err(AppError::invalid_input("amount must be positive"));
        }
        self.total_spent += amount;
        Ok(())
    }

    pub(crate) fn check(&self) -> Result<(), String> {
        if !self.total_earned.is_finite() || !self.total_spent.is_finite() {
            return Err("totals must be finite".to_string());
        }
        if self.total_earned < 0.0 || self.total_spent < 0.0 {
            return Err("totals cannot be negative".to_string());
        }
        for (index, task) in self.tasks.iter().enumerate() {
            task.check()?;
            if self.tasks[..index].iter().any(|other| other.id() == task.id()) {
                return Err(format!("duplicate task id {}", task.id()));
            }
        }
        Ok(())
    }

    /// Restores the id counter past every stored id so new ids stay unique.
    pub(crate) fn reconcile_ids(&mut self) {
        let highest = self
            .tasks
            .iter()
            .filter_map(|task| task.id().strip_prefix("task-"))
            .filter_map(|suffix| suffix.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        self.next_task_id = self.next_task_id.max(highest + 1);
    }
}
