use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How many times a task may be completed before it is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Repetitions {
    Bounded(u32),
    Unbounded,
}

impl Repetitions {
    pub fn limit(self) -> Option<u32> {
        match self {
            Self::Bounded(limit) => Some(limit),
            Self::Unbounded => None,
        }
    }
}

impl FromStr for Repetitions {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "-1" | "inf" | "unbounded" => Ok(Self::Unbounded),
            other => match other.parse::<u32>() {
                Ok(0) => Err(AppError::invalid_input(
                    "total must be at least 1 (use -1 for unbounded)",
                )),
                Ok(limit) => Ok(Self::Bounded(limit)),
                Err(_) => Err(AppError::invalid_input(format!(
                    "invalid total '{trimmed}'"
                ))),
            },
        }
    }
}

impl fmt::Display for Repetitions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bounded(limit) => write!(f, "{limit}"),
            Self::Unbounded => f.write_str("unbounded"),
        }
    }
}

/// Creation and edit input for a task. `decay_steps == 0` means the reward
/// never changes and `floor_reward` is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub description: String,
    pub total: Repetitions,
    pub start_reward: f64,
    pub floor_reward: f64,
    pub decay_steps: u32,
}

impl TaskSpec {
    pub fn constant<D: Into<String>>(description: D, total: Repetitions, reward: f64) -> Self {
        Self {
            description: description.into(),
            total,
            start_reward: reward,
            floor_reward: reward,
            decay_steps: 0,
        }
    }

    pub fn decaying<D: Into<String>>(
        description: D,
        total: Repetitions,
        start_reward: f64,
        floor_reward: f64,
        decay_steps: u32,
    ) -> Self {
        Self {
            description: description.into(),
            total,
            start_reward,
            floor_reward,
            decay_steps,
        }
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.description.trim().is_empty() {
            return Err(AppError::invalid_input("description is required"));
        }
        if self.total == Repetitions::Bounded(0) {
            return Err(AppError::invalid_input("total must be at least 1"));
        }
        validate_reward("reward", self.start_reward)?;
        if self.decay_steps > 0 {
            validate_reward("floor reward", self.floor_reward)?;
        }
        Ok(())
    }
}

fn validate_reward(label: &str, value: f64) -> Result<(), AppError> {
    if !value.is_finite() {
        return Err(AppError::invalid_input(format!("{label} must be a number")));
    }
    if value < 0.0 {
        return Err(AppError::invalid_input(format!(
            "{label} cannot be negative"
        )));
    }
    Ok(())
}

/// A repeatable goal whose reward moves from `start_reward` to
/// `floor_reward` over `decay_steps` completions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    id: String,
    description: String,
    total: Repetitions,
    completed_count: u32,
    start_reward: f64,
    current_reward: f64,
    floor_reward: f64,
    decay_per_step: f64,
    decay_steps: u32,
    // Completions since the schedule was last (re)started.
    #[serde(default)]
    decay_position: u32,
    #[serde(default)]
    earned: f64,
}

impl Task {
    pub fn new<I: Into<String>>(id: I, spec: &TaskSpec) -> Result<Self, AppError> {
        spec.validate()?;
        let mut task = Self {
            id: id.into(),
            description: String::new(),
            total: spec.total,
            completed_count: 0,
            start_reward: 0.0,
            current_reward: 0.0,
            floor_reward: 0.0,
            decay_per_step: 0.0,
            decay_steps: 0,
            decay_position: 0,
            earned: 0.0,
        };
        task.restart_schedule(spec);
        Ok(task)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn total(&self) -> Repetitions {
        self.total
    }

    pub fn completed_count(&self) -> u32 {
        self.completed_count
    }

    pub fn start_reward(&self) -> f64 {
        self.start_reward
    }

    /// Reward paid by the next completion.
    pub fn current_reward(&self) -> f64 {
        self.current_reward
    }

    pub fn floor_reward(&self) -> f64 {
        self.floor_reward
    }

    pub fn decay_per_step(&self) -> f64 {
        self.decay_per_step
    }

    pub fn decays(&self) -> bool {
        self.decay_steps > 0 && self.decay_per_step != 0.0
    }

    /// Sum of every reward this task has paid out.
    pub fn earned(&self) -> f64 {
        self.earned
    }

    pub fn is_complete(&self) -> bool {
        self.total
            .limit()
            .is_some_and(|limit| self.completed_count >= limit)
    }

    pub fn remaining(&self) -> Option<u32> {
        self.total
            .limit()
            .map(|limit| limit.saturating_sub(self.completed_count))
    }

    /// Records one completion and returns the reward earned by it.
    pub fn complete(&mut self) -> Result<f64, AppError> {
        if self.is_complete() {
            return Err(AppError::task_already_complete(self.id.clone()));
        }

        let reward = self.current_reward;
        self.completed_count += 1;
        self.earned += reward;
        if self.decay_position < self.decay_steps {
            self.decay_position += 1;
        }
        self.current_reward = self.reward_at(self.decay_position);
        Ok(reward)
    }

    /// Replaces every editable field and starts a fresh decay schedule from
    /// the new start reward. Past completions and earnings are kept.
    pub fn edit(&mut self, spec: &TaskSpec) -> Result<(), AppError> {
        spec.validate()?;
        if let Repetitions::Bounded(limit) = spec.total
            && limit < self.completed_count
        {
            return Err(AppError::invalid_input(format!(
                "total {limit} is below the {} completions already recorded",
                self.completed_count
            )));
        }

        self.total = spec.total;
        self.restart_schedule(spec);
        Ok(())
    }

    /// Editable values describing the schedule as it stands now, so an edit
    /// that changes nothing keeps the remaining decay intact.
    pub fn spec(&self) -> TaskSpec {
        TaskSpec {
            description: self.description.clone(),
            total: self.total,
            start_reward: self.current_reward,
            floor_reward: self.floor_reward,
            decay_steps: self.decay_steps.saturating_sub(self.decay_position),
        }
    }

    fn restart_schedule(&mut self, spec: &TaskSpec) {
        self.description = spec.description.trim().to_string();
        self.start_reward = spec.start_reward;
        self.decay_position = 0;

        if spec.decay_steps == 0 {
            self.floor_reward = spec.start_reward;
            self.decay_steps = 0;
            self.decay_per_step = 0.0;
        } else {
            self.floor_reward = spec.floor_reward;
            self.decay_steps = spec.decay_steps;
            self.decay_per_step =
                (spec.start_reward - spec.floor_reward) / f64::from(spec.decay_steps);
        }

        self.current_reward = self.reward_at(0);
    }

    fn reward_at(&self, position: u32) -> f64 {
        if self.decay_steps == 0 {
            return self.start_reward;
        }
        if position >= self.decay_steps {
            return self.floor_reward;
        }
        clamp_toward_floor(
            self.start_reward - self.decay_per_step * f64::from(position),
            self.start_reward,
            self.floor_reward,
        )
    }

    /// Structural checks applied to tasks read back from storage.
    pub(crate) fn check(&self) -> Result<(), String> {
        let amounts = [
            self.start_reward,
            self.current_reward,
            self.floor_reward,
            self.decay_per_step,
            self.earned,
        ];
        if amounts.iter().any(|value| !value.is_finite()) {
            return Err(format!("{}: reward fields must be finite", self.id));
        }
        if let Repetitions::Bounded(limit) = self.total
            && self.completed_count > limit
        {
            return Err(format!("{}: completed more times than its total", self.id));
        }
        if self.decay_position > self.decay_steps {
            return Err(format!("{}: decay position past its schedule", self.id));
        }
        let (low, high) = ordered(self.start_reward, self.floor_reward);
        if self.current_reward < low || self.current_reward > high {
            return Err(format!(
                "{}: current reward outside its start/floor range",
                self.id
            ));
        }
        let expected_step = if self.decay_steps == 0 {
            0.0
        } else {
            (self.start_reward - self.floor_reward) / f64::from(self.decay_steps)
        };
        if self.decay_steps == 0 && self.floor_reward != self.start_reward {
            return Err(format!("{}: floor set without decay steps", self.id));
        }
        if self.decay_per_step != expected_step
            || self.current_reward != self.reward_at(self.decay_position)
        {
            return Err(format!("{}: reward does not match its decay schedule", self.id));
        }
        Ok(())
    }
}

fn ordered(a: f64, b: f64) -> (f64, f64) {
    if a <= b { (a, b) } else { (b, a) }
}

fn clamp_toward_floor(value: f64, start: f64, floor: f64) -> f64 {
    let (low, high) = ordered(start, floor);
    value.clamp(low, high)
}
