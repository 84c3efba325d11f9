use clap::{Parser, Subcommand};
use earnit_core::config::ConfigOverrides;
use earnit_core::error::AppError;
use earnit_core::model::{Repetitions, Task, TaskSpec};
use earnit_core::session::Intent;
use std::str::FromStr;
use time::Duration;

#[derive(Parser, Debug)]
#[command(name = "earnit", author, version, about, long_about = None)]
pub struct Cli {
    /// Run one command; start the interactive menu when omitted
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Create the account
    ///
    /// Example: earnit init --name Sam --currency "€"
    Init {
        #[arg(long)]
        name: String,
        #[arg(long)]
        currency: Option<String>,
        /// Set an unreadable account file aside and start fresh
        #[arg(long)]
        force: bool,
    },
    /// Add a new task
    ///
    /// Example: earnit add "Go for a run" --total 10 --reward 2 --floor 1 --steps 5
    Add {
        description: Option<String>,
        /// Maximum repetitions, -1 for unbounded
        #[arg(long, default_value = "unbounded", allow_hyphen_values = true)]
        total: Repetitions,
        /// Reward for the next completion
        #[arg(long, default_value_t = 1.0)]
        reward: f64,
        /// Reward reached once decay has run its course
        #[arg(long)]
        floor: Option<f64>,
        /// Completions until the floor is reached, 0 for no decay
        #[arg(long, default_value_t = 0)]
        steps: u32,
    },
    /// Edit a task; omitted fields keep their current values
    ///
    /// Example: earnit edit task-1 --reward 3 --floor 1 --steps 4
    Edit {
        id: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, allow_hyphen_values = true)]
        total: Option<Repetitions>,
        #[arg(long)]
        reward: Option<f64>,
        #[arg(long)]
        floor: Option<f64>,
        #[arg(long)]
        steps: Option<u32>,
    },
    /// Remove a task
    ///
    /// Example: earnit remove task-1
    Remove { id: String },
    /// Record a completion and collect its reward
    ///
    /// Example: earnit done task-1
    Done { id: String },
    /// Record money spent
    ///
    /// Example: earnit spend 4.50
    Spend {
        #[arg(allow_hyphen_values = true)]
        amount: f64,
    },
    /// Set minutes between alerts, or "off"
    ///
    /// Example: earnit alert 30
    /// Example: earnit alert off
    Alert {
        #[arg(allow_hyphen_values = true)]
        setting: AlertSetting,
    },
    /// Show balance, alert countdown and tasks
    Status,
    /// List tasks
    List,
}

impl Command {
    /// Builds the intent for every command except `init`, which only runs
    /// before an account exists.
    pub fn to_intent(&self, tasks: &[Task]) -> Result<Intent, AppError> {
        match self {
            Command::Init { .. } => Err(AppError::invalid_input("account already exists")),
            Command::Add {
                description,
                total,
                reward,
                floor,
                steps,
            } => {
                let description = match description {
                    Some(value) if !value.trim().is_empty() => value.clone(),
                    _ => return Err(AppError::invalid_input("description is required")),
                };
                let spec = TaskSpec {
                    description,
                    total: *total,
                    start_reward: *reward,
                    floor_reward: floor.unwrap_or(*reward),
                    decay_steps: *steps,
                };
                require_steps_for_floor(&spec, floor.is_some())?;
                Ok(Intent::CreateTask(spec))
            }
            Command::Edit {
                id,
                description,
                total,
                reward,
                floor,
                steps,
            } => {
                let task = tasks
                    .iter()
                    .find(|task| task.id() == id.trim())
                    .ok_or_else(|| AppError::task_not_found(id.trim()))?;
                let mut spec = task.spec();
                if let Some(description) = description {
                    spec.description = description.clone();
                }
                if let Some(total) = total {
                    spec.total = *total;
                }
                if let Some(reward) = reward {
                    spec.start_reward = *reward;
                }
                if let Some(floor) = floor {
                    spec.floor_reward = *floor;
                }
                if let Some(steps) = steps {
                    spec.decay_steps = *steps;
                }
                require_steps_for_floor(&spec, floor.is_some())?;
                Ok(Intent::EditTask {
                    id: task.id().to_string(),
                    spec,
                })
            }
            Command::Remove { id } => Ok(Intent::RemoveTask { id: id.clone() }),
            Command::Done { id } => Ok(Intent::CompleteTask { id: id.clone() }),
            Command::Spend { amount } => Ok(Intent::RecordSpend { amount: *amount }),
            Command::Alert { setting } => Ok(Intent::SetAlertInterval(setting.interval())),
            Command::Status | Command::List => Ok(Intent::Snapshot),
        }
    }
}

/// A floor only takes effect with decay steps; refuse one that would be
/// silently ignored.
fn require_steps_for_floor(spec: &TaskSpec, floor_given: bool) -> Result<(), AppError> {
    if floor_given && spec.decay_steps == 0 && spec.floor_reward != spec.start_reward {
        return Err(AppError::invalid_input(
            "--floor needs --steps greater than 0 to take effect",
        ));
    }
    Ok(())
}

/// Alert interval as typed by the user: whole minutes or `off`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertSetting {
    Off,
    Minutes(u32),
}

impl AlertSetting {
    pub fn interval(self) -> Option<Duration> {
        match self {
            Self::Off => None,
            Self::Minutes(minutes) => Some(Duration::minutes(i64::from(minutes))),
        }
    }
}

impl FromStr for AlertSetting {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "off" | "none" | "disable" | "disabled" | "-1" => Ok(Self::Off),
            other => other.parse::<u32>().map(Self::Minutes).map_err(|_| {
                AppError::invalid_input(format!(
                    "alert interval must be whole minutes or 'off', got '{trimmed}'"
                ))
            }),
        }
    }
}

/// Which rendering a snapshot request asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Status,
    List,
}

impl View {
    pub fn for_command(command: &Command) -> Self {
        match command {
            Command::List => Self::List,
            _ => Self::Status,
        }
    }
}

/// Turns a clap failure into a single-line `invalid_input` error.
pub fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    Theme,
    AlertMinutes,
    TickSeconds,
    CurrencySymbol,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, String> {
    let (key_raw, value_raw) = raw
        .trim()
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;

    let key = canonicalize_flag_name(key_raw).ok_or_else(|| "override key cannot be empty".to_string())?;
    let target = match key.as_str() {
        "theme" => ConfigOverrideTarget::Theme,
        "alert" | "alert_minutes" => ConfigOverrideTarget::AlertMinutes,
        "tick" | "tick_seconds" => ConfigOverrideTarget::TickSeconds,
        "currency" | "currency_symbol" => ConfigOverrideTarget::CurrencySymbol,
        other => return Err(format!("unknown config field '{other}'")),
    };

    Ok(ParsedConfigOverride {
        target,
        value: value_raw.trim().to_string(),
    })
}

/// Folds every `--config-override` flag into one set of overrides; later
/// flags win.
pub fn collect_config_overrides(raw: &[String]) -> Result<ConfigOverrides, AppError> {
    let mut overrides = ConfigOverrides::default();
    for entry in raw {
        let parsed = parse_config_override(entry).map_err(AppError::invalid_input)?;
        match parsed.target {
            ConfigOverrideTarget::Theme => overrides.theme = Some(parsed.value),
            ConfigOverrideTarget::AlertMinutes => {
                let minutes = match parsed.value.parse::<AlertSetting>()? {
                    AlertSetting::Off => 0,
                    AlertSetting::Minutes(minutes) => minutes,
                };
                overrides.alert_minutes = Some(minutes);
            }
            ConfigOverrideTarget::TickSeconds => {
                let seconds = parsed.value.parse::<u64>().map_err(|_| {
                    AppError::invalid_input(format!("tick_seconds must be a whole number, got '{}'", parsed.value))
                })?;
                overrides.tick_seconds = Some(seconds);
            }
            ConfigOverrideTarget::CurrencySymbol => overrides.currency_symbol = Some(parsed.value),
        }
    }
    Ok(overrides)
}

fn canonicalize_flag_name(name: &str) -> Option<String> {
    let mut cleaned = String::new();
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
        } else if !cleaned.is_empty() && !cleaned.ends_with('_') {
            cleaned.push('_');
        }
    }

    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
