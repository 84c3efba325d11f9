//! Text and JSON rendering shared by one-shot commands and the interactive
//! menu.

use crate::cli::View;
use earnit_core::config::Palette;
use earnit_core::error::AppError;
use earnit_core::model::{Repetitions, Task};
use earnit_core::session::{AlertStatus, Outcome, Snapshot};
use serde_json::{Value, json};
use tabled::settings::Style;
use tabled::{Table, Tabled};

pub const ALERT_BANNER: &str = "Time to do something!! Doing any task will clear the alert";

pub fn money(symbol: &str, amount: f64) -> String {
    if amount < 0.0 {
        format!("-{symbol}{:.2}", amount.abs())
    } else {
        format!("{symbol}{amount:.2}")
    }
}

/// `HH:MM:SS`, hours unbounded.
pub fn countdown(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

pub fn alert_line(status: &AlertStatus, tasks: &[Task]) -> String {
    match status {
        AlertStatus::Disabled => "Alerts disabled".to_string(),
        AlertStatus::Idle {
            seconds_remaining, ..
        } => format!("Next alert in: {}", countdown(*seconds_remaining)),
        AlertStatus::Alerting { selected_task_id } => {
            match selected_task_id
                .as_deref()
                .and_then(|id| tasks.iter().find(|task| task.id() == id))
            {
                Some(task) => format!("{ALERT_BANNER}\nSuggested: {} ({})", task.description(), task.id()),
                None => ALERT_BANNER.to_string(),
            }
        }
    }
}

pub fn user_summary(snapshot: &Snapshot) -> String {
    let symbol = snapshot.currency_symbol.as_str();
    format!(
        "User: {}\nCurrent Balance: {}\nTotals:\n    Earned: {}\n    Spent:  {}",
        snapshot.name,
        money(symbol, snapshot.balance),
        money(symbol, snapshot.total_earned),
        money(symbol, snapshot.total_spent),
    )
}

/// Two lines: progress so far, then how the reward moves.
pub fn task_detail(task: &Task, symbol: &str) -> String {
    let progress = match (task.total(), task.remaining()) {
        (Repetitions::Bounded(total), Some(left)) => {
            format!("{} of {} times ({left} left)", task.completed_count(), total)
        }
        _ => format!("{} times", task.completed_count()),
    };
    let first = format!(
        "{} completed {} for a total of {}",
        task.description(),
        progress,
        money(symbol, task.earned())
    );
    let second = if task.is_complete() {
        "Finished".to_string()
    } else if task.decays() {
        format!(
            "Reward will go from {} to {} and next reward is {}",
            money(symbol, task.start_reward()),
            money(symbol, task.floor_reward()),
            money(symbol, task.current_reward())
        )
    } else {
        format!("Reward: {}", money(symbol, task.current_reward()))
    };
    format!("{first}\n{second}")
}

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "")]
    marker: &'static str,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Task")]
    description: String,
    #[tabled(rename = "Done")]
    progress: String,
    #[tabled(rename = "Next reward")]
    next: String,
    #[tabled(rename = "Floor")]
    floor: String,
    #[tabled(rename = "Earned")]
    earned: String,
}

impl TaskRow {
    fn new(task: &Task, symbol: &str, selected: Option<&str>) -> Self {
        let progress = match task.total() {
            Repetitions::Bounded(total) => format!("{}/{}", task.completed_count(), total),
            Repetitions::Unbounded => format!("{}/∞", task.completed_count()),
        };
        let next = if task.is_complete() {
            "finished".to_string()
        } else {
            money(symbol, task.current_reward())
        };
        let floor = if task.decays() {
            money(symbol, task.floor_reward())
        } else {
            "-".to_string()
        };
        Self {
            marker: if selected == Some(task.id()) { ">>" } else { "" },
            id: task.id().to_string(),
            description: task.description().to_string(),
            progress,
            next,
            floor,
            earned: money(symbol, task.earned()),
        }
    }
}

/// The alert's pick is marked with `>>`.
pub fn task_table(snapshot: &Snapshot) -> String {
    if snapshot.tasks.is_empty() {
        return "No tasks yet. Add one with `add \"<description>\"`.".to_string();
    }

    let selected = snapshot.selected_task_id();
    let rows: Vec<TaskRow> = snapshot
        .tasks
        .iter()
        .map(|task| TaskRow::new(task, &snapshot.currency_symbol, selected))
        .collect();
    Table::new(rows).with(Style::psql()).to_string()
}

pub fn snapshot_text(snapshot: &Snapshot, view: View, palette: &Palette) -> String {
    match view {
        View::List => task_table(snapshot),
        View::Status => {
            let alert = alert_line(&snapshot.alert, &snapshot.tasks);
            let alert = if matches!(snapshot.alert, AlertStatus::Alerting { .. }) {
                palette.highlight(&alert)
            } else {
                palette.mute(&alert)
            };
            format!("{}\n{}\n\n{}", user_summary(snapshot), alert, task_table(snapshot))
        }
    }
}

pub fn outcome_text(outcome: &Outcome, snapshot: &Snapshot, view: View, palette: &Palette) -> String {
    let symbol = snapshot.currency_symbol.as_str();
    match outcome {
        Outcome::Created(task) => format!("Added task: {} ({})", task.description(), task.id()),
        Outcome::Edited(task) => format!(
            "Updated task: {} ({})\n{}",
            task.description(),
            task.id(),
            task_detail(task, symbol)
        ),
        Outcome::Removed(task) => format!("Removed task: {} ({})", task.description(), task.id()),
        Outcome::Completed(completion) => {
            let task = &completion.task;
            let mut lines = vec![format!(
                "Completed task: {} ({}) earning {}. Balance: {}",
                task.description(),
                task.id(),
                money(symbol, completion.reward),
                money(symbol, snapshot.balance)
            )];
            if completion.acknowledged_alert {
                lines.push("Alert cleared.".to_string());
            }
            lines.push(task_detail(task, symbol));
            lines.join("\n")
        }
        Outcome::Spent { amount, balance } => format!(
            "Recorded spend of {}. Balance: {}",
            money(symbol, *amount),
            money(symbol, *balance)
        ),
        Outcome::IntervalSet(None) => "Alerts disabled".to_string(),
        Outcome::IntervalSet(Some(interval)) => {
            let minutes = interval.whole_minutes();
            let unit = if minutes == 1 { "minute" } else { "minutes" };
            format!("Alerts every {minutes} {unit}")
        }
        Outcome::Snapshot(snapshot) => snapshot_text(snapshot, view, palette),
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, AppError> {
    serde_json::to_value(value).map_err(|err| AppError::io(err.to_string()))
}

pub fn snapshot_json(snapshot: &Snapshot) -> Result<Value, AppError> {
    to_json(snapshot)
}

pub fn outcome_json(outcome: &Outcome, snapshot: &Snapshot, view: View) -> Result<Value, AppError> {
    match outcome {
        Outcome::Created(task) | Outcome::Edited(task) | Outcome::Removed(task) => to_json(task),
        Outcome::Completed(completion) => Ok(json!({
            "task": to_json(&completion.task)?,
            "reward": completion.reward,
            "acknowledged_alert": completion.acknowledged_alert,
            "balance": snapshot.balance,
        })),
        Outcome::Spent { amount, balance } => Ok(json!({
            "amount": amount,
            "balance": balance,
        })),
        Outcome::IntervalSet(interval) => Ok(json!({
            "interval_seconds": interval.map(|interval| interval.whole_seconds()),
        })),
        Outcome::Snapshot(snapshot) => match view {
            View::List => to_json(&snapshot.tasks),
            View::Status => snapshot_json(snapshot),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::{alert_line, countdown, money, outcome_json, outcome_text, task_detail, task_table};
    use crate::cli::View;
    use earnit_core::config::palette_for_theme;
    use earnit_core::model::{Repetitions, Task, TaskSpec};
    use earnit_core::session::{AlertStatus, Completion, Outcome, Snapshot};
    use time::Duration;

    fn snapshot(tasks: Vec<Task>, alert: AlertStatus) -> Snapshot {
        Snapshot {
            name: "Sam".into(),
            currency_symbol: "$".into(),
            balance: 3.5,
            total_earned: 5.0,
            total_spent: 1.5,
            tasks,
            alert,
        }
    }

    fn walk() -> Task {
        let spec = TaskSpec::decaying("walk", Repetitions::Bounded(4), 2.0, 1.0, 2);
        Task::new("task-1", &spec).unwrap()
    }

    #[test]
    fn money_formats_two_places_and_sign() {
        assert_eq!(money("$", 3.5), "$3.50");
        assert_eq!(money("€", -2.0), "-€2.00");
        assert_eq!(money("$", 0.0), "$0.00");
    }

    #[test]
    fn countdown_rolls_minutes_into_hours() {
        assert_eq!(countdown(0), "00:00:00");
        assert_eq!(countdown(59), "00:00:59");
        assert_eq!(countdown(3599), "00:59:59");
        assert_eq!(countdown(3 * 3600 + 61), "03:01:01");
        assert_eq!(countdown(-5), "00:00:00");
    }

    #[test]
    fn alert_line_names_the_suggestion() {
        let tasks = vec![walk()];
        let alerting = AlertStatus::Alerting {
            selected_task_id: Some("task-1".into()),
        };
        let line = alert_line(&alerting, &tasks);
        assert!(line.starts_with("Time to do something!!"));
        assert!(line.contains("Suggested: walk (task-1)"));

        let idle = AlertStatus::Idle {
            interval_seconds: 600,
            seconds_remaining: 125,
        };
        assert_eq!(alert_line(&idle, &tasks), "Next alert in: 00:02:05");
        assert_eq!(alert_line(&AlertStatus::Disabled, &tasks), "Alerts disabled");
    }

    #[test]
    fn task_detail_describes_decay() {
        let mut task = walk();
        task.complete().unwrap();
        let detail = task_detail(&task, "$");
        assert_eq!(
            detail,
            "walk completed 1 of 4 times (3 left) for a total of $2.00\n\
             Reward will go from $2.00 to $1.00 and next reward is $1.50"
        );
    }

    #[test]
    fn task_table_marks_selected_task() {
        let snapshot = snapshot(
            vec![walk()],
            AlertStatus::Alerting {
                selected_task_id: Some("task-1".into()),
            },
        );
        let table = task_table(&snapshot);
        assert!(table.contains(">>"));
        assert!(table.contains("task-1"));
        assert!(table.contains("0/4"));
        assert!(table.contains("$2.00"));
    }

    #[test]
    fn empty_table_hints_at_add() {
        let snapshot = snapshot(Vec::new(), AlertStatus::Disabled);
        assert!(task_table(&snapshot).starts_with("No tasks yet"));
    }

    #[test]
    fn completion_text_reports_reward_and_alert() {
        let mut task = walk();
        let reward = task.complete().unwrap();
        let outcome = Outcome::Completed(Completion {
            task,
            reward,
            acknowledged_alert: true,
        });
        let snapshot = snapshot(Vec::new(), AlertStatus::Disabled);
        let text = outcome_text(&outcome, &snapshot, View::Status, &palette_for_theme(None));
        assert!(text.starts_with("Completed task: walk (task-1) earning $2.00. Balance: $3.50"));
        assert!(text.contains("Alert cleared."));
    }

    #[test]
    fn interval_json_uses_seconds() {
        let snapshot = snapshot(Vec::new(), AlertStatus::Disabled);
        let json = outcome_json(
            &Outcome::IntervalSet(Some(Duration::minutes(2))),
            &snapshot,
            View::Status,
        )
        .unwrap();
        assert_eq!(json["interval_seconds"], 120);

        let json = outcome_json(&Outcome::IntervalSet(None), &snapshot, View::Status).unwrap();
        assert!(json["interval_seconds"].is_null());
    }

    #[test]
    fn list_json_is_task_array() {
        let snapshot = snapshot(vec![walk()], AlertStatus::Disabled);
        let json = outcome_json(&Outcome::Snapshot(snapshot.clone()), &snapshot, View::List).unwrap();
        let tasks = json.as_array().unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0]["id"], "task-1");
    }
}
