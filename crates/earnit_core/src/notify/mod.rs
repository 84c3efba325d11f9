use crate::alert::Alert;
use crate::error::AppError;

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "linux")]
pub use linux::LinuxNotifier;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use windows::WindowsNotifier;

const DISABLE_ENV_VAR: &str = "EARNIT_DISABLE_NOTIFICATIONS";
pub(crate) const NOTIFICATION_TITLE: &str = "EarnIt";

/// Surfaces a fired alert outside the terminal.
pub trait Notifier {
    fn notify(&self, alert: &Alert) -> Result<(), AppError>;
}

pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _alert: &Alert) -> Result<(), AppError> {
        Ok(())
    }
}

pub fn notifier_from_env() -> Box<dyn Notifier> {
    if std::env::var(DISABLE_ENV_VAR).is_ok() {
        return Box::new(NoopNotifier);
    }

    platform_notifier().unwrap_or_else(|| Box::new(NoopNotifier))
}

pub(crate) fn notification_body(alert: &Alert) -> String {
    format!(
        "Time to do something!\nSuggested: {} ({})",
        alert.description, alert.task_id
    )
}

#[cfg(target_os = "linux")]
fn platform_notifier() -> Option<Box<dyn Notifier>> {
    Some(Box::new(LinuxNotifier))
}

#[cfg(windows)]
fn platform_notifier() -> Option<Box<dyn Notifier>> {
    Some(Box::new(WindowsNotifier))
}

#[cfg(not(any(target_os = "linux", windows)))]
fn platform_notifier() -> Option<Box<dyn Notifier>> {
    None
}

#[cfg(test)]
mod tests {
    use super::{NoopNotifier, Notifier, notification_body};
    use crate::alert::Alert;

    fn alert() -> Alert {
        Alert {
            task_id: "task-3".to_string(),
            description: "stretch".to_string(),
        }
    }

    #[test]
    fn body_names_the_selected_task() {
        let body = notification_body(&alert());
        assert!(body.contains("stretch (task-3)"));
    }

    #[test]
    fn noop_notifier_succeeds() {
        assert!(NoopNotifier.notify(&alert()).is_ok());
    }
}
