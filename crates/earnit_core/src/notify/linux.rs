use crate::alert::Alert;
use crate::error::AppError;
use crate::notify::{NOTIFICATION_TITLE, Notifier, notification_body};
use notify_rust::Notification;

pub struct LinuxNotifier;

impl Notifier for LinuxNotifier {
    fn notify(&self, alert: &Alert) -> Result<(), AppError> {
        Notification::new()
            .summary(NOTIFICATION_TITLE)
            .body(&notification_body(alert))
            .show()
            .map_err(|err| AppError::io(err.to_string()))?;
        Ok(())
    }
}
