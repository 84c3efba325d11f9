use crate::alert::Alert;
use crate::error::AppError;
use crate::notify::{NOTIFICATION_TITLE, Notifier};
use tauri_winrt_notification::Toast;

pub struct WindowsNotifier;

impl Notifier for WindowsNotifier {
    fn notify(&self, alert: &Alert) -> Result<(), AppError> {
        Toast::new(Toast::POWERSHELL_APP_ID)
            .title(NOTIFICATION_TITLE)
            .text1("Time to do something!")
            .text2(&alert.description)
            .show()
            .map_err(|err| AppError::io(err.to_string()))
    }
}
