use crate::alert::AlertScheduler;
use crate::config::app_dir;
use crate::error::AppError;
use crate::model::User;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};
use tracing::{debug, warn};

pub const SCHEMA_VERSION: u32 = 1;
const STORE_FILE_NAME: &str = "account.json";
const STORE_ENV_VAR: &str = "EARNIT_STORE_PATH";

#[derive(Debug, Serialize, Deserialize)]
struct StoredAccount {
    schema_version: u32,
    user: User,
    #[serde(default)]
    alert: StoredAlert,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredAlert {
    #[serde(default)]
    interval_seconds: Option<i64>,
    #[serde(default)]
    last_alert_at: Option<String>,
}

/// Everything read back from an account file.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub user: User,
    pub alert: AlertScheduler,
}

pub fn store_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(STORE_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    Ok(app_dir()?.join(STORE_FILE_NAME))
}

/// Single-file persistence for one account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountStore {
    path: PathBuf,
}

impl AccountStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn from_env() -> Result<Self, AppError> {
        Ok(Self::new(store_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Returns `None` when no account has been created yet. A stored alert
    /// without a timestamp counts down from `now`.
    pub fn load(&self, now: OffsetDateTime) -> Result<Option<Account>, AppError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path)
            .map_err(|err| AppError::io(format!("{}: {}", self.path.display(), err)))?;
        let stored: StoredAccount = serde_json::from_str(&content).map_err(|err| {
            AppError::storage_corrupt(format!("{}: {}", self.path.display(), err))
        })?;

        if stored.schema_version != SCHEMA_VERSION {
            return Err(AppError::storage_corrupt("schema_version mismatch"));
        }

        let mut user = stored.user;
        user.check().map_err(AppError::storage_corrupt)?;
        user.reconcile_ids();

        let last_alert = match stored.alert.last_alert_at.as_deref() {
            Some(value) => OffsetDateTime::parse(value, &Rfc3339)
                .map_err(|_| AppError::storage_corrupt("last_alert_at must be RFC3339"))?,
            None => now,
        };
        let interval = stored.alert.interval_seconds.map(Duration::seconds);
        let alert = AlertScheduler::restore(interval, last_alert)
            .map_err(|err| AppError::storage_corrupt(err.message()))?;

        debug!(path = %self.path.display(), tasks = user.tasks().len(), "account loaded");
        Ok(Some(Account { user, alert }))
    }

    /// Writes the account next to the target and renames it into place, so
    /// a failed write leaves the previous file untouched.
    pub fn save(&self, user: &User, alert: &AlertScheduler) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let last_alert_at = alert
            .last_alert()
            .format(&Rfc3339)
            .map_err(|err| AppError::io(err.to_string()))?;
        let stored = StoredAccount {
            schema_version: SCHEMA_VERSION,
            user: user.clone(),
            alert: StoredAlert {
                interval_seconds: alert.interval().map(|interval| interval.whole_seconds()),
                last_alert_at: Some(last_alert_at),
            },
        };
        let content = serde_json::to_string_pretty(&stored)
            .map_err(|err| AppError::io(err.to_string()))?;

        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&tmp_path, permissions)?;
        }

        std::fs::rename(&tmp_path, &self.path)?;
        debug!(path = %self.path.display(), "account saved");
        Ok(())
    }

    /// Moves an existing account file to `<name>.bak`, replacing an older
    /// backup. Returns the backup path, or `None` when there was no file.
    pub fn set_aside(&self) -> Result<Option<PathBuf>, AppError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let mut backup = self.path.clone().into_os_string();
        backup.push(".bak");
        let backup = PathBuf::from(backup);
        std::fs::rename(&self.path, &backup)
            .map_err(|err| AppError::io(format!("{}: {}", self.path.display(), err)))?;
        warn!(path = %self.path.display(), backup = %backup.display(), "account file set aside");
        Ok(Some(backup))
    }
}
