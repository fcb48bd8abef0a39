//! API-key availability for the generation service.
//!
//! A credential host (for example an embedding shell with its own key picker)
//! is optional. Without one, the key comes from settings or the environment.

use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use super::settings::StudioSettings;

#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum CredentialError {
    #[error("credential host is unavailable")]
    HostUnavailable,
    #[error("credential selection failed: {0}")]
    SelectionFailed(String),
}

pub trait CredentialHost: Send + Sync {
    fn has_selected_credential(&self) -> Result<bool, CredentialError>;
    /// Runs the user-facing selection flow and returns once it completes.
    fn open_select_credential(&self) -> Result<(), CredentialError>;
    /// The key chosen through the host, when the host hands it over directly.
    fn current_credential(&self) -> Option<String> {
        None
    }
}

pub struct CredentialGuard {
    host: Option<Arc<dyn CredentialHost>>,
    api_key: Option<String>,
    api_key_env: String,
    has_credential: AtomicBool,
}

impl CredentialGuard {
    pub fn new(
        host: Option<Arc<dyn CredentialHost>>,
        api_key: Option<String>,
        api_key_env: impl Into<String>,
    ) -> Self {
        Self {
            host,
            api_key,
            api_key_env: api_key_env.into(),
            has_credential: AtomicBool::new(false),
        }
    }

    pub fn from_settings(settings: &StudioSettings, host: Option<Arc<dyn CredentialHost>>) -> Self {
        Self::new(host, settings.api_key.clone(), settings.api_key_env.clone())
    }

    pub fn has_host(&self) -> bool {
        self.host.is_some()
    }

    /// Advisory check, used to decide whether to prompt up front.
    pub fn check_credential(&self) -> bool {
        match self.host.as_ref() {
            Some(host) => match host.has_selected_credential() {
                Ok(selected) => selected,
                Err(CredentialError::HostUnavailable) => self.configured_key().is_some(),
                Err(err) => {
                    log::warn!("[credential] host check failed: {}", err);
                    false
                }
            },
            None => self.configured_key().is_some(),
        }
    }

    pub fn ensure_credential(&self) -> Result<(), CredentialError> {
        if self.has_credential.load(Ordering::SeqCst) {
            return Ok(());
        }
        if self.check_credential() {
            self.has_credential.store(true, Ordering::SeqCst);
            return Ok(());
        }
        let Some(host) = self.host.as_ref() else {
            // Nothing to prompt with; let the request itself report the problem.
            return Ok(());
        };
        host.open_select_credential()?;
        self.has_credential.store(true, Ordering::SeqCst);
        Ok(())
    }

    pub fn is_cached(&self) -> bool {
        self.has_credential.load(Ordering::SeqCst)
    }

    pub fn invalidate(&self) {
        self.has_credential.store(false, Ordering::SeqCst);
    }

    /// Drops the cached flag and runs the host selection flow once.
    pub fn reselect(&self) {
        self.invalidate();
        match self.host.as_ref() {
            Some(host) => {
                if let Err(err) = host.open_select_credential() {
                    log::warn!("[credential] reselection failed: {}", err);
                }
            }
            None => log::warn!(
                "[credential] credential rejected; set {} or configure an API key",
                self.api_key_env
            ),
        }
    }

    pub fn resolve_api_key(&self) -> Option<String> {
        self.host
            .as_ref()
            .and_then(|host| host.current_credential())
            .filter(|key| !key.trim().is_empty())
            .or_else(|| self.configured_key())
    }

    fn configured_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| {
                env::var(&self.api_key_env)
                    .ok()
                    .filter(|key| !key.trim().is_empty())
            })
    }
}
