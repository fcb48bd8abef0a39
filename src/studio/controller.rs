//! Drives one preview generation per item: credential guard, in-flight flag,
//! service call, and applying the result to the overlay store.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;

use super::adapter::{GenerationError, GenerationRequest, ImageGenerator};
use super::credential::{CredentialError, CredentialGuard};
use super::overlay::CatalogOverlayStore;
use super::prompt::build_prompt;
use super::types::{GenerationSettings, ImageRef, ItemKey, OverlaySource};

/// Terminal result of a `generate` call. Failures are values, not errors, so
/// the rendering layer never has to handle them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GenerateOutcome {
    Applied { image: ImageRef },
    NoImage,
    Aborted { reason: CredentialError },
    AlreadyInFlight,
    CredentialReselected,
    Failed { error: GenerationError },
}

impl GenerateOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, GenerateOutcome::Applied { .. })
    }
}

#[derive(Debug, Default)]
pub struct InFlightTracker {
    keys: Mutex<HashSet<ItemKey>>,
}

/// Clears the in-flight flag for its key when dropped.
pub struct InFlightGuard<'a> {
    tracker: &'a InFlightTracker,
    key: ItemKey,
}

impl InFlightTracker {
    fn lock(&self) -> MutexGuard<'_, HashSet<ItemKey>> {
        self.keys.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn try_begin(&self, key: &ItemKey) -> Option<InFlightGuard<'_>> {
        if self.lock().insert(key.clone()) {
            Some(InFlightGuard {
                tracker: self,
                key: key.clone(),
            })
        } else {
            None
        }
    }

    pub fn contains(&self, key: &ItemKey) -> bool {
        self.lock().contains(key)
    }

    pub fn keys(&self) -> Vec<ItemKey> {
        let mut keys: Vec<ItemKey> = self.lock().iter().cloned().collect();
        keys.sort();
        keys
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.tracker.lock().remove(&self.key);
    }
}

pub struct GenerationController {
    store: Arc<CatalogOverlayStore>,
    generator: Arc<dyn ImageGenerator>,
    credentials: CredentialGuard,
    in_flight: InFlightTracker,
}

impl GenerationController {
    pub fn new(
        store: Arc<CatalogOverlayStore>,
        generator: Arc<dyn ImageGenerator>,
        credentials: CredentialGuard,
    ) -> Self {
        Self {
            store,
            generator,
            credentials,
            in_flight: InFlightTracker::default(),
        }
    }

    pub fn credentials(&self) -> &CredentialGuard {
        &self.credentials
    }

    pub fn check_credential(&self) -> bool {
        self.credentials.check_credential()
    }

    pub fn is_generating(&self, key: &ItemKey) -> bool {
        self.in_flight.contains(key)
    }

    pub fn generating_keys(&self) -> Vec<ItemKey> {
        self.in_flight.keys()
    }

    /// Blocking; run it off the UI thread.
    pub fn generate(
        &self,
        key: &ItemKey,
        title: &str,
        category: &str,
        settings: &GenerationSettings,
    ) -> GenerateOutcome {
        if let Err(reason) = self.credentials.ensure_credential() {
            log::info!("[studio] generation for {} aborted: {}", key, reason);
            return GenerateOutcome::Aborted { reason };
        }

        let Some(_in_flight) = self.in_flight.try_begin(key) else {
            log::debug!("[studio] generation for {} already running", key);
            return GenerateOutcome::AlreadyInFlight;
        };

        let request = GenerationRequest {
            prompt: build_prompt(title, category, settings),
            aspect_ratio: settings.aspect_ratio,
            quality: settings.quality,
        };
        let api_key = self.credentials.resolve_api_key();

        match self.generator.generate_image(api_key.as_deref(), &request) {
            Ok(Some(inline)) => {
                let image = inline.to_image_ref();
                self.store
                    .set_override(key.clone(), image.clone(), OverlaySource::Generated);
                log::info!("[studio] generated preview for {}", key);
                GenerateOutcome::Applied { image }
            }
            Ok(None) => {
                log::info!("[studio] service returned no image for {}", key);
                GenerateOutcome::NoImage
            }
            Err(GenerationError::CredentialRejected(message)) => {
                log::warn!("[studio] credential rejected for {}: {}", key, message);
                self.credentials.reselect();
                GenerateOutcome::CredentialReselected
            }
            Err(error) => {
                log::warn!("[studio] generation for {} failed: {}", key, error);
                GenerateOutcome::Failed { error }
            }
        }
    }
}
