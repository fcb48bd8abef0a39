use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use super::adapter::{ImageGenerator, MockImageGenerator};
use super::controller::{GenerateOutcome, GenerationController};
use super::credential::{CredentialGuard, CredentialHost};
use super::overlay::CatalogOverlayStore;
use super::settings::StudioSettings;
use super::types::{
    GenerationSettings, ImageRef, ItemKey, OverlaySource, RenderedItem, Section,
    DEFAULT_ROOM_TYPE,
};
use super::upload::{encode_image_bytes, encode_image_file};
use crate::catalog::{Catalog, Testimonial};
#[cfg(feature = "studio-http")]
use super::adapter::HttpImageGenerator;

pub struct StudioState {
    pub catalog: Arc<Catalog>,
    pub store: Arc<CatalogOverlayStore>,
    pub controller: Arc<GenerationController>,
    pub generation_settings: Mutex<GenerationSettings>,
}

impl StudioState {
    pub fn new(
        catalog: Catalog,
        generator: Arc<dyn ImageGenerator>,
        credentials: CredentialGuard,
    ) -> Self {
        let store = Arc::new(CatalogOverlayStore::from_catalog(&catalog));
        let controller = Arc::new(GenerationController::new(
            store.clone(),
            generator,
            credentials,
        ));
        Self {
            catalog: Arc::new(catalog),
            store,
            controller,
            generation_settings: Mutex::new(GenerationSettings::default()),
        }
    }

    fn settings_snapshot(&self) -> GenerationSettings {
        lock_settings(&self.generation_settings).clone()
    }

    fn require_known(&self, key: &ItemKey) -> Result<(), String> {
        if self.store.item(key).is_some() {
            Ok(())
        } else {
            Err("Item not found".into())
        }
    }
}

fn lock_settings(mutex: &Mutex<GenerationSettings>) -> MutexGuard<'_, GenerationSettings> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Bundled catalog, offline generator, key from the environment only.
pub fn create_default_state() -> StudioState {
    let settings = StudioSettings::default();
    StudioState::new(
        Catalog::builtin(),
        Arc::new(MockImageGenerator),
        CredentialGuard::from_settings(&settings, None),
    )
}

pub fn create_state(
    catalog: Catalog,
    settings: &StudioSettings,
    host: Option<Arc<dyn CredentialHost>>,
) -> StudioState {
    let settings = &settings.clone().normalize();
    #[cfg(feature = "studio-http")]
    let generator: Arc<dyn ImageGenerator> = Arc::new(HttpImageGenerator::from_settings(settings));
    #[cfg(not(feature = "studio-http"))]
    let generator: Arc<dyn ImageGenerator> = Arc::new(MockImageGenerator);
    StudioState::new(catalog, generator, CredentialGuard::from_settings(settings, host))
}

/// Full site content for the pages that are not image cards.
pub fn studio_get_catalog(state: &StudioState) -> Catalog {
    state.catalog.as_ref().clone()
}

pub fn studio_get_testimonial(state: &StudioState, id: i64) -> Result<Testimonial, String> {
    state
        .catalog
        .testimonial(id)
        .cloned()
        .ok_or_else(|| "Testimonial not found".to_string())
}

pub fn studio_list_items(state: &StudioState, section: Section) -> Vec<RenderedItem> {
    state
        .store
        .items_in(section)
        .map(|item| RenderedItem {
            key: item.key.clone(),
            title: item.title.clone(),
            category: item.category.clone(),
            image: state
                .store
                .effective_image(&item.key)
                .unwrap_or_else(|| item.original_image.clone()),
            overridden: state.store.is_overridden(&item.key),
            generating: state.controller.is_generating(&item.key),
        })
        .collect()
}

pub fn studio_effective_image(state: &StudioState, key: &ItemKey) -> Result<ImageRef, String> {
    state
        .store
        .effective_image(key)
        .ok_or_else(|| "Item not found".to_string())
}

pub async fn studio_upload_image(
    state: &StudioState,
    key: ItemKey,
    path: PathBuf,
) -> Result<ImageRef, String> {
    state.require_known(&key)?;
    // Decoding happens off the caller's thread.
    let image = tokio::task::spawn_blocking(move || encode_image_file(&path))
        .await
        .map_err(|e| e.to_string())?
        .map_err(|e| e.to_string())?;
    state
        .store
        .set_override(key, image.clone(), OverlaySource::Upload);
    Ok(image)
}

pub fn studio_upload_bytes(
    state: &StudioState,
    key: ItemKey,
    bytes: &[u8],
    file_name: &str,
) -> Result<ImageRef, String> {
    state.require_known(&key)?;
    let image = encode_image_bytes(bytes, file_name).map_err(|e| e.to_string())?;
    state
        .store
        .set_override(key, image.clone(), OverlaySource::Upload);
    Ok(image)
}

pub fn studio_get_generation_settings(state: &StudioState) -> GenerationSettings {
    state.settings_snapshot()
}

pub fn studio_update_generation_settings(
    state: &StudioState,
    mut settings: GenerationSettings,
) -> GenerationSettings {
    settings.room_type = settings.room_type.trim().to_string();
    if settings.room_type.is_empty() {
        settings.room_type = DEFAULT_ROOM_TYPE.to_string();
    }
    *lock_settings(&state.generation_settings) = settings.clone();
    settings
}

pub fn studio_check_credential(state: &StudioState) -> bool {
    state.controller.check_credential()
}

pub fn studio_is_generating(state: &StudioState, key: &ItemKey) -> bool {
    state.controller.is_generating(key)
}

pub async fn studio_generate(state: &StudioState, key: ItemKey) -> Result<GenerateOutcome, String> {
    let item = state
        .catalog
        .find_item(&key)
        .ok_or_else(|| "Item not found".to_string())?;
    let settings = state.settings_snapshot();
    let controller = state.controller.clone();

    // The service call blocks; keep it off the async workers.
    tokio::task::spawn_blocking(move || {
        controller.generate(&key, &item.title, &item.category, &settings)
    })
    .await
    .map_err(|e| e.to_string())
}
