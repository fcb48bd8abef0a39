//! Image overlays and preview generation for catalog items.

pub mod adapter;
pub mod commands;
pub mod controller;
pub mod credential;
pub mod overlay;
pub mod prompt;
pub mod settings;
pub mod types;
pub mod upload;

pub use adapter::{GenerationError, GenerationRequest, ImageGenerator, InlineImage, MockImageGenerator};
#[cfg(feature = "studio-http")]
pub use adapter::HttpImageGenerator;
pub use controller::{GenerateOutcome, GenerationController};
pub use credential::{CredentialError, CredentialGuard, CredentialHost};
pub use overlay::{CatalogOverlayStore, OverlayChange, OverlayEntry, SubscriptionId};
pub use settings::{load_studio_settings, save_studio_settings, StudioSettings};
pub use types::{
    AspectRatio, CatalogItem, GenerationSettings, ImageRef, ItemId, ItemKey, OverlaySource,
    Quality, RenderedItem, Section,
};
