pub mod catalog;
pub mod studio;

pub use catalog::{load_catalog, save_catalog, Catalog, CatalogError};
pub use studio::commands::{create_default_state, create_state, StudioState};
