//! Site content: services, gallery, blog, featured projects and testimonials.
//!
//! The bundled catalog ships inside the binary; a shell may replace it with a
//! JSON file of the same shape.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::studio::types::{CatalogItem, ImageRef, ItemKey, Section};

const BUNDLED_CATALOG: &str = include_str!("../assets/catalog.json");

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("duplicate catalog item: {0}")]
    DuplicateItem(ItemKey),
    #[error("duplicate testimonial: {0}")]
    DuplicateTestimonial(i64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyInfo {
    pub name: String,
    pub tagline: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub whatsapp_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubCategory {
    pub title: String,
    pub description: String,
    pub image: ImageRef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceItem {
    pub id: String,
    pub title: String,
    pub short_description: String,
    pub full_description: String,
    pub image: ImageRef,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_categories: Vec<SubCategory>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryImage {
    pub id: i64,
    pub image: ImageRef,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: String,
    pub title: String,
    pub date: String,
    pub excerpt: String,
    pub image: ImageRef,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeaturedProject {
    pub id: String,
    pub title: String,
    pub subtitle: String,
    pub image: ImageRef,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Testimonial {
    pub id: i64,
    pub name: String,
    pub location: String,
    pub rating: f32,
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    pub company: CompanyInfo,
    #[serde(default)]
    pub services: Vec<ServiceItem>,
    #[serde(default)]
    pub gallery: Vec<GalleryImage>,
    #[serde(default)]
    pub blog_posts: Vec<BlogPost>,
    #[serde(default)]
    pub featured: Vec<FeaturedProject>,
    #[serde(default)]
    pub testimonials: Vec<Testimonial>,
}

impl Catalog {
    pub fn builtin() -> Self {
        serde_json::from_str(BUNDLED_CATALOG).expect("bundled catalog is valid json")
    }

    /// Flattens every record that carries an image. Sub-categories are keyed
    /// `<service>/<index>` under [`Section::ServiceDetails`].
    pub fn image_items(&self) -> Vec<CatalogItem> {
        let mut items = Vec::new();
        for service in &self.services {
            items.push(CatalogItem {
                key: ItemKey::service(service.id.as_str()),
                title: service.title.clone(),
                category: service.title.clone(),
                original_image: service.image.clone(),
            });
            for (idx, sub) in service.sub_categories.iter().enumerate() {
                items.push(CatalogItem {
                    key: ItemKey::new(
                        Section::ServiceDetails,
                        format!("{}/{}", service.id, idx),
                    ),
                    title: sub.title.clone(),
                    category: service.title.clone(),
                    original_image: sub.image.clone(),
                });
            }
        }
        for img in &self.gallery {
            items.push(CatalogItem {
                key: ItemKey::gallery(img.id),
                title: img.category.clone(),
                category: img.category.clone(),
                original_image: img.image.clone(),
            });
        }
        for post in &self.blog_posts {
            items.push(CatalogItem {
                key: ItemKey::blog(post.id.as_str()),
                title: post.title.clone(),
                category: post.category.clone(),
                original_image: post.image.clone(),
            });
        }
        for project in &self.featured {
            items.push(CatalogItem {
                key: ItemKey::featured(project.id.as_str()),
                title: project.title.clone(),
                category: project.category.clone(),
                original_image: project.image.clone(),
            });
        }
        items
    }

    pub fn find_item(&self, key: &ItemKey) -> Option<CatalogItem> {
        self.image_items().into_iter().find(|item| &item.key == key)
    }

    pub fn testimonial(&self, id: i64) -> Option<&Testimonial> {
        self.testimonials.iter().find(|t| t.id == id)
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut seen = HashSet::new();
        for item in self.image_items() {
            if !seen.insert(item.key.clone()) {
                return Err(CatalogError::DuplicateItem(item.key));
            }
        }
        let mut testimonial_ids = HashSet::new();
        for t in &self.testimonials {
            if !testimonial_ids.insert(t.id) {
                return Err(CatalogError::DuplicateTestimonial(t.id));
            }
        }
        Ok(())
    }
}

pub fn load_catalog(path: &Path) -> Result<Catalog, CatalogError> {
    let bytes = fs::read(path)?;
    let catalog: Catalog = serde_json::from_slice(&bytes)?;
    catalog.validate()?;
    Ok(catalog)
}

pub fn save_catalog(path: &Path, catalog: &Catalog) -> Result<(), CatalogError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_vec_pretty(catalog)?;
    fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn builtin_catalog_is_complete() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.company.name, "Valuria Shades");
        assert_eq!(catalog.services.len(), 7);
        assert_eq!(catalog.gallery.len(), 9);
        assert_eq!(catalog.blog_posts.len(), 3);
        assert_eq!(catalog.featured.len(), 3);
        assert_eq!(catalog.testimonials.len(), 3);
        catalog.validate().expect("bundled catalog validates");
    }

    #[test]
    fn image_items_cover_every_section() {
        let items = Catalog::builtin().image_items();
        // 7 services + 4 sub-categories + 9 gallery + 3 blog + 3 featured
        assert_eq!(items.len(), 26);

        let curtains = items
            .iter()
            .find(|i| i.key == ItemKey::service("curtains"))
            .expect("curtains");
        assert_eq!(curtains.original_image.as_str(), "https://picsum.photos/id/301/800/600");

        let sheer = items
            .iter()
            .find(|i| i.key == ItemKey::new(Section::ServiceDetails, "curtains/0"))
            .expect("sheer sub-category");
        assert_eq!(sheer.title, "Sheer Elegance");
        assert_eq!(sheer.category, "Curtains & Drapery");

        // Blog "1" and gallery 1 live side by side.
        assert!(items.iter().any(|i| i.key == ItemKey::blog("1")));
        assert!(items.iter().any(|i| i.key == ItemKey::gallery(1)));
    }

    #[test]
    fn find_item_returns_title_and_category() {
        let catalog = Catalog::builtin();
        let post = catalog.find_item(&ItemKey::blog("1")).expect("blog post");
        assert_eq!(post.title, "Top Interior Design Trends for 2024");
        assert_eq!(post.category, "Trends");
        assert!(catalog.find_item(&ItemKey::blog("99")).is_none());
        assert_eq!(catalog.testimonial(2).map(|t| t.name.as_str()), Some("Rajesh Kumar"));
    }

    #[test]
    fn save_then_load_preserves_catalog() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("nested").join("catalog.json");
        let catalog = Catalog::builtin();
        save_catalog(&path, &catalog).expect("save");
        let loaded = load_catalog(&path).expect("load");
        assert_eq!(loaded, catalog);
    }

    #[test]
    fn load_rejects_duplicate_keys() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("catalog.json");
        let mut catalog = Catalog::builtin();
        let dup = catalog.gallery[0].clone();
        catalog.gallery.push(dup);
        save_catalog(&path, &catalog).expect("save");
        match load_catalog(&path) {
            Err(CatalogError::DuplicateItem(key)) => assert_eq!(key, ItemKey::gallery(1)),
            other => panic!("expected duplicate error, got {:?}", other),
        }
    }
}
