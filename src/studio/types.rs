use std::fmt;

use serde::{Deserialize, Serialize};

/// Raw identifier of a catalog record. Services and blog posts use text ids,
/// gallery images and testimonials use numbers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemId {
    Number(i64),
    Text(String),
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemId::Number(n) => write!(f, "{}", n),
            ItemId::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        ItemId::Text(value.to_string())
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        ItemId::Text(value)
    }
}

impl From<i64> for ItemId {
    fn from(value: i64) -> Self {
        ItemId::Number(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Services,
    ServiceDetails,
    Gallery,
    Blog,
    Featured,
}

impl Section {
    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Services => "services",
            Section::ServiceDetails => "service_details",
            Section::Gallery => "gallery",
            Section::Blog => "blog",
            Section::Featured => "featured",
        }
    }
}

/// Identity of an image-bearing item across the whole site.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemKey {
    pub section: Section,
    pub id: ItemId,
}

impl ItemKey {
    pub fn new(section: Section, id: impl Into<ItemId>) -> Self {
        Self { section, id: id.into() }
    }

    pub fn service(id: impl Into<ItemId>) -> Self {
        Self::new(Section::Services, id)
    }

    pub fn gallery(id: i64) -> Self {
        Self::new(Section::Gallery, id)
    }

    pub fn blog(id: impl Into<ItemId>) -> Self {
        Self::new(Section::Blog, id)
    }

    pub fn featured(id: impl Into<ItemId>) -> Self {
        Self::new(Section::Featured, id)
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.section.as_str(), self.id)
    }
}

/// Something a renderer can put in an `<img src>`: a remote URL or a data URI.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Wraps an already base64-encoded payload.
    pub fn data_uri(mime_type: &str, base64_payload: &str) -> Self {
        Self(format!("data:{};base64,{}", mime_type, base64_payload))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_data_uri(&self) -> bool {
        self.0.starts_with("data:")
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ImageRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub key: ItemKey,
    pub title: String,
    pub category: String,
    pub original_image: ImageRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlaySource {
    Upload,
    Generated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[serde(rename = "16:9")]
    Landscape,
    #[serde(rename = "9:16")]
    Portrait,
    #[serde(rename = "1:1")]
    Square,
    #[default]
    #[serde(rename = "4:3")]
    Standard,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
            AspectRatio::Square => "1:1",
            AspectRatio::Standard => "4:3",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Quality {
    #[default]
    #[serde(rename = "1K")]
    OneK,
    #[serde(rename = "2K")]
    TwoK,
}

impl Quality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::OneK => "1K",
            Quality::TwoK => "2K",
        }
    }
}

pub const DEFAULT_ROOM_TYPE: &str = "Living Room";

pub const ROOM_TYPES: &[&str] = &[
    "Living Room",
    "Bedroom",
    "Kitchen",
    "Dining Room",
    "Home Office",
    "Kids Room",
    "Balcony",
];

fn default_room_type() -> String {
    DEFAULT_ROOM_TYPE.to_string()
}

/// User-editable knobs for preview generation. Copied at request time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationSettings {
    #[serde(default = "default_room_type")]
    pub room_type: String,
    #[serde(default)]
    pub aspect_ratio: AspectRatio,
    #[serde(default)]
    pub quality: Quality,
    #[serde(default)]
    pub instructions: String,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            room_type: default_room_type(),
            aspect_ratio: AspectRatio::default(),
            quality: Quality::default(),
            instructions: String::new(),
        }
    }
}

/// What the rendering layer needs to draw one card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedItem {
    pub key: ItemKey,
    pub title: String,
    pub category: String,
    pub image: ImageRef,
    pub overridden: bool,
    pub generating: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_id_accepts_text_and_numbers() {
        let ids: Vec<ItemId> = serde_json::from_str(r#"["curtains", 3]"#).expect("parse ids");
        assert_eq!(ids[0], ItemId::from("curtains"));
        assert_eq!(ids[1], ItemId::Number(3));
        assert_eq!(ItemKey::gallery(3).to_string(), "gallery/3");
    }

    #[test]
    fn settings_use_wire_spellings() {
        let settings: GenerationSettings =
            serde_json::from_str(r#"{"aspectRatio":"16:9","quality":"2K"}"#).expect("parse settings");
        assert_eq!(settings.aspect_ratio, AspectRatio::Landscape);
        assert_eq!(settings.quality, Quality::TwoK);
        assert_eq!(settings.room_type, DEFAULT_ROOM_TYPE);
        assert!(settings.instructions.is_empty());

        let json = serde_json::to_value(GenerationSettings::default()).expect("serialize");
        assert_eq!(json["aspectRatio"], "4:3");
        assert_eq!(json["quality"], "1K");
    }
}
