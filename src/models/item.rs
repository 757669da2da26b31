use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{RawlineError, Result};

// ---------------------------------------------------------------------------
// ItemStatus — Lifecycle tag
// ---------------------------------------------------------------------------

/// Lifecycle tag of a piece.
///
/// The archive site uses the first five values, the storefront the last
/// four. Values the SDK does not know deserialize to `Unknown` so one odd
/// document cannot break a whole listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemStatus {
    Archived,
    Active,
    Worn,
    Released,
    Study,
    InStock,
    OutOfStock,
    Limited,
    New,
    #[serde(other)]
    Unknown,
}

impl ItemStatus {
    /// Whether the piece can currently be bought in the storefront.
    pub fn is_available(self) -> bool {
        matches!(self, ItemStatus::InStock | ItemStatus::Limited | ItemStatus::New)
    }
}

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Flower,
    #[serde(rename = "Pre-Rolls")]
    PreRolls,
    Edibles,
    Vapes,
    Concentrates,
    #[serde(rename = "Original Record")]
    OriginalRecord,
    #[serde(other)]
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Flower,
        Category::PreRolls,
        Category::Edibles,
        Category::Vapes,
        Category::Concentrates,
        Category::OriginalRecord,
    ];

    /// Price applied when a new piece of this category is created without one.
    pub fn default_price(self) -> Option<f64> {
        match self {
            Category::Flower => Some(45.0),
            Category::PreRolls => Some(15.0),
            Category::Edibles => Some(25.0),
            Category::Vapes => Some(40.0),
            Category::Concentrates => Some(60.0),
            Category::OriginalRecord | Category::Other => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Flower => "Flower",
            Category::PreRolls => "Pre-Rolls",
            Category::Edibles => "Edibles",
            Category::Vapes => "Vapes",
            Category::Concentrates => "Concentrates",
            Category::OriginalRecord => "Original Record",
            Category::Other => "Other",
        }
    }

    /// Case-insensitive lookup by display label.
    pub fn from_label(label: &str) -> Option<Category> {
        Category::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(label.trim()))
    }
}

// ---------------------------------------------------------------------------
// Item — One catalog piece as stored remotely
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub code: String,
    /// Era for archive pieces, strain for storefront products.
    #[serde(default)]
    pub era: String,
    pub status: ItemStatus,
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(
        rename = "classification",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub category: Option<Category>,
    /// THC percentage for storefront products.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub potency: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Item {
    /// Apply every field set on `patch`, leaving the rest untouched.
    pub fn apply(&mut self, patch: &ItemPatch) {
        if let Some(v) = &patch.code {
            self.code = v.clone();
        }
        if let Some(v) = &patch.era {
            self.era = v.clone();
        }
        if let Some(v) = patch.status {
            self.status = v;
        }
        if let Some(v) = &patch.image_url {
            self.image_url = v.clone();
        }
        if let Some(v) = &patch.additional_images {
            self.additional_images = v.clone();
        }
        if let Some(v) = &patch.description {
            self.description = Some(v.clone());
        }
        if let Some(v) = &patch.material {
            self.material = Some(v.clone());
        }
        if let Some(v) = &patch.condition {
            self.condition = Some(v.clone());
        }
        if let Some(v) = patch.category {
            self.category = Some(v);
        }
        if let Some(v) = patch.potency {
            self.potency = Some(v);
        }
        if let Some(v) = patch.price {
            self.price = Some(v);
        }
        if let Some(v) = &patch.weight {
            self.weight = Some(v.clone());
        }
    }

    /// Price shown to shoppers: the stored price, else the category default.
    pub fn display_price(&self) -> Option<f64> {
        self.price
            .or_else(|| self.category.and_then(Category::default_price))
    }

    /// Primary media followed by the gallery, in display order.
    pub fn media(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.image_url.as_str())
            .chain(self.additional_images.iter().map(String::as_str))
    }
}

// ---------------------------------------------------------------------------
// NewItem — Caller-supplied fields for creation
// ---------------------------------------------------------------------------

/// Fields for a piece that does not exist yet. The store assigns the id
/// and creation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    pub code: String,
    pub era: String,
    pub status: ItemStatus,
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(
        rename = "classification",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub potency: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<String>,
}

/// Placeholder media used for freshly added pieces until the operator
/// uploads a real photo.
pub const PLACEHOLDER_IMAGE: &str = "https://picsum.photos/800/1000";

impl NewItem {
    /// Archive draft with the defaults the admin surface uses for "add".
    pub fn archive(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            era: "1990s".to_string(),
            status: ItemStatus::Archived,
            image_url: PLACEHOLDER_IMAGE.to_string(),
            additional_images: Vec::new(),
            description: None,
            material: Some("Nylon".to_string()),
            condition: Some("Archive".to_string()),
            category: Some(Category::OriginalRecord),
            potency: None,
            price: None,
            weight: None,
        }
    }

    /// Storefront draft for `category`. The category's default price is
    /// applied on creation if none is set.
    pub fn product(code: impl Into<String>, category: Category) -> Self {
        Self {
            code: code.into(),
            era: "Hybrid".to_string(),
            status: ItemStatus::New,
            image_url: PLACEHOLDER_IMAGE.to_string(),
            additional_images: Vec::new(),
            description: None,
            material: None,
            condition: None,
            category: Some(category),
            potency: None,
            price: None,
            weight: None,
        }
    }

    /// Fill fields the caller left empty from the category table.
    pub fn with_category_defaults(mut self) -> Self {
        if self.price.is_none() {
            self.price = self.category.and_then(Category::default_price);
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.image_url.trim().is_empty() {
            return Err(RawlineError::InvalidArgument(
                "Primary media reference must not be empty".into(),
            ));
        }
        check_non_negative("price", self.price)?;
        check_non_negative("potency", self.potency)
    }

    /// Materialize the stored piece once the store has assigned identity.
    pub fn into_item(self, id: String, created_at: Option<DateTime<Utc>>) -> Item {
        Item {
            id,
            code: self.code,
            era: self.era,
            status: self.status,
            image_url: self.image_url,
            additional_images: self.additional_images,
            description: self.description,
            material: self.material,
            condition: self.condition,
            category: self.category,
            potency: self.potency,
            price: self.price,
            weight: self.weight,
            created_at,
        }
    }
}

// ---------------------------------------------------------------------------
// ItemPatch — Partial update
// ---------------------------------------------------------------------------

/// A partial update. Only the fields that are `Some` are written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub era: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ItemStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_images: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(rename = "classification", skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub potency: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<String>,
}

impl ItemPatch {
    pub fn code(mut self, v: impl Into<String>) -> Self {
        self.code = Some(v.into());
        self
    }

    pub fn era(mut self, v: impl Into<String>) -> Self {
        self.era = Some(v.into());
        self
    }

    pub fn status(mut self, v: ItemStatus) -> Self {
        self.status = Some(v);
        self
    }

    pub fn image_url(mut self, v: impl Into<String>) -> Self {
        self.image_url = Some(v.into());
        self
    }

    pub fn additional_images(mut self, v: Vec<String>) -> Self {
        self.additional_images = Some(v);
        self
    }

    pub fn description(mut self, v: impl Into<String>) -> Self {
        self.description = Some(v.into());
        self
    }

    pub fn material(mut self, v: impl Into<String>) -> Self {
        self.material = Some(v.into());
        self
    }

    pub fn condition(mut self, v: impl Into<String>) -> Self {
        self.condition = Some(v.into());
        self
    }

    pub fn category(mut self, v: Category) -> Self {
        self.category = Some(v);
        self
    }

    pub fn potency(mut self, v: f64) -> Self {
        self.potency = Some(v);
        self
    }

    pub fn price(mut self, v: f64) -> Self {
        self.price = Some(v);
        self
    }

    pub fn weight(mut self, v: impl Into<String>) -> Self {
        self.weight = Some(v.into());
        self
    }

    /// Wire names of the fields this patch writes, in declaration order.
    pub fn field_paths(&self) -> Vec<&'static str> {
        let mut paths = Vec::new();
        let fields: [(&'static str, bool); 12] = [
            ("code", self.code.is_some()),
            ("era", self.era.is_some()),
            ("status", self.status.is_some()),
            ("imageUrl", self.image_url.is_some()),
            ("additionalImages", self.additional_images.is_some()),
            ("description", self.description.is_some()),
            ("material", self.material.is_some()),
            ("condition", self.condition.is_some()),
            ("classification", self.category.is_some()),
            ("potency", self.potency.is_some()),
            ("price", self.price.is_some()),
            ("weight", self.weight.is_some()),
        ];
        for (name, set) in fields {
            if set {
                paths.push(name);
            }
        }
        paths
    }

    pub fn is_empty(&self) -> bool {
        self.field_paths().is_empty()
    }

    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(RawlineError::InvalidArgument("Empty item patch".into()));
        }
        if let Some(url) = &self.image_url {
            if url.trim().is_empty() {
                return Err(RawlineError::InvalidArgument(
                    "Primary media reference must not be empty".into(),
                ));
            }
        }
        check_non_negative("price", self.price)?;
        check_non_negative("potency", self.potency)
    }
}

fn check_non_negative(field: &str, value: Option<f64>) -> Result<()> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => Err(RawlineError::InvalidArgument(format!(
            "{} must be a non-negative number, got {}",
            field, v
        ))),
        _ => Ok(()),
    }
}

/// True when the URL points at video rather than a still image.
pub fn is_video_url(url: &str) -> bool {
    if url.contains("/video/") {
        return true;
    }
    let path = url.split(['?', '#']).next().unwrap_or(url).to_ascii_lowercase();
    [".mp4", ".webm", ".ogg", ".mov"]
        .iter()
        .any(|ext| path.ends_with(ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_reports_only_set_fields() {
        let patch = ItemPatch::default().price(75.0).era("Sativa");
        assert_eq!(patch.field_paths(), vec!["era", "price"]);
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({"era": "Sativa", "price": 75.0}));
    }

    #[test]
    fn negative_numbers_rejected() {
        assert!(ItemPatch::default().price(-1.0).validate().is_err());
        assert!(ItemPatch::default().potency(f64::NAN).validate().is_err());
        assert!(ItemPatch::default().validate().is_err());
        assert!(ItemPatch::default().price(0.0).validate().is_ok());
    }

    #[test]
    fn flower_gets_default_price() {
        let draft = NewItem::product("GL-001", Category::Flower).with_category_defaults();
        assert_eq!(draft.price, Some(45.0));

        let priced = NewItem {
            price: Some(30.0),
            ..NewItem::product("GL-002", Category::Flower)
        }
        .with_category_defaults();
        assert_eq!(priced.price, Some(30.0));
    }

    #[test]
    fn storefront_helpers() {
        assert!(ItemStatus::InStock.is_available());
        assert!(ItemStatus::New.is_available());
        assert!(!ItemStatus::OutOfStock.is_available());
        assert!(!ItemStatus::Archived.is_available());

        assert_eq!(Category::from_label(" pre-rolls "), Some(Category::PreRolls));
        assert_eq!(Category::from_label("Original Record"), Some(Category::OriginalRecord));
        assert_eq!(Category::from_label("Tinctures"), None);

        let mut item = NewItem::product("GL-003", Category::Vapes).into_item("v".into(), None);
        assert_eq!(item.display_price(), Some(40.0));
        item.price = Some(52.0);
        assert_eq!(item.display_price(), Some(52.0));
        let archive = NewItem::archive("RL-1").into_item("a".into(), None);
        assert_eq!(archive.display_price(), None);
    }

    #[test]
    fn unknown_tags_do_not_fail_decoding() {
        let item: Item = serde_json::from_value(serde_json::json!({
            "id": "a",
            "code": "RL-1",
            "status": "SOLD",
            "imageUrl": "https://x/y.jpg",
            "classification": "Tinctures"
        }))
        .unwrap();
        assert_eq!(item.status, ItemStatus::Unknown);
        assert_eq!(item.category, Some(Category::Other));
        assert!(item.additional_images.is_empty());
    }

    #[test]
    fn video_detection() {
        assert!(is_video_url("https://res.cloudinary.com/x/video/upload/a.jpg"));
        assert!(is_video_url("https://cdn.example.com/clip.MOV"));
        assert!(is_video_url("https://cdn.example.com/clip.mp4?t=3"));
        assert!(!is_video_url("https://cdn.example.com/still.jpg"));
    }
}
