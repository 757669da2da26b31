use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// FitCheck — Styled-fit clip shown on the fits page
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FitCheck {
    pub id: String,
    pub video_url: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// SiteContent — The singleton copy document
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteContent {
    pub hero_title: String,
    pub hero_sub_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hero_media_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hero_images: Vec<String>,
    pub archive_statement_title: String,
    pub archive_statement_text1: String,
    pub archive_statement_text2: String,
    pub footer_tagline: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fit_checks: Vec<FitCheck>,
}

impl Default for SiteContent {
    fn default() -> Self {
        Self {
            hero_title: "RAWLINE".to_string(),
            hero_sub_title: "Identifying, collecting, and styling garments across time.".to_string(),
            hero_media_url: None,
            hero_images: Vec::new(),
            archive_statement_title: "THE RAW NOTION.".to_string(),
            archive_statement_text1: "RAWLINE identifies, collects, styles, and archives vintage \
                garments. Pieces are sourced across eras, documented, and preserved."
                .to_string(),
            archive_statement_text2: "Some remain untouched. Some are styled into modern fits. \
                Everything ends up on record."
                .to_string(),
            footer_tagline: "ESTABLISHED AS A LIVING RECORD OF STYLE".to_string(),
            fit_checks: Vec::new(),
        }
    }
}

impl SiteContent {
    /// Shallow per-field merge: every field present in `patch` wins, the
    /// rest keep their current value.
    pub fn merge(&mut self, patch: ContentPatch) {
        let ContentPatch {
            hero_title,
            hero_sub_title,
            hero_media_url,
            hero_images,
            archive_statement_title,
            archive_statement_text1,
            archive_statement_text2,
            footer_tagline,
            fit_checks,
        } = patch;

        override_if_present(&mut self.hero_title, hero_title);
        override_if_present(&mut self.hero_sub_title, hero_sub_title);
        if hero_media_url.is_some() {
            self.hero_media_url = hero_media_url;
        }
        override_if_present(&mut self.hero_images, hero_images);
        override_if_present(&mut self.archive_statement_title, archive_statement_title);
        override_if_present(&mut self.archive_statement_text1, archive_statement_text1);
        override_if_present(&mut self.archive_statement_text2, archive_statement_text2);
        override_if_present(&mut self.footer_tagline, footer_tagline);
        override_if_present(&mut self.fit_checks, fit_checks);
    }

    pub fn merged(mut self, patch: ContentPatch) -> Self {
        self.merge(patch);
        self
    }

    pub fn fit_check(&self, id: &str) -> Option<&FitCheck> {
        self.fit_checks.iter().find(|f| f.id == id)
    }
}

fn override_if_present<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

// ---------------------------------------------------------------------------
// ContentPatch — Partial content, as read remotely or staged locally
// ---------------------------------------------------------------------------

/// Every [`SiteContent`] field as optional.
///
/// The remote document may be missing fields (older deployments), and
/// the admin surface stages one field at a time, so both use this shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hero_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hero_sub_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hero_media_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hero_images: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive_statement_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive_statement_text1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive_statement_text2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer_tagline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fit_checks: Option<Vec<FitCheck>>,
}

impl ContentPatch {
    pub fn hero_title(v: impl Into<String>) -> Self {
        Self {
            hero_title: Some(v.into()),
            ..Self::default()
        }
    }

    pub fn hero_sub_title(v: impl Into<String>) -> Self {
        Self {
            hero_sub_title: Some(v.into()),
            ..Self::default()
        }
    }

    pub fn hero_media_url(v: impl Into<String>) -> Self {
        Self {
            hero_media_url: Some(v.into()),
            ..Self::default()
        }
    }

    pub fn footer_tagline(v: impl Into<String>) -> Self {
        Self {
            footer_tagline: Some(v.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl From<SiteContent> for ContentPatch {
    fn from(c: SiteContent) -> Self {
        Self {
            hero_title: Some(c.hero_title),
            hero_sub_title: Some(c.hero_sub_title),
            hero_media_url: c.hero_media_url,
            hero_images: Some(c.hero_images),
            archive_statement_title: Some(c.archive_statement_title),
            archive_statement_text1: Some(c.archive_statement_text1),
            archive_statement_text2: Some(c.archive_statement_text2),
            footer_tagline: Some(c.footer_tagline),
            fit_checks: Some(c.fit_checks),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_overrides_present_fields_only() {
        let mut content = SiteContent::default();
        content.merge(ContentPatch {
            hero_title: Some("LOCAL".into()),
            footer_tagline: Some("A".into()),
            ..ContentPatch::default()
        });
        content.merge(ContentPatch::footer_tagline("B"));

        assert_eq!(content.hero_title, "LOCAL");
        assert_eq!(content.footer_tagline, "B");
        assert_eq!(content.archive_statement_title, "THE RAW NOTION.");
    }

    #[test]
    fn partial_document_decodes() {
        let patch: ContentPatch =
            serde_json::from_value(serde_json::json!({"heroTitle": "RAW"})).unwrap();
        assert_eq!(patch.hero_title.as_deref(), Some("RAW"));
        assert!(patch.fit_checks.is_none());
        assert!(!patch.is_empty());
    }
}
