//! Stand-in adapters for offline mode. Every remote call fails with
//! [`RawlineError::Offline`], so reloads keep whatever is already shown
//! and the banner reads "offline".

use crate::auth::{AuthSession, Authenticator};
use crate::curator::{Curator, ImageInput};
use crate::error::{RawlineError, Result};
use crate::media::MediaHost;
use crate::models::{AnalysisResult, ContentPatch, Item, ItemPatch, NewItem, SiteContent};
use crate::store::RemoteStore;

#[derive(Debug, Clone, Copy, Default)]
pub struct Offline;

fn offline<T>(what: &str) -> Result<T> {
    Err(RawlineError::Offline(format!("{} unavailable", what)))
}

impl RemoteStore for Offline {
    fn list_items(&self) -> Result<Vec<Item>> {
        offline("document store")
    }

    fn create_item(&self, _item: &NewItem) -> Result<Item> {
        offline("document store")
    }

    fn update_item(&self, _id: &str, _patch: &ItemPatch) -> Result<()> {
        offline("document store")
    }

    fn delete_item(&self, _id: &str) -> Result<()> {
        offline("document store")
    }

    fn get_site_content(&self) -> Result<Option<ContentPatch>> {
        offline("document store")
    }

    fn save_site_content(&self, _content: &SiteContent) -> Result<()> {
        offline("document store")
    }
}

impl MediaHost for Offline {
    fn upload(&self, _bytes: Vec<u8>, _mime_type: &str, _file_name: &str) -> Result<String> {
        Err(RawlineError::Upload("media host unavailable in offline mode".into()))
    }
}

impl Authenticator for Offline {
    fn sign_in(&self, _email: &str, _password: &str) -> Result<AuthSession> {
        Err(RawlineError::Auth("sign-in unavailable in offline mode".into()))
    }
}

impl Curator for Offline {
    fn analyze(&self, _prompt: &str, _image: Option<&ImageInput>) -> Result<AnalysisResult> {
        offline("curator")
    }
}
