//! Shared test fixtures for the RAWLINE SDK integration tests.
//!
//! Provides scripted stand-ins for the media host and curator, and
//! `setup_client()` which wires a `RawlineClient` to a `MemoryStore` the
//! test keeps a handle on.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use rawline_sdk::curator::{parse_response, Curator, ImageInput};
use rawline_sdk::models::{AnalysisResult, NewItem};
use rawline_sdk::{
    MediaHost, MemoryStore, RawlineClient, RawlineError, RemoteStore, Result, StaticAuthenticator,
};

pub const OPERATOR_EMAIL: &str = "ops@rawline.test";
pub const OPERATOR_PASSWORD: &str = "correct horse";

// -- Media host ---------------------------------------------------------------

/// Media host that hands out predictable URLs, or fails on demand.
#[derive(Clone, Default)]
pub struct ScriptedMedia {
    uploads: Arc<Mutex<Vec<String>>>,
    failing: Arc<Mutex<bool>>,
}

impl ScriptedMedia {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    pub fn uploads(&self) -> Vec<String> {
        self.uploads.lock().unwrap().clone()
    }
}

impl MediaHost for ScriptedMedia {
    fn upload(&self, _bytes: Vec<u8>, _mime_type: &str, file_name: &str) -> Result<String> {
        if *self.failing.lock().unwrap() {
            return Err(RawlineError::Upload("connection reset".into()));
        }
        let url = format!(
            "https://res.cloudinary.com/test/image/upload/v1/rawline/{}",
            file_name
        );
        self.uploads.lock().unwrap().push(url.clone());
        Ok(url)
    }
}

// -- Curator ------------------------------------------------------------------

/// Curator that parses a fixed service response body.
pub struct ScriptedCurator {
    body: serde_json::Value,
}

impl ScriptedCurator {
    pub fn answering(text: &str) -> Self {
        Self {
            body: serde_json::json!({
                "candidates": [{ "content": { "parts": [{ "text": text }] } }]
            }),
        }
    }

    pub fn empty() -> Self {
        Self::answering("")
    }
}

impl Curator for ScriptedCurator {
    fn analyze(&self, _prompt: &str, _image: Option<&ImageInput>) -> Result<AnalysisResult> {
        parse_response(&self.body)
    }
}

// -- Client -------------------------------------------------------------------

/// Client over a fresh in-memory store that requires a token for writes.
///
/// Returns the client plus handles onto its store and media host.
pub fn setup_client() -> (RawlineClient, MemoryStore, ScriptedMedia) {
    setup_client_with(MemoryStore::new())
}

pub fn setup_client_with(store: MemoryStore) -> (RawlineClient, MemoryStore, ScriptedMedia) {
    let store = store.require_auth(true);
    let media = ScriptedMedia::new();
    let client = RawlineClient::builder()
        .store(store.clone())
        .media(media.clone())
        .authenticator(StaticAuthenticator::new(OPERATOR_EMAIL, OPERATOR_PASSWORD))
        .curator(ScriptedCurator::answering(
            r#"{"era":"Late 90s","styleNotes":"been outside","reworkSuggestion":"crop it","rawlineScore":82}"#,
        ))
        .build()
        .unwrap();
    (client, store, media)
}

/// Client already signed in as the operator.
pub fn setup_signed_in() -> (RawlineClient, MemoryStore, ScriptedMedia) {
    let (mut client, store, media) = setup_client();
    client.admin().login(OPERATOR_EMAIL, OPERATOR_PASSWORD);
    (client, store, media)
}

/// Store holding `n` archive pieces created in order.
pub fn store_with_pieces(n: usize) -> MemoryStore {
    let store = MemoryStore::new();
    for i in 1..=n {
        store
            .create_item(&NewItem::archive(format!("RL-ARCH-{:04}", i)))
            .unwrap();
    }
    store
}
