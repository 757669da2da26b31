//! RAWLINE SDK for Rust.
//!
//! Keeps an in-memory catalog of pieces and site copy in sync with the
//! hosted document store, and exposes the admin editing surface, media
//! uploads and the AI curator on top of it.
//!
//! # Quick start
//!
//! ```no_run
//! use rawline_sdk::{RawlineClient, RawlineConfig};
//!
//! let config = RawlineConfig::from_env().unwrap();
//! let mut client = RawlineClient::builder().config(config).build().unwrap();
//!
//! // First reload already ran during build()
//! println!("{} pieces, {}", client.catalog().count(), client.health());
//!
//! // Edit as an operator
//! let mut admin = client.admin();
//! admin.login("ops@rawline.example", "secret");
//! ```

pub mod admin;
#[cfg(feature = "async")]
pub mod async_client;
pub mod auth;
pub mod config;
pub mod curator;
pub mod error;
pub mod media;
pub mod models;
pub mod offline;
pub mod snapshot;
pub mod state;
pub mod store;
pub mod sync;

pub use admin::{AdminConsole, AdminSession, AdminState, Notice, NoticeKind};
#[cfg(feature = "async")]
pub use async_client::AsyncRawlineClient;
pub use auth::{AuthSession, Authenticator, FirebaseAuth, StaticAuthenticator};
pub use config::RawlineConfig;
pub use curator::{Curator, CuratorPanel, CuratorState, GeminiCurator, ImageInput};
pub use error::{ErrorKind, RawlineError, Result};
pub use media::{derive_variant_url, CloudinaryHost, MediaHost};
pub use snapshot::SnapshotCache;
pub use state::{CatalogQuery, CatalogState, SyncHealth};
pub use store::{FirestoreStore, MemoryStore, RemoteStore};

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::info;

use crate::models::ContentPatch;
use crate::offline::Offline;

// ---------------------------------------------------------------------------
// RawlineClientBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing a [`RawlineClient`].
///
/// Use [`RawlineClient::builder()`] to obtain a builder, chain configuration
/// methods, and call [`build()`](RawlineClientBuilder::build).
#[derive(Default)]
pub struct RawlineClientBuilder {
    config: Option<RawlineConfig>,
    offline: bool,
    cache_dir: Option<PathBuf>,
    timeout: Option<Duration>,
    skip_initial_reload: bool,
    store: Option<Box<dyn RemoteStore>>,
    media: Option<Box<dyn MediaHost>>,
    auth: Option<Box<dyn Authenticator>>,
    curator: Option<Box<dyn Curator>>,
}

impl RawlineClientBuilder {
    /// Service credentials. Required unless offline or every adapter is
    /// supplied explicitly.
    pub fn config(mut self, config: RawlineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Enable or disable offline mode.
    ///
    /// When offline, no service is contacted: the catalog starts from the
    /// cached snapshot (or the seed data) and the banner reads offline.
    /// Defaults to `false`.
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Keep a last-known-good snapshot in this directory.
    ///
    /// Offline mode without a cache directory uses the platform default
    /// (e.g. `~/.cache/rawline-sdk` on Linux).
    pub fn cache_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.cache_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Per-request HTTP timeout. Unset, the transport default applies.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Do not reload during [`build()`](Self::build); `loading` stays true
    /// until the first [`RawlineClient::reload`].
    pub fn skip_initial_reload(mut self) -> Self {
        self.skip_initial_reload = true;
        self
    }

    pub fn store<S: RemoteStore + 'static>(mut self, store: S) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    pub fn media<M: MediaHost + 'static>(mut self, media: M) -> Self {
        self.media = Some(Box::new(media));
        self
    }

    pub fn authenticator<A: Authenticator + 'static>(mut self, auth: A) -> Self {
        self.auth = Some(Box::new(auth));
        self
    }

    pub fn curator<C: Curator + 'static>(mut self, curator: C) -> Self {
        self.curator = Some(Box::new(curator));
        self
    }

    /// Build the client and run the initial reload.
    pub fn build(self) -> Result<RawlineClient> {
        let snapshot = if self.offline || self.cache_dir.is_some() {
            Some(SnapshotCache::new(self.cache_dir)?)
        } else {
            None
        };

        let state = match snapshot.as_ref().and_then(SnapshotCache::load) {
            Some(saved) => {
                info!(
                    "Starting from snapshot saved {} ({} pieces)",
                    saved.saved_at,
                    saved.items.len()
                );
                CatalogState::from_snapshot(saved.items, saved.content)
            }
            None => CatalogState::new(),
        };

        let timeout = self.timeout;
        let config = self.config;
        let offline = self.offline;

        let store: Box<dyn RemoteStore> = match self.store {
            Some(s) => s,
            None if offline => Box::new(Offline),
            None => Box::new(FirestoreStore::new(require_config(&config)?, timeout)?),
        };
        let media: Box<dyn MediaHost> = match self.media {
            Some(m) => m,
            None if offline => Box::new(Offline),
            None => Box::new(CloudinaryHost::new(require_config(&config)?, timeout)?),
        };
        let auth: Box<dyn Authenticator> = match self.auth {
            Some(a) => a,
            None if offline => Box::new(Offline),
            None => Box::new(FirebaseAuth::new(require_config(&config)?, timeout)?),
        };
        let curator: Option<Box<dyn Curator>> = match self.curator {
            Some(c) => Some(c),
            None if offline => Some(Box::new(Offline)),
            None => match config.as_ref() {
                Some(cfg) if cfg.gemini_api_key.is_some() => {
                    Some(Box::new(GeminiCurator::new(cfg, timeout)?))
                }
                _ => None,
            },
        };

        let mut client = RawlineClient {
            store,
            media,
            auth,
            curator,
            state,
            session: AdminSession::default(),
            snapshot,
        };
        if !self.skip_initial_reload {
            client.reload();
        }
        Ok(client)
    }
}

fn require_config(config: &Option<RawlineConfig>) -> Result<&RawlineConfig> {
    config.as_ref().ok_or_else(|| {
        RawlineError::InvalidArgument(
            "No service configuration; supply one or enable offline mode".into(),
        )
    })
}

// ---------------------------------------------------------------------------
// RawlineClient
// ---------------------------------------------------------------------------

/// The main entry point: owns the gateways, the catalog state and the
/// admin session.
///
/// Created via [`RawlineClient::builder()`].
pub struct RawlineClient {
    store: Box<dyn RemoteStore>,
    media: Box<dyn MediaHost>,
    auth: Box<dyn Authenticator>,
    curator: Option<Box<dyn Curator>>,
    state: CatalogState,
    session: AdminSession,
    snapshot: Option<SnapshotCache>,
}

impl RawlineClient {
    /// Create a new builder for configuring the client.
    pub fn builder() -> RawlineClientBuilder {
        RawlineClientBuilder::default()
    }

    /// Current catalog snapshot.
    pub fn state(&self) -> &CatalogState {
        &self.state
    }

    /// Read-only query interface over the current catalog.
    pub fn catalog(&self) -> CatalogQuery<'_> {
        self.state.query()
    }

    pub fn health(&self) -> SyncHealth {
        self.state.health()
    }

    /// Fetch content and pieces again and merge them into the state.
    pub fn reload(&mut self) -> &CatalogState {
        sync::refresh(&mut self.state, &*self.store, self.snapshot.as_ref());
        &self.state
    }

    /// Stage a content edit in memory without writing it.
    pub fn apply_local_content_edit(&mut self, patch: ContentPatch) {
        self.state.apply_local_content_edit(patch);
    }

    /// Access the admin editing surface.
    ///
    /// The sign-in state lives on the client, so it survives between
    /// console borrows.
    pub fn admin(&mut self) -> AdminConsole<'_> {
        AdminConsole::new(
            &mut self.session,
            &mut self.store,
            &*self.media,
            &*self.auth,
            &mut self.state,
            self.snapshot.as_ref(),
        )
    }

    /// Access the AI curator panel.
    ///
    /// Fails when no generative API key was configured.
    pub fn curator(&self) -> Result<CuratorPanel<'_>> {
        self.curator
            .as_deref()
            .map(|c| CuratorPanel::new(c))
            .ok_or_else(|| RawlineError::InvalidArgument("No curator configured".into()))
    }

    /// Bandwidth-friendly URL for `url` at `width` pixels.
    pub fn variant_url(&self, url: &str, width: Option<u32>) -> String {
        derive_variant_url(url, width.unwrap_or(config::DEFAULT_VARIANT_WIDTH))
    }

    /// Return the snapshot cache, if one is configured.
    pub fn snapshot_cache(&self) -> Option<&SnapshotCache> {
        self.snapshot.as_ref()
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for RawlineClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RawlineClient(pieces={}, health={}, admin={})",
            self.state.items.len(),
            self.state.health(),
            match self.session.state {
                AdminState::LoggedIn(_) => "signed-in",
                _ => "signed-out",
            }
        )
    }
}
