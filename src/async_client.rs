//! Async wrapper around [`RawlineClient`] for use in async runtimes (Tokio, etc.).
//!
//! Runs every client operation on a blocking thread pool via
//! [`tokio::task::spawn_blocking`], keeping the async event loop free while
//! the blocking HTTP calls are in flight.
//!
//! Calls are serialized by a mutex, so two reloads issued at once run one
//! after the other and the later one decides what is shown.
//!
//! # Example
//!
//! ```no_run
//! use rawline_sdk::{AsyncRawlineClient, RawlineConfig};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let config = RawlineConfig::from_env().unwrap();
//!     let client = AsyncRawlineClient::builder().config(config).build().await.unwrap();
//!
//!     let state = client.reload().await.unwrap();
//!     println!("{} pieces", state.items.len());
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::RawlineConfig;
use crate::error::{RawlineError, Result};
use crate::models::{ContentPatch, Item, ItemPatch, NewItem};
use crate::state::CatalogState;
use crate::RawlineClient;

// ---------------------------------------------------------------------------
// AsyncRawlineClientBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing an [`AsyncRawlineClient`].
///
/// Covers the network-backed setup; for injected adapters build a
/// [`RawlineClient`] and wrap it with [`AsyncRawlineClient::from_client`].
#[derive(Default)]
pub struct AsyncRawlineClientBuilder {
    config: Option<RawlineConfig>,
    offline: bool,
    cache_dir: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl AsyncRawlineClientBuilder {
    pub fn config(mut self, config: RawlineConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    pub fn cache_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.cache_dir = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the client (including its first reload) on the blocking
    /// thread pool.
    pub async fn build(self) -> Result<AsyncRawlineClient> {
        tokio::task::spawn_blocking(move || {
            let mut builder = RawlineClient::builder().offline(self.offline);
            if let Some(config) = self.config {
                builder = builder.config(config);
            }
            if let Some(dir) = self.cache_dir {
                builder = builder.cache_dir(dir);
            }
            if let Some(timeout) = self.timeout {
                builder = builder.timeout(timeout);
            }
            Ok(AsyncRawlineClient::from_client(builder.build()?))
        })
        .await
        .map_err(|e| RawlineError::InvalidArgument(format!("Task join error: {e}")))?
    }
}

// ---------------------------------------------------------------------------
// AsyncRawlineClient
// ---------------------------------------------------------------------------

/// Async wrapper around [`RawlineClient`].
///
/// All operations are dispatched to a blocking thread pool via
/// [`tokio::task::spawn_blocking`]. The underlying client is protected by
/// a [`Mutex`].
#[derive(Clone)]
pub struct AsyncRawlineClient {
    inner: Arc<Mutex<RawlineClient>>,
}

impl AsyncRawlineClient {
    pub fn builder() -> AsyncRawlineClientBuilder {
        AsyncRawlineClientBuilder::default()
    }

    pub fn from_client(client: RawlineClient) -> Self {
        Self {
            inner: Arc::new(Mutex::new(client)),
        }
    }

    /// Run a sync client operation on the blocking thread pool.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use rawline_sdk::AsyncRawlineClient;
    /// # async fn example(client: AsyncRawlineClient) -> rawline_sdk::Result<()> {
    /// let flower = client.run(|c| {
    ///     Ok(c.catalog().count_by_category(rawline_sdk::models::Category::Flower))
    /// }).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut RawlineClient) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let client = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = client
                .lock()
                .map_err(|_| RawlineError::InvalidArgument("Client lock poisoned".into()))?;
            f(&mut guard)
        })
        .await
        .map_err(|e| RawlineError::InvalidArgument(format!("Task join error: {e}")))?
    }

    /// Reload and return a copy of the resulting state.
    pub async fn reload(&self) -> Result<CatalogState> {
        self.run(|c| Ok(c.reload().clone())).await
    }

    /// Copy of the current state without reloading.
    pub async fn state(&self) -> Result<CatalogState> {
        self.run(|c| Ok(c.state().clone())).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<bool> {
        let email = email.to_string();
        let password = password.to_string();
        self.run(move |c| {
            let mut admin = c.admin();
            admin.login(&email, &password);
            Ok(admin.is_logged_in())
        })
        .await
    }

    pub async fn add_item(&self, draft: NewItem) -> Result<Item> {
        self.run(move |c| c.admin().add_item(draft)).await
    }

    pub async fn update_field(&self, id: &str, patch: ItemPatch) -> Result<()> {
        let id = id.to_string();
        self.run(move |c| c.admin().update_field(&id, patch)).await
    }

    pub async fn stage_content(&self, patch: ContentPatch) -> Result<()> {
        self.run(move |c| c.admin().stage_content(patch)).await
    }

    pub async fn save_content(&self) -> Result<()> {
        self.run(|c| c.admin().save_content()).await
    }
}
