//! Admin editing surface.
//!
//! An [`AdminConsole`] borrows the client's gateways and state. Every
//! mutation goes straight to the store and is followed by a full reload;
//! nothing is applied optimistically. Content edits are the exception:
//! they are staged in memory and written only by
//! [`save_content`](AdminConsole::save_content).

use chrono::Utc;
use log::{info, warn};

use crate::auth::{AuthSession, Authenticator};
use crate::error::{RawlineError, Result};
use crate::media::MediaHost;
use crate::models::{ContentPatch, FitCheck, Item, ItemPatch, NewItem};
use crate::snapshot::SnapshotCache;
use crate::state::CatalogState;
use crate::store::memory::generate_id;
use crate::store::RemoteStore;
use crate::sync;

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminState {
    LoggedOut,
    Authenticating,
    LoggedIn(AuthSession),
    LoginFailed(String),
}

/// What the operator typed into the sign-in form. Kept across failed
/// attempts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Failure,
}

/// One-line acknowledgement of the last admin action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Failure,
            message: message.into(),
        }
    }
}

/// Admin state that outlives a single console borrow.
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub state: AdminState,
    pub form: LoginForm,
    pub notice: Option<Notice>,
}

impl Default for AdminSession {
    fn default() -> Self {
        Self {
            state: AdminState::LoggedOut,
            form: LoginForm::default(),
            notice: None,
        }
    }
}

// ---------------------------------------------------------------------------
// AdminConsole
// ---------------------------------------------------------------------------

pub struct AdminConsole<'a> {
    session: &'a mut AdminSession,
    store: &'a mut Box<dyn RemoteStore>,
    media: &'a dyn MediaHost,
    auth: &'a dyn Authenticator,
    state: &'a mut CatalogState,
    snapshot: Option<&'a SnapshotCache>,
}

impl<'a> AdminConsole<'a> {
    pub fn new(
        session: &'a mut AdminSession,
        store: &'a mut Box<dyn RemoteStore>,
        media: &'a dyn MediaHost,
        auth: &'a dyn Authenticator,
        state: &'a mut CatalogState,
        snapshot: Option<&'a SnapshotCache>,
    ) -> Self {
        Self {
            session,
            store,
            media,
            auth,
            state,
            snapshot,
        }
    }

    pub fn state(&self) -> &AdminState {
        &self.session.state
    }

    pub fn form(&self) -> &LoginForm {
        &self.session.form
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.session.notice.as_ref()
    }

    pub fn catalog(&self) -> &CatalogState {
        &*self.state
    }

    pub fn is_logged_in(&self) -> bool {
        matches!(self.session.state, AdminState::LoggedIn(_))
    }

    // -- Authentication ----------------------------------------------------

    /// Submit credentials. On failure the reason is kept in
    /// [`AdminState::LoginFailed`] and the form is left as typed.
    pub fn login(&mut self, email: &str, password: &str) -> &AdminState {
        self.session.form = LoginForm {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.session.state = AdminState::Authenticating;

        self.session.state = match self.auth.sign_in(email, password) {
            Ok(session) => {
                self.store.authorize(Some(&session.id_token));
                AdminState::LoggedIn(session)
            }
            Err(e) => {
                warn!("Operator sign-in failed: {}", e);
                let reason = match e {
                    RawlineError::Auth(msg) => msg,
                    other => other.to_string(),
                };
                AdminState::LoginFailed(reason)
            }
        };
        &self.session.state
    }

    /// Acknowledge a failed login and return to the form.
    pub fn dismiss_error(&mut self) {
        if matches!(self.session.state, AdminState::LoginFailed(_)) {
            self.session.state = AdminState::LoggedOut;
        }
    }

    pub fn logout(&mut self) {
        if let AdminState::LoggedIn(session) = &self.session.state {
            info!("Operator {} signed out", session.email);
        }
        self.store.authorize(None);
        self.session.state = AdminState::LoggedOut;
    }

    fn require_login(&self) -> Result<()> {
        if self.is_logged_in() {
            Ok(())
        } else {
            Err(RawlineError::Auth("Not signed in".into()))
        }
    }

    // -- Pieces ------------------------------------------------------------

    /// Code for the next archive piece, numbered after the current list.
    pub fn next_archive_code(&self) -> String {
        format!("RL-ARCH-{:04}", self.state.items.len() + 1)
    }

    /// Create a piece from `draft`, applying category defaults.
    pub fn add_item(&mut self, draft: NewItem) -> Result<Item> {
        self.require_login()?;
        let draft = draft.with_category_defaults();
        let result = self.store.create_item(&draft);
        let created = self.record(result, "Piece added")?;
        self.reload();
        Ok(created)
    }

    /// Write one or more fields of a piece, then reload.
    ///
    /// A piece that no longer exists remotely is reported as
    /// [`NotFound`](RawlineError::NotFound) and the list is reloaded so it
    /// drops out of view.
    pub fn update_field(&mut self, id: &str, patch: ItemPatch) -> Result<()> {
        self.require_login()?;
        match self.store.update_item(id, &patch) {
            Ok(()) => {
                self.session.notice = Some(Notice::success("Piece updated"));
                self.reload();
                Ok(())
            }
            Err(e @ RawlineError::NotFound(_)) => {
                self.session.notice = Some(Notice::failure("Piece no longer exists"));
                self.reload();
                Err(e)
            }
            Err(e) => {
                self.session.notice = Some(Notice::failure(format!("Update failed: {}", e)));
                Err(e)
            }
        }
    }

    /// Permanently delete a piece once `confirm` agrees. Returns whether
    /// anything was deleted.
    pub fn delete_item<F>(&mut self, id: &str, confirm: F) -> Result<bool>
    where
        F: FnOnce(&Item) -> bool,
    {
        self.require_login()?;
        let item = self.find(id)?;
        if !confirm(item) {
            return Ok(false);
        }
        let result = self.store.delete_item(id);
        self.record(result, "Piece deleted")?;
        self.reload();
        Ok(true)
    }

    /// Upload new primary media and point the piece at it.
    pub fn replace_media(
        &mut self,
        id: &str,
        bytes: Vec<u8>,
        mime_type: &str,
        file_name: &str,
    ) -> Result<String> {
        self.require_login()?;
        self.find(id)?;
        let url = self.upload(bytes, mime_type, file_name)?;
        self.update_field(id, ItemPatch::default().image_url(url.clone()))?;
        Ok(url)
    }

    /// Upload media and append it to the piece's gallery.
    pub fn append_gallery_media(
        &mut self,
        id: &str,
        bytes: Vec<u8>,
        mime_type: &str,
        file_name: &str,
    ) -> Result<String> {
        self.require_login()?;
        let mut gallery = self.find(id)?.additional_images.clone();
        let url = self.upload(bytes, mime_type, file_name)?;
        gallery.push(url.clone());
        self.update_field(id, ItemPatch::default().additional_images(gallery))?;
        Ok(url)
    }

    /// Drop the gallery entry at `index`.
    pub fn remove_gallery_media(&mut self, id: &str, index: usize) -> Result<String> {
        self.require_login()?;
        let mut gallery = self.find(id)?.additional_images.clone();
        if index >= gallery.len() {
            return Err(RawlineError::InvalidArgument(format!(
                "gallery index {} out of range ({} entries)",
                index,
                gallery.len()
            )));
        }
        let removed = gallery.remove(index);
        self.update_field(id, ItemPatch::default().additional_images(gallery))?;
        Ok(removed)
    }

    // -- Site content ------------------------------------------------------

    /// Stage a content edit locally.
    pub fn stage_content(&mut self, patch: ContentPatch) -> Result<()> {
        self.require_login()?;
        self.state.apply_local_content_edit(patch);
        Ok(())
    }

    /// Upload a hero background and stage it as the primary hero media.
    pub fn upload_hero_media(
        &mut self,
        bytes: Vec<u8>,
        mime_type: &str,
        file_name: &str,
    ) -> Result<String> {
        self.require_login()?;
        let url = self.upload(bytes, mime_type, file_name)?;
        self.state
            .apply_local_content_edit(ContentPatch::hero_media_url(url.clone()));
        Ok(url)
    }

    /// Upload an image and stage it at the end of the hero carousel.
    pub fn add_hero_image(
        &mut self,
        bytes: Vec<u8>,
        mime_type: &str,
        file_name: &str,
    ) -> Result<String> {
        self.require_login()?;
        let url = self.upload(bytes, mime_type, file_name)?;
        let mut images = self.state.content.hero_images.clone();
        images.push(url.clone());
        self.state.apply_local_content_edit(ContentPatch {
            hero_images: Some(images),
            ..ContentPatch::default()
        });
        Ok(url)
    }

    /// Upload a fit-check clip and stage a new entry for it.
    pub fn add_fit_check(
        &mut self,
        title: &str,
        description: Option<&str>,
        bytes: Vec<u8>,
        mime_type: &str,
        file_name: &str,
    ) -> Result<FitCheck> {
        self.require_login()?;
        let url = self.upload(bytes, mime_type, file_name)?;
        let now = Utc::now();
        let fit = FitCheck {
            id: format!("fit-{}", generate_id()),
            video_url: url,
            title: title.to_string(),
            description: description.map(str::to_string),
            created_at: Some(now),
        };
        let mut fits = self.state.content.fit_checks.clone();
        fits.push(fit.clone());
        self.state.apply_local_content_edit(ContentPatch {
            fit_checks: Some(fits),
            ..ContentPatch::default()
        });
        Ok(fit)
    }

    /// Stage removal of a fit check. Returns whether it existed.
    pub fn remove_fit_check(&mut self, id: &str) -> Result<bool> {
        self.require_login()?;
        let mut fits = self.state.content.fit_checks.clone();
        let before = fits.len();
        fits.retain(|f| f.id != id);
        let removed = fits.len() != before;
        if removed {
            self.state.apply_local_content_edit(ContentPatch {
                fit_checks: Some(fits),
                ..ContentPatch::default()
            });
        }
        Ok(removed)
    }

    /// Overwrite the remote content document with the staged content.
    pub fn save_content(&mut self) -> Result<()> {
        self.require_login()?;
        let result = self.store.save_site_content(&self.state.content);
        self.record(result, "Site content synchronized with cloud.")?;
        self.reload();
        Ok(())
    }

    // -- Helpers -----------------------------------------------------------

    fn find(&self, id: &str) -> Result<&Item> {
        self.state
            .query()
            .get(id)
            .ok_or_else(|| RawlineError::NotFound(format!("piece {}", id)))
    }

    /// Upload through the media host. Failure records a notice and stops
    /// the caller before any field is written.
    fn upload(&mut self, bytes: Vec<u8>, mime_type: &str, file_name: &str) -> Result<String> {
        let result = self.media.upload(bytes, mime_type, file_name);
        if result.is_err() {
            self.session.notice = Some(Notice::failure(
                "Upload failed. Verify media host configuration.",
            ));
        }
        result
    }

    fn record<T>(&mut self, result: Result<T>, success: &str) -> Result<T> {
        self.session.notice = Some(match &result {
            Ok(_) => Notice::success(success),
            Err(e) => Notice::failure(format!("Action failed: {}", e)),
        });
        result
    }

    fn reload(&mut self) {
        sync::refresh(&mut *self.state, &**self.store, self.snapshot);
    }
}
