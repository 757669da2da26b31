//! The reload routine: fetch content and pieces, merge them into the
//! state, and classify any failure for the banner.

use log::{debug, info, warn};

use crate::error::{ErrorKind, RawlineError, Result};
use crate::snapshot::SnapshotCache;
use crate::state::CatalogState;
use crate::store::RemoteStore;

/// Banner text for a failed reload.
pub fn classify_failure(err: &RawlineError) -> String {
    match err.kind() {
        ErrorKind::Permission => {
            "Access Blocked: update the document store's security rules to allow public reads."
                .to_string()
        }
        _ => format!("Cloud Link Failed: {}", failure_detail(err)),
    }
}

fn failure_detail(err: &RawlineError) -> String {
    match err {
        RawlineError::Remote { status, .. } => format!("HTTP {}", status),
        RawlineError::Http(e) if e.is_timeout() => "Timed Out".to_string(),
        RawlineError::Http(e) if e.is_connect() => "Check Connection".to_string(),
        RawlineError::Json(_) => "Unreadable Response".to_string(),
        RawlineError::Offline(_) => "Offline Mode".to_string(),
        _ => "Check Connection".to_string(),
    }
}

/// Run one reload against `store` and return the next state.
///
/// Remote content is merged field by field over what is already shown.
/// A non-empty remote listing replaces the pieces; an empty one leaves
/// the current list alone. On failure the error is recorded and the
/// existing pieces and content stay as they were. `loading` is always
/// cleared.
pub fn reload(mut state: CatalogState, store: &dyn RemoteStore) -> CatalogState {
    state.last_error = None;

    if let Err(e) = fetch_into(&mut state, store) {
        warn!("Data synchronization error: {}", e);
        state.last_error = Some(classify_failure(&e));
    }

    state.loading = false;
    state
}

/// Reload `state` in place and, when the reload reached the store,
/// persist the result to `snapshot`.
pub fn refresh(
    state: &mut CatalogState,
    store: &dyn RemoteStore,
    snapshot: Option<&SnapshotCache>,
) {
    *state = reload(std::mem::take(state), store);
    if state.last_error.is_some() {
        return;
    }
    if let Some(cache) = snapshot {
        if let Err(e) = cache.save(state) {
            warn!("Could not persist catalog snapshot: {}", e);
        }
    }
}

fn fetch_into(state: &mut CatalogState, store: &dyn RemoteStore) -> Result<()> {
    if let Some(remote) = store.get_site_content()? {
        debug!("Merging remote site content");
        state.content.merge(remote);
    }

    let items = store.list_items()?;
    if items.is_empty() {
        info!("Store returned no pieces; keeping {} shown", state.items.len());
    } else {
        info!("Synced {} pieces", items.len());
        state.items = items;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::{Failure, MemoryStore};

    #[test]
    fn permission_and_network_messages_differ() {
        let perm = classify_failure(&RawlineError::Permission("denied".into()));
        let net = classify_failure(&RawlineError::Remote {
            status: 503,
            message: "down".into(),
        });
        assert!(perm.starts_with("Access Blocked"));
        assert_eq!(net, "Cloud Link Failed: HTTP 503");
    }

    #[test]
    fn failure_keeps_data_and_clears_loading() {
        let store = MemoryStore::new();
        store.fail_next(Failure::Network);
        let before = CatalogState::new();
        let after = reload(before.clone(), &store);
        assert!(!after.loading);
        assert_eq!(after.items, before.items);
        assert_eq!(after.content, before.content);
        assert!(after.last_error.is_some());
    }
}
