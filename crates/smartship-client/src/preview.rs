//! On-demand previews for selected files.
//!
//! A preview of a displayable file is backed by an [`ObjectUrl`]: a local `blob:`
//! reference to the file bytes, registered in an [`ObjectUrlRegistry`] until it is
//! released. Releasing is explicit and idempotent, and a dropped handle releases
//! itself.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use bytes::Bytes;
use smartship_core::{FileCandidate, PreviewKind, ShipError};
use tokio::task::JoinHandle;
use uuid::Uuid;

const OBJECT_URL_SCHEME: &str = "blob:";

/// Live object references and the bytes they point to.
#[derive(Debug, Clone, Default)]
pub struct ObjectUrlRegistry {
    entries: Arc<Mutex<HashMap<String, Bytes>>>,
}

impl ObjectUrlRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `data` under a fresh reference.
    pub fn create(&self, data: Bytes) -> ObjectUrl {
        let url = format!("{}{}", OBJECT_URL_SCHEME, Uuid::new_v4());
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.clone(), data);
        ObjectUrl {
            url,
            registry: self.clone(),
            released: false,
        }
    }

    /// Bytes behind a live reference.
    pub fn get(&self, url: &str) -> Option<Bytes> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url)
            .cloned()
    }

    pub fn live_count(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn revoke(&self, url: &str) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(url)
            .is_some()
    }
}

/// Handle to one registered reference.
#[derive(Debug)]
pub struct ObjectUrl {
    url: String,
    registry: ObjectUrlRegistry,
    released: bool,
}

impl ObjectUrl {
    pub fn as_str(&self) -> &str {
        &self.url
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Backing bytes, or `None` once released.
    pub fn data(&self) -> Option<Bytes> {
        if self.released {
            return None;
        }
        self.registry.get(&self.url)
    }

    /// Revoke the reference. Returns whether this call did the revoking; later calls
    /// are no-ops.
    pub fn release(&mut self) -> bool {
        if self.released {
            return false;
        }
        self.released = true;
        let revoked = self.registry.revoke(&self.url);
        tracing::debug!(url = %self.url, "Released preview reference");
        revoked
    }
}

impl Drop for ObjectUrl {
    fn drop(&mut self) {
        self.release();
    }
}

/// What the presentation layer renders for one file.
#[derive(Debug)]
pub struct PreviewResource {
    pub kind: PreviewKind,
    /// Present only for displayable kinds.
    pub data: Option<ObjectUrl>,
}

impl PreviewResource {
    pub fn unsupported() -> Self {
        Self {
            kind: PreviewKind::Unsupported,
            data: None,
        }
    }

    /// Release the backing reference, if any.
    pub fn release(&mut self) -> bool {
        self.data.as_mut().is_some_and(ObjectUrl::release)
    }
}

/// Turns a file into a [`PreviewResource`].
#[derive(Debug, Clone, Default)]
pub struct PreviewResolver {
    registry: ObjectUrlRegistry,
}

impl PreviewResolver {
    pub fn new(registry: ObjectUrlRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ObjectUrlRegistry {
        &self.registry
    }

    /// Resolve one file. Unsupported kinds are answered without reading the bytes.
    pub async fn resolve(&self, file: &FileCandidate) -> Result<PreviewResource, ShipError> {
        let kind = PreviewKind::for_mime(&file.mime_type);
        if !kind.is_displayable() {
            tracing::debug!(file = %file.name, mime_type = %file.mime_type, "No preview for file type");
            return Ok(PreviewResource::unsupported());
        }

        let bytes = file.raw.read_all().await?;
        let handle = self.registry.create(bytes);
        tracing::debug!(file = %file.name, ?kind, url = %handle.as_str(), "Preview resolved");

        Ok(PreviewResource {
            kind,
            data: Some(handle),
        })
    }

    /// Resolve on a background task so the caller never waits on file reads.
    pub fn spawn_resolve(&self, file: FileCandidate) -> JoinHandle<Result<PreviewResource, ShipError>> {
        let resolver = self.clone();
        tokio::spawn(async move { resolver.resolve(&file).await })
    }
}

/// Owns the preview currently on display.
#[derive(Debug, Default)]
pub struct PreviewSlot {
    current: Option<PreviewResource>,
}

impl PreviewSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&PreviewResource> {
        self.current.as_ref()
    }

    /// Display `resource`, releasing whatever was shown before.
    pub fn show(&mut self, resource: PreviewResource) {
        self.dismiss();
        self.current = Some(resource);
    }

    pub fn dismiss(&mut self) {
        if let Some(mut previous) = self.current.take() {
            previous.release();
        }
    }
}
