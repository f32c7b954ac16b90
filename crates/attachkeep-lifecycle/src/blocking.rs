use std::sync::Arc;

use attachkeep_core::{HasManagedAttachment, Payload};
use attachkeep_store::ObjectStore;
use tokio::runtime::{Builder, Runtime};

use crate::{AttachmentError, AttachmentLifecycle};

/// Blocking wrapper around [`AttachmentLifecycle`].
///
/// Owns a current-thread tokio runtime and uses `block_on()` for each call.
/// Meant for synchronous persistence code; calling it from inside another
/// runtime panics.
pub struct BlockingAttachmentLifecycle {
    inner: AttachmentLifecycle,
    rt: Runtime,
}

impl BlockingAttachmentLifecycle {
    pub fn new(store: Arc<dyn ObjectStore>) -> Result<Self, AttachmentError> {
        let rt = Builder::new_current_thread().enable_all().build()?;
        Ok(Self {
            inner: AttachmentLifecycle::new(store),
            rt,
        })
    }

    pub fn lifecycle(&self) -> &AttachmentLifecycle {
        &self.inner
    }

    pub fn store(&self, target: &str, payload: &Payload) -> Result<String, AttachmentError> {
        self.rt.block_on(self.inner.store(target, payload))
    }

    pub fn on_before_insert<E: HasManagedAttachment>(
        &self,
        entity: &mut E,
    ) -> Result<(), AttachmentError> {
        self.rt.block_on(self.inner.on_before_insert(entity))
    }

    pub fn on_before_update<E: HasManagedAttachment>(
        &self,
        entity: &mut E,
        previous: Option<&str>,
    ) -> Result<(), AttachmentError> {
        self.rt.block_on(self.inner.on_before_update(entity, previous))
    }

    pub fn on_before_detach<E: HasManagedAttachment>(
        &self,
        entity: &mut E,
        previous: Option<&str>,
    ) -> Result<(), AttachmentError> {
        self.rt.block_on(self.inner.on_before_detach(entity, previous))
    }

    pub fn on_load<E: HasManagedAttachment>(&self, entity: &mut E) -> Result<(), AttachmentError> {
        self.rt.block_on(self.inner.on_load(entity))
    }
}
