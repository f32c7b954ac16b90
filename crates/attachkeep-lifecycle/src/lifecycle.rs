use std::sync::Arc;

use attachkeep_core::{FileRef, HasManagedAttachment, LoadedFile, Payload};
use attachkeep_store::{target_key, ObjectStore};
use tracing::{debug, info, warn};

use crate::error::AttachmentError;
use crate::naming;

/// Insert/update/load hooks for records that own a managed file.
///
/// Stored keys are bare file names; objects live at `TARGET/key` in the
/// store. A replaced or detached file is deleted only after the record's new
/// reference is settled, and a failed delete never fails the save.
pub struct AttachmentLifecycle {
    backend: Arc<dyn ObjectStore>,
}

impl AttachmentLifecycle {
    pub fn new(backend: Arc<dyn ObjectStore>) -> Self {
        Self { backend }
    }

    pub fn object_store(&self) -> &Arc<dyn ObjectStore> {
        &self.backend
    }

    /// Write a payload under a freshly generated key and return the key.
    pub async fn store(&self, target: &str, payload: &Payload) -> Result<String, AttachmentError> {
        let key = naming::stored_key(&payload.resolved_extension());
        let object_key = target_key(target, &key);
        self.backend
            .put(&object_key, payload.data.clone())
            .await
            .map_err(|source| AttachmentError::StorageWrite {
                key: object_key.clone(),
                source,
            })?;
        info!(
            "stored upload '{}' ({} bytes) as {object_key}",
            payload.original_name,
            payload.len()
        );
        Ok(key)
    }

    /// Store a pending upload before the record is first written.
    pub async fn on_before_insert<E: HasManagedAttachment>(
        &self,
        entity: &mut E,
    ) -> Result<(), AttachmentError> {
        match entity.attachment() {
            FileRef::Pending(payload) => {
                let key = self.store(E::TARGET, payload).await?;
                *entity.attachment_mut() = FileRef::Stored(key);
            }
            FileRef::Stored(key) => ensure_bare_key(entity, key)?,
            FileRef::Empty => {}
            FileRef::Loaded(file) => {
                return Err(AttachmentError::InvalidState(format!(
                    "{} {}: loaded file {} on a record that was never inserted",
                    E::TARGET,
                    entity.record_id(),
                    file.key
                )));
            }
        }
        Ok(())
    }

    /// Reconcile the file field before an update is written.
    ///
    /// `previous` is the persisted key before this update began. An `Empty`
    /// field means the file was not re-submitted and the previous key is kept.
    pub async fn on_before_update<E: HasManagedAttachment>(
        &self,
        entity: &mut E,
        previous: Option<&str>,
    ) -> Result<(), AttachmentError> {
        let previous = previous.filter(|key| !key.is_empty());
        if let Some(old) = previous {
            ensure_bare_key(entity, old)?;
        }
        match entity.attachment() {
            FileRef::Empty => {
                debug!(
                    "{} {}: file not submitted, keeping {:?}",
                    E::TARGET,
                    entity.record_id(),
                    previous
                );
                *entity.attachment_mut() = FileRef::from(previous.map(str::to_string));
            }
            FileRef::Pending(payload) => {
                let new_key = self.store(E::TARGET, payload).await?;
                *entity.attachment_mut() = FileRef::Stored(new_key.clone());
                if let Some(old) = previous.filter(|old| *old != new_key) {
                    info!(
                        "{} {}: replaced {old} with {new_key}",
                        E::TARGET,
                        entity.record_id()
                    );
                    self.discard(E::TARGET, old).await;
                }
            }
            FileRef::Stored(current) | FileRef::Loaded(LoadedFile { key: current, .. }) => {
                if previous != Some(current.as_str()) {
                    return Err(AttachmentError::InvalidState(format!(
                        "{} {}: submitted key {current} does not match persisted key {:?}",
                        E::TARGET,
                        entity.record_id(),
                        previous
                    )));
                }
                ensure_bare_key(entity, current)?;
                let current = current.clone();
                *entity.attachment_mut() = FileRef::Stored(current);
            }
        }
        Ok(())
    }

    /// Remove the attachment without replacement.
    ///
    /// The field becomes `Empty` and the previous file is deleted best-effort.
    pub async fn on_before_detach<E: HasManagedAttachment>(
        &self,
        entity: &mut E,
        previous: Option<&str>,
    ) -> Result<(), AttachmentError> {
        if entity.attachment().is_pending() {
            return Err(AttachmentError::InvalidState(format!(
                "{} {}: cannot detach while an upload is pending",
                E::TARGET,
                entity.record_id()
            )));
        }
        let previous = previous.filter(|key| !key.is_empty());
        if let Some(old) = previous {
            ensure_bare_key(entity, old)?;
        }
        *entity.attachment_mut() = FileRef::Empty;
        if let Some(old) = previous {
            info!("{} {}: detached {old}", E::TARGET, entity.record_id());
            self.discard(E::TARGET, old).await;
        }
        Ok(())
    }

    /// Turn a stored key into a loadable file handle after the record is read.
    ///
    /// A key whose file is missing stays a bare key.
    pub async fn on_load<E: HasManagedAttachment>(
        &self,
        entity: &mut E,
    ) -> Result<(), AttachmentError> {
        let key = match entity.attachment() {
            FileRef::Stored(key) => key.clone(),
            FileRef::Empty | FileRef::Loaded(_) => return Ok(()),
            FileRef::Pending(payload) => {
                return Err(AttachmentError::InvalidState(format!(
                    "{} {}: loaded record carries pending upload '{}'",
                    E::TARGET,
                    entity.record_id(),
                    payload.original_name
                )));
            }
        };
        ensure_bare_key(entity, &key)?;

        let object_key = target_key(E::TARGET, &key);
        match self.backend.size(&object_key).await {
            Ok(Some(size)) => {
                *entity.attachment_mut() = FileRef::Loaded(LoadedFile {
                    location: self.backend.locate(&object_key),
                    key,
                    size_bytes: Some(size),
                });
            }
            Ok(None) => {
                debug!(
                    "{} {}: {object_key} is missing, leaving bare key",
                    E::TARGET,
                    entity.record_id()
                );
            }
            Err(e) => {
                warn!("{} {}: could not stat {object_key}: {e}", E::TARGET, entity.record_id());
            }
        }
        Ok(())
    }

    async fn discard(&self, target: &str, key: &str) {
        let object_key = target_key(target, key);
        if let Err(e) = self.backend.delete(&object_key).await {
            warn!("failed to delete superseded file {object_key}: {e}");
        }
    }
}

/// Stored keys must name a file directly inside the record's target.
fn ensure_bare_key<E: HasManagedAttachment>(entity: &E, key: &str) -> Result<(), AttachmentError> {
    if naming::is_valid_stored_key(key) {
        return Ok(());
    }
    Err(AttachmentError::InvalidState(format!(
        "{} {}: stored key {key:?} is not a bare file name",
        E::TARGET,
        entity.record_id()
    )))
}
