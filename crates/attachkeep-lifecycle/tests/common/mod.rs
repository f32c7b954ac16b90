// Shared fixtures for lifecycle integration tests: a store that records and
// can fail operations, and a tiny table that calls the hooks the way a
// persistence layer would.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use attachkeep_core::{Client, HasManagedAttachment};
use attachkeep_lifecycle::{AttachmentError, AttachmentLifecycle};
use attachkeep_store::{target_key, LocalStore, ObjectStore, StoreConfig, StoreError};
use bytes::Bytes;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

// ---------------------------------------------------------------------------
// Recording store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Put(String),
    Delete(String),
}

/// Local store that logs every write/delete and can be told to fail them.
pub struct RecordingStore {
    inner: LocalStore,
    ops: Mutex<Vec<Op>>,
    pub fail_puts: AtomicBool,
    pub fail_deletes: AtomicBool,
}

impl RecordingStore {
    pub fn new(dir: &std::path::Path) -> Self {
        Self {
            inner: LocalStore::new(&StoreConfig::local(dir.to_string_lossy().to_string())),
            ops: Mutex::new(Vec::new()),
            fail_puts: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
        }
    }

    pub fn ops(&self) -> Vec<Op> {
        self.ops.lock().unwrap().clone()
    }

    pub fn clear_ops(&self) {
        self.ops.lock().unwrap().clear();
    }
}

#[async_trait]
impl ObjectStore for RecordingStore {
    async fn put(&self, key: &str, data: Bytes) -> Result<(), StoreError> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(StoreError::Internal(format!("write {key}: disk full")));
        }
        self.inner.put(key, data).await?;
        self.ops.lock().unwrap().push(Op::Put(key.to_string()));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Bytes, StoreError> {
        self.inner.get(key).await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.ops.lock().unwrap().push(Op::Delete(key.to_string()));
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StoreError::Internal(format!("delete {key}: permission denied")));
        }
        self.inner.delete(key).await
    }

    // exists/size use the trait defaults, which read through `get`

    fn locate(&self, key: &str) -> String {
        self.inner.locate(key)
    }
}

/// Bare file names currently stored under the client target.
pub fn stored_files(dir: &std::path::Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir.join(Client::TARGET)) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

pub fn setup(dir: &std::path::Path) -> (Arc<RecordingStore>, AttachmentLifecycle) {
    init_tracing();
    let store = Arc::new(RecordingStore::new(dir));
    let lifecycle = AttachmentLifecycle::new(store.clone());
    (store, lifecycle)
}

// ---------------------------------------------------------------------------
// Client table
// ---------------------------------------------------------------------------

/// Rows are kept in their serialized form, so a pending payload can never be
/// written and the logo column holds only a key or null.
#[derive(Default)]
pub struct ClientTable {
    rows: HashMap<String, serde_json::Value>,
}

impl ClientTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(
        &mut self,
        lifecycle: &AttachmentLifecycle,
        mut client: Client,
    ) -> Result<Client, AttachmentError> {
        lifecycle.on_before_insert(&mut client).await?;
        self.write(&client);
        Ok(client)
    }

    pub async fn update(
        &mut self,
        lifecycle: &AttachmentLifecycle,
        mut client: Client,
    ) -> Result<Client, AttachmentError> {
        let previous = self.logo_column(&client.id);
        lifecycle
            .on_before_update(&mut client, previous.as_deref())
            .await?;
        self.write(&client);
        Ok(client)
    }

    pub async fn detach(
        &mut self,
        lifecycle: &AttachmentLifecycle,
        mut client: Client,
    ) -> Result<Client, AttachmentError> {
        let previous = self.logo_column(&client.id);
        lifecycle
            .on_before_detach(&mut client, previous.as_deref())
            .await?;
        self.write(&client);
        Ok(client)
    }

    pub async fn load(
        &self,
        lifecycle: &AttachmentLifecycle,
        id: &str,
    ) -> Result<Client, AttachmentError> {
        let row = self.rows.get(id).expect("row exists").clone();
        let mut client: Client = serde_json::from_value(row).expect("row deserializes");
        lifecycle.on_load(&mut client).await?;
        Ok(client)
    }

    pub fn logo_column(&self, id: &str) -> Option<String> {
        self.rows
            .get(id)
            .and_then(|row| row["logo"].as_str())
            .map(str::to_string)
    }

    fn write(&mut self, client: &Client) {
        let row = serde_json::to_value(client).expect("hooks leave no pending payload");
        self.rows.insert(client.id.clone(), row);
    }
}

/// The persisted logo is null or names an object that exists.
pub async fn assert_no_dangling(table: &ClientTable, store: &RecordingStore, id: &str) {
    if let Some(key) = table.logo_column(id) {
        let object_key = target_key(Client::TARGET, &key);
        assert!(
            store.exists(&object_key).await.unwrap(),
            "persisted logo {key} has no stored file"
        );
    }
}
