use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::file_ref::FileRef;
use crate::record::HasManagedAttachment;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub logo: FileRef,
    pub created_at: DateTime<Utc>,
}

impl Client {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            logo: FileRef::Empty,
            created_at: Utc::now(),
        }
    }

    pub fn with_logo(mut self, logo: FileRef) -> Self {
        self.logo = logo;
        self
    }
}

impl HasManagedAttachment for Client {
    const TARGET: &'static str = "clients";

    fn record_id(&self) -> &str {
        &self.id
    }

    fn attachment(&self) -> &FileRef {
        &self.logo
    }

    fn attachment_mut(&mut self) -> &mut FileRef {
        &mut self.logo
    }
}
