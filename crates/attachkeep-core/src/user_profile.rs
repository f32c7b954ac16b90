use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::file_ref::FileRef;
use crate::record::HasManagedAttachment;

/// Back-office account with an optional profile picture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub profile_picture: FileRef,
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            username: username.into(),
            email: email.into(),
            profile_picture: FileRef::Empty,
            created_at: Utc::now(),
        }
    }
}

impl HasManagedAttachment for UserProfile {
    const TARGET: &'static str = "profile_pictures";

    fn record_id(&self) -> &str {
        &self.id
    }

    fn attachment(&self) -> &FileRef {
        &self.profile_picture
    }

    fn attachment_mut(&mut self) -> &mut FileRef {
        &mut self.profile_picture
    }
}
