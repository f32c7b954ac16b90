pub mod client;
pub mod file_ref;
pub mod record;
pub mod user_profile;

pub use client::Client;
pub use file_ref::{FileRef, LoadedFile, Payload};
pub use record::HasManagedAttachment;
pub use user_profile::UserProfile;
