use crate::file_ref::FileRef;

/// A record that owns at most one managed file.
///
/// The lifecycle hooks only accept types implementing this trait, so a record
/// without an attachment cannot be handed to them by mistake.
pub trait HasManagedAttachment {
    /// Storage target (directory or key prefix) for this record type.
    const TARGET: &'static str;

    /// Identifier used in log lines.
    fn record_id(&self) -> &str;

    fn attachment(&self) -> &FileRef;

    fn attachment_mut(&mut self) -> &mut FileRef;
}
