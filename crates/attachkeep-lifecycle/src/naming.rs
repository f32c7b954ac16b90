use rand::RngCore;

/// Random bytes per token: 128 bits, 32 hex characters.
pub const TOKEN_BYTES: usize = 16;

/// A random, practically unique token rendered as lowercase hex.
pub fn token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// A fresh stored key: `<token>.<extension>`.
pub fn stored_key(extension: &str) -> String {
    format!("{}.{extension}", token())
}

/// Whether `key` is a bare file name that stays inside its storage target.
pub fn is_valid_stored_key(key: &str) -> bool {
    !key.is_empty()
        && !key.starts_with('.')
        && !key.contains(['/', '\\'])
        && !key.contains("..")
}
