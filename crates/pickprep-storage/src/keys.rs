//! Shared key generation for storage backends.
//!
//! Key format: `authority/segment/.../segment`, scheme dropped.

use pickprep_core::Locator;

/// Generate the storage key for a locator.
pub fn storage_key(locator: &Locator) -> String {
    let mut key = locator.authority().to_string();
    for segment in locator.segments() {
        key.push('/');
        key.push_str(segment);
    }
    key
}
