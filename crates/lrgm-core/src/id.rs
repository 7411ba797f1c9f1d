//! Record identifier generation.

use uuid::Uuid;

/// Generate a fresh record identifier.
///
/// Identifiers are random (UUID v4, hyphenated lowercase), so they are never
/// reused across restarts, and never contain the `;` audience separator.
pub fn generate_id() -> String { Uuid::new_v4().hyphenated().to_string() }
