//! Action identifier generation.

use uuid::Uuid;

/// Number of hex characters kept from the random UUID.
const SUFFIX_LEN: usize = 8;

/// Generate an action ID of the form `<prefix>_<8 hex chars>`.
///
/// Collisions within one generated graph are improbable enough to ignore;
/// the validator still catches them.
pub fn new_action_id(prefix: &str) -> String {
    let mut suffix = Uuid::new_v4().simple().to_string();
    suffix.truncate(SUFFIX_LEN);
    format!("{}_{}", prefix, suffix)
}
