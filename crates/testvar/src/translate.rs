//! Remote variable to observed state
//!
//! This is the only place a sensitive value is substituted. A sensitive
//! remote value is never read; the value this resource last submitted is
//! used instead, and `readable_value` stays null.

use crate::model::{ModuleScope, ObservedState};
use varstore::RemoteVariable;

/// Map a store response into observed state
///
/// The returned state has an empty scope; attach it with
/// [`ObservedState::with_scope`].
pub fn translate(remote: &RemoteVariable, last_known_value: &str) -> ObservedState {
    let (value, readable_value) = if remote.sensitive {
        (last_known_value.to_string(), None)
    } else {
        (remote.value.clone(), Some(remote.value.clone()))
    };

    ObservedState {
        id: remote.id.clone(),
        key: remote.key.clone(),
        value,
        category: remote.category,
        description: remote.description.clone(),
        hcl: remote.hcl,
        sensitive: remote.sensitive,
        readable_value,
        scope: ModuleScope::default(),
    }
}
