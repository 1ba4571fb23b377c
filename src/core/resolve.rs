//! Scope resolution.
//!
//! Picks the single secret that answers a [`SecretRequest`] when the same
//! name exists at several scopes. Candidates are scanned in the order the
//! service returned them; names compare case-insensitively.
//!
//! For each candidate:
//!
//! 1. user scoped for the current project: returned at once
//! 2. the request wants a user value and the candidate is shared: set aside
//!    as a fallback, used only when nothing else survives
//! 3. bound to a different project: rejected
//! 4. organization wide while the request pulls from the project: rejected
//!
//! Among survivors the first wins, unless a later one is user scoped while
//! the selected one is not, or a later one belongs to the current project
//! while the selected one does not. Equally ranked duplicates keep the first
//! and log a warning.

use tracing::{debug, trace, warn};

use crate::core::domain::{Secret, SecretRequest};
use crate::core::types::Id;

/// Find the best match for `request` among `secrets`.
///
/// `project_id` is the current project, if any. Returns `None` when nothing
/// matches; a match whose value decrypts to an empty string is still a match.
pub fn resolve<'a>(
    secrets: &'a [Secret],
    project_id: Option<Id>,
    request: &SecretRequest,
) -> Option<&'a Secret> {
    let mut selected: Option<&'a Secret> = None;
    let mut fallback: Option<&'a Secret> = None;

    for candidate in secrets.iter().filter(|s| s.matches_name(&request.name)) {
        if candidate.is_user && candidate.project_id == project_id {
            trace!(name = %candidate.name, "exact user and project match");
            return Some(candidate);
        }

        if candidate.project_id.is_some() && candidate.project_id != project_id {
            trace!(name = %candidate.name, "rejected: other project");
            continue;
        }

        if request.pull_from_project && !candidate.is_user && candidate.project_id.is_none() {
            trace!(name = %candidate.name, "rejected: organization wide");
            continue;
        }

        if request.is_user && !candidate.is_user {
            trace!(name = %candidate.name, "set aside: not user scoped");
            prefer(&mut fallback, candidate, project_id);
            continue;
        }

        prefer(&mut selected, candidate, project_id);
    }

    if selected.is_none() && fallback.is_some() {
        debug!(name = %request.name, "no user scoped value, using shared fallback");
    }

    selected.or(fallback)
}

fn prefer<'a>(current: &mut Option<&'a Secret>, candidate: &'a Secret, project_id: Option<Id>) {
    let replace = match *current {
        None => true,
        Some(selected) if candidate.is_user && !selected.is_user => true,
        Some(selected)
            if candidate.project_id == project_id && selected.project_id != project_id =>
        {
            true
        }
        Some(selected) => {
            if selected.has_scope(candidate.is_user, candidate.project_id) {
                warn!(
                    name = %candidate.name,
                    kept = %selected.secret_id,
                    ignored = %candidate.secret_id,
                    "duplicate secret at the same scope, keeping the first"
                );
            }
            false
        }
    };

    if replace {
        *current = Some(candidate);
    }
}
