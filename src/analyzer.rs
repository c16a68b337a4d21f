use std::ptr;

use crate::types::{Finding, Grant, Repository, State};

/// Returns every user grant held outside the organization, in state order.
///
/// Team grants are never reported. Repository order and grant order within a
/// repository are preserved exactly.
pub fn find_external_access(state: &State) -> Vec<Finding<'_>> {
    let org = &state.organization;
    state
        .repositories
        .iter()
        .flat_map(move |repository| {
            repository
                .grants
                .iter()
                .filter(move |grant| grant.is_user() && !org.is_inside(&grant.name))
                .map(move |grant| Finding { repository, grant })
        })
        .collect()
}

/// Folds consecutive findings for the same repository into one group.
///
/// Groups follow input order exactly; a repository listed twice in the state
/// yields two groups.
pub fn group_by_repository<'a>(findings: &[Finding<'a>]) -> Vec<(&'a Repository, Vec<&'a Grant>)> {
    let mut out: Vec<(&'a Repository, Vec<&'a Grant>)> = Vec::new();
    for f in findings {
        match out.last_mut() {
            Some((repo, grants)) if ptr::eq(*repo, f.repository) => grants.push(f.grant),
            _ => out.push((f.repository, vec![f.grant])),
        }
    }
    out
}
