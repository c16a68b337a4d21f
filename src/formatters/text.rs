use std::fmt::Write as _;

use crate::analyzer::group_by_repository;
use crate::types::Finding;

/// Renders findings as one block per repository, separated by blank lines.
///
/// Repositories without findings never appear, so an empty slice renders as "".
pub fn format(findings: &[Finding<'_>]) -> String {
    let mut out = String::new();
    for (repository, grants) in group_by_repository(findings) {
        let _ = writeln!(out, "{}", repository.full_name());
        for g in grants {
            let robot = if g.is_robot() { " (robot)" } else { "" };
            let _ = writeln!(out, "- {} [{}]{}", g.name, g.role, robot);
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::find_external_access;
    use crate::types::{Grant, Organization, Repository, Role, State};

    #[test]
    fn landscape_report() {
        let state = State::new(
            Organization::new("woofshop", ["alice", "bob"]),
            vec![
                Repository::new("woofshop", "landscape")
                    .with_grant(Grant::user("niceperson", Role::Admin)),
                Repository::new("woofshop", "toolbox")
                    .with_grant(Grant::user("alice", Role::Write)),
            ],
        );
        let s = format(&find_external_access(&state));
        assert_eq!(s, "woofshop/landscape\n- niceperson [admin]\n\n");
        assert!(!s.contains("toolbox"));
    }

    #[test]
    fn blocks_are_separated_and_robots_marked() {
        let state = State::new(
            Organization::new("woofshop", ["alice"]),
            vec![
                Repository::new("woofshop", "a")
                    .with_grant(Grant::user("eve", Role::Read))
                    .with_grant(Grant::robot("other+push", Role::Write)),
                Repository::new("woofshop", "b").with_grant(Grant::user("mallory", Role::Admin)),
            ],
        );
        let s = format(&find_external_access(&state));
        assert_eq!(
            s,
            "woofshop/a\n- eve [read]\n- other+push [write] (robot)\n\n\
             woofshop/b\n- mallory [admin]\n\n"
        );
    }

    #[test]
    fn split_repository_renders_in_input_order() {
        let state = State::new(
            Organization::new("woofshop", ["alice"]),
            vec![
                Repository::new("woofshop", "a").with_grant(Grant::user("x", Role::Read)),
                Repository::new("woofshop", "b").with_grant(Grant::user("y", Role::Read)),
                Repository::new("woofshop", "a").with_grant(Grant::user("z", Role::Admin)),
            ],
        );
        let s = format(&find_external_access(&state));
        assert_eq!(
            s,
            "woofshop/a\n- x [read]\n\nwoofshop/b\n- y [read]\n\nwoofshop/a\n- z [admin]\n\n"
        );
    }

    #[test]
    fn nothing_to_report_is_empty() {
        assert_eq!(format(&[]), "");
    }
}
