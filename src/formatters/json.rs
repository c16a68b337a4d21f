use serde::Serialize;

use crate::analyzer::group_by_repository;
use crate::types::{Finding, Role};

#[derive(Debug, Serialize)]
struct Report<'a> {
    namespace: &'a str,
    repositories: Vec<RepositoryReport<'a>>,
}

#[derive(Debug, Serialize)]
struct RepositoryReport<'a> {
    repository: String,
    grants: Vec<GrantReport<'a>>,
}

#[derive(Debug, Serialize)]
struct GrantReport<'a> {
    name: &'a str,
    role: Role,
    robot: bool,
}

pub fn format(namespace: &str, findings: &[Finding<'_>]) -> serde_json::Result<String> {
    let repositories = group_by_repository(findings)
        .into_iter()
        .map(|(repository, grants)| RepositoryReport {
            repository: repository.full_name(),
            grants: grants
                .into_iter()
                .map(|g| GrantReport {
                    name: &g.name,
                    role: g.role,
                    robot: g.is_robot(),
                })
                .collect(),
        })
        .collect();
    serde_json::to_string_pretty(&Report {
        namespace,
        repositories,
    })
}
