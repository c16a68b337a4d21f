//! Read-only client for the quay.io v1 API.
//!
//! Responses are parsed into wire structs here and converted to [`crate::types`]
//! before leaving the module, so callers never see loosely typed JSON.

use std::time::Duration;

use chrono::Utc;
use indexmap::IndexMap;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::error::{AuditError, Result};
use crate::types::{Grant, Organization, PrincipalKind, Repository, Role, State};

pub const QUAY_IO_ENDPOINT: &str = "https://quay.io/api/v1";
pub const QUAY_TOKEN_ENV_NAME: &str = "QUAY_TOKEN";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct RegistryConfig {
    pub api_root: String,
    pub token: Option<String>,
    pub timeout: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        RegistryConfig {
            api_root: QUAY_IO_ENDPOINT.to_string(),
            token: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Debug, Deserialize)]
struct MembersResponse {
    members: Vec<MemberWire>,
}

#[derive(Debug, Deserialize)]
struct MemberWire {
    name: String,
}

#[derive(Debug, Deserialize)]
struct RepositoriesResponse {
    repositories: Vec<RepositoryWire>,
}

#[derive(Debug, Deserialize)]
struct RepositoryWire {
    namespace: String,
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    is_public: bool,
}

#[derive(Debug, Deserialize)]
struct PermissionsResponse<P> {
    permissions: IndexMap<String, P>,
}

#[derive(Debug, Deserialize)]
struct UserPermissionWire {
    name: String,
    role: Role,
    #[serde(default)]
    is_robot: bool,
}

#[derive(Debug, Deserialize)]
struct TeamPermissionWire {
    name: String,
    role: Role,
}

pub struct RegistryClient {
    api_root: String,
    token: String,
    http: Client,
}

impl RegistryClient {
    /// Builds a client from explicit configuration.
    ///
    /// # Errors
    /// [`AuditError::Auth`] when no token is configured, [`AuditError::Transient`]
    /// if the HTTP client cannot be constructed.
    pub fn new(config: RegistryConfig) -> Result<Self> {
        let token = config
            .token
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                AuditError::Auth(format!(
                    "{QUAY_TOKEN_ENV_NAME} is not set; an access token is required"
                ))
            })?;
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AuditError::Transient(format!("build http client: {e}")))?;
        Ok(RegistryClient {
            api_root: config.api_root.trim_end_matches('/').to_string(),
            token,
            http,
        })
    }

    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let url = format!("{}/{}", self.api_root, path);
        debug!(%url, "GET");
        let res = self
            .http
            .get(&url)
            .query(query)
            .bearer_auth(&self.token)
            .send()
            .map_err(|e| AuditError::Transient(format!("GET {url}: {e}")))?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().unwrap_or_default();
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    AuditError::Auth(format!("GET {url}: {status}: token rejected"))
                }
                StatusCode::NOT_FOUND => AuditError::NotFound(format!("GET {url}: {status}")),
                _ => AuditError::Transient(format!("GET {url}: {status}: {}", body.trim())),
            });
        }

        let body = res
            .text()
            .map_err(|e| AuditError::Transient(format!("GET {url}: read body: {e}")))?;
        serde_json::from_str(&body)
            .map_err(|e| AuditError::Format(format!("GET {url}: unexpected response: {e}")))
    }

    pub fn list_members(&self, namespace: &str) -> Result<Vec<String>> {
        let resp: MembersResponse = self.get(&format!("organization/{namespace}/members"), &[])?;
        Ok(resp.members.into_iter().map(|m| m.name).collect())
    }

    /// Lists repositories in `namespace`. Only the first page is read.
    pub fn list_repositories(&self, namespace: &str) -> Result<Vec<Repository>> {
        let resp: RepositoriesResponse = self.get("repository", &[("namespace", namespace)])?;
        Ok(resp
            .repositories
            .into_iter()
            .map(|r| Repository {
                namespace: r.namespace,
                name: r.name,
                description: r.description,
                is_public: r.is_public,
                grants: Vec::new(),
            })
            .collect())
    }

    pub fn user_grants(&self, full_name: &str) -> Result<Vec<Grant>> {
        let resp: PermissionsResponse<UserPermissionWire> =
            self.get(&format!("repository/{full_name}/permissions/user/"), &[])?;
        Ok(resp
            .permissions
            .into_values()
            .map(|p| Grant {
                name: p.name,
                kind: PrincipalKind::User {
                    is_robot: p.is_robot,
                },
                role: p.role,
            })
            .collect())
    }

    pub fn team_grants(&self, full_name: &str) -> Result<Vec<Grant>> {
        let resp: PermissionsResponse<TeamPermissionWire> =
            self.get(&format!("repository/{full_name}/permissions/team/"), &[])?;
        Ok(resp
            .permissions
            .into_values()
            .map(|p| Grant::team(p.name, p.role))
            .collect())
    }
}

/// Fetches user then team grants for each repository. The bar is cleared
/// whether or not a fetch fails.
fn fill_grants(
    client: &RegistryClient,
    repositories: &mut [Repository],
    pb: &ProgressBar,
) -> Result<()> {
    let result = repositories.iter_mut().try_for_each(|repo| {
        let full_name = repo.full_name();
        pb.set_message(full_name.clone());
        let mut grants = client.user_grants(&full_name)?;
        grants.extend(client.team_grants(&full_name)?);
        debug!(repository = %full_name, grants = grants.len(), "fetched permissions");
        repo.grants = grants;
        pb.inc(1);
        Ok::<(), AuditError>(())
    });
    pb.finish_and_clear();
    result
}

/// Fetches membership and every repository's grants for `namespace` in one pass.
///
/// # Errors
/// Any request failure aborts the fetch; no partial state is returned.
pub fn fetch_state(client: &RegistryClient, namespace: &str, progress: bool) -> Result<State> {
    info!(namespace, api_root = client.api_root(), "fetching registry state");
    let members = client.list_members(namespace)?;
    let mut repositories = client.list_repositories(namespace)?;
    info!(
        members = members.len(),
        repositories = repositories.len(),
        "listed organization"
    );

    let pb = if progress {
        let pb = ProgressBar::new(repositories.len() as u64);
        match ProgressStyle::with_template("{spinner} {pos}/{len} repositories {wide_bar} {msg}") {
            Ok(style) => pb.set_style(style.tick_chars("⠁⠃⠇⠋⠙⠸⢰⣠⣄⡆")),
            Err(e) => warn!("progress style: {e}"),
        }
        pb
    } else {
        ProgressBar::hidden()
    };
    fill_grants(client, &mut repositories, &pb)?;

    Ok(State {
        organization: Organization::new(namespace, members),
        repositories,
        fetched_at: Some(Utc::now()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_token_is_auth_error() {
        let err = RegistryClient::new(RegistryConfig::default()).err().unwrap();
        assert_eq!(err.kind(), "AuthError");

        let blank = RegistryConfig {
            token: Some("  ".to_string()),
            ..RegistryConfig::default()
        };
        assert!(matches!(RegistryClient::new(blank), Err(AuditError::Auth(_))));
    }

    #[test]
    fn api_root_trailing_slash_is_trimmed() {
        let client = RegistryClient::new(RegistryConfig {
            api_root: "http://localhost:9/api/v1/".to_string(),
            token: Some("t".to_string()),
            timeout: Duration::from_secs(1),
        })
        .unwrap();
        assert_eq!(client.api_root(), "http://localhost:9/api/v1");
    }

    #[test]
    fn failed_fetch_still_clears_progress() {
        let client = RegistryClient::new(RegistryConfig {
            api_root: "http://127.0.0.1:9/api/v1".to_string(),
            token: Some("t".to_string()),
            timeout: Duration::from_secs(2),
        })
        .unwrap();
        let mut repos = vec![Repository::new("woofshop", "landscape")];
        let pb = ProgressBar::hidden();

        let err = fill_grants(&client, &mut repos, &pb).unwrap_err();
        assert_eq!(err.kind(), "TransientError");
        assert!(pb.is_finished());
        assert!(repos[0].grants.is_empty());
    }

    #[test]
    fn user_permissions_keep_api_order() {
        let raw = r##"{"permissions": {
            "zed": {"name": "zed", "role": "read", "is_robot": false, "is_org_member": false,
                    "avatar": {"name": "zed", "hash": "x", "color": "#fff", "kind": "user"}},
            "abe": {"name": "abe", "role": "admin", "is_robot": false, "is_org_member": true}
        }}"##;
        let resp: PermissionsResponse<UserPermissionWire> = serde_json::from_str(raw).unwrap();
        let names: Vec<&str> = resp.permissions.values().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["zed", "abe"]);
    }
}
