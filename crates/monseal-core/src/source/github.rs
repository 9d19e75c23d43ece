//! GitHub contribution source.
//!
//! Fetches commit contributions per repository through the GraphQL API
//! (`contributionsCollection.commitContributionsByRepository`) and
//! flattens them into [`ContributionEvent`]s. Authentication is a bearer
//! token (classic PAT or fine-grained token with `read:user`).

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;

use crate::error::SourceError;
use crate::progress::ContributionEvent;
use crate::source::ContributionSource;

/// Public GitHub GraphQL endpoint.
pub const GITHUB_GRAPHQL_URL: &str = "https://api.github.com/graphql";

const USER_AGENT: &str = "monseal";

/// Per-repository contribution nodes carry `commitCount` and `occurredAt`;
/// one node per (repository, day) as GitHub aggregates them.
const CONTRIBUTIONS_QUERY: &str = "\
query($login: String!) {
    user(login: $login) {
        contributionsCollection {
            commitContributionsByRepository {
                repository {
                    name
                    owner {
                        login
                    }
                }
                contributions(first: 100) {
                    nodes {
                        commitCount
                        occurredAt
                    }
                }
            }
        }
    }
}";

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<ResponseData>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ResponseData {
    user: Option<UserNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserNode {
    contributions_collection: ContributionsCollection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContributionsCollection {
    commit_contributions_by_repository: Vec<RepositoryContributions>,
}

#[derive(Debug, Deserialize)]
struct RepositoryContributions {
    repository: Repository,
    contributions: ContributionNodes,
}

#[derive(Debug, Deserialize)]
struct Repository {
    name: String,
    owner: RepositoryOwner,
}

#[derive(Debug, Deserialize)]
struct RepositoryOwner {
    login: String,
}

#[derive(Debug, Deserialize)]
struct ContributionNodes {
    nodes: Vec<ContributionNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContributionNode {
    commit_count: u32,
    occurred_at: String,
}

/// GitHub-backed [`ContributionSource`].
pub struct GitHubSource {
    endpoint: String,
}

impl Default for GitHubSource {
    fn default() -> Self {
        Self::new()
    }
}

impl GitHubSource {
    pub fn new() -> Self {
        Self {
            endpoint: GITHUB_GRAPHQL_URL.to_string(),
        }
    }

    /// Point at a different endpoint (tests, GitHub Enterprise).
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    async fn fetch(
        &self,
        account_handle: &str,
        credential: &str,
    ) -> Result<Vec<ContributionEvent>, SourceError> {
        let body = json!({
            "query": CONTRIBUTIONS_QUERY,
            "variables": { "login": account_handle },
        });

        let response = Client::new()
            .post(&self.endpoint)
            .header("Authorization", format!("bearer {credential}"))
            .header("User-Agent", USER_AGENT)
            .json(&body)
            .send()
            .await
            .map_err(|e| SourceError::UpstreamUnavailable(e.to_string()))?;

        match response.status() {
            StatusCode::UNAUTHORIZED => return Err(SourceError::Auth),
            StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
                return Err(SourceError::RateLimited)
            }
            status if !status.is_success() => {
                return Err(SourceError::UpstreamUnavailable(format!("HTTP {status}")))
            }
            _ => {}
        }

        let decoded: GraphQlResponse = response
            .json()
            .await
            .map_err(|e| SourceError::MalformedResponse(e.to_string()))?;

        if let Some(first) = decoded.errors.first() {
            return Err(SourceError::MalformedResponse(format!(
                "GraphQL error: {}",
                first.message
            )));
        }

        let user = decoded
            .data
            .and_then(|d| d.user)
            .ok_or_else(|| SourceError::MalformedResponse("response has no user data".into()))?;

        let events = user
            .contributions_collection
            .commit_contributions_by_repository
            .into_iter()
            .flat_map(|repo| {
                let owner = repo.repository.owner.login;
                let name = repo.repository.name;
                repo.contributions.nodes.into_iter().map(move |node| {
                    ContributionEvent {
                        repository_owner: owner.clone(),
                        repository_name: name.clone(),
                        occurred_at: node.occurred_at,
                        commit_count: node.commit_count,
                    }
                })
            })
            .collect();

        Ok(events)
    }
}

impl ContributionSource for GitHubSource {
    fn fetch_events(
        &self,
        account_handle: &str,
        credential: &str,
    ) -> Result<Vec<ContributionEvent>, SourceError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| SourceError::UpstreamUnavailable(format!("client runtime: {e}")))?;
        runtime.block_on(self.fetch(account_handle, credential))
    }
}
