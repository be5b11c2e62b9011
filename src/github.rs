//! GitHub API client for application release checks.
//!
//! This module provides:
//!
//! - `GitHubClient`: HTTP client wrapper for the releases API
//! - `Release`: the subset of the latest-release response we need
//! - `is_newer_version`: strict `x.y.z` comparison used by the update check

use anyhow::Result;
use serde::Deserialize;

/// GitHub API base URL
const GITHUB_API_BASE: &str = "https://api.github.com";

/// User agent for API requests
const USER_AGENT: &str = concat!("spotwrap-update-checker/", env!("CARGO_PKG_VERSION"));

/// A GitHub release
#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    pub tag_name: String,
    pub html_url: String,
}

/// GitHub API client
#[derive(Clone)]
pub struct GitHubClient {
    client: reqwest::Client,
}

impl GitHubClient {
    /// Create a new GitHub API client
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client })
    }

    /// Get a reference to the underlying HTTP client
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Fetch the latest published release of `owner/repo`.
    ///
    /// A leading `v` is stripped from the tag so it can be compared directly
    /// against the crate version.
    pub async fn latest_release(&self, owner: &str, repo: &str) -> Result<Release> {
        let url = format!("{}/repos/{}/{}/releases/latest", GITHUB_API_BASE, owner, repo);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github.v3+json")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("GitHub API error: {} - {}", status, text);
        }

        let mut release: Release = response.json().await?;
        release.tag_name = release.tag_name.trim_start_matches('v').to_string();
        tracing::debug!(tag = %release.tag_name, "Fetched latest release");

        Ok(release)
    }
}

/// Parse `"1.2.3"` (optionally `"v1.2.3"`) into its numeric parts
fn parse_version(version: &str) -> Result<[u64; 3]> {
    let cleaned = version.trim().trim_start_matches('v');
    let parts: Vec<&str> = cleaned.split('.').collect();
    if parts.len() != 3 {
        anyhow::bail!("invalid version format: '{}'. Expected 'x.y.z'", version);
    }

    let mut out = [0u64; 3];
    for (slot, part) in out.iter_mut().zip(parts) {
        *slot = part
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid version segment '{}' in '{}': {}", part, version, e))?;
    }
    Ok(out)
}

/// Check whether `latest` is strictly newer than `current`
pub fn is_newer_version(current: &str, latest: &str) -> Result<bool> {
    let current = parse_version(current)?;
    let latest = parse_version(latest)?;
    Ok(latest > current)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newer_patch_minor_major() {
        assert!(is_newer_version("1.2.3", "1.2.4").unwrap());
        assert!(is_newer_version("1.2.3", "1.3.0").unwrap());
        assert!(is_newer_version("1.2.3", "2.0.0").unwrap());
    }

    #[test]
    fn test_same_or_older_is_not_newer() {
        assert!(!is_newer_version("1.2.3", "1.2.3").unwrap());
        assert!(!is_newer_version("1.10.0", "1.9.9").unwrap());
        assert!(!is_newer_version("2.0.0", "1.99.99").unwrap());
    }

    #[test]
    fn test_v_prefix_accepted() {
        assert!(is_newer_version("v0.1.0", "v0.2.0").unwrap());
    }

    #[test]
    fn test_malformed_versions_rejected() {
        assert!(is_newer_version("1.2", "1.2.3").is_err());
        assert!(is_newer_version("1.2.3", "1.2.x").is_err());
        assert!(is_newer_version("", "1.0.0").is_err());
    }

    #[test]
    fn test_release_deserializes_ignoring_extra_fields() {
        let release: Release = serde_json::from_str(
            r#"{"tag_name": "v2.0.0", "html_url": "https://x", "name": "Two", "draft": false}"#,
        )
        .unwrap();
        assert_eq!(release.tag_name, "v2.0.0");
        assert_eq!(release.html_url, "https://x");
    }
}
