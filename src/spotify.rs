//! Client-credentials token request used to check API credentials.

use anyhow::Result;
use serde::Deserialize;

const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: String,
}

/// Request an access token for the given client credentials.
///
/// Returns `Ok(true)` only when the token endpoint hands back a non-empty token.
/// A rejection by the endpoint is `Ok(false)`; transport problems are errors.
pub async fn credentials_accepted(
    client: &reqwest::Client,
    client_id: &str,
    client_secret: &str,
) -> Result<bool> {
    if client_id.is_empty() || client_secret.is_empty() {
        return Ok(false);
    }

    let response = client
        .post(TOKEN_URL)
        .form(&[
            ("grant_type", "client_credentials"),
            ("client_id", client_id),
            ("client_secret", client_secret),
        ])
        .send()
        .await?;

    if !response.status().is_success() {
        tracing::debug!(status = %response.status(), "Token endpoint rejected credentials");
        return Ok(false);
    }

    let token: TokenResponse = response.json().await?;
    Ok(!token.access_token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_credentials_short_circuit() {
        let client = reqwest::Client::new();
        assert!(!credentials_accepted(&client, "", "secret").await.unwrap());
        assert!(!credentials_accepted(&client, "id", "").await.unwrap());
    }

    #[test]
    fn test_token_response_missing_field_is_empty() {
        let token: TokenResponse = serde_json::from_str(r#"{"token_type": "Bearer"}"#).unwrap();
        assert!(token.access_token.is_empty());
    }
}
