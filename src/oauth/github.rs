use reqwest::header::{ACCEPT, USER_AGENT};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::AppError;

/// 令牌接口的返回，失败时只有 `error` 字段
#[derive(Debug, Default, Deserialize)]
pub struct GithubAccessResult {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub scope: String,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// GitHub 用户资料，只保留本地账户需要的字段
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GithubUser {
    pub id: i64,
    pub login: String,
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub avatar_url: String,
}

impl GithubUser {
    /// 本地账户使用的外部标识
    pub fn foreign_id(&self) -> String {
        format!("github-{}", self.id)
    }

    /// 没有设置昵称的账号使用登录名
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.login)
    }
}

#[derive(Serialize)]
struct AccessTokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    code: &'a str,
    state: &'a str,
}

#[derive(Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    oauth_url: String,
    api_url: String,
}

impl GithubClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            client_id: config.github_client_id.clone(),
            client_secret: config.github_client_secret.clone(),
            oauth_url: config.github_oauth_url.clone(),
            api_url: config.github_api_url.clone(),
        }
    }

    /// 用授权码换取访问令牌
    pub async fn exchange_code(&self, code: &str, state: &str) -> Result<String, AppError> {
        let result: GithubAccessResult = self
            .http
            .post(&self.oauth_url)
            .header(ACCEPT, "application/json")
            .json(&AccessTokenRequest {
                client_id: &self.client_id,
                client_secret: &self.client_secret,
                code,
                state,
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(error) = result.error {
            let detail = result.error_description.unwrap_or_default();
            tracing::warn!("GitHub token exchange rejected: {} {}", error, detail);
            return Err(AppError::OAuth(format!("{} {}", error, detail).trim().to_string()));
        }
        if result.access_token.is_empty() {
            return Err(AppError::OAuth("empty access token".into()));
        }

        tracing::debug!("GitHub token exchanged, scope: {}", result.scope);
        Ok(result.access_token)
    }

    /// 获取令牌所属的用户资料
    pub async fn fetch_user(&self, access_token: &str) -> Result<GithubUser, AppError> {
        let user = self
            .http
            .get(&self.api_url)
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, "blog-backend")
            .bearer_auth(access_token)
            .send()
            .await?
            .error_for_status()?
            .json::<GithubUser>()
            .await?;

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn foreign_id_and_display_name() {
        let user: GithubUser =
            serde_json::from_str(r#"{"id": 42, "login": "octo", "name": null}"#).unwrap();
        assert_eq!(user.foreign_id(), "github-42");
        assert_eq!(user.display_name(), "octo");
        assert_eq!(user.avatar_url, "");
    }

    #[test]
    fn error_reply_parses() {
        let result: GithubAccessResult =
            serde_json::from_str(r#"{"error": "bad_verification_code"}"#).unwrap();
        assert!(result.access_token.is_empty());
        assert_eq!(result.error.as_deref(), Some("bad_verification_code"));
        assert!(result.token_type.is_empty());
    }
}
