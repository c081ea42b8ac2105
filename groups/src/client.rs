//! Discord REST client for guild membership.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use unqgate_types::{GroupId, RoleId, SubjectId};

use crate::{GroupError, Member, MembershipProvider};

pub const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Talks to one bot account's view of the Discord API.
pub struct DiscordGuildClient {
    http_client: reqwest::Client,
    api_base: String,
    token: String,
}

/// `GET /guilds/{guild}/members/{user}`.
#[derive(Debug, Deserialize)]
struct GuildMemberResponse {
    user: UserObject,
    #[serde(default)]
    nick: Option<String>,
    #[serde(default)]
    roles: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct UserObject {
    id: String,
    username: String,
    #[serde(default)]
    global_name: Option<String>,
}

impl GuildMemberResponse {
    fn into_member(self) -> Member {
        let display_name = self
            .nick
            .or(self.user.global_name)
            .unwrap_or(self.user.username);
        Member {
            subject: SubjectId::new(self.user.id),
            display_name,
            roles: self.roles.into_iter().map(RoleId::new).collect(),
        }
    }
}

fn map_send_error(e: reqwest::Error) -> GroupError {
    if e.is_timeout() {
        GroupError::Unreachable(format!("request timed out: {e}"))
    } else if e.is_connect() {
        GroupError::Unreachable(format!("connection failed: {e}"))
    } else {
        GroupError::RequestFailed(e.to_string())
    }
}

impl DiscordGuildClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_api_base(token, DEFAULT_API_BASE, DEFAULT_TIMEOUT)
    }

    pub fn with_api_base(token: impl Into<String>, api_base: &str, timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            http_client,
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn member_url(&self, group: &GroupId, subject: &SubjectId) -> String {
        format!("{}/guilds/{group}/members/{subject}", self.api_base)
    }

    fn authorization(&self) -> String {
        format!("Bot {}", self.token)
    }
}

#[async_trait]
impl MembershipProvider for DiscordGuildClient {
    async fn resolve_member(
        &self,
        group: &GroupId,
        subject: &SubjectId,
    ) -> Result<Option<Member>, GroupError> {
        let response = self
            .http_client
            .get(self.member_url(group, subject))
            .header(reqwest::header::AUTHORIZATION, self.authorization())
            .send()
            .await
            .map_err(map_send_error)?;

        match response.status() {
            StatusCode::NOT_FOUND => return Ok(None),
            StatusCode::FORBIDDEN => {
                return Err(GroupError::Forbidden(format!("read members of {group}")))
            }
            status if !status.is_success() => {
                return Err(GroupError::RequestFailed(format!("HTTP status {status}")))
            }
            _ => {}
        }

        let body: GuildMemberResponse = response
            .json()
            .await
            .map_err(|e| GroupError::InvalidResponse(format!("failed to parse guild member: {e}")))?;
        Ok(Some(body.into_member()))
    }

    async fn grant_role(
        &self,
        group: &GroupId,
        member: &Member,
        role: &RoleId,
    ) -> Result<(), GroupError> {
        let url = format!("{}/roles/{role}", self.member_url(group, &member.subject));
        let response = self
            .http_client
            .put(url)
            .header(reqwest::header::AUTHORIZATION, self.authorization())
            .header(reqwest::header::CONTENT_LENGTH, 0)
            .send()
            .await
            .map_err(map_send_error)?;

        match response.status() {
            status if status.is_success() => {
                tracing::info!(%group, subject = %member.subject, %role, "role granted");
                Ok(())
            }
            StatusCode::NOT_FOUND => Err(GroupError::RoleNotFound(role.to_string())),
            StatusCode::FORBIDDEN => Err(GroupError::Forbidden(format!("grant role {role}"))),
            status => Err(GroupError::RequestFailed(format!("HTTP status {status}"))),
        }
    }
}
