//! Blocking HTTP client for an Authentik-style identity provider

use crate::config::ProviderConfig;
use crate::directory::UserRecord;
use crate::error::{Error, Result};
use crate::provider::{DirectoryClient, Invite, NewUser};
use chrono::{DateTime, Utc};
use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

/// Page size for directory listings; the provider caps larger requests.
const LIST_PAGE_SIZE: u32 = 750;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// One page of a user listing
#[derive(Deserialize)]
struct UserListPage {
    results: Vec<UserRecord>,
    /// URL of the next page, if any
    #[serde(default)]
    next: Option<String>,
}

#[derive(Deserialize)]
struct CreatedUser {
    pk: serde_json::Value,
}

#[derive(Deserialize)]
struct RecoveryResponse {
    #[serde(default)]
    link: Option<String>,
}

#[derive(Deserialize)]
struct CreatedInvite {
    pk: String,
}

/// Directory client backed by the provider's REST API
pub struct HttpDirectoryClient {
    http: Client,
    api_url: String,
    token: String,
    flow_id: String,
}

impl HttpDirectoryClient {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::DirectoryClient(format!("Failed to build HTTP client: {}", e)))?;

        Ok(HttpDirectoryClient {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.api_token.clone(),
            flow_id: config.flow_id.clone(),
        })
    }

    fn get(&self, url: &str) -> Result<Response> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .header("Accept", "application/json")
            .send()?;
        Self::check_status(response)
    }

    fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().unwrap_or_default();
        Err(Error::DirectoryClient(format!(
            "Provider returned {}: {}",
            status,
            body.chars().take(200).collect::<String>()
        )))
    }
}

impl DirectoryClient for HttpDirectoryClient {
    fn list_users(&self, search: Option<&str>) -> Result<Vec<UserRecord>> {
        let mut url = format!(
            "{}/core/users/?page_size={}",
            self.api_url, LIST_PAGE_SIZE
        );
        if let Some(term) = search {
            url.push_str("&search=");
            url.push_str(&urlencode(term));
        }

        let mut users = Vec::new();
        let mut next = Some(url);

        // Follow the provider's next-page links until exhausted
        while let Some(page_url) = next {
            let page: UserListPage = self.get(&page_url)?.json()?;
            users.extend(page.results);
            next = page.next;
        }

        debug!(count = users.len(), "Listed provider users");
        Ok(users)
    }

    fn create_user(&self, user: &NewUser) -> Result<Option<String>> {
        let payload = json!({
            "username": user.username,
            "name": user.name,
            "email": user.email,
            "is_active": true,
            "groups": user.groups,
            "attributes": {},
            "path": "users",
            "type": "internal",
        });

        let response = self
            .http
            .post(format!("{}/core/users/", self.api_url))
            .bearer_auth(&self.token)
            .json(&payload)
            .send()?;

        // The provider answers 400 when the username is already taken
        if response.status() == StatusCode::BAD_REQUEST {
            warn!(username = %user.username, "Provider rejected user creation");
            return Ok(None);
        }

        let created: CreatedUser = Self::check_status(response)?.json()?;
        Ok(Some(pk_to_string(created.pk)))
    }

    fn set_user_active(&self, user_id: &str, is_active: bool) -> Result<()> {
        let response = self
            .http
            .patch(format!("{}/core/users/{}/", self.api_url, user_id))
            .bearer_auth(&self.token)
            .json(&json!({ "is_active": is_active }))
            .send()?;

        Self::check_status(response)?;
        Ok(())
    }

    fn delete_user(&self, user_id: &str) -> Result<bool> {
        let response = self
            .http
            .delete(format!("{}/core/users/{}/", self.api_url, user_id))
            .bearer_auth(&self.token)
            .send()?;

        let status = Self::check_status(response)?.status();
        Ok(status == StatusCode::NO_CONTENT)
    }

    fn set_password(&self, user_id: &str, new_password: &str) -> Result<()> {
        let response = self
            .http
            .post(format!(
                "{}/core/users/{}/set_password/",
                self.api_url, user_id
            ))
            .bearer_auth(&self.token)
            .json(&json!({ "password": new_password }))
            .send()?;

        Self::check_status(response)?;
        Ok(())
    }

    fn get_recovery_link(&self, user_id: &str) -> Result<String> {
        let response = self
            .http
            .post(format!("{}/core/users/{}/recovery/", self.api_url, user_id))
            .bearer_auth(&self.token)
            .send()?;

        let recovery: RecoveryResponse = Self::check_status(response)?.json()?;
        recovery.link.ok_or_else(|| {
            Error::DirectoryClient("Provider returned no recovery link".to_string())
        })
    }

    fn create_invite(&self, label: &str, expires: DateTime<Utc>) -> Result<Invite> {
        let payload = json!({
            "name": label,
            "expires": expires.to_rfc3339(),
            "fixed_data": {},
            "single_use": true,
            "flow": self.flow_id,
        });

        let response = self
            .http
            .post(format!(
                "{}/stages/invitation/invitations/",
                self.api_url
            ))
            .bearer_auth(&self.token)
            .json(&payload)
            .send()?;

        let created: CreatedInvite = Self::check_status(response)?.json()?;
        Ok(Invite {
            id: created.pk,
            expires,
        })
    }
}

fn pk_to_string(pk: serde_json::Value) -> String {
    match pk {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Minimal query-string escaping for search terms
fn urlencode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urlencode() {
        assert_eq!(urlencode("jdoe"), "jdoe");
        assert_eq!(urlencode("john doe"), "john%20doe");
        assert_eq!(urlencode("a+b@c"), "a%2Bb%40c");
    }

    #[test]
    fn test_pk_to_string() {
        assert_eq!(pk_to_string(serde_json::json!(42)), "42");
        assert_eq!(pk_to_string(serde_json::json!("abc")), "abc");
    }

    #[test]
    fn test_list_page_parses_without_next() {
        let page: UserListPage =
            serde_json::from_str(r#"{"results": [{"pk": 1, "username": "a"}]}"#).unwrap();
        assert_eq!(page.results.len(), 1);
        assert!(page.next.is_none());
    }
}
