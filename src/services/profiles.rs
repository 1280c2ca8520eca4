use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

use crate::models::{CandidateFilter, Profile, ProfileCounter};
use crate::services::store::{ProfileDirectory, StoreError};

/// Errors that can occur when talking to the profile service
#[derive(Debug, Error)]
pub enum ProfileServiceError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Unauthorized: invalid API key")]
    Unauthorized,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// HTTP client for the profile subsystem
///
/// Profiles are owned elsewhere; this client reads them, lists candidate
/// pools and bumps the aggregate counters kept on each profile.
pub struct ProfileServiceClient {
    base_url: String,
    api_key: String,
    client: Client,
}

impl ProfileServiceClient {
    pub fn new(base_url: String, api_key: String, timeout: Duration) -> Result<Self, ProfileServiceError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }

    fn profile_url(&self, id: &str) -> String {
        format!("{}/profiles/{}", self.base_url, urlencoding::encode(id))
    }

    async fn check_status(
        response: reqwest::Response,
        what: &str,
    ) -> Result<reqwest::Response, ProfileServiceError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ProfileServiceError::Unauthorized);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read body".to_string());
        tracing::error!("Profile service failed to {}: {} - {}", what, status, body);
        Err(ProfileServiceError::ApiError(format!("Failed to {}: {}", what, status)))
    }

    /// Fetch a single profile; `None` if the service does not know the id
    pub async fn fetch_profile(&self, id: &str) -> Result<Option<Profile>, ProfileServiceError> {
        tracing::debug!("Fetching profile {}", id);

        let response = self
            .client
            .get(self.profile_url(id))
            .header("X-Api-Key", &self.api_key)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let json: Value = Self::check_status(response, "fetch profile").await?.json().await?;
        let data = json.get("data").unwrap_or(&json);

        serde_json::from_value(data.clone())
            .map(Some)
            .map_err(|e| ProfileServiceError::InvalidResponse(format!("Failed to parse profile: {}", e)))
    }

    /// List profiles narrowed by `filter`
    ///
    /// Entries that fail to parse are skipped rather than failing the page.
    pub async fn search_profiles(&self, filter: &CandidateFilter) -> Result<Vec<Profile>, ProfileServiceError> {
        let mut params = vec![
            format!("exclude={}", urlencoding::encode(&filter.requester_id)),
            format!("limit={}", filter.limit),
        ];

        for gender in &filter.genders {
            params.push(format!("gender={}", gender.as_str()));
        }
        if let Some(min) = filter.min_age {
            params.push(format!("minAge={}", min));
        }
        if let Some(max) = filter.max_age {
            params.push(format!("maxAge={}", max));
        }
        for id in &filter.exclude_ids {
            params.push(format!("exclude={}", urlencoding::encode(id)));
        }
        if let Some(id) = &filter.exclude_blockers_of {
            params.push(format!("notBlockedBy={}", urlencoding::encode(id)));
        }

        let url = format!("{}/profiles?{}", self.base_url, params.join("&"));

        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .send()
            .await?;

        let json: Value = Self::check_status(response, "list candidates").await?.json().await?;

        let documents = json
            .get("profiles")
            .and_then(|d| d.as_array())
            .ok_or_else(|| ProfileServiceError::InvalidResponse("Missing profiles array".into()))?;

        let profiles: Vec<Profile> = documents
            .iter()
            .filter_map(|doc| {
                let data = doc.get("data").unwrap_or(doc);
                match serde_json::from_value(data.clone()) {
                    Ok(profile) => Some(profile),
                    Err(e) => {
                        tracing::warn!("Skipping unparseable candidate profile: {}", e);
                        None
                    }
                }
            })
            .filter(|p: &Profile| p.id != filter.requester_id && !filter.exclude_ids.contains(&p.id))
            .collect();

        tracing::debug!("Profile service returned {} candidates", profiles.len());

        Ok(profiles)
    }

    /// Add `by` to one of the profile's aggregate counters
    pub async fn increment_counter(
        &self,
        id: &str,
        counter: ProfileCounter,
        by: i64,
    ) -> Result<(), ProfileServiceError> {
        let url = format!("{}/counters", self.profile_url(id));

        let response = self
            .client
            .post(&url)
            .header("X-Api-Key", &self.api_key)
            .json(&json!({ "counter": counter.as_str(), "by": by }))
            .send()
            .await?;

        Self::check_status(response, "increment counter").await?;
        tracing::debug!("Incremented {} for {} by {}", counter.as_str(), id, by);
        Ok(())
    }
}

#[async_trait]
impl ProfileDirectory for ProfileServiceClient {
    async fn get_profile(&self, id: &str) -> Result<Option<Profile>, StoreError> {
        Ok(self.fetch_profile(id).await?)
    }

    async fn list_candidate_profiles(&self, filter: &CandidateFilter) -> Result<Vec<Profile>, StoreError> {
        Ok(self.search_profiles(filter).await?)
    }

    async fn increment_profile_counter(
        &self,
        id: &str,
        counter: ProfileCounter,
        by: i64,
    ) -> Result<(), StoreError> {
        Ok(self.increment_counter(id, counter, by).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation_trims_base_url() {
        let client = ProfileServiceClient::new(
            "https://profiles.test/v1/".to_string(),
            "test_key".to_string(),
            Duration::from_secs(5),
        )
        .unwrap();

        assert_eq!(client.base_url, "https://profiles.test/v1");
        assert_eq!(client.profile_url("a b"), "https://profiles.test/v1/profiles/a%20b");
    }
}
