use reqwest::{RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use coffeehaus_types::api::{
    AuthResponse, CreateProfileRequest, ErrorBody, LoginRequest, RegisterRequest, UpdateProfileRequest,
    UsernameExistsResponse,
};
use coffeehaus_types::models::{Post, Profile};
use coffeehaus_types::search::{SearchOptions, SearchResult};

use crate::error::{ClientError, Result};

/// HTTP client for the Coffeehaus user-service.
#[derive(Clone)]
pub struct UserServiceClient {
    http: reqwest::Client,
    base_url: String,
}

impl UserServiceClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // -- Identity --

    pub async fn register(&self, email: &str, password: &str) -> Result<AuthResponse> {
        let body = RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        send(self.http.post(self.url("/auth/register")).json(&body)).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        send(self.http.post(self.url("/auth/login")).json(&body)).await
    }

    // -- Profiles --

    /// `GET /user`: the signed-in user's profile.
    pub async fn get_user(&self, token: &str) -> Result<Profile> {
        send(self.http.get(self.url("/user")).bearer_auth(token)).await
    }

    pub async fn create_profile(&self, token: &str, req: &CreateProfileRequest) -> Result<Profile> {
        self.send_json(self.http.post(self.url("/user")), token, req).await
    }

    /// `PUT /user/{username}`: partial update of the caller's profile.
    pub async fn update_profile(&self, token: &str, username: &str, patch: &UpdateProfileRequest) -> Result<Profile> {
        let url = self.url(&format!("/user/{}", username));
        self.send_json(self.http.put(url), token, patch).await
    }

    pub async fn get_profile(&self, token: &str, username: &str) -> Result<Profile> {
        let url = self.url(&format!("/users/{}", username));
        send(self.http.get(url).bearer_auth(token)).await
    }

    pub async fn username_exists(&self, token: &str, username: &str) -> Result<bool> {
        let url = self.url(&format!("/usernames/{}", username));
        let resp: UsernameExistsResponse = send(self.http.get(url).bearer_auth(token)).await?;
        Ok(resp.exists)
    }

    // -- Feed & search --

    pub async fn feed(&self, token: &str) -> Result<Vec<Post>> {
        send(self.http.get(self.url("/feed")).bearer_auth(token)).await
    }

    pub async fn search(&self, token: &str, opts: &SearchOptions) -> Result<SearchResult> {
        let mut params: Vec<(&str, String)> = vec![("q", opts.query.clone())];
        if opts.has_location() {
            params.push(("lat", opts.lat.to_string()));
            params.push(("lng", opts.lng.to_string()));
        }
        if opts.radius > 0 {
            params.push(("radius", opts.radius.to_string()));
        }
        if opts.limit > 0 {
            params.push(("limit", opts.limit.to_string()));
        }
        if opts.offset > 0 {
            params.push(("offset", opts.offset.to_string()));
        }
        send(self.http.get(self.url("/search")).query(&params).bearer_auth(token)).await
    }

    async fn send_json<B: Serialize, T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        token: &str,
        body: &B,
    ) -> Result<T> {
        send(builder.bearer_auth(token).json(body)).await
    }
}

async fn send<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T> {
    let resp = check(builder.send().await?).await?;
    Ok(resp.json::<T>().await?)
}

/// Turns a non-2xx response into a [`ClientError`], keeping the body's `message`.
async fn check(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let text = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|b| b.message)
        .unwrap_or_default();
    debug!("User-service answered {}: {}", status, text);
    Err(ClientError::from_status(status.as_u16(), message))
}
