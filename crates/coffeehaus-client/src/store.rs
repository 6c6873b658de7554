use std::sync::Arc;

use tokio::sync::watch;
use tracing::warn;

use coffeehaus_types::api::{CreateProfileRequest, UpdateProfileRequest};
use coffeehaus_types::models::Profile;

use crate::api::UserServiceClient;
use crate::error::{ClientError, Result};

const FETCH_FAILED: &str = "Failed to fetch user profile";
const USERNAME_TAKEN: &str = "Username is already taken";

/// The signed-in user's profile as the pages use it.
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub username: String,
    pub display_name: String,
    pub bio: Option<String>,
    pub profile_photo_id: Option<String>,
    pub photo_url: Option<String>,
}

impl From<Profile> for UserProfile {
    fn from(p: Profile) -> Self {
        let photo_url = p.photo_url().map(str::to_string);
        Self {
            username: p.username,
            display_name: p.display_name,
            bio: p.bio,
            profile_photo_id: p.profile_photo_id,
            photo_url,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileState {
    pub profile: Option<UserProfile>,
    pub is_loading: bool,
    pub error: Option<String>,
}

/// Process-wide holder of the current user's profile. Cloning shares the
/// same state; the last write wins.
#[derive(Clone)]
pub struct ProfileStore {
    client: UserServiceClient,
    state: Arc<watch::Sender<ProfileState>>,
}

impl ProfileStore {
    pub fn new(client: UserServiceClient) -> Self {
        Self {
            client,
            state: Arc::new(watch::Sender::new(ProfileState::default())),
        }
    }

    pub fn snapshot(&self) -> ProfileState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ProfileState> {
        self.state.subscribe()
    }

    pub fn profile(&self) -> Option<UserProfile> {
        self.state.borrow().profile.clone()
    }

    /// Loads the profile behind `token`. Failures end up in the state's
    /// `error`, never in the return value.
    pub async fn fetch_profile(&self, token: &str) {
        self.begin();
        match self.client.get_user(token).await {
            Ok(profile) => {
                self.finish_ok(profile);
            }
            Err(e) => {
                let message = match e {
                    ClientError::Transport(e) => e.to_string(),
                    _ => FETCH_FAILED.to_string(),
                };
                warn!("Profile fetch failed: {}", message);
                self.finish_err(message);
            }
        }
    }

    /// Sends a partial update for the profile currently named `username`.
    /// On failure the message is stored and the same error returned.
    pub async fn update_profile(&self, token: &str, username: &str, patch: &UpdateProfileRequest) -> Result<UserProfile> {
        self.begin();
        match self.client.update_profile(token, username, patch).await {
            Ok(profile) => Ok(self.finish_ok(profile)),
            Err(e) => {
                let e = write_error(e, "update");
                self.finish_err(e.to_string());
                Err(e)
            }
        }
    }

    /// Profile setup. Same error handling as [`Self::update_profile`].
    pub async fn create_profile(&self, token: &str, req: &CreateProfileRequest) -> Result<UserProfile> {
        self.begin();
        match self.client.create_profile(token, req).await {
            Ok(profile) => Ok(self.finish_ok(profile)),
            Err(e) => {
                let e = write_error(e, "create");
                self.finish_err(e.to_string());
                Err(e)
            }
        }
    }

    pub fn reset(&self) {
        self.state.send_replace(ProfileState::default());
    }

    fn begin(&self) {
        self.state.send_modify(|s| {
            s.is_loading = true;
            s.error = None;
        });
    }

    fn finish_ok(&self, profile: Profile) -> UserProfile {
        let profile = UserProfile::from(profile);
        self.state.send_modify(|s| {
            s.profile = Some(profile.clone());
            s.is_loading = false;
        });
        profile
    }

    fn finish_err(&self, message: String) {
        self.state.send_modify(|s| {
            s.is_loading = false;
            s.error = Some(message);
        });
    }
}

/// Rewrites a failed profile write into the message the forms display:
/// the body's `message` where there is one, otherwise a generic line.
fn write_error(e: ClientError, action: &str) -> ClientError {
    let (status, message) = match e {
        ClientError::Conflict(_) => return ClientError::Conflict(USERNAME_TAKEN.into()),
        ClientError::Unauthorized(message) => (401, message),
        ClientError::Server { status, message } => (status, message),
        other => return other,
    };
    let message = if message.is_empty() {
        format!("Failed to {} profile ({})", action, status)
    } else {
        message
    };
    ClientError::Server { status, message }
}
