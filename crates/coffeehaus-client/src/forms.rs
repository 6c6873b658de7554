use std::sync::Arc;

use tracing::debug;

use coffeehaus_types::api::{CreateProfileRequest, UpdateProfileRequest};
use coffeehaus_types::validate::{ValidationError, normalize_username, validate_bio, validate_display_name, validate_username};

use crate::auth::Navigator;
use crate::debounce::{UsernameChecker, UsernameLookup, UsernameStatus};
use crate::routes;
use crate::store::{ProfileStore, UserProfile};

fn validate_fields(username: &str, display_name: &str, bio: &str) -> Result<(), ValidationError> {
    validate_username(username)?;
    validate_display_name(display_name)?;
    validate_bio(bio)
}

/// The edit-profile dialog.
pub struct EditProfileForm {
    original_username: String,
    username: String,
    pub display_name: String,
    pub bio: String,
    checker: UsernameChecker,
    submitting: bool,
    error: Option<String>,
    open: bool,
}

impl EditProfileForm {
    pub fn open(profile: &UserProfile, lookup: Arc<dyn UsernameLookup>) -> Self {
        Self::with_checker(profile, UsernameChecker::new(lookup, profile.username.clone()))
    }

    pub fn with_checker(profile: &UserProfile, checker: UsernameChecker) -> Self {
        Self {
            original_username: profile.username.clone(),
            username: profile.username.clone(),
            display_name: profile.display_name.clone(),
            bio: profile.bio.clone().unwrap_or_default(),
            checker,
            submitting: false,
            error: None,
            open: true,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Normalises the raw input and restarts the availability check.
    pub fn set_username(&mut self, raw: &str) {
        self.username = normalize_username(raw);
        self.checker.input(&self.username);
    }

    pub fn username_status(&self) -> UsernameStatus {
        self.checker.status()
    }

    pub fn can_submit(&self) -> bool {
        !self.submitting
            && !matches!(
                self.checker.status(),
                UsernameStatus::Taken | UsernameStatus::Checking
            )
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    /// Saves through the store. Closes on success; on failure the error is
    /// shown inline and the dialog stays open.
    pub async fn submit(&mut self, store: &ProfileStore, token: &str) -> bool {
        if !self.can_submit() {
            return false;
        }
        self.error = None;
        if let Err(e) = validate_fields(&self.username, &self.display_name, &self.bio) {
            self.error = Some(e.to_string());
            return false;
        }

        self.submitting = true;
        let patch = UpdateProfileRequest {
            username: Some(self.username.clone()),
            display_name: Some(self.display_name.trim().to_string()),
            bio: Some(self.bio.clone()),
        };
        let result = store
            .update_profile(token, &self.original_username, &patch)
            .await;
        self.submitting = false;

        match result {
            Ok(profile) => {
                debug!("Profile saved as '{}'", profile.username);
                self.open = false;
                true
            }
            Err(e) => {
                self.error = Some(e.to_string());
                false
            }
        }
    }
}

/// The first-run profile setup page.
#[derive(Debug, Default)]
pub struct ProfileSetupForm {
    username: String,
    pub display_name: String,
    pub bio: String,
    submitting: bool,
    error: Option<String>,
}

impl ProfileSetupForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn set_username(&mut self, raw: &str) {
        self.username = normalize_username(raw);
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Creates the profile and replaces the setup page with the feed. On any
    /// error the page stays where it is and shows the message.
    pub async fn submit(&mut self, store: &ProfileStore, token: &str, navigator: &Navigator) -> bool {
        if self.submitting {
            return false;
        }
        self.error = None;
        if let Err(e) = validate_fields(&self.username, &self.display_name, &self.bio) {
            self.error = Some(e.to_string());
            return false;
        }

        self.submitting = true;
        let bio = self.bio.trim();
        let req = CreateProfileRequest {
            username: self.username.clone(),
            display_name: self.display_name.trim().to_string(),
            bio: (!bio.is_empty()).then(|| bio.to_string()),
        };
        let result = store.create_profile(token, &req).await;
        self.submitting = false;

        match result {
            Ok(_) => {
                navigator.replace(routes::FEED);
                true
            }
            Err(e) => {
                self.error = Some(e.to_string());
                false
            }
        }
    }
}
