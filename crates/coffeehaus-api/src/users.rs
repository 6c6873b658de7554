use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use coffeehaus_db::{NewProfile, ProfileRow, ProfileUpdate, WriteOutcome};
use coffeehaus_types::api::{Claims, CreateProfileRequest, UpdateProfileRequest, UsernameExistsResponse};
use coffeehaus_types::models::{PhotoVersions, Profile, ProfilePhoto};
use coffeehaus_types::validate::{normalize_username, validate_bio, validate_display_name, validate_username};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const USERNAME_TAKEN: &str = "Username already taken";

/// The caller's own profile.
pub async fn get_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Profile>> {
    let user_id = claims.sub.to_string();
    let row = state
        .db(move |db| db.get_profile_by_user_id(&user_id))
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".into()))?;

    Ok(Json(to_profile(row)))
}

/// Profile setup. Each identity gets exactly one profile.
pub async fn create_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<CreateProfileRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(req) = payload?;

    let username = req.username.trim().to_string();
    validate_username(&username)?;
    validate_display_name(&req.display_name)?;
    let bio = clean_bio(req.bio);
    if let Some(bio) = &bio {
        validate_bio(bio)?;
    }
    let display_name = req.display_name.trim().to_string();

    let user_id = claims.sub.to_string();
    let outcome = {
        let user_id = user_id.clone();
        let username = username.clone();
        state
            .db(move |db| {
                if db.get_profile_by_user_id(&user_id)?.is_some() {
                    return Ok(None);
                }
                let outcome = db.create_profile(&NewProfile {
                    user_id: &user_id,
                    username: &username,
                    display_name: &display_name,
                    bio: bio.as_deref(),
                })?;
                Ok(Some(outcome))
            })
            .await?
    };

    match outcome {
        None => return Err(ApiError::Conflict("Profile already exists".into())),
        Some(WriteOutcome::Conflict) => return Err(ApiError::Conflict(USERNAME_TAKEN.into())),
        Some(WriteOutcome::Written) => {}
    }
    info!("Created profile '{}' for user {}", username, user_id);

    let row = state
        .db(move |db| db.get_profile_by_user_id(&user_id))
        .await?
        .ok_or_else(|| anyhow::anyhow!("profile vanished after insert"))?;

    Ok((StatusCode::CREATED, Json(to_profile(row))))
}

/// Partial update of the profile at `{username}`, which must belong to the caller.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(username): Path<String>,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> ApiResult<Json<Profile>> {
    let Json(req) = payload?;

    let new_username = req.username.map(|u| u.trim().to_string());
    if let Some(u) = &new_username {
        validate_username(u)?;
    }
    if let Some(name) = &req.display_name {
        validate_display_name(name)?;
    }
    if let Some(bio) = &req.bio {
        validate_bio(bio)?;
    }

    let current = {
        let username = username.clone();
        state
            .db(move |db| db.get_profile_by_username(&username))
            .await?
            .ok_or_else(|| ApiError::NotFound("Profile not found".into()))?
    };
    if current.user_id != claims.sub.to_string() {
        return Err(ApiError::Forbidden);
    }

    let target_username = new_username.unwrap_or_else(|| current.username.clone());
    if target_username != username {
        let candidate = target_username.clone();
        if state.db(move |db| db.username_exists(&candidate)).await? {
            return Err(ApiError::Conflict(USERNAME_TAKEN.into()));
        }
    }

    let display_name = req
        .display_name
        .map(|n| n.trim().to_string())
        .unwrap_or_else(|| current.display_name.clone());
    let bio = match req.bio {
        Some(bio) => clean_bio(Some(bio)),
        None => current.bio.clone(),
    };

    let user_id = current.user_id.clone();
    let outcome = {
        let user_id = user_id.clone();
        let username = target_username.clone();
        state
            .db(move |db| {
                db.update_profile(
                    &user_id,
                    &ProfileUpdate {
                        username: &username,
                        display_name: &display_name,
                        bio: bio.as_deref(),
                    },
                )
            })
            .await?
    };
    // Lost a race for the username between the check and the write.
    if outcome == WriteOutcome::Conflict {
        return Err(ApiError::Conflict(USERNAME_TAKEN.into()));
    }
    info!("Updated profile '{}' (now '{}')", username, target_username);

    let row = state
        .db(move |db| db.get_profile_by_user_id(&user_id))
        .await?
        .ok_or_else(|| anyhow::anyhow!("profile vanished after update"))?;

    Ok(Json(to_profile(row)))
}

pub async fn get_profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<Json<Profile>> {
    let username = normalize_username(&username);
    let row = state
        .db(move |db| db.get_profile_by_username(&username))
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".into()))?;

    Ok(Json(to_profile(row)))
}

pub async fn username_exists(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<Json<UsernameExistsResponse>> {
    let username = normalize_username(&username);
    let exists = {
        let username = username.clone();
        state.db(move |db| db.username_exists(&username)).await?
    };

    Ok(Json(UsernameExistsResponse { username, exists }))
}

fn to_profile(row: ProfileRow) -> Profile {
    Profile {
        username: row.username,
        display_name: row.display_name,
        bio: row.bio,
        profile_photo_id: row.profile_photo_id,
        photos: row.photo_url.map(|url| ProfilePhoto {
            versions: PhotoVersions { original: Some(url) },
        }),
    }
}

/// An empty bio is stored as no bio.
fn clean_bio(bio: Option<String>) -> Option<String> {
    bio.map(|b| b.trim().to_string()).filter(|b| !b.is_empty())
}
