use crate::auth::AuthState;

pub const LANDING: &str = "/";
pub const PROFILE_SETUP: &str = "/profile-setup";
pub const FEED: &str = "/feed";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Landing,
    ProfileSetup,
    Feed,
    Profile(String),
    NotFound,
}

impl Route {
    pub fn parse(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or("");
        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "" => Route::Landing,
            PROFILE_SETUP => Route::ProfileSetup,
            FEED => Route::Feed,
            other => match other.strip_prefix("/profile/") {
                Some(username) if !username.is_empty() && !username.contains('/') => {
                    Route::Profile(username.to_string())
                }
                _ => Route::NotFound,
            },
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Landing => LANDING.to_string(),
            Route::ProfileSetup => PROFILE_SETUP.to_string(),
            Route::Feed => FEED.to_string(),
            Route::Profile(username) => format!("/profile/{}", username),
            Route::NotFound => "/404".to_string(),
        }
    }

    /// Every page except the landing page needs a session.
    pub fn is_protected(&self) -> bool {
        matches!(self, Route::ProfileSetup | Route::Feed | Route::Profile(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guard {
    /// Auth state is still being restored; show a spinner.
    Loading,
    Redirect(&'static str),
    Render,
}

pub fn guard(route: &Route, auth: &AuthState) -> Guard {
    if !route.is_protected() {
        return Guard::Render;
    }
    if auth.loading {
        return Guard::Loading;
    }
    match auth.session {
        Some(_) => Guard::Render,
        None => Guard::Redirect(LANDING),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Session;
    use coffeehaus_types::models::User;
    use uuid::Uuid;

    fn signed_in() -> AuthState {
        AuthState {
            session: Some(Session {
                user: User {
                    id: Uuid::new_v4(),
                    email: "ada@example.com".into(),
                    username: None,
                    avatar_url: None,
                    bio: None,
                },
                token: "t".into(),
                is_new_user: false,
            }),
            loading: false,
        }
    }

    #[test]
    fn parses_paths() {
        assert_eq!(Route::parse("/"), Route::Landing);
        assert_eq!(Route::parse(""), Route::Landing);
        assert_eq!(Route::parse("/feed"), Route::Feed);
        assert_eq!(Route::parse("/feed/"), Route::Feed);
        assert_eq!(Route::parse("/profile-setup?step=1"), Route::ProfileSetup);
        assert_eq!(Route::parse("/profile/ada"), Route::Profile("ada".into()));
        assert_eq!(Route::parse("/profile/"), Route::NotFound);
        assert_eq!(Route::parse("/profile/ada/edit"), Route::NotFound);
        assert_eq!(Route::parse("/settings"), Route::NotFound);
        assert_eq!(Route::parse(&Route::Profile("bob".into()).path()), Route::Profile("bob".into()));
    }

    #[test]
    fn visitors_are_sent_to_the_landing_page() {
        let anonymous = AuthState::default();
        for path in ["/feed", "/profile-setup", "/profile/ada"] {
            assert_eq!(guard(&Route::parse(path), &anonymous), Guard::Redirect("/"), "{}", path);
        }
        assert_eq!(guard(&Route::Landing, &anonymous), Guard::Render);
    }

    #[test]
    fn loading_blocks_protected_routes_only() {
        let loading = AuthState {
            session: None,
            loading: true,
        };
        assert_eq!(guard(&Route::Feed, &loading), Guard::Loading);
        assert_eq!(guard(&Route::Landing, &loading), Guard::Render);
    }

    #[test]
    fn sessions_render_protected_routes() {
        assert_eq!(guard(&Route::Feed, &signed_in()), Guard::Render);
        assert_eq!(guard(&Route::Profile("bob".into()), &signed_in()), Guard::Render);
    }
}
