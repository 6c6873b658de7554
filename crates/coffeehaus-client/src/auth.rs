use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{info, warn};

use coffeehaus_types::api::AuthResponse;
use coffeehaus_types::models::User;

use crate::api::UserServiceClient;
use crate::error::Result;
use crate::routes::{self, Guard, Route};
use crate::store::ProfileStore;

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user: User,
    pub token: String,
    /// True until the identity has completed profile setup.
    pub is_new_user: bool,
}

impl From<AuthResponse> for Session {
    fn from(resp: AuthResponse) -> Self {
        Self {
            user: User {
                id: resp.user_id,
                email: resp.email,
                username: None,
                avatar_url: None,
                bio: None,
            },
            token: resp.token,
            is_new_user: resp.is_new_user,
        }
    }
}

/// Where identities come from.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<Session>;

    async fn sign_out(&self) -> Result<()>;

    async fn current_session(&self) -> Option<Session>;
}

/// [`IdentityProvider`] backed by the user-service's `/auth` endpoints. The
/// session lives in memory only.
pub struct HttpIdentityProvider {
    client: UserServiceClient,
    session: RwLock<Option<Session>>,
}

impl HttpIdentityProvider {
    pub fn new(client: UserServiceClient) -> Self {
        Self {
            client,
            session: RwLock::new(None),
        }
    }

    fn remember(&self, session: Option<Session>) {
        if let Ok(mut slot) = self.session.write() {
            *slot = session;
        }
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let session = Session::from(self.client.login(email, password).await?);
        self.remember(Some(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Session> {
        let session = Session::from(self.client.register(email, password).await?);
        self.remember(Some(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<()> {
        self.remember(None);
        Ok(())
    }

    async fn current_session(&self) -> Option<Session> {
        self.session.read().ok().and_then(|s| s.clone())
    }
}

/// Browser-style history. The last entry is the current location.
#[derive(Clone)]
pub struct Navigator {
    history: Arc<watch::Sender<Vec<String>>>,
}

impl Navigator {
    pub fn new(start: &str) -> Self {
        Self {
            history: Arc::new(watch::Sender::new(vec![start.to_string()])),
        }
    }

    pub fn current(&self) -> String {
        self.history
            .borrow()
            .last()
            .cloned()
            .unwrap_or_else(|| routes::LANDING.to_string())
    }

    pub fn route(&self) -> Route {
        Route::parse(&self.current())
    }

    pub fn push(&self, path: &str) {
        self.history.send_modify(|h| h.push(path.to_string()));
    }

    /// Navigate without leaving the current page in history.
    pub fn replace(&self, path: &str) {
        self.history.send_modify(|h| {
            h.pop();
            h.push(path.to_string());
        });
    }

    pub fn history(&self) -> Vec<String> {
        self.history.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<String>> {
        self.history.subscribe()
    }
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new(routes::LANDING)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthState {
    pub session: Option<Session>,
    pub loading: bool,
}

/// Session holder shared by every page.
#[derive(Clone)]
pub struct AuthContext {
    provider: Arc<dyn IdentityProvider>,
    store: ProfileStore,
    navigator: Navigator,
    state: Arc<watch::Sender<AuthState>>,
}

impl AuthContext {
    pub fn new(provider: Arc<dyn IdentityProvider>, store: ProfileStore, navigator: Navigator) -> Self {
        Self {
            provider,
            store,
            navigator,
            state: Arc::new(watch::Sender::new(AuthState {
                session: None,
                loading: true,
            })),
        }
    }

    /// Restores whatever session the provider still holds.
    pub async fn init(&self) {
        let session = self.provider.current_session().await;
        self.state.send_modify(|s| s.loading = false);
        self.session_changed(session);
    }

    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn token(&self) -> Option<String> {
        self.state.borrow().session.as_ref().map(|s| s.token.clone())
    }

    pub fn store(&self) -> &ProfileStore {
        &self.store
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn guard(&self, route: &Route) -> Guard {
        routes::guard(route, &self.state())
    }

    /// Signs in and sends new users to profile setup, everyone else to the feed.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let session = self.provider.sign_in(email, password).await?;
        self.land(&session);
        Ok(session)
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Session> {
        let session = self.provider.sign_up(email, password).await?;
        self.land(&session);
        Ok(session)
    }

    /// Clears the session and the cached profile, then returns to the landing page.
    pub async fn sign_out(&self) {
        if let Err(e) = self.provider.sign_out().await {
            warn!("Identity provider sign-out failed: {}", e);
        }
        self.store.reset();
        self.session_changed(None);
        info!("Signed out");
    }

    /// Applies a session change pushed by the provider. Losing the session
    /// always ends on the landing page.
    pub fn session_changed(&self, session: Option<Session>) {
        let signed_out = session.is_none();
        self.state.send_modify(|s| s.session = session);
        if signed_out && self.navigator.current() != routes::LANDING {
            self.navigator.push(routes::LANDING);
        }
    }

    fn land(&self, session: &Session) {
        self.state.send_modify(|s| {
            s.session = Some(session.clone());
            s.loading = false;
        });
        let target = if session.is_new_user {
            routes::PROFILE_SETUP
        } else {
            routes::FEED
        };
        info!("Signed in as {}, going to {}", session.user.email, target);
        self.navigator.push(target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    struct StaticProvider {
        session: RwLock<Option<Session>>,
        is_new_user: bool,
    }

    fn session(is_new_user: bool) -> Session {
        Session {
            user: User {
                id: Uuid::new_v4(),
                email: "ada@example.com".into(),
                username: None,
                avatar_url: None,
                bio: None,
            },
            token: "token".into(),
            is_new_user,
        }
    }

    #[async_trait]
    impl IdentityProvider for StaticProvider {
        async fn sign_in(&self, _email: &str, _password: &str) -> Result<Session> {
            let s = session(self.is_new_user);
            *self.session.write().unwrap() = Some(s.clone());
            Ok(s)
        }

        async fn sign_up(&self, email: &str, password: &str) -> Result<Session> {
            self.sign_in(email, password).await
        }

        async fn sign_out(&self) -> Result<()> {
            *self.session.write().unwrap() = None;
            Ok(())
        }

        async fn current_session(&self) -> Option<Session> {
            self.session.read().unwrap().clone()
        }
    }

    fn context(is_new_user: bool, restored: Option<Session>) -> AuthContext {
        let provider = Arc::new(StaticProvider {
            session: RwLock::new(restored),
            is_new_user,
        });
        let store = ProfileStore::new(UserServiceClient::new("http://127.0.0.1:9"));
        AuthContext::new(provider, store, Navigator::default())
    }

    #[tokio::test]
    async fn guard_waits_for_init() {
        let ctx = context(false, Some(session(false)));
        assert_eq!(ctx.guard(&Route::Feed), Guard::Loading);

        ctx.init().await;
        assert_eq!(ctx.guard(&Route::Feed), Guard::Render);
    }

    #[tokio::test]
    async fn new_users_land_on_profile_setup() {
        let ctx = context(true, None);
        ctx.init().await;
        ctx.sign_in("ada@example.com", "pw").await.unwrap();
        assert_eq!(ctx.navigator().current(), "/profile-setup");
    }

    #[tokio::test]
    async fn returning_users_land_on_the_feed() {
        let ctx = context(false, None);
        ctx.init().await;
        ctx.sign_in("ada@example.com", "pw").await.unwrap();
        assert_eq!(ctx.navigator().current(), "/feed");
        assert_eq!(ctx.token().as_deref(), Some("token"));
    }

    #[tokio::test]
    async fn sign_out_clears_everything_and_goes_home() {
        let ctx = context(false, None);
        ctx.init().await;
        ctx.sign_in("ada@example.com", "pw").await.unwrap();

        ctx.sign_out().await;
        assert_eq!(ctx.state().session, None);
        assert_eq!(ctx.token(), None);
        assert_eq!(ctx.navigator().current(), "/");
        assert_eq!(ctx.guard(&Route::Feed), Guard::Redirect("/"));
        assert_eq!(ctx.store().snapshot().profile, None);
    }

    #[tokio::test]
    async fn lost_session_redirects_home() {
        let ctx = context(false, None);
        ctx.init().await;
        ctx.sign_in("ada@example.com", "pw").await.unwrap();

        ctx.session_changed(None);
        assert_eq!(ctx.navigator().current(), "/");
        assert_eq!(ctx.navigator().history(), vec!["/", "/feed", "/"]);
    }
}
