//! Client core of Coffeehaus: everything the web pages decide, without the
//! rendering. Talks to the user-service over HTTP.

pub mod api;
pub mod auth;
pub mod debounce;
pub mod error;
pub mod feed;
pub mod forms;
pub mod routes;
pub mod store;

pub use api::UserServiceClient;
pub use auth::{AuthContext, AuthState, HttpIdentityProvider, IdentityProvider, Navigator, Session};
pub use debounce::{UsernameChecker, UsernameLookup, UsernameStatus};
pub use error::ClientError;
pub use routes::{Guard, Route};
pub use store::{ProfileState, ProfileStore, UserProfile};
