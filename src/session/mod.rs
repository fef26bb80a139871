//! Sessions: identity, token pair, storage and refresh.

pub mod exchange;
pub mod manager;
pub mod model;
pub mod role;
pub mod store;
pub mod token;

pub use manager::{RefreshGrant, TokenManager, TokenRefresher};
pub use model::{Identity, Session, SessionError, SessionView};
pub use role::Role;
pub use store::{MemorySessionStore, SessionStore};
pub use token::{TokenPair, TokenState};
