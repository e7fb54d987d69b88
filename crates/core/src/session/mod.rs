//! Authentication and session handling
//!
//! `AuthenticationSession` holds the cached token shared between a
//! repository client and the transactions it starts. `SessionAwareExecutor`
//! logs in on demand and recovers once from an expired token.

pub mod executor;
pub mod state;

pub use executor::SessionAwareExecutor;
pub use state::{AuthenticationSession, SessionToken};
