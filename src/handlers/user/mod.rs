//! Account endpoints: registration, login and profile.
pub mod auth;
pub mod profile;

pub use self::{auth::*, profile::*};
