//! Request handlers.

pub mod auth;
pub mod misc;
pub mod youtube;

pub use auth::{get_profile, login, me, signup, update_profile};
pub use misc::{health, private_probe};
