//! Student dashboard backend library.
//!
//! The core is the credential verification gate in [`auth`]; the rest of the
//! crate is the HTTP surface, account store and third-party API proxy that
//! collaborate with it.

pub mod api;
pub mod auth;
pub mod db;
pub mod user;
pub mod youtube;
