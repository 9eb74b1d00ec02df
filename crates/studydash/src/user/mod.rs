//! User accounts and dashboard profiles.

mod models;
mod repository;
mod service;

pub use models::{ProfileUpdate, User};
pub use repository::UserRepository;
pub use service::UserService;
