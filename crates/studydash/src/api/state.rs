//! Application state shared across handlers.

use crate::auth::AuthGate;
use crate::user::UserService;
use crate::youtube::YouTubeClient;

/// State handed to every handler. Cheap to clone; all members are shallow.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthGate,
    pub users: UserService,
    pub youtube: YouTubeClient,
}
