use serde::{Deserialize, Serialize};

/// Role string the backend uses for administrators.
pub const ADMIN_ROLE: &str = "admin";

/// Authenticated user as returned by login/signup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub role: String,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role.eq_ignore_ascii_case(ADMIN_ROLE)
    }
}

/// Body of `POST /api/auth/login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Body of `POST /api/auth/signup`. `admin_code` is always sent, `null` when blank.
#[derive(Debug, Clone, Serialize)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
    pub admin_code: Option<String>,
}

/// Response of both auth endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub user: User,
}
