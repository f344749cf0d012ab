//! Login/signup flow and route gating.
//!
//! Local validation always runs first: a form that fails it never
//! reaches the network. A successful response is stored in the session
//! with a single `set_auth` call before the user is routed onward.

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::api::{ApiClient, ClientError};
use crate::models::{LoginRequest, SignupRequest, User};
use crate::session::{SessionError, SessionStore};

pub const MIN_SIGNUP_USERNAME_CHARS: usize = 3;
pub const MIN_SIGNUP_PASSWORD_CHARS: usize = 6;

// ═══════════════════════════════════════════════════════════
// Routes
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Auth,
    Landing,
    Dashboard,
}

impl Route {
    pub fn requires_session(&self) -> bool {
        !matches!(self, Self::Auth)
    }
}

/// Where a visit to `wanted` actually lands.
pub fn gate(store: &dyn SessionStore, wanted: Route) -> Route {
    if wanted.requires_session() && !store.is_authenticated() {
        Route::Auth
    } else {
        wanted
    }
}

/// Clear the session and send the user back to the login page.
pub fn logout(store: &dyn SessionStore) -> Result<Route, SessionError> {
    store.clear_auth()?;
    tracing::info!("Signed out");
    Ok(Route::Auth)
}

// ═══════════════════════════════════════════════════════════
// Form + validation
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthTab {
    #[default]
    Login,
    Signup,
}

/// Raw auth form input. Secrets are wiped when the form is dropped.
#[derive(Debug, Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct AuthForm {
    #[zeroize(skip)]
    pub tab: AuthTab,
    pub username: String,
    pub password: String,
    pub admin_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthValidationError {
    #[error("Username is required")]
    MissingUsername,
    #[error("Password is required")]
    MissingPassword,
    #[error("Username must be at least {MIN_SIGNUP_USERNAME_CHARS} characters")]
    UsernameTooShort,
    #[error("Password must be at least {MIN_SIGNUP_PASSWORD_CHARS} characters")]
    PasswordTooShort,
}

/// A form that passed validation, ready to send.
#[derive(Debug, Clone)]
pub enum AuthRequest {
    Login(LoginRequest),
    Signup(SignupRequest),
}

impl AuthForm {
    pub fn login(username: &str, password: &str) -> Self {
        Self {
            tab: AuthTab::Login,
            username: username.to_string(),
            password: password.to_string(),
            admin_code: String::new(),
        }
    }

    pub fn signup(username: &str, password: &str, admin_code: &str) -> Self {
        Self {
            tab: AuthTab::Signup,
            username: username.to_string(),
            password: password.to_string(),
            admin_code: admin_code.to_string(),
        }
    }

    /// Non-empty username and password on both tabs; minimum lengths on
    /// signup only. The username is trimmed; a blank admin code is `None`.
    pub fn validate(&self) -> Result<AuthRequest, AuthValidationError> {
        let username = self.username.trim();
        if username.is_empty() {
            return Err(AuthValidationError::MissingUsername);
        }
        if self.password.is_empty() {
            return Err(AuthValidationError::MissingPassword);
        }

        match self.tab {
            AuthTab::Login => Ok(AuthRequest::Login(LoginRequest {
                username: username.to_string(),
                password: self.password.clone(),
            })),
            AuthTab::Signup => {
                if username.chars().count() < MIN_SIGNUP_USERNAME_CHARS {
                    return Err(AuthValidationError::UsernameTooShort);
                }
                if self.password.chars().count() < MIN_SIGNUP_PASSWORD_CHARS {
                    return Err(AuthValidationError::PasswordTooShort);
                }
                let admin_code = match self.admin_code.trim() {
                    "" => None,
                    code => Some(code.to_string()),
                };
                Ok(AuthRequest::Signup(SignupRequest {
                    username: username.to_string(),
                    password: self.password.clone(),
                    admin_code,
                }))
            }
        }
    }
}

/// Rewrite known backend auth errors into friendlier wording.
pub fn friendly_auth_error(raw: &str) -> String {
    let lower = raw.to_lowercase();
    if lower.contains("invalid username or password") {
        "Incorrect username or password. Please try again.".to_string()
    } else if lower.contains("username already exists") {
        "That username is already taken. Choose another or log in instead.".to_string()
    } else {
        raw.to_string()
    }
}

// ═══════════════════════════════════════════════════════════
// AuthFlow: LoggedOut → Submitting → LoggedIn
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    LoggedOut { error: Option<String> },
    Submitting,
    LoggedIn(User),
}

#[derive(Debug, thiserror::Error)]
pub enum AuthFailure {
    #[error(transparent)]
    Invalid(#[from] AuthValidationError),
    #[error("{message}")]
    Rejected {
        message: String,
        #[source]
        source: ClientError,
    },
    #[error("Could not store session: {0}")]
    Session(#[from] SessionError),
    #[error("A sign-in request is already in progress")]
    InProgress,
}

pub struct AuthFlow {
    state: AuthState,
}

impl AuthFlow {
    /// Start logged in when the store already holds a token and user.
    pub fn new(store: &dyn SessionStore) -> Self {
        let state = match (store.get_token(), store.get_user()) {
            (Some(_), Some(user)) => AuthState::LoggedIn(user),
            _ => AuthState::LoggedOut { error: None },
        };
        Self { state }
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            AuthState::LoggedOut { error } => error.as_deref(),
            _ => None,
        }
    }

    pub fn user(&self) -> Option<&User> {
        match &self.state {
            AuthState::LoggedIn(user) => Some(user),
            _ => None,
        }
    }

    fn fail(&mut self, message: String) {
        self.state = AuthState::LoggedOut {
            error: Some(message),
        };
    }

    /// Validate, call login or signup, store the session, route to landing.
    pub async fn submit(&mut self, client: &ApiClient, form: &AuthForm) -> Result<Route, AuthFailure> {
        if self.state == AuthState::Submitting {
            return Err(AuthFailure::InProgress);
        }

        let request = match form.validate() {
            Ok(request) => request,
            Err(e) => {
                self.fail(e.to_string());
                return Err(e.into());
            }
        };

        self.state = AuthState::Submitting;
        let response = match &request {
            AuthRequest::Login(req) => client.login(req).await,
            AuthRequest::Signup(req) => client.signup(req).await,
        };

        let response = match response {
            Ok(response) => response,
            Err(source) => {
                let message = friendly_auth_error(&source.to_string());
                tracing::info!(status = ?source.status(), "Authentication rejected");
                self.fail(message.clone());
                return Err(AuthFailure::Rejected { message, source });
            }
        };

        if let Err(e) = client
            .session()
            .set_auth(&response.access_token, &response.user)
        {
            self.fail(e.to_string());
            return Err(e.into());
        }

        tracing::info!(user_id = response.user.id, role = %response.user.role, "Signed in");
        self.state = AuthState::LoggedIn(response.user);
        Ok(Route::Landing)
    }

    /// Clear the session and return to `LoggedOut`.
    pub fn logout(&mut self, store: &dyn SessionStore) -> Result<Route, SessionError> {
        let route = logout(store)?;
        self.state = AuthState::LoggedOut { error: None };
        Ok(route)
    }
}
