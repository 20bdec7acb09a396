use crate::error::{Result, SimulationError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub email: String,
}

/// Authentication context for the dashboard.
///
/// A stub gate: any non-blank email is accepted. `login` and `logout` return
/// the next session instead of mutating shared state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    user: Option<User>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn login(&self, credentials: &Credentials) -> Result<Session> {
        let email = credentials.email.trim();
        if email.is_empty() {
            return Err(SimulationError::InvalidCredentials("email is required".into()));
        }
        Ok(Session {
            user: Some(User {
                email: email.to_string(),
            }),
        })
    }

    pub fn logout(&self) -> Session {
        Session::default()
    }
}
