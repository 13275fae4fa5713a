//! Sessions and route access.
//!
//! There is no real authentication: [`AuthStub`] accepts any input. What
//! matters is that access is decided from an explicit `Option<&Session>`, and
//! a restricted route without one yields
//! [`AccessError::AuthenticationRequired`] instead of a side effect.

use chrono::{DateTime, Utc};
use horizon_core::environment::Clock;
use std::fmt;
use thiserror::Error;

/// Access errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// The route needs a signed-in user
    #[error("Authentication required for {route}")]
    AuthenticationRequired {
        /// Route that was refused
        route: Route,
    },
}

/// A signed-in user
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    /// Display name
    pub name: String,
    /// Email
    pub email: String,
}

/// A client-side session
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    /// Who is signed in
    pub user: User,
    /// When they signed in
    pub started_at: DateTime<Utc>,
}

/// Sign-in stub that accepts anything
#[derive(Clone, Copy, Debug, Default)]
pub struct AuthStub;

impl AuthStub {
    /// Name used when the form is left empty
    pub const DEFAULT_NAME: &'static str = "Demo User";

    /// Sign in with whatever was typed
    #[must_use]
    pub fn sign_in(name: &str, email: &str, clock: &dyn Clock) -> Session {
        let name = match name.trim() {
            "" => Self::DEFAULT_NAME.to_string(),
            trimmed => trimmed.to_string(),
        };
        tracing::info!(%name, "Signed in");
        Session {
            user: User {
                name,
                email: email.trim().to_string(),
            },
            started_at: clock.now(),
        }
    }

    /// One-click demo account
    #[must_use]
    pub fn demo_sign_in(clock: &dyn Clock) -> Session {
        Self::sign_in("Alex Morgan", "alex@eventhorizon.live", clock)
    }
}

/// Top-level destinations
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Route {
    /// Event listing
    Browse,
    /// Community moments
    Moments,
    /// One event's detail page
    Event(String),
    /// The signed-in user's tickets
    MyTickets,
    /// Organizer dashboard
    Admin,
    /// Profile
    Profile,
}

impl Route {
    /// Whether this route needs a session
    #[must_use]
    pub const fn requires_session(&self) -> bool {
        matches!(self, Self::MyTickets | Self::Admin | Self::Profile)
    }

    /// Path of this route
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Browse => "/".to_string(),
            Self::Moments => "/moments".to_string(),
            Self::Event(id) => format!("/event/{id}"),
            Self::MyTickets => "/tickets".to_string(),
            Self::Admin => "/admin".to_string(),
            Self::Profile => "/profile".to_string(),
        }
    }

    /// Parse a path; unknown paths yield `None`
    #[must_use]
    pub fn parse(path: &str) -> Option<Self> {
        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "" => Some(Self::Browse),
            "/moments" => Some(Self::Moments),
            "/tickets" => Some(Self::MyTickets),
            "/admin" => Some(Self::Admin),
            "/profile" => Some(Self::Profile),
            other => other
                .strip_prefix("/event/")
                .filter(|id| !id.is_empty() && !id.contains('/'))
                .map(|id| Self::Event(id.to_string())),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Decide whether `session` may open `route`
///
/// # Errors
///
/// Returns [`AccessError::AuthenticationRequired`] for a restricted route
/// without a session.
pub fn authorize(route: &Route, session: Option<&Session>) -> Result<(), AccessError> {
    if route.requires_session() && session.is_none() {
        tracing::debug!(%route, "Access refused without session");
        return Err(AccessError::AuthenticationRequired {
            route: route.clone(),
        });
    }
    Ok(())
}

/// Unwrap a session for a restricted route
///
/// # Errors
///
/// Returns [`AccessError::AuthenticationRequired`] when `session` is `None`.
pub fn require_session<'a>(route: &Route, session: Option<&'a Session>) -> Result<&'a Session, AccessError> {
    session.ok_or_else(|| AccessError::AuthenticationRequired {
        route: route.clone(),
    })
}
