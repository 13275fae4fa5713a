//! Profile page of the signed-in user.
//!
//! Opening it needs a session. The page keeps an editable copy of the user's
//! details; [`ProfilePage::save`] writes it back into the session and
//! [`ProfilePage::cancel`] discards it.

use crate::session::{AccessError, Route, Session, User, require_session};
use thiserror::Error;

/// Bio shown until the user writes their own
pub const DEFAULT_BIO: &str = "Digital nomad. Music enthusiast. Event explorer.";

/// Member id printed on the card
pub const MEMBER_ID: &str = "8829 • 4421 • 0092";

/// Year shown as "joined" on the card
pub const MEMBER_SINCE: &str = "2025";

/// Profile form errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProfileError {
    /// The name field is blank
    #[error("Name must not be empty")]
    EmptyName,

    /// The email field has no `@`
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),
}

/// Profile sections
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ProfileTab {
    /// Name, email and bio
    #[default]
    General,
    /// Password settings
    Security,
    /// Saved cards
    Billing,
}

impl ProfileTab {
    /// Every tab in display order
    pub const ALL: [Self; 3] = [Self::General, Self::Security, Self::Billing];

    /// Navigation label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::General => "General Info",
            Self::Security => "Security",
            Self::Billing => "Billing Methods",
        }
    }
}

/// Editable profile fields
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProfileForm {
    /// Full name
    pub name: String,
    /// Email address
    pub email: String,
    /// Free-form bio
    pub bio: String,
}

impl ProfileForm {
    fn from_user(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.clone(),
            bio: DEFAULT_BIO.to_string(),
        }
    }
}

/// Member card on the profile sidebar
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberCard {
    /// Printed member id
    pub member_id: &'static str,
    /// Holder name
    pub name: String,
    /// Avatar letter
    pub initial: char,
    /// Year joined
    pub joined: &'static str,
}

/// A saved payment card (display only)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SavedCard {
    /// Card network
    pub brand: &'static str,
    /// Last four digits
    pub last4: &'static str,
    /// Expiry as `MM/YY`
    pub expires: &'static str,
}

const SAVED_CARDS: [SavedCard; 1] = [SavedCard {
    brand: "VISA",
    last4: "4242",
    expires: "12/28",
}];

/// An open profile page
#[derive(Clone, Debug)]
pub struct ProfilePage {
    tab: ProfileTab,
    form: ProfileForm,
    saved: ProfileForm,
}

impl ProfilePage {
    /// Open the profile of the signed-in user
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::AuthenticationRequired`] without a session.
    pub fn open(session: Option<&Session>) -> Result<Self, AccessError> {
        let session = require_session(&Route::Profile, session)?;
        let form = ProfileForm::from_user(&session.user);
        Ok(Self {
            tab: ProfileTab::default(),
            saved: form.clone(),
            form,
        })
    }

    /// Active tab
    #[must_use]
    pub const fn tab(&self) -> ProfileTab {
        self.tab
    }

    /// Switch tabs; the form keeps its edits
    pub fn select_tab(&mut self, tab: ProfileTab) {
        self.tab = tab;
    }

    /// Current form contents
    #[must_use]
    pub const fn form(&self) -> &ProfileForm {
        &self.form
    }

    /// Form contents for editing
    pub fn form_mut(&mut self) -> &mut ProfileForm {
        &mut self.form
    }

    /// Whether the form differs from what was last saved
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.form != self.saved
    }

    /// Drop unsaved edits
    pub fn cancel(&mut self) {
        self.form = self.saved.clone();
    }

    /// Validate the form and write name and email into `session`
    ///
    /// # Errors
    ///
    /// - [`ProfileError::EmptyName`] for a blank name
    /// - [`ProfileError::InvalidEmail`] for an email without `@`
    pub fn save(&mut self, session: &mut Session) -> Result<(), ProfileError> {
        let name = self.form.name.trim();
        if name.is_empty() {
            return Err(ProfileError::EmptyName);
        }
        let email = self.form.email.trim();
        if !email.contains('@') {
            return Err(ProfileError::InvalidEmail(email.to_string()));
        }

        self.form.name = name.to_string();
        self.form.email = email.to_string();
        session.user = User {
            name: self.form.name.clone(),
            email: self.form.email.clone(),
        };
        self.saved = self.form.clone();
        tracing::info!(name = %session.user.name, "Profile updated");
        Ok(())
    }

    /// Card shown next to the tabs
    #[must_use]
    pub fn member_card(&self) -> MemberCard {
        MemberCard {
            member_id: MEMBER_ID,
            name: self.saved.name.clone(),
            initial: self.saved.name.chars().next().unwrap_or('?'),
            joined: MEMBER_SINCE,
        }
    }

    /// Cards listed under [`ProfileTab::Billing`]
    #[must_use]
    pub const fn saved_cards(&self) -> &'static [SavedCard] {
        &SAVED_CARDS
    }
}
