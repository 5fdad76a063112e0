//! Sign-up and account form validation.

use std::fmt;

use crate::error::{Result, ViajeroError};

/// Minimum sign-up password length.
pub const MIN_SIGNUP_PASSWORD_LEN: usize = 8;

/// Minimum length accepted when changing a password.
pub const MIN_UPDATE_PASSWORD_LEN: usize = 6;

/// Special characters the sign-up policy accepts.
pub const PASSWORD_SPECIAL_CHARS: &str = "!@#$%&*?=-_+";

/// A password policy rule that was not met.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordRule {
    /// Shorter than the minimum.
    TooShort {
        /// Required length.
        min: usize,
    },
    /// No digit.
    MissingDigit,
    /// No upper-case letter.
    MissingUppercase,
    /// None of [`PASSWORD_SPECIAL_CHARS`].
    MissingSpecial,
}

impl fmt::Display for PasswordRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort { min } => write!(f, "password must be at least {min} characters"),
            Self::MissingDigit => f.write_str("password must contain at least one number"),
            Self::MissingUppercase => {
                f.write_str("password must contain at least one upper-case letter")
            }
            Self::MissingSpecial => write!(
                f,
                "password must contain at least one special character ({PASSWORD_SPECIAL_CHARS})"
            ),
        }
    }
}

/// Check a sign-up password, reporting the first rule it breaks.
///
/// # Errors
///
/// Returns `WeakPassword` with the failed rule.
pub fn check_password(password: &str) -> Result<()> {
    let rule = if password.chars().count() < MIN_SIGNUP_PASSWORD_LEN {
        Some(PasswordRule::TooShort {
            min: MIN_SIGNUP_PASSWORD_LEN,
        })
    } else if !password.chars().any(|c| c.is_ascii_digit()) {
        Some(PasswordRule::MissingDigit)
    } else if !password.chars().any(|c| c.is_ascii_uppercase()) {
        Some(PasswordRule::MissingUppercase)
    } else if !password.chars().any(|c| PASSWORD_SPECIAL_CHARS.contains(c)) {
        Some(PasswordRule::MissingSpecial)
    } else {
        None
    };
    rule.map_or(Ok(()), |rule| Err(ViajeroError::WeakPassword(rule)))
}

/// Check a new password on the account screen.
///
/// # Errors
///
/// Returns `WeakPassword` if it is shorter than six characters.
pub fn check_password_update(password: &str) -> Result<()> {
    if password.chars().count() < MIN_UPDATE_PASSWORD_LEN {
        return Err(ViajeroError::WeakPassword(PasswordRule::TooShort {
            min: MIN_UPDATE_PASSWORD_LEN,
        }));
    }
    Ok(())
}

/// Minimal shape check: one `@`, non-empty local part, dotted domain.
///
/// # Errors
///
/// Returns `InvalidEmail`.
pub fn check_email(email: &str) -> Result<()> {
    let trimmed = email.trim();
    let valid = trimmed.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty()
            && !domain.contains('@')
            && domain
                .split_once('.')
                .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
    });
    if valid {
        Ok(())
    } else {
        Err(ViajeroError::InvalidEmail(email.to_string()))
    }
}

/// The sign-up form.
#[derive(Debug, Clone, Default)]
pub struct SignUpForm {
    /// Email address.
    pub email: String,
    /// Password.
    pub password: String,
    /// Password confirmation.
    pub confirm_password: String,
    /// Optional display name stored in user metadata.
    pub display_name: String,
}

impl SignUpForm {
    /// Validate everything the auth service would otherwise reject later.
    ///
    /// # Errors
    ///
    /// Returns the first failure: missing email, bad email, weak password,
    /// confirmation mismatch.
    pub fn validate(&self) -> Result<()> {
        if self.email.trim().is_empty() {
            return Err(ViajeroError::MissingField("email"));
        }
        check_email(&self.email)?;
        check_password(&self.password)?;
        if self.password != self.confirm_password {
            return Err(ViajeroError::PasswordMismatch);
        }
        Ok(())
    }

    /// Display name, `None` when blank.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        let name = self.display_name.trim();
        (!name.is_empty()).then_some(name)
    }
}
