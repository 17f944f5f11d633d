use thiserror::Error;

/// Minimum length of a new password, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Current password is incorrect")]
    WrongCurrentPassword,

    #[error("New passwords do not match")]
    Mismatch,

    #[error("New password must be at least {min_length} characters long")]
    TooShort { min_length: usize },

    #[error("Not logged in")]
    NotLoggedIn,

    #[error("Credential storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Credential encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("Password hashing failed: {0}")]
    Hashing(String),
}

impl AuthError {
    pub fn user_message(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "Invalid password",
            AuthError::WrongCurrentPassword => "Current password is incorrect",
            AuthError::Mismatch => "New passwords do not match",
            AuthError::TooShort { .. } => "New password must be at least 6 characters long",
            AuthError::NotLoggedIn => "Please log in first",
            AuthError::Storage(_) | AuthError::Encoding(_) | AuthError::Hashing(_) => {
                "Unable to update password settings"
            }
        }
    }
}
