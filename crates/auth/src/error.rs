//! Authentication error types.
//!
//! [`ErrorKind`] doubles as the user-facing classification of a failed
//! sign-in: [`ErrorKind::user_message()`] is what the user gets to see, the
//! `Display` output (and the error tree beneath it) is for logs.

use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unknown email, wrong password, or either of them missing
    #[display("invalid email or password")]
    InvalidCredentials,
    #[display("account disabled")]
    AccountDisabled,
    /// Temporarily locked out after repeated failures
    #[display("too many attempts")]
    TooManyAttempts,
    /// The request never got an answer (DNS, refused connection, timeout)
    #[display("network error: {_0}")]
    Network(#[error(not(source))] String),
    /// The service answered with something other than a sign-in result
    #[display("server error: {_0}")]
    Server(#[error(not(source))] String),
    /// Any other error code returned by the service
    #[display("sign-in rejected: {_0}")]
    Rejected(#[error(not(source))] String),
    #[display("invalid authentication endpoint `{_0}`")]
    InvalidEndpoint(#[error(not(source))] String),
}

impl ErrorKind {
    /// Classify an Identity Toolkit error message such as
    /// `INVALID_PASSWORD` or `TOO_MANY_ATTEMPTS_TRY_LATER : Access to this
    /// account has been temporarily disabled...`.
    pub fn from_firebase_message(message: &str) -> Self {
        let code = message.split(" : ").next().unwrap_or_default().trim();
        match code {
            "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "INVALID_EMAIL"
            | "MISSING_PASSWORD" | "MISSING_EMAIL" => Self::InvalidCredentials,
            "USER_DISABLED" => Self::AccountDisabled,
            "TOO_MANY_ATTEMPTS_TRY_LATER" => Self::TooManyAttempts,
            _ => Self::Rejected(message.to_string()),
        }
    }

    /// The single line shown to the user when signing in fails.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidCredentials => "Invalid email or password. Please try again.".to_string(),
            Self::AccountDisabled => "This account has been disabled. Please contact support.".to_string(),
            Self::TooManyAttempts => "Too many failed attempts. Please try again later.".to_string(),
            Self::Network(_) => "Network error. Please check your internet connection.".to_string(),
            Self::Server(_) => "Server error. Please try again later.".to_string(),
            Self::Rejected(message) => format!("An unexpected error occurred: {message}"),
            Self::InvalidEndpoint(_) => "The authentication service is misconfigured.".to_string(),
        }
    }

    /// Returns `true` if retrying later might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TooManyAttempts | Self::Network(_) | Self::Server(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("EMAIL_NOT_FOUND", ErrorKind::InvalidCredentials)]
    #[case("INVALID_PASSWORD", ErrorKind::InvalidCredentials)]
    #[case("INVALID_LOGIN_CREDENTIALS", ErrorKind::InvalidCredentials)]
    #[case("INVALID_EMAIL", ErrorKind::InvalidCredentials)]
    #[case("MISSING_PASSWORD", ErrorKind::InvalidCredentials)]
    #[case("USER_DISABLED", ErrorKind::AccountDisabled)]
    #[case("USER_DISABLED : The user account has been disabled by an administrator.", ErrorKind::AccountDisabled)]
    #[case("TOO_MANY_ATTEMPTS_TRY_LATER", ErrorKind::TooManyAttempts)]
    #[case(
        "TOO_MANY_ATTEMPTS_TRY_LATER : Access to this account has been temporarily disabled.",
        ErrorKind::TooManyAttempts
    )]
    #[case("OPERATION_NOT_ALLOWED", ErrorKind::Rejected("OPERATION_NOT_ALLOWED".to_string()))]
    fn test_from_firebase_message(#[case] message: &str, #[case] expected: ErrorKind) {
        assert_eq!(ErrorKind::from_firebase_message(message), expected);
    }

    #[test]
    fn test_user_messages_are_distinct() {
        let kinds = [
            ErrorKind::InvalidCredentials,
            ErrorKind::AccountDisabled,
            ErrorKind::TooManyAttempts,
            ErrorKind::Network(String::new()),
            ErrorKind::Server(String::new()),
            ErrorKind::Rejected("X".to_string()),
        ];
        let messages: std::collections::HashSet<_> = kinds.iter().map(ErrorKind::user_message).collect();
        assert_eq!(messages.len(), kinds.len());
    }

    #[rstest]
    #[case(ErrorKind::InvalidCredentials, false)]
    #[case(ErrorKind::AccountDisabled, false)]
    #[case(ErrorKind::TooManyAttempts, true)]
    #[case(ErrorKind::Network("refused".to_string()), true)]
    fn test_retryable(#[case] kind: ErrorKind, #[case] expected: bool) {
        assert_eq!(kind.is_retryable(), expected);
    }
}
