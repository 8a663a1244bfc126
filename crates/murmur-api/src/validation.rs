//! Input checks run before anything touches the store.

use std::sync::LazyLock;

use regex::Regex;

use murmur_types::api::{LoginRequest, RegisterRequest};

use crate::error::ApiError;

pub const MIN_PASSWORD_LEN: usize = 6;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex")
});

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Trims username and email and checks the registration form.
/// The password is kept as typed.
pub fn validate_registration(req: RegisterRequest) -> Result<RegisterRequest, ApiError> {
    let username = req.username.trim().to_string();
    let email = req.email.trim().to_string();

    if username.is_empty() || email.is_empty() || req.password.trim().is_empty() {
        return Err(ApiError::Validation("Please fill in all fields".into()));
    }
    if !is_valid_email(&email) {
        return Err(ApiError::Validation(
            "Please enter a valid email address".into(),
        ));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::Validation(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LEN
        )));
    }

    Ok(RegisterRequest {
        username,
        email,
        password: req.password,
        profile_image: req.profile_image.filter(|uri| !uri.trim().is_empty()),
    })
}

pub fn validate_login(req: LoginRequest) -> Result<LoginRequest, ApiError> {
    let username = req.username.trim().to_string();
    if username.is_empty() || req.password.trim().is_empty() {
        return Err(ApiError::Validation("Please fill in all fields".into()));
    }
    Ok(LoginRequest {
        username,
        password: req.password,
    })
}

pub fn validate_message_body(body: &str) -> Result<String, ApiError> {
    let body = body.trim();
    if body.is_empty() {
        return Err(ApiError::Validation("Message cannot be empty".into()));
    }
    Ok(body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(username: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest::new(username, email, password)
    }

    fn reason(result: Result<RegisterRequest, ApiError>) -> String {
        result.unwrap_err().to_string()
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("first.last@sub.example.org"));
        assert!(!is_valid_email("a@x"));
        assert!(!is_valid_email("ax.com"));
        assert!(!is_valid_email("a b@x.com"));
        assert!(!is_valid_email("a@@x.com"));
    }

    #[test]
    fn registration_trims_identity_fields() {
        let req = validate_registration(form("  alice ", " a@x.com ", " secret1")).unwrap();
        assert_eq!(req.username, "alice");
        assert_eq!(req.email, "a@x.com");
        assert_eq!(req.password, " secret1");
    }

    #[test]
    fn registration_rejections() {
        assert_eq!(
            reason(validate_registration(form("", "a@x.com", "secret1"))),
            "Please fill in all fields"
        );
        assert_eq!(
            reason(validate_registration(form("alice", "a@x.com", "   "))),
            "Please fill in all fields"
        );
        assert_eq!(
            reason(validate_registration(form("alice", "not-an-email", "secret1"))),
            "Please enter a valid email address"
        );
        assert_eq!(
            reason(validate_registration(form("alice", "a@x.com", "12345"))),
            "Password must be at least 6 characters long"
        );
    }

    #[test]
    fn blank_profile_image_is_dropped() {
        let mut req = form("alice", "a@x.com", "secret1");
        req.profile_image = Some("  ".into());
        assert!(validate_registration(req).unwrap().profile_image.is_none());
    }

    #[test]
    fn login_and_message_checks() {
        let login = validate_login(LoginRequest::new(" alice ", "pw")).unwrap();
        assert_eq!(login.username, "alice");
        assert!(validate_login(LoginRequest::new("alice", "")).is_err());

        assert_eq!(validate_message_body("  hey  ").unwrap(), "hey");
        assert_eq!(
            validate_message_body(" \n ").unwrap_err(),
            ApiError::Validation("Message cannot be empty".into())
        );
    }
}
