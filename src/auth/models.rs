// Authentication data models and DTOs

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::validation::validate_email_shape;

/// Fields never echoed back into a re-rendered form
pub const SECRET_FIELDS: [&str; 2] = ["password", "password_confirmation"];

/// Independent identity domains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Entrepreneur,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::User, Role::Entrepreneur];

    /// Session key holding this role's token
    pub fn session_key(self) -> &'static str {
        match self {
            Role::User => "user_token",
            Role::Entrepreneur => "entrepreneur_token",
        }
    }

    /// Where a freshly authenticated browser is sent
    pub fn home_route(self) -> &'static str {
        match self {
            Role::User => "/",
            Role::Entrepreneur => "/entrepreneur/dashboard",
        }
    }

    /// Browser-facing route of this role's form for a flow
    pub fn form_route(self, flow: AuthFlow) -> &'static str {
        match (self, flow) {
            (Role::User, AuthFlow::Login) => "/login",
            (Role::User, AuthFlow::Register) => "/register",
            (Role::Entrepreneur, AuthFlow::Login) => "/entrepreneur/login",
            (Role::Entrepreneur, AuthFlow::Register) => "/entrepreneur/register",
        }
    }

    /// Browser-facing logout route
    pub fn logout_route(self) -> &'static str {
        match self {
            Role::User => "/logout",
            Role::Entrepreneur => "/entrepreneur/logout",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Entrepreneur => "entrepreneur",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Login or registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthFlow {
    Login,
    Register,
}

impl fmt::Display for AuthFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthFlow::Login => f.write_str("login"),
            AuthFlow::Register => f.write_str("register"),
        }
    }
}

/// A credential submission for some role and flow
pub trait CredentialForm: Validate {
    /// Submitted fields in form order; `None` for fields the browser left out
    fn fields(&self) -> Vec<(&'static str, Option<&str>)>;

    /// Field names in form order
    fn field_names(&self) -> Vec<&'static str> {
        self.fields().into_iter().map(|(name, _)| name).collect()
    }

    /// Fields to send upstream
    fn submitted(&self) -> Vec<(String, String)> {
        self.fields()
            .into_iter()
            .filter_map(|(name, value)| value.map(|v| (name.to_string(), v.to_string())))
            .collect()
    }

    /// Fields to repopulate a re-rendered form with; secrets are left out
    fn old_input(&self) -> BTreeMap<String, String> {
        self.fields()
            .into_iter()
            .filter(|(name, _)| !SECRET_FIELDS.contains(name))
            .filter_map(|(name, value)| value.map(|v| (name.to_string(), v.to_string())))
            .collect()
    }
}

/// Login request, same shape for both roles
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct LoginCredentials {
    #[serde(default)]
    #[validate(custom = "validate_email_shape")]
    #[schema(example = "a@b.com")]
    pub email: Option<String>,
    #[serde(default)]
    #[schema(example = "secret")]
    pub password: Option<String>,
}

impl CredentialForm for LoginCredentials {
    fn fields(&self) -> Vec<(&'static str, Option<&str>)> {
        vec![
            ("email", self.email.as_deref()),
            ("password", self.password.as_deref()),
        ]
    }
}

/// End-user registration request
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UserRegistration {
    #[serde(default)]
    #[validate(length(max = 255, message = "The name may not be greater than 255 characters."))]
    #[schema(example = "Ana Pérez")]
    pub name: Option<String>,
    #[serde(default)]
    #[validate(length(max = 255, message = "The username may not be greater than 255 characters."))]
    #[schema(example = "anap")]
    pub username: Option<String>,
    #[serde(default)]
    #[validate(custom = "validate_email_shape")]
    #[schema(example = "ana@example.com")]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub password_confirmation: Option<String>,
}

impl CredentialForm for UserRegistration {
    fn fields(&self) -> Vec<(&'static str, Option<&str>)> {
        vec![
            ("name", self.name.as_deref()),
            ("username", self.username.as_deref()),
            ("email", self.email.as_deref()),
            ("password", self.password.as_deref()),
            ("password_confirmation", self.password_confirmation.as_deref()),
        ]
    }
}

/// Entrepreneur (seller) registration request
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct EntrepreneurRegistration {
    #[serde(default)]
    #[validate(length(max = 255, message = "The first name may not be greater than 255 characters."))]
    #[schema(example = "Luis")]
    pub first_name: Option<String>,
    #[serde(default)]
    #[validate(length(max = 255, message = "The last name may not be greater than 255 characters."))]
    #[schema(example = "Gómez")]
    pub last_name: Option<String>,
    #[serde(default)]
    #[validate(custom = "validate_email_shape")]
    #[schema(example = "luis@shop.test")]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub password_confirmation: Option<String>,
}

impl CredentialForm for EntrepreneurRegistration {
    fn fields(&self) -> Vec<(&'static str, Option<&str>)> {
        vec![
            ("first_name", self.first_name.as_deref()),
            ("last_name", self.last_name.as_deref()),
            ("email", self.email.as_deref()),
            ("password", self.password.as_deref()),
            ("password_confirmation", self.password_confirmation.as_deref()),
        ]
    }
}

/// JSON answer of a successful login/register
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthenticatedResponse {
    pub authenticated: bool,
    pub role: Role,
    /// Handed to browser scripts that keep their own copy under `API_TOKEN`
    pub token: String,
    #[schema(example = "/")]
    pub redirect: String,
}

/// JSON answer of a logout
#[derive(Debug, Serialize, ToSchema)]
pub struct LoggedOutResponse {
    pub authenticated: bool,
    pub role: Role,
    #[schema(example = "/")]
    pub redirect: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_session_keys_are_distinct() {
        assert_eq!(Role::User.session_key(), "user_token");
        assert_eq!(Role::Entrepreneur.session_key(), "entrepreneur_token");
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Entrepreneur).unwrap(), "\"entrepreneur\"");
        let role: Role = serde_json::from_str("\"user\"").unwrap();
        assert_eq!(role, Role::User);
    }

    #[test]
    fn test_missing_fields_are_not_submitted() {
        let form = EntrepreneurRegistration {
            first_name: Some("Luis".to_string()),
            email: Some("luis@shop.test".to_string()),
            password: Some("pw".to_string()),
            ..Default::default()
        };

        let submitted = form.submitted();
        assert!(submitted.iter().all(|(name, _)| name != "last_name"));
        assert!(submitted.contains(&("password".to_string(), "pw".to_string())));
    }

    #[test]
    fn test_old_input_omits_secrets() {
        let form = UserRegistration {
            name: Some("Ana".to_string()),
            username: Some("anap".to_string()),
            email: Some("ana@example.com".to_string()),
            password: Some("hunter22".to_string()),
            password_confirmation: Some("hunter22".to_string()),
        };

        let old = form.old_input();
        assert_eq!(old.len(), 3);
        assert_eq!(old["username"], "anap");
        assert!(!old.contains_key("password"));
        assert!(!old.contains_key("password_confirmation"));
    }

    #[test]
    fn test_bad_email_fails_local_validation() {
        let form = LoginCredentials {
            email: Some("not-an-email".to_string()),
            password: Some("pw".to_string()),
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));

        let blank = LoginCredentials {
            email: Some(String::new()),
            password: None,
        };
        assert!(blank.validate().is_ok());
    }

    proptest! {
        #[test]
        fn prop_password_never_in_old_input(
            email in "[a-z]{3,10}@[a-z]{3,10}\\.(com|org|net)",
            password in "[A-Z0-9!#%]{1,40}",
        ) {
            let form = LoginCredentials {
                email: Some(email),
                password: Some(password.clone()),
            };
            let old = form.old_input();
            prop_assert!(!old.contains_key("password"));
            prop_assert!(old.values().all(|value| value != &password));
        }
    }
}
