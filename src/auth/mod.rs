// Authentication module
// Bridges browser logins to the external API and keeps issued tokens per role

pub mod error;
pub mod handlers;
pub mod models;
pub mod service;
pub mod token;

// Re-export commonly used types
pub use error::{AuthFailure, AuthRejection};
pub use handlers::{
    entrepreneur_login, entrepreneur_logout, entrepreneur_register, user_login, user_logout,
    user_register,
};
pub use models::{
    AuthFlow, CredentialForm, EntrepreneurRegistration, LoginCredentials, Role, UserRegistration,
};
pub use service::AuthService;
pub use token::BearerToken;
