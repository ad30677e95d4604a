// Server-rendered pages
//
// Every page extends `layout.html`, which includes the one navbar component
// rendered from the session's AuthState. Templates are `.html`, so minijinja
// escapes every interpolated value.

pub mod handlers;

use std::collections::BTreeMap;
use std::sync::OnceLock;

use minijinja::{context, Environment, ErrorKind};
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::auth::error::AuthRejection;
use crate::auth::models::{AuthFlow, Role};

const TEMPLATES: [(&str, &str); 6] = [
    ("layout.html", include_str!("templates/layout.html")),
    ("navbar.html", include_str!("templates/navbar.html")),
    ("auth_form.html", include_str!("templates/auth_form.html")),
    ("home.html", include_str!("templates/home.html")),
    ("catalogue.html", include_str!("templates/catalogue.html")),
    ("profile.html", include_str!("templates/profile.html")),
];

static ENVIRONMENT: OnceLock<Result<Environment<'static>, String>> = OnceLock::new();

fn environment() -> Result<&'static Environment<'static>, minijinja::Error> {
    ENVIRONMENT
        .get_or_init(|| {
            let mut env = Environment::new();
            for (name, source) in TEMPLATES {
                env.add_template(name, source).map_err(|e| e.to_string())?;
            }
            Ok(env)
        })
        .as_ref()
        .map_err(|detail| minijinja::Error::new(ErrorKind::InvalidOperation, detail.clone()))
}

fn render<S: Serialize>(name: &str, ctx: S) -> Result<String, minijinja::Error> {
    environment()?.get_template(name)?.render(ctx)
}

/// Which roles the browser session is logged in as
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct AuthState {
    pub user: bool,
    pub entrepreneur: bool,
}

impl AuthState {
    pub fn is_authenticated(&self, role: Role) -> bool {
        match role {
            Role::User => self.user,
            Role::Entrepreneur => self.entrepreneur,
        }
    }
}

/// Data for a login or registration form
#[derive(Debug)]
pub struct FormView<'a> {
    pub role: Role,
    pub flow: AuthFlow,
    pub old_input: &'a BTreeMap<String, String>,
    pub rejection: Option<&'a AuthRejection>,
}

#[derive(Serialize)]
struct NavRole {
    name: &'static str,
    authenticated: bool,
    login_route: &'static str,
    logout_route: &'static str,
}

#[derive(Serialize)]
struct FormField {
    name: &'static str,
    label: &'static str,
    input_type: &'static str,
    value: String,
    error: Option<String>,
}

fn nav_roles(state: &AuthState) -> Vec<NavRole> {
    Role::ALL
        .iter()
        .map(|role| NavRole {
            name: role.as_str(),
            authenticated: state.is_authenticated(*role),
            login_route: role.form_route(AuthFlow::Login),
            logout_route: role.logout_route(),
        })
        .collect()
}

/// The navbar; the only place that decides between log-in and log-out buttons
pub fn navbar(state: &AuthState) -> Result<String, minijinja::Error> {
    render("navbar.html", context! { roles => nav_roles(state) })
}

fn form_fields(role: Role, flow: AuthFlow) -> &'static [(&'static str, &'static str, &'static str)] {
    match (role, flow) {
        (_, AuthFlow::Login) => &[("email", "Email", "email"), ("password", "Password", "password")],
        (Role::User, AuthFlow::Register) => &[
            ("name", "Name", "text"),
            ("username", "Username", "text"),
            ("email", "Email", "email"),
            ("password", "Password", "password"),
            ("password_confirmation", "Confirm password", "password"),
        ],
        (Role::Entrepreneur, AuthFlow::Register) => &[
            ("first_name", "First name", "text"),
            ("last_name", "Last name", "text"),
            ("email", "Email", "email"),
            ("password", "Password", "password"),
            ("password_confirmation", "Confirm password", "password"),
        ],
    }
}

/// Login or registration page, with per-field errors and repopulated input
pub fn auth_form(state: &AuthState, form: &FormView<'_>) -> Result<String, minijinja::Error> {
    let fields: Vec<FormField> = form_fields(form.role, form.flow)
        .iter()
        .map(|&(name, label, input_type)| FormField {
            name,
            label,
            input_type,
            // Secret inputs are always rendered blank
            value: if input_type == "password" {
                String::new()
            } else {
                form.old_input.get(name).cloned().unwrap_or_default()
            },
            error: form
                .rejection
                .and_then(|r| r.first_error(name))
                .map(str::to_string),
        })
        .collect();

    let submit = match form.flow {
        AuthFlow::Login => "Log in",
        AuthFlow::Register => "Create account",
    };

    render(
        "auth_form.html",
        context! {
            title => format!("{} {}", form.role, form.flow),
            roles => nav_roles(state),
            alert => form.rejection.map(|r| r.message.as_str()),
            action => form.role.form_route(form.flow),
            fields => fields,
            submit => submit,
        },
    )
}

/// Landing page
pub fn home(state: &AuthState) -> Result<String, minijinja::Error> {
    render(
        "home.html",
        context! {
            title => "Home",
            roles => nav_roles(state),
            welcome_back => state.user,
        },
    )
}

/// Catalogue page built from a paginated `{data: [...]}` listing
pub fn catalogue(state: &AuthState, title: &str, listing: Option<&Value>) -> Result<String, minijinja::Error> {
    let items: Vec<&str> = listing
        .and_then(|body| body.get("data"))
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|item| {
                    item.get("name")
                        .or_else(|| item.get("nombre"))
                        .and_then(Value::as_str)
                        .unwrap_or("Untitled")
                })
                .collect()
        })
        .unwrap_or_default();

    render(
        "catalogue.html",
        context! {
            title => title,
            roles => nav_roles(state),
            items => items,
        },
    )
}

/// Profile page for either role, splicing the display name from the profile body
pub fn profile(state: &AuthState, role: Role, profile: Option<&Value>) -> Result<String, minijinja::Error> {
    let title = match role {
        Role::User => "Profile",
        Role::Entrepreneur => "Dashboard",
    };

    render(
        "profile.html",
        context! {
            title => title,
            roles => nav_roles(state),
            role => role.as_str(),
            name => profile.and_then(display_name),
            login_route => role.form_route(AuthFlow::Login),
        },
    )
}

fn display_name(profile: &Value) -> Option<String> {
    // Profiles come back either bare or wrapped in `data`
    let profile = profile.get("data").filter(|d| d.is_object()).unwrap_or(profile);

    if let Some(name) = profile.get("name").and_then(Value::as_str) {
        return Some(name.to_string());
    }

    let first = profile.get("first_name").and_then(Value::as_str);
    let last = profile.get("last_name").and_then(Value::as_str);
    match (first, last) {
        (Some(first), Some(last)) => Some(format!("{} {}", first, last)),
        (Some(first), None) => Some(first.to_string()),
        _ => None,
    }
}
