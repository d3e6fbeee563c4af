//! Field rules for untrusted user input.
//!
//! Everything here is pure. Callers get either normalized values or a
//! `DomainError::Validation` carrying a fixed message plus the per-field
//! messages under `details.fields`.

use std::borrow::Cow;
use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::contract::model::{CreateUserInput, NewUser};
use crate::domain::error::DomainError;

pub mod limits {
    pub const NAME_MIN: u64 = 2;
    pub const NAME_MAX: u64 = 100;
    pub const EMAIL_MAX: u64 = 255;
    pub const USERNAME_MIN: u64 = 3;
    pub const USERNAME_MAX: u64 = 50;
    pub const PHONE_MAX: u64 = 20;
    pub const WEBSITE_MAX: u64 = 255;
    pub const COMPANY_MAX: u64 = 100;
    pub const SEARCH_MAX: usize = 100;
}

pub const CREATE_USER_MESSAGE: &str = "Data validation error";
pub const SEARCH_MESSAGE: &str = "Invalid search query";
pub const ID_MESSAGE: &str = "Invalid ID";

/// field name → messages, in stable order.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern"));
static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("username pattern"));

/// Normalized create request the declarative rules run against.
#[derive(Debug, Validate)]
struct UserCandidate {
    #[validate(length(
        min = limits::NAME_MIN,
        max = limits::NAME_MAX,
        message = "Name must contain between 2 and 100 characters"
    ))]
    name: String,

    #[validate(
        regex(path = *EMAIL_RE, message = "Invalid email format"),
        length(max = limits::EMAIL_MAX, message = "Email must not exceed 255 characters")
    )]
    email: String,

    #[validate(
        length(
            min = limits::USERNAME_MIN,
            max = limits::USERNAME_MAX,
            message = "Username must contain between 3 and 50 characters"
        ),
        regex(
            path = *USERNAME_RE,
            message = "Username can only contain letters, numbers, hyphens and underscores"
        )
    )]
    username: String,

    #[validate(length(max = limits::PHONE_MAX, message = "Phone must not exceed 20 characters"))]
    phone: Option<String>,

    #[validate(
        length(max = limits::WEBSITE_MAX, message = "Website must not exceed 255 characters"),
        custom(function = "absolute_url")
    )]
    website: Option<String>,

    #[validate(length(
        max = limits::COMPANY_MAX,
        message = "Company name must not exceed 100 characters"
    ))]
    company: Option<String>,
}

fn absolute_url(value: &str) -> Result<(), ValidationError> {
    url::Url::parse(value)
        .map(|_| ())
        .map_err(|_| ValidationError::new("url").with_message(Cow::Borrowed("Invalid URL format")))
}

/// Trim; blank becomes `None`.
fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn collect(errors: &ValidationErrors) -> FieldErrors {
    let mut out = FieldErrors::new();
    for (field, list) in errors.field_errors() {
        let messages = list
            .iter()
            .map(|e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string())
            })
            .collect();
        out.insert(field.to_string(), messages);
    }
    out
}

/// Field-level check of a create request.
///
/// Name and email are trimmed before their rules run. Username is checked
/// exactly as given, so surrounding whitespace is rejected by the charset rule.
pub fn check_create_user(input: CreateUserInput) -> Result<NewUser, FieldErrors> {
    let missing: Vec<(&str, &str)> = [
        ("name", input.name.is_none(), "Name is required"),
        ("email", input.email.is_none(), "Email is required"),
        ("username", input.username.is_none(), "Username is required"),
    ]
    .into_iter()
    .filter(|(_, absent, _)| *absent)
    .map(|(field, _, msg)| (field, msg))
    .collect();

    let candidate = UserCandidate {
        name: input.name.unwrap_or_default().trim().to_string(),
        email: input.email.unwrap_or_default().trim().to_string(),
        username: input.username.unwrap_or_default(),
        phone: optional(input.phone),
        website: optional(input.website),
        company: optional(input.company),
    };

    let mut errors = match candidate.validate() {
        Ok(()) => FieldErrors::new(),
        Err(e) => collect(&e),
    };
    // A missing field reports only that it is missing.
    for (field, msg) in missing {
        errors.insert(field.to_string(), vec![msg.to_string()]);
    }
    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(NewUser {
        name: candidate.name,
        email: candidate.email.to_lowercase(),
        username: candidate.username,
        phone: candidate.phone,
        website: candidate.website,
        company: candidate.company,
    })
}

fn field_details(errors: &FieldErrors) -> serde_json::Value {
    json!({ "fields": errors })
}

fn single(field: &str, message: &str) -> FieldErrors {
    FieldErrors::from([(field.to_string(), vec![message.to_string()])])
}

pub fn validate_create_user(input: CreateUserInput) -> Result<NewUser, DomainError> {
    check_create_user(input).map_err(|fields| {
        DomainError::validation_with_details(CREATE_USER_MESSAGE, field_details(&fields))
    })
}

/// `q` must be present and 1–100 characters after trimming.
pub fn validate_search_query(q: Option<&str>) -> Result<String, DomainError> {
    let Some(raw) = q else {
        return Err(DomainError::validation("Query parameter \"q\" is required"));
    };
    let q = raw.trim();
    let problem = if q.is_empty() {
        Some("Search query cannot be empty")
    } else if q.chars().count() > limits::SEARCH_MAX {
        Some("Search query must not exceed 100 characters")
    } else {
        None
    };
    match problem {
        Some(msg) => Err(DomainError::validation_with_details(
            SEARCH_MESSAGE,
            field_details(&single("q", msg)),
        )),
        None => Ok(q.to_string()),
    }
}

/// Path ids are decimal integers greater than zero.
pub fn validate_id_param(raw: &str) -> Result<i64, DomainError> {
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(DomainError::validation_with_details(
            ID_MESSAGE,
            field_details(&single("id", "ID must be a positive number")),
        )),
    }
}
