//! Typed user input: the raw form payload, required-field validation, and
//! the two-tier error map shared by local validation and upstream 422
//! responses.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::user::{Gender, User};

/// Names of the fields rendered on the user form, in display order.
///
/// Upstream 422 error keys outside this set become form-level messages.
pub const FORM_FIELDS: [&str; 4] = ["first_name", "last_name", "birthdate", "gender"];

const BLANK_MESSAGE: &str = "must not be blank";
const BAD_DATE_MESSAGE: &str = "must be a date in YYYY-MM-DD format";
const BAD_GENDER_MESSAGE: &str = "must be male or female";

/// Raw user form payload exactly as submitted.
///
/// Every field is optional so a partial submission decodes instead of
/// failing at the framework boundary; validation reports the gaps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserForm {
    /// Submitted given name.
    pub first_name: Option<String>,
    /// Submitted family name.
    pub last_name: Option<String>,
    /// Submitted birthdate, expected as `YYYY-MM-DD`.
    pub birthdate: Option<String>,
    /// Submitted gender wire value.
    pub gender: Option<String>,
    /// Anti-forgery token submitted with the form.
    #[serde(rename = "_token", skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl UserForm {
    /// Pre-fill the form from an existing user for the edit page.
    pub fn from_user(user: &User) -> Self {
        Self {
            first_name: Some(user.first_name.clone()),
            last_name: Some(user.last_name.clone()),
            birthdate: Some(user.birthdate.clone()),
            gender: Some(user.gender.as_str().to_owned()),
            token: None,
        }
    }

    /// Submitted value for a named field, empty when absent.
    pub fn value(&self, field: &str) -> &str {
        let value = match field {
            "first_name" => &self.first_name,
            "last_name" => &self.last_name,
            "birthdate" => &self.birthdate,
            "gender" => &self.gender,
            _ => &None,
        };
        value.as_deref().unwrap_or_default()
    }

    /// Validate required fields and produce a typed draft.
    ///
    /// Runs entirely locally; no network call happens until a draft exists.
    ///
    /// # Errors
    ///
    /// Returns the per-field messages when any required field is blank or
    /// unparseable.
    pub fn validate(&self) -> Result<UserDraft, FormErrors> {
        let mut errors = FormErrors::new();

        let first_name = require(&mut errors, "first_name", self.first_name.as_deref());
        let last_name = require(&mut errors, "last_name", self.last_name.as_deref());

        let birthdate = require(&mut errors, "birthdate", self.birthdate.as_deref())
            .and_then(|raw| match NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
                Ok(date) => Some(date),
                Err(_) => {
                    errors.add_field("birthdate", BAD_DATE_MESSAGE);
                    None
                }
            });

        let gender = require(&mut errors, "gender", self.gender.as_deref()).and_then(|raw| {
            match raw.parse::<Gender>() {
                Ok(gender) => Some(gender),
                Err(_) => {
                    errors.add_field("gender", BAD_GENDER_MESSAGE);
                    None
                }
            }
        });

        match (first_name, last_name, birthdate, gender) {
            (Some(first_name), Some(last_name), Some(birthdate), Some(gender))
                if errors.is_empty() =>
            {
                Ok(UserDraft {
                    first_name,
                    last_name,
                    birthdate,
                    gender,
                })
            }
            _ => Err(errors),
        }
    }
}

/// Validated, typed user input ready for submission to the upstream API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDraft {
    /// Given name, non-blank.
    pub first_name: String,
    /// Family name, non-blank.
    pub last_name: String,
    /// Parsed birthdate.
    pub birthdate: NaiveDate,
    /// Parsed gender.
    pub gender: Gender,
}

/// Two-tier validation error map.
///
/// Messages either attach to a known form field or, when the field name
/// matches nothing rendered, to the form as a whole. Both tiers survive a
/// re-render of the submitted form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    fields: BTreeMap<String, Vec<String>>,
    form: Vec<String>,
}

impl FormErrors {
    /// Empty error map.
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no message is recorded at either tier.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.form.is_empty()
    }

    /// Attach a message to a named field.
    pub fn add_field(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    /// Attach a form-level message.
    pub fn add_form(&mut self, message: impl Into<String>) {
        self.form.push(message.into());
    }

    /// Messages recorded for a named field.
    pub fn field(&self, field: &str) -> &[String] {
        self.fields.get(field).map_or(&[], Vec::as_slice)
    }

    /// Form-level messages in insertion order.
    pub fn form(&self) -> &[String] {
        self.form.as_slice()
    }

    /// Merge an upstream 422 `errors` object into this map.
    ///
    /// Keys naming a known form field attach their messages to that field;
    /// anything else collapses into one form-level message per key, keeping
    /// the upstream field name visible.
    pub fn absorb_upstream(&mut self, errors: &BTreeMap<String, Vec<String>>) {
        for (field, messages) in errors {
            if FORM_FIELDS.contains(&field.as_str()) {
                for message in messages {
                    self.add_field(field.clone(), message.clone());
                }
            } else {
                self.add_form(format!("{field}: {}", messages.join(", ")));
            }
        }
    }
}

fn require(errors: &mut FormErrors, field: &str, value: Option<&str>) -> Option<String> {
    match value {
        Some(value) if !value.trim().is_empty() => Some(value.to_owned()),
        _ => {
            errors.add_field(field, BLANK_MESSAGE);
            None
        }
    }
}
