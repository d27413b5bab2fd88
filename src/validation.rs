use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use ts_rs::TS;
use utoipa::ToSchema;

use crate::models::{LoginRequest, RegisterRequest};

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$")
        .expect("email pattern is a valid regex")
});

/// FieldFault
///
/// One failed rule on one form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema, TS)]
#[ts(export)]
pub struct FieldFault {
    pub field: String,
    pub message: String,
}

/// A single check applied to a field value.
#[derive(Debug, Clone, Copy)]
pub enum Check {
    Required,
    Email,
    MinChars(usize),
    /// Value must equal the value of the named field.
    SameAs(&'static str),
}

/// FieldRule
///
/// The ordered checks for one field, each paired with the message reported
/// when it fails. Only the first failing check of a field is reported.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: &'static str,
    pub checks: &'static [(Check, &'static str)],
}

/// Read access to the raw values of a form, by field name.
pub trait FormFields {
    fn value(&self, field: &str) -> Option<&str>;
}

pub const LOGIN_RULES: &[FieldRule] = &[
    FieldRule {
        field: "email",
        checks: &[
            (Check::Required, "Email wajib diisi"),
            (Check::Email, "Email tidak valid"),
        ],
    },
    FieldRule {
        field: "password",
        checks: &[
            (Check::Required, "Password wajib diisi"),
            (Check::MinChars(6), "Password minimal 6 karakter"),
        ],
    },
];

pub const REGISTER_RULES: &[FieldRule] = &[
    FieldRule {
        field: "name",
        checks: &[
            (Check::Required, "Nama wajib diisi"),
            (Check::MinChars(2), "Nama minimal 2 karakter"),
        ],
    },
    FieldRule {
        field: "email",
        checks: &[
            (Check::Required, "Email wajib diisi"),
            (Check::Email, "Email tidak valid"),
        ],
    },
    FieldRule {
        field: "password",
        checks: &[
            (Check::Required, "Password wajib diisi"),
            (Check::MinChars(6), "Password minimal 6 karakter"),
        ],
    },
    FieldRule {
        field: "confirmPassword",
        checks: &[
            (Check::Required, "Konfirmasi password wajib diisi"),
            (Check::SameAs("password"), "Konfirmasi password tidak sesuai"),
        ],
    },
];

fn passes<F: FormFields + ?Sized>(form: &F, value: Option<&str>, check: Check) -> bool {
    match check {
        Check::Required => value.is_some_and(|v| !v.is_empty()),
        Check::Email => value.is_none_or(|v| v.is_empty() || EMAIL_PATTERN.is_match(v)),
        Check::MinChars(min) => value.is_none_or(|v| v.chars().count() >= min),
        Check::SameAs(other) => value == form.value(other),
    }
}

/// Runs `rules` against `form` and returns every failing field, in rule order.
pub fn validate<F: FormFields + ?Sized>(form: &F, rules: &[FieldRule]) -> Vec<FieldFault> {
    rules
        .iter()
        .filter_map(|rule| {
            let value = form.value(rule.field);
            rule.checks
                .iter()
                .find(|(check, _)| !passes(form, value, *check))
                .map(|(_, message)| FieldFault {
                    field: rule.field.to_string(),
                    message: message.to_string(),
                })
        })
        .collect()
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_PATTERN.is_match(value)
}

impl FormFields for LoginRequest {
    fn value(&self, field: &str) -> Option<&str> {
        match field {
            "email" => self.email.as_deref(),
            "password" => self.password.as_deref(),
            _ => None,
        }
    }
}

impl FormFields for RegisterRequest {
    fn value(&self, field: &str) -> Option<&str> {
        match field {
            "name" => self.name.as_deref(),
            "email" => self.email.as_deref(),
            "password" => self.password.as_deref(),
            "confirmPassword" => self.confirm_password.as_deref(),
            _ => None,
        }
    }
}
