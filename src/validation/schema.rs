use crate::geo::coordinates_from_value;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::OnceLock;
use validator::{ValidateEmail, ValidateLength, ValidateRange, ValidateUrl};

/// Outcome of validating a payload. Lists every violated constraint.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

/// Constraint on a whole number. Amounts are stored as `i64`, so only JSON
/// integers in that range are accepted; `350000.0` is rejected.
#[derive(Debug, Clone, Default)]
pub struct NumberRule {
    pub positive: bool,
    pub min: Option<i64>,
    pub max: Option<i64>,
    /// Appended to the ceiling in error messages, e.g. "KRW"
    pub unit: &'static str,
}

/// What a single field must look like
#[derive(Debug, Clone)]
pub enum Kind {
    /// Non-empty after trimming, at most `max_len` characters
    Text { max_len: usize },
    Number(NumberRule),
    Bool,
    OneOf(&'static [&'static str]),
    Object(Vec<FieldRule>),
    /// `{lat, lng}` inside the valid ranges
    Coordinates,
    /// A single `https://` URL
    Url,
    /// Array of `https://` URLs
    UrlList { max_items: usize },
    /// Array of short strings such as tags
    TextList { max_items: usize, max_len: usize },
    Email,
    Phone,
}

impl Kind {
    pub fn text(max_len: usize) -> Self {
        Kind::Text { max_len }
    }

    pub fn object(fields: Vec<FieldRule>) -> Self {
        Kind::Object(fields)
    }

    pub fn url_list(max_items: usize) -> Self {
        Kind::UrlList { max_items }
    }
}

#[derive(Debug, Clone)]
pub struct FieldRule {
    pub name: &'static str,
    pub required: bool,
    pub kind: Kind,
}

impl FieldRule {
    pub fn required(name: &'static str, kind: Kind) -> Self {
        Self {
            name,
            required: true,
            kind,
        }
    }

    pub fn optional(name: &'static str, kind: Kind) -> Self {
        Self {
            name,
            required: false,
            kind,
        }
    }
}

/// Declarative description of a create payload, evaluated against untrusted JSON
#[derive(Debug, Clone)]
pub struct Schema {
    fields: Vec<FieldRule>,
}

impl Schema {
    pub fn new(fields: Vec<FieldRule>) -> Self {
        Self { fields }
    }

    pub fn validate(&self, payload: &Value) -> ValidationReport {
        let mut errors = Vec::new();
        match payload.as_object() {
            Some(object) => check_fields(&self.fields, object, "", &mut errors),
            None => errors.push("payload must be an object".to_string()),
        }
        ValidationReport::from_errors(errors)
    }
}

fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", parent, name)
    }
}

fn check_fields(
    fields: &[FieldRule],
    object: &Map<String, Value>,
    parent: &str,
    errors: &mut Vec<String>,
) {
    for field in fields {
        let path = join_path(parent, field.name);
        match object.get(field.name) {
            None | Some(Value::Null) => {
                if field.required {
                    errors.push(format!("{} is required", path));
                }
            }
            Some(value) => check_value(&field.kind, value, &path, errors),
        }
    }
}

fn check_value(kind: &Kind, value: &Value, path: &str, errors: &mut Vec<String>) {
    match kind {
        Kind::Text { max_len } => check_text(value, path, *max_len, errors),
        Kind::Number(rule) => check_number(rule, value, path, errors),
        Kind::Bool => {
            if !value.is_boolean() {
                errors.push(format!("{} must be a boolean", path));
            }
        }
        Kind::OneOf(allowed) => {
            if !value.as_str().is_some_and(|s| allowed.iter().any(|a| *a == s)) {
                errors.push(format!("{} must be one of: {}", path, allowed.join(", ")));
            }
        }
        Kind::Object(fields) => match value.as_object() {
            Some(object) => check_fields(fields, object, path, errors),
            None => errors.push(format!("{} must be an object", path)),
        },
        Kind::Coordinates => {
            if coordinates_from_value(value).is_none() {
                errors.push(format!("{} must contain a valid lat/lng pair", path));
            }
        }
        Kind::Url => {
            if !value.as_str().is_some_and(is_https_url) {
                errors.push(format!("{} must be an https:// URL", path));
            }
        }
        Kind::UrlList { max_items } => {
            let Some(items) = check_array(value, path, *max_items, errors) else {
                return;
            };
            for (i, item) in items.iter().enumerate() {
                if !item.as_str().is_some_and(is_https_url) {
                    errors.push(format!("{}[{}] must be an https:// URL", path, i));
                }
            }
        }
        Kind::TextList { max_items, max_len } => {
            let Some(items) = check_array(value, path, *max_items, errors) else {
                return;
            };
            for (i, item) in items.iter().enumerate() {
                check_text(item, &format!("{}[{}]", path, i), *max_len, errors);
            }
        }
        Kind::Email => {
            if !value.as_str().is_some_and(is_email) {
                errors.push(format!("{} must be a valid email address", path));
            }
        }
        Kind::Phone => {
            if !value.as_str().is_some_and(is_phone) {
                errors.push(format!("{} must be a valid phone number", path));
            }
        }
    }
}

fn check_text(value: &Value, path: &str, max_len: usize, errors: &mut Vec<String>) {
    let Some(text) = value.as_str() else {
        errors.push(format!("{} must be a string", path));
        return;
    };
    let trimmed = text.trim();
    if trimmed.is_empty() {
        errors.push(format!("{} cannot be empty", path));
    } else if !trimmed.validate_length(None, Some(max_len as u64), None) {
        errors.push(format!("{} must be at most {} characters", path, max_len));
    }
}

fn check_number(rule: &NumberRule, value: &Value, path: &str, errors: &mut Vec<String>) {
    if !value.is_number() {
        errors.push(format!("{} must be a number", path));
        return;
    }
    let Some(number) = value.as_i64() else {
        errors.push(format!("{} must be an integer", path));
        return;
    };

    if rule.positive && !number.validate_range(None, None, Some(0), None) {
        errors.push(format!("{} must be a positive number", path));
    }
    if let Some(min) = rule.min {
        if !number.validate_range(Some(min), None, None, None) {
            errors.push(format!("{} must be at least {}", path, group_thousands(min)));
        }
    }
    if let Some(max) = rule.max {
        if !number.validate_range(None, Some(max), None, None) {
            let ceiling = group_thousands(max);
            if rule.unit.is_empty() {
                errors.push(format!("{} cannot exceed {}", path, ceiling));
            } else {
                errors.push(format!("{} cannot exceed {} {}", path, ceiling, rule.unit));
            }
        }
    }
}

fn check_array<'a>(
    value: &'a Value,
    path: &str,
    max_items: usize,
    errors: &mut Vec<String>,
) -> Option<&'a Vec<Value>> {
    let Some(items) = value.as_array() else {
        errors.push(format!("{} must be an array", path));
        return None;
    };
    if !items.validate_length(None, Some(max_items as u64), None) {
        errors.push(format!("{} must contain at most {} items", path, max_items));
    }
    Some(items)
}

/// A well-formed absolute URL served over https
pub fn is_https_url(s: &str) -> bool {
    s.starts_with("https://") && s.validate_url()
}

fn is_email(s: &str) -> bool {
    s.validate_email()
}

/// Korean phone numbers: digits with optional hyphens, 9 to 11 digits
fn is_phone(s: &str) -> bool {
    static PHONE: OnceLock<Option<Regex>> = OnceLock::new();
    let digits = s.chars().filter(|c| c.is_ascii_digit()).count();
    (9..=11).contains(&digits)
        && PHONE
            .get_or_init(|| Regex::new(r"^0\d{1,2}-?\d{3,4}-?\d{4}$").ok())
            .as_ref()
            .is_some_and(|re| re.is_match(s))
}

/// 10000000 -> "10,000,000"
fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        grouped.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}
