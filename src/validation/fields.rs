use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::str::FromStr;

use super::messages;
use super::{json_shape, ValidationErrors, NON_FIELD_ERRORS};

/// Reads typed fields out of a JSON object body, recording every problem it
/// finds instead of returning on the first one.
///
/// In `partial` mode (PATCH) absent fields are skipped silently; otherwise an
/// absent field is reported as required.
pub struct FieldReader<'a> {
    body: &'a Map<String, Value>,
    partial: bool,
    errors: ValidationErrors,
}

impl<'a> FieldReader<'a> {
    pub fn new(body: &'a Value, partial: bool) -> Result<Self, ValidationErrors> {
        match body {
            Value::Object(map) => Ok(Self {
                body: map,
                partial,
                errors: ValidationErrors::new(),
            }),
            other => Err(ValidationErrors::single(
                NON_FIELD_ERRORS,
                messages::not_a_dict(json_shape(other)),
            )),
        }
    }

    /// Present, non-null value for `field`, or `None` after recording why not.
    fn lookup(&mut self, field: &str) -> Option<&'a Value> {
        match self.body.get(field) {
            None => {
                if !self.partial {
                    self.errors.add(field, messages::REQUIRED);
                }
                None
            }
            Some(Value::Null) => {
                self.errors.add(field, messages::NULL);
                None
            }
            Some(value) => Some(value),
        }
    }

    /// Trimmed, non-blank string no longer than `max_length` characters.
    pub fn string(&mut self, field: &str, max_length: usize) -> Option<String> {
        let value = self.lookup(field)?;
        let text = match value {
            Value::String(s) => s.trim().to_string(),
            // Numbers are accepted and stringified
            Value::Number(n) => n.to_string(),
            _ => {
                self.errors.add(field, messages::NOT_A_STRING);
                return None;
            }
        };

        if text.is_empty() {
            self.errors.add(field, messages::BLANK);
            return None;
        }
        if text.chars().count() > max_length {
            self.errors.add(field, messages::max_length(max_length));
            return None;
        }
        Some(text)
    }

    pub fn email(&mut self, field: &str, max_length: usize) -> Option<String> {
        let email = self.string(field, max_length)?;
        if !is_valid_email(&email) {
            self.errors.add(field, messages::INVALID_EMAIL);
            return None;
        }
        Some(email)
    }

    /// String that must be one of `choices`.
    pub fn choice(&mut self, field: &str, choices: &[&str]) -> Option<String> {
        let value = self.lookup(field)?;
        let text = match value {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            other => other.to_string(),
        };
        if choices.contains(&text.as_str()) {
            Some(text)
        } else {
            self.errors.add(field, messages::invalid_choice(&text));
            None
        }
    }

    /// Fixed-precision decimal, rescaled to exactly `decimal_places`.
    pub fn decimal(&mut self, field: &str, max_digits: u32, decimal_places: u32) -> Option<Decimal> {
        let value = self.lookup(field)?;
        let parsed = match value {
            Value::Number(n) => parse_decimal(&n.to_string()),
            Value::String(s) => parse_decimal(s.trim()),
            _ => None,
        };
        let Some(mut decimal) = parsed else {
            self.errors.add(field, messages::INVALID_NUMBER);
            return None;
        };

        let (digits, decimals) = digit_counts(&decimal);
        let whole_digits = digits.saturating_sub(decimals);
        if digits > max_digits {
            self.errors.add(field, messages::max_digits(max_digits));
            return None;
        }
        if decimals > decimal_places {
            self.errors.add(field, messages::max_decimal_places(decimal_places));
            return None;
        }
        if whole_digits > max_digits - decimal_places {
            self.errors
                .add(field, messages::max_whole_digits(max_digits - decimal_places));
            return None;
        }

        decimal.rescale(decimal_places);
        Some(decimal)
    }

    /// Raw present value, for nested shapes validated elsewhere.
    pub fn raw(&mut self, field: &str) -> Option<&'a Value> {
        self.lookup(field)
    }

    pub fn error(&mut self, field: &str, message: impl Into<String>) {
        self.errors.add(field, message);
    }

    pub fn nest(&mut self, field: &str, errors: ValidationErrors) {
        self.errors.nest(field, errors);
    }

    pub fn finish(self) -> ValidationErrors {
        self.errors
    }
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    if text.is_empty() {
        return None;
    }
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

/// (significant digits, digits after the point) of the normalized value.
fn digit_counts(value: &Decimal) -> (u32, u32) {
    let normalized = value.normalize();
    let scale = normalized.scale();
    let mantissa_digits = normalized.mantissa().unsigned_abs().to_string().len() as u32;
    if scale > mantissa_digits {
        // 0.001 -> every digit sits after the point
        (scale, scale)
    } else {
        (mantissa_digits, scale)
    }
}

/// Email check in the spirit of the usual web-framework validators:
/// a dot-atom local part and a domain whose last label is at least two letters.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.rsplit_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() || local.len() > 64 {
        return false;
    }

    const LOCAL_SPECIALS: &str = "!#$%&'*+/=?^_`{|}~-";
    let local_ok = local.split('.').all(|atom| {
        !atom.is_empty()
            && atom
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || LOCAL_SPECIALS.contains(c))
    });
    if !local_ok {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    let labels_ok = labels.iter().all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    });
    if !labels_ok {
        return false;
    }

    match labels.last() {
        Some(tld) if tld.starts_with("xn--") => tld.len() > 4,
        Some(tld) => tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic()),
        None => false,
    }
}
