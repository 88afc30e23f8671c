use std::sync::LazyLock;

use hirely_domain::{FieldDefinition, FieldType};
use regex::Regex;
use serde_json::{Number, Value};
use url::Url;

const TEL_MIN_LENGTH: usize = 10;

static EMAIL_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$").ok()
});

/// Failing rule identifier and message.
pub(super) type RuleFailure = (&'static str, String);

/// Per-type value rule derived from a field definition.
#[derive(Debug, Clone, PartialEq)]
pub(super) enum FieldRule {
    Email,
    Url,
    Number {
        min: Option<f64>,
        max: Option<f64>,
    },
    Tel,
    Date,
    File,
    Text {
        min_length: Option<usize>,
        max_length: Option<usize>,
        options: Vec<String>,
    },
}

impl FieldRule {
    pub(super) fn for_field(field: &FieldDefinition) -> Self {
        let rules = field.validation_rules();
        let min = rules.and_then(|rules| rules.min);
        let max = rules.and_then(|rules| rules.max);

        match field.field_type() {
            FieldType::Email => Self::Email,
            FieldType::Url => Self::Url,
            FieldType::Number => Self::Number { min, max },
            FieldType::Tel => Self::Tel,
            FieldType::Date => Self::Date,
            FieldType::File => Self::File,
            FieldType::Text | FieldType::Textarea | FieldType::Select => Self::Text {
                min_length: min.map(|value| value.ceil() as usize),
                max_length: max.map(|value| value.floor() as usize),
                options: rules.map(|rules| rules.options.clone()).unwrap_or_default(),
            },
        }
    }

    /// Checks one value. `value` is `None` when absent or null.
    pub(super) fn check(
        &self,
        required: bool,
        value: Option<&Value>,
    ) -> Result<Option<Value>, RuleFailure> {
        match self {
            Self::File => Ok(value.cloned()),
            Self::Number { min, max } => check_number(required, value, *min, *max),
            Self::Email => check_string(required, value, |text| {
                let matches = EMAIL_PATTERN
                    .as_ref()
                    .is_some_and(|pattern| pattern.is_match(text));
                if matches {
                    Ok(())
                } else {
                    Err(("format", "must be a valid email address".to_owned()))
                }
            }),
            Self::Url => check_string(required, value, |text| match Url::parse(text) {
                Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => Ok(()),
                _ => Err(("format", "must be a valid URL".to_owned())),
            }),
            Self::Tel => check_string(required, value, |text| {
                if text.chars().count() < TEL_MIN_LENGTH {
                    Err((
                        "min_length",
                        format!("must contain at least {TEL_MIN_LENGTH} characters"),
                    ))
                } else {
                    Ok(())
                }
            }),
            Self::Date => check_string(required, value, |_| Ok(())),
            Self::Text {
                min_length,
                max_length,
                options,
            } => check_string(required, value, |text| {
                let length = text.chars().count();
                if let Some(min_length) = min_length
                    && length < *min_length
                {
                    return Err((
                        "min_length",
                        format!("must contain at least {min_length} characters"),
                    ));
                }

                if let Some(max_length) = max_length
                    && length > *max_length
                {
                    return Err((
                        "max_length",
                        format!("must contain at most {max_length} characters"),
                    ));
                }

                if !options.is_empty() && !options.iter().any(|option| option == text) {
                    return Err((
                        "options",
                        format!("must be one of: {}", options.join(", ")),
                    ));
                }

                Ok(())
            }),
        }
    }
}

/// Trims string values; empty optional strings pass without running `check`.
fn check_string(
    required: bool,
    value: Option<&Value>,
    check: impl Fn(&str) -> Result<(), RuleFailure>,
) -> Result<Option<Value>, RuleFailure> {
    let Some(value) = value else {
        return if required {
            Err(("required", "field is required".to_owned()))
        } else {
            Ok(None)
        };
    };

    let Some(text) = value.as_str() else {
        return Err(("type", "must be a string".to_owned()));
    };

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return if required {
            Err(("required", "field is required".to_owned()))
        } else {
            Ok(Some(Value::String(String::new())))
        };
    }

    check(trimmed)?;
    Ok(Some(Value::String(trimmed.to_owned())))
}

fn check_number(
    required: bool,
    value: Option<&Value>,
    min: Option<f64>,
    max: Option<f64>,
) -> Result<Option<Value>, RuleFailure> {
    let number = match value {
        None => None,
        Some(Value::Number(number)) => Some(number.clone()),
        Some(Value::String(text)) if text.trim().is_empty() => None,
        Some(Value::String(text)) => Some(parse_number(text.trim())?),
        Some(_) => return Err(("type", "must be a number".to_owned())),
    };

    let Some(number) = number else {
        return if required {
            Err(("required", "field is required".to_owned()))
        } else {
            Ok(None)
        };
    };

    let numeric = number.as_f64().unwrap_or(f64::NAN);
    if let Some(min) = min
        && numeric < min
    {
        return Err(("min", format!("must be at least {min}")));
    }

    if let Some(max) = max
        && numeric > max
    {
        return Err(("max", format!("must be at most {max}")));
    }

    Ok(Some(Value::Number(number)))
}

fn parse_number(text: &str) -> Result<Number, RuleFailure> {
    if let Ok(integer) = text.parse::<i64>() {
        return Ok(Number::from(integer));
    }

    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .ok_or_else(|| ("type", "must be a number".to_owned()))
}
