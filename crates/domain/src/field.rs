use std::str::FromStr;

use hirely_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

/// Supported form field types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Single-line text.
    Text,
    /// Numeric value.
    Number,
    /// Email address.
    Email,
    /// Telephone number.
    Tel,
    /// Multi-line text.
    Textarea,
    /// Choice among configured options.
    Select,
    /// Uploaded document.
    File,
    /// Web link.
    Url,
    /// Calendar date.
    Date,
}

impl FieldType {
    /// Returns a stable storage value for the field type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Email => "email",
            Self::Tel => "tel",
            Self::Textarea => "textarea",
            Self::Select => "select",
            Self::File => "file",
            Self::Url => "url",
            Self::Date => "date",
        }
    }

    /// Returns the input widget a form renderer uses for this type.
    #[must_use]
    pub fn input_kind(&self) -> InputKind {
        match self {
            Self::Textarea => InputKind::TextArea,
            Self::Select => InputKind::Dropdown,
            Self::File => InputKind::FilePicker,
            Self::Text | Self::Number | Self::Email | Self::Tel | Self::Url | Self::Date => {
                InputKind::Input {
                    html_type: self.as_str(),
                }
            }
        }
    }

    /// Returns whether values of this type are plain strings with length rules.
    #[must_use]
    pub fn is_text_like(&self) -> bool {
        matches!(self, Self::Text | Self::Textarea | Self::Select)
    }
}

impl FromStr for FieldType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "text" => Ok(Self::Text),
            "number" => Ok(Self::Number),
            "email" => Ok(Self::Email),
            "tel" => Ok(Self::Tel),
            "textarea" => Ok(Self::Textarea),
            "select" => Ok(Self::Select),
            "file" => Ok(Self::File),
            "url" => Ok(Self::Url),
            "date" => Ok(Self::Date),
            _ => Err(AppError::Validation(format!(
                "unknown field type '{value}'"
            ))),
        }
    }
}

/// Widget used to edit a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "widget", rename_all = "snake_case")]
pub enum InputKind {
    /// Single `<input>` element with the given HTML type.
    Input {
        /// HTML `type` attribute.
        html_type: &'static str,
    },
    /// Multi-line text area.
    TextArea,
    /// Option dropdown.
    Dropdown,
    /// File picker bound to the upload orchestrator.
    FilePicker,
}

/// Wizard step a field is rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldSection {
    /// Identity and contact data.
    Personal,
    /// Experience and qualifications.
    Professional,
    /// Portfolio and profile links.
    Links,
    /// Uploaded documents.
    Documents,
    /// Administrator-defined extras.
    Custom,
}

impl FieldSection {
    /// Returns a stable storage value for the section.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Personal => "personal",
            Self::Professional => "professional",
            Self::Links => "links",
            Self::Documents => "documents",
            Self::Custom => "custom",
        }
    }
}

impl FromStr for FieldSection {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "personal" => Ok(Self::Personal),
            "professional" => Ok(Self::Professional),
            "links" => Ok(Self::Links),
            "documents" => Ok(Self::Documents),
            "custom" => Ok(Self::Custom),
            _ => Err(AppError::Validation(format!(
                "unknown field section '{value}'"
            ))),
        }
    }
}

/// Optional bounds and options attached to a field.
///
/// `min`/`max` are numeric bounds for number fields and character-length
/// bounds for text-like fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationRules {
    /// Lower bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Upper bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Allowed values for select fields.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl ValidationRules {
    fn validate(&self, field_type: FieldType) -> AppResult<()> {
        if let (Some(min), Some(max)) = (self.min, self.max)
            && min > max
        {
            return Err(AppError::Validation(format!(
                "validation rule min ({min}) must not exceed max ({max})"
            )));
        }

        for bound in [self.min, self.max].into_iter().flatten() {
            if !bound.is_finite() {
                return Err(AppError::Validation(
                    "validation rule bounds must be finite numbers".to_owned(),
                ));
            }

            if field_type.is_text_like() && bound < 0.0 {
                return Err(AppError::Validation(
                    "length bounds must not be negative".to_owned(),
                ));
            }
        }

        if !self.options.is_empty() && field_type != FieldType::Select {
            return Err(AppError::Validation(
                "options are only allowed for select fields".to_owned(),
            ));
        }

        Ok(())
    }
}

/// Input payload for creating a field definition.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinitionInput {
    /// Stable key used as the record attribute name.
    pub key: String,
    /// Field type.
    pub field_type: FieldType,
    /// Display label.
    pub label: String,
    /// Optional placeholder text.
    pub placeholder: Option<String>,
    /// Optional help text.
    pub description: Option<String>,
    /// Required marker.
    pub required: bool,
    /// Optional bounds and options.
    pub validation_rules: Option<ValidationRules>,
    /// Wizard step.
    pub section: FieldSection,
    /// Ascending sort key.
    pub display_order: i32,
    /// Whether the field is part of the live form.
    pub active: bool,
}

/// Definition of one dynamic form field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    key: NonEmptyString,
    field_type: FieldType,
    label: NonEmptyString,
    placeholder: Option<String>,
    description: Option<String>,
    required: bool,
    validation_rules: Option<ValidationRules>,
    section: FieldSection,
    display_order: i32,
    active: bool,
}

impl FieldDefinition {
    /// Creates a validated field definition.
    pub fn new(input: FieldDefinitionInput) -> AppResult<Self> {
        let FieldDefinitionInput {
            key,
            field_type,
            label,
            placeholder,
            description,
            required,
            validation_rules,
            section,
            display_order,
            active,
        } = input;

        validate_field_key(key.as_str())?;

        if let Some(rules) = &validation_rules {
            rules.validate(field_type)?;
        }

        Ok(Self {
            key: NonEmptyString::new(key)?,
            field_type,
            label: NonEmptyString::new(label)?,
            placeholder: non_blank(placeholder),
            description: non_blank(description),
            required,
            validation_rules,
            section,
            display_order,
            active,
        })
    }

    /// Returns the stable field key.
    #[must_use]
    pub fn key(&self) -> &str {
        self.key.as_str()
    }

    /// Returns the field type.
    #[must_use]
    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    /// Returns the display label.
    #[must_use]
    pub fn label(&self) -> &str {
        self.label.as_str()
    }

    /// Returns the placeholder text.
    #[must_use]
    pub fn placeholder(&self) -> Option<&str> {
        self.placeholder.as_deref()
    }

    /// Returns the help text.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns whether the field is required.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Returns the configured validation rules.
    #[must_use]
    pub fn validation_rules(&self) -> Option<&ValidationRules> {
        self.validation_rules.as_ref()
    }

    /// Returns the wizard section.
    #[must_use]
    pub fn section(&self) -> FieldSection {
        self.section
    }

    /// Returns the ascending sort key.
    #[must_use]
    pub fn display_order(&self) -> i32 {
        self.display_order
    }

    /// Returns whether the field is part of the live form.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Returns a copy with the active flag replaced.
    #[must_use]
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }
}

/// Sorts fields by display order, then key.
pub fn sort_fields(fields: &mut [FieldDefinition]) {
    fields.sort_by(|left, right| {
        left.display_order()
            .cmp(&right.display_order())
            .then_with(|| left.key().cmp(right.key()))
    });
}

/// Validates the field key grammar: lowercase ASCII letter first, then
/// lowercase letters, digits, or underscores.
pub fn validate_field_key(key: &str) -> AppResult<()> {
    let mut characters = key.chars();
    let Some(first) = characters.next() else {
        return Err(AppError::Validation("field key must not be empty".to_owned()));
    };

    if !first.is_ascii_lowercase()
        || !characters.all(|character| {
            character.is_ascii_lowercase() || character.is_ascii_digit() || character == '_'
        })
    {
        return Err(AppError::Validation(format!(
            "field key '{key}' must start with a lowercase letter and contain only lowercase letters, digits, or underscores"
        )));
    }

    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim().to_owned();
        (!trimmed.is_empty()).then_some(trimmed)
    })
}
