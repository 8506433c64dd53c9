//! Per-user settings and the allow-list of updatable fields.
//!
//! Settings are patched with a JSON object of `field -> value`. Field names
//! are matched against [`SettingField`] before anything else happens; the
//! column names written into SQL come only from [`SettingField::column`].

use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::pagination::MAX_PAGE_SIZE;
use crate::sorting::SortDirection;
use crate::watchlist::TitleSortKey;

/// Maximum length of a timezone name (IANA names are far shorter).
const MAX_TIMEZONE_LENGTH: usize = 64;

/// Fields of `user_settings` a client may change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingField {
    DefaultPageSize,
    Currency,
    DefaultTitleSort,
    DefaultSortDirection,
    Timezone,
}

impl SettingField {
    pub const ALL: &'static [&'static str] = &[
        "default_page_size",
        "currency",
        "default_title_sort",
        "default_sort_direction",
        "timezone",
    ];

    pub fn parse(name: &str) -> Result<Self, CoreError> {
        match name {
            "default_page_size" => Ok(Self::DefaultPageSize),
            "currency" => Ok(Self::Currency),
            "default_title_sort" => Ok(Self::DefaultTitleSort),
            "default_sort_direction" => Ok(Self::DefaultSortDirection),
            "timezone" => Ok(Self::Timezone),
            _ => Err(CoreError::invalid_choice("setting", name, Self::ALL)),
        }
    }

    /// Column in `user_settings` backing this field.
    pub fn column(self) -> &'static str {
        match self {
            Self::DefaultPageSize => "default_page_size",
            Self::Currency => "currency",
            Self::DefaultTitleSort => "default_title_sort",
            Self::DefaultSortDirection => "default_sort_direction",
            Self::Timezone => "timezone",
        }
    }
}

/// A validated value for a setting column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
    Int(i32),
    Text(String),
}

/// One validated `field = value` assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingUpdate {
    pub field: SettingField,
    pub value: SettingValue,
}

/// Validate a settings patch object into an ordered list of assignments.
///
/// Fails on the first unknown field or invalid value. An empty object is
/// rejected so callers never issue an `UPDATE` with no assignments.
pub fn parse_settings_patch(patch: &Map<String, Value>) -> Result<Vec<SettingUpdate>, CoreError> {
    if patch.is_empty() {
        return Err(CoreError::Validation("no settings to update".into()));
    }

    let mut updates = Vec::with_capacity(patch.len());
    for (name, raw) in patch {
        let field = SettingField::parse(name)?;
        let value = validate_value(field, raw)?;
        updates.push(SettingUpdate { field, value });
    }
    Ok(updates)
}

fn validate_value(field: SettingField, raw: &Value) -> Result<SettingValue, CoreError> {
    let expect_text = || {
        raw.as_str()
            .map(str::trim)
            .ok_or_else(|| CoreError::Validation(format!("{} must be a string", field.column())))
    };

    match field {
        SettingField::DefaultPageSize => {
            let n = raw
                .as_i64()
                .filter(|n| (1..=MAX_PAGE_SIZE).contains(n))
                .ok_or_else(|| {
                    CoreError::Validation(format!(
                        "default_page_size must be an integer between 1 and {MAX_PAGE_SIZE}"
                    ))
                })?;
            // Bounded by MAX_PAGE_SIZE above, so the narrowing is lossless.
            Ok(SettingValue::Int(n as i32))
        }
        SettingField::Currency => {
            let code = expect_text()?;
            if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(CoreError::Validation(format!(
                    "currency must be a 3-letter ISO code, got '{code}'"
                )));
            }
            Ok(SettingValue::Text(code.to_ascii_uppercase()))
        }
        SettingField::DefaultTitleSort => {
            let key = expect_text()?;
            TitleSortKey::parse(Some(key))?;
            Ok(SettingValue::Text(key.to_ascii_lowercase()))
        }
        SettingField::DefaultSortDirection => {
            let dir = SortDirection::parse(Some(expect_text()?))?;
            Ok(SettingValue::Text(dir.as_sql().to_string()))
        }
        SettingField::Timezone => {
            let tz = expect_text()?;
            if tz.is_empty() || tz.len() > MAX_TIMEZONE_LENGTH {
                return Err(CoreError::Validation(format!(
                    "timezone must be 1 to {MAX_TIMEZONE_LENGTH} characters"
                )));
            }
            Ok(SettingValue::Text(tz.to_string()))
        }
    }
}
