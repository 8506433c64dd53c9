//! Sort direction shared by every sortable listing.

use serde::Serialize;

use crate::error::CoreError;

/// Direction of an `ORDER BY` term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    /// Parse `asc` / `desc` case-insensitively. Absent means [`SortDirection::Desc`].
    pub fn parse(value: Option<&str>) -> Result<Self, CoreError> {
        match value.map(str::trim) {
            None | Some("") => Ok(Self::default()),
            Some(v) if v.eq_ignore_ascii_case("asc") => Ok(Self::Asc),
            Some(v) if v.eq_ignore_ascii_case("desc") => Ok(Self::Desc),
            Some(v) => Err(CoreError::invalid_choice("sort direction", v, &["ASC", "DESC"])),
        }
    }

    /// SQL keyword for this direction.
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}
