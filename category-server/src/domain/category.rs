use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::DomainError;

const NAME_MAX_CHARS: usize = 255;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Category {
    pub(crate) id: i64,
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

impl Category {
    pub(crate) fn new(
        id: i64,
        name: impl Into<String>,
        description: impl Into<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        validate_positive_id("id", id)?;
        let name = validate_name(name.into())?;

        if updated_at < created_at {
            return Err(DomainError::Validation {
                field: "updated_at",
                message: "must be >= created_at",
            });
        }

        Ok(Self {
            id,
            name,
            description: description.into(),
            created_at,
            updated_at,
        })
    }
}

/// Name/description pair used by both create and update.
///
/// Empty strings are legal for both fields; only the column width of `name` is enforced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct CategoryRequest {
    pub(crate) name: String,
    pub(crate) description: String,
}

impl CategoryRequest {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        Ok(Self {
            name: validate_name(self.name)?,
            description: self.description,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct BookCategoryLink {
    pub(crate) book_id: i64,
    pub(crate) category_id: i64,
}

impl BookCategoryLink {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        validate_positive_id("book_id", self.book_id)?;
        validate_positive_id("category_id", self.category_id)?;
        Ok(self)
    }
}

pub(crate) fn validate_positive_id(field: &'static str, value: i64) -> Result<i64, DomainError> {
    if value <= 0 {
        return Err(DomainError::Validation {
            field,
            message: "must be > 0",
        });
    }
    Ok(value)
}

/// Parses an identifier coming from a path segment.
pub(crate) fn parse_id(field: &'static str, raw: &str) -> Result<i64, DomainError> {
    let value = raw.trim().parse::<i64>().map_err(|_| DomainError::Validation {
        field,
        message: "must be a positive integer",
    })?;
    validate_positive_id(field, value)
}

fn validate_name(name: String) -> Result<String, DomainError> {
    if name.chars().count() > NAME_MAX_CHARS {
        return Err(DomainError::Validation {
            field: "name",
            message: "must be at most 255 chars",
        });
    }
    Ok(name)
}
