use std::fmt;

use serde::Serialize;

use super::error::DomainError;

const TITLE_MAX_CHARS: usize = 200;
const SLUG_MAX_CHARS: usize = 50;
const DESCRIPTION_MAX_CHARS: usize = 500;

/// A community posts can optionally belong to. The slug is the group's URL segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct Group {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) slug: String,
    pub(crate) description: String,
}

impl Group {
    pub(crate) fn new(
        id: i64,
        title: impl Into<String>,
        slug: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, DomainError> {
        if id <= 0 {
            return Err(DomainError::Validation {
                field: "id",
                message: "must be > 0",
            });
        }

        Ok(Self {
            id,
            title: normalize_title(&title.into())?,
            slug: normalize_slug(&slug.into())?,
            description: normalize_description(&description.into())?,
        })
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct NewGroupRequest {
    pub(crate) title: String,
    pub(crate) slug: String,
    pub(crate) description: Option<String>,
}

impl NewGroupRequest {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        let description = self.description.as_deref().unwrap_or_default();
        Ok(Self {
            title: normalize_title(&self.title)?,
            slug: normalize_slug(&self.slug)?,
            description: Some(normalize_description(description)?),
        })
    }
}

fn normalize_title(title: &str) -> Result<String, DomainError> {
    let title = title.trim();
    if title.is_empty() || title.chars().count() > TITLE_MAX_CHARS {
        return Err(DomainError::Validation {
            field: "title",
            message: "must be 1..200 chars",
        });
    }
    Ok(title.to_string())
}

fn normalize_slug(slug: &str) -> Result<String, DomainError> {
    let slug = slug.trim();
    if slug.is_empty() || slug.len() > SLUG_MAX_CHARS {
        return Err(DomainError::Validation {
            field: "slug",
            message: "must be 1..50 chars",
        });
    }
    if !slug
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    {
        return Err(DomainError::Validation {
            field: "slug",
            message: "may contain only latin letters, digits, '-' and '_'",
        });
    }
    Ok(slug.to_string())
}

fn normalize_description(description: &str) -> Result<String, DomainError> {
    let description = description.trim();
    if description.chars().count() > DESCRIPTION_MAX_CHARS {
        return Err(DomainError::Validation {
            field: "description",
            message: "must be at most 500 chars",
        });
    }
    Ok(description.to_string())
}
