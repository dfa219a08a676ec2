use chrono::{DateTime, Utc};
use serde::Serialize;

use super::error::DomainError;

const PREVIEW_CHARS: usize = 15;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct AuthorRef {
    pub(crate) id: i64,
    pub(crate) username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct GroupRef {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct Post {
    pub(crate) id: i64,
    pub(crate) text: String,
    pub(crate) pub_date: DateTime<Utc>,
    pub(crate) author: AuthorRef,
    pub(crate) group: Option<GroupRef>,
}

/// Validated text/group pair submitted through the create and edit forms.
#[derive(Debug, Clone)]
pub(crate) struct PostInput {
    pub(crate) text: String,
    pub(crate) group_id: Option<i64>,
}

impl PostInput {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        if let Some(group_id) = self.group_id {
            validate_positive_i64("group", group_id)?;
        }
        Ok(Self {
            text: normalize_text(&self.text)?,
            group_id: self.group_id,
        })
    }
}

impl Post {
    pub(crate) fn new(
        id: i64,
        text: impl Into<String>,
        pub_date: DateTime<Utc>,
        author: AuthorRef,
        group: Option<GroupRef>,
    ) -> Result<Self, DomainError> {
        validate_positive_i64("id", id)?;
        validate_positive_i64("author_id", author.id)?;
        if let Some(group) = &group {
            validate_positive_i64("group_id", group.id)?;
        }

        Ok(Self {
            id,
            text: normalize_text(&text.into())?,
            pub_date,
            author,
            group,
        })
    }

    /// First characters of the text, used wherever a post needs a short label.
    pub(crate) fn preview(&self) -> String {
        self.text.chars().take(PREVIEW_CHARS).collect()
    }

    pub(crate) fn is_authored_by(&self, user_id: i64) -> bool {
        self.author.id == user_id
    }

    pub(crate) fn group_id(&self) -> Option<i64> {
        self.group.as_ref().map(|group| group.id)
    }
}

fn validate_positive_i64(field: &'static str, value: i64) -> Result<(), DomainError> {
    if value <= 0 {
        return Err(DomainError::Validation {
            field,
            message: "must be > 0",
        });
    }
    Ok(())
}

fn normalize_text(text: &str) -> Result<String, DomainError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(DomainError::Validation {
            field: "text",
            message: "This field is required.",
        });
    }
    Ok(text.to_string())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{AuthorRef, DomainError, GroupRef, Post, PostInput};

    #[test]
    fn post_input_validate_rejects_blank_text() {
        let input = PostInput {
            text: "  \n\t ".to_string(),
            group_id: None,
        };

        let err = input.validate().expect_err("text must be rejected");
        assert_validation_field(err, "text");
    }

    #[test]
    fn post_input_validate_trims_text_and_keeps_group() {
        let input = PostInput {
            text: "  Test post  ".to_string(),
            group_id: Some(3),
        };

        let validated = input.validate().expect("must validate");
        assert_eq!(validated.text, "Test post");
        assert_eq!(validated.group_id, Some(3));
    }

    #[test]
    fn post_input_validate_rejects_non_positive_group() {
        let input = PostInput {
            text: "text".to_string(),
            group_id: Some(0),
        };

        let err = input.validate().expect_err("group must be rejected");
        assert_validation_field(err, "group");
    }

    #[test]
    fn preview_takes_first_fifteen_chars() {
        let post = sample_post("Тестовый пост для проверки");
        assert_eq!(post.preview(), "Тестовый пост д");

        let short = sample_post("short");
        assert_eq!(short.preview(), "short");
    }

    #[test]
    fn post_new_rejects_non_positive_author_id() {
        let author = AuthorRef {
            id: 0,
            username: "nobody".to_string(),
        };
        let err = Post::new(1, "text", Utc::now(), author, None)
            .expect_err("author id must be > 0");
        assert_validation_field(err, "author_id");
    }

    #[test]
    fn authorship_and_group_accessors() {
        let mut post = sample_post("text");
        assert!(post.is_authored_by(10));
        assert!(!post.is_authored_by(11));
        assert_eq!(post.group_id(), None);

        post.group = Some(GroupRef {
            id: 4,
            title: "Group".to_string(),
            slug: "group".to_string(),
        });
        assert_eq!(post.group_id(), Some(4));
    }

    fn sample_post(text: &str) -> Post {
        let author = AuthorRef {
            id: 10,
            username: "NoName".to_string(),
        };
        Post::new(1, text, Utc::now(), author, None).expect("sample post must be valid")
    }

    fn assert_validation_field(err: DomainError, expected_field: &'static str) {
        match err {
            DomainError::Validation { field, .. } => assert_eq!(field, expected_field),
            _ => panic!("expected DomainError::Validation"),
        }
    }
}
