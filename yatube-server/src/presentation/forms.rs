use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use crate::domain::error::DomainError;
use crate::domain::post::{Post, PostInput};
use crate::domain::user::{LoginRequest, RegisterRequest};

const REQUIRED: &str = "This field is required.";
const INVALID_CHOICE: &str = "Select a valid choice.";

#[derive(Debug, Default, Deserialize, Validate)]
pub(crate) struct PostFormDto {
    #[serde(default)]
    #[validate(length(min = 1, message = "This field is required."))]
    pub(crate) text: String,
    /// Raw `<select>` value: empty means "no group".
    #[serde(default)]
    pub(crate) group: String,
}

impl PostFormDto {
    pub(crate) fn group_id(&self) -> Result<Option<i64>, FormErrors> {
        let raw = self.group.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        raw.parse::<i64>().map(Some).map_err(|_| {
            let mut errors = FormErrors::default();
            errors.add("group", INVALID_CHOICE);
            errors
        })
    }

    /// Form-level checks first, so that every problem is reported in one round trip.
    pub(crate) fn to_input(&self) -> Result<PostInput, FormErrors> {
        let mut errors = match self.validate() {
            Ok(()) => FormErrors::default(),
            Err(err) => FormErrors::from_validation(&err),
        };
        if self.text.trim().is_empty() && errors.text.is_empty() {
            errors.add("text", REQUIRED);
        }
        let group_id = match self.group_id() {
            Ok(group_id) => group_id,
            Err(group_errors) => {
                errors.merge(group_errors);
                None
            }
        };

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(PostInput {
            text: self.text.clone(),
            group_id,
        })
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub(crate) struct LoginDto {
    #[serde(default)]
    #[validate(length(min = 1, message = "This field is required."))]
    pub(crate) username: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "This field is required."))]
    pub(crate) password: String,
    #[serde(default)]
    pub(crate) next: Option<String>,
}

impl LoginDto {
    pub(crate) fn to_request(&self) -> Result<LoginRequest, FormErrors> {
        self.validate()
            .map_err(|err| FormErrors::from_validation(&err))?;
        Ok(LoginRequest {
            username: self.username.clone(),
            password: self.password.clone(),
        })
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub(crate) struct SignupDto {
    #[serde(default)]
    #[validate(length(min = 3, max = 64, message = "Username must be 3 to 64 characters long."))]
    pub(crate) username: String,
    #[serde(default)]
    #[validate(email(message = "Enter a valid email address."))]
    pub(crate) email: String,
    #[serde(default)]
    #[validate(length(min = 8, max = 128, message = "Password must be 8 to 128 characters long."))]
    pub(crate) password: String,
    #[serde(default)]
    #[validate(must_match(other = "password", message = "The two password fields didn't match."))]
    pub(crate) password_confirmation: String,
}

impl SignupDto {
    pub(crate) fn to_request(&self) -> Result<RegisterRequest, FormErrors> {
        self.validate()
            .map_err(|err| FormErrors::from_validation(&err))?;
        Ok(RegisterRequest {
            username: self.username.clone(),
            email: self.email.clone(),
            password: self.password.clone(),
        })
    }
}

/// Error messages per form field. Every list always exists so templates can loop unconditionally.
#[derive(Debug, Default, Clone, Serialize)]
pub(crate) struct FormErrors {
    pub(crate) non_field: Vec<String>,
    pub(crate) text: Vec<String>,
    pub(crate) group: Vec<String>,
    pub(crate) username: Vec<String>,
    pub(crate) email: Vec<String>,
    pub(crate) password: Vec<String>,
}

impl FormErrors {
    pub(crate) fn add(&mut self, field: &str, message: impl Into<String>) {
        let bucket = match field {
            "text" => &mut self.text,
            "group" => &mut self.group,
            "username" => &mut self.username,
            "email" => &mut self.email,
            "password" | "password_confirmation" => &mut self.password,
            _ => &mut self.non_field,
        };
        bucket.push(message.into());
    }

    pub(crate) fn from_validation(errors: &ValidationErrors) -> Self {
        let mut form_errors = Self::default();
        for (field, field_errors) in errors.field_errors() {
            for error in field_errors {
                let message = error
                    .message
                    .as_ref()
                    .map(|message| message.to_string())
                    .unwrap_or_else(|| format!("Invalid value for {field}."));
                form_errors.add(field.as_ref(), message);
            }
        }
        form_errors
    }

    /// Maps a domain rejection onto the form; `None` when it is not a form problem.
    pub(crate) fn from_domain(err: &DomainError) -> Option<Self> {
        let mut form_errors = Self::default();
        match err {
            DomainError::Validation { field, message } => form_errors.add(field, capitalize(message)),
            DomainError::AlreadyExists(what) => {
                let field = if what.contains("email") { "email" } else { "username" };
                form_errors.add(field, format!("A user with that {field} already exists."));
            }
            DomainError::InvalidCredentials => form_errors.add(
                "non_field",
                "Please enter a correct username and password.",
            ),
            _ => return None,
        }
        Some(form_errors)
    }

    pub(crate) fn merge(&mut self, other: FormErrors) {
        self.non_field.extend(other.non_field);
        self.text.extend(other.text);
        self.group.extend(other.group);
        self.username.extend(other.username);
        self.email.extend(other.email);
        self.password.extend(other.password);
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.non_field.is_empty()
            && self.text.is_empty()
            && self.group.is_empty()
            && self.username.is_empty()
            && self.email.is_empty()
            && self.password.is_empty()
    }
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Debug, Default, Serialize)]
pub(crate) struct PostFormView {
    pub(crate) text: String,
    pub(crate) group: Option<i64>,
    pub(crate) errors: FormErrors,
}

impl PostFormView {
    pub(crate) fn from_post(post: &Post) -> Self {
        Self {
            text: post.text.clone(),
            group: post.group_id(),
            errors: FormErrors::default(),
        }
    }

    pub(crate) fn from_dto(dto: &PostFormDto, errors: FormErrors) -> Self {
        Self {
            text: dto.text.clone(),
            group: dto.group_id().ok().flatten(),
            errors,
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub(crate) struct LoginFormView {
    pub(crate) username: String,
    pub(crate) next: String,
    pub(crate) errors: FormErrors,
}

#[derive(Debug, Default, Serialize)]
pub(crate) struct SignupFormView {
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) errors: FormErrors,
}

#[cfg(test)]
mod tests {
    use super::{FormErrors, LoginDto, PostFormDto, SignupDto};
    use crate::domain::error::DomainError;

    fn post_form(text: &str, group: &str) -> PostFormDto {
        PostFormDto {
            text: text.to_string(),
            group: group.to_string(),
        }
    }

    #[test]
    fn empty_group_means_no_group() {
        let input = post_form("hello", "").to_input().expect("valid form");
        assert_eq!(input.text, "hello");
        assert_eq!(input.group_id, None);

        let input = post_form("hello", "4").to_input().expect("valid form");
        assert_eq!(input.group_id, Some(4));
    }

    #[test]
    fn blank_text_and_garbage_group_are_both_reported() {
        let errors = post_form("   ", "cats").to_input().expect_err("invalid form");
        assert_eq!(errors.text, vec!["This field is required.".to_string()]);
        assert_eq!(errors.group, vec!["Select a valid choice.".to_string()]);
    }

    #[test]
    fn missing_text_is_required() {
        let errors = post_form("", "").to_input().expect_err("invalid form");
        assert_eq!(errors.text.len(), 1);
        assert!(errors.group.is_empty());
    }

    #[test]
    fn signup_password_mismatch_lands_on_password() {
        let dto = SignupDto {
            username: "leo".to_string(),
            email: "leo@example.com".to_string(),
            password: "correct-horse".to_string(),
            password_confirmation: "battery-staple".to_string(),
        };
        let errors = dto.to_request().expect_err("mismatch must fail");
        assert_eq!(
            errors.password,
            vec!["The two password fields didn't match.".to_string()]
        );
        assert!(errors.username.is_empty());
    }

    #[test]
    fn login_requires_both_fields() {
        let dto = LoginDto::default();
        let errors = dto.to_request().expect_err("empty login must fail");
        assert_eq!(errors.username.len(), 1);
        assert_eq!(errors.password.len(), 1);
    }

    #[test]
    fn domain_errors_become_field_errors() {
        let errors = FormErrors::from_domain(&DomainError::InvalidCredentials).expect("form error");
        assert_eq!(errors.non_field.len(), 1);

        let errors = FormErrors::from_domain(&DomainError::AlreadyExists("email".to_string()))
            .expect("form error");
        assert_eq!(
            errors.email,
            vec!["A user with that email already exists.".to_string()]
        );

        let errors = FormErrors::from_domain(&DomainError::Validation {
            field: "group",
            message: "Select a valid choice.",
        })
        .expect("form error");
        assert_eq!(errors.group, vec!["Select a valid choice.".to_string()]);

        assert!(FormErrors::from_domain(&DomainError::Forbidden).is_none());
    }
}
