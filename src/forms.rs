//! User-facing forms: submitted values, validation and the errors shown
//! back next to each field.

use std::{borrow::Cow, collections::BTreeMap};

use axum::{
    async_trait,
    body::Body,
    extract::{FromRequest, Multipart},
    http::{header::CONTENT_TYPE, Request, StatusCode},
    Form,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    db::{self, GroupId},
    error::{AppError, AppResult},
    media::{ImageKind, ImageUpload},
};

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_CHOICE: &str =
    "Select a valid choice. That choice is not one of the available choices.";
pub const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";
pub const IMAGE_TOO_LARGE: &str = "The uploaded file is too large.";
pub const INVALID_LOGIN: &str = "Please enter a correct username and password.";
pub const NON_FIELD: &str = "__all__";

/// Error messages keyed by field name; form-wide errors go under `__all__`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }
}

impl From<&ValidationErrors> for FormErrors {
    fn from(errors: &ValidationErrors) -> Self {
        let mut form_errors = FormErrors::default();
        for (field, field_errors) in errors.field_errors() {
            for error in field_errors {
                let message = error
                    .message
                    .as_ref()
                    .map(|message| message.to_string())
                    .unwrap_or_else(|| error.code.to_string());
                form_errors.add(field, message);
            }
        }
        form_errors
    }
}

/// A form as rendered: the submitted values and what was wrong with them.
#[derive(Debug, Default, Serialize)]
pub struct BoundForm<T> {
    pub data: T,
    pub errors: FormErrors,
}

impl<T> BoundForm<T> {
    pub fn unbound(data: T) -> Self {
        Self {
            data,
            errors: FormErrors::default(),
        }
    }

    pub fn with_errors(data: T, errors: FormErrors) -> Self {
        Self { data, errors }
    }
}

fn validate_required_text(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("required");
        error.message = Some(Cow::Borrowed(REQUIRED));
        return Err(error);
    }
    Ok(())
}

fn validate_username(value: &str) -> Result<(), ValidationError> {
    validate_required_text(value)?;

    let allowed = |c: char| c.is_alphanumeric() || matches!(c, '_' | '.' | '@' | '+' | '-');
    if !value.chars().all(allowed) {
        let mut error = ValidationError::new("invalid");
        error.message = Some(Cow::Borrowed(
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        ));
        return Err(error);
    }
    Ok(())
}

// ================================================= POSTS ================================================= //

#[derive(Debug, Default, Clone, Deserialize, Serialize, Validate)]
pub struct PostForm {
    #[serde(default)]
    #[validate(custom = "validate_required_text")]
    pub text: String,
    #[serde(default)]
    pub group: Option<String>,
}

#[derive(Debug)]
pub struct CleanPost {
    pub text: String,
    pub group_id: Option<GroupId>,
    pub image: Option<(ImageUpload, ImageKind)>,
}

/// A create/edit submission, either url-encoded or multipart with an image.
#[derive(Debug)]
pub struct PostSubmission {
    pub form: PostForm,
    pub image: Option<ImageUpload>,
    /// The body hit the upload limit; fields after that point are missing.
    pub oversized: bool,
}

impl PostSubmission {
    /// Runs every field check; the form comes back for redisplay when any
    /// of them fails.
    pub async fn clean(self, pool: &SqlitePool) -> AppResult<Result<CleanPost, BoundForm<PostForm>>> {
        let PostSubmission {
            form,
            image,
            oversized,
        } = self;

        let mut errors = match form.validate() {
            Ok(()) => FormErrors::default(),
            Err(validation) => FormErrors::from(&validation),
        };

        let group_id = match form.group.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => {
                let group_id = match raw.parse::<GroupId>() {
                    Ok(id) => db::group_exists(pool, id).await?.then_some(id),
                    Err(_) => None,
                };
                if group_id.is_none() {
                    errors.add("group", INVALID_CHOICE);
                }
                group_id
            }
        };

        let image = match image {
            None => None,
            Some(upload) => match ImageKind::detect(&upload.bytes) {
                Some(kind) => Some((upload, kind)),
                None => {
                    errors.add("image", INVALID_IMAGE);
                    None
                }
            },
        };

        if oversized {
            errors.add("image", IMAGE_TOO_LARGE);
        }

        if !errors.is_empty() {
            return Ok(Err(BoundForm::with_errors(form, errors)));
        }

        Ok(Ok(CleanPost {
            text: form.text.trim().to_string(),
            group_id,
            image,
        }))
    }
}

#[async_trait]
impl<S> FromRequest<S, Body> for PostSubmission
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map_or(false, |value| value.starts_with("multipart/form-data"));

        if !is_multipart {
            let Form(form) = Form::<PostForm>::from_request(req, state)
                .await
                .map_err(|_| AppError::BadRequest("malformed form body"))?;
            return Ok(PostSubmission {
                form,
                image: None,
                oversized: false,
            });
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|_| AppError::BadRequest("malformed multipart body"))?;

        let mut submission = PostSubmission {
            form: PostForm::default(),
            image: None,
            oversized: false,
        };

        loop {
            let field = match multipart.next_field().await {
                Ok(Some(field)) => field,
                Ok(None) => break,
                Err(err) if err.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                    submission.oversized = true;
                    break;
                }
                Err(err) => return Err(err.into()),
            };

            let name = field.name().map(str::to_string);
            let file_name = field.file_name().unwrap_or_default().to_string();
            let bytes = match field.bytes().await {
                Ok(bytes) => bytes,
                Err(err) if err.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                    submission.oversized = true;
                    break;
                }
                Err(err) => return Err(err.into()),
            };

            match name.as_deref() {
                Some("text") => submission.form.text = utf8_field(&bytes)?,
                Some("group") => submission.form.group = Some(utf8_field(&bytes)?),
                // browsers send an empty part when no file was picked
                Some("image") if !bytes.is_empty() => {
                    submission.image = Some(ImageUpload { file_name, bytes });
                }
                _ => {}
            }
        }

        if submission.oversized {
            tracing::debug!("post form body exceeded the upload limit");
        }
        Ok(submission)
    }
}

fn utf8_field(bytes: &[u8]) -> AppResult<String> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|_| AppError::BadRequest("form fields must be UTF-8"))
}

// ================================================= COMMENTS ================================================= //

#[derive(Debug, Default, Clone, Deserialize, Serialize, Validate)]
pub struct CommentForm {
    #[serde(default)]
    #[validate(custom = "validate_required_text")]
    pub text: String,
}

// ================================================= ACCOUNTS ================================================= //

#[derive(Debug, Default, Deserialize, Serialize, Validate)]
pub struct SignupForm {
    #[serde(default)]
    #[validate(
        custom = "validate_username",
        length(max = 150, message = "Ensure this value has at most 150 characters.")
    )]
    pub username: String,

    #[serde(default)]
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,

    #[serde(default)]
    pub first_name: String,

    #[serde(default)]
    pub last_name: String,

    #[serde(default, skip_serializing)]
    #[validate(length(
        min = 8,
        max = 64,
        message = "password must be between 8 and 64 characters long"
    ))]
    pub password: String,
}

#[derive(Debug, Default, Deserialize, Serialize, Validate)]
pub struct LoginForm {
    #[serde(default)]
    #[validate(custom = "validate_required_text")]
    pub username: String,

    #[serde(default, skip_serializing)]
    #[validate(length(min = 1, message = "This field is required."))]
    pub password: String,

    #[serde(default)]
    pub next: Option<String>,
}
