use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;
use uuid::Uuid;

use super::dto::{ContactInfo, UpdateContactRequest};
use crate::error::{AppError, AppResult};

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

const MAX_TITLE_LEN: usize = 200;

pub(crate) fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

fn optional(v: String) -> Option<String> {
    let v = v.trim().to_string();
    (!v.is_empty()).then_some(v)
}

/// Merge a patch into the current contact row, creating one when missing.
pub fn apply_patch(
    current: Option<ContactInfo>,
    patch: UpdateContactRequest,
) -> AppResult<ContactInfo> {
    let mut info = current.unwrap_or_else(|| ContactInfo {
        id: Uuid::new_v4(),
        title: String::new(),
        description: String::new(),
        phone: None,
        email: None,
        line: None,
        updated_at: OffsetDateTime::now_utc(),
    });

    if let Some(title) = patch.title {
        let title = title.trim().to_string();
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(AppError::validation("title", "title is too long"));
        }
        info.title = title;
    }
    if let Some(description) = patch.description {
        info.description = description.trim().to_string();
    }
    if let Some(phone) = patch.phone {
        info.phone = optional(phone);
    }
    if let Some(email) = patch.email {
        let email = optional(email).map(|e| e.to_lowercase());
        if let Some(e) = &email {
            if !is_valid_email(e) {
                return Err(AppError::validation("email", "invalid email"));
            }
        }
        info.email = email;
    }
    if let Some(line) = patch.line {
        info.line = optional(line);
    }
    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_row_when_missing() {
        let info = apply_patch(
            None,
            UpdateContactRequest {
                title: Some(" Support ".into()),
                phone: Some("021234567".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(info.title, "Support");
        assert_eq!(info.phone.as_deref(), Some("021234567"));
        assert_eq!(info.email, None);
    }

    #[test]
    fn keeps_absent_fields_and_clears_blank_ones() {
        let first = apply_patch(
            None,
            UpdateContactRequest {
                title: Some("Support".into()),
                email: Some("Help@Example.com".into()),
                line: Some("@phonedesk".into()),
                ..Default::default()
            },
        )
        .unwrap();
        let id = first.id;
        let second = apply_patch(
            Some(first),
            UpdateContactRequest {
                line: Some("  ".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(second.id, id);
        assert_eq!(second.title, "Support");
        assert_eq!(second.email.as_deref(), Some("help@example.com"));
        assert_eq!(second.line, None);
    }

    #[test]
    fn rejects_bad_email() {
        let err = apply_patch(
            None,
            UpdateContactRequest {
                email: Some("not-an-email".into()),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Validation { field: "email", .. }));
    }
}
