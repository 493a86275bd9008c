//! Profile field validation.

use chrono::{DateTime, NaiveDate};
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

use crate::api::ProfileUpdate;

const NAME_MIN: usize = 2;
const NAME_MAX: usize = 50;
const BIO_MAX: usize = 200;

static NAME_RE: LazyLock<Regex> = LazyLock::new(|| match Regex::new(r"^[a-zA-Z\s]+$") {
  Ok(re) => re,
  Err(_) => unreachable!("static regex pattern"),
});

// Same shape as the HTML living-standard address check: no quoted local
// parts, and a dotless domain such as `localhost` is allowed.
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
  match Regex::new(
    r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
  ) {
    Ok(re) => re,
    Err(_) => unreachable!("static regex pattern"),
  }
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
  #[error("Name is required")]
  NameRequired,
  #[error("Name must be at least 2 characters")]
  NameTooShort,
  #[error("Name must be less than 50 characters")]
  NameTooLong,
  #[error("Name can only contain letters and spaces")]
  NameCharacters,
  #[error("Email is required")]
  EmailRequired,
  #[error("Invalid email format")]
  EmailInvalid,
  #[error("Bio must be less than 200 characters")]
  BioTooLong,
  #[error("Birthday must be a valid date")]
  BirthdayInvalid,
  #[error("Birthday cannot be in the future")]
  BirthdayInFuture,
}

/// Check every field present in `update`.
pub fn validate_update(update: &ProfileUpdate, today: NaiveDate) -> Result<(), ValidationError> {
  if let Some(name) = &update.name {
    validate_name(name)?;
  }
  if let Some(email) = &update.email {
    validate_email(email)?;
  }
  if let Some(bio) = &update.bio {
    validate_bio(bio)?;
  }
  if let Some(birthday) = &update.birthday {
    validate_birthday(birthday, today)?;
  }
  Ok(())
}

pub fn validate_name(name: &str) -> Result<(), ValidationError> {
  if name.is_empty() {
    return Err(ValidationError::NameRequired);
  }
  let length = name.chars().count();
  if length < NAME_MIN {
    return Err(ValidationError::NameTooShort);
  }
  if length > NAME_MAX {
    return Err(ValidationError::NameTooLong);
  }
  if !NAME_RE.is_match(name) {
    return Err(ValidationError::NameCharacters);
  }
  Ok(())
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
  if email.is_empty() {
    return Err(ValidationError::EmailRequired);
  }
  if !EMAIL_RE.is_match(email) {
    return Err(ValidationError::EmailInvalid);
  }
  Ok(())
}

pub fn validate_bio(bio: &str) -> Result<(), ValidationError> {
  if bio.chars().count() > BIO_MAX {
    return Err(ValidationError::BioTooLong);
  }
  Ok(())
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 date-time.
pub fn validate_birthday(birthday: &str, today: NaiveDate) -> Result<(), ValidationError> {
  let date = parse_birthday(birthday).ok_or(ValidationError::BirthdayInvalid)?;
  if date > today {
    return Err(ValidationError::BirthdayInFuture);
  }
  Ok(())
}

fn parse_birthday(birthday: &str) -> Option<NaiveDate> {
  if let Ok(date) = NaiveDate::parse_from_str(birthday, "%Y-%m-%d") {
    return Some(date);
  }
  DateTime::parse_from_rfc3339(birthday)
    .ok()
    .map(|dt| dt.date_naive())
}
