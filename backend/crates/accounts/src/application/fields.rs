//! Field validation helpers
//!
//! Collects every field error of a request before failing, so the client
//! sees all problems at once.

use std::fmt::Display;

use kernel::error::app_error::FieldErrors;

use crate::error::{AccountsError, AccountsResult};

pub const REQUIRED_MESSAGE: &str = "This field is required.";
pub const BLANK_MESSAGE: &str = "This field may not be blank.";

#[derive(Debug, Default)]
pub(crate) struct FieldCollector {
    errors: FieldErrors,
}

impl FieldCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Run `parse` on a present value, recording a missing value or a parse
    /// failure against `field`
    pub fn parse<T, E: Display>(
        &mut self,
        field: &str,
        value: Option<String>,
        parse: impl FnOnce(String) -> Result<T, E>,
    ) -> Option<T> {
        let Some(value) = value else {
            self.add(field, REQUIRED_MESSAGE);
            return None;
        };

        match parse(value) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                self.add(field, e.to_string());
                None
            }
        }
    }

    /// Present and not blank
    pub fn non_blank(&mut self, field: &str, value: Option<String>) -> Option<String> {
        self.parse(field, value, |v| {
            if v.trim().is_empty() {
                Err(BLANK_MESSAGE)
            } else {
                Ok(v)
            }
        })
    }

    pub fn finish(self) -> AccountsResult<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AccountsError::Validation(self.errors))
        }
    }
}
