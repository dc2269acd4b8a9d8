//! Display-dialect <-> storage-dialect adapter.
//!
//! Admin forms speak snake_case with lowercase enum values and loosely typed
//! numbers; storage speaks typed, uppercase enums (camelCase once serialized).
//! Every conversion between the two lives here, in both directions.

pub mod gift;
pub mod task;

pub use gift::GiftForm;
pub use task::{LootBoxTaskForm, TaskForm};

use std::num::{IntErrorKind, ParseIntError};

use serde::{Deserialize, Serialize};

use giftshop_common::models::{BackdropVariant, PurchaseStatus, TaskDuration, TaskType};
use giftshop_common::FieldErrors;

/// Enums exposed to forms. The display name is the lowercase storage name.
pub trait DisplayEnum: Sized + Copy + 'static {
    const VARIANTS: &'static [Self];

    fn storage_name(&self) -> &'static str;

    fn display_name(&self) -> String {
        self.storage_name().to_ascii_lowercase()
    }

    fn from_display(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::VARIANTS
            .iter()
            .copied()
            .find(|v| v.storage_name().eq_ignore_ascii_case(s))
    }

    /// Comma-separated display names, for error messages.
    fn expected() -> String {
        Self::VARIANTS
            .iter()
            .map(|v| v.display_name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl DisplayEnum for BackdropVariant {
    const VARIANTS: &'static [Self] = &BackdropVariant::ALL;
    fn storage_name(&self) -> &'static str {
        self.as_str()
    }
}

impl DisplayEnum for PurchaseStatus {
    const VARIANTS: &'static [Self] = &PurchaseStatus::ALL;
    fn storage_name(&self) -> &'static str {
        self.as_str()
    }
}

impl DisplayEnum for TaskType {
    const VARIANTS: &'static [Self] = &TaskType::ALL;
    fn storage_name(&self) -> &'static str {
        self.as_str()
    }
}

impl DisplayEnum for TaskDuration {
    const VARIANTS: &'static [Self] = &TaskDuration::ALL;
    fn storage_name(&self) -> &'static str {
        self.as_str()
    }
}

/// A number as HTML forms and JSON clients send it: a number or a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormNumber {
    Int(i64),
    Float(f64),
    Text(String),
}

/// 2^63, the first float past `i64::MAX`.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

const NOT_WHOLE: &str = "must be a whole number";
const TOO_LARGE: &str = "is too large";

impl FormNumber {
    fn as_i64(&self) -> Result<i64, &'static str> {
        match self {
            FormNumber::Int(n) => Ok(*n),
            FormNumber::Float(f) if !f.is_finite() || f.fract() != 0.0 => Err(NOT_WHOLE),
            FormNumber::Float(f) if *f >= I64_BOUND || *f < -I64_BOUND => Err(TOO_LARGE),
            FormNumber::Float(f) => Ok(*f as i64),
            FormNumber::Text(s) => s.trim().parse().map_err(|e: ParseIntError| match e.kind() {
                IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => TOO_LARGE,
                _ => NOT_WHOLE,
            }),
        }
    }
}

impl From<i64> for FormNumber {
    fn from(n: i64) -> Self {
        FormNumber::Int(n)
    }
}

impl From<i32> for FormNumber {
    fn from(n: i32) -> Self {
        FormNumber::Int(i64::from(n))
    }
}

pub(crate) fn required_text(errs: &mut FieldErrors, field: &str, value: &Option<String>) -> Option<String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Some(v.to_string()),
        _ => {
            errs.add(field, "is required");
            None
        }
    }
}

pub(crate) fn optional_text(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Parses a required integer no smaller than `min`.
pub(crate) fn required_int(
    errs: &mut FieldErrors,
    field: &str,
    value: &Option<FormNumber>,
    min: i64,
) -> Option<i64> {
    let Some(raw) = value else {
        errs.add(field, "is required");
        return None;
    };
    if matches!(raw, FormNumber::Text(s) if s.trim().is_empty()) {
        errs.add(field, "is required");
        return None;
    }
    match raw.as_i64() {
        Ok(n) if n >= min => Some(n),
        Ok(_) => {
            errs.add(field, format!("must be at least {}", min));
            None
        }
        Err(problem) => {
            errs.add(field, problem);
            None
        }
    }
}

/// Like `required_int`, but a missing or blank value is `Ok(None)`.
pub(crate) fn optional_int(
    errs: &mut FieldErrors,
    field: &str,
    value: &Option<FormNumber>,
    min: i64,
) -> Option<Option<i64>> {
    match value {
        None => Some(None),
        Some(FormNumber::Text(s)) if s.trim().is_empty() => Some(None),
        Some(_) => required_int(errs, field, value, min).map(Some),
    }
}

pub(crate) fn fits_i32(errs: &mut FieldErrors, field: &str, n: i64) -> Option<i32> {
    match i32::try_from(n) {
        Ok(v) => Some(v),
        Err(_) => {
            errs.add(field, "is too large");
            None
        }
    }
}

pub(crate) fn required_enum<E: DisplayEnum>(
    errs: &mut FieldErrors,
    field: &str,
    value: &Option<String>,
) -> Option<E> {
    match value.as_deref().map(str::trim) {
        None | Some("") => {
            errs.add(field, "is required");
            None
        }
        Some(v) => match E::from_display(v) {
            Some(e) => Some(e),
            None => {
                errs.add(field, format!("must be one of: {}", E::expected()));
                None
            }
        },
    }
}
