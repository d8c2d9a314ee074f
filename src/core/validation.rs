//! Draft validation engine.
//!
//! Pure, side-effect-free validation of a user-entered draft into a
//! normalized record ready for persistence. Checks run in a fixed order and
//! short-circuit on the first violation, matching single-message-at-a-time
//! user feedback. `today` is an explicit argument so that date rules are
//! deterministic under test; all dates are date-only values, which sidesteps
//! timezone-boundary bugs by construction.

use crate::config::policy::ReturnPolicy;
use chrono::NaiveDate;
use thiserror::Error;

/// Maximum store name length in characters, after trimming.
pub const MAX_STORE_NAME_CHARS: usize = 100;

/// Maximum price in integer cents (999,999.99).
pub const MAX_PRICE_CENTS: i64 = 99_999_999;

/// Date format accepted from the form layer (ISO calendar date).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A draft as typed by the user: raw text fields, optional fields absent or
/// empty when untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordDraft {
    /// Store name as typed
    pub store_name: String,
    /// Price as decimal text (e.g. `"45.50"`)
    pub price: String,
    /// Purchase date as ISO text (`YYYY-MM-DD`)
    pub purchase_date: String,
    /// Return deadline as ISO text, when entered
    pub return_by_date: Option<String>,
    /// Returned date as ISO text, when entered
    pub returned_date: Option<String>,
}

/// A validated, normalized record: trimmed name, price in cents, parsed
/// date-only values. This is the only shape the store layer accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRecord {
    /// Trimmed store name
    pub store_name: String,
    /// Price in integer cents
    pub price_cents: i64,
    /// Parsed purchase date
    pub purchase_date: NaiveDate,
    /// Parsed return deadline, when present
    pub return_by_date: Option<NaiveDate>,
    /// Parsed returned date, when present
    pub returned_date: Option<NaiveDate>,
}

/// Machine-checkable identifier of the first rule a draft violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationKind {
    /// Store name empty after trimming
    EmptyStoreName,
    /// Store name longer than [`MAX_STORE_NAME_CHARS`]
    StoreNameTooLong,
    /// Price text did not parse as a two-decimal amount
    PriceInvalid,
    /// Price parsed but is not positive or exceeds [`MAX_PRICE_CENTS`]
    PriceOutOfRange,
    /// Purchase date missing
    PurchaseDateMissing,
    /// Purchase date text did not parse
    PurchaseDateInvalid,
    /// Purchase date is after today
    PurchaseDateFuture,
    /// Returned date text did not parse
    ReturnedDateInvalid,
    /// Returned date is before the purchase date
    ReturnedBeforePurchase,
    /// Returned date is after today
    ReturnedInFuture,
    /// Policy requires a returned date and none was entered
    ReturnedDateRequired,
    /// Return-by date text did not parse
    ReturnByDateInvalid,
    /// Return-by date is before the purchase date
    ReturnByBeforePurchase,
    /// Policy requires the return deadline to be today or later
    ReturnByBeforeToday,
}

/// The first validation rule a draft violated, with a user-facing message.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationError {
    /// Which rule failed
    pub kind: ValidationKind,
    /// Human-readable, field-naming message
    pub message: String,
}

impl ValidationError {
    fn new(kind: ValidationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates a draft against the date-ordering and field rules, producing a
/// normalized record on success.
///
/// Checks run in a fixed order and stop at the first violation: schema-level
/// checks (store name, price, date parsing) first, then the cross-field
/// temporal rules, then the policy-gated rules.
///
/// # Arguments
/// * `draft` - Raw user input
/// * `today` - The client's local calendar date
/// * `policy` - Deployment policy knobs
///
/// # Errors
/// Returns the first [`ValidationError`] encountered.
pub fn validate(
    draft: &RecordDraft,
    today: NaiveDate,
    policy: &ReturnPolicy,
) -> Result<ValidatedRecord, ValidationError> {
    // Schema: store name
    let store_name = draft.store_name.trim();
    if store_name.is_empty() {
        return Err(ValidationError::new(
            ValidationKind::EmptyStoreName,
            "Store name cannot be empty",
        ));
    }
    if store_name.chars().count() > MAX_STORE_NAME_CHARS {
        return Err(ValidationError::new(
            ValidationKind::StoreNameTooLong,
            format!("Store name must be at most {MAX_STORE_NAME_CHARS} characters"),
        ));
    }

    // Schema: price
    let price_cents = parse_price_cents(&draft.price).ok_or_else(|| {
        ValidationError::new(
            ValidationKind::PriceInvalid,
            "Price must be a number like 12.99",
        )
    })?;
    if price_cents <= 0 || price_cents > MAX_PRICE_CENTS {
        return Err(ValidationError::new(
            ValidationKind::PriceOutOfRange,
            "Price must be greater than 0 and at most 999,999.99",
        ));
    }

    // Schema: dates
    let purchase_text = draft.purchase_date.trim();
    if purchase_text.is_empty() {
        return Err(ValidationError::new(
            ValidationKind::PurchaseDateMissing,
            "Purchase date is required",
        ));
    }
    let purchase_date = parse_date(purchase_text).ok_or_else(|| {
        ValidationError::new(
            ValidationKind::PurchaseDateInvalid,
            "Purchase date is not a valid date",
        )
    })?;

    let returned_date = match entered(draft.returned_date.as_deref()) {
        Some(text) => Some(parse_date(text).ok_or_else(|| {
            ValidationError::new(
                ValidationKind::ReturnedDateInvalid,
                "Returned date is not a valid date",
            )
        })?),
        None if policy.require_returned_date => {
            return Err(ValidationError::new(
                ValidationKind::ReturnedDateRequired,
                "Returned date is required",
            ));
        }
        None => None,
    };

    let return_by_date = match entered(draft.return_by_date.as_deref()) {
        Some(text) => Some(parse_date(text).ok_or_else(|| {
            ValidationError::new(
                ValidationKind::ReturnByDateInvalid,
                "Return-by date is not a valid date",
            )
        })?),
        None => None,
    };

    // Temporal: purchase date must not be in the future
    if purchase_date > today {
        return Err(ValidationError::new(
            ValidationKind::PurchaseDateFuture,
            "Purchase date cannot be in the future",
        ));
    }

    // Temporal: returned date within [purchase_date, today]
    if let Some(returned) = returned_date {
        if returned < purchase_date {
            return Err(ValidationError::new(
                ValidationKind::ReturnedBeforePurchase,
                "Returned date cannot be before the purchase date",
            ));
        }
        if returned > today {
            return Err(ValidationError::new(
                ValidationKind::ReturnedInFuture,
                "Returned date cannot be in the future",
            ));
        }
    }

    // Temporal: return deadline at or after purchase, and per policy at or
    // after today
    if let Some(return_by) = return_by_date {
        if return_by < purchase_date {
            return Err(ValidationError::new(
                ValidationKind::ReturnByBeforePurchase,
                "Return-by date cannot be before the purchase date",
            ));
        }
        if policy.return_by_must_be_future && return_by < today {
            return Err(ValidationError::new(
                ValidationKind::ReturnByBeforeToday,
                "Return-by date has already passed",
            ));
        }
    }

    Ok(ValidatedRecord {
        store_name: store_name.to_string(),
        price_cents,
        purchase_date,
        return_by_date,
        returned_date,
    })
}

/// Treats whitespace-only optional fields the same as absent ones.
fn entered(field: Option<&str>) -> Option<&str> {
    field.map(str::trim).filter(|t| !t.is_empty())
}

/// Parses an ISO calendar date (`YYYY-MM-DD`).
fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, DATE_FORMAT).ok()
}

/// Parses decimal price text into integer cents.
///
/// Accepts at most two fraction digits and plain ASCII digits only; returns
/// `None` for anything else. String arithmetic, never a float round-trip, so
/// `"999999.99"` lands on exactly `99_999_999`.
#[must_use]
pub fn parse_price_cents(text: &str) -> Option<i64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let (int_part, frac_part) = match trimmed.split_once('.') {
        Some((i, f)) => (i, f),
        None => (trimmed, ""),
    };

    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.chars().all(|c| c.is_ascii_digit())
        || !frac_part.chars().all(|c| c.is_ascii_digit())
        || frac_part.len() > 2
    {
        return None;
    }

    let whole: i64 = if int_part.is_empty() {
        0
    } else {
        int_part.parse().ok()?
    };
    let frac: i64 = match frac_part.len() {
        0 => 0,
        1 => frac_part.parse::<i64>().ok()? * 10,
        _ => frac_part.parse().ok()?,
    };

    whole.checked_mul(100)?.checked_add(frac)
}

/// Formats integer cents as a dollar amount like `$45.50`.
#[must_use]
pub fn format_price_cents(cents: i64) -> String {
    format!("${}.{:02}", cents / 100, (cents % 100).abs())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
    }

    fn policy() -> ReturnPolicy {
        ReturnPolicy::default()
    }

    fn draft() -> RecordDraft {
        RecordDraft {
            store_name: "Target".to_string(),
            price: "45.50".to_string(),
            purchase_date: "2025-01-10".to_string(),
            return_by_date: Some("2025-02-10".to_string()),
            returned_date: Some("2025-01-12".to_string()),
        }
    }

    #[test]
    fn test_valid_draft_normalizes() {
        let validated = validate(&draft(), today(), &policy()).unwrap();
        assert_eq!(validated.store_name, "Target");
        assert_eq!(validated.price_cents, 4550);
        assert_eq!(
            validated.purchase_date,
            NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()
        );
        assert_eq!(
            validated.returned_date,
            Some(NaiveDate::from_ymd_opt(2025, 1, 12).unwrap())
        );
    }

    #[test]
    fn test_store_name_trimmed() {
        let mut d = draft();
        d.store_name = "  Target  ".to_string();
        let validated = validate(&d, today(), &policy()).unwrap();
        assert_eq!(validated.store_name, "Target");
    }

    #[test]
    fn test_empty_store_name_rejected() {
        let mut d = draft();
        d.store_name = "   ".to_string();
        let err = validate(&d, today(), &policy()).unwrap_err();
        assert_eq!(err.kind, ValidationKind::EmptyStoreName);
    }

    #[test]
    fn test_store_name_too_long_rejected() {
        let mut d = draft();
        d.store_name = "x".repeat(101);
        let err = validate(&d, today(), &policy()).unwrap_err();
        assert_eq!(err.kind, ValidationKind::StoreNameTooLong);

        d.store_name = "x".repeat(100);
        assert!(validate(&d, today(), &policy()).is_ok());
    }

    #[test]
    fn test_price_parsing() {
        assert_eq!(parse_price_cents("45.50"), Some(4550));
        assert_eq!(parse_price_cents("45.5"), Some(4550));
        assert_eq!(parse_price_cents("45"), Some(4500));
        assert_eq!(parse_price_cents(".99"), Some(99));
        assert_eq!(parse_price_cents("999999.99"), Some(99_999_999));
        assert_eq!(parse_price_cents("45.505"), None);
        assert_eq!(parse_price_cents("-45"), None);
        assert_eq!(parse_price_cents("+45"), None);
        assert_eq!(parse_price_cents("abc"), None);
        assert_eq!(parse_price_cents(""), None);
        assert_eq!(parse_price_cents("."), None);
    }

    #[test]
    fn test_price_out_of_range_rejected() {
        let mut d = draft();
        d.price = "0".to_string();
        let err = validate(&d, today(), &policy()).unwrap_err();
        assert_eq!(err.kind, ValidationKind::PriceOutOfRange);

        d.price = "1000000.00".to_string();
        let err = validate(&d, today(), &policy()).unwrap_err();
        assert_eq!(err.kind, ValidationKind::PriceOutOfRange);

        d.price = "0.01".to_string();
        assert!(validate(&d, today(), &policy()).is_ok());
    }

    #[test]
    fn test_unparseable_price_rejected() {
        let mut d = draft();
        d.price = "forty five".to_string();
        let err = validate(&d, today(), &policy()).unwrap_err();
        assert_eq!(err.kind, ValidationKind::PriceInvalid);
    }

    #[test]
    fn test_purchase_date_future_rejected() {
        let mut d = draft();
        d.purchase_date = "2025-01-16".to_string();
        d.returned_date = None;
        d.return_by_date = None;
        let err = validate(&d, today(), &policy()).unwrap_err();
        assert_eq!(err.kind, ValidationKind::PurchaseDateFuture);
    }

    #[test]
    fn test_purchase_date_today_accepted() {
        let mut d = draft();
        d.purchase_date = "2025-01-15".to_string();
        d.returned_date = Some("2025-01-15".to_string());
        d.return_by_date = None;
        assert!(validate(&d, today(), &policy()).is_ok());
    }

    #[test]
    fn test_purchase_date_missing_rejected() {
        let mut d = draft();
        d.purchase_date = String::new();
        let err = validate(&d, today(), &policy()).unwrap_err();
        assert_eq!(err.kind, ValidationKind::PurchaseDateMissing);
    }

    #[test]
    fn test_returned_equal_purchase_is_valid() {
        let mut d = draft();
        d.returned_date = Some("2025-01-10".to_string());
        assert!(validate(&d, today(), &policy()).is_ok());
    }

    #[test]
    fn test_returned_before_purchase_rejected() {
        let mut d = draft();
        d.returned_date = Some("2025-01-09".to_string());
        let err = validate(&d, today(), &policy()).unwrap_err();
        assert_eq!(err.kind, ValidationKind::ReturnedBeforePurchase);
    }

    #[test]
    fn test_returned_today_valid_tomorrow_rejected() {
        let mut d = draft();
        d.returned_date = Some("2025-01-15".to_string());
        assert!(validate(&d, today(), &policy()).is_ok());

        d.returned_date = Some("2025-01-16".to_string());
        let err = validate(&d, today(), &policy()).unwrap_err();
        assert_eq!(err.kind, ValidationKind::ReturnedInFuture);
    }

    #[test]
    fn test_return_by_before_purchase_rejected() {
        let mut d = draft();
        d.return_by_date = Some("2025-01-09".to_string());
        let err = validate(&d, today(), &policy()).unwrap_err();
        assert_eq!(err.kind, ValidationKind::ReturnByBeforePurchase);
    }

    #[test]
    fn test_return_by_policy_knob() {
        // Deadline already passed: fine by default
        let mut d = draft();
        d.return_by_date = Some("2025-01-12".to_string());
        assert!(validate(&d, today(), &policy()).is_ok());

        // Rejected when the deployment requires future deadlines
        let strict = ReturnPolicy {
            return_by_must_be_future: true,
            ..ReturnPolicy::default()
        };
        let err = validate(&d, today(), &strict).unwrap_err();
        assert_eq!(err.kind, ValidationKind::ReturnByBeforeToday);

        // Today itself still passes under the strict policy
        d.return_by_date = Some("2025-01-15".to_string());
        assert!(validate(&d, today(), &strict).is_ok());
    }

    #[test]
    fn test_required_returned_date_policy_knob() {
        let mut d = draft();
        d.returned_date = None;
        assert!(validate(&d, today(), &policy()).is_ok());

        let strict = ReturnPolicy {
            require_returned_date: true,
            ..ReturnPolicy::default()
        };
        let err = validate(&d, today(), &strict).unwrap_err();
        assert_eq!(err.kind, ValidationKind::ReturnedDateRequired);
    }

    #[test]
    fn test_blank_optional_fields_treated_as_absent() {
        let mut d = draft();
        d.returned_date = Some("  ".to_string());
        d.return_by_date = Some(String::new());
        let validated = validate(&d, today(), &policy()).unwrap();
        assert_eq!(validated.returned_date, None);
        assert_eq!(validated.return_by_date, None);
    }

    #[test]
    fn test_first_violation_wins() {
        // Both the name and the price are bad; the name check runs first
        let d = RecordDraft {
            store_name: String::new(),
            price: "bogus".to_string(),
            purchase_date: "2025-01-10".to_string(),
            return_by_date: None,
            returned_date: None,
        };
        let err = validate(&d, today(), &policy()).unwrap_err();
        assert_eq!(err.kind, ValidationKind::EmptyStoreName);
    }

    #[test]
    fn test_format_price_cents() {
        assert_eq!(format_price_cents(4550), "$45.50");
        assert_eq!(format_price_cents(99_999_999), "$999999.99");
        assert_eq!(format_price_cents(5), "$0.05");
    }
}
