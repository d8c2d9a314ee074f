//! OCR-assist adapter - best-effort field extraction from a receipt photo.
//!
//! Wraps the external extraction function behind [`ExtractionBackend`] and
//! degrades every failure (transport, timeout, rate limit, malformed
//! response, unparseable field) to "no fields extracted" plus an optional
//! soft warning. Nothing in here can fail a record submission: the adapter
//! is advisory, and submission behaves identically whether or not it ran.

use crate::core::{
    image::EncodedImage,
    validation::{self, RecordDraft},
};
use async_trait::async_trait;
use base64::Engine as _;
use chrono::NaiveDate;
use serde::Deserialize;
use std::{sync::Arc, time::Duration};
use thiserror::Error;
use tracing::warn;

/// Wall-clock bound on one extraction call.
pub const EXTRACTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Date format the extraction function returns (`MM/DD/YYYY`).
pub const OCR_DATE_FORMAT: &str = "%m/%d/%Y";

/// The extraction function's response payload, as it arrives on the wire.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RawExtraction {
    /// Store name, when the function could read one
    pub store_name: Option<String>,
    /// Purchase date as `MM/DD/YYYY` text
    pub purchase_date: Option<String>,
    /// Return deadline as `MM/DD/YYYY` text, explicitly nullable
    pub return_by_date: Option<String>,
    /// Total amount as a decimal number
    pub amount: Option<f64>,
}

impl RawExtraction {
    /// Decodes a backend response body, mapping any shape mismatch to
    /// [`BackendError::Malformed`].
    pub fn from_json(value: serde_json::Value) -> Result<Self, BackendError> {
        serde_json::from_value(value).map_err(|e| BackendError::Malformed {
            reason: e.to_string(),
        })
    }
}

/// Failure modes of the external extraction call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    /// The service rejected the call for rate reasons; try later
    #[error("extraction service is rate limited")]
    RateLimited,
    /// The account's extraction quota is used up
    #[error("extraction quota exhausted")]
    QuotaExhausted,
    /// Network-level failure reaching the service
    #[error("extraction service unreachable: {reason}")]
    Transport {
        /// Transport failure description
        reason: String,
    },
    /// The service answered with something undecodable
    #[error("malformed extraction response: {reason}")]
    Malformed {
        /// Decode failure description
        reason: String,
    },
}

/// Port to the external extraction function: compressed image in (base64),
/// structured fields out, fallible.
#[async_trait]
pub trait ExtractionBackend: Send + Sync {
    /// Runs one extraction call against the service.
    async fn extract_fields(&self, image_base64: &str) -> Result<RawExtraction, BackendError>;
}

/// Parsed best-effort fields; every field optional. Built once per
/// extraction and merged into the draft in a single step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialFields {
    /// Extracted store name
    pub store_name: Option<String>,
    /// Extracted price, already converted to cents
    pub price_cents: Option<i64>,
    /// Extracted purchase date
    pub purchase_date: Option<NaiveDate>,
    /// Extracted return deadline
    pub return_by_date: Option<NaiveDate>,
}

impl PartialFields {
    /// True when no field was extracted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store_name.is_none()
            && self.price_cents.is_none()
            && self.purchase_date.is_none()
            && self.return_by_date.is_none()
    }
}

/// Soft, user-facing warning describing why autofill produced nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionWarning {
    /// The call exceeded [`EXTRACTION_TIMEOUT`]
    Timeout,
    /// Service rate limit hit
    RateLimited,
    /// Extraction quota exhausted
    QuotaExhausted,
    /// Transport failure
    Unavailable,
    /// Response arrived but could not be decoded
    Malformed,
}

impl std::fmt::Display for ExtractionWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Timeout => "receipt scan timed out; fill the fields in manually",
            Self::RateLimited => "receipt scanning is busy right now; fill the fields in manually",
            Self::QuotaExhausted => "receipt scan quota used up; fill the fields in manually",
            Self::Unavailable => "receipt scanning is unavailable; fill the fields in manually",
            Self::Malformed => "receipt scan returned nothing usable; fill the fields in manually",
        };
        write!(f, "{text}")
    }
}

/// Outcome of one assist run: whatever fields survived conversion, plus a
/// warning when the call soft-failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Fields to offer the draft
    pub fields: PartialFields,
    /// Why the fields are empty, when they are
    pub warning: Option<ExtractionWarning>,
}

/// The OCR-assist adapter. Never surfaces an error to the caller.
pub struct OcrAssist {
    backend: Arc<dyn ExtractionBackend>,
    timeout: Duration,
}

impl OcrAssist {
    /// Creates an adapter over the given backend with the default timeout.
    #[must_use]
    pub fn new(backend: Arc<dyn ExtractionBackend>) -> Self {
        Self::with_timeout(backend, EXTRACTION_TIMEOUT)
    }

    /// Creates an adapter with an explicit timeout bound.
    #[must_use]
    pub fn with_timeout(backend: Arc<dyn ExtractionBackend>, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    /// Runs one best-effort extraction over a compressed receipt image.
    ///
    /// Total function: timeouts and every backend failure come back as an
    /// empty [`PartialFields`] with a warning, never as an error. A result
    /// arriving after the timeout is dropped, not merged.
    pub async fn extract(&self, image: &EncodedImage) -> Extraction {
        let payload = base64::engine::general_purpose::STANDARD.encode(&image.bytes);

        match tokio::time::timeout(self.timeout, self.backend.extract_fields(&payload)).await {
            Ok(Ok(raw)) => Extraction {
                fields: convert_fields(raw),
                warning: None,
            },
            Ok(Err(err)) => {
                warn!(%err, "receipt extraction failed");
                Extraction {
                    fields: PartialFields::default(),
                    warning: Some(match err {
                        BackendError::RateLimited => ExtractionWarning::RateLimited,
                        BackendError::QuotaExhausted => ExtractionWarning::QuotaExhausted,
                        BackendError::Transport { .. } => ExtractionWarning::Unavailable,
                        BackendError::Malformed { .. } => ExtractionWarning::Malformed,
                    }),
                }
            }
            Err(_elapsed) => {
                warn!("receipt extraction timed out");
                Extraction {
                    fields: PartialFields::default(),
                    warning: Some(ExtractionWarning::Timeout),
                }
            }
        }
    }
}

/// Converts the wire payload into typed fields, silently dropping anything
/// that fails to parse rather than propagating a parse error.
fn convert_fields(raw: RawExtraction) -> PartialFields {
    let store_name = raw
        .store_name
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let purchase_date = raw
        .purchase_date
        .and_then(|text| parse_ocr_date(&text));

    let return_by_date = raw
        .return_by_date
        .and_then(|text| parse_ocr_date(&text));

    let price_cents = raw.amount.and_then(amount_to_cents);

    PartialFields {
        store_name,
        price_cents,
        purchase_date,
        return_by_date,
    }
}

/// Parses the extraction service's `MM/DD/YYYY` date text.
fn parse_ocr_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), OCR_DATE_FORMAT).ok()
}

/// Converts a decimal amount into cents, dropping non-finite, non-positive,
/// or out-of-range values.
fn amount_to_cents(amount: f64) -> Option<i64> {
    if !amount.is_finite() || amount <= 0.0 {
        return None;
    }
    // Range is checked before the cast, so no truncation surprises.
    #[allow(clippy::cast_possible_truncation)]
    let cents = (amount * 100.0).round() as i64;
    (cents > 0 && cents <= validation::MAX_PRICE_CENTS).then_some(cents)
}

/// Merges extracted fields into a draft, filling only still-empty fields.
///
/// Pure reducer: builds the merged draft in one step, and a field the user
/// already typed into is never overwritten by a lower-confidence guess.
#[must_use]
pub fn apply_extraction(draft: &RecordDraft, fields: &PartialFields) -> RecordDraft {
    let mut merged = draft.clone();

    if merged.store_name.trim().is_empty() {
        if let Some(name) = &fields.store_name {
            merged.store_name = name.clone();
        }
    }
    if merged.price.trim().is_empty() {
        if let Some(cents) = fields.price_cents {
            merged.price = format!("{}.{:02}", cents / 100, cents % 100);
        }
    }
    if merged.purchase_date.trim().is_empty() {
        if let Some(date) = fields.purchase_date {
            merged.purchase_date = date.to_string();
        }
    }
    let return_by_blank = merged
        .return_by_date
        .as_deref()
        .is_none_or(|t| t.trim().is_empty());
    if return_by_blank {
        if let Some(date) = fields.return_by_date {
            merged.return_by_date = Some(date.to_string());
        }
    }

    merged
}
