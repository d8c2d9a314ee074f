//! Return lifecycle - transitions and derived reminder signals.
//!
//! A record is `Pending` until its refund is confirmed, then `Completed`;
//! the returned date is an orthogonal sub-flag that gates which actions make
//! sense, not a separate top-level state. The reminder and overdue signals
//! are pure functions of the stored fields and the current date, recomputed
//! on every access and never cached or persisted, so they cannot go stale.

use crate::{
    config::policy::ReturnPolicy,
    core::{
        record,
        session::Session,
        validation::{self, RecordDraft, ValidationError, ValidationKind},
    },
    entities::return_record,
    errors::Result,
};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;
use tracing::info;

/// Days after the physical return before an unconfirmed refund needs a nudge.
pub const REFUND_REMINDER_DAYS: i64 = 3;

/// How close (in days) a return deadline has to be to count as "due soon".
pub const DUE_SOON_DAYS: i64 = 3;

/// Derived top-level state; never stored independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Refund not yet confirmed
    Pending,
    /// Refund confirmed received
    Completed,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// Classification of a record's return deadline relative to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineStatus {
    /// Deadline within the next [`DUE_SOON_DAYS`] days (inclusive)
    DueSoon,
    /// Deadline has passed and no refund was recorded
    Overdue,
}

/// A (title, body) reminder tuple for the notification collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    /// Short notification title
    pub title: String,
    /// Record-naming notification body
    pub body: String,
}

/// Derives the record's status from its refund flag.
#[must_use]
pub fn status(record: &return_record::Model) -> Status {
    if record.refund_received {
        Status::Completed
    } else {
        Status::Pending
    }
}

/// Whether the record was returned at least [`REFUND_REMINDER_DAYS`] days ago
/// with no refund confirmed yet.
#[must_use]
pub fn needs_refund_reminder(record: &return_record::Model, today: NaiveDate) -> bool {
    match record.returned_date {
        Some(returned) => {
            !record.refund_received && (today - returned).num_days() >= REFUND_REMINDER_DAYS
        }
        None => false,
    }
}

/// Classifies the record's return deadline, if it has an actionable one.
///
/// Refunded records have no actionable deadline. Returns `None` when there is
/// no deadline or it is comfortably in the future.
#[must_use]
pub fn deadline_status(
    record: &return_record::Model,
    today: NaiveDate,
) -> Option<DeadlineStatus> {
    if record.refund_received {
        return None;
    }
    let return_by = record.return_by_date?;

    if today > return_by {
        Some(DeadlineStatus::Overdue)
    } else if (return_by - today).num_days() <= DUE_SOON_DAYS {
        Some(DeadlineStatus::DueSoon)
    } else {
        None
    }
}

/// Builds the reminder list for the notification collaborator.
///
/// Pure function of the record set and the current date. A single record can
/// produce both a deadline reminder and a refund reminder.
#[must_use]
pub fn reminders(records: &[return_record::Model], today: NaiveDate) -> Vec<Reminder> {
    let mut out = Vec::new();

    for record in records {
        let price = validation::format_price_cents(record.price_cents);

        match deadline_status(record, today) {
            Some(DeadlineStatus::Overdue) => {
                // deadline_status only fires when return_by_date is present
                if let Some(return_by) = record.return_by_date {
                    out.push(Reminder {
                        title: "Return overdue".to_string(),
                        body: format!(
                            "{} ({price}) was due back by {return_by}",
                            record.store_name
                        ),
                    });
                }
            }
            Some(DeadlineStatus::DueSoon) => {
                if let Some(return_by) = record.return_by_date {
                    out.push(Reminder {
                        title: "Return due soon".to_string(),
                        body: format!(
                            "{} ({price}) must go back by {return_by}",
                            record.store_name
                        ),
                    });
                }
            }
            None => {}
        }

        if needs_refund_reminder(record, today) {
            if let Some(returned) = record.returned_date {
                out.push(Reminder {
                    title: "Check your refund".to_string(),
                    body: format!(
                        "{} ({price}) was returned on {returned} but no refund is recorded",
                        record.store_name
                    ),
                });
            }
        }
    }

    out
}

/// Marks a record as physically returned on `date`.
///
/// `date` must lie within `[purchase_date, today]`; the record stays
/// `Pending` - only the refund flag moves it to `Completed`.
pub async fn mark_returned(
    db: &DatabaseConnection,
    session: &Session,
    record_id: i64,
    date: NaiveDate,
    today: NaiveDate,
) -> Result<return_record::Model> {
    let existing = record::require_record(db, session, record_id).await?;

    if date < existing.purchase_date {
        return Err(ValidationError {
            kind: ValidationKind::ReturnedBeforePurchase,
            message: "Returned date cannot be before the purchase date".to_string(),
        }
        .into());
    }
    if date > today {
        return Err(ValidationError {
            kind: ValidationKind::ReturnedInFuture,
            message: "Returned date cannot be in the future".to_string(),
        }
        .into());
    }

    let updated = record::set_returned_date(db, session, record_id, date).await?;
    info!(record_id, %date, "marked record returned");
    Ok(updated)
}

/// Flips the refund flag and thereby the derived status.
pub async fn toggle_refund(
    db: &DatabaseConnection,
    session: &Session,
    record_id: i64,
) -> Result<return_record::Model> {
    let existing = record::require_record(db, session, record_id).await?;
    record::set_refund_received(db, session, record_id, !existing.refund_received).await
}

/// Forces the refund flag on. Idempotent one-directional convenience next to
/// [`toggle_refund`].
pub async fn mark_complete(
    db: &DatabaseConnection,
    session: &Session,
    record_id: i64,
) -> Result<return_record::Model> {
    record::set_refund_received(db, session, record_id, true).await
}

/// Applies an edit by re-validating the full merged draft.
///
/// The whole draft passes validation or nothing is written - there is no
/// partial apply of the valid subset of fields.
pub async fn edit(
    db: &DatabaseConnection,
    session: &Session,
    record_id: i64,
    draft: &RecordDraft,
    today: NaiveDate,
    policy: &ReturnPolicy,
) -> Result<return_record::Model> {
    let validated = validation::validate(draft, today, policy)?;
    record::update_record(db, session, record_id, &validated).await
}

/// Builds an editable draft from a stored record, for merging form edits.
#[must_use]
pub fn draft_from_record(record: &return_record::Model) -> RecordDraft {
    RecordDraft {
        store_name: record.store_name.clone(),
        price: validation::format_price_cents(record.price_cents)
            .trim_start_matches('$')
            .to_string(),
        purchase_date: record.purchase_date.to_string(),
        return_by_date: record.return_by_date.map(|d| d.to_string()),
        returned_date: record.returned_date.map(|d| d.to_string()),
    }
}
