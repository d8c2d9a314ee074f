//! Record store - CRUD over return records and their receipt images.
//!
//! All operations take the owning [`Session`] explicitly and filter by its
//! user id. Record scalars and receipt image bytes live in separate tables:
//! list queries fetch scalars only, and image bytes are fetched lazily by id
//! when a detail view opens. The per-user record ceiling is enforced twice -
//! [`ensure_capacity`] is the advisory client-side pre-check, while the count
//! guard inside [`create_record`]'s transaction is authoritative.

use crate::{
    config::policy::ReturnPolicy,
    core::{image::EncodedImage, session::Session, validation::ValidatedRecord},
    entities::{ReceiptImage, ReturnRecord, receipt_image, return_record},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::info;

/// Retrieves all of the user's records, newest purchase first.
///
/// Scalar columns only - receipt image bytes are never part of a list fetch.
pub async fn list_records(
    db: &DatabaseConnection,
    session: &Session,
) -> Result<Vec<return_record::Model>> {
    ReturnRecord::find()
        .filter(return_record::Column::UserId.eq(&session.user_id))
        .order_by_desc(return_record::Column::PurchaseDate)
        .order_by_desc(return_record::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Counts the user's records.
pub async fn count_records(db: &DatabaseConnection, session: &Session) -> Result<u64> {
    ReturnRecord::find()
        .filter(return_record::Column::UserId.eq(&session.user_id))
        .count(db)
        .await
        .map_err(Into::into)
}

/// Advisory pre-create capacity check.
///
/// Rejects with [`Error::LimitExceeded`] when the user already owns the
/// maximum number of records. Saves a wasted round trip and gives immediate
/// feedback; the in-transaction guard in [`create_record`] remains the
/// authoritative enforcement.
pub async fn ensure_capacity(
    db: &DatabaseConnection,
    session: &Session,
    policy: &ReturnPolicy,
) -> Result<()> {
    let count = count_records(db, session).await?;
    if count >= policy.max_records {
        return Err(Error::LimitExceeded {
            count,
            max: policy.max_records,
        });
    }
    Ok(())
}

/// Creates a new record from a validated draft.
///
/// Runs inside a database transaction: the record count is re-checked under
/// the transaction so the ceiling cannot be raced past, then the row is
/// inserted with store-owned timestamps.
pub async fn create_record(
    db: &DatabaseConnection,
    session: &Session,
    validated: &ValidatedRecord,
    policy: &ReturnPolicy,
) -> Result<return_record::Model> {
    let txn = db.begin().await?;

    let count = ReturnRecord::find()
        .filter(return_record::Column::UserId.eq(&session.user_id))
        .count(&txn)
        .await?;
    if count >= policy.max_records {
        return Err(Error::LimitExceeded {
            count,
            max: policy.max_records,
        });
    }

    let now = chrono::Utc::now();
    let record = return_record::ActiveModel {
        user_id: Set(session.user_id.clone()),
        store_name: Set(validated.store_name.clone()),
        price_cents: Set(validated.price_cents),
        purchase_date: Set(validated.purchase_date),
        return_by_date: Set(validated.return_by_date),
        returned_date: Set(validated.returned_date),
        has_receipt: Set(false),
        refund_received: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let result = record.insert(&txn).await?;
    txn.commit().await?;

    info!(record_id = result.id, store = %result.store_name, "created return record");
    Ok(result)
}

/// Finds one of the user's records by id, returning `None` if it does not
/// exist or belongs to someone else.
pub async fn get_record(
    db: &DatabaseConnection,
    session: &Session,
    record_id: i64,
) -> Result<Option<return_record::Model>> {
    ReturnRecord::find_by_id(record_id)
        .filter(return_record::Column::UserId.eq(&session.user_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Like [`get_record`] but rejects with [`Error::RecordNotFound`].
pub async fn require_record(
    db: &DatabaseConnection,
    session: &Session,
    record_id: i64,
) -> Result<return_record::Model> {
    get_record(db, session, record_id)
        .await?
        .ok_or(Error::RecordNotFound { id: record_id })
}

/// Replaces a record's user-editable fields with freshly validated ones.
///
/// `id` and `created_at` are immutable; `updated_at` is stamped here.
pub async fn update_record(
    db: &DatabaseConnection,
    session: &Session,
    record_id: i64,
    validated: &ValidatedRecord,
) -> Result<return_record::Model> {
    let record = require_record(db, session, record_id).await?;

    let mut active: return_record::ActiveModel = record.into();
    active.store_name = Set(validated.store_name.clone());
    active.price_cents = Set(validated.price_cents);
    active.purchase_date = Set(validated.purchase_date);
    active.return_by_date = Set(validated.return_by_date);
    active.returned_date = Set(validated.returned_date);
    active.updated_at = Set(chrono::Utc::now());

    active.update(db).await.map_err(Into::into)
}

/// Sets the refund flag to an explicit value.
pub async fn set_refund_received(
    db: &DatabaseConnection,
    session: &Session,
    record_id: i64,
    refund_received: bool,
) -> Result<return_record::Model> {
    let record = require_record(db, session, record_id).await?;

    let mut active: return_record::ActiveModel = record.into();
    active.refund_received = Set(refund_received);
    active.updated_at = Set(chrono::Utc::now());

    active.update(db).await.map_err(Into::into)
}

/// Sets the returned date on a record.
pub async fn set_returned_date(
    db: &DatabaseConnection,
    session: &Session,
    record_id: i64,
    returned_date: chrono::NaiveDate,
) -> Result<return_record::Model> {
    let record = require_record(db, session, record_id).await?;

    let mut active: return_record::ActiveModel = record.into();
    active.returned_date = Set(Some(returned_date));
    active.updated_at = Set(chrono::Utc::now());

    active.update(db).await.map_err(Into::into)
}

/// Deletes a record and its receipt image row, if any. Terminal.
pub async fn delete_record(
    db: &DatabaseConnection,
    session: &Session,
    record_id: i64,
) -> Result<()> {
    let record = require_record(db, session, record_id).await?;

    let txn = db.begin().await?;
    ReceiptImage::delete_many()
        .filter(receipt_image::Column::RecordId.eq(record.id))
        .exec(&txn)
        .await?;
    ReturnRecord::delete_by_id(record.id).exec(&txn).await?;
    txn.commit().await?;

    info!(record_id, "deleted return record");
    Ok(())
}

/// Stores the compressed receipt image for a record and marks the record as
/// having a receipt.
///
/// Replaces any previous image. Image bytes live in their own table so this
/// write never touches the scalar row apart from the `has_receipt` flag.
pub async fn set_receipt_image(
    db: &DatabaseConnection,
    session: &Session,
    record_id: i64,
    encoded: &EncodedImage,
) -> Result<()> {
    let record = require_record(db, session, record_id).await?;

    // Pipeline caps width at 1200, so the i32 columns cannot wrap.
    #[allow(clippy::cast_possible_wrap)]
    let (width, height) = (encoded.width as i32, encoded.height as i32);

    let txn = db.begin().await?;

    ReceiptImage::delete_many()
        .filter(receipt_image::Column::RecordId.eq(record.id))
        .exec(&txn)
        .await?;

    let image = receipt_image::ActiveModel {
        record_id: Set(record.id),
        bytes: Set(encoded.bytes.clone()),
        width: Set(width),
        height: Set(height),
        created_at: Set(chrono::Utc::now()),
    };
    image.insert(&txn).await?;

    let mut active: return_record::ActiveModel = record.into();
    active.has_receipt = Set(true);
    active.updated_at = Set(chrono::Utc::now());
    active.update(&txn).await?;

    txn.commit().await?;
    Ok(())
}

/// Fetches the receipt image bytes for one record, lazily, by id.
///
/// Returns `None` when no image row exists - which is legal even when the
/// record reports `has_receipt`, since the two stores reconcile eventually.
pub async fn get_receipt_image(
    db: &DatabaseConnection,
    session: &Session,
    record_id: i64,
) -> Result<Option<receipt_image::Model>> {
    let record = require_record(db, session, record_id).await?;

    ReceiptImage::find_by_id(record.id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Removes a record's receipt image and clears the flag.
pub async fn clear_receipt_image(
    db: &DatabaseConnection,
    session: &Session,
    record_id: i64,
) -> Result<()> {
    let record = require_record(db, session, record_id).await?;

    let txn = db.begin().await?;
    ReceiptImage::delete_many()
        .filter(receipt_image::Column::RecordId.eq(record.id))
        .exec(&txn)
        .await?;

    let mut active: return_record::ActiveModel = record.into();
    active.has_receipt = Set(false);
    active.updated_at = Set(chrono::Utc::now());
    active.update(&txn).await?;

    txn.commit().await?;
    Ok(())
}
