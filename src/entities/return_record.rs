//! Return record entity - Represents one tracked purchase/return/refund cycle.
//!
//! Each record has a store name, price, purchase date, optional return
//! deadline and returned date, and a refund flag. Receipt image bytes are
//! stored out-of-band in the `receipt_images` table so that list queries
//! never pay the transfer cost of the image; `has_receipt` is the scalar flag.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Return record database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "return_records")]
pub struct Model {
    /// Unique identifier, assigned on insert; immutable thereafter
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning user's id; every query is filtered by this
    pub user_id: String,
    /// Store the purchase was made at, trimmed, non-empty, at most 100 chars
    pub store_name: String,
    /// Price in integer cents, positive and at most 99_999_999
    pub price_cents: i64,
    /// Date of purchase; never in the future
    pub purchase_date: Date,
    /// Merchant return deadline, when known
    pub return_by_date: Option<Date>,
    /// Date the item was physically returned, once it has been
    pub returned_date: Option<Date>,
    /// Whether a receipt image row exists (or should exist) for this record
    pub has_receipt: bool,
    /// Whether the monetary refund has been confirmed
    pub refund_received: bool,
    /// When the record was created
    pub created_at: DateTimeUtc,
    /// When the record was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between `ReturnRecord` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One record has at most one stored receipt image
    #[sea_orm(has_one = "super::receipt_image::Entity")]
    ReceiptImage,
}

impl Related<super::receipt_image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReceiptImage.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
