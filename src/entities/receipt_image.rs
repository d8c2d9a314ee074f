//! Receipt image entity - Compressed receipt photo bytes, one row per record.
//!
//! Kept apart from `return_records` so list queries stay scalar-only; the
//! bytes are fetched lazily by record id when a detail view opens. The row
//! may be missing even when the record says `has_receipt` - the two stores
//! are reconciled eventually, not transactionally.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Receipt image database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "receipt_images")]
pub struct Model {
    /// Id of the record this image belongs to
    #[sea_orm(primary_key, auto_increment = false)]
    pub record_id: i64,
    /// Encoded JPEG bytes produced by the image pipeline
    pub bytes: Vec<u8>,
    /// Pixel width of the encoded image
    pub width: i32,
    /// Pixel height of the encoded image
    pub height: i32,
    /// When the image was stored
    pub created_at: DateTimeUtc,
}

/// Defines relationships between `ReceiptImage` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each image belongs to one return record
    #[sea_orm(
        belongs_to = "super::return_record::Entity",
        from = "Column::RecordId",
        to = "super::return_record::Column::Id"
    )]
    ReturnRecord,
}

impl Related<super::return_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReturnRecord.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
