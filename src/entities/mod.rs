//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod receipt_image;
pub mod return_record;
pub mod system_config;

// Re-export specific types to avoid conflicts
pub use receipt_image::{
    Column as ReceiptImageColumn, Entity as ReceiptImage, Model as ReceiptImageModel,
};
pub use return_record::{
    Column as ReturnRecordColumn, Entity as ReturnRecord, Model as ReturnRecordModel,
};
pub use system_config::{
    Column as SystemConfigColumn, Entity as SystemConfig, Model as SystemConfigModel,
};
