pub mod error;
pub mod fake;
pub mod models;
pub mod record_store;
pub mod sqlite;

#[allow(unused_imports)]
pub use error::StoreError;
pub use fake::FakeRecordStore;
pub use models::{
    ChangeBatch, ChangeType, InspectionRecord, InspectionStatus, InspectionUpdate, NewInspection,
    RecordChange,
};
pub use record_store::RecordStore;
pub use sqlite::SqliteRecordStore;
