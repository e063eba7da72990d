pub mod blob_store;
pub mod error;
pub mod fake;
pub mod s3;
#[cfg(test)]
mod tests;

#[allow(unused_imports)]
pub use blob_store::{BlobInfo, BlobStore};
pub use error::BlobError;
pub use fake::FakeBlobStore;
pub use s3::S3BlobStore;
