//! I/O abstraction layer for reading objects from storage

pub mod object_reader;
pub mod s3_reader;

pub use object_reader::ObjectReader;
pub use s3_reader::S3ObjectReader;
