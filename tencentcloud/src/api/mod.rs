//! Tencent Cloud API v3 client and typed product APIs

pub mod autoscaling;
pub mod client;
pub mod common;
pub mod cvm;
pub mod error;
pub mod mysql;
pub mod pool;
pub mod sign;
pub mod sqlserver;

pub use client::{Client, RetryConfig};
pub use common::Service;
pub use error::ApiError;
pub use sign::Credentials;
