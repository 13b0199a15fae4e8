pub mod cache;
pub mod iam;
pub mod identity;
