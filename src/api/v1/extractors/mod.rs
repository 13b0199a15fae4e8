pub mod identity;

pub use identity::MaybeIdentity;
