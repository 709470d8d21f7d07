//! Error mapping at the adapter edge

pub mod conversions;

pub use conversions::IntoDomainError;
