//! Business logic: lookup orchestration, export generation, formatting

pub mod export;
pub mod format;
pub mod lookup;
