pub mod error;
pub mod export;
pub mod observations;
pub mod predict;
