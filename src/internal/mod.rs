//! Internal numerical helpers.

pub mod optimize;
