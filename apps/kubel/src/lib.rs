//! # kubel
//!
//! Application layer of KuBel: file storage, CLI and HTTP API on top of
//! `kubel-core`.

pub mod api;
pub mod cli;
pub mod storage;
pub mod updater;
