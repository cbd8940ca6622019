#![forbid(unsafe_code)]

//! Collects per-video statistics for one channel and writes them to a latest
//! snapshot plus a dated archive copy.

pub mod api;
pub mod collector;
pub mod config;
pub mod formatter;
pub mod lister;
pub mod models;
pub mod persist;
pub mod reconcile;
pub mod retry;
pub mod stats;
pub mod youtube;
