//! Pipeline driver and CLI for the archive downloader.

pub mod cli;
pub mod pipeline;
pub mod ui;
