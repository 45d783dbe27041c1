//! Segment editor core for a terminal translation workbench.
//!
//! Targets are stored as plain strings with `[k]`, `[b]` and `[term]` tag
//! notation. The active segment is edited as a list of text runs and atomic
//! tag markers, with an optional suggested translation shown after the cursor.

pub mod clipboard;
pub mod config;
pub mod editor;
pub mod render;
pub mod segment;
pub mod session;
pub mod suggestion;
pub mod tags;
pub mod theme;
