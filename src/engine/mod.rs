//! Core engine: one session is fetch feeds → simulate → execute → report.

pub mod executor;
pub mod report;
pub mod session;
