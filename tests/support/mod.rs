//! Shared fakes and fixtures for integration tests.
//!
//! - [`socket_guard`]: skip wiremock tests where localhost sockets are unavailable
//! - [`runner`]: scripted stand-in for `pgrep`, `kill`, `calibredb`, `ebook-convert`
//!   and the server launch
//! - [`search`]: in-memory catalog search
//! - [`epub`]: minimal EPUB archives

#![allow(dead_code)]

pub mod epub;
pub mod runner;
pub mod search;
pub mod socket_guard;
