//! File I/O stages around the session controller.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ [session: upload ▸ convert] ──▶ download
//! (path)        (HTTP, see backend)         (to disk)
//! ```
//!
//! 1. [`input`]    — read a local file and sniff its MIME type so it can be
//!    validated like a browser `File`
//! 2. [`download`] — stream each converted output to disk with an atomic
//!    temp-file + rename

pub mod download;
pub mod input;
