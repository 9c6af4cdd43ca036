//! Host framework integration surface.
//!
//! This module is the boundary between guard evaluation and the real
//! request/response object of a web framework. It handles:
//! - Describing the host capability guards ultimately act on ([`HostRequest`])
//! - Writing a resolved termination onto the host exactly once
//! - Detecting requests the host aborted before the guard chain ran
//!
//! # Design Principles
//!
//! 1. **No Framework Dependencies**: nothing here names a concrete framework.
//!    Framework-specific code implements [`HostRequest`] for its context type.
//!
//! 2. **One Write Per Evaluation**: combinators resolve everything on branch
//!    copies. The host sees a single terminating call, after resolution.
//!
//! 3. **Explicit Context**: no globals. The host is borrowed for the
//!    duration of one [`evaluate`] call.
//!
//! # Integration Flow
//!
//! ```text
//! Framework request context
//!   ↓
//! impl HostRequest for it
//!   ↓
//! evaluate(&guard, &mut host)
//!   ↓
//! guard chain runs against HostAdapter (branch copies below each combinator)
//!   ↓
//! Outcome::{Passed, Terminated, AlreadyAborted}
//! ```

mod adapter;
mod recording;

pub use adapter::{apply_termination, evaluate, HostAdapter, HostRequest, Outcome};
pub use recording::{RecordingHost, Response};
