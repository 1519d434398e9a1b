//! `cd-cli`: terminal front end for ChatDesk.
//!
//! The `chatdesk` binary wires the session identity, customer selection,
//! and conversation store to the REST chat backend, and renders replies
//! with the response interpreter.

pub mod cli;
