//! `cd-domain`: types shared by every ChatDesk crate.
//!
//! Holds the conversation [`message::Message`] model, the customer and
//! prompt [`customer::Catalog`], the workspace-wide [`error::Error`],
//! structured [`trace::TraceEvent`]s, TOML [`config::Config`], and the
//! response interpreter that turns backend payloads into readable text.

pub mod config;
pub mod customer;
pub mod error;
pub mod interpret;
pub mod message;
pub mod trace;

pub use customer::{Catalog, Customer, PromptTemplate};
pub use error::{Error, Result};
pub use interpret::extract_human_message;
pub use message::{Message, Role};
