//! Administrative command base for Azure Stack style resource-management APIs.
//!
//! Commands implement [`command::AdminCommand`] and are run by a
//! [`command::CommandHost`], which resolves the signed-in context, builds a
//! versioned [`client::AdminClient`] on demand, guards the process-wide TLS
//! certificate policy and emits results through an [`output::OutputSink`].

pub mod auth;
pub mod client;
pub mod command;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod output;
pub mod tls;

pub use command::{AdminCommand, CommandHost, CommandSession};
pub use error::{AdminError, CommandFailure, Result};
