//! Roast a GitHub profile.
//!
//! The core is [`pipeline::Roaster`]: it collects a user's profile, recent
//! repositories and public events ([`github`]), reduces them to a bounded
//! [`stats::ProfileStats`] snapshot ([`stats`]), and hands that to a
//! [`roast::RoastGenerator`]. The HTTP server and the CLI are thin adapters
//! over it.

pub mod age;
pub mod config;
pub mod error;
pub mod github;
pub mod lenient;
pub mod pipeline;
pub mod roast;
pub mod server;
pub mod stats;

pub use config::Config;
pub use error::{Result, RoastError};
pub use pipeline::{RoastReport, Roaster};
pub use stats::ProfileStats;
