//! Lead prospecting core: discovery and analysis through a generative
//! search backend, plus a small persisted CRM list.

pub mod ai;
pub mod config;
pub mod controller;
pub mod error;
pub mod handoff;
pub mod prospect;
pub mod store;
pub mod types;

pub use ai::*;
pub use config::*;
pub use controller::*;
pub use error::*;
pub use handoff::*;
pub use prospect::*;
pub use store::*;
pub use types::*;
