#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::unnecessary_literal_bound,
    clippy::module_name_repetitions,
    clippy::struct_field_names,
    clippy::must_use_candidate,
    clippy::new_without_default,
    clippy::return_self_not_must_use
)]

pub mod app;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod llm;
#[doc(hidden)]
pub mod observability;
pub mod prompt;
pub mod utils;

pub use config::Config;
pub use self::core::router::{Event, EventKind, EventResponse, EventRouter, ResponseData};
pub use error::{NextupError, Result};
