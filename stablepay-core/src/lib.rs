#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]

pub mod balances;
pub mod config;
pub mod contracts;
pub mod entities;
pub mod events;
pub mod executor;
pub mod framework;
pub mod onchain;
pub mod planner;
pub mod selection;
pub mod session;
pub mod steps;
pub mod utils;
pub mod validation;
