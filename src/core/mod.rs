//! Supervisor core: retry loop, hang detection and rollback.
//!
//! The only public API from this module is [`Regent`] (built through
//! [`RegentBuilder`]) and its [`Config`].
//!
//! Internal modules:
//! - [`regent`]: the retry state machine and state bookkeeping;
//! - [`watchdog`]: runs one attempt under hang detection;
//! - [`rollback`]: post-iteration verification and commit revert;
//! - [`builder`]: wiring of collaborators.

mod builder;
mod config;
mod regent;
mod rollback;
mod watchdog;

#[cfg(test)]
pub(crate) mod fakes;

pub use builder::RegentBuilder;
pub use config::{Config, LOGS_DIR, STATE_DIR, STATE_FILE};
pub use regent::Regent;
