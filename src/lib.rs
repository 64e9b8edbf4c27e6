pub mod collection;
pub mod config;
pub mod control;
pub mod error;
pub mod events;
pub mod metadata;
pub mod navigation;
pub mod relocate;
pub mod search;
pub mod tasks {
    pub mod slideshow;
    pub mod watch;
}

pub use error::{Error, RelocateError, Result};
