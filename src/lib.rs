pub mod app;
pub mod clock;
pub mod config;
pub mod content;
pub mod engine;
pub mod error;
pub mod event;
pub mod notice;
pub mod session;
pub mod store;
pub mod timer;

pub use app::{Dojo, DojoScreen};
