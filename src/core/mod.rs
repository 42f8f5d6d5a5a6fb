//! Core module - scheduling rules, protocol model and storage

pub mod calendar;
pub mod concentration;
pub mod config;
pub mod images;
pub mod project;
pub mod protocol;
pub mod session;
pub mod stage;
pub mod store;
pub mod tasks;
pub mod volume;

pub use config::Config;
pub use project::{Project, ProjectError};
pub use store::{open_store, Storage, StoreError};
