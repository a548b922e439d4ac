pub mod cleanup;
pub mod config;
pub mod domain;
pub mod error;
pub mod fs_util;
pub mod geo;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod projector;
pub mod stage;
pub mod store;
pub mod table;
