pub mod config;
pub mod error;
pub mod fetch;
pub mod harness;
pub mod location;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod store;
pub mod summary;
pub mod temporal;
