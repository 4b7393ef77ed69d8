pub mod catalog;
pub mod client;
pub mod config;
pub mod configurator;
pub mod loader;
pub mod model;
pub mod normalizer;
pub mod resolver;
pub mod storage;
pub mod utils;
