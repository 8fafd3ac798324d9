pub mod config;
pub mod credentials;
pub mod domain;
pub mod error;
pub mod fetcher;
pub mod harvest;
pub mod http;
pub mod locator;
pub mod normalize;
pub mod output;
pub mod paginator;
pub mod stats;
pub mod store;
