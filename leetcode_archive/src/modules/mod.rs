pub mod auth;
pub mod browser;
pub mod crawler;
pub mod extractor;
pub mod migration;
pub mod store;
pub mod throttle;
