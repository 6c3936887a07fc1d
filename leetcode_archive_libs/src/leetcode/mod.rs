pub mod client;
pub mod model;
pub mod query;
pub mod session;
