pub mod client;
pub mod job;
pub mod kubernetes;
pub mod metrics;
