pub mod health;
pub mod latency;
pub mod responses;
pub mod routes;
