pub mod audio;
pub mod config;
pub mod ratelimit;
pub mod repositories;
pub mod retry;
pub mod scratch;
