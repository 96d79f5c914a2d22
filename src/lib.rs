pub mod dvp;
pub mod export;
pub mod fake_feed;
pub mod http_cache;
pub mod http_client;
pub mod join;
pub mod models;
pub mod persist;
pub mod positions;
pub mod provider;
pub mod quality;
pub mod schedule_match;
pub mod source_fetch;
pub mod state;
pub mod teams;
