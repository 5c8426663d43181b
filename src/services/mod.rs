pub mod cache;
pub mod feed;
pub mod filter;
pub mod matcher;
pub mod schedule;
pub mod template;
