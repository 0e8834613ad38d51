pub mod annotate;
pub mod auth;
pub mod classifier;
pub mod curation;
pub mod labels;
pub mod media;
pub mod middleware;
pub mod projects;
pub mod proxy;
pub mod search;
