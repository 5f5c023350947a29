pub mod app;
pub mod config;
pub mod debounce;
pub mod enrichment;
pub mod favorites;
pub mod models;
pub mod pagination;
pub mod search;
pub mod tmdb;
pub mod view;
