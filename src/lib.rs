pub mod dataset;
pub mod models;
pub mod pipeline;
pub mod scrapers;
