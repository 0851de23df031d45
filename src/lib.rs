pub mod components;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod registration;
pub mod startup;
