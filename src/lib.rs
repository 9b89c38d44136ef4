//! Movie review service: stores user reviews of movies, enriches listings with usernames and
//! movie titles from remote services and serves everything over a REST API.

pub mod aggregation;
pub mod authentication;
pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod input_structs;
pub mod model;
pub mod orchestrator;
pub mod repository;
pub mod telemetry;
