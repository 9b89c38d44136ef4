//! Client facades for the user directory and the movie catalog.
//!
//! The orchestrator only depends on [`MovieLookup`] and [`UserLookup`]. The gRPC facades in
//! [`grpc`] are the production implementations, [`memory`] holds in-process directories.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

pub mod grpc;
pub mod memory;
pub mod proto;

pub use grpc::{GrpcMovieLookup, GrpcUserLookup, RemoteEndpoint};
pub use memory::{InMemoryMovieDirectory, InMemoryUserDirectory};

/// Failure of a remote lookup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// The remote service answered that the entity does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The remote service could not be reached, timed out or failed.
    #[error("{0}")]
    Unavailable(String),
}

/// Brief movie metadata as provided by the movie catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieInfo {
    pub id: Uuid,
    pub title: String,
    pub release_year: i32,
    /// Moderation status, e.g. `approved`.
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
    pub id: Uuid,
    pub username: String,
}

/// Capability to look up movies in the movie catalog.
#[async_trait]
pub trait MovieLookup: Send + Sync {
    async fn exists(&self, movie_id: Uuid) -> Result<bool, LookupError>;

    async fn info(&self, movie_id: Uuid) -> Result<MovieInfo, LookupError>;
}

/// Capability to look up users in the user directory.
#[async_trait]
pub trait UserLookup: Send + Sync {
    async fn info(&self, user_id: Uuid) -> Result<UserInfo, LookupError>;
}
