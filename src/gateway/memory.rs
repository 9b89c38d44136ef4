use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{LookupError, MovieInfo, MovieLookup, UserInfo, UserLookup};

/// In-process movie catalog with per-movie failure injection.
#[derive(Default)]
pub struct InMemoryMovieDirectory {
    movies: RwLock<HashMap<Uuid, MovieInfo>>,
    failures: RwLock<HashMap<Uuid, LookupError>>,
}

impl InMemoryMovieDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, movie: MovieInfo) {
        self.movies.write().await.insert(movie.id, movie);
    }

    /// Makes every lookup of `movie_id` fail with `error`.
    pub async fn fail_for(&self, movie_id: Uuid, error: LookupError) {
        self.failures.write().await.insert(movie_id, error);
    }

    async fn injected_failure(&self, movie_id: Uuid) -> Result<(), LookupError> {
        match self.failures.read().await.get(&movie_id) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl MovieLookup for InMemoryMovieDirectory {
    async fn exists(&self, movie_id: Uuid) -> Result<bool, LookupError> {
        self.injected_failure(movie_id).await?;
        Ok(self.movies.read().await.contains_key(&movie_id))
    }

    async fn info(&self, movie_id: Uuid) -> Result<MovieInfo, LookupError> {
        self.injected_failure(movie_id).await?;
        self.movies
            .read()
            .await
            .get(&movie_id)
            .cloned()
            .ok_or_else(|| LookupError::NotFound(format!("Movie `{}` not found.", movie_id)))
    }
}

/// In-process user directory with per-user failure injection.
#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<Uuid, UserInfo>>,
    failures: RwLock<HashMap<Uuid, LookupError>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, user: UserInfo) {
        self.users.write().await.insert(user.id, user);
    }

    /// Makes every lookup of `user_id` fail with `error`.
    pub async fn fail_for(&self, user_id: Uuid, error: LookupError) {
        self.failures.write().await.insert(user_id, error);
    }
}

#[async_trait]
impl UserLookup for InMemoryUserDirectory {
    async fn info(&self, user_id: Uuid) -> Result<UserInfo, LookupError> {
        if let Some(error) = self.failures.read().await.get(&user_id) {
            return Err(error.clone());
        }
        self.users
            .read()
            .await
            .get(&user_id)
            .cloned()
            .ok_or_else(|| LookupError::NotFound(format!("User `{}` not found.", user_id)))
    }
}
