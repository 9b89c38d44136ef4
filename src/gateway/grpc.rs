use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error, info, warn};
use tonic::{
    Code, Request, Status,
    client::Grpc,
    codegen::http::uri::PathAndQuery,
    transport::{Channel, Endpoint},
};
use uuid::Uuid;

use super::{
    LookupError, MovieInfo, MovieLookup, UserInfo, UserLookup,
    proto::{movie, user},
};

/// Address and timeouts of a remote gRPC service.
#[derive(Debug, Clone)]
pub struct RemoteEndpoint {
    /// URI of the service, e.g. `http://localhost:9092`.
    pub address: String,
    /// Bound on establishing the connection at startup.
    pub connect_timeout: Duration,
    /// Bound on every single call.
    pub call_timeout: Duration,
}

/// Unary gRPC client bound to one service, applying the per-call timeout to every call.
#[derive(Clone)]
struct UnaryClient {
    service: &'static str,
    grpc: Grpc<Channel>,
    call_timeout: Duration,
}

impl UnaryClient {
    /// Connects to `endpoint`, failing if no connection is established within its connect timeout.
    async fn connect(service: &'static str, endpoint: &RemoteEndpoint) -> Result<Self, LookupError> {
        info!("Connecting to {} gRPC at {}.", service, endpoint.address);
        let channel_endpoint = Endpoint::from_shared(endpoint.address.clone())
            .map_err(|e| {
                LookupError::Unavailable(format!(
                    "Invalid {} address `{}`: {}",
                    service, endpoint.address, e
                ))
            })?
            .connect_timeout(endpoint.connect_timeout);
        let channel = match tokio::time::timeout(endpoint.connect_timeout, channel_endpoint.connect())
            .await
        {
            Ok(Ok(channel)) => channel,
            Ok(Err(e)) => {
                error!("Failed to connect to {} gRPC at {}: {}", service, endpoint.address, e);
                return Err(LookupError::Unavailable(format!(
                    "Failed to connect to {} at {}: {}",
                    service, endpoint.address, e
                )));
            }
            Err(_) => {
                error!("Connecting to {} gRPC at {} timed out.", service, endpoint.address);
                return Err(LookupError::Unavailable(format!(
                    "Connecting to {} at {} timed out after {:?}.",
                    service, endpoint.address, endpoint.connect_timeout
                )));
            }
        };
        info!("Connected to {} gRPC at {}.", service, endpoint.address);
        Ok(Self {
            service,
            grpc: Grpc::new(channel),
            call_timeout: endpoint.call_timeout,
        })
    }

    async fn call<Req, Resp>(&self, path: &'static str, message: Req) -> Result<Resp, LookupError>
    where
        Req: prost::Message + Send + Sync + 'static,
        Resp: prost::Message + Default + Send + Sync + 'static,
    {
        let mut grpc = self.grpc.clone();
        let call = async move {
            grpc.ready()
                .await
                .map_err(|e| Status::unavailable(format!("Service was not ready: {}", e)))?;
            let codec = tonic_prost::ProstCodec::<Req, Resp>::default();
            grpc.unary(Request::new(message), PathAndQuery::from_static(path), codec)
                .await
        };
        match tokio::time::timeout(self.call_timeout, call).await {
            Ok(Ok(response)) => Ok(response.into_inner()),
            Ok(Err(status)) => {
                let lookup_error = classify_status(self.service, path, &status);
                match &lookup_error {
                    LookupError::NotFound(_) => warn!("{} {} answered NOT_FOUND.", self.service, path),
                    LookupError::Unavailable(_) => error!(
                        "{} {} failed with code {:?}: {}",
                        self.service,
                        path,
                        status.code(),
                        status.message()
                    ),
                }
                Err(lookup_error)
            }
            Err(_) => {
                error!("{} {} timed out after {:?}.", self.service, path, self.call_timeout);
                Err(LookupError::Unavailable(format!(
                    "{} call {} timed out after {:?}.",
                    self.service, path, self.call_timeout
                )))
            }
        }
    }
}

/// Separates an explicit NOT_FOUND answer from every other failure.
fn classify_status(service: &str, path: &str, status: &Status) -> LookupError {
    match status.code() {
        Code::NotFound => LookupError::NotFound(format!(
            "{} reported not found for {}: {}",
            service,
            path,
            status.message()
        )),
        code => LookupError::Unavailable(format!(
            "{} call {} failed with {:?}: {}",
            service,
            path,
            code,
            status.message()
        )),
    }
}

/// Movie catalog facade over the `movie.v1.MovieInterService` gRPC API.
#[derive(Clone)]
pub struct GrpcMovieLookup {
    client: UnaryClient,
}

impl GrpcMovieLookup {
    pub async fn connect(endpoint: &RemoteEndpoint) -> Result<Self, LookupError> {
        let client = UnaryClient::connect("MovieService", endpoint).await?;
        Ok(Self { client })
    }
}

#[async_trait]
impl MovieLookup for GrpcMovieLookup {
    async fn exists(&self, movie_id: Uuid) -> Result<bool, LookupError> {
        debug!("Calling MovieService.CheckMovieExists for movie `{}`.", movie_id);
        let request = movie::CheckMovieExistsRequest {
            movie_id: movie_id.to_string(),
        };
        let response: movie::CheckMovieExistsResponse = self
            .client
            .call(movie::CHECK_MOVIE_EXISTS_PATH, request)
            .await?;
        Ok(response.exists)
    }

    async fn info(&self, movie_id: Uuid) -> Result<MovieInfo, LookupError> {
        debug!("Calling MovieService.GetMovieInfo for movie `{}`.", movie_id);
        let request = movie::GetMovieInfoRequest {
            movie_id: movie_id.to_string(),
        };
        let response: movie::GetMovieInfoResponse = self
            .client
            .call(movie::GET_MOVIE_INFO_PATH, request)
            .await?;
        let info = response.movie_info.ok_or_else(|| {
            LookupError::NotFound(format!("Movie info not found for UUID: `{}`.", movie_id))
        })?;
        Ok(MovieInfo {
            id: Uuid::parse_str(&info.id).unwrap_or(movie_id),
            title: info.title,
            release_year: info.release_year,
            status: info.status,
        })
    }
}

/// User directory facade over the `user.v1.UserService` gRPC API.
#[derive(Clone)]
pub struct GrpcUserLookup {
    client: UnaryClient,
}

impl GrpcUserLookup {
    pub async fn connect(endpoint: &RemoteEndpoint) -> Result<Self, LookupError> {
        let client = UnaryClient::connect("UserService", endpoint).await?;
        Ok(Self { client })
    }
}

#[async_trait]
impl UserLookup for GrpcUserLookup {
    async fn info(&self, user_id: Uuid) -> Result<UserInfo, LookupError> {
        debug!("Calling UserService.GetUser for user `{}`.", user_id);
        let request = user::GetUserRequest {
            user_id: user_id.to_string(),
        };
        let response: user::UserResponse = self.client.call(user::GET_USER_PATH, request).await?;
        Ok(UserInfo {
            id: Uuid::parse_str(&response.id).unwrap_or(user_id),
            username: response.username,
        })
    }
}
