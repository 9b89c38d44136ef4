//! Protocol buffer messages of the movie and user inter-service APIs.
//!
//! ```proto
//! // movie.v1
//! service MovieInterService {
//!   rpc GetMovieInfo(GetMovieInfoRequest) returns (GetMovieInfoResponse);
//!   rpc CheckMovieExists(CheckMovieExistsRequest) returns (CheckMovieExistsResponse);
//! }
//! // user.v1
//! service UserService {
//!   rpc GetUser(GetUserRequest) returns (UserResponse);
//! }
//! ```

pub mod movie {
    pub const CHECK_MOVIE_EXISTS_PATH: &str = "/movie.v1.MovieInterService/CheckMovieExists";
    pub const GET_MOVIE_INFO_PATH: &str = "/movie.v1.MovieInterService/GetMovieInfo";

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct CheckMovieExistsRequest {
        #[prost(string, tag = "1")]
        pub movie_id: ::prost::alloc::string::String,
    }

    #[derive(Clone, Copy, PartialEq, ::prost::Message)]
    pub struct CheckMovieExistsResponse {
        #[prost(bool, tag = "1")]
        pub exists: bool,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct GetMovieInfoRequest {
        #[prost(string, tag = "1")]
        pub movie_id: ::prost::alloc::string::String,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct MovieInfo {
        #[prost(string, tag = "1")]
        pub id: ::prost::alloc::string::String,
        #[prost(string, tag = "2")]
        pub title: ::prost::alloc::string::String,
        #[prost(int32, tag = "3")]
        pub release_year: i32,
        #[prost(string, tag = "4")]
        pub status: ::prost::alloc::string::String,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct GetMovieInfoResponse {
        #[prost(message, optional, tag = "1")]
        pub movie_info: ::core::option::Option<MovieInfo>,
    }
}

pub mod user {
    pub const GET_USER_PATH: &str = "/user.v1.UserService/GetUser";

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct GetUserRequest {
        #[prost(string, tag = "1")]
        pub user_id: ::prost::alloc::string::String,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct UserResponse {
        #[prost(string, tag = "1")]
        pub id: ::prost::alloc::string::String,
        #[prost(string, tag = "2")]
        pub username: ::prost::alloc::string::String,
        #[prost(string, tag = "3")]
        pub email: ::prost::alloc::string::String,
    }
}
