mod movie;
mod statistics;
mod user;
mod watch;

pub use movie::{parse_release_year, parse_tokens, MovieMetadata, MovieRecord};
pub use statistics::StatisticsReport;
pub use user::{
    AddWatchedRequest, CreateUserRequest, ImportWatchedRequest, RemoveWatchedRequest, User,
    UserUpdate,
};
pub use watch::{ImportedEntry, WatchEntry};
