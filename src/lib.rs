pub mod auth;
pub mod cli;
pub mod kunci;
pub mod store;
