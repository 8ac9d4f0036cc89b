pub mod application;
pub mod cli;
pub mod domain;
pub mod http;
pub mod io;
pub mod storage;

pub use application::{AccountService, AppError};
pub use domain::*;
pub use storage::Repository;
