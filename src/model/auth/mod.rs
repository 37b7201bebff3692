mod token;
mod user;

pub use token::{AuthError, AuthToken, AUTH_TOKEN_COOKIE};
pub use user::{Admin, Rights, User, Voter};
