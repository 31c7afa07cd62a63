pub mod auth;
pub mod company;
pub mod shared;
