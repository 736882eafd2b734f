pub mod auth;
pub mod feedback;
pub mod game;
pub mod info;
pub mod session;
pub mod shared;
