pub mod auth;
pub mod feedback;
pub mod game;
pub mod health;
pub mod info;
pub mod session;
