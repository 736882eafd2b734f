pub mod email;
pub mod hash;
pub mod jwt;
pub mod throttle;
