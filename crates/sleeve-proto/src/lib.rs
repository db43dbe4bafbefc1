pub mod config;
pub mod geometry;
pub mod layout;
pub mod platform;
pub mod player;
pub mod protocol;
