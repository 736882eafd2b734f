mod common;
mod game;
