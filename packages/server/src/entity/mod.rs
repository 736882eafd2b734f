pub mod feature;
pub mod game;
pub mod main_page_game;
pub mod room;
pub mod tariff;
pub mod user;
