pub mod app;
pub mod braille;
pub mod cli;
pub mod client;
pub mod data;
pub mod error;
pub mod favorites;
pub mod geo;
pub mod locate;
pub mod logging;
pub mod map;
pub mod ui;
