pub mod components;
pub mod cycle;
pub mod display;
pub mod fetch;
pub mod leaderboard;
pub mod output;
pub mod parser;
pub mod source;
pub mod stations;
