pub mod command;
pub mod fastx;
pub mod manifest;
pub mod path;
pub mod runner;
pub mod star_log;
