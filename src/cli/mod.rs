pub mod args;

use clap::Parser;
pub use args::{Arguments, RunnerKind};

pub fn parse() -> Arguments {
    Arguments::parse()
}
