use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about = "Compiles scripts to C++ source text")]
pub struct Args {
    /// Input script to compile
    pub input: PathBuf,

    /// Write the generated C++ here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn parse() -> Args {
    Args::parse()
}
