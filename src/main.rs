mod ast;
mod cli;
mod codegen;
mod compiler;
mod lexer;
mod parser;

use anyhow::Context;
use std::process::exit;

fn main() -> anyhow::Result<()> {
    let args = cli::parse();

    let source = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read '{}'", args.input.display()))?;

    let output = compiler::compile(&source);
    if output.starts_with(compiler::ERROR_MARKER) {
        eprintln!("{}", output);
        exit(1);
    }

    match &args.output {
        Some(path) => std::fs::write(path, &output)
            .with_context(|| format!("Failed to write '{}'", path.display()))?,
        None => print!("{}", output),
    }

    Ok(())
}
