use crate::codegen::Target;
use crate::lexer::Lexer;
use crate::parser::Parser;
use codespan::{FileId, Files};
use codespan_reporting::diagnostic::Diagnostic;

/// Prefix carried by every failed compilation, so callers can distinguish
/// generated C++ from an error report without an out-of-band channel.
pub const ERROR_MARKER: &str = "COMPILE ERROR: ";

/// Compiles one source string to C++ text. Never panics on bad input: any
/// stage failure comes back as a single `COMPILE ERROR: ...` line with a
/// 1-based line and column.
pub fn compile(source: &str) -> String {
    let mut files = Files::new();
    let file_id = files.add("<input>", source.to_string());

    match compile_file(&files, file_id) {
        Ok(code) => code,
        Err(diagnostic) => format!("{}{}", ERROR_MARKER, render_diagnostic(&files, &diagnostic)),
    }
}

fn compile_file(files: &Files<String>, file_id: FileId) -> Result<String, Diagnostic<FileId>> {
    let lexer = Lexer::new(files, file_id);
    let mut parser = Parser::new(lexer)?;
    let program = parser.parse_program()?;

    Target::create(file_id)
        .generate(&program)
        .map_err(|e| e.to_diagnostic())
}

fn render_diagnostic(files: &Files<String>, diagnostic: &Diagnostic<FileId>) -> String {
    let location = diagnostic
        .labels
        .first()
        .and_then(|label| files.location(label.file_id, label.range.start as u32).ok());

    match location {
        Some(location) => format!(
            "{} at {}:{}",
            diagnostic.message,
            location.line.number(),
            location.column.number()
        ),
        None => diagnostic.message.clone(),
    }
}
