use codespan::{FileId, Span};
use codespan_reporting::diagnostic::{Diagnostic, Label};
use std::fmt;

#[derive(Debug)]
pub enum CompileError {
    /// An AST shape the generator has no lowering rule for, e.g. the
    /// debug-print construct nested inside another expression.
    UnsupportedExpression {
        kind: &'static str,
        span: Option<Span>,
        file_id: FileId,
    },
    CodegenError {
        message: String,
        span: Option<Span>,
        file_id: FileId,
    },
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::UnsupportedExpression { kind, .. } => {
                write!(f, "unsupported expression: {}", kind)
            }
            CompileError::CodegenError { message, .. } => {
                write!(f, "codegen error: {}", message)
            }
        }
    }
}

impl std::error::Error for CompileError {}

impl CompileError {
    pub fn to_diagnostic(&self) -> Diagnostic<FileId> {
        let (message, span, file_id) = match self {
            CompileError::UnsupportedExpression { kind, span, file_id } => {
                (format!("unsupported expression: {}", kind), span, file_id)
            }
            CompileError::CodegenError { message, span, file_id } => {
                (format!("codegen error: {}", message), span, file_id)
            }
        };

        let diagnostic = Diagnostic::error().with_message(message);
        match span {
            Some(span) => diagnostic.with_labels(vec![Label::primary(*file_id, *span)]),
            None => diagnostic,
        }
    }
}
