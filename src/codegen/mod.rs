mod compile_error;
mod cpp;

use codespan::FileId;
pub use compile_error::CompileError;
pub use cpp::CppBackend;

/// Output dialect selection surface. Exactly one dialect is supported; the
/// enum keeps the call site stable should another ever be added.
pub enum Target {
    Cpp(CppBackend),
}

impl Target {
    pub fn create(file_id: FileId) -> Self {
        Target::Cpp(CppBackend::new(file_id))
    }

    pub fn generate(&mut self, program: &crate::ast::Program) -> Result<String, CompileError> {
        match self {
            Target::Cpp(backend) => backend.generate(program),
        }
    }
}
