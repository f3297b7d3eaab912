use crate::ast::{Location, RelOp};
use crate::ir::LabelId;

/// Compiler error kinds.
///
/// The first three variants carry user-facing diagnostics; the remaining
/// ones report internal pipeline bugs (a well-formed front end never
/// produces them) and abort compilation without output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// Lexer or parser rejected the source.
    Syntax { message: String, location: Location },
    /// Semantic analysis rejected the program; every error is collected
    /// before failing.
    Semantic(Vec<SemanticError>),
    /// An AST node is missing a required child.
    MalformedAst { message: String, location: Location },
    /// A name reached the IR builder without a symbol-table entry.
    UnknownSymbol { name: String, location: Location },
    /// Code generation asked for an address that was never allocated.
    UnmappedVariable { name: String },
    /// A call site referenced a callable with no recorded entry point.
    UnknownProcedure { name: String },
    /// A conditional jump reached lowering with an operator the target
    /// machine cannot test directly (the builder owns normalization).
    UnsupportedCondition { operator: RelOp },
    /// A jump referenced a label that was never placed.
    UndefinedLabel { label: LabelId },
}

pub type CompileResult<T> = Result<T, CompileError>;

/// A single semantic diagnostic with the offending source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemanticError {
    pub message: String,
    pub location: Location,
}

impl std::fmt::Display for SemanticError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompileError::Syntax { message, location } => {
                write!(f, "syntax error at {location}: {message}")
            }
            CompileError::Semantic(errors) => {
                write!(f, "semantic error")?;
                for err in errors {
                    write!(f, "\n  {err}")?;
                }
                Ok(())
            }
            CompileError::MalformedAst { message, location } => {
                write!(f, "malformed syntax tree at {location}: {message}")
            }
            CompileError::UnknownSymbol { name, location } => {
                write!(f, "internal error at {location}: no symbol for '{name}'")
            }
            CompileError::UnmappedVariable { name } => {
                write!(f, "internal error: no memory cell for '{name}'")
            }
            CompileError::UnknownProcedure { name } => {
                write!(f, "internal error: no entry point for '{name}'")
            }
            CompileError::UnsupportedCondition { operator } => {
                write!(f, "internal error: condition '{operator}' reached lowering unnormalized")
            }
            CompileError::UndefinedLabel { label } => {
                write!(f, "internal error: jump to unplaced label L{label}")
            }
        }
    }
}

impl std::error::Error for CompileError {}

impl CompileError {
    /// Process exit code for the driver: distinct per failure class.
    pub fn exit_code(&self) -> i32 {
        match self {
            CompileError::Syntax { .. } => 2,
            CompileError::Semantic(_) => 3,
            _ => 4,
        }
    }
}
