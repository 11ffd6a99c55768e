#![forbid(unsafe_code)]

use ember_ast::Span;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
#[error("semantic error: {message}")]
#[diagnostic(code(ember::sema))]
pub struct SemanticError {
    pub message: String,
    #[label]
    pub span: Span,
}

/// Closed set of ownership failure causes. One named kind per cause; callers
/// must never have to disambiguate by message text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViolationKind {
    /// Identifier referenced after its value was moved (includes double move).
    UseAfterMove,
    /// Attempt to move a variable with an open borrow.
    MoveWhileBorrowed,
    /// Attempt to borrow a moved variable.
    BorrowAfterMove,
    /// Borrow incompatible with an already-open borrow.
    BorrowConflict,
}

#[derive(Clone, Debug, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(ember::ownership))]
pub struct OwnershipViolation {
    pub name: String,
    pub kind: ViolationKind,
    pub message: String,
    #[label]
    pub span: Span,
}

impl OwnershipViolation {
    pub fn use_after_move(name: &str, span: Span) -> Self {
        OwnershipViolation {
            name: name.to_string(),
            kind: ViolationKind::UseAfterMove,
            message: format!("cannot use binding '{name}' after it was moved"),
            span,
        }
    }

    pub fn move_while_borrowed(name: &str, span: Span) -> Self {
        OwnershipViolation {
            name: name.to_string(),
            kind: ViolationKind::MoveWhileBorrowed,
            message: format!("cannot move binding '{name}' while it is borrowed"),
            span,
        }
    }

    pub fn borrow_after_move(name: &str, span: Span) -> Self {
        OwnershipViolation {
            name: name.to_string(),
            kind: ViolationKind::BorrowAfterMove,
            message: format!("cannot borrow '{name}': it was moved"),
            span,
        }
    }

    pub fn borrow_conflict(name: &str, span: Span, requested_mut: bool) -> Self {
        let message = if requested_mut {
            format!("cannot mutably borrow '{name}': already borrowed")
        } else {
            format!("cannot borrow '{name}': already mutably borrowed")
        };
        OwnershipViolation {
            name: name.to_string(),
            kind: ViolationKind::BorrowConflict,
            message,
            span,
        }
    }
}

impl From<OwnershipViolation> for SemanticError {
    fn from(v: OwnershipViolation) -> Self {
        SemanticError {
            message: v.message,
            span: v.span,
        }
    }
}
