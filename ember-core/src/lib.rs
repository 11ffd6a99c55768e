#![forbid(unsafe_code)]

mod borrowck;
mod effects;
mod env;
mod error;
mod ownership;
mod sema;
mod types;

use std::collections::HashMap;

use ember_ast::Module;

pub use borrowck::{BorrowChecker, OwnershipReport};
pub use effects::{
    infer_func_effects, infer_module_effects, EffectKind, EffectSet, Handler, HandlerStack,
};
pub use env::TypeEnv;
pub use error::{OwnershipViolation, SemanticError, ViolationKind};
pub use ownership::{Borrow, BorrowKind, OwnershipContext, OwnershipState, ScopeId, VarState};
pub use sema::Checker;
pub use types::{GenericBindings, Type};

/// Whole-program ownership pass; first violation aborts.
pub fn check_ownership(
    module: &Module,
) -> Result<HashMap<String, OwnershipReport>, OwnershipViolation> {
    borrowck::check_module(module)
}

/// Combined result of the three analysis passes.
#[derive(Debug)]
pub struct Analysis {
    /// Top-level name-to-type bindings, for codegen's type annotations.
    pub type_env: TypeEnv,
    /// Per-function drop lists keyed by scope id.
    pub ownership: HashMap<String, OwnershipReport>,
    /// Per-function inferred effect sets.
    pub effects: HashMap<String, EffectSet>,
}

/// Run type inference, ownership checking, and effect inference over one
/// module, in that order. Only the ownership pass can fail; the other two
/// degrade instead of rejecting.
pub fn analyze_module(module: &Module) -> Result<Analysis, SemanticError> {
    let type_env = Checker::new().check_module(module);
    let ownership = borrowck::check_module(module)?;
    let effects = effects::infer_module_effects(module);
    Ok(Analysis {
        type_env,
        ownership,
        effects,
    })
}

/// Same result as `analyze_module`, with the three passes run concurrently.
/// Safe because each pass is an independent read-only walk over the shared
/// tree, allocating its own scope structures.
pub fn analyze_module_parallel(module: &Module) -> Result<Analysis, SemanticError> {
    let (type_env, (ownership, effects)) = rayon::join(
        || Checker::new().check_module(module),
        || {
            rayon::join(
                || borrowck::check_module(module),
                || effects::infer_module_effects(module),
            )
        },
    );
    Ok(Analysis {
        type_env,
        ownership: ownership?,
        effects,
    })
}
