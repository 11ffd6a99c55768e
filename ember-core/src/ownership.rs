#![forbid(unsafe_code)]

use ember_ast::Span;

use crate::error::OwnershipViolation;

/// Ownership state of a variable binding.
///
/// Each binding transitions through these states as it is borrowed or moved.
/// `Moved` is terminal within the binding's defining scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OwnershipState {
    /// Initial state: value is owned and can be moved, borrowed, or used.
    Owned,

    /// At least one immutable borrow is open. Readable, not movable.
    Borrowed,

    /// A mutable borrow is open; excludes every other borrow.
    MutBorrowed,

    /// Value was consumed via move. Subsequent uses are not permitted.
    Moved,

    /// Reserved for field-level moves out of aggregates; never produced by
    /// the current walker.
    Partial,
}

impl OwnershipState {
    pub fn allows_move(&self) -> bool {
        matches!(self, OwnershipState::Owned)
    }

    pub fn is_borrowed(&self) -> bool {
        matches!(self, OwnershipState::Borrowed | OwnershipState::MutBorrowed)
    }

    pub fn display(&self) -> &'static str {
        match self {
            OwnershipState::Owned => "owned",
            OwnershipState::Borrowed => "borrowed",
            OwnershipState::MutBorrowed => "mutably borrowed",
            OwnershipState::Moved => "moved",
            OwnershipState::Partial => "partially moved",
        }
    }
}

/// Per-binding tracking record.
#[derive(Clone, Debug)]
pub struct VarState {
    pub name: String,
    pub state: OwnershipState,
    /// Set once the binding has been emitted into a drop list; guards against
    /// double-destruction if a scope were exited twice.
    pub dropped: bool,
}

impl VarState {
    fn new(name: &str) -> Self {
        VarState {
            name: name.to_string(),
            state: OwnershipState::Owned,
            dropped: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BorrowKind {
    Immutable,
    Mutable,
}

/// Provenance record for one borrow. Records are append-only: releasing a
/// borrow stamps `end_scope` retroactively, never removes the record, so the
/// full trail of borrows taken in a scope survives for the life of the check.
#[derive(Clone, Debug)]
pub struct Borrow {
    pub target: String,
    pub kind: BorrowKind,
    pub start_scope: ScopeId,
    pub end_scope: Option<ScopeId>,
}

impl Borrow {
    pub fn is_open(&self) -> bool {
        self.end_scope.is_none()
    }
}

/// Identifies one lexical scope within a function's check. Ids are handed out
/// by a per-context counter, one per created scope, root = 0, so sibling
/// blocks get distinct ids and drop lists can be keyed by scope.
pub type ScopeId = u32;

#[derive(Clone, Debug)]
struct Scope {
    id: ScopeId,
    parent: Option<usize>,
    vars: Vec<VarState>,
    borrows: Vec<Borrow>,
}

/// Scope tree for one function's ownership check.
///
/// Scopes live in an arena indexed by position; `parent` is an index, not a
/// pointer. Exited scopes are retained so the borrow provenance trail is
/// inspectable after the fact.
#[derive(Clone, Debug)]
pub struct OwnershipContext {
    scopes: Vec<Scope>,
    current: usize,
    next_id: ScopeId,
}

impl Default for OwnershipContext {
    fn default() -> Self {
        Self::new()
    }
}

impl OwnershipContext {
    /// Fresh context with the root scope (id 0) active.
    pub fn new() -> Self {
        OwnershipContext {
            scopes: vec![Scope {
                id: 0,
                parent: None,
                vars: Vec::new(),
                borrows: Vec::new(),
            }],
            current: 0,
            next_id: 1,
        }
    }

    pub fn current_scope_id(&self) -> ScopeId {
        self.scopes[self.current].id
    }

    /// Open a nested scope and make it current.
    pub fn enter_scope(&mut self) -> ScopeId {
        let id = self.next_id;
        self.next_id += 1;
        self.scopes.push(Scope {
            id,
            parent: Some(self.current),
            vars: Vec::new(),
            borrows: Vec::new(),
        });
        self.current = self.scopes.len() - 1;
        id
    }

    /// Close the current scope, returning its id and drop list, and make the
    /// parent current again. The scope itself stays in the arena.
    pub fn exit_scope(&mut self) -> (ScopeId, Vec<String>) {
        let id = self.scopes[self.current].id;
        let drops = self.scope_drops();
        if let Some(parent) = self.scopes[self.current].parent {
            self.current = parent;
        }
        (id, drops)
    }

    /// Register a fresh Owned binding in the current scope. Shadowing a name
    /// from the same scope simply appends a second record; lookup resolves to
    /// the latest one.
    pub fn declare(&mut self, name: &str) {
        self.scopes[self.current].vars.push(VarState::new(name));
    }

    /// Nearest binding for `name`: latest match in the current scope, then
    /// outward through parents.
    fn find_var(&self, name: &str) -> Option<(usize, usize)> {
        let mut scope_idx = Some(self.current);
        while let Some(si) = scope_idx {
            let scope = &self.scopes[si];
            if let Some(vi) = scope.vars.iter().rposition(|v| v.name == name) {
                return Some((si, vi));
            }
            scope_idx = scope.parent;
        }
        None
    }

    pub fn state_of(&self, name: &str) -> Option<OwnershipState> {
        self.find_var(name).map(|(si, vi)| self.scopes[si].vars[vi].state)
    }

    /// Transfer ownership of `name` out of its binding.
    ///
    /// An unbound name is a no-op success: the engine checks only what it has
    /// seen declared and degrades gracefully otherwise.
    pub fn move_var(&mut self, name: &str, span: Span) -> Result<(), OwnershipViolation> {
        let Some((si, vi)) = self.find_var(name) else {
            return Ok(());
        };
        let var = &mut self.scopes[si].vars[vi];
        match var.state {
            OwnershipState::Moved => Err(OwnershipViolation::use_after_move(name, span)),
            OwnershipState::Borrowed | OwnershipState::MutBorrowed => {
                Err(OwnershipViolation::move_while_borrowed(name, span))
            }
            _ => {
                var.state = OwnershipState::Moved;
                Ok(())
            }
        }
    }

    /// Open a borrow of `name`. Immutable borrows stack; a mutable borrow
    /// excludes all others. The `Borrow` record lands in the scope where the
    /// borrow executes, which need not be the binding's defining scope.
    pub fn borrow_var(
        &mut self,
        name: &str,
        kind: BorrowKind,
        span: Span,
    ) -> Result<(), OwnershipViolation> {
        let Some((si, vi)) = self.find_var(name) else {
            return Ok(());
        };
        let state = self.scopes[si].vars[vi].state;
        if state == OwnershipState::Moved {
            return Err(OwnershipViolation::borrow_after_move(name, span));
        }
        let new_state = match kind {
            BorrowKind::Mutable => {
                if state.is_borrowed() {
                    return Err(OwnershipViolation::borrow_conflict(name, span, true));
                }
                OwnershipState::MutBorrowed
            }
            BorrowKind::Immutable => {
                if state == OwnershipState::MutBorrowed {
                    return Err(OwnershipViolation::borrow_conflict(name, span, false));
                }
                OwnershipState::Borrowed
            }
        };
        self.scopes[si].vars[vi].state = new_state;

        let start_scope = self.current_scope_id();
        self.scopes[self.current].borrows.push(Borrow {
            target: name.to_string(),
            kind,
            start_scope,
            end_scope: None,
        });
        Ok(())
    }

    /// Give back every open borrow of `name` taken in the current scope:
    /// stamp their end-scope ids and reset the binding to Owned.
    ///
    /// This is a primitive for scope-exit handling; the statement walker does
    /// not call it automatically.
    pub fn return_borrow(&mut self, name: &str) {
        let Some((si, vi)) = self.find_var(name) else {
            return;
        };
        let end = self.current_scope_id();
        for borrow in &mut self.scopes[self.current].borrows {
            if borrow.target == name && borrow.end_scope.is_none() {
                borrow.end_scope = Some(end);
            }
        }
        self.scopes[si].vars[vi].state = OwnershipState::Owned;
    }

    /// Drop list for the current scope: every binding declared here that is
    /// still Owned and not yet emitted, in declaration order. Each returned
    /// binding is flagged so it can never be emitted twice.
    pub fn scope_drops(&mut self) -> Vec<String> {
        let scope = &mut self.scopes[self.current];
        let mut drops = Vec::new();
        for var in &mut scope.vars {
            if var.state == OwnershipState::Owned && !var.dropped {
                drops.push(var.name.clone());
                var.dropped = true;
            }
        }
        drops
    }

    /// Borrow records taken in the current scope, in the order taken.
    pub fn current_borrows(&self) -> &[Borrow] {
        &self.scopes[self.current].borrows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_ast::span;

    fn sp() -> Span {
        span(0, 0)
    }

    #[test]
    fn move_then_move_is_use_after_move() {
        let mut ctx = OwnershipContext::new();
        ctx.declare("x");
        assert!(ctx.move_var("x", sp()).is_ok());

        let err = ctx.move_var("x", sp()).unwrap_err();
        assert_eq!(err.kind, crate::error::ViolationKind::UseAfterMove);
    }

    #[test]
    fn move_of_borrowed_is_rejected() {
        let mut ctx = OwnershipContext::new();
        ctx.declare("x");
        assert!(ctx.borrow_var("x", BorrowKind::Immutable, sp()).is_ok());

        let err = ctx.move_var("x", sp()).unwrap_err();
        assert_eq!(err.kind, crate::error::ViolationKind::MoveWhileBorrowed);
    }

    #[test]
    fn borrow_of_moved_is_rejected() {
        let mut ctx = OwnershipContext::new();
        ctx.declare("x");
        assert!(ctx.move_var("x", sp()).is_ok());

        let err = ctx.borrow_var("x", BorrowKind::Immutable, sp()).unwrap_err();
        assert_eq!(err.kind, crate::error::ViolationKind::BorrowAfterMove);
    }

    #[test]
    fn immutable_borrows_stack() {
        let mut ctx = OwnershipContext::new();
        ctx.declare("x");
        assert!(ctx.borrow_var("x", BorrowKind::Immutable, sp()).is_ok());
        assert!(ctx.borrow_var("x", BorrowKind::Immutable, sp()).is_ok());
        assert_eq!(ctx.state_of("x"), Some(OwnershipState::Borrowed));
        assert_eq!(ctx.current_borrows().len(), 2);
    }

    #[test]
    fn mutable_borrow_excludes_all_others() {
        let mut ctx = OwnershipContext::new();
        ctx.declare("x");
        assert!(ctx.borrow_var("x", BorrowKind::Mutable, sp()).is_ok());

        let err = ctx.borrow_var("x", BorrowKind::Immutable, sp()).unwrap_err();
        assert_eq!(err.kind, crate::error::ViolationKind::BorrowConflict);

        let err = ctx.borrow_var("x", BorrowKind::Mutable, sp()).unwrap_err();
        assert_eq!(err.kind, crate::error::ViolationKind::BorrowConflict);
    }

    #[test]
    fn mutable_borrow_after_immutable_is_rejected() {
        let mut ctx = OwnershipContext::new();
        ctx.declare("x");
        assert!(ctx.borrow_var("x", BorrowKind::Immutable, sp()).is_ok());

        let err = ctx.borrow_var("x", BorrowKind::Mutable, sp()).unwrap_err();
        assert_eq!(err.kind, crate::error::ViolationKind::BorrowConflict);
    }

    #[test]
    fn return_borrow_round_trip_allows_move() {
        let mut ctx = OwnershipContext::new();
        ctx.declare("v");
        assert!(ctx.borrow_var("v", BorrowKind::Immutable, sp()).is_ok());
        assert!(ctx.move_var("v", sp()).is_err());

        ctx.return_borrow("v");
        assert_eq!(ctx.state_of("v"), Some(OwnershipState::Owned));
        assert!(ctx.move_var("v", sp()).is_ok());
    }

    #[test]
    fn return_borrow_stamps_end_scope_without_removing_records() {
        let mut ctx = OwnershipContext::new();
        ctx.declare("v");
        ctx.borrow_var("v", BorrowKind::Immutable, sp()).unwrap();
        ctx.borrow_var("v", BorrowKind::Immutable, sp()).unwrap();
        assert!(ctx.current_borrows().iter().all(Borrow::is_open));

        ctx.return_borrow("v");
        assert_eq!(ctx.current_borrows().len(), 2);
        assert!(ctx.current_borrows().iter().all(|b| !b.is_open()));
    }

    #[test]
    fn unknown_name_is_a_no_op() {
        let mut ctx = OwnershipContext::new();
        assert!(ctx.move_var("ghost", sp()).is_ok());
        assert!(ctx.borrow_var("ghost", BorrowKind::Immutable, sp()).is_ok());
        assert_eq!(ctx.state_of("ghost"), None);
    }

    #[test]
    fn lookup_walks_parent_scopes() {
        let mut ctx = OwnershipContext::new();
        ctx.declare("outer");
        ctx.enter_scope();
        ctx.declare("inner");

        assert!(ctx.move_var("outer", sp()).is_ok());
        assert_eq!(ctx.state_of("outer"), Some(OwnershipState::Moved));
        assert_eq!(ctx.state_of("inner"), Some(OwnershipState::Owned));
    }

    #[test]
    fn same_scope_shadow_resolves_to_latest_binding() {
        // Chosen semantics: the second `let x` shadows the first, so moving
        // `x` afterwards consumes the later binding.
        let mut ctx = OwnershipContext::new();
        ctx.declare("x");
        ctx.move_var("x", sp()).unwrap();
        ctx.declare("x");

        assert_eq!(ctx.state_of("x"), Some(OwnershipState::Owned));
        assert!(ctx.move_var("x", sp()).is_ok());
    }

    #[test]
    fn scope_ids_are_unique_across_siblings() {
        let mut ctx = OwnershipContext::new();
        let first = ctx.enter_scope();
        ctx.exit_scope();
        let second = ctx.enter_scope();
        ctx.exit_scope();
        assert_ne!(first, second);
        assert_eq!(ctx.current_scope_id(), 0);
    }

    #[test]
    fn drops_cover_owned_vars_once_in_declaration_order() {
        let mut ctx = OwnershipContext::new();
        ctx.declare("a");
        ctx.declare("b");
        ctx.declare("c");
        ctx.move_var("b", sp()).unwrap();

        let drops = ctx.scope_drops();
        assert_eq!(drops, vec!["a".to_string(), "c".to_string()]);

        // Second pass over the same scope emits nothing.
        assert!(ctx.scope_drops().is_empty());
    }

    #[test]
    fn exit_scope_returns_to_parent() {
        let mut ctx = OwnershipContext::new();
        ctx.declare("p");
        ctx.enter_scope();
        ctx.declare("q");

        let (id, drops) = ctx.exit_scope();
        assert_eq!(id, 1);
        assert_eq!(drops, vec!["q".to_string()]);
        assert_eq!(ctx.current_scope_id(), 0);
        // q's record is gone from reach but p is still live.
        assert_eq!(ctx.state_of("p"), Some(OwnershipState::Owned));
    }
}
