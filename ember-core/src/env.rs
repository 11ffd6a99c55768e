#![forbid(unsafe_code)]

use crate::types::Type;

/// Scoped name-to-type table for the inference pass.
///
/// Implemented as a stack of insertion-ordered scopes rather than a
/// parent-pointer chain; push/pop follow block nesting. Lookup walks from the
/// innermost scope outward, and within a scope the latest binding wins, so
/// re-`let`ing a name shadows the earlier binding.
#[derive(Clone, Debug)]
pub struct TypeEnv {
    scopes: Vec<Vec<(String, Type)>>,
}

impl Default for TypeEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeEnv {
    pub fn new() -> Self {
        TypeEnv {
            scopes: vec![Vec::new()],
        }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(Vec::new());
    }

    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub fn define(&mut self, name: &str, ty: Type) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.push((name.to_string(), ty));
        }
    }

    /// Nearest enclosing binding, or `None` if the name is unbound anywhere
    /// up the chain. Absence is not an error; callers degrade to a default.
    pub fn lookup(&self, name: &str) -> Option<&Type> {
        for scope in self.scopes.iter().rev() {
            for (n, t) in scope.iter().rev() {
                if n == name {
                    return Some(t);
                }
            }
        }
        None
    }
}
