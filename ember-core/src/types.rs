#![forbid(unsafe_code)]

/// Type term assigned to expressions by the inference pass.
///
/// `Unknown` is the absence-of-information wildcard: it is compatible with
/// every other term, and inference degrades to it (or to `Int`) rather than
/// reporting an error.
#[derive(Clone, Debug, PartialEq)]
pub enum Type {
    Unknown,
    Int,
    Float,
    Bool,
    String,
    Void,
    Struct(String),
    Trait(String),
    Array(Box<Type>),
    /// Function type; only the return type is carried.
    Func(Box<Type>),
    Generic(String),
    Ref(Box<Type>),
    MutRef(Box<Type>),
}

impl Type {
    pub fn array(elem: Type) -> Self {
        Type::Array(Box::new(elem))
    }

    pub fn func(ret: Type) -> Self {
        Type::Func(Box::new(ret))
    }

    pub fn reference(inner: Type) -> Self {
        Type::Ref(Box::new(inner))
    }

    pub fn display(&self) -> String {
        match self {
            Type::Unknown => "<unknown>".to_string(),
            Type::Int => "Int".to_string(),
            Type::Float => "Float".to_string(),
            Type::Bool => "Bool".to_string(),
            Type::String => "String".to_string(),
            Type::Void => "Void".to_string(),
            Type::Struct(n) => n.clone(),
            Type::Trait(n) => format!("trait {n}"),
            Type::Array(inner) => format!("[{}]", inner.display()),
            Type::Func(ret) => format!("func -> {}", ret.display()),
            Type::Generic(n) => n.clone(),
            Type::Ref(inner) => format!("&{}", inner.display()),
            Type::MutRef(inner) => format!("&mut {}", inner.display()),
        }
    }

    /// Rewrite `Generic` leaves using the binding map, recursing into array
    /// elements and reference targets. Struct and function types pass through
    /// unsubstituted.
    pub fn substitute(&self, bindings: &GenericBindings) -> Type {
        match self {
            Type::Generic(name) => bindings
                .resolve(name)
                .cloned()
                .unwrap_or_else(|| self.clone()),
            Type::Array(inner) => Type::array(inner.substitute(bindings)),
            Type::Ref(inner) => Type::reference(inner.substitute(bindings)),
            other => other.clone(),
        }
    }

    /// Symmetric structural compatibility. `Unknown` matches anything;
    /// arrays compare element types, structs compare names, every other
    /// pairing requires only equal kinds.
    pub fn compatible_with(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::Unknown, _) | (_, Type::Unknown) => true,
            (Type::Array(a), Type::Array(b)) => a.compatible_with(b),
            (Type::Struct(a), Type::Struct(b)) => a == b,
            (a, b) => std::mem::discriminant(a) == std::mem::discriminant(b),
        }
    }
}

/// Generic-parameter bindings collected at an instantiation site.
/// Insertion-ordered; resolution returns the first entry for a name.
#[derive(Clone, Debug, Default)]
pub struct GenericBindings {
    entries: Vec<(String, Type)>,
}

impl GenericBindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, name: &str, ty: Type) {
        self.entries.push((name.to_string(), ty));
    }

    pub fn resolve(&self, name: &str) -> Option<&Type> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| t)
    }
}
