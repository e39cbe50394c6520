//! Turns statements into dependency strings.

use crate::parser::ast::Statement;

/// A reference from a function body to something callable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dependency {
    /// Unqualified call of a function in the same module.
    Local(String),
    /// Flattened member chain ending in a call, e.g. `CommonModule.Method`.
    Chain(String),
    /// Global-context function; never resolves to a module function.
    Builtin(String),
}

impl Dependency {
    /// The string stored in the caller's dependency set.
    pub fn into_key(self, module_name: &str) -> String {
        match self {
            Dependency::Local(name) => format!("{}.{}", module_name, name),
            Dependency::Chain(path) | Dependency::Builtin(path) => path,
        }
    }
}

/// Classify one statement. Anything that is not a call yields `None`.
pub fn classify(stmt: &Statement) -> Option<Dependency> {
    match stmt {
        Statement::Method(m) => Some(Dependency::Local(m.name.clone())),
        Statement::Builtin(m) => Some(Dependency::Builtin(m.name.clone())),
        Statement::CallChain(chain) if chain.is_method() => {
            Some(Dependency::Chain(flatten_call_chain(stmt)))
        }
        _ => None,
    }
}

/// Join a member chain into one dotted name.
///
/// Variables and calls contribute their bare name; other link kinds
/// (index, literal, `New`) contribute an empty segment.
pub fn flatten_call_chain(stmt: &Statement) -> String {
    match stmt {
        Statement::CallChain(chain) => format!(
            "{}.{}",
            flatten_call_chain(&chain.call),
            flatten_call_chain(&chain.unit)
        ),
        Statement::Var(name) => name.clone(),
        Statement::Method(m) | Statement::Builtin(m) => m.name.clone(),
        _ => String::new(),
    }
}
