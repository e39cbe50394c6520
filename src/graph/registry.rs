//! Function registry: one record per qualified name, ids fixed at first sighting.

use indexmap::IndexSet;
use serde::Serialize;
use std::collections::HashMap;
use tracing::trace;

use super::resolver;
use crate::parser::ast::{FunctionOrProcedure, ModuleTree, Statement};

/// Everything known about one function after walking the corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionInfo {
    /// Dense id in first-seen order.
    pub id: usize,
    /// `Module.Function`.
    pub qualified_name: String,
    /// Body length plus one for the implicit entry/exit point.
    pub statement_count: usize,
    pub exported: bool,
    pub module_name: String,
    /// Dependency strings in first-seen order, without duplicates.
    pub dependencies: IndexSet<String>,
    pub inbound_reference_count: usize,
    pub used: bool,
}

impl FunctionInfo {
    fn new(id: usize, qualified_name: String, module_name: &str, exported: bool) -> Self {
        Self {
            id,
            qualified_name,
            statement_count: 0,
            exported,
            module_name: module_name.to_string(),
            dependencies: IndexSet::new(),
            inbound_reference_count: 0,
            used: false,
        }
    }

    /// Name without the module prefix.
    pub fn name(&self) -> &str {
        self.qualified_name
            .strip_prefix(self.module_name.as_str())
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(&self.qualified_name)
    }
}

/// Growable table of functions indexed by id, with a name → id lookup.
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    functions: Vec<FunctionInfo>,
    by_name: HashMap<String, usize>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Walk a whole module and record every statement owned by a function.
    pub fn ingest(&mut self, module: &ModuleTree) {
        let module_name = module.name.as_str();
        module.walk(|current, stmt| self.observe(module_name, current, stmt));
    }

    /// Record one (enclosing function, statement) pair. Module-level
    /// statements (`current == None`) are ignored.
    pub fn observe(
        &mut self,
        module_name: &str,
        current: Option<&FunctionOrProcedure>,
        stmt: &Statement,
    ) {
        let Some(current) = current else {
            return;
        };

        let id = self.intern(module_name, current);
        let info = &mut self.functions[id];

        if let Some(dependency) = resolver::classify(stmt) {
            info.dependencies.insert(dependency.into_key(module_name));
        }

        if let Statement::FunctionOrProcedure(f) = stmt {
            info.statement_count = f.body.len() + 1;
        }
    }

    /// Id for `module_name.function`, creating the record on first sighting.
    fn intern(&mut self, module_name: &str, function: &FunctionOrProcedure) -> usize {
        let key = format!("{}.{}", module_name, function.name);
        if let Some(&id) = self.by_name.get(&key) {
            return id;
        }

        let id = self.functions.len();
        trace!(id, function = %key, "registering function");
        self.functions
            .push(FunctionInfo::new(id, key.clone(), module_name, function.export));
        self.by_name.insert(key, id);
        id
    }

    pub fn id_of(&self, qualified_name: &str) -> Option<usize> {
        self.by_name.get(qualified_name).copied()
    }

    pub fn get(&self, qualified_name: &str) -> Option<&FunctionInfo> {
        self.id_of(qualified_name).map(|id| &self.functions[id])
    }

    pub fn by_id(&self, id: usize) -> Option<&FunctionInfo> {
        self.functions.get(id)
    }

    /// Records in id order.
    pub fn iter(&self) -> impl Iterator<Item = &FunctionInfo> {
        self.functions.iter()
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub(crate) fn into_parts(self) -> (Vec<FunctionInfo>, HashMap<String, usize>) {
        (self.functions, self.by_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::{CallChainStatement, FunctionKind, MethodStatement};

    fn function(name: &str, export: bool, body: Vec<Statement>) -> Statement {
        Statement::FunctionOrProcedure(FunctionOrProcedure {
            kind: FunctionKind::Procedure,
            name: name.to_string(),
            export,
            is_async: false,
            params: vec![],
            body,
        })
    }

    fn call(name: &str) -> Statement {
        Statement::Method(MethodStatement {
            name: name.to_string(),
            args: vec![],
        })
    }

    fn module(name: &str, body: Vec<Statement>) -> ModuleTree {
        ModuleTree {
            name: name.to_string(),
            body,
        }
    }

    #[test]
    fn test_ids_are_dense_in_first_seen_order() {
        let mut registry = FunctionRegistry::new();
        registry.ingest(&module("А", vec![function("Один", false, vec![]), function("Два", false, vec![])]));
        registry.ingest(&module("Б", vec![function("Три", true, vec![])]));

        let ids: Vec<(usize, &str)> = registry
            .iter()
            .map(|f| (f.id, f.qualified_name.as_str()))
            .collect();
        assert_eq!(ids, vec![(0, "А.Один"), (1, "А.Два"), (2, "Б.Три")]);
        assert!(registry.get("Б.Три").unwrap().exported);
        assert_eq!(registry.by_id(1).unwrap().name(), "Два");
    }

    #[test]
    fn test_id_fixed_on_later_sightings() {
        let mut registry = FunctionRegistry::new();
        registry.ingest(&module("А", vec![function("Ф", false, vec![call("Х")])]));
        registry.ingest(&module("Б", vec![function("Г", false, vec![])]));
        // Same qualified name seen again from another file.
        registry.ingest(&module("А", vec![function("Ф", false, vec![call("Y")])]));

        assert_eq!(registry.len(), 2);
        let f = registry.get("А.Ф").unwrap();
        assert_eq!(f.id, 0);
        assert_eq!(
            f.dependencies.iter().collect::<Vec<_>>(),
            vec!["А.Х", "А.Y"]
        );
    }

    #[test]
    fn test_statement_count_is_body_plus_one() {
        let mut registry = FunctionRegistry::new();
        registry.ingest(&module(
            "А",
            vec![
                function("Пустая", false, vec![]),
                function("Три", false, vec![call("а"), call("б"), Statement::Break]),
            ],
        ));
        assert_eq!(registry.get("А.Пустая").unwrap().statement_count, 1);
        assert_eq!(registry.get("А.Три").unwrap().statement_count, 4);
    }

    #[test]
    fn test_dependencies_deduplicated_in_order() {
        let mut registry = FunctionRegistry::new();
        let chain = Statement::CallChain(CallChainStatement {
            call: Box::new(Statement::Var("Б".to_string())),
            unit: Box::new(call("Бар")),
        });
        registry.ingest(&module(
            "А",
            vec![function(
                "Ф",
                false,
                vec![call("Х"), chain.clone(), call("Х"), chain],
            )],
        ));
        let deps: Vec<&String> = registry.get("А.Ф").unwrap().dependencies.iter().collect();
        assert_eq!(deps, vec!["А.Х", "Б.Бар"]);
    }

    #[test]
    fn test_module_level_statements_ignored() {
        let mut registry = FunctionRegistry::new();
        registry.ingest(&module("А", vec![call("Инициализировать")]));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_new_record_defaults() {
        let mut registry = FunctionRegistry::new();
        registry.ingest(&module("А", vec![function("Ф", false, vec![])]));
        let f = registry.get("А.Ф").unwrap();
        assert_eq!(f.inbound_reference_count, 0);
        assert!(!f.used);
        assert_eq!(f.module_name, "А");
    }
}
