//! Statement tree produced by the parser, and the walker that feeds the
//! function registry.

/// One parsed source file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModuleTree {
    /// Module name. Parsers leave it empty; the corpus builder assigns it
    /// from the file path.
    pub name: String,
    /// Top-level statements: function definitions, variable declarations
    /// and module body code.
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    Procedure,
    Function,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub by_value: bool,
    pub default: Option<Statement>,
}

/// A function or procedure definition.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionOrProcedure {
    pub kind: FunctionKind,
    pub name: String,
    pub export: bool,
    pub is_async: bool,
    pub params: Vec<Param>,
    pub body: Vec<Statement>,
}

/// A named call: `Name(args)`. Skipped arguments (`F(1, , 3)`) are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodStatement {
    pub name: String,
    pub args: Vec<Option<Statement>>,
}

/// One link of a member-access chain.
///
/// `a.b.c()` is `CallChain { call: CallChain { call: Var(a), unit: Var(b) }, unit: Method(c) }`:
/// `unit` is the rightmost link and `call` everything to its left.
#[derive(Debug, Clone, PartialEq)]
pub struct CallChainStatement {
    pub unit: Box<Statement>,
    pub call: Box<Statement>,
}

impl CallChainStatement {
    /// Whether the chain ends in an invocation rather than a property read.
    pub fn is_method(&self) -> bool {
        matches!(*self.unit, Statement::Method(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(String),
    String(String),
    Date(String),
    Bool(bool),
    Undefined,
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalBlock {
    pub condition: Box<Statement>,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStatement {
    pub branch: ConditionalBlock,
    pub else_if: Vec<ConditionalBlock>,
    pub else_body: Option<Vec<Statement>>,
}

/// Every node of the tree. Expressions are statements too, so the walker
/// reports a call nested in a condition exactly like a call on its own line.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    FunctionOrProcedure(FunctionOrProcedure),
    VarDecl {
        names: Vec<String>,
        export: bool,
    },
    /// Call of a module-local (or otherwise unqualified) method.
    Method(MethodStatement),
    /// Call of a global-context function such as `Сообщить` or `СтрДлина`.
    Builtin(MethodStatement),
    CallChain(CallChainStatement),
    Var(String),
    Literal(Literal),
    Binary {
        left: Box<Statement>,
        op: BinaryOp,
        right: Box<Statement>,
    },
    Not(Box<Statement>),
    Neg(Box<Statement>),
    Await(Box<Statement>),
    New {
        type_name: Option<String>,
        args: Vec<Option<Statement>>,
    },
    Ternary {
        condition: Box<Statement>,
        then: Box<Statement>,
        otherwise: Box<Statement>,
    },
    Index {
        target: Box<Statement>,
        index: Box<Statement>,
    },
    Assignment {
        target: Box<Statement>,
        value: Box<Statement>,
    },
    If(IfStatement),
    While(ConditionalBlock),
    ForEach {
        variable: String,
        collection: Box<Statement>,
        body: Vec<Statement>,
    },
    For {
        variable: String,
        from: Box<Statement>,
        to: Box<Statement>,
        body: Vec<Statement>,
    },
    Try {
        body: Vec<Statement>,
        except: Vec<Statement>,
    },
    Return(Option<Box<Statement>>),
    Raise(Vec<Statement>),
    Break,
    Continue,
    Goto(String),
    Label(String),
}

impl Statement {
    /// Direct children in source order.
    ///
    /// For a call chain the children are the head link (when it is not a
    /// bare variable), the nearest inner prefix ending in a call, and the
    /// arguments of the links in between. Member links themselves are part
    /// of a chain's dependency string and are never children.
    pub fn children(&self) -> Vec<&Statement> {
        let mut out = Vec::new();
        match self {
            Statement::FunctionOrProcedure(f) => {
                out.extend(f.params.iter().filter_map(|p| p.default.as_ref()));
                out.extend(f.body.iter());
            }
            Statement::Method(m) | Statement::Builtin(m) => {
                out.extend(m.args.iter().flatten());
            }
            Statement::New { args, .. } => out.extend(args.iter().flatten()),
            Statement::CallChain(chain) => chain_children(chain, &mut out),
            Statement::Binary { left, right, .. } => {
                out.push(left);
                out.push(right);
            }
            Statement::Not(inner) | Statement::Neg(inner) | Statement::Await(inner) => {
                out.push(inner)
            }
            Statement::Ternary {
                condition,
                then,
                otherwise,
            } => {
                out.push(condition);
                out.push(then);
                out.push(otherwise);
            }
            Statement::Index { target, index } => {
                out.push(target);
                out.push(index);
            }
            Statement::Assignment { target, value } => {
                out.push(target);
                out.push(value);
            }
            Statement::If(stmt) => {
                for block in std::iter::once(&stmt.branch).chain(stmt.else_if.iter()) {
                    out.push(&block.condition);
                    out.extend(block.body.iter());
                }
                if let Some(body) = &stmt.else_body {
                    out.extend(body.iter());
                }
            }
            Statement::While(block) => {
                out.push(&block.condition);
                out.extend(block.body.iter());
            }
            Statement::ForEach {
                collection, body, ..
            } => {
                out.push(collection);
                out.extend(body.iter());
            }
            Statement::For { from, to, body, .. } => {
                out.push(from);
                out.push(to);
                out.extend(body.iter());
            }
            Statement::Try { body, except } => {
                out.extend(body.iter());
                out.extend(except.iter());
            }
            Statement::Return(value) => out.extend(value.as_deref()),
            Statement::Raise(args) => out.extend(args.iter()),
            Statement::VarDecl { .. }
            | Statement::Var(_)
            | Statement::Literal(_)
            | Statement::Break
            | Statement::Continue
            | Statement::Goto(_)
            | Statement::Label(_) => {}
        }
        out
    }
}

fn chain_children<'a>(chain: &'a CallChainStatement, out: &mut Vec<&'a Statement>) {
    match &*chain.call {
        // `M.F().X`: the inner invocation is a dependency of its own.
        prefix @ Statement::CallChain(inner) if inner.is_method() => out.push(prefix),
        Statement::CallChain(inner) => chain_children(inner, out),
        Statement::Var(_) => {}
        head => out.push(head),
    }
    if let Statement::Method(m) = &*chain.unit {
        out.extend(m.args.iter().flatten());
    }
}

impl ModuleTree {
    /// Visit every (enclosing function, statement) pair in the tree.
    ///
    /// A function definition is reported with itself as the enclosing
    /// function; statements outside any function are reported with `None`.
    pub fn walk<'a, F>(&'a self, mut visit: F)
    where
        F: FnMut(Option<&'a FunctionOrProcedure>, &'a Statement),
    {
        for stmt in &self.body {
            let current = match stmt {
                Statement::FunctionOrProcedure(f) => Some(f),
                _ => None,
            };
            walk_statement(current, stmt, &mut visit);
        }
    }

    /// Function definitions in source order.
    pub fn functions(&self) -> impl Iterator<Item = &FunctionOrProcedure> {
        self.body.iter().filter_map(|stmt| match stmt {
            Statement::FunctionOrProcedure(f) => Some(f),
            _ => None,
        })
    }
}

fn walk_statement<'a, F>(
    current: Option<&'a FunctionOrProcedure>,
    stmt: &'a Statement,
    visit: &mut F,
) where
    F: FnMut(Option<&'a FunctionOrProcedure>, &'a Statement),
{
    visit(current, stmt);
    for child in stmt.children() {
        walk_statement(current, child, visit);
    }
}
