//! Scope tracking for early duplicate-declaration errors.
//!
//! Scopes live in an arena and refer to their parent by [`ScopeId`], so a
//! child never borrows its parent. Each scope keeps three name tables:
//!
//! - `lexicals`: names declared in this scope by `let`, `const`, `class`,
//!   block-level functions, parameters, catch parameters and imports;
//! - `lexvars`: every `var` (or var-scoped function) name that was declared
//!   in this scope or hoisted through it, so a later lexical declaration
//!   here can see it. At a function root this is the function's var table;
//! - `funcs`: plain function declarations, consulted by the web-compat rule
//!   that lets sloppy sibling block functions share a name.
//!
//! Every rule looks at no more than the current scope and one link of its
//! chain, which is what makes the checks incremental.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::ast::Identifier;
use crate::error::{ErrorKind, ParseError};
use crate::span::Span;

/// Index of a scope in the [`ScopeTree`] arena.
pub type ScopeId = usize;

/// Kind of scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// Script or module top level.
    Program,
    /// Top-level statement list of a function (the var boundary).
    FunctionBody,
    /// Formal parameter list.
    ParamList,
    /// `{ ... }` block, also class static blocks.
    Block,
    /// Head of a `for` statement with `let`/`const`.
    For,
    /// Catch clause parameter.
    Catch,
    /// Case block of a `switch`.
    Switch,
}

impl ScopeKind {
    /// `var` declarations hoist no further than this scope.
    fn is_var_boundary(self) -> bool {
        matches!(self, ScopeKind::Program | ScopeKind::FunctionBody)
    }
}

/// How a name was bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Var,
    Let,
    Const,
    Class,
    /// Plain `function` declaration.
    Function,
    /// `async function` or `function*` declaration.
    SpecialFunction,
    Param,
    CatchParam,
    Import,
}

/// First sighting of a name in a table is `Undeclared`, any later one `Redeclared`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Undeclared,
    Redeclared,
}

#[derive(Debug, Clone, Copy)]
struct LexicalEntry {
    kind: BindingKind,
    status: Status,
    /// Span of the most recent declaration.
    span: Span,
}

/// A single scope.
#[derive(Debug)]
pub struct Scope {
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    lexicals: FxHashMap<String, LexicalEntry>,
    lexvars: FxHashMap<String, Status>,
    funcs: FxHashMap<String, Status>,
    /// Catch scope whose parameter is a single identifier.
    simple_catch: bool,
    /// Parameter names in order, including duplicates.
    params: Vec<(String, Span)>,
}

impl Scope {
    fn new(kind: ScopeKind, parent: Option<ScopeId>) -> Self {
        Self {
            kind,
            parent,
            lexicals: FxHashMap::default(),
            lexvars: FxHashMap::default(),
            funcs: FxHashMap::default(),
            simple_catch: false,
            params: Vec::new(),
        }
    }
}

#[cfg(test)]
impl Scope {
    /// Whether `name` is bound lexically in this scope.
    pub fn has_lexical(&self, name: &str) -> bool {
        self.lexicals.contains_key(name)
    }

    /// Whether a `var` named `name` is declared in or hoisted through this scope.
    pub fn has_var(&self, name: &str) -> bool {
        self.lexvars.contains_key(name)
    }
}

/// Extra facts about a declaration site.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclFlags {
    /// The surrounding code is strict.
    pub strict: bool,
    /// The `var` is the head of a `for-of` loop.
    pub for_of: bool,
}

/// Arena of all scopes created during one parse.
#[derive(Debug)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
    webcompat: bool,
}

impl ScopeTree {
    pub fn new(webcompat: bool) -> Self {
        Self {
            scopes: Vec::new(),
            webcompat,
        }
    }

    /// Create a scope and return its id.
    pub fn create(&mut self, kind: ScopeKind, parent: Option<ScopeId>) -> ScopeId {
        let id = self.scopes.len();
        self.scopes.push(Scope::new(kind, parent));
        tracing::trace!(scope = id, ?kind, ?parent, "enter scope");
        id
    }

    #[cfg(test)]
    pub fn get(&self, id: ScopeId) -> &Scope {
        &self.scopes[id]
    }

    /// Mark a catch scope as having a single-identifier parameter.
    pub fn set_simple_catch(&mut self, id: ScopeId) {
        self.scopes[id].simple_catch = true;
    }

    /// Register `name` in `scope`. `Var` walks outward to the var boundary;
    /// every other kind is lexical.
    pub fn declare_binding(
        &mut self,
        scope: ScopeId,
        name: &str,
        kind: BindingKind,
        span: Span,
        flags: DeclFlags,
    ) -> Result<(), ParseError> {
        match kind {
            BindingKind::Var => self.declare_var(scope, name, span, flags, false),
            BindingKind::Param | BindingKind::CatchParam => {
                self.declare_unbound_variable(scope, name, kind, span);
                Ok(())
            }
            _ => self.declare_and_dedupe(scope, name, kind, span, flags),
        }
    }

    /// Lexical declaration checked immediately: against this scope's own
    /// lexical and var tables, and against a parameter list or catch
    /// parameter directly above it.
    pub fn declare_and_dedupe(
        &mut self,
        scope: ScopeId,
        name: &str,
        kind: BindingKind,
        span: Span,
        flags: DeclFlags,
    ) -> Result<(), ParseError> {
        let lenient = self.webcompat && !flags.strict && kind == BindingKind::Function;
        let current = &self.scopes[scope];

        if let Some(existing) = current.lexicals.get(name) {
            let sibling_functions =
                existing.kind == BindingKind::Function && current.funcs.contains_key(name);
            if !(lenient && sibling_functions) {
                return Err(duplicate(name, span));
            }
        }
        if current.lexvars.contains_key(name) {
            return Err(duplicate(name, span));
        }
        if let Some(parent) = current.parent {
            let parent = &self.scopes[parent];
            if matches!(parent.kind, ScopeKind::ParamList | ScopeKind::Catch)
                && parent.lexicals.contains_key(name)
            {
                return Err(duplicate(name, span));
            }
        }

        let current = &mut self.scopes[scope];
        mark(&mut current.lexicals, name, kind, span);
        if kind == BindingKind::Function {
            bump(&mut current.funcs, name);
        }
        Ok(())
    }

    /// Record a parameter or catch parameter without checking for
    /// duplicates; [`check_parameter_list`](Self::check_parameter_list) or
    /// [`check_conflicts`](Self::check_conflicts) runs once the list is complete.
    pub fn declare_unbound_variable(
        &mut self,
        scope: ScopeId,
        name: &str,
        kind: BindingKind,
        span: Span,
    ) {
        let current = &mut self.scopes[scope];
        mark(&mut current.lexicals, name, kind, span);
        if kind == BindingKind::Param {
            current.params.push((name.to_string(), span));
        }
    }

    /// Function declaration. Var-scoped at the top of a script or function
    /// body, lexical everywhere else (blocks, switch cases, module top level).
    pub fn register_function_name(
        &mut self,
        scope: ScopeId,
        name: &str,
        kind: BindingKind,
        span: Span,
        flags: DeclFlags,
        module: bool,
    ) -> Result<(), ParseError> {
        let scope_kind = self.scopes[scope].kind;
        let var_scoped = scope_kind == ScopeKind::FunctionBody
            || (scope_kind == ScopeKind::Program && !module);
        if var_scoped {
            self.declare_var(scope, name, span, flags, true)
        } else {
            self.declare_and_dedupe(scope, name, kind, span, flags)
        }
    }

    fn declare_var(
        &mut self,
        scope: ScopeId,
        name: &str,
        span: Span,
        flags: DeclFlags,
        is_function: bool,
    ) -> Result<(), ParseError> {
        let mut id = scope;
        loop {
            let current = &self.scopes[id];
            if current.lexicals.contains_key(name) {
                // `var e` may shadow a simple `catch (e)` parameter, except in a for-of head
                let tolerated = current.kind == ScopeKind::Catch
                    && current.simple_catch
                    && !flags.for_of
                    && !is_function;
                if !tolerated {
                    return Err(duplicate(name, span));
                }
            }
            let boundary = current.kind.is_var_boundary();
            let parent = current.parent;
            bump(&mut self.scopes[id].lexvars, name);
            match parent {
                Some(parent) if !boundary => id = parent,
                _ => return Ok(()),
            }
        }
    }

    /// Sweep a scope for names bound more than once. With
    /// `check_against_parent`, also reject names that clash with the var
    /// table or with a parameter list / catch parameter directly above.
    pub fn check_conflicts(
        &self,
        scope: ScopeId,
        check_against_parent: bool,
    ) -> Result<(), ParseError> {
        let current = &self.scopes[scope];
        let mut entries: Vec<_> = current.lexicals.iter().collect();
        entries.sort_by_key(|(_, entry)| entry.span.start);
        for (name, entry) in entries {
            if entry.status == Status::Redeclared {
                return Err(duplicate(name, entry.span));
            }
            if check_against_parent {
                if current.lexvars.contains_key(name.as_str()) {
                    return Err(duplicate(name, entry.span));
                }
                if let Some(parent) = current.parent {
                    let parent = &self.scopes[parent];
                    if matches!(parent.kind, ScopeKind::ParamList | ScopeKind::Catch)
                        && parent.lexicals.contains_key(name.as_str())
                    {
                        return Err(duplicate(name, entry.span));
                    }
                }
            }
        }
        Ok(())
    }

    /// Reject a parameter name that occurs twice. Callers skip this for
    /// simple parameter lists of sloppy plain functions.
    pub fn check_parameter_list(&self, param_scope: ScopeId) -> Result<(), ParseError> {
        let mut seen = FxHashSet::default();
        for (name, span) in &self.scopes[param_scope].params {
            if !seen.insert(name.as_str()) {
                return Err(ParseError::new(
                    ErrorKind::DuplicateParameter(name.clone()),
                    *span,
                ));
            }
        }
        Ok(())
    }
}

fn duplicate(name: &str, span: Span) -> ParseError {
    ParseError::new(ErrorKind::DuplicateBinding(name.to_string()), span)
}

fn mark(table: &mut FxHashMap<String, LexicalEntry>, name: &str, kind: BindingKind, span: Span) {
    match table.get_mut(name) {
        Some(entry) => {
            entry.status = Status::Redeclared;
            entry.kind = kind;
            entry.span = span;
        }
        None => {
            table.insert(
                name.to_string(),
                LexicalEntry {
                    kind,
                    status: Status::Undeclared,
                    span,
                },
            );
        }
    }
}

fn bump(table: &mut FxHashMap<String, Status>, name: &str) {
    table
        .entry(name.to_string())
        .and_modify(|status| *status = Status::Redeclared)
        .or_insert(Status::Undeclared);
}

/// Export bookkeeping for module code.
#[derive(Debug, Default)]
pub struct ExportTracker {
    names: FxHashSet<String>,
    bindings: Vec<Identifier>,
}

impl ExportTracker {
    /// Exported names must be unique across the module.
    pub fn record_exported_name(&mut self, name: &str, span: Span) -> Result<(), ParseError> {
        if !self.names.insert(name.to_string()) {
            return Err(ParseError::new(
                ErrorKind::DuplicateExport(name.to_string()),
                span,
            ));
        }
        Ok(())
    }

    /// Local bindings behind exports. Never rejected.
    pub fn record_exported_binding(&mut self, name: &str, span: Span) {
        self.bindings.push(Identifier::new(name, span));
    }

    /// Hand over the recorded bindings, in source order.
    pub fn take_bindings(&mut self) -> Vec<Identifier> {
        std::mem::take(&mut self.bindings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SLOPPY: DeclFlags = DeclFlags { strict: false, for_of: false };
    const STRICT: DeclFlags = DeclFlags { strict: true, for_of: false };

    fn span(at: u32) -> Span {
        Span::new(at, at + 1)
    }

    fn function_scopes(tree: &mut ScopeTree) -> (ScopeId, ScopeId) {
        let params = tree.create(ScopeKind::ParamList, None);
        let body = tree.create(ScopeKind::FunctionBody, Some(params));
        (params, body)
    }

    #[test]
    fn test_duplicate_lexical_in_same_block() {
        let mut tree = ScopeTree::new(false);
        let root = tree.create(ScopeKind::Program, None);
        tree.declare_binding(root, "a", BindingKind::Let, span(0), SLOPPY).unwrap();
        let err = tree
            .declare_binding(root, "a", BindingKind::Const, span(5), SLOPPY)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::DuplicateBinding("a".into()));
        assert_eq!(err.span, span(5));
    }

    #[test]
    fn test_var_nested_inside_let_block_conflicts() {
        let mut tree = ScopeTree::new(false);
        let root = tree.create(ScopeKind::Program, None);
        let block = tree.create(ScopeKind::Block, Some(root));
        let inner = tree.create(ScopeKind::Block, Some(block));
        tree.declare_binding(block, "x", BindingKind::Let, span(0), SLOPPY).unwrap();
        assert!(tree.declare_binding(inner, "x", BindingKind::Var, span(9), SLOPPY).is_err());
    }

    #[test]
    fn test_let_after_hoisted_var_conflicts() {
        // { var x } let x
        let mut tree = ScopeTree::new(false);
        let root = tree.create(ScopeKind::Program, None);
        let block = tree.create(ScopeKind::Block, Some(root));
        tree.declare_binding(block, "x", BindingKind::Var, span(2), SLOPPY).unwrap();
        assert!(tree.get(root).has_var("x"));
        assert!(tree.declare_binding(root, "x", BindingKind::Let, span(12), SLOPPY).is_err());

        // { var y } { let y } is fine
        let sibling = tree.create(ScopeKind::Block, Some(root));
        tree.declare_binding(block, "y", BindingKind::Var, span(20), SLOPPY).unwrap();
        tree.declare_binding(sibling, "y", BindingKind::Let, span(30), SLOPPY).unwrap();
    }

    #[test]
    fn test_var_redeclaration_is_fine() {
        let mut tree = ScopeTree::new(false);
        let root = tree.create(ScopeKind::Program, None);
        tree.declare_binding(root, "v", BindingKind::Var, span(0), STRICT).unwrap();
        tree.declare_binding(root, "v", BindingKind::Var, span(4), STRICT).unwrap();
    }

    #[test]
    fn test_sibling_block_functions_need_webcompat() {
        for (webcompat, flags, ok) in [(true, SLOPPY, true), (false, SLOPPY, false), (true, STRICT, false)] {
            let mut tree = ScopeTree::new(webcompat);
            let root = tree.create(ScopeKind::Program, None);
            let block = tree.create(ScopeKind::Block, Some(root));
            tree.register_function_name(block, "f", BindingKind::Function, span(0), flags, false)
                .unwrap();
            let second =
                tree.register_function_name(block, "f", BindingKind::Function, span(9), flags, false);
            assert_eq!(second.is_ok(), ok, "webcompat={webcompat} strict={}", flags.strict);
        }
    }

    #[test]
    fn test_block_function_still_rejects_let() {
        let mut tree = ScopeTree::new(true);
        let root = tree.create(ScopeKind::Program, None);
        let block = tree.create(ScopeKind::Block, Some(root));
        tree.register_function_name(block, "f", BindingKind::Function, span(0), SLOPPY, false)
            .unwrap();
        assert!(tree.declare_binding(block, "f", BindingKind::Let, span(9), SLOPPY).is_err());
        let other = tree.create(ScopeKind::Block, Some(root));
        tree.register_function_name(other, "g", BindingKind::SpecialFunction, span(20), SLOPPY, false)
            .unwrap();
        assert!(tree
            .register_function_name(other, "g", BindingKind::Function, span(30), SLOPPY, false)
            .is_err());
    }

    #[test]
    fn test_top_level_functions_are_var_scoped_in_scripts() {
        let mut tree = ScopeTree::new(false);
        let root = tree.create(ScopeKind::Program, None);
        tree.register_function_name(root, "f", BindingKind::Function, span(0), SLOPPY, false)
            .unwrap();
        tree.register_function_name(root, "f", BindingKind::Function, span(5), SLOPPY, false)
            .unwrap();
        tree.declare_binding(root, "f", BindingKind::Var, span(9), SLOPPY).unwrap();
        assert!(tree.declare_binding(root, "f", BindingKind::Let, span(12), SLOPPY).is_err());

        let mut module = ScopeTree::new(false);
        let root = module.create(ScopeKind::Program, None);
        module
            .register_function_name(root, "f", BindingKind::Function, span(0), STRICT, true)
            .unwrap();
        assert!(module
            .register_function_name(root, "f", BindingKind::Function, span(5), STRICT, true)
            .is_err());
    }

    #[test]
    fn test_body_lexical_conflicts_with_parameter() {
        let mut tree = ScopeTree::new(false);
        let (params, body) = function_scopes(&mut tree);
        tree.declare_binding(params, "a", BindingKind::Param, span(0), SLOPPY).unwrap();
        tree.declare_binding(body, "b", BindingKind::Var, span(3), SLOPPY).unwrap();
        tree.declare_binding(body, "a", BindingKind::Var, span(5), SLOPPY).unwrap();
        assert!(tree.declare_binding(body, "a", BindingKind::Let, span(9), SLOPPY).is_err());
    }

    #[test]
    fn test_parameter_list_duplicates() {
        let mut tree = ScopeTree::new(false);
        let (params, _) = function_scopes(&mut tree);
        tree.declare_unbound_variable(params, "a", BindingKind::Param, span(0));
        tree.declare_unbound_variable(params, "b", BindingKind::Param, span(2));
        tree.check_parameter_list(params).unwrap();
        tree.declare_unbound_variable(params, "a", BindingKind::Param, span(4));
        let err = tree.check_parameter_list(params).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DuplicateParameter("a".into()));
        assert_eq!(err.span, span(4));
    }

    #[test]
    fn test_catch_parameter_rules() {
        let mut tree = ScopeTree::new(false);
        let root = tree.create(ScopeKind::Program, None);
        let catch = tree.create(ScopeKind::Catch, Some(root));
        tree.set_simple_catch(catch);
        tree.declare_unbound_variable(catch, "e", BindingKind::CatchParam, span(0));
        tree.check_conflicts(catch, false).unwrap();
        let body = tree.create(ScopeKind::Block, Some(catch));

        tree.declare_binding(body, "e", BindingKind::Var, span(5), SLOPPY).unwrap();
        let for_of = DeclFlags { for_of: true, ..SLOPPY };
        assert!(tree.declare_binding(body, "e", BindingKind::Var, span(9), for_of).is_err());
        assert!(tree.declare_binding(body, "e", BindingKind::Let, span(12), SLOPPY).is_err());
    }

    #[test]
    fn test_destructured_catch_parameter_rejects_var() {
        let mut tree = ScopeTree::new(false);
        let root = tree.create(ScopeKind::Program, None);
        let catch = tree.create(ScopeKind::Catch, Some(root));
        tree.declare_unbound_variable(catch, "e", BindingKind::CatchParam, span(0));
        tree.declare_unbound_variable(catch, "e", BindingKind::CatchParam, span(3));
        assert!(tree.check_conflicts(catch, false).is_err());

        let catch = tree.create(ScopeKind::Catch, Some(root));
        tree.declare_unbound_variable(catch, "x", BindingKind::CatchParam, span(10));
        let body = tree.create(ScopeKind::Block, Some(catch));
        assert!(tree.declare_binding(body, "x", BindingKind::Var, span(20), SLOPPY).is_err());
    }

    #[test]
    fn test_var_stops_at_function_boundary() {
        let mut tree = ScopeTree::new(false);
        let root = tree.create(ScopeKind::Program, None);
        tree.declare_binding(root, "x", BindingKind::Let, span(0), SLOPPY).unwrap();
        let params = tree.create(ScopeKind::ParamList, None);
        let body = tree.create(ScopeKind::FunctionBody, Some(params));
        tree.declare_binding(body, "x", BindingKind::Var, span(9), SLOPPY).unwrap();
        assert!(!tree.get(root).has_var("x"));
    }

    #[test]
    fn test_exports() {
        let mut exports = ExportTracker::default();
        exports.record_exported_name("a", span(0)).unwrap();
        exports.record_exported_name("default", span(2)).unwrap();
        let err = exports.record_exported_name("a", span(4)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DuplicateExport("a".into()));
        exports.record_exported_binding("x", span(6));
        exports.record_exported_binding("x", span(8));
        let bindings = exports.take_bindings();
        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings[1].span, span(8));
    }
}
