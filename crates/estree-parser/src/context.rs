//! Parser options and the per-construct parsing context.
//!
//! [`ParserOptions`] is what callers pass in. [`Context`] is derived from it
//! once per parse and then copied by value into every parsing function;
//! nested constructs (functions, loops, classes) get modified copies from
//! the builder methods, so leaving a construct restores the outer flags.

use serde::{Deserialize, Serialize};

use crate::scope::ScopeId;

/// Goal symbol of the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    #[default]
    Script,
    Module,
}

impl SourceType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Script => "script",
            Self::Module => "module",
        }
    }
}

/// Parser configuration options.
///
/// Deserializes from the usual camelCase option object:
/// `{"sourceType": "module", "preserveParens": true}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParserOptions {
    /// Parse as a script or as an ECMAScript module.
    pub source_type: SourceType,
    /// Start in strict mode even without a `"use strict"` directive.
    pub strict: bool,
    /// Enable JSX elements and fragments.
    pub jsx: bool,
    /// Enable proposal syntax: import attributes, decorators, `import(x, options)`.
    pub next: bool,
    /// Annex B leniency: duplicate sloppy block functions, `if (x) function f() {}`,
    /// HTML-like comments.
    pub webcompat: bool,
    /// Add `start`, `end` and `range` to every ESTree node.
    pub ranges: bool,
    /// Add `loc` line/column info to every ESTree node.
    pub loc: bool,
    /// Keep the original source text of literals as `raw`.
    pub raw: bool,
    /// Emit `ParenthesizedExpression` nodes.
    pub preserve_parens: bool,
}

impl ParserOptions {
    /// Options for an ES module.
    #[must_use]
    pub fn module() -> Self {
        Self::default().with_source_type(SourceType::Module)
    }

    /// Set the goal symbol.
    #[must_use]
    pub fn with_source_type(mut self, source_type: SourceType) -> Self {
        self.source_type = source_type;
        self
    }

    /// Force strict mode.
    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Enable JSX.
    #[must_use]
    pub fn with_jsx(mut self, jsx: bool) -> Self {
        self.jsx = jsx;
        self
    }

    /// Enable proposal syntax.
    #[must_use]
    pub fn with_next(mut self, next: bool) -> Self {
        self.next = next;
        self
    }

    /// Enable web-compatibility leniency.
    #[must_use]
    pub fn with_webcompat(mut self, webcompat: bool) -> Self {
        self.webcompat = webcompat;
        self
    }

    /// Attach byte ranges to output nodes.
    #[must_use]
    pub fn with_ranges(mut self, ranges: bool) -> Self {
        self.ranges = ranges;
        self
    }

    /// Attach line/column locations to output nodes.
    #[must_use]
    pub fn with_loc(mut self, loc: bool) -> Self {
        self.loc = loc;
        self
    }

    /// Keep raw literal text.
    #[must_use]
    pub fn with_raw(mut self, raw: bool) -> Self {
        self.raw = raw;
        self
    }

    /// Keep parentheses as nodes.
    #[must_use]
    pub fn with_preserve_parens(mut self, preserve_parens: bool) -> Self {
        self.preserve_parens = preserve_parens;
        self
    }

    pub(crate) fn is_module(&self) -> bool {
        self.source_type == SourceType::Module
    }
}

/// What kind of function body is being entered.
#[derive(Debug, Clone, Copy, Default)]
pub struct FunctionFlags {
    pub is_async: bool,
    pub is_generator: bool,
    pub is_arrow: bool,
    /// Object or class method: `super.x` is allowed.
    pub is_method: bool,
    /// Constructor of a class with `extends`: `super()` is allowed.
    pub is_derived_constructor: bool,
}

/// Flags in effect at the current parse position.
#[derive(Debug, Clone, Copy)]
pub struct Context {
    /// Innermost lexical scope.
    pub scope: ScopeId,
    pub strict: bool,
    pub module: bool,
    /// Directly at program level (import/export position).
    pub top_level: bool,
    /// `return` is allowed.
    pub in_function: bool,
    /// `yield` is an operator.
    pub in_generator: bool,
    /// `await` is an operator.
    pub in_async: bool,
    /// Parsing formal parameters: `yield`/`await` expressions are rejected.
    pub in_params: bool,
    /// Field initializer or static block: `arguments` is rejected.
    pub in_class_init: bool,
    /// Static block: `await` is rejected.
    pub in_static_block: bool,
    /// Unlabelled `continue` and `break` are allowed.
    pub in_iteration: bool,
    /// Unlabelled `break` is allowed.
    pub in_switch: bool,
    /// `in` is a binary operator (false in for-heads).
    pub allow_in: bool,
    pub allow_super_property: bool,
    pub allow_super_call: bool,
    pub allow_new_target: bool,
}

impl Context {
    /// Context for the top of a program.
    pub fn program(scope: ScopeId, options: &ParserOptions) -> Self {
        let module = options.is_module();
        Self {
            scope,
            strict: options.strict || module,
            module,
            top_level: true,
            in_function: false,
            in_generator: false,
            // top-level await
            in_async: module,
            in_params: false,
            in_class_init: false,
            in_static_block: false,
            in_iteration: false,
            in_switch: false,
            allow_in: true,
            allow_super_property: false,
            allow_super_call: false,
            allow_new_target: false,
        }
    }

    #[must_use]
    pub fn with_scope(mut self, scope: ScopeId) -> Self {
        self.scope = scope;
        self
    }

    #[must_use]
    pub fn with_strict(mut self) -> Self {
        self.strict = true;
        self
    }

    #[must_use]
    pub fn with_allow_in(mut self, allow_in: bool) -> Self {
        self.allow_in = allow_in;
        self
    }

    #[must_use]
    pub fn with_params(mut self, in_params: bool) -> Self {
        self.in_params = in_params;
        self
    }

    /// Leave the program top level (any nested statement list).
    #[must_use]
    pub fn nested(mut self) -> Self {
        self.top_level = false;
        self
    }

    /// Inside a loop body.
    #[must_use]
    pub fn enter_iteration(mut self) -> Self {
        self.in_iteration = true;
        self.top_level = false;
        self
    }

    /// Inside a switch case block.
    #[must_use]
    pub fn enter_switch(mut self) -> Self {
        self.in_switch = true;
        self.top_level = false;
        self
    }

    /// Parameters and body of a function. Arrows keep the enclosing
    /// `super`, `new.target` and `arguments` rules.
    #[must_use]
    pub fn enter_function(mut self, scope: ScopeId, flags: FunctionFlags) -> Self {
        self.scope = scope;
        self.top_level = false;
        self.in_function = true;
        self.in_generator = flags.is_generator;
        self.in_async = flags.is_async;
        self.in_params = false;
        self.in_iteration = false;
        self.in_switch = false;
        self.allow_in = true;
        if !flags.is_arrow {
            self.in_class_init = false;
            self.in_static_block = false;
            self.allow_super_property = flags.is_method;
            self.allow_super_call = flags.is_derived_constructor;
            self.allow_new_target = true;
        }
        self
    }

    /// Field initializers and static blocks: strict, `super.x` allowed,
    /// `arguments` rejected.
    #[must_use]
    pub fn enter_class_init(mut self, scope: ScopeId, static_block: bool) -> Self {
        self.scope = scope;
        self.strict = true;
        self.top_level = false;
        self.in_function = false;
        self.in_generator = false;
        self.in_async = false;
        self.in_params = false;
        self.in_class_init = true;
        self.in_static_block = static_block;
        self.in_iteration = false;
        self.in_switch = false;
        self.allow_in = true;
        self.allow_super_property = true;
        self.allow_super_call = false;
        self.allow_new_target = true;
        self
    }

    /// `await` cannot be an identifier here.
    pub fn await_reserved(&self) -> bool {
        self.module || self.in_async || self.in_static_block
    }

    /// `yield` cannot be an identifier here.
    pub fn yield_reserved(&self) -> bool {
        self.strict || self.in_generator
    }
}
