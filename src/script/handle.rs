use std::cell::RefCell;
use std::fmt;

use rhai::{Dynamic, EvalAltResult, Position};

use crate::error::BuildError;
use crate::graph::{GraphBuilder, NodeId, Operand};

/*
Builder Scopes
==============

Script functions do not receive a builder argument. Instead, the thread that
evaluates a script keeps a stack of builders: the patch builder at the
bottom and one nested builder per template body being evaluated.

    patch  ─── template("voice") ─── (closure running)
    depth 0     depth 1

Every handle remembers the depth it was created at. A handle can only be
used at that depth: template bodies are separate graphs, so outer nodes are
passed in as named arguments instead.
*/

pub(crate) type ScriptResult<T> = Result<T, Box<EvalAltResult>>;

thread_local! {
    static SCOPES: RefCell<Vec<GraphBuilder>> = const { RefCell::new(Vec::new()) };
}

/// A node of the graph being built, as seen by a script.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct NodeRef {
    id: NodeId,
    depth: usize,
}

impl NodeRef {
    pub fn id(&self) -> NodeId {
        self.id
    }
}

impl fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.id.index())
    }
}

pub(crate) fn script_error(message: impl Into<String>) -> Box<EvalAltResult> {
    Box::new(EvalAltResult::ErrorRuntime(
        message.into().into(),
        Position::NONE,
    ))
}

pub(crate) fn build_error(err: BuildError) -> Box<EvalAltResult> {
    script_error(err.to_string())
}

/// Make `builder` the innermost scope until the guard is dropped.
pub(crate) fn enter(builder: GraphBuilder) -> ScopeGuard {
    SCOPES.with(|scopes| scopes.borrow_mut().push(builder));
    ScopeGuard { done: false }
}

pub(crate) struct ScopeGuard {
    done: bool,
}

impl ScopeGuard {
    /// Leave the scope and take its builder back.
    pub(crate) fn leave(mut self) -> Option<GraphBuilder> {
        self.done = true;
        SCOPES.with(|scopes| scopes.borrow_mut().pop())
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        if !self.done {
            SCOPES.with(|scopes| scopes.borrow_mut().pop());
        }
    }
}

fn depth() -> usize {
    SCOPES.with(|scopes| scopes.borrow().len().saturating_sub(1))
}

/// Run `f` against the innermost builder.
pub(crate) fn with_builder<R>(f: impl FnOnce(&mut GraphBuilder) -> R) -> ScriptResult<R> {
    SCOPES.with(|scopes| match scopes.borrow_mut().last_mut() {
        Some(builder) => Ok(f(builder)),
        None => Err(script_error("graph functions can only be used while building a patch")),
    })
}

/// Add a node to the innermost builder and wrap it as a handle.
pub(crate) fn emit(f: impl FnOnce(&mut GraphBuilder) -> NodeId) -> ScriptResult<NodeRef> {
    let depth = depth();
    let id = with_builder(f)?;
    Ok(NodeRef { id, depth })
}

pub(crate) fn node_operand(node: NodeRef) -> ScriptResult<Operand> {
    if node.depth != depth() {
        return Err(script_error(format!(
            "{:?} belongs to an enclosing graph; pass it to the template as an argument",
            node
        )));
    }
    Ok(Operand::Node(node.id))
}

/// Coerce a script value into an operand: handles stay nodes, numbers
/// become constants, strings become symbol loads.
pub(crate) fn operand(value: Dynamic) -> ScriptResult<Operand> {
    if value.is::<NodeRef>() {
        let node = value.cast::<NodeRef>();
        return node_operand(node);
    }
    if let Ok(x) = value.as_float() {
        return Ok(Operand::Const(x));
    }
    if let Ok(n) = value.as_int() {
        return Ok(Operand::Const(n as f64));
    }
    if value.is_string() {
        let name = value
            .into_string()
            .map_err(|t| script_error(format!("expected a string, got {}", t)))?;
        return Ok(Operand::Symbol(name));
    }
    Err(script_error(format!(
        "expected a node, number or symbol name, got {}",
        value.type_name()
    )))
}

pub(crate) fn operands(values: rhai::Array) -> ScriptResult<Vec<Operand>> {
    values.into_iter().map(operand).collect()
}

pub(crate) fn number(value: &Dynamic) -> ScriptResult<f64> {
    value
        .as_float()
        .or_else(|_| value.as_int().map(|n| n as f64))
        .map_err(|t| script_error(format!("expected a number, got {}", t)))
}

pub(crate) fn numbers(values: &rhai::Array) -> ScriptResult<Vec<f64>> {
    values.iter().map(number).collect()
}
