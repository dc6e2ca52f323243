//! Tree-walking evaluator for lowered definition units.
//!
//! An [`Interpreter`] executes a [`Chunk`] with a unit's symbol table as its
//! globals. Imports and attribute lookups on namespaces go back through the
//! [`Resolver`], so code executed during a merge sees mounts, working copies
//! and partially built units exactly as the resolver presents them.

mod builtins;
mod methods;
mod ops;

use std::sync::Arc;

use stratum_core::ir::{Chunk, Expr, ImportPath, Stmt, Target};
use stratum_core::{
    DefinitionUnit, Function, NamespacePath, OverlayError, RuntimeError, ScriptFunction,
    SymbolTable, Value,
};

use crate::Resolver;

/// Activation record of one unit body or function call.
struct Frame {
    globals: SymbolTable,
    locals: Vec<Value>,
    anchor: Option<NamespacePath>,
    module: NamespacePath,
}

/// How a statement list finished.
enum Flow {
    Normal,
    Return(Value),
}

pub struct Interpreter<'r> {
    resolver: &'r Resolver,
    call_depth: usize,
}

impl<'r> Interpreter<'r> {
    pub fn new(resolver: &'r Resolver) -> Self {
        Self {
            resolver,
            call_depth: 0,
        }
    }

    /// Execute the top-level statements of `chunk` into `unit`'s table.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run_unit(&mut self, unit: &Arc<DefinitionUnit>, chunk: &Chunk) -> Result<(), RuntimeError> {
        let mut frame = Frame {
            globals: unit.table().clone(),
            locals: Vec::new(),
            anchor: unit.anchor(),
            module: unit.path().clone(),
        };
        self.exec_block(&mut frame, &chunk.body)?;
        Ok(())
    }

    /// Call any callable value.
    pub fn call_value(&mut self, callee: &Value, args: &[Value]) -> Result<Value, RuntimeError> {
        match callee {
            Value::Function(function) => self.call_function(function, args),
            other => Err(RuntimeError::NotCallable {
                type_name: other.type_name(),
            }),
        }
    }

    pub fn call_function(&mut self, function: &Function, args: &[Value]) -> Result<Value, RuntimeError> {
        match function {
            Function::Native(native) => native.call(args),
            Function::Script(script) => self.call_script(script, args),
        }
    }

    fn call_script(&mut self, function: &ScriptFunction, args: &[Value]) -> Result<Value, RuntimeError> {
        let proto = &function.proto;
        if args.len() != proto.params.len() {
            return Err(RuntimeError::Arity {
                function: function.name.to_string(),
                expected: proto.params.len().to_string(),
                found: args.len(),
            });
        }
        let globals = function
            .globals
            .upgrade()
            .ok_or_else(|| RuntimeError::DroppedNamespace {
                function: format!("{}.{}", function.module, function.name),
            })?;
        let limit = self.resolver.config().max_call_depth;
        if self.call_depth >= limit {
            return Err(RuntimeError::CallDepth { limit });
        }

        let mut locals = vec![Value::Null; proto.local_count as usize];
        for (slot, arg) in locals.iter_mut().zip(args) {
            *slot = arg.clone();
        }
        let mut frame = Frame {
            globals,
            locals,
            anchor: function.anchor.clone(),
            module: function.module.clone(),
        };

        self.call_depth += 1;
        let flow = self.exec_block(&mut frame, &proto.body);
        self.call_depth -= 1;

        match flow? {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::Null),
        }
    }

    // =========================================
    // Statements
    // =========================================

    fn exec_block(&mut self, frame: &mut Frame, body: &[Stmt]) -> Result<Flow, RuntimeError> {
        for stmt in body {
            if let Flow::Return(value) = self.exec(frame, stmt)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    fn exec(&mut self, frame: &mut Frame, stmt: &Stmt) -> Result<Flow, RuntimeError> {
        match stmt {
            Stmt::Import {
                path,
                target,
                bind_root,
            } => {
                let chain = self.import(frame, path)?;
                let bound = if *bind_root { chain.first() } else { chain.last() };
                if let Some(unit) = bound {
                    store(frame, target, Value::Unit(unit.clone()));
                }
            }
            Stmt::FromImport { path, names } => {
                let chain = self.import(frame, path)?;
                let Some(unit) = chain.last() else {
                    return Ok(Flow::Normal);
                };
                for item in names {
                    let value = self.resolver.get_attr(unit, &item.name)?;
                    store(frame, &item.target, value);
                }
            }
            Stmt::Function(proto) => {
                let function = ScriptFunction {
                    name: proto.name.clone(),
                    proto: proto.clone(),
                    globals: frame.globals.downgrade(),
                    anchor: frame.anchor.clone(),
                    module: frame.module.clone(),
                };
                frame.globals.insert(
                    proto.name.as_ref(),
                    Value::Function(Function::Script(Arc::new(function))),
                );
            }
            Stmt::Store { target, value } => {
                let value = self.eval(frame, value)?;
                store(frame, target, value);
            }
            Stmt::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval(frame, expr)?,
                    None => Value::Null,
                };
                return Ok(Flow::Return(value));
            }
            Stmt::If {
                cond,
                then_body,
                else_body,
            } => {
                let body = if self.eval(frame, cond)?.is_truthy() {
                    then_body
                } else {
                    else_body
                };
                return self.exec_block(frame, body);
            }
            Stmt::While { cond, body } => {
                while self.eval(frame, cond)?.is_truthy() {
                    if let Flow::Return(value) = self.exec_block(frame, body)? {
                        return Ok(Flow::Return(value));
                    }
                }
            }
            Stmt::For { target, iter, body } => {
                let items = iterate(self.eval(frame, iter)?)?;
                for item in items {
                    store(frame, target, item);
                    if let Flow::Return(value) = self.exec_block(frame, body)? {
                        return Ok(Flow::Return(value));
                    }
                }
            }
            Stmt::Expr(expr) => {
                self.eval(frame, expr)?;
            }
        }
        Ok(Flow::Normal)
    }

    /// Load every prefix of an import path, attaching each unit to its parent.
    fn import(&mut self, frame: &Frame, path: &ImportPath) -> Result<Vec<Arc<DefinitionUnit>>, RuntimeError> {
        let absolute = absolute_path(frame, path)?;
        Ok(self.resolver.import_chain(&absolute)?)
    }

    // =========================================
    // Expressions
    // =========================================

    fn eval(&mut self, frame: &mut Frame, expr: &Expr) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Const(value) => Ok(value.clone()),
            Expr::Local(slot) => Ok(frame.locals.get(*slot as usize).cloned().unwrap_or_default()),
            Expr::Global(name) => frame
                .globals
                .get(name)
                .or_else(|| builtins::lookup(name))
                .ok_or_else(|| RuntimeError::UndefinedName {
                    name: name.to_string(),
                }),
            Expr::List(items) => {
                let items = self.eval_all(frame, items)?;
                Ok(Value::List(items.into()))
            }
            Expr::Map(pairs) => {
                let mut out = Vec::with_capacity(pairs.len());
                for (key, value) in pairs {
                    let key = self.eval(frame, key)?;
                    let value = self.eval(frame, value)?;
                    match out.iter_mut().find(|pair: &&mut (Value, Value)| pair.0 == key) {
                        Some(slot) => slot.1 = value,
                        None => out.push((key, value)),
                    }
                }
                Ok(Value::map(out))
            }
            Expr::Attr { object, name } => {
                let object = self.eval(frame, object)?;
                self.attribute(&object, name)
            }
            Expr::Index { object, index } => {
                let object = self.eval(frame, object)?;
                let index = self.eval(frame, index)?;
                ops::index(&object, &index)
            }
            Expr::Call { callee, args } => {
                let callee = self.eval(frame, callee)?;
                let args = self.eval_all(frame, args)?;
                self.call_value(&callee, &args)
            }
            Expr::MethodCall {
                receiver,
                method,
                args,
            } => {
                let receiver = self.eval(frame, receiver)?;
                let args = self.eval_all(frame, args)?;
                match &receiver {
                    Value::Unit(unit) => {
                        let callee = self.resolver.get_attr(unit, method)?;
                        self.call_value(&callee, &args)
                    }
                    other => methods::call_method(other, method, &args),
                }
            }
            Expr::Unary { op, operand } => {
                let operand = self.eval(frame, operand)?;
                ops::unary(*op, &operand)
            }
            Expr::Binary { op, left, right } => {
                let left = self.eval(frame, left)?;
                let right = self.eval(frame, right)?;
                ops::binary(*op, &left, &right)
            }
            Expr::And(left, right) => {
                let left = self.eval(frame, left)?;
                if left.is_truthy() {
                    self.eval(frame, right)
                } else {
                    Ok(left)
                }
            }
            Expr::Or(left, right) => {
                let left = self.eval(frame, left)?;
                if left.is_truthy() {
                    Ok(left)
                } else {
                    self.eval(frame, right)
                }
            }
        }
    }

    fn eval_all(&mut self, frame: &mut Frame, exprs: &[Expr]) -> Result<Vec<Value>, RuntimeError> {
        exprs.iter().map(|expr| self.eval(frame, expr)).collect()
    }

    fn attribute(&mut self, object: &Value, name: &str) -> Result<Value, RuntimeError> {
        match object {
            Value::Unit(unit) => self.resolver.get_attr(unit, name),
            other => Err(RuntimeError::NoAttribute {
                target: other.type_name().to_string(),
                name: name.to_string(),
            }),
        }
    }
}

fn store(frame: &mut Frame, target: &Target, value: Value) {
    match target {
        Target::Global(name) => {
            frame.globals.insert(name.as_ref(), value);
        }
        Target::Local(slot) => {
            let slot = *slot as usize;
            if slot >= frame.locals.len() {
                frame.locals.resize(slot + 1, Value::Null);
            }
            frame.locals[slot] = value;
        }
    }
}

fn iterate(value: Value) -> Result<Vec<Value>, RuntimeError> {
    match value {
        Value::List(items) => Ok(items.to_vec()),
        Value::Str(s) => Ok(s.chars().map(|c| Value::str(c.to_string())).collect()),
        Value::Map(pairs) => Ok(pairs.iter().map(|(k, _)| k.clone()).collect()),
        other => Err(RuntimeError::type_error(format!(
            "'{}' is not iterable",
            other.type_name()
        ))),
    }
}

/// Resolve a possibly relative import against the frame's anchor package.
fn absolute_path(frame: &Frame, path: &ImportPath) -> Result<NamespacePath, RuntimeError> {
    let relative_error = || RuntimeError::RelativeImport {
        module: frame.module.to_string(),
        level: path.level,
    };
    if !path.is_relative() {
        return NamespacePath::from_segments(path.segments.iter().map(|s| s.as_ref()))
            .map_err(|err| RuntimeError::from(OverlayError::from(err)));
    }
    let mut anchor = frame.anchor.clone().ok_or_else(relative_error)?;
    for _ in 1..path.level {
        anchor = anchor.parent().ok_or_else(relative_error)?;
    }
    Ok(anchor.join(&path.segments))
}

#[cfg(test)]
mod tests {
    use stratum_registry::MemoryProvider;

    use super::*;
    use crate::ResolverConfig;

    fn run(source: &str) -> Result<Arc<DefinitionUnit>, OverlayError> {
        let provider = MemoryProvider::new().with_script("m", source).unwrap();
        let resolver = Resolver::new().with_provider(provider);
        resolver.import("m")
    }

    fn global(unit: &DefinitionUnit, name: &str) -> Value {
        unit.get(name).unwrap()
    }

    #[test]
    fn functions_and_control_flow() {
        let unit = run(r#"
            fn fact(n) {
                if n <= 1 { return 1; }
                return n * fact(n - 1);
            }
            let total = 0;
            for i in range(5) { total = total + i; }
            let n = 0;
            while n < 3 { n = n + 1; }
            let f = fact(5);
        "#)
        .unwrap();
        assert_eq!(global(&unit, "f"), Value::Int(120));
        assert_eq!(global(&unit, "total"), Value::Int(10));
        assert_eq!(global(&unit, "n"), Value::Int(3));
    }

    #[test]
    fn logical_operators_return_operands() {
        let unit = run(r#"let a = null || "x"; let b = 0 && 1; let c = [1][0];"#).unwrap();
        assert_eq!(global(&unit, "a"), Value::str("x"));
        assert_eq!(global(&unit, "b"), Value::Int(0));
        assert_eq!(global(&unit, "c"), Value::Int(1));
    }

    #[test]
    fn methods_and_maps() {
        let unit = run(r#"
            let m = {"a": 1};
            let m2 = m.insert("b", 2);
            let keys = m2.keys().len();
            let s = "a-b".replace("-", "+").upper();
        "#)
        .unwrap();
        assert_eq!(global(&unit, "keys"), Value::Int(2));
        assert_eq!(global(&unit, "s"), Value::str("A+B"));
    }

    #[test]
    fn undefined_name_fails_execution() {
        let err = run("let x = y;").unwrap_err();
        assert!(matches!(
            err,
            OverlayError::Execution {
                source: RuntimeError::UndefinedName { .. },
                ..
            }
        ));
    }

    #[test]
    fn oversized_repetition_fails_the_load() {
        let err = run("let x = [1, 2] * 9223372036854775807;").unwrap_err();
        assert!(matches!(
            err,
            OverlayError::Execution {
                source: RuntimeError::Type { .. },
                ..
            }
        ));
    }

    #[test]
    fn call_depth_is_bounded() {
        let provider = MemoryProvider::new()
            .with_script("m", "fn f(n) { return f(n + 1); } let x = f(0);")
            .unwrap();
        let resolver = Resolver::with_config(ResolverConfig::new().max_call_depth(16))
            .with_provider(provider);
        let err = resolver.import("m").unwrap_err();
        assert!(matches!(
            err,
            OverlayError::Execution {
                source: RuntimeError::CallDepth { limit: 16 },
                ..
            }
        ));
    }

    #[test]
    fn relative_import_beyond_top_level() {
        let err = run("from .. import x;").unwrap_err();
        assert!(matches!(
            err,
            OverlayError::Execution {
                source: RuntimeError::RelativeImport { level: 2, .. },
                ..
            }
        ));
    }
}
