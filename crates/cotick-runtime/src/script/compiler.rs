//! AST to bytecode compiler

use crate::script::ast::{BinaryOp, Expr, FunctionDecl, LogicalOp, Script, Stmt, UnaryOp};
use crate::script::bytecode::{Builtin, FunctionProto, Instr, Op, Program};
use crate::script::CompileError;
use cotick_engine::Value;
use rustc_hash::FxHashMap;

/// Name given to the top-level code of a chunk
pub const MAIN_FUNCTION: &str = "<main>";

type CompileResult<T> = Result<T, CompileError>;

pub struct Compiler<'a> {
    chunk: &'a str,
    /// Hoisted top-level functions by name
    globals: FxHashMap<String, usize>,
    constants: Vec<Value>,
}

/// Per-function compilation state
struct FunctionState {
    locals: FxHashMap<String, usize>,
    code: Vec<Instr>,
}

impl FunctionState {
    fn new(params: &[String]) -> Self {
        let mut locals = FxHashMap::default();
        for (slot, param) in params.iter().enumerate() {
            locals.insert(param.clone(), slot);
        }
        Self {
            locals,
            code: Vec::new(),
        }
    }

    fn emit(&mut self, op: Op, line: u32) -> usize {
        self.code.push(Instr { op, line });
        self.code.len() - 1
    }

    /// Point the jump at `at` to the next instruction
    fn patch(&mut self, at: usize) {
        let target = self.code.len();
        match &mut self.code[at].op {
            Op::Jump(to)
            | Op::JumpIfFalse(to)
            | Op::JumpIfFalseKeep(to)
            | Op::JumpIfTrueKeep(to) => *to = target,
            other => debug_assert!(false, "patching non-jump {:?}", other),
        }
    }

    /// Slot for `name`, allocating one on first declaration
    fn declare(&mut self, name: &str) -> usize {
        let next = self.locals.len();
        *self.locals.entry(name.to_string()).or_insert(next)
    }
}

impl<'a> Compiler<'a> {
    pub fn new(chunk: &'a str) -> Self {
        Self {
            chunk,
            globals: FxHashMap::default(),
            constants: Vec::new(),
        }
    }

    pub fn compile(mut self, script: Script) -> CompileResult<Program> {
        for (index, function) in script.functions.iter().enumerate() {
            if Builtin::from_name(&function.name).is_some() {
                return Err(self.error(
                    function.line,
                    format!("cannot redefine builtin '{}'", function.name),
                ));
            }
            if self.globals.insert(function.name.clone(), index).is_some() {
                return Err(self.error(
                    function.line,
                    format!("duplicate function '{}'", function.name),
                ));
            }
        }

        let mut functions = Vec::with_capacity(script.functions.len() + 1);
        for function in &script.functions {
            functions.push(self.function(function)?);
        }

        let main = FunctionDecl {
            name: MAIN_FUNCTION.to_string(),
            params: Vec::new(),
            body: script.body,
            line: 0,
        };
        functions.push(self.function(&main)?);

        Ok(Program {
            chunk: self.chunk.to_string(),
            main: functions.len() - 1,
            functions,
            constants: self.constants,
        })
    }

    fn error(&self, line: u32, message: impl Into<String>) -> CompileError {
        CompileError::new(self.chunk, line, message)
    }

    fn function(&mut self, decl: &FunctionDecl) -> CompileResult<FunctionProto> {
        let mut state = FunctionState::new(&decl.params);
        self.block(&mut state, &decl.body)?;

        // Implicit `return nil`
        let line = state.code.last().map_or(decl.line, |instr| instr.line);
        state.emit(Op::Nil, line);
        state.emit(Op::Return, line);

        Ok(FunctionProto {
            name: decl.name.clone(),
            params: decl.params.len(),
            locals: state.locals.len(),
            code: state.code,
            line: decl.line,
        })
    }

    fn block(&mut self, state: &mut FunctionState, stmts: &[Stmt]) -> CompileResult<()> {
        for stmt in stmts {
            self.statement(state, stmt)?;
        }
        Ok(())
    }

    fn statement(&mut self, state: &mut FunctionState, stmt: &Stmt) -> CompileResult<()> {
        match stmt {
            Stmt::Let { name, value, line } => {
                self.expression(state, value)?;
                let slot = state.declare(name);
                state.emit(Op::StoreLocal(slot), *line);
            }
            Stmt::Assign { name, value, line } => {
                let Some(&slot) = state.locals.get(name) else {
                    return Err(self.error(
                        *line,
                        format!("assignment to undeclared variable '{}'", name),
                    ));
                };
                self.expression(state, value)?;
                state.emit(Op::StoreLocal(slot), *line);
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
                line,
            } => {
                self.expression(state, condition)?;
                let skip_then = state.emit(Op::JumpIfFalse(0), *line);
                self.block(state, then_branch)?;
                if else_branch.is_empty() {
                    state.patch(skip_then);
                } else {
                    let skip_else = state.emit(Op::Jump(0), *line);
                    state.patch(skip_then);
                    self.block(state, else_branch)?;
                    state.patch(skip_else);
                }
            }
            Stmt::While {
                condition,
                body,
                line,
            } => {
                let start = state.code.len();
                self.expression(state, condition)?;
                let exit = state.emit(Op::JumpIfFalse(0), *line);
                self.block(state, body)?;
                state.emit(Op::Jump(start), *line);
                state.patch(exit);
            }
            Stmt::Return { value, line } => {
                match value {
                    Some(value) => self.expression(state, value)?,
                    None => {
                        state.emit(Op::Nil, *line);
                    }
                }
                state.emit(Op::Return, *line);
            }
            Stmt::Expr { expr, line } => {
                self.expression(state, expr)?;
                state.emit(Op::Pop, *line);
            }
        }
        Ok(())
    }

    fn constant(&mut self, value: Value) -> usize {
        self.constants.push(value);
        self.constants.len() - 1
    }

    fn expression(&mut self, state: &mut FunctionState, expr: &Expr) -> CompileResult<()> {
        match expr {
            Expr::Number(n) => {
                let index = self.constant(Value::Number(*n));
                state.emit(Op::Const(index), current_line(state));
            }
            Expr::Str(s) => {
                let index = self.constant(Value::string(s));
                state.emit(Op::Const(index), current_line(state));
            }
            Expr::Bool(true) => {
                state.emit(Op::True, current_line(state));
            }
            Expr::Bool(false) => {
                state.emit(Op::False, current_line(state));
            }
            Expr::Nil => {
                state.emit(Op::Nil, current_line(state));
            }
            Expr::Variable { name, line } => {
                if let Some(&slot) = state.locals.get(name) {
                    state.emit(Op::LoadLocal(slot), *line);
                } else if let Some(&index) = self.globals.get(name) {
                    state.emit(Op::Function(index), *line);
                } else if Builtin::from_name(name).is_some() {
                    return Err(self.error(
                        *line,
                        format!("builtin '{}' cannot be used as a value", name),
                    ));
                } else {
                    return Err(self.error(*line, format!("undefined variable '{}'", name)));
                }
            }
            Expr::Call { callee, args, line } => {
                let op = if let Some(builtin) = Builtin::from_name(callee) {
                    Op::Builtin {
                        builtin,
                        argc: args.len(),
                    }
                } else if let Some(&func) = self.globals.get(callee) {
                    Op::Call {
                        func,
                        argc: args.len(),
                    }
                } else if state.locals.contains_key(callee) {
                    return Err(self.error(
                        *line,
                        format!("'{}' is a variable; use spawn to run a function value", callee),
                    ));
                } else {
                    return Err(self.error(*line, format!("undefined function '{}'", callee)));
                };
                for arg in args {
                    self.expression(state, arg)?;
                }
                state.emit(op, *line);
            }
            Expr::Unary { op, operand, line } => {
                self.expression(state, operand)?;
                let op = match op {
                    UnaryOp::Neg => Op::Neg,
                    UnaryOp::Not => Op::Not,
                };
                state.emit(op, *line);
            }
            Expr::Binary {
                op,
                left,
                right,
                line,
            } => {
                self.expression(state, left)?;
                self.expression(state, right)?;
                let op = match op {
                    BinaryOp::Add => Op::Add,
                    BinaryOp::Sub => Op::Sub,
                    BinaryOp::Mul => Op::Mul,
                    BinaryOp::Div => Op::Div,
                    BinaryOp::Mod => Op::Mod,
                    BinaryOp::Concat => Op::Concat,
                    BinaryOp::Eq => Op::Eq,
                    BinaryOp::Ne => Op::Ne,
                    BinaryOp::Lt => Op::Lt,
                    BinaryOp::Le => Op::Le,
                    BinaryOp::Gt => Op::Gt,
                    BinaryOp::Ge => Op::Ge,
                };
                state.emit(op, *line);
            }
            Expr::Logical { op, left, right } => {
                self.expression(state, left)?;
                let line = current_line(state);
                let jump = match op {
                    LogicalOp::And => Op::JumpIfFalseKeep(0),
                    LogicalOp::Or => Op::JumpIfTrueKeep(0),
                };
                let short_circuit = state.emit(jump, line);
                state.emit(Op::Pop, line);
                self.expression(state, right)?;
                state.patch(short_circuit);
            }
        }
        Ok(())
    }
}

/// Literals carry no line of their own; they inherit the last one emitted
fn current_line(state: &FunctionState) -> u32 {
    state.code.last().map_or(0, |instr| instr.line)
}
