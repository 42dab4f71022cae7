//! Bytecode interpreter
//!
//! Every task runs a [`ScriptTask`]: an explicit stack of call frames, so a
//! builtin such as `wait` can suspend the whole task at any call depth and
//! pick up where it left off on the next resume.

use crate::environment::Environment;
use crate::script::bytecode::{Builtin, Op, Program};
use cotick_engine::scheduler::{
    Callable, Coroutine, ResumeStatus, TaskContext, TaskError, TraceFrame,
};
use cotick_engine::{tasklib, Value};
use std::cmp::Ordering;
use std::rc::Rc;
use std::vec;

/// Call depth at which a task fails with a stack overflow
pub const MAX_CALL_DEPTH: usize = 200;

/// A script function as a first-class value
pub struct ScriptFunction {
    program: Rc<Program>,
    env: Rc<Environment>,
    index: usize,
}

impl ScriptFunction {
    pub fn new(program: Rc<Program>, env: Rc<Environment>, index: usize) -> Self {
        Self {
            program,
            env,
            index,
        }
    }

    /// The top-level code of `program`
    pub fn main(program: Rc<Program>, env: Rc<Environment>) -> Self {
        let index = program.main;
        Self::new(program, env, index)
    }
}

impl Callable for ScriptFunction {
    fn name(&self) -> &str {
        &self.program.functions[self.index].name
    }

    fn instantiate(&self) -> Box<dyn Coroutine> {
        Box::new(ScriptTask::new(
            self.program.clone(),
            self.env.clone(),
            self.index,
        ))
    }
}

struct Frame {
    function: usize,
    pc: usize,
    locals: Vec<Value>,
    stack: Vec<Value>,
}

/// What the interpreter does after a builtin returns
enum Flow {
    Continue(Value),
    Suspend,
    Fail(String),
}

/// Suspendable execution of one script function
pub struct ScriptTask {
    program: Rc<Program>,
    env: Rc<Environment>,
    entry: usize,
    frames: Vec<Frame>,
    started: bool,
}

impl ScriptTask {
    pub fn new(program: Rc<Program>, env: Rc<Environment>, entry: usize) -> Self {
        Self {
            program,
            env,
            entry,
            frames: Vec::new(),
            started: false,
        }
    }

    fn push_frame(&mut self, function: usize, args: Vec<Value>) -> Result<(), String> {
        if self.frames.len() >= MAX_CALL_DEPTH {
            return Err("stack overflow".to_string());
        }

        let proto = &self.program.functions[function];
        let mut locals = vec![Value::Nil; proto.locals.max(proto.params)];
        for (slot, arg) in args.into_iter().take(proto.params).enumerate() {
            locals[slot] = arg;
        }

        self.frames.push(Frame {
            function,
            pc: 0,
            locals,
            stack: Vec::new(),
        });
        Ok(())
    }

    /// Abort with `message`, capturing the active frames innermost first
    fn fail(&mut self, message: String, native: Option<Builtin>) -> ResumeStatus {
        let mut trace = Vec::with_capacity(self.frames.len() + 1);
        if let Some(builtin) = native {
            trace.push(TraceFrame::native(builtin.name()));
        }
        for frame in self.frames.iter().rev() {
            let proto = &self.program.functions[frame.function];
            let line = frame
                .pc
                .checked_sub(1)
                .and_then(|pc| proto.code.get(pc))
                .map_or(0, |instr| instr.line);
            trace.push(TraceFrame::script(&proto.name, &self.program.chunk, line));
        }

        self.frames.clear();
        ResumeStatus::Failed(TaskError::with_trace(message, trace))
    }

    fn run(&mut self, cx: &TaskContext<'_>) -> ResumeStatus {
        let program = self.program.clone();

        loop {
            let Some(frame) = self.frames.last_mut() else {
                return ResumeStatus::Completed;
            };
            let proto = &program.functions[frame.function];
            let Some(instr) = proto.code.get(frame.pc).copied() else {
                // Compiled code always ends in `Return`
                return self.fail("fell off the end of a function".to_string(), None);
            };
            frame.pc += 1;

            match instr.op {
                Op::Const(index) => frame.stack.push(program.constants[index].clone()),
                Op::Nil => frame.stack.push(Value::Nil),
                Op::True => frame.stack.push(Value::Bool(true)),
                Op::False => frame.stack.push(Value::Bool(false)),

                Op::LoadLocal(slot) => {
                    let value = frame.locals[slot].clone();
                    frame.stack.push(value);
                }
                Op::StoreLocal(slot) => frame.locals[slot] = pop(&mut frame.stack),

                Op::Function(index) => {
                    let function = ScriptFunction::new(program.clone(), self.env.clone(), index);
                    frame.stack.push(Value::Function(Rc::new(function)));
                }

                Op::Add | Op::Sub | Op::Mul | Op::Div | Op::Mod => {
                    let right = pop(&mut frame.stack);
                    let left = pop(&mut frame.stack);
                    match arithmetic(instr.op, &left, &right) {
                        Ok(value) => frame.stack.push(value),
                        Err(message) => return self.fail(message, None),
                    }
                }
                Op::Neg => {
                    let operand = pop(&mut frame.stack);
                    match operand.as_number() {
                        Some(n) => frame.stack.push(Value::Number(-n)),
                        None => return self.fail(arithmetic_error(&operand), None),
                    }
                }
                Op::Concat => {
                    let right = pop(&mut frame.stack);
                    let left = pop(&mut frame.stack);
                    match (concat_piece(&left), concat_piece(&right)) {
                        (Some(a), Some(b)) => frame.stack.push(Value::string(a + &b)),
                        (None, _) => return self.fail(concat_error(&left), None),
                        (_, None) => return self.fail(concat_error(&right), None),
                    }
                }
                Op::Eq | Op::Ne => {
                    let right = pop(&mut frame.stack);
                    let left = pop(&mut frame.stack);
                    let equal = left == right;
                    frame
                        .stack
                        .push(Value::Bool(if instr.op == Op::Eq { equal } else { !equal }));
                }
                Op::Lt | Op::Le | Op::Gt | Op::Ge => {
                    let right = pop(&mut frame.stack);
                    let left = pop(&mut frame.stack);
                    let Some(ordering) = compare(&left, &right) else {
                        return self.fail(
                            format!(
                                "attempt to compare {} with {}",
                                left.type_name(),
                                right.type_name()
                            ),
                            None,
                        );
                    };
                    let result = match instr.op {
                        Op::Lt => ordering == Ordering::Less,
                        Op::Le => ordering != Ordering::Greater,
                        Op::Gt => ordering == Ordering::Greater,
                        _ => ordering != Ordering::Less,
                    };
                    frame.stack.push(Value::Bool(result));
                }
                Op::Not => {
                    let operand = pop(&mut frame.stack);
                    frame.stack.push(Value::Bool(!operand.is_truthy()));
                }

                Op::Pop => {
                    frame.stack.pop();
                }

                Op::Jump(target) => frame.pc = target,
                Op::JumpIfFalse(target) => {
                    if !pop(&mut frame.stack).is_truthy() {
                        frame.pc = target;
                    }
                }
                Op::JumpIfFalseKeep(target) => {
                    if !frame.stack.last().is_some_and(Value::is_truthy) {
                        frame.pc = target;
                    }
                }
                Op::JumpIfTrueKeep(target) => {
                    if frame.stack.last().is_some_and(Value::is_truthy) {
                        frame.pc = target;
                    }
                }

                Op::Call { func, argc } => {
                    let args = take_args(&mut frame.stack, argc);
                    if let Err(message) = self.push_frame(func, args) {
                        return self.fail(message, None);
                    }
                }
                Op::Builtin { builtin, argc } => {
                    let args = take_args(&mut frame.stack, argc);
                    match self.call_builtin(cx, builtin, args) {
                        Flow::Continue(value) => {
                            if let Some(frame) = self.frames.last_mut() {
                                frame.stack.push(value);
                            }
                        }
                        Flow::Suspend => return ResumeStatus::Suspended,
                        Flow::Fail(message) => return self.fail(message, Some(builtin)),
                    }

                    // The builtin may have cancelled this very task
                    if cx.task().is_cancelled() {
                        self.frames.clear();
                        return ResumeStatus::Suspended;
                    }
                }

                Op::Return => {
                    let value = pop(&mut frame.stack);
                    self.frames.pop();
                    match self.frames.last_mut() {
                        Some(caller) => caller.stack.push(value),
                        None => return ResumeStatus::Completed,
                    }
                }
            }
        }
    }

    fn call_builtin(&mut self, cx: &TaskContext<'_>, builtin: Builtin, args: Vec<Value>) -> Flow {
        let mut args = args.into_iter();
        let result = match builtin {
            Builtin::Print => {
                let line: Vec<String> = args.map(|value| value.to_string()).collect();
                self.env.print(&line.join("\t"));
                Ok(Value::Nil)
            }
            Builtin::Spawn => {
                let callee = next_arg(&mut args);
                tasklib::spawn(cx, &callee, args.collect()).map(Value::Task)
            }
            Builtin::Delay => {
                let seconds = next_arg(&mut args);
                let callee = next_arg(&mut args);
                tasklib::delay(cx, &seconds, &callee, args.collect()).map(Value::Task)
            }
            Builtin::Defer => {
                let callee = next_arg(&mut args);
                tasklib::defer(cx, &callee, args.collect()).map(Value::Task)
            }
            Builtin::Wait => {
                return match tasklib::wait(cx, &next_arg(&mut args)) {
                    Ok(()) => Flow::Suspend,
                    Err(err) => Flow::Fail(err.to_string()),
                };
            }
            Builtin::Cancel => tasklib::cancel(cx, &next_arg(&mut args)).map(|()| Value::Nil),
            Builtin::OnExit => {
                return match next_arg(&mut args) {
                    Value::Function(callback) => {
                        self.env.on_exit(callback);
                        Flow::Continue(Value::Nil)
                    }
                    other => Flow::Fail(format!("expected function, got {}", other.type_name())),
                };
            }
            Builtin::Error => return Flow::Fail(next_arg(&mut args).to_string()),
            Builtin::Clock => Ok(Value::Number(cx.now())),
        };

        match result {
            Ok(value) => Flow::Continue(value),
            Err(err) => Flow::Fail(err.to_string()),
        }
    }
}

impl Coroutine for ScriptTask {
    fn resume(&mut self, cx: &TaskContext<'_>, args: Vec<Value>) -> ResumeStatus {
        if !self.started {
            self.started = true;
            if let Err(message) = self.push_frame(self.entry, args) {
                return self.fail(message, None);
            }
        } else {
            // Whatever the resumer passes is the result of the suspending call
            let Some(frame) = self.frames.last_mut() else {
                return ResumeStatus::Completed;
            };
            frame.stack.push(args.into_iter().next().unwrap_or_default());
        }

        self.run(cx)
    }

    fn reset(&mut self) {
        self.frames.clear();
        self.started = true;
    }
}

fn pop(stack: &mut Vec<Value>) -> Value {
    stack.pop().unwrap_or_default()
}

fn take_args(stack: &mut Vec<Value>, argc: usize) -> Vec<Value> {
    let split = stack.len().saturating_sub(argc);
    stack.split_off(split)
}

fn next_arg(args: &mut vec::IntoIter<Value>) -> Value {
    args.next().unwrap_or_default()
}

fn arithmetic_error(value: &Value) -> String {
    format!("attempt to perform arithmetic on a {} value", value.type_name())
}

fn arithmetic(op: Op, left: &Value, right: &Value) -> Result<Value, String> {
    let a = left.as_number().ok_or_else(|| arithmetic_error(left))?;
    let b = right.as_number().ok_or_else(|| arithmetic_error(right))?;
    let result = match op {
        Op::Add => a + b,
        Op::Sub => a - b,
        Op::Mul => a * b,
        Op::Div => a / b,
        // Floored modulo: the result takes the sign of the divisor
        _ => a - (a / b).floor() * b,
    };
    Ok(Value::Number(result))
}

fn concat_piece(value: &Value) -> Option<String> {
    match value {
        Value::Str(s) => Some(s.to_string()),
        Value::Number(_) => Some(value.to_string()),
        _ => None,
    }
}

fn concat_error(value: &Value) -> String {
    format!("attempt to concatenate a {} value", value.type_name())
}

fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        _ => None,
    }
}
