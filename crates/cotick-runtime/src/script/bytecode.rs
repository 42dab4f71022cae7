//! Compiled program representation
//!
//! Stack-based instructions, one [`Instr`] per operation, each tagged with
//! the source line it came from so runtime errors can name it.

use cotick_engine::Value;

/// Host functions callable from scripts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Print,
    Spawn,
    Delay,
    Defer,
    Wait,
    Cancel,
    OnExit,
    Error,
    Clock,
}

impl Builtin {
    pub const ALL: [Builtin; 9] = [
        Builtin::Print,
        Builtin::Spawn,
        Builtin::Delay,
        Builtin::Defer,
        Builtin::Wait,
        Builtin::Cancel,
        Builtin::OnExit,
        Builtin::Error,
        Builtin::Clock,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Print => "print",
            Builtin::Spawn => "spawn",
            Builtin::Delay => "delay",
            Builtin::Defer => "defer",
            Builtin::Wait => "wait",
            Builtin::Cancel => "cancel",
            Builtin::OnExit => "on_exit",
            Builtin::Error => "error",
            Builtin::Clock => "clock",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.name() == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Op {
    /// Push `constants[index]`
    Const(usize),
    Nil,
    True,
    False,

    LoadLocal(usize),
    /// Pop into a local slot
    StoreLocal(usize),

    /// Push a function value for `functions[index]`
    Function(usize),

    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Concat,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Neg,
    Not,

    Pop,

    Jump(usize),
    /// Pop; jump when falsy
    JumpIfFalse(usize),
    /// Jump when the top is falsy, leaving it in place (`and`)
    JumpIfFalseKeep(usize),
    /// Jump when the top is truthy, leaving it in place (`or`)
    JumpIfTrueKeep(usize),

    /// Call a script function with `argc` arguments from the stack
    Call { func: usize, argc: usize },
    /// Call a builtin with `argc` arguments from the stack
    Builtin { builtin: Builtin, argc: usize },

    /// Pop the return value and leave the frame
    Return,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Instr {
    pub op: Op,
    pub line: u32,
}

#[derive(Debug, Clone)]
pub struct FunctionProto {
    pub name: String,
    pub params: usize,
    /// Local slots, parameters included
    pub locals: usize,
    pub code: Vec<Instr>,
    pub line: u32,
}

/// A compiled source file
#[derive(Debug)]
pub struct Program {
    /// Chunk name used in error locations
    pub chunk: String,
    pub functions: Vec<FunctionProto>,
    pub constants: Vec<Value>,
    /// Index of the top-level code in `functions`
    pub main: usize,
}

impl Program {
    pub fn function_index(&self, name: &str) -> Option<usize> {
        self.functions.iter().position(|f| f.name == name)
    }
}
