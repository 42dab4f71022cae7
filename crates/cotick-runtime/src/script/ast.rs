//! Syntax tree produced by the parser

/// A parsed source file: hoisted functions plus the top-level statements
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Script {
    pub functions: Vec<FunctionDecl>,
    pub body: Vec<Stmt>,
}

/// `fn name(params) ... end`
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `let name = value`
    Let { name: String, value: Expr, line: u32 },

    /// `name = value`
    Assign { name: String, value: Expr, line: u32 },

    If {
        condition: Expr,
        then_branch: Vec<Stmt>,
        else_branch: Vec<Stmt>,
        line: u32,
    },

    While {
        condition: Expr,
        body: Vec<Stmt>,
        line: u32,
    },

    Return { value: Option<Expr>, line: u32 },

    /// Expression evaluated for its side effects
    Expr { expr: Expr, line: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Str(String),
    Bool(bool),
    Nil,

    Variable {
        name: String,
        line: u32,
    },

    Call {
        callee: String,
        args: Vec<Expr>,
        line: u32,
    },

    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        line: u32,
    },

    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        line: u32,
    },

    /// Short-circuit `and` / `or`
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
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
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}
