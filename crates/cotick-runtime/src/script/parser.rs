//! Recursive-descent parser
//!
//! Precedence, lowest first: `or`, `and`, comparisons, `..` (right
//! associative), `+ -`, `* / %`, unary `- not`.

use crate::script::ast::{BinaryOp, Expr, FunctionDecl, LogicalOp, Script, Stmt, UnaryOp};
use crate::script::token::{Span, Token};
use crate::script::CompileError;

pub struct Parser<'a> {
    chunk: &'a str,
    tokens: Vec<(Token, Span)>,
    pos: usize,
}

type ParseResult<T> = Result<T, CompileError>;

static EOF: Token = Token::Eof;

impl<'a> Parser<'a> {
    /// `tokens` must end with [`Token::Eof`], as produced by the lexer
    pub fn new(chunk: &'a str, tokens: Vec<(Token, Span)>) -> Self {
        Self {
            chunk,
            tokens,
            pos: 0,
        }
    }

    pub fn parse(mut self) -> ParseResult<Script> {
        let mut script = Script::default();
        loop {
            self.skip_newlines();
            match self.peek() {
                Token::Eof => break,
                Token::Fn => script.functions.push(self.function_decl()?),
                _ => script.body.push(self.statement()?),
            }
        }
        Ok(script)
    }

    // ---------------------------------------------------------------------
    // Token stream helpers

    fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> &Token {
        self.tokens
            .get(self.pos + offset)
            .or_else(|| self.tokens.last())
            .map(|(token, _)| token)
            .unwrap_or(&EOF)
    }

    fn line(&self) -> u32 {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(0, |(_, span)| span.line)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token != Token::Eof {
            self.pos += 1;
        }
        token
    }

    fn check(&self, expected: &Token) -> bool {
        self.peek() == expected
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.check(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token, context: &str) -> ParseResult<()> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(format!(
                "expected {} {}, found {}",
                expected,
                context,
                self.peek()
            )))
        }
    }

    fn expect_identifier(&mut self, context: &str) -> ParseResult<String> {
        match self.peek() {
            Token::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            other => Err(self.error(format!("expected name {}, found {}", context, other))),
        }
    }

    fn skip_newlines(&mut self) {
        while self.eat(&Token::Newline) {}
    }

    fn at_statement_end(&self) -> bool {
        self.check(&Token::Newline) || self.peek().closes_block()
    }

    fn error(&self, message: impl Into<String>) -> CompileError {
        CompileError::new(self.chunk, self.line(), message)
    }

    // ---------------------------------------------------------------------
    // Declarations and statements

    fn function_decl(&mut self) -> ParseResult<FunctionDecl> {
        let line = self.line();
        self.expect(&Token::Fn, "")?;
        let name = self.expect_identifier("after 'fn'")?;
        self.expect(&Token::LeftParen, "after function name")?;

        let mut params = Vec::new();
        if !self.check(&Token::RightParen) {
            loop {
                let param = self.expect_identifier("in parameter list")?;
                if params.contains(&param) {
                    return Err(self.error(format!("duplicate parameter '{}'", param)));
                }
                params.push(param);
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
        }
        self.expect(&Token::RightParen, "after parameters")?;

        let body = self.block()?;
        self.expect(&Token::End, &format!("to close function '{}'", name))?;
        if !self.at_statement_end() {
            return Err(self.error(format!("expected end of line, found {}", self.peek())));
        }

        Ok(FunctionDecl {
            name,
            params,
            body,
            line,
        })
    }

    /// Statements up to (not including) `end`, `else` or end of file
    fn block(&mut self) -> ParseResult<Vec<Stmt>> {
        let mut stmts = Vec::new();
        loop {
            self.skip_newlines();
            if self.peek().closes_block() {
                return Ok(stmts);
            }
            stmts.push(self.statement()?);
        }
    }

    fn statement(&mut self) -> ParseResult<Stmt> {
        let line = self.line();
        let stmt = match self.peek() {
            Token::Fn => return Err(self.error("functions must be declared at top level")),
            Token::Let => {
                self.advance();
                let name = self.expect_identifier("after 'let'")?;
                self.expect(&Token::Equal, "after variable name")?;
                let value = self.expression()?;
                Stmt::Let { name, value, line }
            }
            Token::If => {
                self.advance();
                let condition = self.expression()?;
                let then_branch = self.block()?;
                let else_branch = if self.eat(&Token::Else) {
                    self.block()?
                } else {
                    Vec::new()
                };
                self.expect(&Token::End, "to close 'if'")?;
                Stmt::If {
                    condition,
                    then_branch,
                    else_branch,
                    line,
                }
            }
            Token::While => {
                self.advance();
                let condition = self.expression()?;
                let body = self.block()?;
                self.expect(&Token::End, "to close 'while'")?;
                Stmt::While {
                    condition,
                    body,
                    line,
                }
            }
            Token::Return => {
                self.advance();
                let value = if self.at_statement_end() {
                    None
                } else {
                    Some(self.expression()?)
                };
                Stmt::Return { value, line }
            }
            Token::Identifier(_) if self.peek_at(1) == &Token::Equal => {
                let name = self.expect_identifier("")?;
                self.advance();
                let value = self.expression()?;
                Stmt::Assign { name, value, line }
            }
            _ => Stmt::Expr {
                expr: self.expression()?,
                line,
            },
        };

        if self.at_statement_end() {
            self.eat(&Token::Newline);
            Ok(stmt)
        } else {
            Err(self.error(format!("expected end of line, found {}", self.peek())))
        }
    }

    // ---------------------------------------------------------------------
    // Expressions

    fn expression(&mut self) -> ParseResult<Expr> {
        self.or()
    }

    fn or(&mut self) -> ParseResult<Expr> {
        let mut left = self.and()?;
        while self.eat(&Token::Or) {
            let right = self.and()?;
            left = Expr::Logical {
                op: LogicalOp::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn and(&mut self) -> ParseResult<Expr> {
        let mut left = self.comparison()?;
        while self.eat(&Token::And) {
            let right = self.comparison()?;
            left = Expr::Logical {
                op: LogicalOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn comparison(&mut self) -> ParseResult<Expr> {
        let mut left = self.concat()?;
        loop {
            let op = match self.peek() {
                Token::EqualEqual => BinaryOp::Eq,
                Token::NotEqual => BinaryOp::Ne,
                Token::Less => BinaryOp::Lt,
                Token::LessEqual => BinaryOp::Le,
                Token::Greater => BinaryOp::Gt,
                Token::GreaterEqual => BinaryOp::Ge,
                _ => return Ok(left),
            };
            let line = self.line();
            self.advance();
            let right = self.concat()?;
            left = binary(op, left, right, line);
        }
    }

    fn concat(&mut self) -> ParseResult<Expr> {
        let left = self.term()?;
        if self.check(&Token::DotDot) {
            let line = self.line();
            self.advance();
            let right = self.concat()?;
            return Ok(binary(BinaryOp::Concat, left, right, line));
        }
        Ok(left)
    }

    fn term(&mut self) -> ParseResult<Expr> {
        let mut left = self.factor()?;
        loop {
            let op = match self.peek() {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => return Ok(left),
            };
            let line = self.line();
            self.advance();
            let right = self.factor()?;
            left = binary(op, left, right, line);
        }
    }

    fn factor(&mut self) -> ParseResult<Expr> {
        let mut left = self.unary()?;
        loop {
            let op = match self.peek() {
                Token::Star => BinaryOp::Mul,
                Token::Slash => BinaryOp::Div,
                Token::Percent => BinaryOp::Mod,
                _ => return Ok(left),
            };
            let line = self.line();
            self.advance();
            let right = self.unary()?;
            left = binary(op, left, right, line);
        }
    }

    fn unary(&mut self) -> ParseResult<Expr> {
        let op = match self.peek() {
            Token::Minus => UnaryOp::Neg,
            Token::Not => UnaryOp::Not,
            _ => return self.primary(),
        };
        let line = self.line();
        self.advance();
        let operand = self.unary()?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
            line,
        })
    }

    fn primary(&mut self) -> ParseResult<Expr> {
        let line = self.line();
        match self.advance() {
            Token::Number(n) => Ok(Expr::Number(n)),
            Token::Str(s) => Ok(Expr::Str(s)),
            Token::True => Ok(Expr::Bool(true)),
            Token::False => Ok(Expr::Bool(false)),
            Token::Nil => Ok(Expr::Nil),
            Token::Identifier(name) => {
                if self.eat(&Token::LeftParen) {
                    let args = self.arguments()?;
                    Ok(Expr::Call {
                        callee: name,
                        args,
                        line,
                    })
                } else {
                    Ok(Expr::Variable { name, line })
                }
            }
            Token::LeftParen => {
                let expr = self.expression()?;
                self.expect(&Token::RightParen, "to close '('")?;
                Ok(expr)
            }
            other => Err(CompileError::new(
                self.chunk,
                line,
                format!("unexpected {}", other),
            )),
        }
    }

    /// Call arguments after the opening parenthesis
    fn arguments(&mut self) -> ParseResult<Vec<Expr>> {
        let mut args = Vec::new();
        if !self.check(&Token::RightParen) {
            loop {
                args.push(self.expression()?);
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
        }
        self.expect(&Token::RightParen, "after arguments")?;
        Ok(args)
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr, line: u32) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
        line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::lexer::tokenize;

    fn parse(source: &str) -> ParseResult<Script> {
        Parser::new("test", tokenize(source).unwrap()).parse()
    }

    #[test]
    fn test_parse_function_and_body() {
        let script = parse("fn add(a, b)\n  return a + b\nend\nprint(add(1, 2))\n").unwrap();

        assert_eq!(script.functions.len(), 1);
        let add = &script.functions[0];
        assert_eq!(add.name, "add");
        assert_eq!(add.params, vec!["a", "b"]);
        assert_eq!(add.line, 1);
        assert!(matches!(add.body[0], Stmt::Return { value: Some(_), line: 2 }));

        assert_eq!(script.body.len(), 1);
        assert!(matches!(
            &script.body[0],
            Stmt::Expr { expr: Expr::Call { callee, .. }, line: 4 } if callee == "print"
        ));
    }

    #[test]
    fn test_precedence() {
        let script = parse("let x = 1 + 2 * 3 .. 'a' == 'b' or not true").unwrap();
        let Stmt::Let { value, .. } = &script.body[0] else {
            panic!("expected let");
        };

        // or(==(..(+(1, *(2, 3)), 'a'), 'b'), not true)
        let Expr::Logical { op: LogicalOp::Or, left, right } = value else {
            panic!("expected or, got {:?}", value);
        };
        assert!(matches!(**right, Expr::Unary { op: UnaryOp::Not, .. }));
        let Expr::Binary { op: BinaryOp::Eq, left: concat, .. } = &**left else {
            panic!("expected ==");
        };
        let Expr::Binary { op: BinaryOp::Concat, left: sum, .. } = &**concat else {
            panic!("expected ..");
        };
        assert!(matches!(
            &**sum,
            Expr::Binary { op: BinaryOp::Add, right, .. }
                if matches!(**right, Expr::Binary { op: BinaryOp::Mul, .. })
        ));
    }

    #[test]
    fn test_if_else_while() {
        let script = parse(
            "let i = 0\nwhile i < 3\n  if i == 1\n    print(i)\n  else\n    wait()\n  end\n  i = i + 1\nend\n",
        )
        .unwrap();

        let Stmt::While { body, .. } = &script.body[1] else {
            panic!("expected while");
        };
        assert_eq!(body.len(), 2);
        let Stmt::If { then_branch, else_branch, .. } = &body[0] else {
            panic!("expected if");
        };
        assert_eq!(then_branch.len(), 1);
        assert_eq!(else_branch.len(), 1);
        assert!(matches!(body[1], Stmt::Assign { .. }));
    }

    #[test]
    fn test_single_line_forms() {
        let script = parse("fn one() return 1 end; let x = one(); if x return end").unwrap();
        assert_eq!(script.functions.len(), 1);
        assert_eq!(script.body.len(), 2);
    }

    #[test]
    fn test_error_reports_line() {
        let err = parse("let x = 1\nlet = 2\n").unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.to_string(), "test:2: expected name after 'let', found '='");
    }

    #[test]
    fn test_missing_end() {
        let err = parse("while true\n  wait(1)\n").unwrap_err();
        assert_eq!(
            err.to_string(),
            "test:3: expected 'end' to close 'while', found end of file"
        );
    }

    #[test]
    fn test_nested_function_rejected() {
        let err = parse("fn outer()\n  fn inner()\n  end\nend\n").unwrap_err();
        assert_eq!(err.message, "functions must be declared at top level");
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_trailing_garbage() {
        let err = parse("print(1) 2\n").unwrap_err();
        assert_eq!(err.message, "expected end of line, found number 2");
    }
}
