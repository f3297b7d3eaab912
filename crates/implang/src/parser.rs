// Recursive-descent parser producing the AST.

use crate::ast::*;
use crate::error::{CompileError, CompileResult};
use crate::lexer::{Lexer, Token, TokenKind};
use smol_str::SmolStr;

/// Parse a complete source text.
pub fn parse(source: &str) -> CompileResult<Program> {
    let tokens = Lexer::new(source).scan_tokens()?;
    Parser::new(tokens).parse_program()
}

struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, current: 0 }
    }

    // program_all -> procedures main
    fn parse_program(&mut self) -> CompileResult<Program> {
        let mut procedures = Vec::new();
        while self.check(TokenKind::Procedure) {
            procedures.push(self.parse_procedure()?);
        }
        self.expect(TokenKind::Program)?;
        self.expect(TokenKind::Is)?;
        let declarations = self.parse_declarations()?;
        self.expect(TokenKind::Begin)?;
        let commands = self.parse_commands()?;
        self.expect(TokenKind::End)?;
        self.expect(TokenKind::Eof)?;
        Ok(Program {
            procedures,
            declarations,
            commands,
        })
    }

    // PROCEDURE name ( args_decl? ) IS declarations? BEGIN commands END
    fn parse_procedure(&mut self) -> CompileResult<Procedure> {
        let location = self.peek().location;
        self.expect(TokenKind::Procedure)?;
        let name = self.expect_name()?;
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                let is_array = self.advance_if(TokenKind::ArrayMarker);
                let name = self.expect_name()?;
                params.push(Parameter { name, is_array });
                if !self.advance_if(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;
        self.expect(TokenKind::Is)?;
        let declarations = self.parse_declarations()?;
        self.expect(TokenKind::Begin)?;
        let commands = self.parse_commands()?;
        self.expect(TokenKind::End)?;
        Ok(Procedure {
            name,
            params,
            declarations,
            commands,
            location,
        })
    }

    // declarations -> decl ( , decl )* | ε   (ends at BEGIN)
    fn parse_declarations(&mut self) -> CompileResult<Vec<Declaration>> {
        let mut declarations = Vec::new();
        if self.check(TokenKind::Begin) {
            return Ok(declarations);
        }
        loop {
            let location = self.peek().location;
            let name = self.expect_name()?;
            let bounds = if self.advance_if(TokenKind::LBracket) {
                let lo = self.parse_signed_number()?;
                self.expect(TokenKind::Colon)?;
                let hi = self.parse_signed_number()?;
                self.expect(TokenKind::RBracket)?;
                Some((lo, hi))
            } else {
                None
            };
            declarations.push(Declaration {
                name,
                bounds,
                location,
            });
            if !self.advance_if(TokenKind::Comma) {
                break;
            }
        }
        Ok(declarations)
    }

    fn parse_commands(&mut self) -> CompileResult<Vec<Command>> {
        let mut commands = vec![self.parse_command()?];
        loop {
            match self.peek().kind {
                TokenKind::End
                | TokenKind::Else
                | TokenKind::EndIf
                | TokenKind::EndWhile
                | TokenKind::Until
                | TokenKind::EndFor
                | TokenKind::Eof => break,
                _ => commands.push(self.parse_command()?),
            }
        }
        Ok(commands)
    }

    fn parse_command(&mut self) -> CompileResult<Command> {
        let location = self.peek().location;
        match self.peek().kind {
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::Repeat => self.parse_repeat(),
            TokenKind::For => self.parse_for(),
            TokenKind::Read => {
                self.advance();
                let target = self.parse_identifier()?;
                self.expect(TokenKind::Semicolon)?;
                Ok(Command::Read { target, location })
            }
            TokenKind::Write => {
                self.advance();
                let value = self.parse_value()?;
                self.expect(TokenKind::Semicolon)?;
                Ok(Command::Write { value, location })
            }
            TokenKind::Pidentifier => {
                // assignment or procedure call, decided by the next token
                if self.peek_next().kind == TokenKind::LParen {
                    self.parse_call()
                } else {
                    let target = self.parse_identifier()?;
                    self.expect(TokenKind::Assign)?;
                    let value = self.parse_expression()?;
                    self.expect(TokenKind::Semicolon)?;
                    Ok(Command::Assign {
                        target,
                        value,
                        location,
                    })
                }
            }
            _ => Err(self.error_here("expected a command")),
        }
    }

    fn parse_if(&mut self) -> CompileResult<Command> {
        let location = self.peek().location;
        self.expect(TokenKind::If)?;
        let condition = self.parse_condition()?;
        self.expect(TokenKind::Then)?;
        let then_block = self.parse_commands()?;
        let else_block = if self.advance_if(TokenKind::Else) {
            Some(self.parse_commands()?)
        } else {
            None
        };
        self.expect(TokenKind::EndIf)?;
        Ok(Command::If {
            condition,
            then_block,
            else_block,
            location,
        })
    }

    fn parse_while(&mut self) -> CompileResult<Command> {
        let location = self.peek().location;
        self.expect(TokenKind::While)?;
        let condition = self.parse_condition()?;
        self.expect(TokenKind::Do)?;
        let body = self.parse_commands()?;
        self.expect(TokenKind::EndWhile)?;
        Ok(Command::While {
            condition,
            body,
            location,
        })
    }

    fn parse_repeat(&mut self) -> CompileResult<Command> {
        let location = self.peek().location;
        self.expect(TokenKind::Repeat)?;
        let body = self.parse_commands()?;
        self.expect(TokenKind::Until)?;
        let condition = self.parse_condition()?;
        self.expect(TokenKind::Semicolon)?;
        Ok(Command::Repeat {
            body,
            condition,
            location,
        })
    }

    fn parse_for(&mut self) -> CompileResult<Command> {
        let location = self.peek().location;
        self.expect(TokenKind::For)?;
        let iterator = self.expect_name()?;
        self.expect(TokenKind::From)?;
        let from = self.parse_value()?;
        let downto = match self.peek().kind {
            TokenKind::To => {
                self.advance();
                false
            }
            TokenKind::DownTo => {
                self.advance();
                true
            }
            _ => return Err(self.error_here("expected 'TO' or 'DOWNTO'")),
        };
        let to = self.parse_value()?;
        self.expect(TokenKind::Do)?;
        let body = self.parse_commands()?;
        self.expect(TokenKind::EndFor)?;
        Ok(Command::For {
            iterator,
            from,
            to,
            downto,
            body,
            location,
        })
    }

    // name ( args? ) ;   — arguments are plain identifiers
    fn parse_call(&mut self) -> CompileResult<Command> {
        let location = self.peek().location;
        let name = self.expect_name()?;
        self.expect(TokenKind::LParen)?;
        let mut args = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                args.push(self.expect_name()?);
                if !self.advance_if(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;
        self.expect(TokenKind::Semicolon)?;
        Ok(Command::Call {
            name,
            args,
            location,
        })
    }

    // expression -> value ( op value )?
    fn parse_expression(&mut self) -> CompileResult<Expr> {
        let location = self.peek().location;
        let left = self.parse_value()?;
        let op = match self.peek().kind {
            TokenKind::Plus => ArithOp::Add,
            TokenKind::Minus => ArithOp::Sub,
            TokenKind::Star => ArithOp::Mul,
            TokenKind::Slash => ArithOp::Div,
            TokenKind::Percent => ArithOp::Mod,
            _ => return Ok(Expr::Value(left)),
        };
        self.advance();
        let right = self.parse_value()?;
        Ok(Expr::BinOp {
            op,
            left,
            right,
            location,
        })
    }

    fn parse_condition(&mut self) -> CompileResult<Condition> {
        let location = self.peek().location;
        let left = self.parse_value()?;
        let op = match self.peek().kind {
            TokenKind::Eq => RelOp::Eq,
            TokenKind::Ne => RelOp::Ne,
            TokenKind::Lt => RelOp::Lt,
            TokenKind::Gt => RelOp::Gt,
            TokenKind::Le => RelOp::Le,
            TokenKind::Ge => RelOp::Ge,
            _ => return Err(self.error_here("expected a comparison operator")),
        };
        self.advance();
        let right = self.parse_value()?;
        Ok(Condition {
            op,
            left,
            right,
            location,
        })
    }

    // value -> num | -num | identifier
    fn parse_value(&mut self) -> CompileResult<Value> {
        let location = self.peek().location;
        match self.peek().kind {
            TokenKind::Num | TokenKind::Minus => {
                Ok(Value::Number(self.parse_signed_number()?, location))
            }
            TokenKind::Pidentifier => Ok(Value::Ident(self.parse_identifier()?)),
            _ => Err(self.error_here("expected a number or an identifier")),
        }
    }

    // identifier -> pidentifier ( [ pidentifier | num ] )?
    fn parse_identifier(&mut self) -> CompileResult<Identifier> {
        let location = self.peek().location;
        let name = self.expect_name()?;
        let index = if self.advance_if(TokenKind::LBracket) {
            let index = match self.peek().kind {
                TokenKind::Num | TokenKind::Minus => Index::Number(self.parse_signed_number()?),
                TokenKind::Pidentifier => Index::Name(self.expect_name()?),
                _ => return Err(self.error_here("expected an array index")),
            };
            self.expect(TokenKind::RBracket)?;
            Some(index)
        } else {
            None
        };
        Ok(Identifier {
            name,
            index,
            location,
        })
    }

    /// Parses `num` or `-num`, range-checking against `i64`.
    fn parse_signed_number(&mut self) -> CompileResult<i64> {
        let negative = self.advance_if(TokenKind::Minus);
        let token = self.expect(TokenKind::Num)?;
        let location = token.location;
        let magnitude: i128 = token.text.parse().map_err(|_| CompileError::Syntax {
            message: format!("number '{}' is out of range", token.text),
            location,
        })?;
        let value = if negative { -magnitude } else { magnitude };
        i64::try_from(value).map_err(|_| CompileError::Syntax {
            message: format!("number '{value}' does not fit a machine cell"),
            location,
        })
    }

    fn expect_name(&mut self) -> CompileResult<SmolStr> {
        let token = self.expect(TokenKind::Pidentifier)?;
        Ok(token.text)
    }

    fn expect(&mut self, kind: TokenKind) -> CompileResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            let found = self.peek();
            Err(CompileError::Syntax {
                message: format!("expected {}, found {}", kind.describe(), found.kind.describe()),
                location: found.location,
            })
        }
    }

    fn error_here(&self, message: &str) -> CompileError {
        let found = self.peek();
        CompileError::Syntax {
            message: format!("{message}, found {}", found.kind.describe()),
            location: found.location,
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn advance_if(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.current].clone();
        if self.current + 1 < self.tokens.len() {
            self.current += 1;
        }
        token
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn peek_next(&self) -> &Token {
        if self.current + 1 < self.tokens.len() {
            &self.tokens[self.current + 1]
        } else {
            &self.tokens[self.current]
        }
    }
}
