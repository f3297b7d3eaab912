// The scanner.
//
// Keywords are uppercase and identifiers are `[_a-z]+`, so the two classes
// never overlap. `#` starts a comment that runs to end of line.

use crate::ast::Location;
use crate::error::{CompileError, CompileResult};
use smol_str::SmolStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // keywords
    Program,
    Procedure,
    Is,
    Begin,
    End,
    If,
    Then,
    Else,
    EndIf,
    While,
    Do,
    EndWhile,
    Repeat,
    Until,
    For,
    From,
    To,
    DownTo,
    EndFor,
    Read,
    Write,
    ArrayMarker,
    // operators
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    // punctuation
    LParen,
    RParen,
    LBracket,
    RBracket,
    Colon,
    Semicolon,
    Comma,
    // literals
    Pidentifier,
    Num,
    Eof,
}

impl TokenKind {
    /// Human-readable name for diagnostics.
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::Program => "'PROGRAM'",
            TokenKind::Procedure => "'PROCEDURE'",
            TokenKind::Is => "'IS'",
            TokenKind::Begin => "'BEGIN'",
            TokenKind::End => "'END'",
            TokenKind::If => "'IF'",
            TokenKind::Then => "'THEN'",
            TokenKind::Else => "'ELSE'",
            TokenKind::EndIf => "'ENDIF'",
            TokenKind::While => "'WHILE'",
            TokenKind::Do => "'DO'",
            TokenKind::EndWhile => "'ENDWHILE'",
            TokenKind::Repeat => "'REPEAT'",
            TokenKind::Until => "'UNTIL'",
            TokenKind::For => "'FOR'",
            TokenKind::From => "'FROM'",
            TokenKind::To => "'TO'",
            TokenKind::DownTo => "'DOWNTO'",
            TokenKind::EndFor => "'ENDFOR'",
            TokenKind::Read => "'READ'",
            TokenKind::Write => "'WRITE'",
            TokenKind::ArrayMarker => "'T'",
            TokenKind::Assign => "':='",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::Slash => "'/'",
            TokenKind::Percent => "'%'",
            TokenKind::Eq => "'='",
            TokenKind::Ne => "'!='",
            TokenKind::Lt => "'<'",
            TokenKind::Gt => "'>'",
            TokenKind::Le => "'<='",
            TokenKind::Ge => "'>='",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::Colon => "':'",
            TokenKind::Semicolon => "';'",
            TokenKind::Comma => "','",
            TokenKind::Pidentifier => "identifier",
            TokenKind::Num => "number",
            TokenKind::Eof => "end of input",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: SmolStr,
    pub location: Location,
}

fn keyword(word: &str) -> Option<TokenKind> {
    let kind = match word {
        "PROGRAM" => TokenKind::Program,
        "PROCEDURE" => TokenKind::Procedure,
        "IS" => TokenKind::Is,
        "BEGIN" => TokenKind::Begin,
        "END" => TokenKind::End,
        "IF" => TokenKind::If,
        "THEN" => TokenKind::Then,
        "ELSE" => TokenKind::Else,
        "ENDIF" => TokenKind::EndIf,
        "WHILE" => TokenKind::While,
        "DO" => TokenKind::Do,
        "ENDWHILE" => TokenKind::EndWhile,
        "REPEAT" => TokenKind::Repeat,
        "UNTIL" => TokenKind::Until,
        "FOR" => TokenKind::For,
        "FROM" => TokenKind::From,
        "TO" => TokenKind::To,
        "DOWNTO" => TokenKind::DownTo,
        "ENDFOR" => TokenKind::EndFor,
        "READ" => TokenKind::Read,
        "WRITE" => TokenKind::Write,
        "T" => TokenKind::ArrayMarker,
        _ => return None,
    };
    Some(kind)
}

pub struct Lexer {
    source: Vec<char>,
    tokens: Vec<Token>,
    start: usize,
    current: usize,
    line: u32,
    column: u32,
    token_location: Location,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Lexer {
            source: source.chars().collect(),
            tokens: Vec::new(),
            start: 0,
            current: 0,
            line: 1,
            column: 1,
            token_location: Location::new(1, 1),
        }
    }

    /// Scans the whole input and returns the token stream, terminated by
    /// an `Eof` token.
    pub fn scan_tokens(mut self) -> CompileResult<Vec<Token>> {
        while !self.is_at_end() {
            self.start = self.current;
            self.token_location = Location::new(self.line, self.column);
            self.scan_token()?;
        }
        self.tokens.push(Token {
            kind: TokenKind::Eof,
            text: SmolStr::default(),
            location: Location::new(self.line, self.column),
        });
        Ok(self.tokens)
    }

    fn scan_token(&mut self) -> CompileResult<()> {
        let c = self.advance();
        match c {
            ' ' | '\t' | '\r' => {}
            '\n' => {
                self.line += 1;
                self.column = 1;
            }
            '#' => self.skip_line_comment(),
            '(' => self.add_token(TokenKind::LParen),
            ')' => self.add_token(TokenKind::RParen),
            '[' => self.add_token(TokenKind::LBracket),
            ']' => self.add_token(TokenKind::RBracket),
            ';' => self.add_token(TokenKind::Semicolon),
            ',' => self.add_token(TokenKind::Comma),
            '+' => self.add_token(TokenKind::Plus),
            '-' => self.add_token(TokenKind::Minus),
            '*' => self.add_token(TokenKind::Star),
            '/' => self.add_token(TokenKind::Slash),
            '%' => self.add_token(TokenKind::Percent),
            '=' => self.add_token(TokenKind::Eq),
            ':' => {
                if self.match_char('=') {
                    self.add_token(TokenKind::Assign);
                } else {
                    self.add_token(TokenKind::Colon);
                }
            }
            '!' => {
                if self.match_char('=') {
                    self.add_token(TokenKind::Ne);
                } else {
                    return Err(self.unexpected('!'));
                }
            }
            '<' => {
                if self.match_char('=') {
                    self.add_token(TokenKind::Le);
                } else {
                    self.add_token(TokenKind::Lt);
                }
            }
            '>' => {
                if self.match_char('=') {
                    self.add_token(TokenKind::Ge);
                } else {
                    self.add_token(TokenKind::Gt);
                }
            }
            c if c.is_ascii_digit() => self.scan_number(),
            c if c.is_ascii_alphabetic() || c == '_' => self.scan_word()?,
            c => return Err(self.unexpected(c)),
        }
        Ok(())
    }

    fn scan_number(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }
        self.add_token(TokenKind::Num);
    }

    fn scan_word(&mut self) -> CompileResult<()> {
        while self.peek().is_ascii_alphanumeric() || self.peek() == '_' {
            self.advance();
        }
        let word: String = self.source[self.start..self.current].iter().collect();
        if let Some(kind) = keyword(&word) {
            self.add_token(kind);
        } else if word.chars().all(|c| c.is_ascii_lowercase() || c == '_') {
            self.add_token(TokenKind::Pidentifier);
        } else {
            return Err(CompileError::Syntax {
                message: format!("'{word}' is neither a keyword nor a lowercase identifier"),
                location: self.token_location,
            });
        }
        Ok(())
    }

    fn skip_line_comment(&mut self) {
        while !self.is_at_end() && self.peek() != '\n' {
            self.advance();
        }
    }

    fn add_token(&mut self, kind: TokenKind) {
        let text: String = self.source[self.start..self.current].iter().collect();
        self.tokens.push(Token {
            kind,
            text: SmolStr::new(text),
            location: self.token_location,
        });
    }

    fn unexpected(&self, c: char) -> CompileError {
        CompileError::Syntax {
            message: format!("unexpected character {c:?}"),
            location: self.token_location,
        }
    }

    fn advance(&mut self) -> char {
        let c = self.source[self.current];
        self.current += 1;
        self.column += 1;
        c
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.source[self.current] != expected {
            return false;
        }
        self.advance();
        true
    }

    fn peek(&self) -> char {
        if self.is_at_end() { '\0' } else { self.source[self.current] }
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }
}
