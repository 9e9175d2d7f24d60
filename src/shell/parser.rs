// ABOUTME: Lexer and parser for the one-statement-per-line shell language.
// ABOUTME: Supports assignment, literals, names, attribute access and calls with keywords.

use super::error::ScriptError;
use super::namespace::Value;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    Int(i64),
    LParen,
    RParen,
    Comma,
    Dot,
    Equals,
    Minus,
}

/// One parsed line.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Assign { name: String, value: Expr },
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Name(String),
    Attribute { target: Box<Expr>, name: String },
    Call { function: Box<Expr>, args: Vec<Argument> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Positional(Expr),
    Keyword { name: String, value: Expr },
}

fn syntax(message: impl Into<String>) -> ScriptError {
    ScriptError::Syntax {
        message: message.into(),
    }
}

fn tokenize(line: &str) -> Result<Vec<Token>, ScriptError> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            '#' => break,
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' | ')' | ',' | '.' | '=' | '-' => {
                chars.next();
                tokens.push(match c {
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    ',' => Token::Comma,
                    '.' => Token::Dot,
                    '=' => Token::Equals,
                    _ => Token::Minus,
                });
            }
            '\'' | '"' => {
                chars.next();
                let quote = c;
                let mut value = String::new();
                loop {
                    match chars.next() {
                        None => return Err(syntax("unterminated string literal")),
                        Some(ch) if ch == quote => break,
                        Some('\\') => match chars.next() {
                            Some('n') => value.push('\n'),
                            Some('t') => value.push('\t'),
                            Some('\\') => value.push('\\'),
                            Some('\'') => value.push('\''),
                            Some('"') => value.push('"'),
                            Some(other) => {
                                value.push('\\');
                                value.push(other);
                            }
                            None => return Err(syntax("unterminated string literal")),
                        },
                        Some(ch) => value.push(ch),
                    }
                }
                tokens.push(Token::Str(value));
            }
            c if c.is_ascii_digit() => {
                let mut digits = String::new();
                while let Some(&d) = chars.peek() {
                    if !d.is_ascii_digit() && d != '_' {
                        break;
                    }
                    if d != '_' {
                        digits.push(d);
                    }
                    chars.next();
                }
                let value = digits
                    .parse()
                    .map_err(|_| syntax(format!("integer literal too large: {}", digits)))?;
                tokens.push(Token::Int(value));
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut ident = String::new();
                while let Some(&d) = chars.peek() {
                    if !d.is_alphanumeric() && d != '_' {
                        break;
                    }
                    ident.push(d);
                    chars.next();
                }
                tokens.push(Token::Ident(ident));
            }
            other => return Err(syntax(format!("invalid character '{}'", other))),
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<(), ScriptError> {
        match self.next() {
            Some(token) if token == expected => Ok(()),
            Some(token) => Err(syntax(format!("expected {}, found {:?}", what, token))),
            None => Err(syntax(format!("expected {}, found end of line", what))),
        }
    }

    fn ident(&mut self) -> Result<String, ScriptError> {
        match self.next() {
            Some(Token::Ident(name)) => Ok(name),
            Some(token) => Err(syntax(format!("expected a name, found {:?}", token))),
            None => Err(syntax("expected a name, found end of line")),
        }
    }

    fn statement(&mut self) -> Result<Statement, ScriptError> {
        if let (Some(Token::Ident(name)), Some(Token::Equals)) = (self.peek(), self.peek_at(1)) {
            let name = name.clone();
            self.pos += 2;
            let value = self.expr()?;
            return Ok(Statement::Assign { name, value });
        }
        Ok(Statement::Expr(self.expr()?))
    }

    fn expr(&mut self) -> Result<Expr, ScriptError> {
        let mut expr = self.primary()?;
        loop {
            match self.peek() {
                Some(Token::Dot) => {
                    self.pos += 1;
                    let name = self.ident()?;
                    expr = Expr::Attribute {
                        target: Box::new(expr),
                        name,
                    };
                }
                Some(Token::LParen) => {
                    self.pos += 1;
                    let args = self.arguments()?;
                    expr = Expr::Call {
                        function: Box::new(expr),
                        args,
                    };
                }
                _ => return Ok(expr),
            }
        }
    }

    fn primary(&mut self) -> Result<Expr, ScriptError> {
        match self.next() {
            Some(Token::Str(s)) => Ok(Expr::Literal(Value::Str(s))),
            Some(Token::Int(i)) => Ok(Expr::Literal(Value::Int(i))),
            Some(Token::Minus) => match self.next() {
                Some(Token::Int(i)) => Ok(Expr::Literal(Value::Int(-i))),
                _ => Err(syntax("expected an integer after '-'")),
            },
            Some(Token::Ident(name)) => Ok(match name.as_str() {
                "True" => Expr::Literal(Value::Bool(true)),
                "False" => Expr::Literal(Value::Bool(false)),
                "None" => Expr::Literal(Value::None),
                _ => Expr::Name(name),
            }),
            Some(Token::LParen) => {
                let inner = self.expr()?;
                self.expect(Token::RParen, "')'")?;
                Ok(inner)
            }
            Some(token) => Err(syntax(format!("unexpected {:?}", token))),
            None => Err(syntax("unexpected end of line")),
        }
    }

    /// Arguments after the opening parenthesis, through the closing one.
    fn arguments(&mut self) -> Result<Vec<Argument>, ScriptError> {
        let mut args = Vec::new();
        let mut seen_keyword = false;
        loop {
            if self.peek() == Some(&Token::RParen) {
                self.pos += 1;
                return Ok(args);
            }

            let argument =
                if let (Some(Token::Ident(name)), Some(Token::Equals)) = (self.peek(), self.peek_at(1)) {
                    let name = name.clone();
                    self.pos += 2;
                    seen_keyword = true;
                    Argument::Keyword {
                        name,
                        value: self.expr()?,
                    }
                } else {
                    if seen_keyword {
                        return Err(syntax("positional argument follows keyword argument"));
                    }
                    Argument::Positional(self.expr()?)
                };
            args.push(argument);

            match self.next() {
                Some(Token::Comma) => continue,
                Some(Token::RParen) => return Ok(args),
                Some(token) => return Err(syntax(format!("expected ',' or ')', found {:?}", token))),
                None => return Err(syntax("unclosed '('")),
            }
        }
    }
}

/// Parse a single line. Blank and comment-only lines yield `None`.
pub fn parse_line(line: &str) -> Result<Option<Statement>, ScriptError> {
    let tokens = tokenize(line)?;
    if tokens.is_empty() {
        return Ok(None);
    }
    let mut parser = Parser { tokens, pos: 0 };
    let statement = parser.statement()?;
    if let Some(token) = parser.peek() {
        return Err(syntax(format!("unexpected {:?} after statement", token)));
    }
    Ok(Some(statement))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(n: &str) -> Expr {
        Expr::Name(n.to_string())
    }

    fn string(s: &str) -> Expr {
        Expr::Literal(Value::Str(s.to_string()))
    }

    #[test]
    fn blank_and_comment_lines_are_empty() {
        assert_eq!(parse_line("").unwrap(), None);
        assert_eq!(parse_line("   ").unwrap(), None);
        assert_eq!(parse_line("# just a comment").unwrap(), None);
    }

    #[test]
    fn parses_assignment_of_method_call() {
        let stmt = parse_line("tasks = gmp.get_tasks(filter='rows=10')").unwrap();
        assert_eq!(
            stmt,
            Some(Statement::Assign {
                name: "tasks".to_string(),
                value: Expr::Call {
                    function: Box::new(Expr::Attribute {
                        target: Box::new(name("gmp")),
                        name: "get_tasks".to_string(),
                    }),
                    args: vec![Argument::Keyword {
                        name: "filter".to_string(),
                        value: string("rows=10"),
                    }],
                },
            })
        );
    }

    #[test]
    fn parses_positional_arguments_and_literals() {
        let stmt = parse_line(r#"print("a", 'b', 3, -4, True, None)  # trailing"#).unwrap();
        let Some(Statement::Expr(Expr::Call { args, .. })) = stmt else {
            panic!("expected a call");
        };
        assert_eq!(
            args,
            vec![
                Argument::Positional(string("a")),
                Argument::Positional(string("b")),
                Argument::Positional(Expr::Literal(Value::Int(3))),
                Argument::Positional(Expr::Literal(Value::Int(-4))),
                Argument::Positional(Expr::Literal(Value::Bool(true))),
                Argument::Positional(Expr::Literal(Value::None)),
            ]
        );
    }

    #[test]
    fn hash_inside_string_is_not_a_comment() {
        let stmt = parse_line("x = 'a#b'").unwrap();
        assert_eq!(
            stmt,
            Some(Statement::Assign {
                name: "x".to_string(),
                value: string("a#b"),
            })
        );
    }

    #[test]
    fn string_escapes() {
        let stmt = parse_line(r"'it\'s\n'").unwrap();
        assert_eq!(stmt, Some(Statement::Expr(string("it's\n"))));
    }

    #[test]
    fn chained_attributes() {
        let stmt = parse_line("args.gmp_username").unwrap();
        assert_eq!(
            stmt,
            Some(Statement::Expr(Expr::Attribute {
                target: Box::new(name("args")),
                name: "gmp_username".to_string(),
            }))
        );
    }

    #[test]
    fn rejects_malformed_lines() {
        for line in [
            "print(",
            "'open",
            "x = ",
            "a b",
            "f(x=1, 2)",
            "gmp.",
            "1 + 2",
        ] {
            let err = parse_line(line).unwrap_err();
            assert!(
                matches!(err, ScriptError::Syntax { .. }),
                "{line:?} gave {err:?}"
            );
        }
    }
}
