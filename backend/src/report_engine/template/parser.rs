use super::filters;
use super::lexer::{tokenize, Segment, Token};
use super::value::Value;
use crate::report_engine::error::TemplateError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Text(String),
    Output {
        expr: Expr,
        line: usize,
    },
    If {
        branches: Vec<(Expr, Vec<Node>)>,
        otherwise: Vec<Node>,
        line: usize,
    },
    For {
        targets: Vec<String>,
        iterable: Expr,
        condition: Option<Expr>,
        body: Vec<Node>,
        otherwise: Vec<Node>,
        line: usize,
    },
    Set {
        name: String,
        value: Expr,
        line: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum UnaryOp {
    Not,
    Neg,
    Pos,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Concat,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    NotIn,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Args {
    pub positional: Vec<Expr>,
    pub keyword: Vec<(String, Expr)>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Literal(Value),
    List(Vec<Expr>),
    Var(String),
    Attr(Box<Expr>, String),
    Item(Box<Expr>, Box<Expr>),
    Call(Box<Expr>, Args),
    Filter {
        name: String,
        value: Box<Expr>,
        args: Args,
    },
    Test {
        name: String,
        value: Box<Expr>,
        negated: bool,
    },
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Compare(Box<Expr>, Vec<(CompareOp, Expr)>),
    Conditional {
        test: Box<Expr>,
        then: Box<Expr>,
        otherwise: Option<Box<Expr>>,
    },
}

/// A statement tag that closed a block, handed back to the caller that opened it.
struct EndTag {
    keyword: String,
    tokens: Vec<Token>,
    line: usize,
}

pub(crate) fn parse(segments: Vec<Segment>) -> Result<Vec<Node>, TemplateError> {
    let mut parser = BlockParser {
        segments: segments.into_iter(),
    };
    let (nodes, end) = parser.parse_until(&[])?;
    match end {
        None => Ok(nodes),
        Some(tag) => Err(unexpected_tag(&tag)),
    }
}

struct BlockParser {
    segments: std::vec::IntoIter<Segment>,
}

impl BlockParser {
    fn parse_until(&mut self, stop: &[&str]) -> Result<(Vec<Node>, Option<EndTag>), TemplateError> {
        let mut nodes = Vec::new();
        while let Some(segment) = self.segments.next() {
            match segment {
                Segment::Text(text) => nodes.push(Node::Text(text)),
                Segment::Output { source, line } => {
                    let expr = ExprParser::new(&source, line)?.parse_all()?;
                    nodes.push(Node::Output { expr, line });
                }
                Segment::Statement { source, line } => {
                    let mut tokens = tokenize(&source, line)?;
                    let keyword = match tokens.first() {
                        Some(Token::Name(name)) => name.clone(),
                        _ => return Err(TemplateError::syntax(line, "expected a statement keyword")),
                    };
                    tokens.remove(0);

                    if stop.contains(&keyword.as_str()) {
                        return Ok((nodes, Some(EndTag { keyword, tokens, line })));
                    }
                    let node = match keyword.as_str() {
                        "if" => self.parse_if(tokens, line)?,
                        "for" => self.parse_for(tokens, line)?,
                        "set" => parse_set(tokens, line)?,
                        "elif" | "else" | "endif" | "endfor" => {
                            return Err(TemplateError::syntax(
                                line,
                                format!("unexpected '{}'", keyword),
                            ))
                        }
                        other => {
                            return Err(TemplateError::syntax(
                                line,
                                format!("unknown statement '{}'", other),
                            ))
                        }
                    };
                    nodes.push(node);
                }
            }
        }
        Ok((nodes, None))
    }

    fn parse_if(&mut self, tokens: Vec<Token>, line: usize) -> Result<Node, TemplateError> {
        let mut branches = Vec::new();
        let mut test = ExprParser::from_tokens(tokens, line).parse_all()?;
        loop {
            let (body, end) = self.parse_until(&["elif", "else", "endif"])?;
            branches.push((test, body));
            let end = end.ok_or_else(|| missing_end(line, "endif"))?;
            match end.keyword.as_str() {
                "elif" => test = ExprParser::from_tokens(end.tokens, end.line).parse_all()?,
                "else" => {
                    expect_bare(&end)?;
                    let (otherwise, close) = self.parse_until(&["endif"])?;
                    let close = close.ok_or_else(|| missing_end(line, "endif"))?;
                    expect_bare(&close)?;
                    return Ok(Node::If {
                        branches,
                        otherwise,
                        line,
                    });
                }
                _ => {
                    expect_bare(&end)?;
                    return Ok(Node::If {
                        branches,
                        otherwise: Vec::new(),
                        line,
                    });
                }
            }
        }
    }

    fn parse_for(&mut self, tokens: Vec<Token>, line: usize) -> Result<Node, TemplateError> {
        let mut header = ExprParser::from_tokens(tokens, line);
        let mut targets = vec![header.expect_name()?];
        while header.eat_punct(",") {
            targets.push(header.expect_name()?);
        }
        if !header.eat_name("in") {
            return Err(TemplateError::syntax(line, "expected 'in' in for loop"));
        }
        if header.peek().is_none() {
            return Err(TemplateError::syntax(line, "expected an expression"));
        }
        let iterable = header.parse_or()?;
        let condition = if header.eat_name("if") {
            Some(header.parse_all()?)
        } else {
            header.expect_end()?;
            None
        };

        let (body, end) = self.parse_until(&["else", "endfor"])?;
        let end = end.ok_or_else(|| missing_end(line, "endfor"))?;
        expect_bare(&end)?;
        let otherwise = if end.keyword == "else" {
            let (otherwise, close) = self.parse_until(&["endfor"])?;
            let close = close.ok_or_else(|| missing_end(line, "endfor"))?;
            expect_bare(&close)?;
            otherwise
        } else {
            Vec::new()
        };

        Ok(Node::For {
            targets,
            iterable,
            condition,
            body,
            otherwise,
            line,
        })
    }
}

fn parse_set(tokens: Vec<Token>, line: usize) -> Result<Node, TemplateError> {
    let mut parser = ExprParser::from_tokens(tokens, line);
    let name = parser.expect_name()?;
    if !parser.eat_punct("=") {
        return Err(TemplateError::syntax(line, "expected '=' after set target"));
    }
    let value = parser.parse_all()?;
    Ok(Node::Set { name, value, line })
}

fn expect_bare(tag: &EndTag) -> Result<(), TemplateError> {
    if tag.tokens.is_empty() {
        Ok(())
    } else {
        Err(TemplateError::syntax(
            tag.line,
            format!("unexpected tokens after '{}'", tag.keyword),
        ))
    }
}

fn unexpected_tag(tag: &EndTag) -> TemplateError {
    TemplateError::syntax(tag.line, format!("unexpected '{}'", tag.keyword))
}

fn missing_end(line: usize, keyword: &str) -> TemplateError {
    TemplateError::syntax(
        line,
        format!("unexpected end of template, block opened here needs '{}'", keyword),
    )
}

struct ExprParser {
    tokens: Vec<Token>,
    pos: usize,
    line: usize,
}

impl ExprParser {
    fn new(source: &str, line: usize) -> Result<Self, TemplateError> {
        Ok(Self::from_tokens(tokenize(source, line)?, line))
    }

    fn from_tokens(tokens: Vec<Token>, line: usize) -> Self {
        ExprParser {
            tokens,
            pos: 0,
            line,
        }
    }

    fn error(&self, message: impl Into<String>) -> TemplateError {
        TemplateError::syntax(self.line, message)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn is_punct(&self, punct: &str) -> bool {
        matches!(self.peek(), Some(Token::Punct(p)) if *p == punct)
    }

    fn is_name(&self, name: &str) -> bool {
        matches!(self.peek(), Some(Token::Name(n)) if n == name)
    }

    fn eat_punct(&mut self, punct: &str) -> bool {
        let found = self.is_punct(punct);
        if found {
            self.pos += 1;
        }
        found
    }

    fn eat_name(&mut self, name: &str) -> bool {
        let found = self.is_name(name);
        if found {
            self.pos += 1;
        }
        found
    }

    fn expect_punct(&mut self, punct: &str) -> Result<(), TemplateError> {
        if self.eat_punct(punct) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{}'", punct)))
        }
    }

    fn expect_name(&mut self) -> Result<String, TemplateError> {
        match self.advance() {
            Some(Token::Name(name)) => Ok(name),
            _ => Err(self.error("expected a name")),
        }
    }

    /// Parses one expression that must consume every remaining token.
    fn parse_all(&mut self) -> Result<Expr, TemplateError> {
        if self.peek().is_none() {
            return Err(self.error("expected an expression"));
        }
        let expr = self.parse_expression()?;
        self.expect_end()?;
        Ok(expr)
    }

    fn expect_end(&self) -> Result<(), TemplateError> {
        match self.peek() {
            None => Ok(()),
            Some(token) => Err(self.error(format!("unexpected token {:?}", token))),
        }
    }

    fn parse_expression(&mut self) -> Result<Expr, TemplateError> {
        let expr = self.parse_or()?;
        if self.eat_name("if") {
            let test = self.parse_or()?;
            let otherwise = if self.eat_name("else") {
                Some(Box::new(self.parse_expression()?))
            } else {
                None
            };
            return Ok(Expr::Conditional {
                test: Box::new(test),
                then: Box::new(expr),
                otherwise,
            });
        }
        Ok(expr)
    }

    fn parse_or(&mut self) -> Result<Expr, TemplateError> {
        let mut left = self.parse_and()?;
        while self.eat_name("or") {
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, TemplateError> {
        let mut left = self.parse_not()?;
        while self.eat_name("and") {
            let right = self.parse_not()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr, TemplateError> {
        if self.eat_name("not") {
            let operand = self.parse_not()?;
            return Ok(Expr::Unary(UnaryOp::Not, Box::new(operand)));
        }
        self.parse_compare()
    }

    fn parse_compare(&mut self) -> Result<Expr, TemplateError> {
        let left = self.parse_additive()?;
        let mut ops = Vec::new();
        loop {
            let (op, width) = match self.peek() {
                Some(Token::Punct("==")) => (CompareOp::Eq, 1),
                Some(Token::Punct("!=")) => (CompareOp::Ne, 1),
                Some(Token::Punct("<")) => (CompareOp::Lt, 1),
                Some(Token::Punct("<=")) => (CompareOp::Le, 1),
                Some(Token::Punct(">")) => (CompareOp::Gt, 1),
                Some(Token::Punct(">=")) => (CompareOp::Ge, 1),
                Some(Token::Name(n)) if n == "in" => (CompareOp::In, 1),
                Some(Token::Name(n))
                    if n == "not" && matches!(self.peek_at(1), Some(Token::Name(m)) if m == "in") =>
                {
                    (CompareOp::NotIn, 2)
                }
                _ => break,
            };
            self.pos += width;
            ops.push((op, self.parse_additive()?));
        }
        if ops.is_empty() {
            Ok(left)
        } else {
            Ok(Expr::Compare(Box::new(left), ops))
        }
    }

    fn parse_additive(&mut self) -> Result<Expr, TemplateError> {
        let mut left = self.parse_concat()?;
        loop {
            let op = if self.eat_punct("+") {
                BinaryOp::Add
            } else if self.eat_punct("-") {
                BinaryOp::Sub
            } else {
                break;
            };
            let right = self.parse_concat()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_concat(&mut self) -> Result<Expr, TemplateError> {
        let mut left = self.parse_multiplicative()?;
        while self.eat_punct("~") {
            let right = self.parse_multiplicative()?;
            left = Expr::Binary(BinaryOp::Concat, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, TemplateError> {
        let mut left = self.parse_unary(true)?;
        loop {
            let op = if self.eat_punct("*") {
                BinaryOp::Mul
            } else if self.eat_punct("//") {
                BinaryOp::FloorDiv
            } else if self.eat_punct("/") {
                BinaryOp::Div
            } else if self.eat_punct("%") {
                BinaryOp::Mod
            } else {
                break;
            };
            let right = self.parse_unary(true)?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    // Filters bind tighter than arithmetic but looser than a unary sign:
    // `-x | abs` is `(-x) | abs`.
    fn parse_unary(&mut self, with_filters: bool) -> Result<Expr, TemplateError> {
        let expr = if self.eat_punct("-") {
            Expr::Unary(UnaryOp::Neg, Box::new(self.parse_unary(false)?))
        } else if self.eat_punct("+") {
            Expr::Unary(UnaryOp::Pos, Box::new(self.parse_unary(false)?))
        } else {
            let primary = self.parse_primary()?;
            self.parse_postfix(primary)?
        };
        if with_filters {
            self.parse_filters(expr)
        } else {
            Ok(expr)
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, TemplateError> {
        match self.advance() {
            Some(Token::Name(name)) => Ok(match name.as_str() {
                "true" | "True" => Expr::Literal(Value::Bool(true)),
                "false" | "False" => Expr::Literal(Value::Bool(false)),
                "none" | "None" => Expr::Literal(Value::None),
                _ => Expr::Var(name),
            }),
            Some(Token::Str(s)) => Ok(Expr::Literal(Value::Str(s))),
            Some(Token::Int(i)) => Ok(Expr::Literal(Value::Int(i))),
            Some(Token::Float(f)) => Ok(Expr::Literal(Value::Float(f))),
            Some(Token::Punct("(")) => {
                let inner = self.parse_expression()?;
                self.expect_punct(")")?;
                Ok(inner)
            }
            Some(Token::Punct("[")) => {
                let mut items = Vec::new();
                while !self.is_punct("]") {
                    items.push(self.parse_expression()?);
                    if !self.eat_punct(",") {
                        break;
                    }
                }
                self.expect_punct("]")?;
                Ok(Expr::List(items))
            }
            Some(token) => Err(self.error(format!("unexpected token {:?}", token))),
            None => Err(self.error("unexpected end of expression")),
        }
    }

    fn parse_postfix(&mut self, mut expr: Expr) -> Result<Expr, TemplateError> {
        loop {
            if self.eat_punct(".") {
                expr = match self.advance() {
                    Some(Token::Name(name)) => Expr::Attr(Box::new(expr), name),
                    Some(Token::Int(i)) => {
                        Expr::Item(Box::new(expr), Box::new(Expr::Literal(Value::Int(i))))
                    }
                    _ => return Err(self.error("expected an attribute name after '.'")),
                };
            } else if self.eat_punct("[") {
                let key = self.parse_expression()?;
                self.expect_punct("]")?;
                expr = Expr::Item(Box::new(expr), Box::new(key));
            } else if self.is_punct("(") {
                let args = self.parse_args()?;
                expr = Expr::Call(Box::new(expr), args);
            } else {
                return Ok(expr);
            }
        }
    }

    fn parse_filters(&mut self, mut expr: Expr) -> Result<Expr, TemplateError> {
        loop {
            if self.eat_punct("|") {
                let name = self.expect_name()?;
                if !filters::is_filter(&name) {
                    return Err(self.error(format!("no filter named '{}'", name)));
                }
                let args = if self.is_punct("(") {
                    self.parse_args()?
                } else {
                    Args::default()
                };
                expr = Expr::Filter {
                    name,
                    value: Box::new(expr),
                    args,
                };
            } else if self.eat_name("is") {
                let negated = self.eat_name("not");
                let name = self.expect_name()?;
                if !filters::is_test(&name) {
                    return Err(self.error(format!("no test named '{}'", name)));
                }
                expr = Expr::Test {
                    name,
                    value: Box::new(expr),
                    negated,
                };
            } else {
                return Ok(expr);
            }
        }
    }

    fn parse_args(&mut self) -> Result<Args, TemplateError> {
        self.expect_punct("(")?;
        let mut args = Args::default();
        while !self.is_punct(")") {
            let is_keyword = matches!(self.peek(), Some(Token::Name(_)))
                && matches!(self.peek_at(1), Some(Token::Punct("=")));
            if is_keyword {
                let name = self.expect_name()?;
                self.pos += 1;
                args.keyword.push((name, self.parse_expression()?));
            } else if args.keyword.is_empty() {
                args.positional.push(self.parse_expression()?);
            } else {
                return Err(self.error("positional argument follows keyword argument"));
            }
            if !self.eat_punct(",") {
                break;
            }
        }
        self.expect_punct(")")?;
        Ok(args)
    }
}
