//! 语法分析器
//!
//! 单遍、无回溯的递归下降解析，将 Token 序列转换为 `Expression`。
//!
//! 语法：
//!   expression --> term ( connector term )*
//!   term       --> IDENT operator literal | "(" expression ")"
//!   operator   --> ">" | "<" | "=" | ">=" | "<=" | "!="
//!   literal    --> NUMBER | STRING | "true" | "false"
//!   connector  --> "AND" | "OR"
//!
//! 同一层表达式中的连接符必须一致；括号内的子表达式拥有各自的连接符。
//! 括号最多嵌套 `MAX_NESTING_DEPTH` 层。
//! 字面量按词法形式定型，解析阶段不做类型转换。

use crate::ast::{Condition, Expression, Literal, MAX_NESTING_DEPTH, Term};
use crate::error::{ParseError, SyntaxError};
use crate::lexer::{SpannedToken, Token, tokenize};
use crate::operators::{LogicalOperator, Operator};

const END_OF_INPUT: &str = "输入结束";

pub struct Parser {
    tokens: Vec<SpannedToken>,
    pos: usize,
    end: usize,
    /// 当前所在的括号层数
    depth: usize,
}

impl Parser {
    pub fn new(tokens: Vec<SpannedToken>) -> Self {
        let end = tokens.last().map(|t| t.end).unwrap_or(0);
        Parser {
            tokens,
            pos: 0,
            end,
            depth: 0,
        }
    }

    /// 解析完整的 Token 序列
    pub fn parse(&mut self) -> Result<Expression, ParseError> {
        if self.tokens.is_empty() {
            return Err(ParseError::EmptyExpression);
        }

        let expr = self.parse_expression()?;

        // 表达式之后只能是输入结束
        if self.peek().is_some() {
            return Err(self.unexpected("连接符 AND 或 OR"));
        }

        Ok(expr)
    }

    fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        let mut terms = vec![self.parse_term()?];
        let mut connector: Option<LogicalOperator> = None;

        while let Some(Token::Connector(found)) = self.peek() {
            let found = *found;
            let position = self.position();

            match connector {
                None => connector = Some(found),
                Some(expected) if expected != found => {
                    return Err(ParseError::MixedConnectors {
                        position,
                        expected,
                        found,
                    });
                }
                Some(_) => {}
            }

            self.advance();
            terms.push(self.parse_term()?);
        }

        Ok(Expression::from_parts(connector, terms))
    }

    fn parse_term(&mut self) -> Result<Term, ParseError> {
        match self.peek() {
            Some(Token::LParen) => {
                if self.depth >= MAX_NESTING_DEPTH {
                    return Err(ParseError::NestingTooDeep {
                        position: self.position(),
                        max: MAX_NESTING_DEPTH,
                    });
                }
                self.advance();
                self.depth += 1;
                let inner = self.parse_expression()?;
                self.expect_rparen()?;
                self.depth -= 1;
                Ok(Term::Group(Box::new(inner)))
            }
            Some(Token::Identifier(field)) => {
                let field = field.clone();
                self.advance();
                let operator = self.parse_operator()?;
                let value = self.parse_literal()?;
                Ok(Term::Condition(Condition::new(field, operator, value)))
            }
            _ => Err(self.unexpected("字段名或 '('")),
        }
    }

    fn parse_operator(&mut self) -> Result<Operator, ParseError> {
        match self.peek() {
            Some(Token::Operator(op)) => {
                let op = *op;
                self.advance();
                Ok(op)
            }
            _ => Err(self.unexpected("比较操作符")),
        }
    }

    fn parse_literal(&mut self) -> Result<Literal, ParseError> {
        let literal = match self.peek() {
            Some(Token::Number(n)) => Literal::Number(*n),
            Some(Token::String(s)) => Literal::String(s.clone()),
            Some(Token::Boolean(b)) => Literal::Boolean(*b),
            _ => return Err(self.unexpected("数字、字符串或布尔字面量")),
        };
        self.advance();
        Ok(literal)
    }

    fn expect_rparen(&mut self) -> Result<(), ParseError> {
        if matches!(self.peek(), Some(Token::RParen)) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected("')'"))
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn position(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|t| t.position)
            .unwrap_or(self.end)
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        ParseError::UnexpectedToken {
            position: self.position(),
            expected: expected.to_string(),
            found: self
                .peek()
                .map(|t| t.to_string())
                .unwrap_or_else(|| END_OF_INPUT.to_string()),
        }
    }
}

/// 解析 Token 序列
pub fn parse(tokens: Vec<SpannedToken>) -> Result<Expression, ParseError> {
    Parser::new(tokens).parse()
}

/// 词法 + 语法分析一步完成
pub fn parse_rule(input: &str) -> Result<Expression, SyntaxError> {
    let tokens = tokenize(input)?;
    Ok(parse(tokens)?)
}
