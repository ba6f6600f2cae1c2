//! 词法分析器
//!
//! 将规则文本切分为 Token 流：字段名、数字、单引号字符串、布尔值、
//! 比较操作符（最长匹配优先）、连接符 AND/OR 以及括号。空白只作分隔。

use crate::error::{LexError, LexErrorReason};
use crate::operators::{LogicalOperator, Operator};
use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

/// 词法单元
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Identifier(String),
    Number(f64),
    String(String),
    Boolean(bool),
    Operator(Operator),
    Connector(LogicalOperator),
    LParen,
    RParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Identifier(s) => write!(f, "{}", s),
            Token::Number(n) => write!(f, "{}", n),
            Token::String(s) => write!(f, "'{}'", s),
            Token::Boolean(b) => write!(f, "{}", b),
            Token::Operator(op) => write!(f, "'{}'", op),
            Token::Connector(c) => write!(f, "{}", c),
            Token::LParen => write!(f, "'('"),
            Token::RParen => write!(f, "')'"),
        }
    }
}

/// 带位置信息的 Token
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    /// 起始字节偏移
    pub position: usize,
    /// 结束字节偏移（不含）
    pub end: usize,
}

pub struct Lexer<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input,
            chars: input.char_indices().peekable(),
        }
    }

    /// 读取下一个 Token，输入结束时返回 `Ok(None)`
    pub fn next_token(&mut self) -> Result<Option<SpannedToken>, LexError> {
        self.skip_whitespace();

        let Some((start, ch)) = self.chars.next() else {
            return Ok(None);
        };

        let token = match ch {
            '(' => Token::LParen,
            ')' => Token::RParen,
            '=' => Token::Operator(Operator::Eq),
            '>' => self.read_with_equals(Operator::Gt, Operator::Gte),
            '<' => self.read_with_equals(Operator::Lt, Operator::Lte),
            '!' => {
                if self.consume_if('=') {
                    Token::Operator(Operator::Neq)
                } else {
                    return Err(Self::error(start, LexErrorReason::UnexpectedChar('!')));
                }
            }
            '\'' => self.read_string(start)?,
            '-' => self.read_number(start)?,
            c if c.is_ascii_digit() => self.read_number(start)?,
            c if c.is_ascii_alphabetic() || c == '_' => self.read_word(start),
            other => return Err(Self::error(start, LexErrorReason::UnexpectedChar(other))),
        };

        Ok(Some(SpannedToken {
            token,
            position: start,
            end: self.offset(),
        }))
    }

    fn skip_whitespace(&mut self) {
        while let Some(&(_, ch)) = self.chars.peek() {
            if !ch.is_whitespace() {
                break;
            }
            self.chars.next();
        }
    }

    fn consume_if(&mut self, expected: char) -> bool {
        if matches!(self.chars.peek(), Some(&(_, ch)) if ch == expected) {
            self.chars.next();
            true
        } else {
            false
        }
    }

    /// 处理 `>`/`>=` 与 `<`/`<=`
    fn read_with_equals(&mut self, single: Operator, with_equals: Operator) -> Token {
        if self.consume_if('=') {
            Token::Operator(with_equals)
        } else {
            Token::Operator(single)
        }
    }

    /// 读取单引号字符串（不支持转义）
    fn read_string(&mut self, start: usize) -> Result<Token, LexError> {
        let input = self.input;
        let content_start = start + 1;
        for (idx, ch) in self.chars.by_ref() {
            if ch == '\'' {
                return Ok(Token::String(input[content_start..idx].to_string()));
            }
        }
        Err(Self::error(start, LexErrorReason::UnterminatedString))
    }

    /// 读取数字：`-?digits(.digits)?`，紧跟字母、下划线或多余的点视为格式错误
    fn read_number(&mut self, start: usize) -> Result<Token, LexError> {
        while let Some(&(_, ch)) = self.chars.peek() {
            if !(ch.is_ascii_alphanumeric() || ch == '_' || ch == '.') {
                break;
            }
            self.chars.next();
        }

        let input = self.input;
        let text = &input[start..self.offset()];
        if !is_well_formed_number(text) {
            return Err(Self::error(
                start,
                LexErrorReason::MalformedNumber(text.to_string()),
            ));
        }

        // 超出 f64 范围的数值会变成 inf，无法写回规范文本
        match text.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(Token::Number(value)),
            _ => Err(Self::error(
                start,
                LexErrorReason::MalformedNumber(text.to_string()),
            )),
        }
    }

    /// 读取标识符或关键字
    fn read_word(&mut self, start: usize) -> Token {
        while let Some(&(_, ch)) = self.chars.peek() {
            if !(ch.is_ascii_alphanumeric() || ch == '_') {
                break;
            }
            self.chars.next();
        }

        let input = self.input;
        let word = &input[start..self.offset()];
        if let Some(connector) = LogicalOperator::from_keyword(word) {
            return Token::Connector(connector);
        }
        match word {
            "true" => Token::Boolean(true),
            "false" => Token::Boolean(false),
            _ => Token::Identifier(word.to_string()),
        }
    }

    fn offset(&mut self) -> usize {
        self.chars
            .peek()
            .map(|&(idx, _)| idx)
            .unwrap_or(self.input.len())
    }

    fn error(position: usize, reason: LexErrorReason) -> LexError {
        LexError { position, reason }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<SpannedToken, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token().transpose()
    }
}

fn is_well_formed_number(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    let (integer, fraction) = match digits.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (digits, None),
    };

    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    all_digits(integer) && fraction.is_none_or(all_digits)
}

/// 将规则文本切分为 Token 序列
pub fn tokenize(input: &str) -> Result<Vec<SpannedToken>, LexError> {
    Lexer::new(input).collect()
}
