use anyhow::{Context, Result, anyhow, bail};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

use crate::excel::{CellValue, Sheet};
use crate::utils::helpers::{cell_reference, column_index};

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Text(String),
    Ident(String),
    Op(&'static str),
    LParen,
    RParen,
    Comma,
    Colon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CellAddr {
    row: usize,
    col: usize,
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Number(f64),
    Text(String),
    Bool(bool),
    Ref(CellAddr),
    Range(CellAddr, CellAddr),
    Neg(Box<Expr>),
    Binary(&'static str, Box<Expr>, Box<Expr>),
    Call(String, Vec<Expr>),
}

fn tokenize(source: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                    let mut j = i + 1;
                    if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].is_ascii_digit() {
                        i = j;
                        while i < chars.len() && chars[i].is_ascii_digit() {
                            i += 1;
                        }
                    }
                }
                let literal: String = chars[start..i].iter().collect();
                let number = literal
                    .parse::<f64>()
                    .with_context(|| format!("invalid number literal: {}", literal))?;
                tokens.push(Token::Number(number));
            }
            '"' => {
                i += 1;
                let mut text = String::new();
                loop {
                    match chars.get(i) {
                        None => bail!("unterminated string literal"),
                        Some('"') if chars.get(i + 1) == Some(&'"') => {
                            text.push('"');
                            i += 2;
                        }
                        Some('"') => {
                            i += 1;
                            break;
                        }
                        Some(ch) => {
                            text.push(*ch);
                            i += 1;
                        }
                    }
                }
                tokens.push(Token::Text(text));
            }
            '(' | ')' | ',' | ':' => {
                tokens.push(match c {
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    ',' => Token::Comma,
                    _ => Token::Colon,
                });
                i += 1;
            }
            '<' | '>' => {
                let op = match (c, chars.get(i + 1)) {
                    ('<', Some('=')) => "<=",
                    ('<', Some('>')) => "<>",
                    ('>', Some('=')) => ">=",
                    ('<', _) => "<",
                    _ => ">",
                };
                i += op.len();
                tokens.push(Token::Op(op));
            }
            '+' | '-' | '*' | '/' | '^' | '&' | '=' => {
                let op = match c {
                    '+' => "+",
                    '-' => "-",
                    '*' => "*",
                    '/' => "/",
                    '^' => "^",
                    '&' => "&",
                    _ => "=",
                };
                tokens.push(Token::Op(op));
                i += 1;
            }
            '!' => bail!("references to other sheets are not supported"),
            c if c.is_ascii_alphabetic() || c == '$' || c == '_' => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_ascii_alphanumeric() || matches!(chars[i], '$' | '_' | '.'))
                {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            _ => bail!("unexpected character '{}'", c),
        }
    }

    Ok(tokens)
}

/// `A1`, `$B$4` or `c12` to a 0-based address.
fn parse_cell_ref(ident: &str) -> Option<CellAddr> {
    let plain: String = ident.chars().filter(|c| *c != '$').collect();
    let split = plain.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = plain.split_at(split);

    let col = column_index(letters)?;
    let row = digits.parse::<usize>().ok()?.checked_sub(1)?;

    Some(CellAddr { row, col })
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn eat_op(&mut self, ops: &[&'static str]) -> Option<&'static str> {
        match self.peek() {
            Some(Token::Op(op)) if ops.contains(op) => {
                let op = *op;
                self.pos += 1;
                Some(op)
            }
            _ => None,
        }
    }

    fn expect(&mut self, expected: Token) -> Result<()> {
        match self.next() {
            Some(token) if token == expected => Ok(()),
            other => bail!("expected {:?}, found {:?}", expected, other),
        }
    }

    fn parse(mut self) -> Result<Expr> {
        let expr = self.comparison()?;
        if let Some(token) = self.peek() {
            bail!("unexpected trailing token {:?}", token);
        }
        Ok(expr)
    }

    fn binary_level(
        &mut self,
        ops: &[&'static str],
        operand: fn(&mut Self) -> Result<Expr>,
    ) -> Result<Expr> {
        let mut lhs = operand(self)?;
        while let Some(op) = self.eat_op(ops) {
            let rhs = operand(self)?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn comparison(&mut self) -> Result<Expr> {
        self.binary_level(&["=", "<>", "<", "<=", ">", ">="], Self::concat)
    }

    fn concat(&mut self) -> Result<Expr> {
        self.binary_level(&["&"], Self::additive)
    }

    fn additive(&mut self) -> Result<Expr> {
        self.binary_level(&["+", "-"], Self::multiplicative)
    }

    fn multiplicative(&mut self) -> Result<Expr> {
        self.binary_level(&["*", "/"], Self::power)
    }

    fn power(&mut self) -> Result<Expr> {
        self.binary_level(&["^"], Self::unary)
    }

    fn unary(&mut self) -> Result<Expr> {
        match self.eat_op(&["-", "+"]) {
            Some("-") => Ok(Expr::Neg(Box::new(self.unary()?))),
            Some(_) => self.unary(),
            None => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<Expr> {
        match self.next() {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::Text(s)) => Ok(Expr::Text(s)),
            Some(Token::LParen) => {
                let expr = self.comparison()?;
                self.expect(Token::RParen)?;
                Ok(expr)
            }
            Some(Token::Ident(name)) => {
                if self.peek() == Some(&Token::LParen) {
                    self.pos += 1;
                    return self.call(name);
                }

                match name.to_ascii_uppercase().as_str() {
                    "TRUE" => return Ok(Expr::Bool(true)),
                    "FALSE" => return Ok(Expr::Bool(false)),
                    _ => {}
                }

                let start = parse_cell_ref(&name)
                    .ok_or_else(|| anyhow!("unsupported name or reference: {}", name))?;

                if self.peek() == Some(&Token::Colon) {
                    self.pos += 1;
                    let end = match self.next() {
                        Some(Token::Ident(end)) => parse_cell_ref(&end),
                        _ => None,
                    }
                    .ok_or_else(|| anyhow!("invalid range after {}", name))?;
                    return Ok(Expr::Range(start, end));
                }

                Ok(Expr::Ref(start))
            }
            other => bail!("unexpected token {:?}", other),
        }
    }

    fn call(&mut self, name: String) -> Result<Expr> {
        let mut args = Vec::new();

        if self.peek() == Some(&Token::RParen) {
            self.pos += 1;
            return Ok(Expr::Call(name.to_ascii_uppercase(), args));
        }

        loop {
            args.push(self.comparison()?);
            match self.next() {
                Some(Token::Comma) => continue,
                Some(Token::RParen) => break,
                other => bail!("expected ',' or ')' in {}(), found {:?}", name, other),
            }
        }

        Ok(Expr::Call(name.to_ascii_uppercase(), args))
    }
}

fn parse_formula(source: &str) -> Result<Expr> {
    let source = source.trim().trim_start_matches('=');
    Parser {
        tokens: tokenize(source)?,
        pos: 0,
    }
    .parse()
}

fn to_number(value: &CellValue) -> Result<f64> {
    match value {
        CellValue::Number(f) => Ok(*f),
        CellValue::Int(i) => Ok(*i as f64),
        CellValue::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        CellValue::Empty => Ok(0.0),
        CellValue::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| anyhow!("#VALUE! (text {:?} is not a number)", s)),
        CellValue::Other => bail!("#VALUE! (error or date operand)"),
    }
}

fn to_text(value: &CellValue) -> String {
    match value {
        CellValue::Number(f) if f.fract() == 0.0 && f.abs() < 1e15 => (*f as i64).to_string(),
        CellValue::Number(f) => f.to_string(),
        CellValue::Int(i) => i.to_string(),
        CellValue::Text(s) => s.clone(),
        CellValue::Bool(true) => "TRUE".to_string(),
        CellValue::Bool(false) => "FALSE".to_string(),
        CellValue::Empty | CellValue::Other => String::new(),
    }
}

fn to_bool(value: &CellValue) -> Result<bool> {
    match value {
        CellValue::Bool(b) => Ok(*b),
        CellValue::Text(s) if s.eq_ignore_ascii_case("true") => Ok(true),
        CellValue::Text(s) if s.eq_ignore_ascii_case("false") => Ok(false),
        CellValue::Text(s) => bail!("#VALUE! (text {:?} is not a boolean)", s),
        other => Ok(to_number(other)? != 0.0),
    }
}

/// Numbers sort before text, text compares case-insensitively.
fn compare(lhs: &CellValue, rhs: &CellValue) -> Result<Ordering> {
    match (lhs, rhs) {
        (CellValue::Text(a), CellValue::Text(b)) => Ok(a.to_lowercase().cmp(&b.to_lowercase())),
        (CellValue::Text(_), _) => Ok(Ordering::Greater),
        (_, CellValue::Text(_)) => Ok(Ordering::Less),
        _ => to_number(lhs)?
            .partial_cmp(&to_number(rhs)?)
            .context("#NUM! (cannot compare NaN)"),
    }
}

/// Evaluates formulas against one sheet, memoizing formula cells it visits.
pub struct FormulaEvaluator<'a> {
    sheet: &'a Sheet,
    resolved: HashMap<CellAddr, CellValue>,
    in_progress: HashSet<CellAddr>,
}

impl<'a> FormulaEvaluator<'a> {
    pub fn new(sheet: &'a Sheet) -> Self {
        Self {
            sheet,
            resolved: HashMap::new(),
            in_progress: HashSet::new(),
        }
    }

    /// Evaluates a formula source such as `=B4*2` or `SUM(A1:A3)`.
    pub fn evaluate(&mut self, source: &str) -> Result<CellValue> {
        let expr = parse_formula(source)?;
        self.eval(&expr)
    }

    /// Value of the cell at `(row, col)`, evaluating it first if it holds a formula.
    pub fn evaluate_cell(&mut self, row: usize, col: usize) -> Result<CellValue> {
        self.cell_value(CellAddr { row, col })
    }

    fn cell_value(&mut self, addr: CellAddr) -> Result<CellValue> {
        let sheet = self.sheet;
        let Some(source) = sheet.formula(addr.row, addr.col) else {
            return Ok(sheet.cell(addr.row, addr.col).clone());
        };

        if let Some(value) = self.resolved.get(&addr) {
            return Ok(value.clone());
        }
        if !self.in_progress.insert(addr) {
            bail!(
                "circular reference at {}",
                cell_reference(addr.row, addr.col)
            );
        }

        let result = parse_formula(source).and_then(|expr| self.eval(&expr));
        self.in_progress.remove(&addr);

        let value = result?;
        self.resolved.insert(addr, value.clone());
        Ok(value)
    }

    fn eval(&mut self, expr: &Expr) -> Result<CellValue> {
        match expr {
            Expr::Number(n) => Ok(CellValue::Number(*n)),
            Expr::Text(s) => Ok(CellValue::Text(s.clone())),
            Expr::Bool(b) => Ok(CellValue::Bool(*b)),
            Expr::Ref(addr) => self.cell_value(*addr),
            Expr::Range(..) => bail!("#VALUE! (range used outside a function)"),
            Expr::Neg(inner) => Ok(CellValue::Number(-to_number(&self.eval(inner)?)?)),
            Expr::Binary(op, lhs, rhs) => {
                let lhs = self.eval(lhs)?;
                let rhs = self.eval(rhs)?;
                self.binary(op, &lhs, &rhs)
            }
            Expr::Call(name, args) => self.call(name, args),
        }
    }

    fn binary(&self, op: &str, lhs: &CellValue, rhs: &CellValue) -> Result<CellValue> {
        let value = match op {
            "&" => CellValue::Text(to_text(lhs) + &to_text(rhs)),
            "=" => CellValue::Bool(compare(lhs, rhs)? == Ordering::Equal),
            "<>" => CellValue::Bool(compare(lhs, rhs)? != Ordering::Equal),
            "<" => CellValue::Bool(compare(lhs, rhs)? == Ordering::Less),
            "<=" => CellValue::Bool(compare(lhs, rhs)? != Ordering::Greater),
            ">" => CellValue::Bool(compare(lhs, rhs)? == Ordering::Greater),
            ">=" => CellValue::Bool(compare(lhs, rhs)? != Ordering::Less),
            _ => {
                let (a, b) = (to_number(lhs)?, to_number(rhs)?);
                CellValue::Number(match op {
                    "+" => a + b,
                    "-" => a - b,
                    "*" => a * b,
                    "/" if b == 0.0 => bail!("#DIV/0!"),
                    "/" => a / b,
                    "^" => a.powf(b),
                    _ => bail!("unknown operator {}", op),
                })
            }
        };
        Ok(value)
    }

    /// Numbers an aggregate sees: text, booleans and blanks inside ranges are skipped.
    fn numbers(&mut self, args: &[Expr]) -> Result<Vec<f64>> {
        let mut numbers = Vec::new();

        for arg in args {
            match arg {
                Expr::Range(start, end) => {
                    for row in start.row.min(end.row)..=start.row.max(end.row) {
                        for col in start.col.min(end.col)..=start.col.max(end.col) {
                            match self.cell_value(CellAddr { row, col })? {
                                CellValue::Number(f) => numbers.push(f),
                                CellValue::Int(i) => numbers.push(i as f64),
                                _ => {}
                            }
                        }
                    }
                }
                other => {
                    let value = self.eval(other)?;
                    numbers.push(to_number(&value)?);
                }
            }
        }

        Ok(numbers)
    }

    fn scalar_args(&mut self, name: &str, args: &[Expr], count: usize) -> Result<Vec<CellValue>> {
        if args.len() != count {
            bail!("{}() takes {} argument(s), got {}", name, count, args.len());
        }
        args.iter().map(|arg| self.eval(arg)).collect()
    }

    fn call(&mut self, name: &str, args: &[Expr]) -> Result<CellValue> {
        let number = |f: f64| -> Result<CellValue> { Ok(CellValue::Number(f)) };

        match name {
            "SUM" => number(self.numbers(args)?.iter().sum()),
            "MIN" => number(self.numbers(args)?.into_iter().reduce(f64::min).unwrap_or(0.0)),
            "MAX" => number(self.numbers(args)?.into_iter().reduce(f64::max).unwrap_or(0.0)),
            "AVERAGE" => {
                let numbers = self.numbers(args)?;
                if numbers.is_empty() {
                    bail!("#DIV/0! (AVERAGE of nothing)");
                }
                number(numbers.iter().sum::<f64>() / numbers.len() as f64)
            }
            "COUNT" => number(self.numbers(args)?.len() as f64),
            "ABS" => number(to_number(&self.scalar_args(name, args, 1)?[0])?.abs()),
            "INT" => number(to_number(&self.scalar_args(name, args, 1)?[0])?.floor()),
            "TRUNC" => number(to_number(&self.scalar_args(name, args, 1)?[0])?.trunc()),
            "ROUND" => {
                let values = self.scalar_args(name, args, 2)?;
                let factor = 10f64.powi(to_number(&values[1])?.trunc() as i32);
                number((to_number(&values[0])? * factor).round() / factor)
            }
            "MOD" => {
                let values = self.scalar_args(name, args, 2)?;
                let (a, b) = (to_number(&values[0])?, to_number(&values[1])?);
                if b == 0.0 {
                    bail!("#DIV/0! (MOD by zero)");
                }
                number(a - b * (a / b).floor())
            }
            "IF" => {
                if !(2..=3).contains(&args.len()) {
                    bail!("IF() takes 2 or 3 arguments, got {}", args.len());
                }
                let condition = self.eval(&args[0])?;
                if to_bool(&condition)? {
                    self.eval(&args[1])
                } else if let Some(otherwise) = args.get(2) {
                    self.eval(otherwise)
                } else {
                    Ok(CellValue::Bool(false))
                }
            }
            "AND" | "OR" => {
                let mut flags = Vec::with_capacity(args.len());
                for arg in args {
                    let value = self.eval(arg)?;
                    flags.push(to_bool(&value)?);
                }
                let result = if name == "AND" {
                    flags.iter().all(|f| *f)
                } else {
                    flags.iter().any(|f| *f)
                };
                Ok(CellValue::Bool(result))
            }
            "NOT" => Ok(CellValue::Bool(!to_bool(&self.scalar_args(name, args, 1)?[0])?)),
            "VALUE" => number(to_number(&self.scalar_args(name, args, 1)?[0])?),
            _ => bail!("unsupported function {}()", name),
        }
    }
}

/// Replaces the cached value of every formula cell with its evaluated result.
///
/// A formula the evaluator cannot handle keeps the cached value and is reported
/// with a warning, as is a formula whose cached value is empty.
pub fn evaluate_formulas(sheet: &mut Sheet) {
    if sheet.formulas.is_empty() {
        return;
    }

    let mut evaluated = Vec::with_capacity(sheet.formulas.len());
    {
        let mut evaluator = FormulaEvaluator::new(sheet);

        for (&(row, col), source) in &sheet.formulas {
            let cell = cell_reference(row, col);
            match evaluator.evaluate_cell(row, col) {
                Ok(value) => {
                    debug!(%cell, formula = %source, ?value, "evaluated formula");
                    evaluated.push((row, col, value));
                }
                Err(err) => {
                    let cached = sheet.cell(row, col);
                    if cached.is_empty() {
                        warn!(
                            %cell,
                            formula = %source,
                            "could not evaluate formula and the file caches no result; it resolves to 0: {:#}",
                            err
                        );
                    } else {
                        warn!(
                            %cell,
                            formula = %source,
                            ?cached,
                            "could not evaluate formula, using the cached result: {:#}",
                            err
                        );
                    }
                }
            }
        }
    }

    for (row, col, value) in evaluated {
        sheet.set_cell(row, col, value);
    }
}
