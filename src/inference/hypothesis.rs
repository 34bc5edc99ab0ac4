//! inference::hypothesis — transforms of the estimate vector.
//!
//! Purpose
//! -------
//! Re-express a vector of estimates `e` (with Jacobian `J = ∂e/∂θ`) as new
//! quantities `h(e)` before testing, propagating uncertainty one level up:
//! the transformed Jacobian is `J_h · J`, where `J_h = ∂h/∂e`.
//!
//! Key behaviors
//! -------------
//! - [`Hypothesis::Value`] keeps the estimates and changes the null value.
//! - [`Hypothesis::Expression`] parses an algebraic string once
//!   (`"b1 - b2 = 0"`, `"b1 * b3 = b3*2"`, `"exp(b1) / b2"`) into a small
//!   expression tree, evaluated on the estimate vector. `lhs = rhs` is
//!   tested as `lhs − rhs = 0`. Its gradient with respect to `e` is taken by
//!   `finitediff` central differences.
//! - [`Hypothesis::Pairwise`], [`Hypothesis::Reference`], and
//!   [`Hypothesis::Sequential`] are linear contrasts between estimates;
//!   [`Hypothesis::Matrix`] applies an arbitrary `m × k` contrast matrix
//!   (`h = Mᵀ e`). Linear transforms use their exact Jacobian.
//!
//! Conventions
//! -----------
//! - Estimate references are 1-based: `b1` is the first estimate row.
//! - Labels: the expression text without whitespace, `b1 - b2` style for
//!   the built-in contrasts, `H1`, `H2`, ... for matrix columns.
use crate::inference::errors::{InferenceError, InferenceResult};
use finitediff::FiniteDiff;
use ndarray::{Array1, Array2};
use std::str::FromStr;

// ---- Expression tree ----

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Func {
    Exp,
    Log,
    Sqrt,
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Num(f64),
    /// 0-based estimate index.
    Ref(usize),
    Neg(Box<Expr>),
    Bin(BinOp, Box<Expr>, Box<Expr>),
    Call(Func, Box<Expr>),
}

impl Expr {
    fn eval(&self, b: &Array1<f64>) -> f64 {
        match self {
            Expr::Num(x) => *x,
            Expr::Ref(i) => b.get(*i).copied().unwrap_or(f64::NAN),
            Expr::Neg(e) => -e.eval(b),
            Expr::Bin(op, l, r) => {
                let (l, r) = (l.eval(b), r.eval(b));
                match op {
                    BinOp::Add => l + r,
                    BinOp::Sub => l - r,
                    BinOp::Mul => l * r,
                    BinOp::Div => l / r,
                    BinOp::Pow => l.powf(r),
                }
            }
            Expr::Call(func, e) => {
                let x = e.eval(b);
                match func {
                    Func::Exp => x.exp(),
                    Func::Log => x.ln(),
                    Func::Sqrt => x.sqrt(),
                }
            }
        }
    }

    fn max_ref(&self) -> Option<usize> {
        match self {
            Expr::Num(_) => None,
            Expr::Ref(i) => Some(*i),
            Expr::Neg(e) | Expr::Call(_, e) => e.max_ref(),
            Expr::Bin(_, l, r) => l.max_ref().max(r.max_ref()),
        }
    }
}

// ---- Parser ----

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(f64),
    Ident(String),
    Op(char),
    LParen,
    RParen,
    Eq,
}

struct Parser<'a> {
    input: &'a str,
    tokens: Vec<(usize, Token)>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> InferenceResult<Parser<'a>> {
        let mut tokens = Vec::new();
        let chars: Vec<(usize, char)> = input.char_indices().collect();
        let mut i = 0;
        while i < chars.len() {
            let (at, c) = chars[i];
            match c {
                c if c.is_whitespace() => i += 1,
                '+' | '-' | '*' | '/' | '^' => {
                    tokens.push((at, Token::Op(c)));
                    i += 1;
                }
                '(' => {
                    tokens.push((at, Token::LParen));
                    i += 1;
                }
                ')' => {
                    tokens.push((at, Token::RParen));
                    i += 1;
                }
                '=' => {
                    tokens.push((at, Token::Eq));
                    i += 1;
                }
                c if c.is_ascii_digit() || c == '.' => {
                    let start = i;
                    while i < chars.len() && (chars[i].1.is_ascii_digit() || chars[i].1 == '.') {
                        i += 1;
                    }
                    // Exponent: 1e-4, 2.5E3
                    if i < chars.len() && matches!(chars[i].1, 'e' | 'E') {
                        let mut j = i + 1;
                        if j < chars.len() && matches!(chars[j].1, '+' | '-') {
                            j += 1;
                        }
                        if j < chars.len() && chars[j].1.is_ascii_digit() {
                            i = j;
                            while i < chars.len() && chars[i].1.is_ascii_digit() {
                                i += 1;
                            }
                        }
                    }
                    let text: String = chars[start..i].iter().map(|(_, c)| c).collect();
                    let value = text
                        .parse::<f64>()
                        .map_err(|_| parse_error(input, at, "malformed number"))?;
                    tokens.push((at, Token::Num(value)));
                }
                c if c.is_ascii_alphabetic() => {
                    let start = i;
                    while i < chars.len() && chars[i].1.is_ascii_alphanumeric() {
                        i += 1;
                    }
                    let text: String = chars[start..i].iter().map(|(_, c)| c).collect();
                    tokens.push((at, Token::Ident(text)));
                }
                _ => return Err(parse_error(input, at, &format!("unexpected character '{c}'"))),
            }
        }
        Ok(Parser { input, tokens, pos: 0 })
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, t)| t)
    }

    fn position(&self) -> usize {
        self.tokens.get(self.pos).map(|(at, _)| *at).unwrap_or(self.input.len())
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).map(|(_, t)| t.clone());
        self.pos += 1;
        tok
    }

    fn error(&self, reason: &str) -> InferenceError {
        parse_error(self.input, self.position(), reason)
    }

    /// equation := sum ('=' sum)?
    fn equation(&mut self) -> InferenceResult<Expr> {
        let lhs = self.sum()?;
        let expr = if self.peek() == Some(&Token::Eq) {
            self.next();
            let rhs = self.sum()?;
            Expr::Bin(BinOp::Sub, Box::new(lhs), Box::new(rhs))
        } else {
            lhs
        };
        match self.peek() {
            None => Ok(expr),
            Some(Token::Eq) => Err(self.error("only one '=' is allowed")),
            Some(_) => Err(self.error("unexpected token")),
        }
    }

    /// sum := product (('+' | '-') product)*
    fn sum(&mut self) -> InferenceResult<Expr> {
        let mut acc = self.product()?;
        while let Some(Token::Op(c @ ('+' | '-'))) = self.peek().cloned() {
            self.next();
            let rhs = self.product()?;
            let op = if c == '+' { BinOp::Add } else { BinOp::Sub };
            acc = Expr::Bin(op, Box::new(acc), Box::new(rhs));
        }
        Ok(acc)
    }

    /// product := unary (('*' | '/') unary)*
    fn product(&mut self) -> InferenceResult<Expr> {
        let mut acc = self.unary()?;
        while let Some(Token::Op(c @ ('*' | '/'))) = self.peek().cloned() {
            self.next();
            let rhs = self.unary()?;
            let op = if c == '*' { BinOp::Mul } else { BinOp::Div };
            acc = Expr::Bin(op, Box::new(acc), Box::new(rhs));
        }
        Ok(acc)
    }

    /// unary := '-' unary | power
    fn unary(&mut self) -> InferenceResult<Expr> {
        if self.peek() == Some(&Token::Op('-')) {
            self.next();
            return Ok(Expr::Neg(Box::new(self.unary()?)));
        }
        self.power()
    }

    /// power := atom ('^' unary)?   (right-associative)
    fn power(&mut self) -> InferenceResult<Expr> {
        let base = self.atom()?;
        if self.peek() == Some(&Token::Op('^')) {
            self.next();
            let exp = self.unary()?;
            return Ok(Expr::Bin(BinOp::Pow, Box::new(base), Box::new(exp)));
        }
        Ok(base)
    }

    /// atom := number | bN | func '(' sum ')' | '(' sum ')'
    fn atom(&mut self) -> InferenceResult<Expr> {
        let at = self.position();
        match self.next() {
            Some(Token::Num(x)) => Ok(Expr::Num(x)),
            Some(Token::LParen) => {
                let inner = self.sum()?;
                self.expect_rparen()?;
                Ok(inner)
            }
            Some(Token::Ident(name)) => {
                let func = match name.as_str() {
                    "exp" => Some(Func::Exp),
                    "log" => Some(Func::Log),
                    "sqrt" => Some(Func::Sqrt),
                    _ => None,
                };
                if let Some(func) = func {
                    if self.next() != Some(Token::LParen) {
                        return Err(parse_error(self.input, at, "expected '(' after function name"));
                    }
                    let arg = self.sum()?;
                    self.expect_rparen()?;
                    return Ok(Expr::Call(func, Box::new(arg)));
                }
                match name.strip_prefix('b').map(str::parse::<usize>) {
                    Some(Ok(k)) if k >= 1 => Ok(Expr::Ref(k - 1)),
                    _ => Err(parse_error(self.input, at, &format!("unknown identifier '{name}'"))),
                }
            }
            Some(_) => Err(parse_error(self.input, at, "expected a number, bN, or '('")),
            None => Err(parse_error(self.input, at, "unexpected end of expression")),
        }
    }

    fn expect_rparen(&mut self) -> InferenceResult<()> {
        if self.peek() == Some(&Token::RParen) {
            self.next();
            Ok(())
        } else {
            Err(self.error("expected ')'"))
        }
    }
}

fn parse_error(input: &str, position: usize, reason: &str) -> InferenceError {
    InferenceError::HypothesisParse {
        input: input.to_string(),
        position,
        reason: reason.to_string(),
    }
}

/// Parsed algebraic hypothesis, e.g. `b1 * b3 = b3*2`.
#[derive(Debug, Clone, PartialEq)]
pub struct HypothesisExpr {
    label: String,
    expr: Expr,
}

impl HypothesisExpr {
    /// Parse an expression over `b1, b2, ...`.
    ///
    /// Errors
    /// ------
    /// - `InferenceError::HypothesisParse` with the byte offset of the
    ///   offending token.
    pub fn parse(input: &str) -> InferenceResult<HypothesisExpr> {
        let mut parser = Parser::new(input)?;
        if parser.tokens.is_empty() {
            return Err(parse_error(input, 0, "empty expression"));
        }
        let expr = parser.equation()?;
        let label = input.chars().filter(|c| !c.is_whitespace()).collect();
        Ok(HypothesisExpr { label, expr })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Evaluate on an estimate vector (`b1 = estimates[0]`).
    pub fn eval(&self, estimates: &Array1<f64>) -> f64 {
        self.expr.eval(estimates)
    }

    fn check_range(&self, len: usize) -> InferenceResult<()> {
        match self.expr.max_ref() {
            Some(i) if i >= len => {
                Err(InferenceError::HypothesisIndexOutOfRange { index: i + 1, len })
            }
            _ => Ok(()),
        }
    }
}

// ---- Public hypothesis ----

/// Hypothesis applied to the final estimates before testing.
#[derive(Debug, Clone, PartialEq)]
pub enum Hypothesis {
    /// Test every estimate against this value instead of 0.
    Value(f64),
    Expression(HypothesisExpr),
    /// `b_i − b_j` for every `i < j`.
    Pairwise,
    /// `b_i − b_1` for every `i > 1`.
    Reference,
    /// `b_{i+1} − b_i`.
    Sequential,
    /// Columns are contrast vectors: `h = Mᵀ e`.
    Matrix(Array2<f64>),
}

impl FromStr for Hypothesis {
    type Err = InferenceError;

    /// Parse a number, one of `pairwise` / `reference` / `sequential`, or
    /// an expression over `bN`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(value) = trimmed.parse::<f64>() {
            return Ok(Hypothesis::Value(value));
        }
        match trimmed.to_lowercase().as_str() {
            "pairwise" => Ok(Hypothesis::Pairwise),
            "reference" => Ok(Hypothesis::Reference),
            "sequential" => Ok(Hypothesis::Sequential),
            _ => Ok(Hypothesis::Expression(HypothesisExpr::parse(s)?)),
        }
    }
}

/// Estimates after a hypothesis transform.
#[derive(Debug, Clone, PartialEq)]
pub struct Transformed {
    pub labels: Vec<String>,
    pub estimates: Array1<f64>,
    /// `None` when the input Jacobian was `None` (uncertainty disabled).
    pub jacobian: Option<Array2<f64>>,
}

impl Hypothesis {
    /// Null value the (possibly transformed) estimates are tested against.
    pub fn null_value(&self) -> f64 {
        match self {
            Hypothesis::Value(v) => *v,
            _ => 0.0,
        }
    }

    /// Whether this hypothesis replaces the estimate rows.
    pub fn is_transform(&self) -> bool {
        !matches!(self, Hypothesis::Value(_))
    }

    /// Check that the hypothesis fits `m` estimates, before any estimation.
    ///
    /// Errors
    /// ------
    /// - `HypothesisIndexOutOfRange` / `HypothesisDimMismatch`, as in
    ///   [`Hypothesis::apply`].
    pub fn check_len(&self, m: usize) -> InferenceResult<()> {
        match self {
            Hypothesis::Expression(expr) => expr.check_range(m),
            Hypothesis::Matrix(matrix) if matrix.nrows() != m => {
                Err(InferenceError::HypothesisDimMismatch { expected: m, found: matrix.nrows() })
            }
            _ => Ok(()),
        }
    }

    /// apply — transform estimates and their Jacobian.
    ///
    /// Parameters
    /// ----------
    /// - `estimates`: `&Array1<f64>`
    ///   Estimate vector `e` of length `m`.
    /// - `jacobian`: `Option<&Array2<f64>>`
    ///   `m × p` Jacobian of `e` with respect to the model parameters.
    ///
    /// Returns
    /// -------
    /// `InferenceResult<Option<Transformed>>`
    ///   `None` for [`Hypothesis::Value`], which does not transform.
    ///
    /// Errors
    /// ------
    /// - `HypothesisIndexOutOfRange` when an expression references `bk`
    ///   with `k > m`.
    /// - `HypothesisDimMismatch` when a contrast matrix does not have `m` rows.
    pub fn apply(
        &self, estimates: &Array1<f64>, jacobian: Option<&Array2<f64>>,
    ) -> InferenceResult<Option<Transformed>> {
        let m = estimates.len();
        self.check_len(m)?;
        let (labels, weights) = match self {
            Hypothesis::Value(_) => return Ok(None),
            Hypothesis::Expression(expr) => {
                let value = expr.eval(estimates);
                let jac = match jacobian {
                    Some(j) => {
                        let grad = estimates.central_diff(&|b: &Array1<f64>| expr.eval(b));
                        Some(project(&grad.insert_axis(ndarray::Axis(0)), j))
                    }
                    None => None,
                };
                return Ok(Some(Transformed {
                    labels: vec![expr.label().to_string()],
                    estimates: Array1::from_elem(1, value),
                    jacobian: jac,
                }));
            }
            Hypothesis::Pairwise => {
                let mut labels = Vec::new();
                let mut rows = Vec::new();
                for i in 0..m {
                    for j in (i + 1)..m {
                        labels.push(format!("b{} - b{}", i + 1, j + 1));
                        rows.push(contrast_row(m, i, j));
                    }
                }
                (labels, stack_rows(rows, m))
            }
            Hypothesis::Reference => {
                let labels = (1..m).map(|i| format!("b{} - b1", i + 1)).collect();
                let rows = (1..m).map(|i| contrast_row(m, i, 0)).collect();
                (labels, stack_rows(rows, m))
            }
            Hypothesis::Sequential => {
                let labels = (1..m).map(|i| format!("b{} - b{}", i + 1, i)).collect();
                let rows = (1..m).map(|i| contrast_row(m, i, i - 1)).collect();
                (labels, stack_rows(rows, m))
            }
            Hypothesis::Matrix(matrix) => {
                let labels = (1..=matrix.ncols()).map(|k| format!("H{k}")).collect();
                (labels, matrix.t().to_owned())
            }
        };
        Ok(Some(Transformed {
            labels,
            estimates: weights.dot(estimates),
            jacobian: jacobian.map(|j| project(&weights, j)),
        }))
    }
}

/// project — `W · J` over the nonzero entries of `W` only.
///
/// Jacobian rows that could not be computed are NaN; an output row that
/// gives such a row zero weight keeps a finite result.
fn project(weights: &Array2<f64>, jacobian: &Array2<f64>) -> Array2<f64> {
    let mut out = Array2::<f64>::zeros((weights.nrows(), jacobian.ncols()));
    for (k, w) in weights.rows().into_iter().enumerate() {
        let mut row = out.row_mut(k);
        for (i, &wi) in w.iter().enumerate() {
            if wi != 0.0 {
                row.scaled_add(wi, &jacobian.row(i));
            }
        }
    }
    out
}

fn contrast_row(m: usize, plus: usize, minus: usize) -> Array1<f64> {
    let mut row = Array1::zeros(m);
    row[plus] = 1.0;
    row[minus] = -1.0;
    row
}

fn stack_rows(rows: Vec<Array1<f64>>, m: usize) -> Array2<f64> {
    let mut out = Array2::zeros((rows.len(), m));
    for (k, row) in rows.iter().enumerate() {
        out.row_mut(k).assign(row);
    }
    out
}
