//! Expression parsing and evaluation for metadata values
//!
//! Numeric fields of a function schema (initial values, bounds, step hints) may be
//! written as small arithmetic expressions such as `1 / (2 * pi)` or `-pi`. The same
//! grammar is reused by [`crate::units::Unit::parse`] to read compound unit strings
//! like `1 / (keV * cm^2 * s)`.

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, char, multispace0},
    combinator::recognize,
    multi::many0,
    number::complete::double,
    sequence::{delimited, pair, preceded},
    IResult, Parser,
};
use std::collections::HashMap;
use thiserror::Error;

/// Error that can occur during expression parsing or evaluation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    #[error("Failed to parse expression: {message}")]
    ParseError { message: String },

    #[error("Undefined variable: {name}")]
    UndefinedVariable { name: String },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Invalid operation: {message}")]
    InvalidOperation { message: String },

    #[error("Undefined function: {name}")]
    UndefinedFunction { name: String },
}

/// Result type for expression evaluation
type ExprResult<T> = Result<T, ExpressionError>;

/// Expression AST node
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Constant number
    Number(f64),

    /// Variable reference (a named constant, or a unit symbol)
    Variable(String),

    /// Unary operations
    Unary(UnaryOp, Box<Expression>),

    /// Binary operations
    Binary(BinaryOp, Box<Expression>, Box<Expression>),

    /// Function call
    Function(String, Vec<Expression>),
}

/// Unary operations
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOp {
    /// Negation (-)
    Neg,
}

/// Binary operations
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryOp {
    /// Addition (+)
    Add,

    /// Subtraction (-)
    Sub,

    /// Multiplication (*)
    Mul,

    /// Division (/)
    Div,

    /// Power (^)
    Pow,
}

/// Context for expression evaluation, providing variable values
pub trait EvaluationContext {
    /// Get the value of a variable
    fn get_variable(&self, name: &str) -> ExprResult<f64>;
}

/// Context holding the mathematical constants allowed in metadata values
#[derive(Debug, Clone)]
pub struct ConstantContext {
    variables: HashMap<String, f64>,
}

impl Default for ConstantContext {
    fn default() -> Self {
        let mut variables = HashMap::new();
        variables.insert("pi".to_string(), std::f64::consts::PI);
        variables.insert("e".to_string(), std::f64::consts::E);
        Self { variables }
    }
}

impl ConstantContext {
    /// Create a context with `pi` and `e` defined
    pub fn new() -> Self {
        Self::default()
    }

    /// Define an additional named constant
    pub fn set_variable(&mut self, name: &str, value: f64) {
        self.variables.insert(name.to_string(), value);
    }
}

impl EvaluationContext for ConstantContext {
    fn get_variable(&self, name: &str) -> ExprResult<f64> {
        self.variables
            .get(name)
            .copied()
            .ok_or_else(|| ExpressionError::UndefinedVariable {
                name: name.to_string(),
            })
    }
}

impl EvaluationContext for HashMap<String, f64> {
    fn get_variable(&self, name: &str) -> ExprResult<f64> {
        self.get(name)
            .copied()
            .ok_or_else(|| ExpressionError::UndefinedVariable {
                name: name.to_string(),
            })
    }
}

/// Parse and evaluate a numeric metadata value such as `-pi` or `1 / (2 * pi)`
pub fn eval_constant(input: &str) -> ExprResult<f64> {
    Expression::parse(input)?.evaluate(&ConstantContext::new())
}

impl Expression {
    /// Parse an expression from a string
    pub fn parse(input: &str) -> ExprResult<Self> {
        match expr_parser(input.trim()) {
            Ok((remainder, expr)) => {
                // Make sure the entire input was consumed
                if remainder.trim().is_empty() {
                    Ok(expr)
                } else {
                    Err(ExpressionError::ParseError {
                        message: format!("Unexpected trailing characters: '{}'", remainder),
                    })
                }
            }
            Err(e) => Err(ExpressionError::ParseError {
                message: format!("{:?}", e),
            }),
        }
    }

    /// Evaluate the expression with the given context
    pub fn evaluate<C: EvaluationContext>(&self, context: &C) -> ExprResult<f64> {
        match self {
            Self::Number(n) => Ok(*n),

            Self::Variable(name) => context.get_variable(name),

            Self::Unary(op, expr) => {
                let value = expr.evaluate(context)?;
                match op {
                    UnaryOp::Neg => Ok(-value),
                }
            }

            Self::Binary(op, left, right) => {
                let lhs = left.evaluate(context)?;
                let rhs = right.evaluate(context)?;

                match op {
                    BinaryOp::Add => Ok(lhs + rhs),
                    BinaryOp::Sub => Ok(lhs - rhs),
                    BinaryOp::Mul => Ok(lhs * rhs),
                    BinaryOp::Div => {
                        if rhs == 0.0 {
                            Err(ExpressionError::DivisionByZero)
                        } else {
                            Ok(lhs / rhs)
                        }
                    }
                    BinaryOp::Pow => Ok(lhs.powf(rhs)),
                }
            }

            Self::Function(name, args) => {
                let mut evaluated_args = Vec::with_capacity(args.len());
                for arg in args {
                    evaluated_args.push(arg.evaluate(context)?);
                }

                let f: fn(f64) -> f64 = match name.as_str() {
                    "sin" => f64::sin,
                    "cos" => f64::cos,
                    "tan" => f64::tan,
                    "exp" => f64::exp,
                    "log" | "ln" => f64::ln,
                    "log10" => f64::log10,
                    "sqrt" => f64::sqrt,
                    "abs" => f64::abs,
                    _ => {
                        return Err(ExpressionError::UndefinedFunction {
                            name: name.to_string(),
                        })
                    }
                };

                if evaluated_args.len() != 1 {
                    return Err(ExpressionError::InvalidOperation {
                        message: format!(
                            "{}() requires 1 argument, got {}",
                            name,
                            evaluated_args.len()
                        ),
                    });
                }
                Ok(f(evaluated_args[0]))
            }
        }
    }
}

// Parser functions using nom

/// Parse an identifier (constant, unit symbol or function name)
fn identifier(input: &str) -> IResult<&str, String> {
    let mut parser = recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ));

    let (input, matched) = parser.parse(input)?;
    Ok((input, matched.to_string()))
}

/// Parse a comma-separated list of expressions (for function arguments)
fn args_list(input: &str) -> IResult<&str, Vec<Expression>> {
    let (input, first) = expr_parser(input)?;
    let mut res = vec![first];

    let mut remainder = input;
    loop {
        let mut comma_parser = delimited(
            multispace0::<&str, nom::error::Error<&str>>,
            char::<&str, nom::error::Error<&str>>(','),
            multispace0::<&str, nom::error::Error<&str>>,
        );

        match comma_parser.parse(remainder) {
            Ok((after_comma, _)) => match expr_parser(after_comma) {
                Ok((after_expr, expr)) => {
                    res.push(expr);
                    remainder = after_expr;
                }
                Err(_) => break,
            },
            Err(_) => break,
        }
    }

    Ok((remainder, res))
}

/// Parse a function call
fn function_call(input: &str) -> IResult<&str, Expression> {
    let (input, name) = identifier(input)?;
    let (input, _) = multispace0.parse(input)?;
    let (input, _) = char::<&str, nom::error::Error<&str>>('(').parse(input)?;
    let (input, _) = multispace0.parse(input)?;

    if let Ok((input, _)) = char::<&str, nom::error::Error<&str>>(')').parse(input) {
        return Ok((input, Expression::Function(name, vec![])));
    }

    let (input, args) = args_list(input)?;
    let (input, _) = multispace0.parse(input)?;
    let (input, _) = char::<&str, nom::error::Error<&str>>(')').parse(input)?;

    Ok((input, Expression::Function(name, args)))
}

/// Parse a number
fn number(input: &str) -> IResult<&str, Expression> {
    let (input, num) = double(input)?;
    Ok((input, Expression::Number(num)))
}

/// Parse a variable reference
fn variable(input: &str) -> IResult<&str, Expression> {
    let (input, var_name) = identifier(input)?;
    Ok((input, Expression::Variable(var_name)))
}

/// Parse a parenthesized expression
fn parens(input: &str) -> IResult<&str, Expression> {
    let (input, _) = char('(').parse(input)?;
    let (input, _) = multispace0.parse(input)?;
    let (input, expr) = expr_parser(input)?;
    let (input, _) = multispace0.parse(input)?;
    let (input, _) = char::<_, nom::error::Error<_>>(')').parse(input)?;
    Ok((input, expr))
}

/// Parse a primary expression (number, variable, function call, or parenthesized expression)
fn primary(input: &str) -> IResult<&str, Expression> {
    if let Ok(result) = number(input) {
        return Ok(result);
    }

    if let Ok(result) = function_call(input) {
        return Ok(result);
    }

    if let Ok(result) = variable(input) {
        return Ok(result);
    }

    parens(input)
}

/// Parse a unary expression (-expr, +expr)
fn unary(input: &str) -> IResult<&str, Expression> {
    let (input, _) = multispace0.parse(input)?;

    let mut neg_parser = preceded(char('-'), power);
    if let Ok((remaining, expr)) = neg_parser.parse(input) {
        return Ok((remaining, Expression::Unary(UnaryOp::Neg, Box::new(expr))));
    }

    let mut plus_parser = preceded(char('+'), power);
    match plus_parser.parse(input) {
        Ok(result) => Ok(result),
        Err(_) => power(input),
    }
}

/// Parse a power expression (expr ^ expr), right associative
fn power(input: &str) -> IResult<&str, Expression> {
    let (input, _) = multispace0.parse(input)?;
    let (input, left) = primary(input)?;
    let (input, _) = multispace0.parse(input)?;

    match char::<_, nom::error::Error<_>>('^').parse(input) {
        Ok((after_op, _)) => {
            let (after_right, right) = unary(after_op)?;
            Ok((
                after_right,
                Expression::Binary(BinaryOp::Pow, Box::new(left), Box::new(right)),
            ))
        }
        Err(_) => Ok((input, left)),
    }
}

/// Parse a multiplicative expression (expr * expr, expr / expr), left associative
fn term(input: &str) -> IResult<&str, Expression> {
    let (mut input, mut acc) = unary(input)?;

    loop {
        let (after_space, _) = multispace0.parse(input)?;
        let op = match after_space.chars().next() {
            Some('*') => BinaryOp::Mul,
            Some('/') => BinaryOp::Div,
            _ => return Ok((input, acc)),
        };
        let (remaining, right) = unary(&after_space[1..])?;
        acc = Expression::Binary(op, Box::new(acc), Box::new(right));
        input = remaining;
    }
}

/// Parse an additive expression (expr + expr, expr - expr), left associative
fn expr_parser(input: &str) -> IResult<&str, Expression> {
    let (input, _) = multispace0.parse(input)?;
    let (mut input, mut acc) = term(input)?;

    loop {
        let (after_space, _) = multispace0.parse(input)?;
        let op = match after_space.chars().next() {
            Some('+') => BinaryOp::Add,
            Some('-') => BinaryOp::Sub,
            _ => return Ok((input, acc)),
        };
        let (remaining, right) = term(&after_space[1..])?;
        acc = Expression::Binary(op, Box::new(acc), Box::new(right));
        input = remaining;
    }
}
