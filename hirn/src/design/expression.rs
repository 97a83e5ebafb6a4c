use std::fmt;

use serde::Serialize;

use super::{NumericConstant, Signal};

/// Binary operators
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum BinaryOp {
	Add,
	Subtract,
	Multiply,
	ShiftLeft,
	ShiftRight,
	BitwiseAnd,
	BitwiseOr,
	BitwiseXor,
	Equal,
	NotEqual,
	Less,
	Greater,
}

impl BinaryOp {
	fn symbol(&self) -> &'static str {
		use BinaryOp::*;
		match self {
			Add => "+",
			Subtract => "-",
			Multiply => "*",
			ShiftLeft => "<<",
			ShiftRight => ">>",
			BitwiseAnd => "&",
			BitwiseOr => "|",
			BitwiseXor => "^",
			Equal => "==",
			NotEqual => "!=",
			Less => "<",
			Greater => ">",
		}
	}
}

/// Unary operators
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum UnaryOp {
	Negate,
	BitwiseNot,
	ReductionAnd,
	ReductionOr,
	ReductionXor,
}

impl UnaryOp {
	fn symbol(&self) -> &'static str {
		use UnaryOp::*;
		match self {
			Negate => "-",
			BitwiseNot => "~",
			ReductionAnd => "r&",
			ReductionOr => "r|",
			ReductionXor => "r^",
		}
	}
}

/// A binary expression
#[derive(Clone, Debug, Serialize)]
pub struct BinaryExpression {
	/// Binary operator type
	pub op: BinaryOp,

	/// Left hand side expression
	pub lhs: Box<Expression>,

	/// Right hand side expression
	pub rhs: Box<Expression>,
}

/// A unary expression
#[derive(Clone, Debug, Serialize)]
pub struct UnaryExpression {
	/// Unary operator type
	pub op: UnaryOp,

	/// Operand expression
	pub operand: Box<Expression>,
}

/// Language expression
#[derive(Clone, Debug, Serialize)]
pub enum Expression {
	Constant(NumericConstant),
	Signal(Signal),

	/// Clock signal of a domain referenced by name
	Clock(String),

	/// Reset signal of a domain referenced by name
	Reset(String),

	Binary(BinaryExpression),
	Unary(UnaryExpression),

	/// Concatenation, least significant part first
	Concat(Vec<Expression>),
}

impl Expression {
	pub fn new_zero() -> Self {
		Self::Constant(NumericConstant::zero())
	}

	pub fn new_one() -> Self {
		Self::Constant(NumericConstant::one())
	}

	/// Clock of the named domain
	pub fn clock(domain: &str) -> Self {
		Self::Clock(domain.into())
	}

	/// Reset of the named domain
	pub fn reset(domain: &str) -> Self {
		Self::Reset(domain.into())
	}

	pub fn concat(parts: Vec<Expression>) -> Self {
		Self::Concat(parts)
	}

	pub fn binary(op: BinaryOp, lhs: Expression, rhs: Expression) -> Self {
		Self::Binary(BinaryExpression {
			op,
			lhs: Box::new(lhs),
			rhs: Box::new(rhs),
		})
	}

	pub fn unary(op: UnaryOp, operand: Expression) -> Self {
		Self::Unary(UnaryExpression {
			op,
			operand: Box::new(operand),
		})
	}

	/// Rewrites clock and reset domain references
	pub(crate) fn rename_domains(&mut self, rename: &dyn Fn(&str) -> Option<String>) {
		use Expression::*;
		match self {
			Clock(name) | Reset(name) => {
				if let Some(new_name) = rename(name) {
					*name = new_name;
				}
			},
			Binary(e) => {
				e.lhs.rename_domains(rename);
				e.rhs.rename_domains(rename);
			},
			Unary(e) => e.operand.rename_domains(rename),
			Concat(parts) => {
				for part in parts {
					part.rename_domains(rename);
				}
			},
			Constant(_) | Signal(_) => {},
		}
	}
}

impl From<Signal> for Expression {
	fn from(signal: Signal) -> Self {
		Self::Signal(signal)
	}
}

impl From<&Signal> for Expression {
	fn from(signal: &Signal) -> Self {
		Self::Signal(signal.clone())
	}
}

impl From<NumericConstant> for Expression {
	fn from(constant: NumericConstant) -> Self {
		Self::Constant(constant)
	}
}

impl From<u64> for Expression {
	fn from(value: u64) -> Self {
		Self::Constant(NumericConstant::new_unsigned(value.into()))
	}
}

impl fmt::Display for Expression {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		use Expression::*;
		match self {
			Constant(c) => write!(f, "{}", c),
			Signal(s) => write!(f, "{}", s),
			Clock(name) => write!(f, "(clk {})", name),
			Reset(name) => write!(f, "(rst {})", name),
			Binary(e) => write!(f, "({} {} {})", e.op.symbol(), e.lhs, e.rhs),
			Unary(e) => write!(f, "({} {})", e.op.symbol(), e.operand),
			Concat(parts) => {
				write!(f, "(cat")?;
				for part in parts {
					write!(f, " {}", part)?;
				}
				write!(f, ")")
			},
		}
	}
}
