use std::fmt;

use serde::Serialize;

use super::{DesignError, Expression, Signal};

/// Assignment of an expression to a signal
#[derive(Clone, Debug, Serialize)]
pub struct Assignment {
	pub lhs: Signal,
	pub rhs: Expression,
}

/// A single `if`/`elif` branch
#[derive(Clone, Debug, Serialize)]
pub struct ConditionalBranch {
	pub condition: Expression,
	pub body: Vec<Statement>,
}

/// An `if`/`elif`/`else` chain
#[derive(Clone, Debug, Default, Serialize)]
pub struct IfStatement {
	pub branches: Vec<ConditionalBranch>,
	pub otherwise: Option<Vec<Statement>>,
}

/// Statement in a module body. Statements do not carry their driving
/// domain, that is recorded separately for every assigned signal.
#[derive(Clone, Debug, Serialize)]
pub enum Statement {
	Assign(Assignment),
	If(IfStatement),
}

impl Statement {
	pub fn assign(lhs: &Signal, rhs: Expression) -> Self {
		Self::Assign(Assignment { lhs: lhs.clone(), rhs })
	}

	pub(crate) fn rename_domains(&mut self, rename: &dyn Fn(&str) -> Option<String>) {
		match self {
			Statement::Assign(a) => a.rhs.rename_domains(rename),
			Statement::If(s) => {
				for branch in &mut s.branches {
					branch.condition.rename_domains(rename);
					for stmt in &mut branch.body {
						stmt.rename_domains(rename);
					}
				}
				for stmt in s.otherwise.iter_mut().flatten() {
					stmt.rename_domains(rename);
				}
			},
		}
	}
}

fn fmt_body(f: &mut fmt::Formatter<'_>, body: &[Statement]) -> fmt::Result {
	write!(f, " [")?;
	for (i, stmt) in body.iter().enumerate() {
		if i > 0 {
			write!(f, " ")?;
		}
		write!(f, "{}", stmt)?;
	}
	write!(f, "]")
}

impl fmt::Display for Statement {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Statement::Assign(a) => write!(f, "(eq {} {})", a.lhs, a.rhs),
			Statement::If(s) => {
				write!(f, "(if")?;
				for (i, branch) in s.branches.iter().enumerate() {
					if i > 0 {
						write!(f, " elif")?;
					}
					write!(f, " {}", branch.condition)?;
					fmt_body(f, &branch.body)?;
				}
				if let Some(otherwise) = &s.otherwise {
					write!(f, " else")?;
					fmt_body(f, otherwise)?;
				}
				write!(f, ")")
			},
		}
	}
}

/// Stack of `if` blocks which have been opened but not yet closed
#[derive(Clone, Debug, Default)]
pub(crate) struct OpenBlocks {
	stack: Vec<IfStatement>,
}

impl OpenBlocks {
	/// Number of open control flow blocks
	pub fn depth(&self) -> usize {
		self.stack.len()
	}

	/// Adds a statement to the innermost open block or to `statements`
	pub fn push(&mut self, statements: &mut Vec<Statement>, stmt: Statement) {
		match self.stack.last_mut() {
			None => statements.push(stmt),
			Some(block) => match &mut block.otherwise {
				Some(otherwise) => otherwise.push(stmt),
				None => match block.branches.last_mut() {
					Some(branch) => branch.body.push(stmt),
					None => unreachable!("open if block without branches"),
				},
			},
		}
	}

	pub fn begin_if(&mut self, condition: Expression) {
		self.stack.push(IfStatement {
			branches: vec![ConditionalBranch { condition, body: vec![] }],
			otherwise: None,
		});
	}

	pub fn begin_elif(&mut self, condition: Expression) -> Result<(), DesignError> {
		let block = self.stack.last_mut().ok_or(DesignError::NoOpenIfBlock)?;
		if block.otherwise.is_some() {
			return Err(DesignError::ElifAfterElse);
		}
		block.branches.push(ConditionalBranch { condition, body: vec![] });
		Ok(())
	}

	pub fn begin_else(&mut self) -> Result<(), DesignError> {
		let block = self.stack.last_mut().ok_or(DesignError::NoOpenIfBlock)?;
		if block.otherwise.is_some() {
			return Err(DesignError::ElseAfterElse);
		}
		block.otherwise = Some(vec![]);
		Ok(())
	}

	/// Closes the innermost block and adds it to the enclosing one
	pub fn end_if(&mut self, statements: &mut Vec<Statement>) -> Result<(), DesignError> {
		let block = self.stack.pop().ok_or(DesignError::NoOpenIfBlock)?;
		self.push(statements, Statement::If(block));
		Ok(())
	}
}
