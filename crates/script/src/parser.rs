use quire_primitives::Value;

use crate::ScriptError;
use crate::lexer::{Spanned, Token, tokenize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnaryOp {
	Not,
	Negate,
	Plus,
	TypeOf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
	Add,
	Sub,
	Mul,
	Div,
	Rem,
	Lt,
	Gt,
	Le,
	Ge,
	Eq,
	Ne,
	StrictEq,
	StrictNe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LogicalOp {
	And,
	Or,
	Coalesce,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
	Literal(Value),
	Array(Vec<Expr>),
	Ident(String),
	/// `object.name` is stored with a literal string property.
	Member {
		object: Box<Expr>,
		property: Box<Expr>,
	},
	Call {
		callee: Box<Expr>,
		args: Vec<Expr>,
	},
	Unary {
		op: UnaryOp,
		operand: Box<Expr>,
	},
	Binary {
		op: BinaryOp,
		left: Box<Expr>,
		right: Box<Expr>,
	},
	Logical {
		op: LogicalOp,
		left: Box<Expr>,
		right: Box<Expr>,
	},
	Conditional {
		test: Box<Expr>,
		then: Box<Expr>,
		otherwise: Box<Expr>,
	},
	/// `op` is set for compound assignment.
	Assign {
		op: Option<BinaryOp>,
		target: Box<Expr>,
		value: Box<Expr>,
	},
	Delete(Box<Expr>),
	Sequence(Vec<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Stmt {
	Expr(Expr),
	Throw(Expr),
}

/// Binding power of a binary or logical operator, and its node constructor.
fn infix(punct: &str) -> Option<(u8, Infix)> {
	use BinaryOp as B;
	Some(match punct {
		"??" => (4, Infix::Logical(LogicalOp::Coalesce)),
		"||" => (4, Infix::Logical(LogicalOp::Or)),
		"&&" => (5, Infix::Logical(LogicalOp::And)),
		"==" => (8, Infix::Binary(B::Eq)),
		"!=" => (8, Infix::Binary(B::Ne)),
		"===" => (8, Infix::Binary(B::StrictEq)),
		"!==" => (8, Infix::Binary(B::StrictNe)),
		"<" => (9, Infix::Binary(B::Lt)),
		">" => (9, Infix::Binary(B::Gt)),
		"<=" => (9, Infix::Binary(B::Le)),
		">=" => (9, Infix::Binary(B::Ge)),
		"+" => (10, Infix::Binary(B::Add)),
		"-" => (10, Infix::Binary(B::Sub)),
		"*" => (11, Infix::Binary(B::Mul)),
		"/" => (11, Infix::Binary(B::Div)),
		"%" => (11, Infix::Binary(B::Rem)),
		_ => return None,
	})
}

#[derive(Clone, Copy)]
enum Infix {
	Binary(BinaryOp),
	Logical(LogicalOp),
}

fn compound(punct: &str) -> Option<Option<BinaryOp>> {
	Some(match punct {
		"=" => None,
		"+=" => Some(BinaryOp::Add),
		"-=" => Some(BinaryOp::Sub),
		"*=" => Some(BinaryOp::Mul),
		"/=" => Some(BinaryOp::Div),
		"%=" => Some(BinaryOp::Rem),
		_ => return None,
	})
}

/// Parses a whole program into statements.
pub(crate) fn parse(source: &str) -> Result<Vec<Stmt>, ScriptError> {
	let mut parser = Parser {
		tokens: tokenize(source)?,
		pos: 0,
	};
	parser.program()
}

struct Parser {
	tokens: Vec<Spanned>,
	pos: usize,
}

impl Parser {
	fn peek(&self) -> Option<&Token> {
		self.tokens.get(self.pos).map(|s| &s.token)
	}

	fn peek_punct(&self) -> Option<&'static str> {
		match self.peek() {
			Some(Token::Punct(p)) => Some(*p),
			_ => None,
		}
	}

	fn next(&mut self) -> Option<Token> {
		let token = self.tokens.get(self.pos).map(|s| s.token.clone());
		self.pos += 1;
		token
	}

	fn eat(&mut self, punct: &str) -> bool {
		if self.peek_punct() == Some(punct) {
			self.pos += 1;
			true
		} else {
			false
		}
	}

	fn expect(&mut self, punct: &str) -> Result<(), ScriptError> {
		if self.eat(punct) {
			Ok(())
		} else {
			Err(self.unexpected())
		}
	}

	fn unexpected(&self) -> ScriptError {
		let message = match self.peek() {
			None => "Unexpected end of input".to_owned(),
			Some(Token::Number(n)) => format!("Unexpected number '{}'", quire_primitives::format_number(*n)),
			Some(Token::Str(_)) => "Unexpected string".to_owned(),
			Some(Token::Ident(name)) => format!("Unexpected identifier '{name}'"),
			Some(Token::Punct(p)) => format!("Unexpected token '{p}'"),
		};
		ScriptError::Syntax(message)
	}

	fn at_statement_end(&self) -> bool {
		match self.tokens.get(self.pos) {
			None => true,
			Some(s) => s.newline_before || s.token == Token::Punct(";"),
		}
	}

	fn program(&mut self) -> Result<Vec<Stmt>, ScriptError> {
		let mut statements = Vec::new();
		while self.peek().is_some() {
			if self.eat(";") {
				continue;
			}
			let stmt = if self.peek() == Some(&Token::Ident("throw".into())) {
				self.pos += 1;
				if self.at_statement_end() {
					return Err(ScriptError::Syntax("Illegal newline after throw".into()));
				}
				Stmt::Throw(self.expression()?)
			} else {
				Stmt::Expr(self.expression()?)
			};
			if !self.at_statement_end() {
				return Err(self.unexpected());
			}
			statements.push(stmt);
		}
		Ok(statements)
	}

	fn expression(&mut self) -> Result<Expr, ScriptError> {
		let first = self.assignment()?;
		if self.peek_punct() != Some(",") {
			return Ok(first);
		}
		let mut items = vec![first];
		while self.eat(",") {
			items.push(self.assignment()?);
		}
		Ok(Expr::Sequence(items))
	}

	fn assignment(&mut self) -> Result<Expr, ScriptError> {
		let target = self.conditional()?;
		let Some(op) = self.peek_punct().and_then(compound) else {
			return Ok(target);
		};
		if !matches!(target, Expr::Ident(_) | Expr::Member { .. }) {
			return Err(ScriptError::Syntax("Invalid left-hand side in assignment".into()));
		}
		self.pos += 1;
		let value = self.assignment()?;
		Ok(Expr::Assign {
			op,
			target: Box::new(target),
			value: Box::new(value),
		})
	}

	fn conditional(&mut self) -> Result<Expr, ScriptError> {
		let test = self.binary(0)?;
		if !self.eat("?") {
			return Ok(test);
		}
		let then = self.assignment()?;
		self.expect(":")?;
		let otherwise = self.assignment()?;
		Ok(Expr::Conditional {
			test: Box::new(test),
			then: Box::new(then),
			otherwise: Box::new(otherwise),
		})
	}

	fn binary(&mut self, min_bp: u8) -> Result<Expr, ScriptError> {
		let mut left = self.unary()?;
		while let Some((bp, kind)) = self.peek_punct().and_then(infix) {
			if bp <= min_bp {
				break;
			}
			self.pos += 1;
			let right = self.binary(bp)?;
			left = match kind {
				Infix::Binary(op) => Expr::Binary {
					op,
					left: Box::new(left),
					right: Box::new(right),
				},
				Infix::Logical(op) => Expr::Logical {
					op,
					left: Box::new(left),
					right: Box::new(right),
				},
			};
		}
		Ok(left)
	}

	fn unary(&mut self) -> Result<Expr, ScriptError> {
		if matches!(self.peek(), Some(Token::Ident(name)) if name == "delete") {
			self.pos += 1;
			let operand = self.unary()?;
			return Ok(Expr::Delete(Box::new(operand)));
		}
		let op = match self.peek() {
			Some(Token::Punct("!")) => Some(UnaryOp::Not),
			Some(Token::Punct("-")) => Some(UnaryOp::Negate),
			Some(Token::Punct("+")) => Some(UnaryOp::Plus),
			Some(Token::Ident(name)) if name == "typeof" => Some(UnaryOp::TypeOf),
			_ => None,
		};
		let Some(op) = op else {
			return self.postfix();
		};
		self.pos += 1;
		let operand = self.unary()?;
		Ok(Expr::Unary {
			op,
			operand: Box::new(operand),
		})
	}

	fn postfix(&mut self) -> Result<Expr, ScriptError> {
		let mut expr = self.primary()?;
		loop {
			if self.eat(".") {
				let Some(Token::Ident(name)) = self.next() else {
					self.pos -= 1;
					return Err(self.unexpected());
				};
				expr = Expr::Member {
					object: Box::new(expr),
					property: Box::new(Expr::Literal(Value::String(name))),
				};
			} else if self.eat("[") {
				let property = self.expression()?;
				self.expect("]")?;
				expr = Expr::Member {
					object: Box::new(expr),
					property: Box::new(property),
				};
			} else if self.eat("(") {
				let args = self.list(")")?;
				expr = Expr::Call {
					callee: Box::new(expr),
					args,
				};
			} else {
				return Ok(expr);
			}
		}
	}

	/// Comma-separated assignment expressions up to `close`.
	fn list(&mut self, close: &str) -> Result<Vec<Expr>, ScriptError> {
		let mut items = Vec::new();
		while !self.eat(close) {
			items.push(self.assignment()?);
			if !self.eat(",") {
				self.expect(close)?;
				break;
			}
		}
		Ok(items)
	}

	fn primary(&mut self) -> Result<Expr, ScriptError> {
		let Some(token) = self.next() else {
			self.pos -= 1;
			return Err(self.unexpected());
		};
		Ok(match token {
			Token::Number(n) => Expr::Literal(Value::Number(n)),
			Token::Str(s) => Expr::Literal(Value::String(s)),
			Token::Ident(name) => match name.as_str() {
				"true" => Expr::Literal(Value::Bool(true)),
				"false" => Expr::Literal(Value::Bool(false)),
				"null" => Expr::Literal(Value::Null),
				"undefined" => Expr::Literal(Value::Undefined),
				"NaN" => Expr::Literal(Value::Number(f64::NAN)),
				"Infinity" => Expr::Literal(Value::Number(f64::INFINITY)),
				"throw" | "typeof" | "delete" => {
					self.pos -= 1;
					return Err(self.unexpected());
				}
				_ => Expr::Ident(name),
			},
			Token::Punct("(") => {
				let inner = self.expression()?;
				self.expect(")")?;
				inner
			}
			Token::Punct("[") => Expr::Array(self.list("]")?),
			Token::Punct(_) => {
				self.pos -= 1;
				return Err(self.unexpected());
			}
		})
	}
}
