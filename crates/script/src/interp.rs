use std::cmp::Ordering;

use quire_primitives::{Value, string_from};

use crate::ScriptError;
use crate::parser::{BinaryOp, Expr, LogicalOp, Stmt, UnaryOp, parse};
use crate::state::{Scope, State};

/// Callable built-ins, by the name they are invoked under.
const FUNCTIONS: &[&str] = &["print", "String", "Number", "Boolean"];

const MATH_FUNCTIONS: &[&str] = &["floor", "ceil", "round", "trunc", "abs", "sqrt", "min", "max"];

/// A variable plus the property path below it, e.g. `State.variables.list[2]`.
#[derive(Debug, Clone)]
struct Place {
	scope: Scope,
	name: String,
	path: Vec<Value>,
}

/// What a member chain rooted at a built-in object resolves to.
enum Reference {
	State,
	Math,
	Store(Scope),
	Var(Place),
	Value(Value),
}

/// Evaluates code against a [`State`], optionally collecting `print` output.
pub struct Interpreter<'a> {
	state: &'a mut State,
	output: Option<&'a mut String>,
}

impl<'a> Interpreter<'a> {
	pub fn new(state: &'a mut State) -> Self {
		Self { state, output: None }
	}

	/// Sends `print(...)` output to `output` instead of discarding it.
	pub fn with_output(mut self, output: &'a mut String) -> Self {
		self.output = Some(output);
		self
	}

	/// Runs every statement and returns the value of the last one.
	pub fn eval(&mut self, code: &str) -> Result<Value, ScriptError> {
		tracing::trace!(len = code.len(), "script.eval");
		let program = parse(code)?;
		let mut last = Value::Undefined;
		for stmt in &program {
			match stmt {
				Stmt::Expr(expr) => last = self.expr(expr)?,
				Stmt::Throw(expr) => return Err(ScriptError::Thrown(self.expr(expr)?)),
			}
		}
		Ok(last)
	}

	fn expr(&mut self, expr: &Expr) -> Result<Value, ScriptError> {
		match expr {
			Expr::Literal(value) => Ok(value.clone()),
			Expr::Array(items) => Ok(Value::List(self.values(items)?)),
			Expr::Ident(name) => match name.as_str() {
				"State" | "Math" => Err(not_a_value(name)),
				name if FUNCTIONS.contains(&name) => Err(not_a_value(name)),
				name => Err(ScriptError::Reference(format!("{name} is not defined"))),
			},
			Expr::Member { object, property } => match self.reference(expr)? {
				Some(reference) => self.read_reference(reference),
				None => {
					let object = self.expr(object)?;
					let key = self.expr(property)?;
					get_property(&object, &key)
				}
			},
			Expr::Call { callee, args } => self.call(callee, args),
			Expr::Unary { op, operand } => self.unary(*op, operand),
			Expr::Binary { op, left, right } => {
				let left = self.expr(left)?;
				let right = self.expr(right)?;
				Ok(binary(*op, &left, &right))
			}
			Expr::Logical { op, left, right } => {
				let left = self.expr(left)?;
				let short_circuit = match op {
					LogicalOp::And => !left.is_truthy(),
					LogicalOp::Or => left.is_truthy(),
					LogicalOp::Coalesce => !left.is_nullish(),
				};
				if short_circuit { Ok(left) } else { self.expr(right) }
			}
			Expr::Conditional { test, then, otherwise } => {
				if self.expr(test)?.is_truthy() {
					self.expr(then)
				} else {
					self.expr(otherwise)
				}
			}
			Expr::Assign { op, target, value } => {
				let place = self.place(target)?;
				let rhs = self.expr(value)?;
				let value = match op {
					Some(op) => binary(*op, &self.read(&place)?, &rhs),
					None => rhs,
				};
				self.write(&place, value.clone())?;
				Ok(value)
			}
			Expr::Delete(target) => {
				match self.reference(target)? {
					Some(Reference::Var(place)) => self.delete(&place),
					Some(_) => {}
					None => {
						self.expr(target)?;
					}
				}
				Ok(Value::Bool(true))
			}
			Expr::Sequence(items) => {
				let mut last = Value::Undefined;
				for item in items {
					last = self.expr(item)?;
				}
				Ok(last)
			}
		}
	}

	fn values(&mut self, exprs: &[Expr]) -> Result<Vec<Value>, ScriptError> {
		exprs.iter().map(|e| self.expr(e)).collect()
	}

	fn unary(&mut self, op: UnaryOp, operand: &Expr) -> Result<Value, ScriptError> {
		if op == UnaryOp::TypeOf
			&& let Expr::Ident(name) = operand
		{
			let kind = match name.as_str() {
				"State" | "Math" => "object",
				name if FUNCTIONS.contains(&name) => "function",
				_ => "undefined",
			};
			return Ok(Value::from(kind));
		}

		let value = self.expr(operand)?;
		Ok(match op {
			UnaryOp::Not => Value::Bool(!value.is_truthy()),
			UnaryOp::Negate => Value::Number(-value.to_number()),
			UnaryOp::Plus => Value::Number(value.to_number()),
			UnaryOp::TypeOf => Value::from(value.type_of()),
		})
	}

	/// Resolves member chains rooted at `State` or `Math`. Returns `None` for
	/// anything else.
	fn reference(&mut self, expr: &Expr) -> Result<Option<Reference>, ScriptError> {
		let (object, property) = match expr {
			Expr::Ident(name) if name == "State" => return Ok(Some(Reference::State)),
			Expr::Ident(name) if name == "Math" => return Ok(Some(Reference::Math)),
			Expr::Member { object, property } => (object, property),
			_ => return Ok(None),
		};
		let Some(base) = self.reference(object)? else {
			return Ok(None);
		};
		let key = self.expr(property)?;

		Ok(Some(match base {
			Reference::State => match Scope::from_property(&key.to_string()) {
				Some(scope) => Reference::Store(scope),
				None => Reference::Value(Value::Undefined),
			},
			Reference::Math => Reference::Value(math_constant(&key.to_string())),
			Reference::Store(scope) => Reference::Var(Place {
				scope,
				name: key.to_string(),
				path: Vec::new(),
			}),
			Reference::Var(mut place) => {
				place.path.push(key);
				Reference::Var(place)
			}
			Reference::Value(value) => Reference::Value(get_property(&value, &key)?),
		}))
	}

	fn read_reference(&self, reference: Reference) -> Result<Value, ScriptError> {
		match reference {
			Reference::State => Err(not_a_value("State")),
			Reference::Math => Err(not_a_value("Math")),
			Reference::Store(scope) => Err(not_a_value(&format!("State.{}", scope.property()))),
			Reference::Var(place) => self.read(&place),
			Reference::Value(value) => Ok(value),
		}
	}

	fn place(&mut self, target: &Expr) -> Result<Place, ScriptError> {
		match self.reference(target)? {
			Some(Reference::Var(place)) => Ok(place),
			_ => match target {
				Expr::Ident(name) if name != "State" && name != "Math" => {
					Err(ScriptError::Reference(format!("{name} is not defined")))
				}
				_ => Err(ScriptError::Syntax("Invalid left-hand side in assignment".into())),
			},
		}
	}

	fn read(&self, place: &Place) -> Result<Value, ScriptError> {
		let mut current = self.state.get(place.scope, &place.name).cloned().unwrap_or_default();
		for key in &place.path {
			current = get_property(&current, key)?;
		}
		Ok(current)
	}

	fn write(&mut self, place: &Place, value: Value) -> Result<(), ScriptError> {
		let Some((last, parents)) = place.path.split_last() else {
			self.state.set(place.scope, place.name.clone(), value);
			return Ok(());
		};

		let mut target = self
			.state
			.store_mut(place.scope)
			.get_mut(&place.name)
			.ok_or_else(|| cannot_set(&Value::Undefined, parents.first().unwrap_or(last)))?;
		for key in parents {
			target = match target {
				Value::List(items) => match index_of(key).and_then(|i| items.get_mut(i)) {
					Some(item) => item,
					None => return Err(cannot_set(&Value::Undefined, key)),
				},
				other if other.is_nullish() => return Err(cannot_set(other, key)),
				_ => return Ok(()),
			};
		}

		match target {
			Value::List(items) => {
				if let Some(index) = index_of(last) {
					if index >= items.len() {
						items.resize(index + 1, Value::Undefined);
					}
					items[index] = value;
				}
				Ok(())
			}
			other if other.is_nullish() => Err(cannot_set(other, last)),
			_ => Ok(()),
		}
	}

	fn delete(&mut self, place: &Place) {
		let Some((last, parents)) = place.path.split_last() else {
			self.state.remove(place.scope, &place.name);
			return;
		};
		let mut target = self.state.store_mut(place.scope).get_mut(&place.name);
		for key in parents {
			target = match target {
				Some(Value::List(items)) => index_of(key).and_then(|i| items.get_mut(i)),
				_ => None,
			};
		}
		if let Some(Value::List(items)) = target
			&& let Some(item) = index_of(last).and_then(|i| items.get_mut(i))
		{
			*item = Value::Undefined;
		}
	}

	fn call(&mut self, callee: &Expr, args: &[Expr]) -> Result<Value, ScriptError> {
		let name = match callee {
			Expr::Ident(name) if FUNCTIONS.contains(&name.as_str()) => name.clone(),
			Expr::Ident(name) if name != "State" && name != "Math" => {
				return Err(ScriptError::Reference(format!("{name} is not defined")));
			}
			Expr::Member { object, property } if matches!(object.as_ref(), Expr::Ident(root) if root == "Math") => {
				let property = self.expr(property)?.to_string();
				if !MATH_FUNCTIONS.contains(&property.as_str()) {
					return Err(ScriptError::Type(format!("Math.{property} is not a function")));
				}
				format!("Math.{property}")
			}
			_ => return Err(ScriptError::Type(format!("{} is not a function", describe(callee)))),
		};
		let args = self.values(args)?;
		let number = || args.first().map_or(f64::NAN, Value::to_number);

		Ok(match name.as_str() {
			"print" => {
				if let Some(output) = self.output.as_deref_mut() {
					for arg in &args {
						output.push_str(&string_from(arg));
					}
				}
				Value::Undefined
			}
			"String" => Value::String(args.first().map(Value::to_string).unwrap_or_default()),
			"Number" => Value::Number(args.first().map_or(0.0, Value::to_number)),
			"Boolean" => Value::Bool(args.first().is_some_and(Value::is_truthy)),
			"Math.floor" => Value::Number(number().floor()),
			"Math.ceil" => Value::Number(number().ceil()),
			"Math.round" => Value::Number(js_round(number())),
			"Math.trunc" => Value::Number(number().trunc()),
			"Math.abs" => Value::Number(number().abs()),
			"Math.sqrt" => Value::Number(number().sqrt()),
			"Math.min" => Value::Number(fold_numbers(&args, f64::INFINITY, f64::min)),
			"Math.max" => Value::Number(fold_numbers(&args, f64::NEG_INFINITY, f64::max)),
			_ => return Err(ScriptError::Type(format!("{name} is not a function"))),
		})
	}
}

/// Evaluates `code` against `state`, discarding any printed output.
pub fn evaluate(state: &mut State, code: &str) -> Result<Value, ScriptError> {
	Interpreter::new(state).eval(code)
}

fn not_a_value(name: &str) -> ScriptError {
	ScriptError::Type(format!("{name} cannot be used as a value"))
}

fn cannot_set(target: &Value, key: &Value) -> ScriptError {
	ScriptError::Type(format!("Cannot set properties of {target} (setting '{key}')"))
}

fn describe(expr: &Expr) -> String {
	match expr {
		Expr::Ident(name) => name.clone(),
		Expr::Member { object, property } => match property.as_ref() {
			Expr::Literal(Value::String(name)) => format!("{}.{name}", describe(object)),
			_ => format!("{}[...]", describe(object)),
		},
		Expr::Literal(value) => value.to_string(),
		_ => "expression".into(),
	}
}

fn math_constant(name: &str) -> Value {
	match name {
		"PI" => Value::Number(std::f64::consts::PI),
		"E" => Value::Number(std::f64::consts::E),
		_ => Value::Undefined,
	}
}

/// Rounds half up, as scripts expect (`-2.5` rounds to `-2`).
fn js_round(n: f64) -> f64 {
	if !n.is_finite() || n.fract() == 0.0 {
		return n;
	}
	(n + 0.5).floor()
}

fn fold_numbers(args: &[Value], init: f64, pick: fn(f64, f64) -> f64) -> f64 {
	args.iter().map(Value::to_number).try_fold(init, |acc, n| if n.is_nan() { None } else { Some(pick(acc, n)) }).unwrap_or(f64::NAN)
}

fn index_of(key: &Value) -> Option<usize> {
	match key {
		Value::Number(n) if *n >= 0.0 && n.fract() == 0.0 && *n < usize::MAX as f64 => Some(*n as usize),
		Value::String(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => s.parse().ok(),
		_ => None,
	}
}

fn get_property(object: &Value, key: &Value) -> Result<Value, ScriptError> {
	if object.is_nullish() {
		return Err(ScriptError::Type(format!("Cannot read properties of {object} (reading '{key}')")));
	}
	if key.as_str() == Some("length") {
		return Ok(match object {
			Value::String(s) => Value::Number(s.encode_utf16().count() as f64),
			Value::List(items) => Value::Number(items.len() as f64),
			_ => Value::Undefined,
		});
	}
	Ok(match (object, index_of(key)) {
		(Value::List(items), Some(index)) => items.get(index).cloned().unwrap_or_default(),
		(Value::String(s), Some(index)) => s.chars().nth(index).map(|c| Value::String(c.to_string())).unwrap_or_default(),
		_ => Value::Undefined,
	})
}

/// Converts lists to their string form, as relational and loose comparisons do.
fn primitive(value: &Value) -> Value {
	match value {
		Value::List(_) => Value::String(value.to_string()),
		other => other.clone(),
	}
}

fn compare(left: &Value, right: &Value) -> Option<Ordering> {
	match (primitive(left), primitive(right)) {
		(Value::String(a), Value::String(b)) => Some(a.cmp(&b)),
		(a, b) => a.to_number().partial_cmp(&b.to_number()),
	}
}

fn loose_eq(left: &Value, right: &Value) -> bool {
	match (left, right) {
		(a, b) if a.is_nullish() || b.is_nullish() => a.is_nullish() && b.is_nullish(),
		(Value::Bool(_), Value::Bool(_)) => left == right,
		(Value::Bool(b), other) | (other, Value::Bool(b)) => loose_eq(&Value::Number(f64::from(u8::from(*b))), other),
		(Value::Number(_), Value::String(_)) | (Value::String(_), Value::Number(_)) => left.to_number() == right.to_number(),
		(Value::List(_), Value::List(_)) => left == right,
		(Value::List(_), _) | (_, Value::List(_)) => loose_eq(&primitive(left), &primitive(right)),
		_ => left == right,
	}
}

pub(crate) fn binary(op: BinaryOp, left: &Value, right: &Value) -> Value {
	let numeric = |f: fn(f64, f64) -> f64| Value::Number(f(left.to_number(), right.to_number()));
	match op {
		BinaryOp::Add => {
			let stringy = |v: &Value| matches!(v, Value::String(_) | Value::List(_));
			if stringy(left) || stringy(right) {
				Value::String(format!("{left}{right}"))
			} else {
				numeric(|a, b| a + b)
			}
		}
		BinaryOp::Sub => numeric(|a, b| a - b),
		BinaryOp::Mul => numeric(|a, b| a * b),
		BinaryOp::Div => numeric(|a, b| a / b),
		BinaryOp::Rem => numeric(|a, b| a % b),
		BinaryOp::Lt => Value::Bool(compare(left, right) == Some(Ordering::Less)),
		BinaryOp::Gt => Value::Bool(compare(left, right) == Some(Ordering::Greater)),
		BinaryOp::Le => Value::Bool(matches!(compare(left, right), Some(Ordering::Less | Ordering::Equal))),
		BinaryOp::Ge => Value::Bool(matches!(compare(left, right), Some(Ordering::Greater | Ordering::Equal))),
		BinaryOp::Eq => Value::Bool(loose_eq(left, right)),
		BinaryOp::Ne => Value::Bool(!loose_eq(left, right)),
		BinaryOp::StrictEq => Value::Bool(left == right),
		BinaryOp::StrictNe => Value::Bool(left != right),
	}
}
