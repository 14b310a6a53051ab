use std::fmt::Write as _;

use crate::{
	columns::{self, ColumnDescriptor, ValueType},
	constraint::{ColumnConstraint, Constraint, ConstraintGroup, Literal, LogicalOp, Operator},
	record::{FieldValue, RecordFields},
};

/// A bound query parameter. Placeholders are numbered in push order.
#[derive(Clone, Debug, PartialEq)]
pub enum SqlValue {
	Text(String),
	Int(i64),
	Float(f64),
	TextArray(Vec<String>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct SqlFragment {
	pub sql: String,
	pub params: Vec<SqlValue>,
}

/// Compiled filter. An empty predicate matches every record.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Predicate {
	condition: Option<Condition>,
}
impl Predicate {
	pub fn always() -> Self {
		Self::default()
	}

	pub fn is_always(&self) -> bool {
		self.condition.is_none()
	}

	/// Renders the predicate with placeholders starting at `$first_placeholder`.
	pub fn to_sql(&self, first_placeholder: usize) -> SqlFragment {
		let Some(condition) = &self.condition else {
			return SqlFragment { sql: "TRUE".to_string(), params: Vec::new() };
		};
		let mut renderer = Renderer { sql: String::new(), params: Vec::new(), first_placeholder };

		condition.render(&mut renderer);

		SqlFragment { sql: renderer.sql, params: renderer.params }
	}

	/// Evaluates the predicate with SQL null semantics: a comparison against a missing value is
	/// unknown, and only a definite true matches.
	pub fn matches(&self, record: &RecordFields) -> bool {
		match &self.condition {
			None => true,
			Some(condition) => condition.eval(record) == Some(true),
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
enum Number {
	Int(i64),
	Float(f64),
}
impl Number {
	fn as_f64(&self) -> f64 {
		match self {
			Self::Int(value) => *value as f64,
			Self::Float(value) => *value,
		}
	}

	fn to_sql_value(&self) -> SqlValue {
		match self {
			Self::Int(value) => SqlValue::Int(*value),
			Self::Float(value) => SqlValue::Float(*value),
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
enum Test {
	TextEquals { value: String, fold: bool },
	TextContains { needle: String, fold: bool },
	NumberEquals { value: Number },
	NumberContains { needle: String },
	Between { from: Number, to: Number },
	ListContainsAll { values: Vec<String>, fold: bool },
	ListOverlaps { values: Vec<String>, fold: bool },
	ListElementContains { needle: String, fold: bool },
}

#[derive(Clone, Debug, PartialEq)]
enum Condition {
	Test { column: &'static ColumnDescriptor, test: Test },
	Absent(&'static ColumnDescriptor),
	Not(Box<Condition>),
	Group(Box<Condition>),
	Binary(LogicalOp, Box<Condition>, Box<Condition>),
}
impl Condition {
	fn binary(op: LogicalOp, lhs: Self, rhs: Self) -> Self {
		Self::Binary(op, Box::new(lhs), Box::new(rhs))
	}

	fn render(&self, r: &mut Renderer) {
		match self {
			Self::Test { column, test } => r.test(column, test),
			Self::Absent(column) =>
				if column.is_list() {
					let _ = write!(r.sql, "coalesce(cardinality({}), 0) = 0", column.location);
				} else {
					let _ = write!(r.sql, "{} IS NULL", column.location);
				},
			Self::Not(inner) => {
				r.sql.push_str("NOT ");

				if matches!(**inner, Self::Group(_)) {
					inner.render(r);
				} else {
					r.sql.push('(');
					inner.render(r);
					r.sql.push(')');
				}
			},
			Self::Group(inner) => {
				r.sql.push('(');
				inner.render(r);
				r.sql.push(')');
			},
			Self::Binary(op, lhs, rhs) => {
				lhs.render_operand(r);
				r.sql.push_str(match op {
					LogicalOp::And => " AND ",
					LogicalOp::Or => " OR ",
				});
				rhs.render_operand(r);
			},
		}
	}

	// Nested binaries keep their fold order through explicit parentheses.
	fn render_operand(&self, r: &mut Renderer) {
		if matches!(self, Self::Binary(..)) {
			r.sql.push('(');
			self.render(r);
			r.sql.push(')');
		} else {
			self.render(r);
		}
	}

	fn eval(&self, record: &RecordFields) -> Option<bool> {
		match self {
			Self::Test { column, test } => eval_test(record.get(column.key), test),
			Self::Absent(column) => Some(match record.get(column.key) {
				FieldValue::Null => true,
				FieldValue::List(items) => items.is_empty(),
				_ => false,
			}),
			Self::Not(inner) => inner.eval(record).map(|value| !value),
			Self::Group(inner) => inner.eval(record),
			Self::Binary(LogicalOp::And, lhs, rhs) => match (lhs.eval(record), rhs.eval(record)) {
				(Some(false), _) | (_, Some(false)) => Some(false),
				(Some(true), Some(true)) => Some(true),
				_ => None,
			},
			Self::Binary(LogicalOp::Or, lhs, rhs) => match (lhs.eval(record), rhs.eval(record)) {
				(Some(true), _) | (_, Some(true)) => Some(true),
				(Some(false), Some(false)) => Some(false),
				_ => None,
			},
		}
	}
}

struct Renderer {
	sql: String,
	params: Vec<SqlValue>,
	first_placeholder: usize,
}
impl Renderer {
	fn bind(&mut self, value: SqlValue) -> String {
		let index = self.first_placeholder + self.params.len();

		self.params.push(value);

		format!("${index}")
	}

	fn test(&mut self, column: &ColumnDescriptor, test: &Test) {
		let col = column.location;
		let rendered = match test {
			Test::TextEquals { value, fold: true } => {
				let p = self.bind(SqlValue::Text(value.clone()));

				format!("LOWER({col}) = LOWER({p})")
			},
			Test::TextEquals { value, fold: false } => {
				let p = self.bind(SqlValue::Text(value.clone()));

				format!("{col} = {p}")
			},
			Test::TextContains { needle, fold: true } => {
				let p = self.bind(SqlValue::Text(like_pattern(needle)));

				format!("LOWER({col}) LIKE LOWER({p})")
			},
			Test::TextContains { needle, fold: false } => {
				let p = self.bind(SqlValue::Text(like_pattern(needle)));

				format!("{col} LIKE {p}")
			},
			Test::NumberEquals { value } => {
				let p = self.bind(value.to_sql_value());

				format!("{col} = {p}")
			},
			Test::NumberContains { needle } => {
				let p = self.bind(SqlValue::Text(like_pattern(needle)));

				format!("CAST({col} AS TEXT) LIKE {p}")
			},
			Test::Between { from, to } => {
				let from = self.bind(from.to_sql_value());
				let to = self.bind(to.to_sql_value());

				format!("{col} BETWEEN {from} AND {to}")
			},
			Test::ListContainsAll { values, fold } => self.list_set(col, "@>", values, *fold),
			Test::ListOverlaps { values, fold } => self.list_set(col, "&&", values, *fold),
			Test::ListElementContains { needle, fold } => {
				let p = self.bind(SqlValue::Text(like_pattern(needle)));
				let test = if *fold {
					format!("EXISTS (SELECT 1 FROM unnest({col}) AS e WHERE LOWER(e) LIKE LOWER({p}))")
				} else {
					format!("EXISTS (SELECT 1 FROM unnest({col}) AS e WHERE e LIKE {p})")
				};

				null_if_absent(col, &test)
			},
		};

		self.sql.push_str(&rendered);
	}

	fn list_set(&mut self, col: &str, op: &str, values: &[String], fold: bool) -> String {
		let p = self.bind(SqlValue::TextArray(values.to_vec()));

		if fold {
			let test = format!(
				"ARRAY(SELECT LOWER(e) FROM unnest({col}) AS e) {op} ARRAY(SELECT LOWER(e) FROM unnest({p}::text[]) AS e)"
			);

			null_if_absent(col, &test)
		} else {
			format!("{col} {op} {p}::text[]")
		}
	}
}

/// Compiles a filter sequence left to right.
///
/// The running operator is whichever logical token appeared last (AND before any). Predicates that
/// reference an unknown column, use an operator the column does not support, or lack usable
/// operands contribute nothing.
pub fn compile(tree: &[Constraint]) -> Predicate {
	Predicate { condition: fold(tree, None) }
}

fn fold(nodes: &[Constraint], inherited_keep_null: Option<bool>) -> Option<Condition> {
	let mut current: Option<Condition> = None;
	let mut op = LogicalOp::And;

	for node in nodes {
		let next = match node {
			Constraint::Logical(next_op) => {
				op = *next_op;

				continue;
			},
			Constraint::Column(column) => compile_column(column, inherited_keep_null),
			Constraint::Group(group) => compile_group(group, inherited_keep_null),
		};
		let Some(next) = next else {
			continue;
		};

		current = Some(match current.take() {
			None => next,
			Some(prev) => Condition::binary(op, prev, next),
		});
	}

	current
}

fn compile_group(group: &ConstraintGroup, inherited_keep_null: Option<bool>) -> Option<Condition> {
	let inner = fold(&group.children, group.keep_null.or(inherited_keep_null))?;
	let grouped = Condition::Group(Box::new(inner));

	if group.is_not { Some(Condition::Not(Box::new(grouped))) } else { Some(grouped) }
}

fn compile_column(
	constraint: &ColumnConstraint,
	inherited_keep_null: Option<bool>,
) -> Option<Condition> {
	let column = columns::lookup(constraint.column_key.as_deref()?)?;
	let operator = constraint.operator?;

	if !column.supports(operator) {
		return None;
	}

	let fold = column.is_textual() && !constraint.case_sensitive;
	let mut condition = match operator {
		Operator::Equal =>
			equal_condition(column, constraint.equal_to.as_ref()?, constraint.exact_match, fold)?,
		Operator::Between =>
			between_condition(column, constraint.from.as_ref()?, constraint.to.as_ref()?)?,
		Operator::Includes =>
			includes_condition(column, constraint.values.as_deref()?, constraint.exact_match, fold)?,
	};

	if constraint.is_not {
		condition = Condition::Not(Box::new(condition));
	}
	if constraint.keep_null.or(inherited_keep_null).unwrap_or(false) {
		condition = Condition::binary(LogicalOp::Or, condition, Condition::Absent(column));
	}

	Some(condition)
}

fn equal_condition(
	column: &'static ColumnDescriptor,
	operand: &Literal,
	exact: bool,
	fold: bool,
) -> Option<Condition> {
	let test = if column.is_list() {
		let text = operand.as_text();

		if exact {
			Test::ListContainsAll { values: vec![text], fold }
		} else {
			Test::ListElementContains { needle: text, fold }
		}
	} else {
		match (column.value_type, exact) {
			(ValueType::Text, true) => Test::TextEquals { value: operand.as_text(), fold },
			(ValueType::Text, false) => Test::TextContains { needle: operand.as_text(), fold },
			(_, true) => Test::NumberEquals { value: number(column, operand)? },
			(_, false) => Test::NumberContains { needle: operand.as_text() },
		}
	};

	Some(Condition::Test { column, test })
}

fn between_condition(
	column: &'static ColumnDescriptor,
	from: &Literal,
	to: &Literal,
) -> Option<Condition> {
	if column.is_list() || column.value_type == ValueType::Text {
		return None;
	}

	let test = Test::Between { from: number(column, from)?, to: number(column, to)? };

	Some(Condition::Test { column, test })
}

fn includes_condition(
	column: &'static ColumnDescriptor,
	values: &[Literal],
	exact: bool,
	fold: bool,
) -> Option<Condition> {
	if values.is_empty() {
		return None;
	}
	if column.is_list() {
		let values = values.iter().map(Literal::as_text).collect();
		let test = if exact {
			Test::ListContainsAll { values, fold }
		} else {
			Test::ListOverlaps { values, fold }
		};

		return Some(Condition::Test { column, test });
	}

	let join = if exact { LogicalOp::And } else { LogicalOp::Or };
	let mut tests = values.iter().filter_map(|value| {
		let test = match column.value_type {
			ValueType::Text => Test::TextContains { needle: value.as_text(), fold },
			_ => Test::NumberEquals { value: number(column, value)? },
		};

		Some(Condition::Test { column, test })
	});
	let first = tests.next()?;

	Some(tests.fold(first, |acc, next| Condition::binary(join, acc, next)))
}

fn number(column: &ColumnDescriptor, literal: &Literal) -> Option<Number> {
	match column.value_type {
		ValueType::Int => literal.as_int().map(Number::Int),
		ValueType::Numeric => literal.as_float().map(Number::Float),
		ValueType::Text => None,
	}
}

// Subqueries over `unnest` see a NULL array as empty and answer FALSE. The test must stay unknown
// instead, so that negation does not keep records without the column.
fn null_if_absent(col: &str, test: &str) -> String {
	format!("CASE WHEN {col} IS NULL THEN NULL ELSE {test} END")
}

fn like_pattern(needle: &str) -> String {
	let mut out = String::with_capacity(needle.len() + 2);

	out.push('%');

	for ch in needle.chars() {
		if matches!(ch, '\\' | '%' | '_') {
			out.push('\\');
		}

		out.push(ch);
	}

	out.push('%');

	out
}

fn eval_test(value: &FieldValue, test: &Test) -> Option<bool> {
	if matches!(value, FieldValue::Null) {
		return None;
	}

	match (test, value) {
		(Test::TextEquals { value: expected, fold }, FieldValue::Text(actual)) =>
			Some(text_eq(actual, expected, *fold)),
		(Test::TextContains { needle, fold }, FieldValue::Text(actual)) =>
			Some(text_contains(actual, needle, *fold)),
		(Test::NumberEquals { value: expected }, actual) =>
			actual.as_f64().map(|actual| actual == expected.as_f64()),
		(Test::NumberContains { needle }, actual) =>
			actual.render_text().map(|actual| actual.contains(needle.as_str())),
		(Test::Between { from, to }, actual) => actual
			.as_f64()
			.map(|actual| from.as_f64() <= actual && actual <= to.as_f64()),
		(Test::ListContainsAll { values, fold }, FieldValue::List(items)) => Some(
			values.iter().all(|value| items.iter().any(|item| text_eq(item, value, *fold))),
		),
		(Test::ListOverlaps { values, fold }, FieldValue::List(items)) => Some(
			values.iter().any(|value| items.iter().any(|item| text_eq(item, value, *fold))),
		),
		(Test::ListElementContains { needle, fold }, FieldValue::List(items)) =>
			Some(items.iter().any(|item| text_contains(item, needle, *fold))),
		_ => None,
	}
}

fn text_eq(lhs: &str, rhs: &str, fold: bool) -> bool {
	if fold { lhs.to_lowercase() == rhs.to_lowercase() } else { lhs == rhs }
}

fn text_contains(haystack: &str, needle: &str, fold: bool) -> bool {
	if fold { haystack.to_lowercase().contains(&needle.to_lowercase()) } else { haystack.contains(needle) }
}
