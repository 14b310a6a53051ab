use std::fmt::{Display, Formatter};

use serde::Serialize;
use serde_json::{Map, Value};

pub const MAX_FILTER_DEPTH: usize = 8;
pub const MAX_FILTER_NODES: usize = 128;
pub const MAX_IN_LIST_ITEMS: usize = 128;
pub const MAX_STRING_BYTES: usize = 512;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterParseError {
	pub path: String,
	pub message: String,
}
impl FilterParseError {
	fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
		Self { path: path.into(), message: message.into() }
	}
}
impl Display for FilterParseError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}: {}", self.path, self.message)
	}
}
impl std::error::Error for FilterParseError {}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operator {
	Equal,
	Between,
	Includes,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogicalOp {
	#[default]
	And,
	Or,
}

/// One node of a filter sequence. Sequences are folded left to right; see
/// [`crate::predicate::compile`].
#[derive(Clone, Debug, PartialEq)]
pub enum Constraint {
	Column(ColumnConstraint),
	Logical(LogicalOp),
	Group(ConstraintGroup),
}

/// A predicate over one catalogued column. Operands stay optional here: a missing or ill-typed
/// operand is not a parse error, it makes the predicate compile to nothing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ColumnConstraint {
	pub operator: Option<Operator>,
	pub column_key: Option<String>,
	pub is_not: bool,
	pub exact_match: bool,
	pub case_sensitive: bool,
	pub keep_null: Option<bool>,
	pub equal_to: Option<Literal>,
	pub from: Option<Literal>,
	pub to: Option<Literal>,
	pub values: Option<Vec<Literal>>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConstraintGroup {
	pub children: Vec<Constraint>,
	pub is_not: bool,
	pub keep_null: Option<bool>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
	Text(String),
	Int(i64),
	Float(f64),
}
impl Literal {
	pub fn as_text(&self) -> String {
		match self {
			Self::Text(value) => value.clone(),
			Self::Int(value) => value.to_string(),
			Self::Float(value) => value.to_string(),
		}
	}

	pub fn as_int(&self) -> Option<i64> {
		match self {
			Self::Int(value) => Some(*value),
			Self::Float(value) if value.fract() == 0.0 && value.is_finite() => Some(*value as i64),
			Self::Float(_) => None,
			Self::Text(value) => value.trim().parse().ok(),
		}
	}

	pub fn as_float(&self) -> Option<f64> {
		match self {
			Self::Int(value) => Some(*value as f64),
			Self::Float(value) => Some(*value).filter(|value| value.is_finite()),
			Self::Text(value) => value.trim().parse().ok().filter(|value: &f64| value.is_finite()),
		}
	}
}

#[derive(Default)]
struct ParseState {
	nodes: usize,
}

/// Parses a filter sequence such as the `hard_constraints` field of a query request.
///
/// `null` is accepted as the empty sequence. Structural problems and size limits are errors that
/// carry the JSON path of the offending node.
pub fn parse_constraints(raw: &Value, path: &str) -> Result<Vec<Constraint>, FilterParseError> {
	if raw.is_null() {
		return Ok(Vec::new());
	}

	let mut state = ParseState::default();

	parse_sequence(raw, path, 1, &mut state)
}

fn parse_sequence(
	raw: &Value,
	path: &str,
	depth: usize,
	state: &mut ParseState,
) -> Result<Vec<Constraint>, FilterParseError> {
	if depth > MAX_FILTER_DEPTH {
		return Err(FilterParseError::new(
			path,
			format!("filter exceeds depth limit ({depth}/{MAX_FILTER_DEPTH})."),
		));
	}

	let nodes = raw
		.as_array()
		.ok_or_else(|| FilterParseError::new(path, "constraints must be an array."))?;

	nodes
		.iter()
		.enumerate()
		.map(|(index, node)| parse_node(node, &format!("{path}[{index}]"), depth, state))
		.collect()
}

fn parse_node(
	raw: &Value,
	path: &str,
	depth: usize,
	state: &mut ParseState,
) -> Result<Constraint, FilterParseError> {
	state.nodes = state.nodes.saturating_add(1);

	if state.nodes > MAX_FILTER_NODES {
		return Err(FilterParseError::new(
			path,
			format!("filter exceeds node limit ({}/{MAX_FILTER_NODES}).", state.nodes),
		));
	}

	let map = raw
		.as_object()
		.ok_or_else(|| FilterParseError::new(path, "constraint node must be an object."))?;
	let node_type = map
		.get("type")
		.and_then(Value::as_str)
		.ok_or_else(|| {
			FilterParseError::new(
				format!("{path}.type"),
				"constraint node is missing required string type.",
			)
		})?
		.to_ascii_uppercase();

	match node_type.as_str() {
		"AND" => Ok(Constraint::Logical(LogicalOp::And)),
		"OR" => Ok(Constraint::Logical(LogicalOp::Or)),
		"GROUP" => {
			let children_path = format!("{path}.children");
			let children = match map.get("children") {
				None | Some(Value::Null) => Vec::new(),
				Some(children) => parse_sequence(children, &children_path, depth + 1, state)?,
			};

			Ok(Constraint::Group(ConstraintGroup {
				children,
				is_not: flag(map, "isNot"),
				keep_null: map.get("keepNull").and_then(Value::as_bool),
			}))
		},
		"EQUAL" => parse_column(map, Operator::Equal, path).map(Constraint::Column),
		"BETWEEN" => parse_column(map, Operator::Between, path).map(Constraint::Column),
		"INCLUDES" => parse_column(map, Operator::Includes, path).map(Constraint::Column),
		other => Err(FilterParseError::new(
			format!("{path}.type"),
			format!("unsupported constraint type '{other}'."),
		)),
	}
}

fn parse_column(
	map: &Map<String, Value>,
	operator: Operator,
	path: &str,
) -> Result<ColumnConstraint, FilterParseError> {
	let column_key = map
		.get("columnKey")
		.and_then(Value::as_str)
		.or_else(|| map.get("selectedColumn").and_then(|column| column.get("key")?.as_str()))
		.map(str::to_string);
	let values = match map.get("values") {
		Some(Value::Array(items)) => {
			if items.len() > MAX_IN_LIST_ITEMS {
				return Err(FilterParseError::new(
					format!("{path}.values"),
					format!(
						"values list exceeds maximum size ({}/{MAX_IN_LIST_ITEMS}).",
						items.len()
					),
				));
			}

			let mut out = Vec::with_capacity(items.len());

			for (index, item) in items.iter().enumerate() {
				if let Some(literal) = parse_literal(item, &format!("{path}.values[{index}]"))? {
					out.push(literal);
				}
			}

			Some(out)
		},
		_ => None,
	};

	Ok(ColumnConstraint {
		operator: Some(operator),
		column_key,
		is_not: flag(map, "isNot"),
		exact_match: flag(map, "exactMatch"),
		case_sensitive: flag(map, "caseSensitive"),
		keep_null: map.get("keepNull").and_then(Value::as_bool),
		equal_to: optional_literal(map, "equalTo", path)?,
		from: optional_literal(map, "from", path)?,
		to: optional_literal(map, "to", path)?,
		values,
	})
}

fn flag(map: &Map<String, Value>, key: &str) -> bool {
	map.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn optional_literal(
	map: &Map<String, Value>,
	key: &str,
	path: &str,
) -> Result<Option<Literal>, FilterParseError> {
	match map.get(key) {
		Some(raw) => parse_literal(raw, &format!("{path}.{key}")),
		None => Ok(None),
	}
}

// Booleans, nulls, arrays and objects are not literals. They come back as `None` so the owning
// predicate degrades to a no-op.
fn parse_literal(raw: &Value, path: &str) -> Result<Option<Literal>, FilterParseError> {
	match raw {
		Value::String(value) => {
			if value.len() > MAX_STRING_BYTES {
				return Err(FilterParseError::new(
					path,
					format!("string value exceeds maximum bytes ({MAX_STRING_BYTES})."),
				));
			}

			Ok(Some(Literal::Text(value.clone())))
		},
		Value::Number(number) => Ok(number
			.as_i64()
			.map(Literal::Int)
			.or_else(|| number.as_f64().map(Literal::Float))),
		_ => Ok(None),
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn reads_column_key_from_selected_column() {
		let raw = json!([{
			"type": "EQUAL",
			"selectedColumn": { "key": "title" },
			"equalTo": "une femme",
		}]);
		let parsed = parse_constraints(&raw, "$.hard_constraints").expect("parse failed");
		let Constraint::Column(column) = &parsed[0] else {
			panic!("Expected a column constraint.");
		};

		assert_eq!(column.column_key.as_deref(), Some("title"));
		assert_eq!(column.equal_to, Some(Literal::Text("une femme".to_string())));
		assert!(!column.case_sensitive);
	}

	#[test]
	fn unknown_type_reports_path() {
		let raw = json!([{ "type": "AND" }, { "type": "XOR" }]);
		let err = parse_constraints(&raw, "$.hard_constraints").expect_err("expected error");

		assert_eq!(err.path, "$.hard_constraints[1].type");
		assert!(err.message.contains("XOR"));
	}

	#[test]
	fn ill_typed_operands_are_kept_as_absent() {
		let raw = json!([{ "type": "BETWEEN", "columnKey": "height", "from": true, "to": [1] }]);
		let parsed = parse_constraints(&raw, "$").expect("parse failed");
		let Constraint::Column(column) = &parsed[0] else {
			panic!("Expected a column constraint.");
		};

		assert_eq!(column.from, None);
		assert_eq!(column.to, None);
	}

	#[test]
	fn nesting_beyond_depth_limit_is_rejected() {
		let mut raw = json!([]);

		for _ in 0..MAX_FILTER_DEPTH {
			raw = json!([{ "type": "GROUP", "children": raw }]);
		}

		let err = parse_constraints(&raw, "$").expect_err("expected depth error");

		assert!(err.message.contains("depth limit"), "unexpected error: {err}");
	}

	#[test]
	fn node_limit_is_enforced() {
		let nodes: Vec<_> = (0..=MAX_FILTER_NODES).map(|_| json!({ "type": "AND" })).collect();
		let err = parse_constraints(&Value::Array(nodes), "$").expect_err("expected node error");

		assert!(err.message.contains("node limit"), "unexpected error: {err}");
		assert_eq!(err.path, format!("$[{MAX_FILTER_NODES}]"));
	}

	#[test]
	fn non_array_root_is_rejected() {
		let err = parse_constraints(&json!({ "type": "AND" }), "$.hard_constraints")
			.expect_err("expected error");

		assert_eq!(err.path, "$.hard_constraints");
	}

	#[test]
	fn null_root_is_empty() {
		assert!(parse_constraints(&Value::Null, "$").expect("parse failed").is_empty());
	}
}
