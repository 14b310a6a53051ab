use std::collections::HashMap;

pub type RecordId = i64;

static NULL: FieldValue = FieldValue::Null;

/// Column values of one record, keyed by catalog column key. Used to evaluate predicates without a
/// database.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordFields {
	values: HashMap<String, FieldValue>,
}
impl RecordFields {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with(mut self, key: &str, value: impl Into<FieldValue>) -> Self {
		self.insert(key, value);

		self
	}

	pub fn insert(&mut self, key: &str, value: impl Into<FieldValue>) {
		self.values.insert(key.to_string(), value.into());
	}

	/// Missing keys read as [`FieldValue::Null`].
	pub fn get(&self, key: &str) -> &FieldValue {
		self.values.get(key).unwrap_or(&NULL)
	}
}

#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
	Null,
	Int(i64),
	Float(f64),
	Text(String),
	List(Vec<String>),
}
impl FieldValue {
	pub fn as_f64(&self) -> Option<f64> {
		match self {
			Self::Int(value) => Some(*value as f64),
			Self::Float(value) => Some(*value),
			_ => None,
		}
	}

	/// Text rendering of a scalar, as a cast to text would produce it.
	pub fn render_text(&self) -> Option<String> {
		match self {
			Self::Int(value) => Some(value.to_string()),
			Self::Float(value) => Some(value.to_string()),
			Self::Text(value) => Some(value.clone()),
			Self::Null | Self::List(_) => None,
		}
	}
}
impl From<i64> for FieldValue {
	fn from(value: i64) -> Self {
		Self::Int(value)
	}
}
impl From<f64> for FieldValue {
	fn from(value: f64) -> Self {
		Self::Float(value)
	}
}
impl From<&str> for FieldValue {
	fn from(value: &str) -> Self {
		Self::Text(value.to_string())
	}
}
impl From<String> for FieldValue {
	fn from(value: String) -> Self {
		Self::Text(value)
	}
}
impl From<Vec<&str>> for FieldValue {
	fn from(values: Vec<&str>) -> Self {
		Self::List(values.into_iter().map(str::to_string).collect())
	}
}
impl From<Vec<String>> for FieldValue {
	fn from(values: Vec<String>) -> Self {
		Self::List(values)
	}
}
impl<T> From<Option<T>> for FieldValue
where
	T: Into<FieldValue>,
{
	fn from(value: Option<T>) -> Self {
		value.map_or(Self::Null, Into::into)
	}
}
