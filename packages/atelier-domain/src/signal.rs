use serde::Serialize;
use serde_json::Value;

use crate::{
	constraint::{FilterParseError, MAX_FILTER_NODES, MAX_STRING_BYTES},
	record::RecordId,
};

/// Named concepts with stored embeddings per model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConceptKind {
	Keyword,
	Color,
	Luminosity,
}
impl ConceptKind {
	pub const ALL: [Self; 3] = [Self::Keyword, Self::Color, Self::Luminosity];

	pub fn parse(raw: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|kind| raw.trim().eq_ignore_ascii_case(kind.as_str()))
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Keyword => "keyword",
			Self::Color => "color",
			Self::Luminosity => "luminosity",
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub enum SignalSource {
	/// Free text, embedded at query time.
	Term(String),
	Concept(ConceptKind, String),
	/// The stored embedding of a record.
	Record(RecordId),
}

#[derive(Clone, Debug, PartialEq)]
pub struct SoftSignal {
	pub source: SignalSource,
	pub weight: f32,
}
impl SoftSignal {
	pub fn term(text: &str, weight: f32) -> Self {
		Self { source: SignalSource::Term(text.to_string()), weight }
	}

	pub fn concept(kind: ConceptKind, name: &str, weight: f32) -> Self {
		Self { source: SignalSource::Concept(kind, name.to_string()), weight }
	}

	pub fn record(record_id: RecordId, weight: f32) -> Self {
		Self { source: SignalSource::Record(record_id), weight }
	}

	/// Zero, non-finite, or empty signals carry no direction.
	pub fn is_active(&self) -> bool {
		if self.weight == 0.0 || !self.weight.is_finite() {
			return false;
		}

		match &self.source {
			SignalSource::Term(text) | SignalSource::Concept(_, text) => !text.trim().is_empty(),
			SignalSource::Record(_) => true,
		}
	}
}

/// Parses the `soft_constraints` list of a query request. Nodes whose value field is missing are
/// skipped; unknown types and non-numeric weights are errors.
pub fn parse_soft_signals(raw: &Value, path: &str) -> Result<Vec<SoftSignal>, FilterParseError> {
	if raw.is_null() {
		return Ok(Vec::new());
	}

	let nodes = raw.as_array().ok_or_else(|| FilterParseError {
		path: path.to_string(),
		message: "soft constraints must be an array.".to_string(),
	})?;

	if nodes.len() > MAX_FILTER_NODES {
		return Err(FilterParseError {
			path: path.to_string(),
			message: format!(
				"soft constraints exceed node limit ({}/{MAX_FILTER_NODES}).",
				nodes.len()
			),
		});
	}

	let mut out = Vec::with_capacity(nodes.len());

	for (index, node) in nodes.iter().enumerate() {
		if let Some(signal) = parse_signal(node, &format!("{path}[{index}]"))? {
			out.push(signal);
		}
	}

	Ok(out)
}

fn parse_signal(raw: &Value, path: &str) -> Result<Option<SoftSignal>, FilterParseError> {
	let map = raw.as_object().ok_or_else(|| FilterParseError {
		path: path.to_string(),
		message: "soft constraint must be an object.".to_string(),
	})?;
	let signal_type = map
		.get("type")
		.and_then(Value::as_str)
		.ok_or_else(|| FilterParseError {
			path: format!("{path}.type"),
			message: "soft constraint is missing required string type.".to_string(),
		})?
		.to_ascii_uppercase();
	let weight = match map.get("weight") {
		None | Some(Value::Null) => 1.0,
		Some(value) => value.as_f64().ok_or_else(|| FilterParseError {
			path: format!("{path}.weight"),
			message: "weight must be a number.".to_string(),
		})? as f32,
	};
	let text = |key: &str| -> Result<Option<String>, FilterParseError> {
		let Some(value) = map.get(key).and_then(Value::as_str) else {
			return Ok(None);
		};

		if value.len() > MAX_STRING_BYTES {
			return Err(FilterParseError {
				path: format!("{path}.{key}"),
				message: format!("string value exceeds maximum bytes ({MAX_STRING_BYTES})."),
			});
		}

		Ok(Some(value.to_string()))
	};
	let source = match signal_type.as_str() {
		"TERM" => text("term")?.map(SignalSource::Term),
		"KEYWORD" => text("keyword")?.map(|name| SignalSource::Concept(ConceptKind::Keyword, name)),
		"COLOR" => text("color")?.map(|name| SignalSource::Concept(ConceptKind::Color, name)),
		"LUMINOSITY" =>
			text("luminosity")?.map(|name| SignalSource::Concept(ConceptKind::Luminosity, name)),
		"PRECOMPUTED" => map.get("recordID").and_then(record_id).map(SignalSource::Record),
		other =>
			return Err(FilterParseError {
				path: format!("{path}.type"),
				message: format!("unsupported soft constraint type '{other}'."),
			}),
	};

	Ok(source.map(|source| SoftSignal { source, weight }))
}

fn record_id(raw: &Value) -> Option<RecordId> {
	raw.as_i64().or_else(|| raw.as_str()?.trim().parse().ok())
}
