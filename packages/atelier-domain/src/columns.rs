use serde::Serialize;

use crate::constraint::Operator;

const TEXT_OPS: &[Operator] = &[Operator::Equal, Operator::Includes];
const INT_OPS: &[Operator] = &[Operator::Equal, Operator::Between, Operator::Includes];
const NUMERIC_OPS: &[Operator] = &[Operator::Equal, Operator::Between];

/// Every column a filter may reference. The compiler derives operator support and SQL shape from
/// this table alone.
pub const COLUMNS: &[ColumnDescriptor] = &[
	ColumnDescriptor::scalar("recordID", "a.record_id", ValueType::Int, INT_OPS),
	ColumnDescriptor::scalar("workID", "a.work_id", ValueType::Text, TEXT_OPS),
	ColumnDescriptor::scalar("language", "a.language", ValueType::Text, TEXT_OPS),
	ColumnDescriptor::scalar("title", "a.title", ValueType::Text, TEXT_OPS),
	ColumnDescriptor::list("objectWorkType", "a.object_work_type"),
	ColumnDescriptor::scalar("termClassification", "a.term_classification", ValueType::Text, TEXT_OPS),
	ColumnDescriptor::list("materials", "a.materials"),
	ColumnDescriptor::scalar(
		"signatureFullDescription",
		"a.signature_full_description",
		ValueType::Text,
		TEXT_OPS,
	),
	ColumnDescriptor::scalar(
		"creationFullDescription",
		"a.creation_full_description",
		ValueType::Text,
		TEXT_OPS,
	),
	ColumnDescriptor::scalar(
		"creationEarliestDate",
		"a.creation_earliest_date",
		ValueType::Int,
		INT_OPS,
	),
	ColumnDescriptor::scalar("creationLatestDate", "a.creation_latest_date", ValueType::Int, INT_OPS),
	ColumnDescriptor::scalar(
		"creatorFullDescription",
		"a.creator_full_description",
		ValueType::Text,
		TEXT_OPS,
	),
	ColumnDescriptor::scalar(
		"physicalAppearanceDescription",
		"a.physical_appearance_description",
		ValueType::Text,
		TEXT_OPS,
	),
	ColumnDescriptor::scalar("imageType", "a.image_type", ValueType::Text, TEXT_OPS),
	ColumnDescriptor::scalar("imageColor", "a.image_color", ValueType::Text, TEXT_OPS),
	ColumnDescriptor::scalar("imageCopyright", "a.image_copyright", ValueType::Text, TEXT_OPS),
	ColumnDescriptor::list("formalDescriptionTermStylesPeriods", "a.styles_periods"),
	ColumnDescriptor::list("iconographicTerms", "a.iconographic_terms").with_alias("IFT_values"),
	ColumnDescriptor::scalar("height", "a.height", ValueType::Numeric, NUMERIC_OPS),
	ColumnDescriptor::scalar("width", "a.width", ValueType::Numeric, NUMERIC_OPS),
	ColumnDescriptor::scalar("ratio", "a.ratio", ValueType::Numeric, NUMERIC_OPS),
	ColumnDescriptor::scalar("creatorFirstName", "ar.first_name", ValueType::Text, TEXT_OPS),
	ColumnDescriptor::scalar("creatorLastName", "ar.last_name", ValueType::Text, TEXT_OPS),
	ColumnDescriptor::scalar("creatorNationality", "ar.nationality", ValueType::Text, TEXT_OPS),
	ColumnDescriptor::scalar("creatorBirthDate", "ar.birth_date", ValueType::Int, INT_OPS),
	ColumnDescriptor::scalar("creatorDeathDate", "ar.death_date", ValueType::Int, INT_OPS),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueShape {
	Scalar,
	List,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
	Int,
	Text,
	Numeric,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct ColumnDescriptor {
	pub key: &'static str,
	#[serde(skip)]
	pub alias: Option<&'static str>,
	#[serde(skip)]
	pub location: &'static str,
	pub shape: ValueShape,
	pub value_type: ValueType,
	pub operators: &'static [Operator],
}
impl ColumnDescriptor {
	const fn scalar(
		key: &'static str,
		location: &'static str,
		value_type: ValueType,
		operators: &'static [Operator],
	) -> Self {
		Self { key, alias: None, location, shape: ValueShape::Scalar, value_type, operators }
	}

	const fn list(key: &'static str, location: &'static str) -> Self {
		Self {
			key,
			alias: None,
			location,
			shape: ValueShape::List,
			value_type: ValueType::Text,
			operators: TEXT_OPS,
		}
	}

	const fn with_alias(self, alias: &'static str) -> Self {
		Self { alias: Some(alias), ..self }
	}

	pub fn supports(&self, operator: Operator) -> bool {
		self.operators.contains(&operator)
	}

	pub fn is_list(&self) -> bool {
		self.shape == ValueShape::List
	}

	/// Case folding only applies to text columns.
	pub fn is_textual(&self) -> bool {
		self.value_type == ValueType::Text
	}
}

pub fn lookup(key: &str) -> Option<&'static ColumnDescriptor> {
	COLUMNS.iter().find(|column| column.key == key || column.alias == Some(key))
}
