use serde::Serialize;

use crate::vector;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RankingMode {
	/// Linear weights.
	Classic,
	/// Signed squared weights, so strong signals dominate.
	Power,
	/// Linear weights plus relevance feedback from the neighbours of reference records.
	Rocchio,
}
impl RankingMode {
	pub const ALL: [Self; 3] = [Self::Classic, Self::Power, Self::Rocchio];

	pub fn parse(raw: &str) -> Option<Self> {
		match raw.trim().to_ascii_lowercase().as_str() {
			"classic" => Some(Self::Classic),
			"power" => Some(Self::Power),
			"rocchio" => Some(Self::Rocchio),
			_ => None,
		}
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Classic => "classic",
			Self::Power => "power",
			Self::Rocchio => "rocchio",
		}
	}

	pub fn scale(&self, weight: f32) -> f32 {
		match self {
			Self::Classic | Self::Rocchio => weight,
			Self::Power => weight.signum() * weight * weight,
		}
	}
}

/// Weight of one Rocchio neighbour. `distance` is the negative inner product reported by the
/// store, so similarity is its negation; dissimilar neighbours contribute nothing.
pub fn rocchio_weight(scale: f32, weight: f32, distance: f32) -> f32 {
	let similarity = (-distance).max(0.0);

	scale * weight * similarity * similarity
}

#[derive(Debug, PartialEq, Eq)]
pub enum CombineError {
	DimensionMismatch { expected: usize, found: usize },
	ZeroLength,
}

/// Sums mode-scaled vectors and normalizes the result. `Ok(None)` means there was nothing to
/// combine.
pub fn combine(
	weighted: &[(Vec<f32>, f32)],
	mode: RankingMode,
) -> Result<Option<Vec<f32>>, CombineError> {
	let Some((first, _)) = weighted.first() else {
		return Ok(None);
	};
	let dim = first.len();
	let mut acc = vec![0.0_f32; dim];

	for (vec, weight) in weighted {
		if vec.len() != dim {
			return Err(CombineError::DimensionMismatch { expected: dim, found: vec.len() });
		}

		vector::add_scaled(&mut acc, vec, mode.scale(*weight));
	}

	vector::normalize(&acc).map(Some).ok_or(CombineError::ZeroLength)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn power_mode_squares_and_keeps_sign() {
		assert_eq!(RankingMode::Power.scale(-2.0), -4.0);
		assert_eq!(RankingMode::Power.scale(0.5), 0.25);
		assert_eq!(RankingMode::Classic.scale(-2.0), -2.0);
	}

	#[test]
	fn negative_power_signal_points_away() {
		let combined = combine(&[(vec![0.0, 2.0], -3.0)], RankingMode::Power)
			.expect("combine failed")
			.expect("vector expected");

		assert_eq!(combined, vec![0.0, -1.0]);
	}

	#[test]
	fn opposing_signals_are_degenerate() {
		let err = combine(&[(vec![1.0, 0.0], 1.0), (vec![1.0, 0.0], -1.0)], RankingMode::Classic)
			.expect_err("expected zero length");

		assert_eq!(err, CombineError::ZeroLength);
	}

	#[test]
	fn mixed_dimensions_are_rejected() {
		let err = combine(&[(vec![1.0, 0.0], 1.0), (vec![1.0], 1.0)], RankingMode::Classic)
			.expect_err("expected mismatch");

		assert_eq!(err, CombineError::DimensionMismatch { expected: 2, found: 1 });
	}

	#[test]
	fn rocchio_weight_ignores_dissimilar_neighbours() {
		assert_eq!(rocchio_weight(1.0, 1.0, 0.5), 0.0);
		assert_eq!(rocchio_weight(2.0, 0.5, -0.5), 0.25);
	}

	#[test]
	fn modes_parse_case_insensitively() {
		assert_eq!(RankingMode::parse(" Rocchio"), Some(RankingMode::Rocchio));
		assert_eq!(RankingMode::parse("linear"), None);
	}
}
