use crate::vector;

/// Position of each vector along the axis from `start` to `end`: 0 at `start`, 1 at `end`.
///
/// Returns `None` when the anchors coincide or their dimensions disagree with a vector.
pub fn axis_positions<V>(vectors: &[V], start: &[f32], end: &[f32]) -> Option<Vec<f32>>
where
	V: AsRef<[f32]>,
{
	if start.len() != end.len() {
		return None;
	}

	let axis = vector::sub(end, start);
	let axis_len_sq = vector::dot(&axis, &axis);

	if !axis_len_sq.is_finite() || axis_len_sq <= f32::EPSILON {
		return None;
	}

	vectors
		.iter()
		.map(|vec| {
			let vec = vec.as_ref();

			if vec.len() != axis.len() {
				return None;
			}

			Some(vector::dot(&vector::sub(vec, start), &axis) / axis_len_sq)
		})
		.collect()
}
