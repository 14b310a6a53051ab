pub fn dot(lhs: &[f32], rhs: &[f32]) -> f32 {
	lhs.iter().zip(rhs).map(|(l, r)| l * r).sum()
}

pub fn norm(vec: &[f32]) -> f32 {
	dot(vec, vec).sqrt()
}

/// Unit vector in the direction of `vec`, or `None` when it has no direction.
pub fn normalize(vec: &[f32]) -> Option<Vec<f32>> {
	let length = norm(vec);

	if !length.is_finite() || length <= f32::EPSILON {
		return None;
	}

	Some(vec.iter().map(|value| value / length).collect())
}

pub fn cosine_similarity(lhs: &[f32], rhs: &[f32]) -> Option<f32> {
	if lhs.is_empty() || lhs.len() != rhs.len() {
		return None;
	}

	let mut dot = 0.0_f32;
	let mut lhs_norm = 0.0_f32;
	let mut rhs_norm = 0.0_f32;

	for (l, r) in lhs.iter().zip(rhs.iter()) {
		dot += l * r;
		lhs_norm += l * l;
		rhs_norm += r * r;
	}

	if lhs_norm <= f32::EPSILON || rhs_norm <= f32::EPSILON {
		return None;
	}

	Some((dot / (lhs_norm.sqrt() * rhs_norm.sqrt())).clamp(-1.0, 1.0))
}

pub fn midpoint(lhs: &[f32], rhs: &[f32]) -> Vec<f32> {
	lhs.iter().zip(rhs).map(|(l, r)| (l + r) * 0.5).collect()
}

pub fn sub(lhs: &[f32], rhs: &[f32]) -> Vec<f32> {
	lhs.iter().zip(rhs).map(|(l, r)| l - r).collect()
}

/// `acc += scale * vec`.
pub fn add_scaled(acc: &mut [f32], vec: &[f32], scale: f32) {
	for (slot, value) in acc.iter_mut().zip(vec) {
		*slot += scale * value;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn normalize_rejects_zero_vectors() {
		assert_eq!(normalize(&[0.0, 0.0]), None);
		assert_eq!(normalize(&[3.0, 4.0]), Some(vec![0.6, 0.8]));
	}

	#[test]
	fn cosine_similarity_requires_matching_dimensions() {
		assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0]), None);
		assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 0.0]), None);
		assert_eq!(cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]), Some(1.0));
	}

	#[test]
	fn add_scaled_accumulates() {
		let mut acc = vec![1.0, 1.0];

		add_scaled(&mut acc, &[2.0, -2.0], 0.5);

		assert_eq!(acc, vec![2.0, 0.0]);
		assert_eq!(midpoint(&[0.0, 2.0], &[2.0, 0.0]), vec![1.0, 1.0]);
	}
}
