//! Approximate shortest open path through a set of embeddings.

use crate::vector;

/// Number of start vertices tried by the greedy construction.
pub const GREEDY_STARTS: usize = 8;

const IMPROVEMENT_EPSILON: f32 = 1e-6;

/// Symmetric edge weights `2 - cos(a, b)` with a zero diagonal. Pairs without a defined cosine
/// weigh 2.
pub struct DistanceMatrix {
	size: usize,
	weights: Vec<f32>,
}
impl DistanceMatrix {
	pub fn from_vectors<V>(vectors: &[V]) -> Self
	where
		V: AsRef<[f32]>,
	{
		let size = vectors.len();
		let mut weights = vec![0.0; size * size];

		for i in 0..size {
			for j in (i + 1)..size {
				let similarity =
					vector::cosine_similarity(vectors[i].as_ref(), vectors[j].as_ref())
						.unwrap_or(0.0);
				let weight = 2.0 - similarity;

				weights[i * size + j] = weight;
				weights[j * size + i] = weight;
			}
		}

		Self { size, weights }
	}

	pub fn len(&self) -> usize {
		self.size
	}

	pub fn is_empty(&self) -> bool {
		self.size == 0
	}

	pub fn weight(&self, from: usize, to: usize) -> f32 {
		self.weights[from * self.size + to]
	}

	pub fn path_cost(&self, path: &[usize]) -> f32 {
		path.windows(2).map(|pair| self.weight(pair[0], pair[1])).sum()
	}
}

/// Visiting order over indices `0..matrix.len()`.
///
/// A nearest-neighbour path is built from each of the first [`GREEDY_STARTS`] vertices and the
/// cheapest one is kept (ties go to the lowest start and the lowest next index). The winner is then
/// refined with 2-opt segment reversals for at most `max_passes` sweeps, each quadratic in `n`.
pub fn shortest_open_path(matrix: &DistanceMatrix, max_passes: u32) -> Vec<usize> {
	let n = matrix.len();

	if n <= 2 {
		return (0..n).collect();
	}

	let mut best: Option<(f32, Vec<usize>)> = None;

	for start in 0..n.min(GREEDY_STARTS) {
		let path = nearest_neighbour_path(matrix, start);
		let cost = matrix.path_cost(&path);

		if best.as_ref().is_none_or(|(best_cost, _)| cost < *best_cost) {
			best = Some((cost, path));
		}
	}

	let mut path = best.map(|(_, path)| path).unwrap_or_default();

	two_opt(matrix, &mut path, max_passes);

	path
}

fn nearest_neighbour_path(matrix: &DistanceMatrix, start: usize) -> Vec<usize> {
	let n = matrix.len();
	let mut visited = vec![false; n];
	let mut path = Vec::with_capacity(n);
	let mut current = start;

	visited[start] = true;
	path.push(start);

	while path.len() < n {
		let mut next: Option<(usize, f32)> = None;

		for candidate in (0..n).filter(|&candidate| !visited[candidate]) {
			let weight = matrix.weight(current, candidate);

			if next.is_none_or(|(_, best)| weight < best) {
				next = Some((candidate, weight));
			}
		}

		let Some((candidate, _)) = next else {
			break;
		};

		visited[candidate] = true;
		path.push(candidate);
		current = candidate;
	}

	path
}

fn two_opt(matrix: &DistanceMatrix, path: &mut [usize], max_passes: u32) {
	let n = path.len();

	for _ in 0..max_passes {
		let mut improved = false;

		for i in 0..n - 1 {
			for k in (i + 1)..n {
				let mut delta = 0.0;

				if i > 0 {
					delta += matrix.weight(path[i - 1], path[k]) - matrix.weight(path[i - 1], path[i]);
				}
				if k + 1 < n {
					delta += matrix.weight(path[i], path[k + 1]) - matrix.weight(path[k], path[k + 1]);
				}
				if delta < -IMPROVEMENT_EPSILON {
					path[i..=k].reverse();

					improved = true;
				}
			}
		}

		if !improved {
			break;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn on_circle(angles: &[f32]) -> Vec<Vec<f32>> {
		angles.iter().map(|angle| vec![angle.to_radians().cos(), angle.to_radians().sin()]).collect()
	}

	#[test]
	fn trivial_sets_keep_their_order() {
		let matrix = DistanceMatrix::from_vectors(&on_circle(&[0.0, 90.0]));

		assert_eq!(shortest_open_path(&matrix, 8), vec![0, 1]);
		assert!(shortest_open_path(&DistanceMatrix::from_vectors::<Vec<f32>>(&[]), 8).is_empty());
	}

	#[test]
	fn points_on_an_arc_are_visited_in_angular_order() {
		let vectors = on_circle(&[60.0, 0.0, 120.0, 20.0, 90.0]);
		let matrix = DistanceMatrix::from_vectors(&vectors);
		let path = shortest_open_path(&matrix, 16);

		assert!(path == vec![1, 3, 0, 4, 2] || path == vec![2, 4, 0, 3, 1], "got {path:?}");
	}

	#[test]
	fn large_sets_visit_every_vertex_once() {
		let angles = (0..GREEDY_STARTS * 5).map(|i| (i * 37 % 180) as f32).collect::<Vec<_>>();
		let matrix = DistanceMatrix::from_vectors(&on_circle(&angles));
		let mut path = shortest_open_path(&matrix, 4);

		path.sort_unstable();

		assert_eq!(path, (0..angles.len()).collect::<Vec<_>>());
	}

	#[test]
	fn ordering_is_deterministic() {
		let vectors = on_circle(&[10.0, 170.0, 45.0, 100.0, 135.0, 80.0]);
		let matrix = DistanceMatrix::from_vectors(&vectors);

		assert_eq!(shortest_open_path(&matrix, 16), shortest_open_path(&matrix, 16));
	}

	#[test]
	fn two_opt_never_worsens_the_greedy_path() {
		let vectors: Vec<Vec<f32>> = (0..9)
			.map(|i| {
				let x = i as f32;

				vec![(x * 1.7).sin(), (x * 0.9).cos(), (x * 2.3).sin() * 0.5]
			})
			.collect();
		let matrix = DistanceMatrix::from_vectors(&vectors);
		let greedy = (0..matrix.len().min(GREEDY_STARTS))
			.map(|start| matrix.path_cost(&nearest_neighbour_path(&matrix, start)))
			.fold(f32::INFINITY, f32::min);
		let refined = matrix.path_cost(&shortest_open_path(&matrix, 32));

		assert!(refined <= greedy + IMPROVEMENT_EPSILON);
	}
}
