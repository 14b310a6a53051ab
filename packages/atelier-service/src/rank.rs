use atelier_domain::{RecordId, predicate::Predicate};
use atelier_storage::queries::RankedIdsQuery;

use crate::{Error, MAX_PAGE_SIZE, MIN_PAGE, MIN_PAGE_SIZE, RecordStore, Result, registry::ModelInfo};

/// A clamped page request. Pages are 1-based.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Page {
	pub page: u32,
	pub page_size: u32,
}
impl Page {
	pub fn clamped(page: i64, page_size: i64) -> Self {
		let page = page.clamp(i64::from(MIN_PAGE), i64::from(u32::MAX)) as u32;
		let page_size =
			page_size.clamp(i64::from(MIN_PAGE_SIZE), i64::from(MAX_PAGE_SIZE)) as u32;

		Self { page, page_size }
	}

	pub fn offset(&self) -> i64 {
		i64::from(self.page - 1) * i64::from(self.page_size)
	}

	pub fn limit(&self) -> i64 {
		i64::from(self.page_size)
	}
}

pub struct HybridRanker<'a> {
	pub store: &'a dyn RecordStore,
}
impl HybridRanker<'_> {
	/// Ids matching `predicate`, closest to `query_vector` first when one is given and in record id
	/// order otherwise. Only records embedded under `model` are candidates.
	pub async fn rank(
		&self,
		model: &ModelInfo,
		predicate: &Predicate,
		query_vector: Option<&[f32]>,
		page: Page,
	) -> Result<Vec<RecordId>> {
		if let Some(vec) = query_vector
			&& vec.len() != model.dimension
		{
			return Err(Error::InvalidRequest {
				message: format!(
					"Query vector dimension {} does not match model {} ({}).",
					vec.len(),
					model.model_name,
					model.dimension
				),
			});
		}

		let query = RankedIdsQuery {
			predicate,
			model_id: model.model_id,
			vector: query_vector,
			exclude: &[],
			limit: page.limit(),
			offset: page.offset(),
		};

		self.store.ranked_ids(&query).await
	}

	/// Records closest to `record_id`. The record itself is left out unless `keep_original` is set.
	pub async fn similar(
		&self,
		model: &ModelInfo,
		record_id: RecordId,
		page: Page,
		keep_original: bool,
	) -> Result<Vec<RecordId>> {
		let Some(vec) = self.store.embedding_of(model.model_id, record_id).await? else {
			return Err(Error::NotFound {
				message: format!(
					"Record {record_id} has no embedding under model {}.",
					model.model_name
				),
			});
		};
		let exclude = if keep_original { Vec::new() } else { vec![record_id] };
		let predicate = Predicate::always();
		let query = RankedIdsQuery {
			predicate: &predicate,
			model_id: model.model_id,
			vector: Some(&vec),
			exclude: &exclude,
			limit: page.limit(),
			offset: page.offset(),
		};

		self.store.ranked_ids(&query).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn pages_are_clamped_into_bounds() {
		assert_eq!(Page::clamped(0, 0), Page { page: 1, page_size: 1 });
		assert_eq!(Page::clamped(-4, 1_000), Page { page: 1, page_size: 100 });
		assert_eq!(Page::clamped(3, 20).offset(), 40);
	}
}
