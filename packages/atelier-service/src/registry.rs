use std::collections::BTreeMap;

use serde::Serialize;

use atelier_storage::models::ModelRow;

use crate::{Error, RecordStore, Result};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ModelInfo {
	pub model_id: i32,
	pub model_name: String,
	pub dimension: usize,
	pub description: Option<String>,
}

/// Embedding models known to the store. Loaded once at startup and read-only afterwards.
#[derive(Clone, Debug, Default)]
pub struct ModelRegistry {
	models: BTreeMap<String, ModelInfo>,
}
impl ModelRegistry {
	pub fn new(rows: Vec<ModelRow>) -> Self {
		let models = rows
			.into_iter()
			.map(|row| {
				let info = ModelInfo {
					model_id: row.model_id,
					model_name: row.model_name.clone(),
					dimension: row.dimension.max(0) as usize,
					description: row.description,
				};

				(row.model_name, info)
			})
			.collect();

		Self { models }
	}

	pub async fn load(store: &dyn RecordStore) -> Result<Self> {
		let registry = Self::new(store.models().await?);

		tracing::info!(models = registry.models.len(), "Model registry loaded.");

		Ok(registry)
	}

	pub fn resolve(&self, model_name: &str) -> Result<&ModelInfo> {
		self.models.get(model_name.trim()).ok_or_else(|| Error::InvalidRequest {
			message: format!("Unknown model {model_name:?}."),
		})
	}

	pub fn models(&self) -> impl Iterator<Item = &ModelInfo> {
		self.models.values()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn unknown_models_are_invalid_requests() {
		let registry = ModelRegistry::new(vec![ModelRow {
			model_id: 3,
			model_name: "march_finetuned".to_string(),
			dimension: 512,
			description: None,
		}]);

		assert_eq!(registry.resolve(" march_finetuned").expect("model expected").model_id, 3);
		assert!(matches!(registry.resolve("clip"), Err(Error::InvalidRequest { .. })));
	}
}
