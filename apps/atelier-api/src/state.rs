use std::sync::Arc;

use atelier_service::AtelierService;
use atelier_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<AtelierService>,
}
impl AppState {
	pub async fn new(config: atelier_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		let service = AtelierService::new(config, db).await?;

		Ok(Self::from_service(service))
	}

	pub fn from_service(service: AtelierService) -> Self {
		Self { service: Arc::new(service) }
	}
}
