use crate::api::ApiClient;
use crate::app_store::AppStore;
use crate::circles::CirclesStore;
use crate::cognitive::CognitiveStore;
use crate::config::Config;
use crate::fasting::FastingStore;
use crate::offline::OfflineQueue;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub api: ApiClient,
    pub fasting: Arc<FastingStore>,
    pub app: Arc<AppStore>,
    pub circles: Arc<CirclesStore>,
    pub cognitive: Arc<CognitiveStore>,
    pub queue: Arc<OfflineQueue>,
}

impl AppState {
    pub async fn new(config: Config) -> Self {
        let queue = OfflineQueue::load(config.data_path.clone()).await;
        Self {
            api: ApiClient::new(&config),
            config: Arc::new(config),
            fasting: Arc::new(FastingStore::default()),
            app: Arc::new(AppStore::default()),
            circles: Arc::new(CirclesStore::default()),
            cognitive: Arc::new(CognitiveStore::default()),
            queue: Arc::new(queue),
        }
    }
}
