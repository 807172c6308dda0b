use std::sync::Arc;
use object_store::ObjectStore;
use crate::{Config, Reconstructor, SummaryReader};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ObjectStore>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn ObjectStore>, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    pub fn reader(&self) -> SummaryReader {
        SummaryReader::new(Arc::clone(&self.store))
    }

    pub fn reconstructor(&self) -> Reconstructor {
        Reconstructor::new(self.config.reconstruction)
    }
}
