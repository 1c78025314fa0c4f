use std::sync::Arc;

use crate::auth::IdentityClient;
use crate::config::Config;
use crate::db::Repository;
use crate::error::Result;
use crate::feed::{FeedSelector, InteractionTracker, RandomPolicy};
use crate::stats::StatsService;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub repository: Repository,
    pub identity: Arc<IdentityClient>,
    pub feed: FeedSelector,
    pub tracker: InteractionTracker,
    pub stats: StatsService,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Self> {
        let repository = Repository::new(&config.db_path).await?;
        let identity = Arc::new(IdentityClient::new(
            config.identity_url.clone(),
            config.identity_anon_key.clone(),
        ));

        let stats = StatsService::new(repository.clone());
        let feed = FeedSelector::new(repository.clone(), stats.clone(), Arc::new(RandomPolicy));
        let tracker = InteractionTracker::new(repository.clone(), stats.clone());

        Ok(Self {
            config: Arc::new(config),
            repository,
            identity,
            feed,
            tracker,
            stats,
        })
    }
}
