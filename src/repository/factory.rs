use crate::error::Result;
use crate::repository::{BitbucketClient, ClientSettings, RemoteRepository, RepositoryRef};
use std::sync::Arc;

pub struct RepositoryFactory;

impl RepositoryFactory {
    pub fn create_bitbucket(
        settings: &ClientSettings,
        token: String,
        repository: RepositoryRef,
    ) -> Result<Arc<dyn RemoteRepository>> {
        let client = BitbucketClient::new(settings, token, repository)?;
        let target = client.repository();
        log::debug!(
            "Using {} for {}/{} (timeout {:?})",
            settings.api_url,
            target.workspace,
            target.slug,
            settings.timeout
        );
        Ok(Arc::new(client))
    }
}
