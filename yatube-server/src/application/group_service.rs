use std::sync::Arc;

use tracing::info;

use crate::data::group_repository::{GroupRepository, NewGroup};
use crate::domain::error::DomainError;
use crate::domain::group::{Group, NewGroupRequest};

/// Group administration; groups are not managed through the web pages.
pub(crate) struct GroupService {
    repo: Arc<dyn GroupRepository>,
}

impl GroupService {
    pub(crate) fn new(repo: Arc<dyn GroupRepository>) -> Self {
        Self { repo }
    }

    pub(crate) async fn create_group(&self, req: NewGroupRequest) -> Result<Group, DomainError> {
        let req = req.validate()?;
        let group = self
            .repo
            .create_group(NewGroup {
                title: req.title,
                slug: req.slug,
                description: req.description.unwrap_or_default(),
            })
            .await?;
        info!(group_id = group.id, slug = %group.slug, "group created");
        Ok(group)
    }

    pub(crate) async fn delete_group(&self, slug: &str) -> Result<(), DomainError> {
        if !self.repo.delete_by_slug(slug.trim()).await? {
            return Err(DomainError::not_found(format_args!("group slug: {slug}")));
        }
        info!(slug, "group deleted");
        Ok(())
    }

    pub(crate) async fn list_groups(&self) -> Result<Vec<Group>, DomainError> {
        self.repo.list_groups().await
    }
}
