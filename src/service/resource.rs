//! CRUD state machine: identity preconditions, existence checks, merge
//! overlay. Runs before any write reaches the store.

use crate::entity::{EntityRecord, MergePatch};
use crate::error::AppError;
use crate::page::Pageable;
use crate::repository::{EntityRepository, EntityStream};
use crate::schema::EntitySchema;
use futures::TryStreamExt;
use std::sync::Arc;

/// Per-entity CRUD front. Validates the identity invariants for each request
/// and translates repository outcomes into success, not-found, or
/// bad-request results.
///
/// The existence check and the following write are not isolated: two
/// concurrent replaces of the same identity may interleave and the last
/// write to complete wins.
pub struct CrudResource<R> {
    schema: Arc<EntitySchema>,
    repo: R,
}

impl<R: EntityRepository> CrudResource<R> {
    pub fn new(schema: Arc<EntitySchema>, repo: R) -> Self {
        Self { schema, repo }
    }

    pub fn schema(&self) -> &Arc<EntitySchema> {
        &self.schema
    }

    /// `UNPERSISTED -> PERSISTED`. A candidate that already carries an
    /// identity is rejected before any statement runs.
    pub async fn create(&self, candidate: EntityRecord) -> Result<EntityRecord, AppError> {
        if candidate.id.is_some() {
            return Err(AppError::BadRequest(format!(
                "a new {} cannot already have an id",
                self.schema.name()
            )));
        }
        self.repo
            .save(&candidate)
            .await?
            .ok_or(AppError::Db(sqlx::Error::RowNotFound))
    }

    /// Full replace. The body identity must be present and agree with the
    /// path; the row must exist before the write.
    pub async fn replace(
        &self,
        path_id: i64,
        candidate: EntityRecord,
    ) -> Result<EntityRecord, AppError> {
        self.check_ids(path_id, candidate.id)?;
        if !self.repo.exists_by_id(path_id).await? {
            return Err(self.not_found(path_id));
        }
        self.repo
            .save(&candidate)
            .await?
            .ok_or_else(|| self.not_found(path_id))
    }

    /// Merge-patch. Fields present and non-null in the patch overlay the
    /// stored record; everything else is untouched.
    pub async fn partial_update(
        &self,
        path_id: i64,
        patch: MergePatch,
    ) -> Result<EntityRecord, AppError> {
        self.check_ids(path_id, patch.id)?;
        if !self.repo.exists_by_id(path_id).await? {
            return Err(self.not_found(path_id));
        }
        let stored = self
            .repo
            .find_by_id(path_id)
            .await?
            .ok_or_else(|| self.not_found(path_id))?;
        let merged = patch.apply_to(&stored);
        self.repo
            .save(&merged)
            .await?
            .ok_or_else(|| self.not_found(path_id))
    }

    pub async fn get_one(&self, id: i64) -> Result<EntityRecord, AppError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| self.not_found(id))
    }

    /// Buffered listing; same logical set as [`Self::get_all_streaming`].
    pub async fn get_all(
        &self,
        pageable: Option<&Pageable>,
    ) -> Result<Vec<EntityRecord>, AppError> {
        self.repo.find_all(pageable).try_collect().await
    }

    /// Incremental listing; records are emitted as the consumer pulls them.
    pub fn get_all_streaming(&self, pageable: Option<&Pageable>) -> EntityStream {
        self.repo.find_all(pageable)
    }

    /// Idempotent: deleting an unknown identity is a success.
    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        self.repo.delete_by_id(id).await
    }

    fn check_ids(&self, path_id: i64, body_id: Option<i64>) -> Result<(), AppError> {
        let body_id = body_id.ok_or_else(|| {
            AppError::BadRequest(format!("{} body carries no id", self.schema.name()))
        })?;
        if body_id != path_id {
            return Err(AppError::BadRequest(format!(
                "body id {body_id} does not match path id {path_id}"
            )));
        }
        Ok(())
    }

    fn not_found(&self, id: i64) -> AppError {
        AppError::NotFound(format!("{} {id}", self.schema.name()))
    }
}
