//! Saving, deleting and creating resources.
//!
//! Unique responsibility: push local entity state to the API.
//!
//! Creation parameters differ per resource, so each resource module builds
//! its own create call and hands it to [`LinodeApi::create_then_fetch`]. The
//! API only returns the new id, so the entity is fetched right after. If that
//! fetch fails the error propagates even though the resource now exists.

use crate::{
    linode_client::LinodeApi,
    linode_error::LinodeError,
    linode_model::{Entity, Resource},
    linode_transport::{Action, Params},
};

impl LinodeApi {
    /// Write every savable attribute of `entity` to the API.
    ///
    /// # Errors
    ///
    /// Returns [`LinodeError::Unsupported`] if the resource cannot be updated,
    /// or the error of the update call.
    pub async fn save<R: Resource>(&self, entity: &Entity<R>) -> Result<(), LinodeError> {
        let action = R::UPDATE.ok_or(LinodeError::Unsupported {
            entity: R::NAME,
            operation: "saved",
        })?;
        let params = entity.to_wire_update_params()?;
        self.call(action, &params).await?;

        tracing::info!(resource = R::NAME, id = ?entity.get("api_id"), "saved resource");
        Ok(())
    }

    /// Delete the remote resource behind `entity`.
    ///
    /// The local entity is left as it was.
    ///
    /// # Errors
    ///
    /// Returns [`LinodeError::Unsupported`] if the resource cannot be deleted,
    /// or the error of the delete call.
    pub async fn destroy<R: Resource>(&self, entity: &Entity<R>) -> Result<(), LinodeError> {
        let action = R::DELETE.ok_or(LinodeError::Unsupported {
            entity: R::NAME,
            operation: "deleted",
        })?;
        let id = entity.api_id()?;

        let mut params = Params::new();
        if let (Some(scope), Some(parent_id)) = (R::SCOPE, entity.parent_id()?) {
            params.insert(scope.param.to_string(), parent_id.into());
        }
        params.insert(R::ID_PARAM.to_string(), id.into());
        self.call(action, &params).await?;

        tracing::info!(resource = R::NAME, id, "deleted resource");
        Ok(())
    }

    /// Run a create action, then fetch the new entity by the id it returned.
    ///
    /// # Errors
    ///
    /// Returns the error of either call.
    pub async fn create_then_fetch<R: Resource>(
        &self,
        action: Action,
        params: &Params,
        id_key: &'static str,
        parent_id: Option<i64>,
    ) -> Result<Entity<R>, LinodeError> {
        let id = self.created_id::<R>(action, params, id_key).await?;
        tracing::info!(resource = R::NAME, id, ?parent_id, "created resource");
        self.fetch::<R>(parent_id, id).await
    }
}

/// Reject a required id left at zero before any call is made.
pub(crate) const fn require_id(operation: Action, param: &'static str, id: i64) -> Result<i64, LinodeError> {
    if id > 0 {
        Ok(id)
    } else {
        Err(LinodeError::MissingParameter {
            operation: operation.as_str(),
            param,
        })
    }
}

/// Reject required text left blank before any call is made.
pub(crate) fn require_text(operation: Action, param: &'static str, text: &str) -> Result<(), LinodeError> {
    if text.trim().is_empty() {
        return Err(LinodeError::MissingParameter {
            operation: operation.as_str(),
            param,
        });
    }
    Ok(())
}
