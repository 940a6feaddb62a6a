//! Linode API handle.
//!
//! Unique responsibility: own the transport every operation goes through.
//!
//! A [`LinodeApi`] is built once (from [`LinodeSettings`] or from any
//! [`Transport`]) and passed explicitly to every finder, saver and resource
//! action. It is immutable and cheap to clone.

use std::sync::Arc;

use serde_json::Value;

use crate::{
    linode_error::LinodeError,
    linode_model::Resource,
    linode_settings::LinodeSettings,
    linode_transport::{Action, HttpTransport, Params, Payload, Transport},
};

/// Handle to the Linode API.
#[derive(Clone)]
pub struct LinodeApi {
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for LinodeApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinodeApi").finish_non_exhaustive()
    }
}

impl LinodeApi {
    /// Create a handle talking HTTP to the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(settings: LinodeSettings) -> Result<Self, LinodeError> {
        Ok(Self::with_transport(HttpTransport::new(settings)?))
    }

    /// Create a handle over an arbitrary transport.
    #[must_use]
    pub fn with_transport<T: Transport + 'static>(transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }

    /// Execute an action and return its raw `DATA`.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub async fn call(&self, action: Action, params: &Params) -> Result<Value, LinodeError> {
        self.transport.call(action, params).await
    }

    /// Execute a list action and return its payloads in server order.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or `DATA` is not a list of objects.
    pub async fn list(&self, action: Action, params: &Params) -> Result<Vec<Payload>, LinodeError> {
        match self.call(action, params).await? {
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Object(map) => Ok(map),
                    other => Err(LinodeError::Json(format!(
                        "{action} returned a non-object entry: {other}"
                    ))),
                })
                .collect(),
            Value::Null => Ok(Vec::new()),
            other => Err(LinodeError::Json(format!(
                "{action} returned {other} where a list was expected"
            ))),
        }
    }

    /// Execute an action whose `DATA` is a single object.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or `DATA` is not an object.
    pub async fn object(&self, action: Action, params: &Params) -> Result<Payload, LinodeError> {
        match self.call(action, params).await? {
            Value::Object(map) => Ok(map),
            Value::Null => Err(LinodeError::EmptyResponse),
            other => Err(LinodeError::Json(format!(
                "{action} returned {other} where an object was expected"
            ))),
        }
    }

    /// Execute a create-style action and read the id of the new `R` from `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or the id is missing.
    pub async fn created_id<R: Resource>(
        &self,
        action: Action,
        params: &Params,
        key: &'static str,
    ) -> Result<i64, LinodeError> {
        let data = self.object(action, params).await?;
        id_field(&data, R::NAME, key)
    }
}

/// Read an integer id out of a response object.
pub(crate) fn id_field(data: &Payload, entity: &'static str, key: &str) -> Result<i64, LinodeError> {
    let raw = data.get(key).ok_or_else(|| LinodeError::MissingField {
        entity,
        field: key.to_string(),
    })?;
    match raw {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .ok_or_else(|| LinodeError::InvalidField {
        entity,
        field: key.to_string(),
        reason: format!("{raw} is not an id"),
    })
}
