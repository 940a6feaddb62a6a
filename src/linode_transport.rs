//! Linode API transport.
//!
//! Unique responsibility: carry one API action and its parameters to the
//! Linode API and hand back the `DATA` part of the response.
//!
//! API endpoint:
//! - GET <https://api.linode.com/?api_key=...&api_action=linode.list&...>
//!
//! Responses are wrapped in an envelope:
//!
//! ```text
//! { "ERRORARRAY": [ { "ERRORCODE": 5, "ERRORMESSAGE": "..." } ],
//!   "ACTION": "linode.list",
//!   "DATA": [ ... ] }
//! ```
//!
//! A non-empty `ERRORARRAY` is surfaced as [`LinodeError::Remote`]. Requests
//! are never retried.

use std::{fmt, time::Duration};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::{
    linode_error::{ApiFault, LinodeError},
    linode_settings::LinodeSettings,
};

/// Ordered wire payload: one API object as returned by the service.
pub type Payload = Map<String, Value>;

/// Ordered call parameters.
pub type Params = Map<String, Value>;

/// Every API method this crate calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// `avail.datacenters`
    AvailDatacenters,
    /// `avail.kernels`
    AvailKernels,
    /// `avail.distributions`
    AvailDistributions,
    /// `avail.linodeplans`
    AvailLinodePlans,
    /// `linode.list`
    LinodeList,
    /// `linode.create`
    LinodeCreate,
    /// `linode.update`
    LinodeUpdate,
    /// `linode.delete`
    LinodeDelete,
    /// `linode.boot`
    LinodeBoot,
    /// `linode.reboot`
    LinodeReboot,
    /// `linode.shutdown`
    LinodeShutdown,
    /// `linode.clone`
    LinodeClone,
    /// `linode.resize`
    LinodeResize,
    /// `linode.disk.list`
    DiskList,
    /// `linode.disk.create`
    DiskCreate,
    /// `linode.disk.createfromdistribution`
    DiskCreateFromDistribution,
    /// `linode.disk.createfromstackscript`
    DiskCreateFromStackscript,
    /// `linode.disk.update`
    DiskUpdate,
    /// `linode.disk.delete`
    DiskDelete,
    /// `linode.config.list`
    ConfigList,
    /// `linode.config.create`
    ConfigCreate,
    /// `linode.config.update`
    ConfigUpdate,
    /// `linode.config.delete`
    ConfigDelete,
    /// `linode.ip.list`
    IpList,
    /// `linode.job.list`
    JobList,
    /// `domain.list`
    DomainList,
    /// `domain.create`
    DomainCreate,
    /// `domain.update`
    DomainUpdate,
    /// `domain.delete`
    DomainDelete,
    /// `domain.resource.list`
    DomainResourceList,
    /// `domain.resource.create`
    DomainResourceCreate,
    /// `domain.resource.update`
    DomainResourceUpdate,
    /// `domain.resource.delete`
    DomainResourceDelete,
    /// `nodebalancer.list`
    NodebalancerList,
    /// `nodebalancer.create`
    NodebalancerCreate,
    /// `nodebalancer.update`
    NodebalancerUpdate,
    /// `nodebalancer.delete`
    NodebalancerDelete,
    /// `nodebalancer.config.list`
    NodebalancerConfigList,
    /// `nodebalancer.config.create`
    NodebalancerConfigCreate,
    /// `nodebalancer.config.update`
    NodebalancerConfigUpdate,
    /// `nodebalancer.config.delete`
    NodebalancerConfigDelete,
    /// `nodebalancer.node.list`
    NodebalancerNodeList,
    /// `nodebalancer.node.create`
    NodebalancerNodeCreate,
    /// `nodebalancer.node.update`
    NodebalancerNodeUpdate,
    /// `nodebalancer.node.delete`
    NodebalancerNodeDelete,
    /// `stackscript.list`
    StackscriptList,
    /// `stackscript.create`
    StackscriptCreate,
    /// `stackscript.update`
    StackscriptUpdate,
    /// `stackscript.delete`
    StackscriptDelete,
}

impl Action {
    /// The `api_action` name sent on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AvailDatacenters => "avail.datacenters",
            Self::AvailKernels => "avail.kernels",
            Self::AvailDistributions => "avail.distributions",
            Self::AvailLinodePlans => "avail.linodeplans",
            Self::LinodeList => "linode.list",
            Self::LinodeCreate => "linode.create",
            Self::LinodeUpdate => "linode.update",
            Self::LinodeDelete => "linode.delete",
            Self::LinodeBoot => "linode.boot",
            Self::LinodeReboot => "linode.reboot",
            Self::LinodeShutdown => "linode.shutdown",
            Self::LinodeClone => "linode.clone",
            Self::LinodeResize => "linode.resize",
            Self::DiskList => "linode.disk.list",
            Self::DiskCreate => "linode.disk.create",
            Self::DiskCreateFromDistribution => "linode.disk.createfromdistribution",
            Self::DiskCreateFromStackscript => "linode.disk.createfromstackscript",
            Self::DiskUpdate => "linode.disk.update",
            Self::DiskDelete => "linode.disk.delete",
            Self::ConfigList => "linode.config.list",
            Self::ConfigCreate => "linode.config.create",
            Self::ConfigUpdate => "linode.config.update",
            Self::ConfigDelete => "linode.config.delete",
            Self::IpList => "linode.ip.list",
            Self::JobList => "linode.job.list",
            Self::DomainList => "domain.list",
            Self::DomainCreate => "domain.create",
            Self::DomainUpdate => "domain.update",
            Self::DomainDelete => "domain.delete",
            Self::DomainResourceList => "domain.resource.list",
            Self::DomainResourceCreate => "domain.resource.create",
            Self::DomainResourceUpdate => "domain.resource.update",
            Self::DomainResourceDelete => "domain.resource.delete",
            Self::NodebalancerList => "nodebalancer.list",
            Self::NodebalancerCreate => "nodebalancer.create",
            Self::NodebalancerUpdate => "nodebalancer.update",
            Self::NodebalancerDelete => "nodebalancer.delete",
            Self::NodebalancerConfigList => "nodebalancer.config.list",
            Self::NodebalancerConfigCreate => "nodebalancer.config.create",
            Self::NodebalancerConfigUpdate => "nodebalancer.config.update",
            Self::NodebalancerConfigDelete => "nodebalancer.config.delete",
            Self::NodebalancerNodeList => "nodebalancer.node.list",
            Self::NodebalancerNodeCreate => "nodebalancer.node.create",
            Self::NodebalancerNodeUpdate => "nodebalancer.node.update",
            Self::NodebalancerNodeDelete => "nodebalancer.node.delete",
            Self::StackscriptList => "stackscript.list",
            Self::StackscriptCreate => "stackscript.create",
            Self::StackscriptUpdate => "stackscript.update",
            Self::StackscriptDelete => "stackscript.delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something that can execute Linode API actions.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute `action` with `params` and return the response's `DATA`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API reports an error.
    async fn call(&self, action: Action, params: &Params) -> Result<Value, LinodeError>;
}

/// [`Transport`] over HTTPS using `reqwest`.
pub struct HttpTransport {
    settings: LinodeSettings,
    http: reqwest::Client,
}

impl HttpTransport {
    /// Create a new HTTP transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(settings: LinodeSettings) -> Result<Self, LinodeError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .user_agent(settings.user_agent.clone())
            .build()?;

        Ok(Self { settings, http })
    }

    /// Get a reference to the current settings.
    #[must_use]
    pub const fn settings(&self) -> &LinodeSettings {
        &self.settings
    }

    fn request_url(&self, action: Action, params: &Params) -> Result<reqwest::Url, LinodeError> {
        let mut query: Vec<(String, String)> = Vec::with_capacity(params.len() + 2);
        query.push(("api_key".to_string(), self.settings.api_key.clone()));
        query.push(("api_action".to_string(), action.as_str().to_string()));
        for (key, value) in params {
            if value.is_null() {
                continue;
            }
            query.push((key.clone(), query_value(value)));
        }

        reqwest::Url::parse_with_params(&self.settings.api_url, &query).map_err(|_| {
            LinodeError::InvalidEnv {
                key: "LINODE_API_URL",
                reason: "expected an absolute URL",
            }
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn call(&self, action: Action, params: &Params) -> Result<Value, LinodeError> {
        let url = self.request_url(action, params)?;
        tracing::debug!(%action, params = params.len(), "calling linode api");

        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await?;
            return Err(LinodeError::Api { status, body });
        }

        let envelope: Envelope = resp
            .json()
            .await
            .map_err(|e| LinodeError::Json(e.without_url().to_string()))?;
        envelope.into_data(action)
    }
}

// ============================================================================
// Response envelope (internal)
// ============================================================================

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "ERRORARRAY", default)]
    errors: Vec<ApiFault>,
    #[serde(rename = "DATA")]
    data: Option<Value>,
}

impl Envelope {
    fn into_data(self, action: Action) -> Result<Value, LinodeError> {
        if !self.errors.is_empty() {
            tracing::debug!(%action, faults = self.errors.len(), "linode api reported errors");
            return Err(LinodeError::Remote {
                action,
                faults: self.errors,
            });
        }
        self.data.ok_or(LinodeError::EmptyResponse)
    }
}

/// Render a parameter the way the API expects it in a query string.
fn query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => if *b { "true" } else { "false" }.to_string(),
        other => other.to_string(),
    }
}
