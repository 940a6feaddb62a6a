//! NodeBalancers, their port configurations and backend nodes
//! (`nodebalancer.*`, `nodebalancer.config.*`, `nodebalancer.node.*`).
//!
//! Ownership runs Nodebalancer -> NodebalancerConfig -> NodebalancerNode; each
//! level is listed under the id of the level above.

use serde_json::Value;

use crate::{
    linode_client::LinodeApi,
    linode_error::LinodeError,
    linode_finder::Criteria,
    linode_instance::check_payment_term,
    linode_model::{AttrSpec, Entity, Layout, Resource, Scope, WireDefault},
    linode_transport::{Action, Params},
};

// ============================================================================
// NodeBalancers
// ============================================================================

/// A load balancer.
pub struct Nodebalancer;

const NODEBALANCER_ATTRS: &[AttrSpec] = &[
    AttrSpec::int("api_id", "NODEBALANCERID").update_as("nodebalancerid"),
    AttrSpec::text("label", "LABEL").update_as("label"),
    AttrSpec::int("client_conn_throttle", "CLIENTCONNTHROTTLE").update_as("clientconnthrottle"),
    AttrSpec::text("hostname", "HOSTNAME"),
    AttrSpec::text("address4", "ADDRESS4"),
    AttrSpec::text("address6", "ADDRESS6"),
    AttrSpec::text("status", "STATUS").may_be_absent(WireDefault::Text("")),
];

impl Resource for Nodebalancer {
    const NAME: &'static str = "Nodebalancer";
    const ID_KEY: &'static str = "NODEBALANCERID";
    const ID_PARAM: &'static str = "nodebalancerid";
    const LIST: Action = Action::NodebalancerList;
    const UPDATE: Option<Action> = Some(Action::NodebalancerUpdate);
    const DELETE: Option<Action> = Some(Action::NodebalancerDelete);
    const LAYOUT: Layout = Layout::Schema(NODEBALANCER_ATTRS);
}

impl Nodebalancer {
    /// Create a NodeBalancer and return it.
    ///
    /// # Errors
    ///
    /// Returns [`LinodeError::InvalidParameter`] for an unsupported payment
    /// term, or the error of the create or lookup call.
    pub async fn create(
        api: &LinodeApi,
        datacenter_id: i64,
        payment_term: i64,
    ) -> Result<Entity<Self>, LinodeError> {
        check_payment_term(Action::NodebalancerCreate.as_str(), payment_term)?;

        let mut params = Params::new();
        params.insert("datacenterid".into(), datacenter_id.into());
        params.insert("paymentterm".into(), payment_term.into());
        api.create_then_fetch(Action::NodebalancerCreate, &params, "NodeBalancerID", None)
            .await
    }
}

impl Entity<Nodebalancer> {
    /// Port configurations of the NodeBalancer.
    ///
    /// # Errors
    ///
    /// Returns the error of the list call.
    pub async fn configs(&self, api: &LinodeApi) -> Result<Vec<Entity<NodebalancerConfig>>, LinodeError> {
        api.search::<NodebalancerConfig>(Criteria::new().with(CONFIG_SCOPE.criterion, self.api_id()?))
            .await
    }
}

// ============================================================================
// Configurations
// ============================================================================

/// One balanced port of a NodeBalancer.
pub struct NodebalancerConfig;

const CONFIG_SCOPE: Scope = Scope {
    criterion: "nodebalancer",
    param: "nodebalancerid",
    local: "nodebalancer_id",
};

const NODEBALANCER_CONFIG_ATTRS: &[AttrSpec] = &[
    AttrSpec::int("api_id", "CONFIGID").update_as("configid"),
    AttrSpec::int("nodebalancer_id", "NODEBALANCERID"),
    AttrSpec::text("algorithm", "ALGORITHM").update_as("algorithm"),
    // health checks
    AttrSpec::text("check", "CHECK").update_as("check"),
    AttrSpec::int("check_attempts", "CHECK_ATTEMPTS").update_as("check_attempts"),
    AttrSpec::text("check_body", "CHECK_BODY").update_as("check_body"),
    AttrSpec::int("check_interval", "CHECK_INTERVAL").update_as("check_interval"),
    AttrSpec::text("check_path", "CHECK_PATH").update_as("check_path"),
    AttrSpec::int("check_timeout", "CHECK_TIMEOUT").update_as("check_timeout"),
    AttrSpec::int("port", "PORT").update_as("port"),
    AttrSpec::text("protocol", "PROTOCOL").update_as("protocol"),
    AttrSpec::text("stickiness", "STICKINESS").update_as("stickiness"),
];

impl Resource for NodebalancerConfig {
    const NAME: &'static str = "NodebalancerConfig";
    const ID_KEY: &'static str = "CONFIGID";
    const ID_PARAM: &'static str = "configid";
    const LIST: Action = Action::NodebalancerConfigList;
    const UPDATE: Option<Action> = Some(Action::NodebalancerConfigUpdate);
    const DELETE: Option<Action> = Some(Action::NodebalancerConfigDelete);
    const SCOPE: Option<Scope> = Some(CONFIG_SCOPE);
    const LAYOUT: Layout = Layout::Schema(NODEBALANCER_CONFIG_ATTRS);
}

impl NodebalancerConfig {
    /// Add a port configuration to a NodeBalancer and return it.
    ///
    /// # Errors
    ///
    /// Returns the error of the create or lookup call.
    pub async fn create(
        api: &LinodeApi,
        nodebalancer_id: i64,
        port: Option<i64>,
        protocol: Option<&str>,
    ) -> Result<Entity<Self>, LinodeError> {
        let mut params = Params::new();
        params.insert("nodebalancerid".into(), nodebalancer_id.into());
        if let Some(port) = port {
            params.insert("port".into(), port.into());
        }
        if let Some(protocol) = protocol {
            params.insert("protocol".into(), protocol.into());
        }
        api.create_then_fetch(Action::NodebalancerConfigCreate, &params, "ConfigID", Some(nodebalancer_id))
            .await
    }
}

impl Entity<NodebalancerConfig> {
    /// The NodeBalancer owning the configuration, fetched on every call.
    ///
    /// # Errors
    ///
    /// Returns the error of the lookup.
    pub async fn nodebalancer(&self, api: &LinodeApi) -> Result<Entity<Nodebalancer>, LinodeError> {
        api.fetch::<Nodebalancer>(None, self.int("nodebalancer_id")?).await
    }

    /// Backend nodes behind the configuration.
    ///
    /// # Errors
    ///
    /// Returns the error of the list call.
    pub async fn nodes(&self, api: &LinodeApi) -> Result<Vec<Entity<NodebalancerNode>>, LinodeError> {
        api.search::<NodebalancerNode>(Criteria::new().with(NODE_SCOPE.criterion, self.api_id()?))
            .await
    }
}

// ============================================================================
// Nodes
// ============================================================================

/// A backend receiving traffic from a configuration.
pub struct NodebalancerNode;

const NODE_SCOPE: Scope = Scope {
    criterion: "config",
    param: "configid",
    local: "config_id",
};

const NODEBALANCER_NODE_ATTRS: &[AttrSpec] = &[
    AttrSpec::int("api_id", "NODEID").update_as("nodeid"),
    AttrSpec::int("config_id", "CONFIGID"),
    AttrSpec::int("nodebalancer_id", "NODEBALANCERID"),
    AttrSpec::text("label", "LABEL").update_as("label"),
    AttrSpec::text("address", "ADDRESS").update_as("address"),
    AttrSpec::int("weight", "WEIGHT").update_as("weight"),
    AttrSpec::text("mode", "MODE").update_as("mode"),
    AttrSpec::text("status", "STATUS").may_be_absent(WireDefault::Text("")),
];

impl Resource for NodebalancerNode {
    const NAME: &'static str = "NodebalancerNode";
    const ID_KEY: &'static str = "NODEID";
    const ID_PARAM: &'static str = "nodeid";
    const LIST: Action = Action::NodebalancerNodeList;
    const UPDATE: Option<Action> = Some(Action::NodebalancerNodeUpdate);
    const DELETE: Option<Action> = Some(Action::NodebalancerNodeDelete);
    const SCOPE: Option<Scope> = Some(NODE_SCOPE);
    const LAYOUT: Layout = Layout::Schema(NODEBALANCER_NODE_ATTRS);
}

impl NodebalancerNode {
    /// Add a backend node to a configuration and return it.
    ///
    /// `address` is `ip:port` on the private network.
    ///
    /// # Errors
    ///
    /// Returns the error of the create or lookup call.
    pub async fn create(
        api: &LinodeApi,
        config_id: i64,
        label: &str,
        address: &str,
        weight: Option<i64>,
        mode: Option<&str>,
    ) -> Result<Entity<Self>, LinodeError> {
        let mut params = Params::new();
        params.insert("configid".into(), config_id.into());
        params.insert("label".into(), label.into());
        params.insert("address".into(), address.into());
        let optional = [("weight", weight.map(Value::from)), ("mode", mode.map(Value::from))];
        for (name, value) in optional {
            if let Some(value) = value {
                params.insert(name.into(), value);
            }
        }
        api.create_then_fetch(Action::NodebalancerNodeCreate, &params, "NodeID", Some(config_id))
            .await
    }
}

impl Entity<NodebalancerNode> {
    /// The configuration the node serves, fetched on every call.
    ///
    /// # Errors
    ///
    /// Returns the error of the lookup.
    pub async fn config(&self, api: &LinodeApi) -> Result<Entity<NodebalancerConfig>, LinodeError> {
        api.fetch::<NodebalancerConfig>(Some(self.int("nodebalancer_id")?), self.int("config_id")?)
            .await
    }
}
