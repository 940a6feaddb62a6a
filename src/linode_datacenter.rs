//! Datacenters (`avail.datacenters`).

use crate::{
    linode_model::{AttrSpec, Layout, Resource, WireDefault},
    linode_transport::Action,
};

/// A Linode datacenter. Read-only.
pub struct Datacenter;

const DATACENTER_ATTRS: &[AttrSpec] = &[
    AttrSpec::int("api_id", "DATACENTERID"),
    AttrSpec::text("location", "LOCATION"),
    AttrSpec::text("abbr", "ABBR").may_be_absent(WireDefault::Text("")),
];

impl Resource for Datacenter {
    const NAME: &'static str = "Datacenter";
    const ID_KEY: &'static str = "DATACENTERID";
    const ID_PARAM: &'static str = "datacenterid";
    const LABEL_KEY: &'static str = "LOCATION";
    const LIST: Action = Action::AvailDatacenters;
    const LAYOUT: Layout = Layout::Schema(DATACENTER_ATTRS);
}
