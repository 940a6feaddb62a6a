//! Distributions (`avail.distributions`).
//!
//! Disk images can be deployed from a distribution, optionally through a
//! stackscript.

use crate::{
    linode_model::{AttrSpec, Layout, Resource},
    linode_transport::Action,
};

/// An operating system distribution. Read-only.
pub struct Distribution;

const DISTRIBUTION_ATTRS: &[AttrSpec] = &[
    AttrSpec::int("api_id", "DISTRIBUTIONID"),
    AttrSpec::text("label", "LABEL"),
    AttrSpec::text("create_dt", "CREATE_DT"),
    AttrSpec::int("min_image_size", "MINIMAGESIZE"),
    AttrSpec::flag("is_64bit", "IS64BIT"),
    AttrSpec::flag("requires_pvops_kernel", "REQUIRESPVOPSKERNEL"),
];

impl Resource for Distribution {
    const NAME: &'static str = "Distribution";
    const ID_KEY: &'static str = "DISTRIBUTIONID";
    const ID_PARAM: &'static str = "distributionid";
    const LIST: Action = Action::AvailDistributions;
    const LAYOUT: Layout = Layout::Schema(DISTRIBUTION_ATTRS);
}
