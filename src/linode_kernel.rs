//! Kernels (`avail.kernels`).

use crate::{
    linode_model::{AttrSpec, Layout, Resource},
    linode_transport::Action,
};

/// A kernel a configuration profile can boot. Read-only.
pub struct Kernel;

const KERNEL_ATTRS: &[AttrSpec] = &[
    AttrSpec::int("api_id", "KERNELID"),
    AttrSpec::text("label", "LABEL"),
    AttrSpec::flag("is_xen", "ISXEN"),
    AttrSpec::flag("is_pvops", "ISPVOPS"),
];

impl Resource for Kernel {
    const NAME: &'static str = "Kernel";
    const ID_KEY: &'static str = "KERNELID";
    const ID_PARAM: &'static str = "kernelid";
    const LIST: Action = Action::AvailKernels;
    const LAYOUT: Layout = Layout::Schema(KERNEL_ATTRS);
}
