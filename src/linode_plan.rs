//! Linode plans (`avail.linodeplans`).
//!
//! Plans are read through the rule-based reader, so every key the API returns
//! (`RAM`, `DISK`, `XFER`, `PRICE`, `AVAIL`, ...) becomes an attribute.

use crate::{
    linode_client::LinodeApi,
    linode_error::LinodeError,
    linode_finder::Finder,
    linode_model::{Entity, Layout, Resource},
    linode_reader::Reader,
    linode_transport::Action,
    linode_value::Conversion,
};

/// Share of a plan's disk Linode keeps for itself.
pub const RESERVED_DISK_PROPORTION: f64 = 0.02;

/// A Linode payment plan. Read-only.
pub struct Plan;

impl Resource for Plan {
    const NAME: &'static str = "Plan";
    const ID_KEY: &'static str = "PLANID";
    const ID_PARAM: &'static str = "planid";
    const LIST: Action = Action::AvailLinodePlans;
    const LAYOUT: Layout = Layout::Rules(Reader::new("Plan"));
}

impl Plan {
    /// The first plan with `ram` MB of memory.
    ///
    /// # Errors
    ///
    /// Returns [`LinodeError::NotFound`] if no plan has that much memory.
    pub async fn find_by_ram(api: &LinodeApi, ram: i64) -> Result<Entity<Self>, LinodeError> {
        let plans = Finder::<Self>::new(api).list_all().await?;
        let found = plans.iter().find(|p| {
            p.get("RAM")
                .and_then(|v| Conversion::Int.to_local(v).ok())
                .and_then(|v| v.as_int())
                == Some(ram)
        });
        match found {
            Some(payload) => Entity::from_wire(payload),
            None => Err(LinodeError::NotFound {
                entity: Self::NAME,
                lookup: format!("{ram}MB of RAM"),
            }),
        }
    }
}

impl Entity<Plan> {
    /// Estimated largest disk image for the plan, in MB.
    ///
    /// # Errors
    ///
    /// Returns an error if the plan carries no integer `disk` size, or one too
    /// large to express in MB.
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn max_image_size(&self) -> Result<i64, LinodeError> {
        let disk_gb = self.int("disk")?;
        let disk_mb = disk_gb.checked_mul(1024).ok_or_else(|| LinodeError::InvalidField {
            entity: Plan::NAME,
            field: "disk".to_string(),
            reason: format!("{disk_gb} GB does not fit in MB"),
        })?;
        Ok((disk_mb as f64 * (1.0 - RESERVED_DISK_PROPORTION)) as i64)
    }
}
