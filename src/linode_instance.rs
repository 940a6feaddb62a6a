//! Linodes and their IP addresses.
//!
//! Unique responsibility: create Linodes, run their lifecycle actions and
//! reach the resources that hang off them.
//!
//! Lifecycle actions (boot, reboot, shutdown) return the [`Job`] the API
//! starts; call `wait` on it to block until the Linode settles:
//!
//! ```ignore
//! let mut job = linode.boot(&api, None).await?;
//! job.wait_default(&api).await?;
//! ```

use crate::{
    linode_boot_config::LinodeConfig,
    linode_client::LinodeApi,
    linode_datacenter::Datacenter,
    linode_disk::Disk,
    linode_error::LinodeError,
    linode_finder::Criteria,
    linode_job::Job,
    linode_model::{AttrSpec, Entity, Layout, Resource, Scope, WireDefault},
    linode_reader::Reader,
    linode_transport::{Action, Params},
    linode_value::Conversion,
};

/// Payment terms the API accepts, in months.
pub const PAYMENT_TERMS: [i64; 3] = [1, 12, 24];

/// A Linode virtual server.
pub struct Linode;

const LINODE_ATTRS: &[AttrSpec] = &[
    // ids
    AttrSpec::int("api_id", "LINODEID").update_as("linodeid"),
    AttrSpec::int("datacenter_id", "DATACENTERID"),
    AttrSpec::int("plan_id", "PLANID").may_be_absent(WireDefault::Null),
    // properties
    AttrSpec::text("label", "LABEL").update_as("label"),
    AttrSpec::text("display_group", "LPM_DISPLAYGROUP").update_as("lpm_displaygroup"),
    AttrSpec::text("create_dt", "CREATE_DT"),
    AttrSpec::int("total_hd", "TOTALHD"),
    AttrSpec::int("total_xfer", "TOTALXFER"),
    AttrSpec::int("total_ram", "TOTALRAM"),
    // dynamic values
    AttrSpec::int("status", "STATUS"),
    AttrSpec::new("alert_cpu_enabled", "ALERT_CPU_ENABLED", Conversion::Bool, Conversion::Bool)
        .update_as("alert_cpu_enabled"),
    AttrSpec::int("alert_cpu_threshold", "ALERT_CPU_THRESHOLD").update_as("alert_cpu_threshold"),
    AttrSpec::new("alert_diskio_enabled", "ALERT_DISKIO_ENABLED", Conversion::Bool, Conversion::Bool)
        .update_as("alert_diskio_enabled"),
    AttrSpec::int("alert_diskio_threshold", "ALERT_DISKIO_THRESHOLD")
        .update_as("alert_diskio_threshold"),
    AttrSpec::new("alert_bwin_enabled", "ALERT_BWIN_ENABLED", Conversion::Bool, Conversion::Bool)
        .update_as("alert_bwin_enabled"),
    AttrSpec::int("alert_bwin_threshold", "ALERT_BWIN_THRESHOLD").update_as("alert_bwin_threshold"),
    AttrSpec::new("alert_bwout_enabled", "ALERT_BWOUT_ENABLED", Conversion::Bool, Conversion::Bool)
        .update_as("alert_bwout_enabled"),
    AttrSpec::int("alert_bwout_threshold", "ALERT_BWOUT_THRESHOLD")
        .update_as("alert_bwout_threshold"),
    AttrSpec::new("alert_bwquota_enabled", "ALERT_BWQUOTA_ENABLED", Conversion::Bool, Conversion::Bool)
        .update_as("alert_bwquota_enabled"),
    AttrSpec::int("alert_bwquota_threshold", "ALERT_BWQUOTA_THRESHOLD")
        .update_as("alert_bwquota_threshold"),
    AttrSpec::int("backup_weekly_day", "BACKUPWEEKLYDAY").update_as("backupweeklyday"),
    AttrSpec::int("backup_window", "BACKUPWINDOW").update_as("backupwindow"),
    AttrSpec::new("watchdog", "WATCHDOG", Conversion::Bool, Conversion::Bool).update_as("watchdog"),
];

impl Resource for Linode {
    const NAME: &'static str = "Linode";
    const ID_KEY: &'static str = "LINODEID";
    const ID_PARAM: &'static str = "linodeid";
    const LIST: Action = Action::LinodeList;
    const UPDATE: Option<Action> = Some(Action::LinodeUpdate);
    const DELETE: Option<Action> = Some(Action::LinodeDelete);
    const LAYOUT: Layout = Layout::Schema(LINODE_ATTRS);
}

/// An IP address assigned to a Linode. Read-only.
pub struct IpAddress;

impl Resource for IpAddress {
    const NAME: &'static str = "IPAddress";
    const ID_KEY: &'static str = "IPADDRESSID";
    const ID_PARAM: &'static str = "ipaddressid";
    const LABEL_KEY: &'static str = "IPADDRESS";
    const LIST: Action = Action::IpList;
    const SCOPE: Option<Scope> = Some(LINODE_SCOPE);
    const LAYOUT: Layout = Layout::Rules(Reader::new("IPAddress"));
}

/// Parent relationship shared by everything nested under a Linode.
pub(crate) const LINODE_SCOPE: Scope = Scope {
    criterion: "linode_id",
    param: "linodeid",
    local: "linode_id",
};

pub(crate) fn check_payment_term(operation: &'static str, payment_term: i64) -> Result<(), LinodeError> {
    if PAYMENT_TERMS.contains(&payment_term) {
        return Ok(());
    }
    Err(LinodeError::InvalidParameter {
        operation,
        param: "payment_term",
        reason: format!("{payment_term} is not one of 1, 12 or 24 months"),
    })
}

impl Linode {
    /// Create a Linode and return it.
    ///
    /// # Errors
    ///
    /// Returns [`LinodeError::InvalidParameter`] for an unsupported payment
    /// term, or the error of the create or lookup call.
    pub async fn create(
        api: &LinodeApi,
        datacenter_id: i64,
        plan_id: i64,
        payment_term: i64,
    ) -> Result<Entity<Self>, LinodeError> {
        check_payment_term(Action::LinodeCreate.as_str(), payment_term)?;

        let mut params = Params::new();
        params.insert("datacenterid".into(), datacenter_id.into());
        params.insert("planid".into(), plan_id.into());
        params.insert("paymentterm".into(), payment_term.into());
        api.create_then_fetch(Action::LinodeCreate, &params, "LinodeID", None)
            .await
    }
}

impl Entity<Linode> {
    async fn run_job(
        &self,
        api: &LinodeApi,
        action: Action,
        config_id: Option<i64>,
    ) -> Result<Entity<Job>, LinodeError> {
        let linode_id = self.api_id()?;
        let mut params = Params::new();
        params.insert("linodeid".into(), linode_id.into());
        if let Some(config_id) = config_id {
            params.insert("configid".into(), config_id.into());
        }

        let job_id = api.created_id::<Job>(action, &params, "JobID").await?;
        tracing::info!(%action, linode_id, job_id, "started linode job");
        Job::find(api, linode_id, job_id).await
    }

    /// Boot the Linode, optionally with a specific configuration profile.
    ///
    /// # Errors
    ///
    /// Returns the error of the boot or job lookup call.
    pub async fn boot(&self, api: &LinodeApi, config_id: Option<i64>) -> Result<Entity<Job>, LinodeError> {
        self.run_job(api, Action::LinodeBoot, config_id).await
    }

    /// Reboot the Linode, optionally into a specific configuration profile.
    ///
    /// # Errors
    ///
    /// Returns the error of the reboot or job lookup call.
    pub async fn reboot(&self, api: &LinodeApi, config_id: Option<i64>) -> Result<Entity<Job>, LinodeError> {
        self.run_job(api, Action::LinodeReboot, config_id).await
    }

    /// Shut the Linode down.
    ///
    /// # Errors
    ///
    /// Returns the error of the shutdown or job lookup call.
    pub async fn shutdown(&self, api: &LinodeApi) -> Result<Entity<Job>, LinodeError> {
        self.run_job(api, Action::LinodeShutdown, None).await
    }

    /// Clone the Linode into a new one.
    ///
    /// # Errors
    ///
    /// Returns [`LinodeError::InvalidParameter`] for an unsupported payment
    /// term, or the error of the clone or lookup call.
    pub async fn clone_to(
        &self,
        api: &LinodeApi,
        datacenter_id: i64,
        plan_id: i64,
        payment_term: i64,
    ) -> Result<Self, LinodeError> {
        check_payment_term(Action::LinodeClone.as_str(), payment_term)?;

        let mut params = Params::new();
        params.insert("linodeid".into(), self.api_id()?.into());
        params.insert("datacenterid".into(), datacenter_id.into());
        params.insert("planid".into(), plan_id.into());
        params.insert("paymentterm".into(), payment_term.into());
        api.create_then_fetch(Action::LinodeClone, &params, "LinodeID", None)
            .await
    }

    /// Move the Linode to another plan.
    ///
    /// # Errors
    ///
    /// Returns the error of the resize call.
    pub async fn resize(&self, api: &LinodeApi, plan_id: i64) -> Result<(), LinodeError> {
        let mut params = Params::new();
        params.insert("linodeid".into(), self.api_id()?.into());
        params.insert("planid".into(), plan_id.into());
        api.call(Action::LinodeResize, &params).await?;
        tracing::info!(linode_id = ?self.get("api_id"), plan_id, "resized linode");
        Ok(())
    }

    /// The datacenter hosting the Linode, fetched on every call.
    ///
    /// # Errors
    ///
    /// Returns the error of the lookup.
    pub async fn datacenter(&self, api: &LinodeApi) -> Result<Entity<Datacenter>, LinodeError> {
        api.fetch::<Datacenter>(None, self.int("datacenter_id")?).await
    }

    fn children(&self) -> Result<Criteria, LinodeError> {
        Ok(Criteria::new().with(LINODE_SCOPE.criterion, self.api_id()?))
    }

    /// Disks of the Linode.
    ///
    /// # Errors
    ///
    /// Returns the error of the list call.
    pub async fn disks(&self, api: &LinodeApi) -> Result<Vec<Entity<Disk>>, LinodeError> {
        api.search::<Disk>(self.children()?).await
    }

    /// Configuration profiles of the Linode.
    ///
    /// # Errors
    ///
    /// Returns the error of the list call.
    pub async fn configs(&self, api: &LinodeApi) -> Result<Vec<Entity<LinodeConfig>>, LinodeError> {
        api.search::<LinodeConfig>(self.children()?).await
    }

    /// IP addresses of the Linode.
    ///
    /// # Errors
    ///
    /// Returns the error of the list call.
    pub async fn ips(&self, api: &LinodeApi) -> Result<Vec<Entity<IpAddress>>, LinodeError> {
        api.search::<IpAddress>(self.children()?).await
    }

    /// Jobs of the Linode, most recent first as returned by the API.
    ///
    /// # Errors
    ///
    /// Returns the error of the list call.
    pub async fn jobs(&self, api: &LinodeApi) -> Result<Vec<Entity<Job>>, LinodeError> {
        api.search::<Job>(self.children()?).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
pub(crate) mod tests {
    use serde_json::{Value, json};

    use super::*;
    use crate::{linode_model::tests::assert_unique_wire_names, testing::MockTransport};

    pub(crate) fn linode_list(id: i64, label: &str) -> Value {
        json!([{
            "LINODEID": id,
            "DATACENTERID": 2,
            "PLANID": 1,
            "LABEL": label,
            "LPM_DISPLAYGROUP": "",
            "CREATE_DT": "2013-01-01 00:00:00.0",
            "TOTALHD": 24576,
            "TOTALXFER": 2000,
            "TOTALRAM": 1024,
            "STATUS": 1,
            "ALERT_CPU_ENABLED": 1,
            "ALERT_CPU_THRESHOLD": 90,
            "ALERT_DISKIO_ENABLED": 1,
            "ALERT_DISKIO_THRESHOLD": 1000,
            "ALERT_BWIN_ENABLED": 1,
            "ALERT_BWIN_THRESHOLD": 5,
            "ALERT_BWOUT_ENABLED": 1,
            "ALERT_BWOUT_THRESHOLD": 5,
            "ALERT_BWQUOTA_ENABLED": 1,
            "ALERT_BWQUOTA_THRESHOLD": 80,
            "BACKUPWEEKLYDAY": 0,
            "BACKUPWINDOW": 1,
            "WATCHDOG": 1,
        }])
    }

    fn job_list(linode_id: i64, job_id: i64) -> Value {
        json!([{
            "JOBID": job_id,
            "LINODEID": linode_id,
            "ACTION": "linode.boot",
            "LABEL": "System Boot",
            "HOST_SUCCESS": "",
        }])
    }

    #[test]
    fn wire_names_are_unique() {
        assert_unique_wire_names::<Linode>();
    }

    #[tokio::test]
    async fn create_rejects_unknown_payment_term() {
        let mock = MockTransport::new();
        let api = mock.api();

        let err = Linode::create(&api, 2, 1, 6).await.unwrap_err();
        assert!(matches!(
            err,
            LinodeError::InvalidParameter { param: "payment_term", .. }
        ));
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn create_then_fetch_new_linode() {
        let mock = MockTransport::new();
        mock.respond(Action::LinodeCreate, json!({ "LinodeID": 8098 }));
        mock.respond(Action::LinodeList, linode_list(8098, "linode8098"));
        let api = mock.api();

        let linode = Linode::create(&api, 2, 1, 12).await.unwrap();
        assert_eq!(linode.api_id().unwrap(), 8098);
        assert!(linode.flag("watchdog").unwrap());

        let sent = mock.last_params(Action::LinodeCreate);
        assert_eq!(sent["datacenterid"], json!(2));
        assert_eq!(sent["planid"], json!(1));
        assert_eq!(sent["paymentterm"], json!(12));
    }

    #[tokio::test]
    async fn create_then_failed_lookup_propagates() {
        let mock = MockTransport::new();
        mock.respond(Action::LinodeCreate, json!({ "LinodeID": 8098 }));
        mock.respond(Action::LinodeList, json!([]));
        let api = mock.api();

        let err = Linode::create(&api, 2, 1, 1).await.unwrap_err();
        assert!(matches!(err, LinodeError::NotFound { entity: "Linode", .. }));
        assert_eq!(mock.count(Action::LinodeCreate), 1);
    }

    #[tokio::test]
    async fn boot_returns_the_job() {
        let mock = MockTransport::new();
        mock.respond(Action::LinodeList, linode_list(8098, "web"));
        mock.respond(Action::LinodeBoot, json!({ "JobID": 1201 }));
        mock.respond(Action::JobList, job_list(8098, 1201));
        let api = mock.api();

        let linode = api
            .find::<Linode>(Criteria::new().with("label", "web"))
            .await
            .unwrap();
        let job = linode.boot(&api, Some(55)).await.unwrap();
        assert_eq!(job.api_id().unwrap(), 1201);

        let sent = mock.last_params(Action::LinodeBoot);
        assert_eq!(sent["linodeid"], json!(8098));
        assert_eq!(sent["configid"], json!(55));
    }

    #[tokio::test]
    async fn save_sends_settings() {
        let mock = MockTransport::new();
        mock.respond(Action::LinodeList, linode_list(8098, "web"));
        mock.respond(Action::LinodeUpdate, json!({ "LinodeID": 8098 }));
        let api = mock.api();

        let mut linode = api
            .find::<Linode>(Criteria::new().with("api_id", 8098))
            .await
            .unwrap();
        linode.set("label", "web-renamed").unwrap();
        linode.set("watchdog", false).unwrap();
        api.save(&linode).await.unwrap();

        let sent = mock.last_params(Action::LinodeUpdate);
        assert_eq!(sent["linodeid"], json!(8098));
        assert_eq!(sent["label"], json!("web-renamed"));
        assert_eq!(sent["watchdog"], json!(false));
        assert_eq!(sent["backupweeklyday"], json!(0));
        assert!(!sent.contains_key("status"));
        assert!(!sent.contains_key("total_ram"));
    }

    #[tokio::test]
    async fn ips_are_listed_under_the_linode() {
        let mock = MockTransport::new();
        mock.respond(Action::LinodeList, linode_list(8098, "web"));
        mock.respond(
            Action::IpList,
            json!([{ "IPADDRESSID": 5384, "LINODEID": 8098, "ISPUBLIC": 1,
                     "IPADDRESS": "75.128.96.54", "RDNS_NAME": "li22-54.members.linode.com" }]),
        );
        let api = mock.api();

        let linode = api
            .find::<Linode>(Criteria::new().with("api_id", 8098))
            .await
            .unwrap();
        let ips = linode.ips(&api).await.unwrap();
        assert_eq!(ips[0].api_id().unwrap(), 5384);
        assert!(ips[0].flag("is_public").unwrap());
        assert_eq!(ips[0].text("ipaddress").unwrap(), "75.128.96.54");
        assert_eq!(mock.last_params(Action::IpList)["linodeid"], json!(8098));
    }

    #[tokio::test]
    async fn datacenter_is_looked_up_each_time() {
        let mock = MockTransport::new();
        mock.respond(Action::LinodeList, linode_list(8098, "web"));
        mock.respond(
            Action::AvailDatacenters,
            json!([{ "DATACENTERID": 2, "LOCATION": "Dallas, TX, USA" }]),
        );
        let api = mock.api();

        let linode = api
            .find::<Linode>(Criteria::new().with("api_id", 8098))
            .await
            .unwrap();
        linode.datacenter(&api).await.unwrap();
        let dc = linode.datacenter(&api).await.unwrap();
        assert_eq!(dc.text("location").unwrap(), "Dallas, TX, USA");
        assert_eq!(mock.count(Action::AvailDatacenters), 2);
    }
}
