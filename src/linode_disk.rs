//! Disks of a Linode (`linode.disk.*`).
//!
//! A disk is created one of three ways, picked by the fields set on
//! [`DiskCreate`]:
//! - `stackscript_id` set: deploy a distribution through a stackscript,
//! - `distribution_id` set: deploy a distribution image,
//! - neither: an empty disk of `disk_type`.

use crate::{
    linode_client::{LinodeApi, id_field},
    linode_error::LinodeError,
    linode_instance::{LINODE_SCOPE, Linode},
    linode_job::Job,
    linode_model::{Entity, Layout, Resource, Scope},
    linode_reader::Reader,
    linode_saver::{require_id, require_text},
    linode_stackscript::StackscriptInput,
    linode_transport::{Action, Params},
};

/// A disk image on a Linode.
pub struct Disk;

impl Resource for Disk {
    const NAME: &'static str = "Disk";
    const ID_KEY: &'static str = "DISKID";
    const ID_PARAM: &'static str = "diskid";
    const LIST: Action = Action::DiskList;
    const DELETE: Option<Action> = Some(Action::DiskDelete);
    const SCOPE: Option<Scope> = Some(LINODE_SCOPE);
    const LAYOUT: Layout = Layout::Rules(Reader::new("Disk"));
}

/// Parameters for [`Disk::create`].
///
/// Start from [`DiskCreate::new`] and set the fields of the wanted variant.
#[derive(Debug, Clone)]
pub struct DiskCreate {
    /// Linode receiving the disk.
    pub linode_id: i64,
    /// Disk label.
    pub label: String,
    /// Size in MB.
    pub size: i64,
    /// Filesystem for an empty disk (`ext3`, `swap`, `raw`, ...).
    pub disk_type: Option<String>,
    /// Distribution to deploy.
    pub distribution_id: Option<i64>,
    /// Stackscript to run while deploying.
    pub stackscript_id: Option<i64>,
    /// Answers to the stackscript's user-defined fields.
    pub stackscript_input: Option<StackscriptInput>,
    /// Root password of the deployed system.
    pub root_pass: Option<String>,
    /// Public key added to root's `authorized_keys`.
    pub root_ssh_key: Option<String>,
}

/// A freshly created disk and the job building it.
#[derive(Debug, Clone)]
pub struct CreatedDisk {
    /// The new disk.
    pub disk: Entity<Disk>,
    /// The job creating it.
    pub job: Entity<Job>,
}

impl DiskCreate {
    /// A request for an empty disk with nothing but the required fields set.
    #[must_use]
    pub fn new(linode_id: i64, label: impl Into<String>, size: i64) -> Self {
        Self {
            linode_id,
            label: label.into(),
            size,
            disk_type: None,
            distribution_id: None,
            stackscript_id: None,
            stackscript_input: None,
            root_pass: None,
            root_ssh_key: None,
        }
    }

    const fn action(&self) -> Action {
        match (self.stackscript_id, self.distribution_id) {
            (Some(_), _) => Action::DiskCreateFromStackscript,
            (None, Some(_)) => Action::DiskCreateFromDistribution,
            (None, None) => Action::DiskCreate,
        }
    }

    fn base_params(&self) -> Params {
        let mut params = Params::new();
        params.insert("linodeid".into(), self.linode_id.into());
        params
    }

    fn require<'a, T>(
        value: Option<&'a T>,
        operation: Action,
        param: &'static str,
    ) -> Result<&'a T, LinodeError>
    where
        T: ?Sized,
    {
        value.ok_or(LinodeError::MissingParameter {
            operation: operation.as_str(),
            param,
        })
    }

    /// The action and parameters this request maps to.
    fn into_call(self) -> Result<(Action, Params), LinodeError> {
        let action = self.action();
        require_id(action, "linode_id", self.linode_id)?;
        require_text(action, "label", &self.label)?;
        require_id(action, "size", self.size)?;
        let mut params = self.base_params();

        if let Some(stackscript_id) = self.stackscript_id {
            let distribution_id = *Self::require(self.distribution_id.as_ref(), action, "distribution_id")?;
            let root_pass = Self::require(self.root_pass.as_deref(), action, "root_pass")?;
            let responses = self.stackscript_input.unwrap_or_default().to_json_string()?;

            params.insert("stackscriptid".into(), stackscript_id.into());
            params.insert("stackscriptudfresponses".into(), responses.into());
            params.insert("distributionid".into(), distribution_id.into());
            params.insert("label".into(), self.label.as_str().into());
            params.insert("size".into(), self.size.into());
            params.insert("rootpass".into(), root_pass.into());
            if let Some(key) = self.root_ssh_key.as_deref() {
                params.insert("rootsshkey".into(), key.into());
            }
            return Ok((action, params));
        }

        if let Some(distribution_id) = self.distribution_id {
            let root_pass = Self::require(self.root_pass.as_deref(), action, "root_pass")?;

            params.insert("distributionid".into(), distribution_id.into());
            params.insert("label".into(), self.label.as_str().into());
            params.insert("size".into(), self.size.into());
            params.insert("rootpass".into(), root_pass.into());
            if let Some(key) = self.root_ssh_key.as_deref() {
                params.insert("rootsshkey".into(), key.into());
            }
            return Ok((action, params));
        }

        let disk_type = Self::require(self.disk_type.as_deref(), action, "disk_type")?;
        params.insert("label".into(), self.label.as_str().into());
        params.insert("type".into(), disk_type.into());
        params.insert("size".into(), self.size.into());
        Ok((action, params))
    }
}

impl Disk {
    /// Create a disk and return it with its creation job.
    ///
    /// # Errors
    ///
    /// Returns [`LinodeError::MissingParameter`] when the chosen variant lacks
    /// a required field, or the error of the create or lookup calls.
    pub async fn create(api: &LinodeApi, request: DiskCreate) -> Result<CreatedDisk, LinodeError> {
        let linode_id = request.linode_id;
        let (action, params) = request.into_call()?;

        let data = api.object(action, &params).await?;
        let disk_id = id_field(&data, Self::NAME, "DiskID")?;
        let job_id = id_field(&data, Job::NAME, "JobID")?;
        tracing::info!(%action, linode_id, disk_id, job_id, "created disk");

        let disk = api.fetch::<Self>(Some(linode_id), disk_id).await?;
        let job = Job::find(api, linode_id, job_id).await?;
        Ok(CreatedDisk { disk, job })
    }

    /// Fetch one disk of a Linode.
    ///
    /// # Errors
    ///
    /// Returns [`LinodeError::NotFound`] if the Linode has no such disk.
    pub async fn find(api: &LinodeApi, linode_id: i64, disk_id: i64) -> Result<Entity<Self>, LinodeError> {
        api.fetch::<Self>(Some(linode_id), disk_id).await
    }
}

impl Entity<Disk> {
    /// The Linode owning the disk, fetched on every call.
    ///
    /// # Errors
    ///
    /// Returns the error of the lookup.
    pub async fn linode(&self, api: &LinodeApi) -> Result<Entity<Linode>, LinodeError> {
        api.fetch::<Linode>(None, self.int("linode_id")?).await
    }
}
