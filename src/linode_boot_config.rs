//! Configuration profiles of a Linode (`linode.config.*`).
//!
//! A profile names the kernel to boot and maps disks to device slots. The
//! API returns the slots as `DiskList`, a comma-separated string with one
//! entry per slot and blanks for empty slots (`"55319,55320,,,,,,,"`).

use serde_json::Value;

use crate::{
    linode_client::LinodeApi,
    linode_error::LinodeError,
    linode_instance::{LINODE_SCOPE, Linode},
    linode_kernel::Kernel,
    linode_model::{Entity, Layout, Resource, Scope},
    linode_reader::{KeyOverride, Reader},
    linode_saver::{require_id, require_text},
    linode_transport::{Action, Params},
    linode_value::{AttrValue, truthy},
};

/// A configuration profile.
pub struct LinodeConfig;

const CONFIG_OVERRIDES: &[KeyOverride] = &[
    KeyOverride::rename("ConfigID", "api_id"),
    KeyOverride::rename("DiskList", "disk_ids").with_value(decode_disk_list),
    KeyOverride::rename("isRescue", "is_rescue").with_value(read_truthy),
];

impl Resource for LinodeConfig {
    const NAME: &'static str = "LinodeConfig";
    const ID_KEY: &'static str = "ConfigID";
    const ID_PARAM: &'static str = "configid";
    const LABEL_KEY: &'static str = "Label";
    const LIST: Action = Action::ConfigList;
    const DELETE: Option<Action> = Some(Action::ConfigDelete);
    const SCOPE: Option<Scope> = Some(LINODE_SCOPE);
    const LAYOUT: Layout = Layout::Rules(Reader::new("LinodeConfig").with_overrides(CONFIG_OVERRIDES));
}

#[allow(clippy::unnecessary_wraps)]
fn read_truthy(value: &Value) -> Result<AttrValue, String> {
    Ok(AttrValue::Bool(truthy(value)))
}

/// Decode a `DiskList` string into device slots.
///
/// # Errors
///
/// Returns a description of the problem when a slot is not a disk id.
pub fn decode_disk_list(value: &Value) -> Result<AttrValue, String> {
    let Value::String(list) = value else {
        return Err(format!("{value} is not a disk list"));
    };
    list.split(',')
        .map(|slot| {
            let slot = slot.trim();
            if slot.is_empty() {
                Ok(AttrValue::Null)
            } else {
                slot.parse::<i64>()
                    .map(AttrValue::Int)
                    .map_err(|_| format!("'{slot}' is not a disk id"))
            }
        })
        .collect::<Result<Vec<_>, _>>()
        .map(AttrValue::List)
}

/// Encode device slots as a `DiskList` string.
#[must_use]
pub fn encode_disk_list(slots: &[Option<i64>]) -> String {
    slots
        .iter()
        .map(|slot| slot.map_or_else(String::new, |id| id.to_string()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Parameters for [`LinodeConfig::create`].
#[derive(Debug, Clone)]
pub struct LinodeConfigCreate {
    /// Linode receiving the profile.
    pub linode_id: i64,
    /// Kernel to boot.
    pub kernel_id: i64,
    /// Profile label.
    pub label: String,
    /// Disk per device slot, `None` for an empty slot.
    pub disk_ids: Vec<Option<i64>>,
    /// Free-form notes.
    pub comments: Option<String>,
    /// Memory limit in MB; 0 means the plan's full memory.
    pub ram_limit: Option<i64>,
    /// Run level (`default`, `single` or `binbash`).
    pub run_level: Option<String>,
    /// Root device slot, 1-based.
    pub root_device_num: Option<i64>,
    /// Enable the distro update-db helper.
    pub helper_disable_update_db: Option<bool>,
    /// Enable the depmod helper.
    pub helper_depmod: Option<bool>,
    /// Mount devtmpfs automatically.
    pub devtmpfs_automount: Option<bool>,
}

impl LinodeConfigCreate {
    /// A request with the required fields set and every option left out.
    #[must_use]
    pub fn new(linode_id: i64, kernel_id: i64, label: impl Into<String>, disk_ids: Vec<Option<i64>>) -> Self {
        Self {
            linode_id,
            kernel_id,
            label: label.into(),
            disk_ids,
            comments: None,
            ram_limit: None,
            run_level: None,
            root_device_num: None,
            helper_disable_update_db: None,
            helper_depmod: None,
            devtmpfs_automount: None,
        }
    }

    fn into_params(self) -> Params {
        let mut params = Params::new();
        params.insert("linodeid".into(), self.linode_id.into());
        params.insert("kernelid".into(), self.kernel_id.into());
        params.insert("label".into(), self.label.into());
        params.insert("disklist".into(), encode_disk_list(&self.disk_ids).into());

        let optional = [
            ("comments", self.comments.map(Value::from)),
            ("ramlimit", self.ram_limit.map(Value::from)),
            ("runlevel", self.run_level.map(Value::from)),
            ("rootdevicenum", self.root_device_num.map(Value::from)),
            ("helper_disableupdatedb", self.helper_disable_update_db.map(Value::from)),
            ("helper_depmod", self.helper_depmod.map(Value::from)),
            ("devtmpfs_automount", self.devtmpfs_automount.map(Value::from)),
        ];
        for (name, value) in optional {
            if let Some(value) = value {
                params.insert(name.into(), value);
            }
        }
        params
    }
}

impl LinodeConfig {
    /// Create a configuration profile and return it.
    ///
    /// # Errors
    ///
    /// Returns [`LinodeError::MissingParameter`] when the Linode, kernel or
    /// label is unset, or the error of the create or lookup call.
    pub async fn create(api: &LinodeApi, request: LinodeConfigCreate) -> Result<Entity<Self>, LinodeError> {
        let linode_id = require_id(Action::ConfigCreate, "linode_id", request.linode_id)?;
        require_id(Action::ConfigCreate, "kernel_id", request.kernel_id)?;
        require_text(Action::ConfigCreate, "label", &request.label)?;
        let params = request.into_params();
        api.create_then_fetch(Action::ConfigCreate, &params, "ConfigID", Some(linode_id))
            .await
    }

    /// Fetch one configuration profile of a Linode.
    ///
    /// # Errors
    ///
    /// Returns [`LinodeError::NotFound`] if the Linode has no such profile.
    pub async fn find(api: &LinodeApi, linode_id: i64, config_id: i64) -> Result<Entity<Self>, LinodeError> {
        api.fetch::<Self>(Some(linode_id), config_id).await
    }
}

impl Entity<LinodeConfig> {
    /// Disk per device slot.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile carries no decoded disk list.
    pub fn disk_ids(&self) -> Result<Vec<Option<i64>>, LinodeError> {
        let slots = self
            .get("disk_ids")
            .and_then(AttrValue::as_list)
            .ok_or_else(|| LinodeError::InvalidField {
                entity: LinodeConfig::NAME,
                field: "disk_ids".to_string(),
                reason: "not a disk list".to_string(),
            })?;
        Ok(slots.iter().map(AttrValue::as_int).collect())
    }

    /// The Linode owning the profile, fetched on every call.
    ///
    /// # Errors
    ///
    /// Returns the error of the lookup.
    pub async fn linode(&self, api: &LinodeApi) -> Result<Entity<Linode>, LinodeError> {
        api.fetch::<Linode>(None, self.int("linode_id")?).await
    }

    /// The kernel the profile boots, fetched on every call.
    ///
    /// # Errors
    ///
    /// Returns the error of the lookup.
    pub async fn kernel(&self, api: &LinodeApi) -> Result<Entity<Kernel>, LinodeError> {
        api.fetch::<Kernel>(None, self.int("kernel_id")?).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{linode_model::tests::payload, testing::MockTransport};

    fn config_list() -> Value {
        json!([{
            "ConfigID": 31239,
            "LinodeID": 8098,
            "KernelID": 138,
            "Label": "My Config",
            "Comments": "",
            "RAMLimit": 0,
            "DiskList": "55319,55320,,,,,,,",
            "RunLevel": "default",
            "RootDeviceNum": 1,
            "RootDeviceCustom": "",
            "RootDeviceRO": true,
            "helper_disableUpdateDB": true,
            "helper_xen": true,
            "helper_depmod": true,
            "devtmpfs_automount": true,
            "isRescue": 0,
        }])
    }

    #[test]
    fn disk_list_decodes_blank_slots() {
        let decoded = decode_disk_list(&json!("1,2,3,,,,,")).unwrap();
        assert_eq!(
            decoded,
            AttrValue::List(vec![
                AttrValue::Int(1),
                AttrValue::Int(2),
                AttrValue::Int(3),
                AttrValue::Null,
                AttrValue::Null,
                AttrValue::Null,
                AttrValue::Null,
                AttrValue::Null,
            ])
        );
        assert!(decode_disk_list(&json!("1,x")).is_err());
    }

    #[test]
    fn disk_list_encodes_blank_slots() {
        assert_eq!(encode_disk_list(&[Some(1), None, Some(3), None]), "1,,3,");
        assert_eq!(encode_disk_list(&[]), "");
    }

    #[test]
    fn reads_profile_with_overrides() {
        let config = Entity::<LinodeConfig>::from_wire(&payload(config_list()[0].clone())).unwrap();
        assert_eq!(config.api_id().unwrap(), 31239);
        assert_eq!(config.int("linode_id").unwrap(), 8098);
        assert_eq!(config.int("kernel_id").unwrap(), 138);
        assert!(!config.flag("is_rescue").unwrap());
        assert_eq!(
            config.disk_ids().unwrap(),
            [Some(55319), Some(55320), None, None, None, None, None, None, None]
        );
        assert_eq!(config.to_string(), "<LinodeConfig label='My Config'>");
    }

    #[tokio::test]
    async fn create_encodes_disk_list() {
        let mock = MockTransport::new();
        mock.respond(Action::ConfigCreate, json!({ "ConfigID": 31239 }));
        mock.respond(Action::ConfigList, config_list());
        let api = mock.api();

        let config = LinodeConfig::create(
            &api,
            LinodeConfigCreate {
                run_level: Some("default".into()),
                ..LinodeConfigCreate::new(8098, 138, "My Config", vec![Some(55319), Some(55320), None])
            },
        )
        .await
        .unwrap();
        assert_eq!(config.api_id().unwrap(), 31239);

        let sent = mock.last_params(Action::ConfigCreate);
        assert_eq!(sent["disklist"], json!("55319,55320,"));
        assert_eq!(sent["runlevel"], json!("default"));
        assert!(!sent.contains_key("comments"));
        assert_eq!(mock.last_params(Action::ConfigList)["linodeid"], json!(8098));
    }

    #[tokio::test]
    async fn create_needs_a_kernel() {
        let mock = MockTransport::new();
        let api = mock.api();

        let err = LinodeConfig::create(&api, LinodeConfigCreate::new(8098, 0, "My Config", vec![Some(55319)]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LinodeError::MissingParameter { operation: "linode.config.create", param: "kernel_id" }
        ));
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn profiles_cannot_be_saved() {
        let mock = MockTransport::new();
        mock.respond(Action::ConfigList, config_list());
        let api = mock.api();

        let config = LinodeConfig::find(&api, 8098, 31239).await.unwrap();
        let err = api.save(&config).await.unwrap_err();
        assert!(matches!(err, LinodeError::Unsupported { .. }));
    }
}
