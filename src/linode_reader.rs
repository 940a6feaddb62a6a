//! Rule-based payload reader.
//!
//! Unique responsibility: turn the keys and values of an open API payload
//! into local attribute names and values.
//!
//! Naming rules, for a reader of entity `Disk`:
//!
//! ```text
//! Wire key              Local name
//! LABEL                 label
//! LINODEID              linode_id
//! DISKID                api_id
//! ISREADONLY            is_readonly
//! REQUIRESPVOPSKERNEL   requires_pvopskernel
//! TOTALHD               total_hd
//! ```
//!
//! Keys starting with `IS` or `REQUIRES`, or ending with `ENABLED`, hold
//! booleans. A [`KeyOverride`] replaces either rule for one key.

use serde_json::Value;

use crate::{
    linode_error::LinodeError,
    linode_model::{Entity, Resource},
    linode_transport::Payload,
    linode_value::{AttrValue, truthy},
};

/// Value translation hook for one key.
pub type ValueFn = fn(&Value) -> Result<AttrValue, String>;

const PREFIXES: [&str; 3] = ["IS", "REQUIRES", "TOTAL"];
const SUFFIXES: [&str; 2] = ["ID", "ENABLED"];

/// Explicit translation for one wire key.
#[derive(Debug, Clone, Copy)]
pub struct KeyOverride {
    /// Wire key this entry applies to, matched exactly.
    pub wire_key: &'static str,
    /// Local name to use instead of the derived one.
    pub local_name: Option<&'static str>,
    /// Value translation to use instead of the default one.
    pub value: Option<ValueFn>,
}

impl KeyOverride {
    /// Rename `wire_key` to `local_name`.
    #[must_use]
    pub const fn rename(wire_key: &'static str, local_name: &'static str) -> Self {
        Self {
            wire_key,
            local_name: Some(local_name),
            value: None,
        }
    }

    /// Translate the values of `wire_key` with `value`.
    #[must_use]
    pub const fn with_value(self, value: ValueFn) -> Self {
        Self {
            value: Some(value),
            ..self
        }
    }
}

/// Open key/value reader for one entity type.
#[derive(Debug, Clone, Copy)]
pub struct Reader {
    /// Entity name whose `{NAME}ID` key becomes `api_id`.
    pub entity: &'static str,
    /// Per-key overrides.
    pub overrides: &'static [KeyOverride],
}

impl Reader {
    /// Reader using only the naming rules.
    #[must_use]
    pub const fn new(entity: &'static str) -> Self {
        Self {
            entity,
            overrides: &[],
        }
    }

    /// Reader with per-key overrides layered over the rules.
    #[must_use]
    pub const fn with_overrides(self, overrides: &'static [KeyOverride]) -> Self {
        Self { overrides, ..self }
    }

    fn override_for(&self, key: &str) -> Option<&KeyOverride> {
        self.overrides.iter().find(|o| o.wire_key == key)
    }

    /// Local attribute name for a wire key.
    #[must_use]
    pub fn translate_key(&self, key: &str) -> String {
        if let Some(name) = self.override_for(key).and_then(|o| o.local_name) {
            return name.to_string();
        }

        let id_key = format!("{}ID", self.entity);
        if key.eq_ignore_ascii_case(&id_key) {
            return "api_id".to_string();
        }

        let mut name = key.to_string();
        for prefix in PREFIXES {
            let n = prefix.len();
            if name.starts_with(prefix) && name.len() > n && !name[n..].starts_with('_') {
                name.insert(n, '_');
            }
        }
        for suffix in SUFFIXES {
            if name.ends_with(suffix) && name.len() > suffix.len() {
                let at = name.len() - suffix.len();
                if !name[..at].ends_with('_') {
                    name.insert(at, '_');
                }
            }
        }
        name.to_lowercase()
    }

    /// Local value for a wire key's value.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem when an override rejects the value.
    pub fn translate_value(&self, key: &str, value: &Value) -> Result<AttrValue, String> {
        if let Some(f) = self.override_for(key).and_then(|o| o.value) {
            return f(value);
        }
        if key.starts_with("IS") || key.starts_with("REQUIRES") || key.ends_with("ENABLED") {
            return Ok(AttrValue::Bool(truthy(value)));
        }
        Ok(AttrValue::from_json(value))
    }

    /// Build a new entity from every key in `payload`.
    ///
    /// # Errors
    ///
    /// Returns [`LinodeError::InvalidField`] when a value cannot be translated.
    pub fn read<R: Resource>(&self, payload: &Payload) -> Result<Entity<R>, LinodeError> {
        let mut entity = Entity::blank();
        self.read_into(payload, &mut entity)?;
        Ok(entity)
    }

    /// Write every key in `payload` into an existing entity.
    ///
    /// # Errors
    ///
    /// Returns [`LinodeError::InvalidField`] when a value cannot be translated.
    /// The target is left untouched in that case.
    pub fn read_into<R: Resource>(
        &self,
        payload: &Payload,
        target: &mut Entity<R>,
    ) -> Result<(), LinodeError> {
        let translated = payload
            .iter()
            .map(|(key, value)| {
                self.translate_value(key, value)
                    .map(|v| (self.translate_key(key), v))
                    .map_err(|reason| LinodeError::InvalidField {
                        entity: R::NAME,
                        field: key.clone(),
                        reason,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        for (name, value) in translated {
            target.insert(name, value);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        linode_model::{Layout, tests::payload},
        linode_transport::Action,
    };

    const DISK: Reader = Reader::new("Disk");

    fn parse_flag(value: &Value) -> Result<AttrValue, String> {
        match value {
            Value::String(s) if s == "yes" => Ok(AttrValue::Bool(true)),
            Value::String(s) if s == "no" => Ok(AttrValue::Bool(false)),
            other => Err(format!("{other} is not yes/no")),
        }
    }

    const GADGET_OVERRIDES: &[KeyOverride] = &[
        KeyOverride::rename("GadgetNum", "api_id"),
        KeyOverride::rename("isOn", "is_on").with_value(parse_flag),
    ];

    struct Gadget;

    impl Resource for Gadget {
        const NAME: &'static str = "Gadget";
        const ID_KEY: &'static str = "GadgetNum";
        const ID_PARAM: &'static str = "gadgetnum";
        const LIST: Action = Action::LinodeList;
        const LAYOUT: Layout = Layout::Rules(Reader::new("Gadget").with_overrides(GADGET_OVERRIDES));
    }

    #[test]
    fn key_rules() {
        assert_eq!(DISK.translate_key("LABEL"), "label");
        assert_eq!(DISK.translate_key("DISKID"), "api_id");
        assert_eq!(DISK.translate_key("LINODEID"), "linode_id");
        assert_eq!(DISK.translate_key("ISREADONLY"), "is_readonly");
        assert_eq!(DISK.translate_key("REQUIRESPVOPSKERNEL"), "requires_pvopskernel");
        assert_eq!(DISK.translate_key("TOTALHD"), "total_hd");
        assert_eq!(DISK.translate_key("ALERT_CPU_ENABLED"), "alert_cpu_enabled");
        assert_eq!(DISK.translate_key("BACKUPSENABLED"), "backups_enabled");
        assert_eq!(DISK.translate_key("CREATE_DT"), "create_dt");
    }

    #[test]
    fn id_key_matches_case_insensitively() {
        assert_eq!(DISK.translate_key("DiskID"), "api_id");
    }

    #[test]
    fn short_keys_are_left_alone() {
        assert_eq!(DISK.translate_key("ID"), "id");
        assert_eq!(DISK.translate_key("IS"), "is");
    }

    #[test]
    fn flag_keys_become_booleans() {
        assert_eq!(DISK.translate_value("ISREADONLY", &json!(1)).unwrap(), AttrValue::Bool(true));
        assert_eq!(DISK.translate_value("ISREADONLY", &json!("0")).unwrap(), AttrValue::Bool(false));
        assert_eq!(
            DISK.translate_value("BACKUPSENABLED", &json!("")).unwrap(),
            AttrValue::Bool(false)
        );
        assert_eq!(DISK.translate_value("SIZE", &json!(24576)).unwrap(), AttrValue::Int(24576));
    }

    #[test]
    fn overrides_win_over_rules() {
        let gadget: Entity<Gadget> = Gadget::LAYOUT_READER
            .read(&payload(json!({ "GadgetNum": 9, "isOn": "yes", "TOTALXFER": 200 })))
            .unwrap();
        assert_eq!(gadget.api_id().unwrap(), 9);
        assert!(gadget.flag("is_on").unwrap());
        assert_eq!(gadget.int("total_xfer").unwrap(), 200);
    }

    #[test]
    fn failed_override_leaves_target_untouched() {
        let mut gadget: Entity<Gadget> = Gadget::LAYOUT_READER
            .read(&payload(json!({ "GadgetNum": 9 })))
            .unwrap();
        let err = Gadget::LAYOUT_READER
            .read_into(&payload(json!({ "GadgetNum": 10, "isOn": "maybe" })), &mut gadget)
            .unwrap_err();
        assert!(matches!(err, LinodeError::InvalidField { .. }));
        assert_eq!(gadget.api_id().unwrap(), 9);
    }

    #[test]
    fn open_layout_keeps_unknown_keys() {
        let gadget = Entity::<Gadget>::from_wire(&payload(json!({ "GadgetNum": 1, "COLOUR": "red" })))
            .unwrap();
        assert_eq!(gadget.text("colour").unwrap(), "red");
    }

    impl Gadget {
        const LAYOUT_READER: Reader = Reader::new("Gadget").with_overrides(GADGET_OVERRIDES);
    }
}
