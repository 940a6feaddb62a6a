//! Attribute descriptors, resource definitions and entities.
//!
//! Unique responsibility: translate between one API payload and one local
//! entity.
//!
//! Every resource type implements [`Resource`], naming its endpoints and its
//! [`Layout`]:
//! - [`Layout::Schema`]: a closed list of [`AttrSpec`]s. Each wire key is
//!   mapped, converted and, when savable, written back on update.
//! - [`Layout::Rules`]: an open [`Reader`] that derives local names from the
//!   wire keys themselves. Unknown keys are kept.
//!
//! An [`Entity`] mirrors the last-known server state of one instance. There is
//! no identity map: every lookup builds fresh entities.

use std::{collections::BTreeMap, fmt, marker::PhantomData};

use serde_json::Value;

use crate::{
    linode_error::LinodeError,
    linode_reader::Reader,
    linode_transport::{Action, Params, Payload},
    linode_value::{AttrValue, Conversion, ValueKind},
};

// ============================================================================
// Attribute descriptors
// ============================================================================

/// Wire value used when an optional key is absent from a payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WireDefault {
    /// `null`
    Null,
    /// An integer.
    Int(i64),
    /// A string.
    Text(&'static str),
    /// A boolean.
    Bool(bool),
}

impl WireDefault {
    fn to_json(self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Int(i) => Value::from(i),
            Self::Text(s) => Value::from(s),
            Self::Bool(b) => Value::Bool(b),
        }
    }
}

/// How one attribute maps between the API and the local entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttrSpec {
    /// Local attribute name, e.g. `requires_pvops`.
    pub local_name: &'static str,
    /// Key in API payloads, e.g. `REQUIRESPVOPSKERNEL`.
    pub wire_name: &'static str,
    /// Conversion applied when reading.
    pub local_type: Conversion,
    /// Conversion applied when writing.
    pub wire_type: Conversion,
    /// Parameter name used on update; `None` keeps the attribute out of saves.
    pub update_as: Option<&'static str>,
    /// Only save the attribute while its value has this kind.
    pub update_only_if: Option<ValueKind>,
    /// Whether the key may be missing from payloads.
    pub may_be_absent: bool,
    /// Value used when the key is missing.
    pub default: WireDefault,
}

impl AttrSpec {
    /// Read-only attribute with explicit conversions.
    #[must_use]
    pub const fn new(
        local_name: &'static str,
        wire_name: &'static str,
        local_type: Conversion,
        wire_type: Conversion,
    ) -> Self {
        Self {
            local_name,
            wire_name,
            local_type,
            wire_type,
            update_as: None,
            update_only_if: None,
            may_be_absent: false,
            default: WireDefault::Null,
        }
    }

    /// Integer attribute.
    #[must_use]
    pub const fn int(local_name: &'static str, wire_name: &'static str) -> Self {
        Self::new(local_name, wire_name, Conversion::Int, Conversion::Int)
    }

    /// Text attribute.
    #[must_use]
    pub const fn text(local_name: &'static str, wire_name: &'static str) -> Self {
        Self::new(local_name, wire_name, Conversion::Text, Conversion::Text)
    }

    /// Boolean attribute sent to the API as `0`/`1`.
    #[must_use]
    pub const fn flag(local_name: &'static str, wire_name: &'static str) -> Self {
        Self::new(local_name, wire_name, Conversion::Bool, Conversion::Int)
    }

    /// Save the attribute under `param`.
    #[must_use]
    pub const fn update_as(self, param: &'static str) -> Self {
        Self {
            update_as: Some(param),
            ..self
        }
    }

    /// Save the attribute only while its value has `kind`.
    #[must_use]
    pub const fn update_only_if(self, kind: ValueKind) -> Self {
        Self {
            update_only_if: Some(kind),
            ..self
        }
    }

    /// Tolerate payloads without this key, using `default` instead.
    #[must_use]
    pub const fn may_be_absent(self, default: WireDefault) -> Self {
        Self {
            may_be_absent: true,
            default,
            ..self
        }
    }

    /// Whether `value` would be written by a save.
    #[must_use]
    pub fn is_savable(&self, value: &AttrValue) -> bool {
        if self.update_as.is_none() {
            return false;
        }
        self.update_only_if.is_none_or(|kind| value.kind() == kind)
    }
}

// ============================================================================
// Resources
// ============================================================================

/// How a resource's payloads are translated.
#[derive(Debug, Clone, Copy)]
pub enum Layout {
    /// Closed, declared attribute list.
    Schema(&'static [AttrSpec]),
    /// Open, rule-based key translation.
    Rules(Reader),
}

/// Parent relationship of a nested resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scope {
    /// Criterion name callers use in searches, e.g. `linode_id`.
    pub criterion: &'static str,
    /// Wire parameter carrying the parent id, e.g. `linodeid`.
    pub param: &'static str,
    /// Local attribute holding the parent id.
    pub local: &'static str,
}

/// One Linode API resource type.
pub trait Resource: Sized + 'static {
    /// Type name used in messages and display.
    const NAME: &'static str;
    /// Wire key holding the id, e.g. `LINODEID`.
    const ID_KEY: &'static str;
    /// Parameter naming the id on update/delete/list calls.
    const ID_PARAM: &'static str;
    /// Wire key used by label finders.
    const LABEL_KEY: &'static str = "LABEL";
    /// List action.
    const LIST: Action;
    /// Update action, if the resource can be saved.
    const UPDATE: Option<Action> = None;
    /// Delete action, if the resource can be destroyed.
    const DELETE: Option<Action> = None;
    /// Parent relationship, if the resource is nested.
    const SCOPE: Option<Scope> = None;
    /// Payload translation.
    const LAYOUT: Layout;
}

// ============================================================================
// Entities
// ============================================================================

/// In-memory mirror of one remote resource instance.
pub struct Entity<R> {
    attrs: BTreeMap<String, AttrValue>,
    _resource: PhantomData<fn() -> R>,
}

impl<R> Clone for Entity<R> {
    fn clone(&self) -> Self {
        Self {
            attrs: self.attrs.clone(),
            _resource: PhantomData,
        }
    }
}

impl<R: Resource> fmt::Debug for Entity<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(R::NAME).field("attrs", &self.attrs).finish()
    }
}

impl<R: Resource> fmt::Display for Entity<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = R::NAME;
        if let Some(label) = self.attrs.get("label") {
            write!(f, "<{name} label='{label}'>")
        } else if let Some(location) = self.attrs.get("location") {
            write!(f, "<{name} location='{location}'>")
        } else if let Some(id) = self.attrs.get("api_id") {
            write!(f, "<{name} api_id={id}>")
        } else {
            write!(f, "<{name} object>")
        }
    }
}

impl<R: Resource> Entity<R> {
    pub(crate) const fn blank() -> Self {
        Self {
            attrs: BTreeMap::new(),
            _resource: PhantomData,
        }
    }

    /// Build an entity from one API payload.
    ///
    /// Either every attribute translates or no entity is returned.
    ///
    /// # Errors
    ///
    /// Returns [`LinodeError::MissingField`] when a required key is absent,
    /// or [`LinodeError::InvalidField`] when a value does not convert.
    pub fn from_wire(payload: &Payload) -> Result<Self, LinodeError> {
        match R::LAYOUT {
            Layout::Schema(specs) => {
                let mut entity = Self::blank();
                for spec in specs {
                    let value = match payload.get(spec.wire_name) {
                        Some(v) => spec.local_type.to_local(v),
                        None if spec.may_be_absent => {
                            spec.local_type.to_local(&spec.default.to_json())
                        }
                        None => {
                            return Err(LinodeError::MissingField {
                                entity: R::NAME,
                                field: spec.wire_name.to_string(),
                            });
                        }
                    }
                    .map_err(|reason| LinodeError::InvalidField {
                        entity: R::NAME,
                        field: spec.wire_name.to_string(),
                        reason,
                    })?;
                    entity.attrs.insert(spec.local_name.to_string(), value);
                }
                Ok(entity)
            }
            Layout::Rules(reader) => reader.read(payload),
        }
    }

    /// Update parameters for every savable attribute, in declaration order.
    ///
    /// # Errors
    ///
    /// Returns [`LinodeError::Unsupported`] for rule-based resources and
    /// [`LinodeError::InvalidField`] when a value cannot be sent.
    pub fn to_wire_update_params(&self) -> Result<Params, LinodeError> {
        let Layout::Schema(specs) = R::LAYOUT else {
            return Err(LinodeError::Unsupported {
                entity: R::NAME,
                operation: "saved",
            });
        };

        let mut params = Params::new();
        for spec in specs {
            let value = self.attrs.get(spec.local_name).unwrap_or(&AttrValue::Null);
            let Some(param) = spec.update_as else {
                continue;
            };
            if !spec.is_savable(value) {
                continue;
            }
            let wire = spec
                .wire_type
                .to_wire(value)
                .map_err(|reason| LinodeError::InvalidField {
                    entity: R::NAME,
                    field: spec.local_name.to_string(),
                    reason,
                })?;
            params.insert(param.to_string(), wire);
        }
        Ok(params)
    }

    /// Attribute value by local name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.get(name)
    }

    /// Every attribute, by local name.
    #[must_use]
    pub const fn attributes(&self) -> &BTreeMap<String, AttrValue> {
        &self.attrs
    }

    /// Whether `name` is an attribute this resource can carry.
    #[must_use]
    pub fn declares(name: &str) -> bool {
        match R::LAYOUT {
            Layout::Schema(specs) => specs.iter().any(|s| s.local_name == name),
            Layout::Rules(_) => true,
        }
    }

    /// Set an attribute locally. Nothing is sent until the entity is saved.
    ///
    /// # Errors
    ///
    /// Returns [`LinodeError::UnknownAttribute`] when the resource has a
    /// closed schema that does not declare `name`.
    pub fn set(&mut self, name: &str, value: impl Into<AttrValue>) -> Result<(), LinodeError> {
        if !Self::declares(name) {
            return Err(LinodeError::UnknownAttribute {
                entity: R::NAME,
                name: name.to_string(),
            });
        }
        self.attrs.insert(name.to_string(), value.into());
        Ok(())
    }

    pub(crate) fn insert(&mut self, name: String, value: AttrValue) {
        self.attrs.insert(name, value);
    }

    fn require(&self, name: &str) -> Result<&AttrValue, LinodeError> {
        self.attrs
            .get(name)
            .ok_or_else(|| LinodeError::UnknownAttribute {
                entity: R::NAME,
                name: name.to_string(),
            })
    }

    fn wrong_kind(name: &str, expected: ValueKind, found: &AttrValue) -> LinodeError {
        LinodeError::InvalidField {
            entity: R::NAME,
            field: name.to_string(),
            reason: format!("expected {expected}, found {}", found.kind()),
        }
    }

    /// Integer attribute.
    ///
    /// # Errors
    ///
    /// Returns an error if the attribute is absent or not an integer.
    pub fn int(&self, name: &str) -> Result<i64, LinodeError> {
        let value = self.require(name)?;
        value
            .as_int()
            .ok_or_else(|| Self::wrong_kind(name, ValueKind::Int, value))
    }

    /// Text attribute.
    ///
    /// # Errors
    ///
    /// Returns an error if the attribute is absent or not text.
    pub fn text(&self, name: &str) -> Result<&str, LinodeError> {
        let value = self.require(name)?;
        value
            .as_text()
            .ok_or_else(|| Self::wrong_kind(name, ValueKind::Text, value))
    }

    /// Boolean attribute.
    ///
    /// # Errors
    ///
    /// Returns an error if the attribute is absent or not a boolean.
    pub fn flag(&self, name: &str) -> Result<bool, LinodeError> {
        let value = self.require(name)?;
        value
            .as_bool()
            .ok_or_else(|| Self::wrong_kind(name, ValueKind::Bool, value))
    }

    /// The resource's API id.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity carries no integer `api_id`.
    pub fn api_id(&self) -> Result<i64, LinodeError> {
        self.int("api_id")
    }

    /// Id of the parent resource, for nested resources.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent attribute is absent or not an integer.
    pub fn parent_id(&self) -> Result<Option<i64>, LinodeError> {
        R::SCOPE.map(|scope| self.int(scope.local)).transpose()
    }

    /// Replace attributes with those of a freshly fetched copy.
    pub(crate) fn overwrite_from(&mut self, fresh: Self) {
        match R::LAYOUT {
            Layout::Schema(specs) => {
                let mut fresh = fresh.attrs;
                for spec in specs {
                    if let Some(value) = fresh.remove(spec.local_name) {
                        self.attrs.insert(spec.local_name.to_string(), value);
                    }
                }
            }
            Layout::Rules(_) => self.attrs.extend(fresh.attrs),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
pub(crate) mod tests {
    use std::collections::HashSet;

    use serde_json::json;

    use super::*;

    /// Assert that no two attributes of a schema share a wire name.
    pub(crate) fn assert_unique_wire_names<R: Resource>() {
        let Layout::Schema(specs) = R::LAYOUT else {
            panic!("{} has no schema", R::NAME);
        };
        let mut seen = HashSet::new();
        for spec in specs {
            assert!(
                seen.insert(spec.wire_name),
                "{} declares {} twice",
                R::NAME,
                spec.wire_name
            );
        }
    }

    pub(crate) fn payload(value: Value) -> Payload {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    struct Widget;

    const WIDGET_ATTRS: &[AttrSpec] = &[
        AttrSpec::int("api_id", "WIDGETID").update_as("widgetid"),
        AttrSpec::text("label", "LABEL").update_as("label"),
        AttrSpec::int("size", "SIZE"),
        AttrSpec::new("weight", "WEIGHT", Conversion::IntOrText, Conversion::Int)
            .update_as("weight")
            .update_only_if(ValueKind::Int),
        AttrSpec::flag("is_shiny", "ISSHINY").update_as("isshiny"),
        AttrSpec::text("status", "STATUS").may_be_absent(WireDefault::Text("unknown")),
    ];

    impl Resource for Widget {
        const NAME: &'static str = "Widget";
        const ID_KEY: &'static str = "WIDGETID";
        const ID_PARAM: &'static str = "widgetid";
        const LIST: Action = Action::LinodeList;
        const UPDATE: Option<Action> = Some(Action::LinodeUpdate);
        const LAYOUT: Layout = Layout::Schema(WIDGET_ATTRS);
    }

    fn widget_payload() -> Payload {
        payload(json!({
            "WIDGETID": 7,
            "LABEL": "gear",
            "SIZE": "12",
            "WEIGHT": 3,
            "ISSHINY": 1,
        }))
    }

    #[test]
    fn missing_required_key_is_reported() {
        let mut p = widget_payload();
        p.remove("SIZE");
        match Entity::<Widget>::from_wire(&p).unwrap_err() {
            LinodeError::MissingField { entity, field } => {
                assert_eq!(entity, "Widget");
                assert_eq!(field, "SIZE");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_optional_key_takes_default() {
        let widget = Entity::<Widget>::from_wire(&widget_payload()).unwrap();
        assert_eq!(widget.text("status").unwrap(), "unknown");
        assert_eq!(widget.int("size").unwrap(), 12);
        assert!(widget.flag("is_shiny").unwrap());
    }

    #[test]
    fn bad_value_fails_the_whole_entity() {
        let mut p = widget_payload();
        p.insert("SIZE".into(), json!("huge"));
        let err = Entity::<Widget>::from_wire(&p).unwrap_err();
        assert!(matches!(err, LinodeError::InvalidField { .. }));
    }

    #[test]
    fn update_params_skip_unsavable_fields() {
        let widget = Entity::<Widget>::from_wire(&widget_payload()).unwrap();
        let params = widget.to_wire_update_params().unwrap();
        let keys: Vec<&str> = params.keys().map(String::as_str).collect();
        assert_eq!(keys, ["widgetid", "label", "weight", "isshiny"]);
        assert_eq!(params["isshiny"], json!(1));
    }

    #[test]
    fn gated_field_is_skipped_when_kind_differs() {
        let mut p = widget_payload();
        p.insert("WEIGHT".into(), json!(""));
        let widget = Entity::<Widget>::from_wire(&p).unwrap();
        assert_eq!(widget.get("weight"), Some(&AttrValue::from("")));
        let params = widget.to_wire_update_params().unwrap();
        assert!(!params.contains_key("weight"));
    }

    #[test]
    fn savable_fields_round_trip() {
        let p = widget_payload();
        let widget = Entity::<Widget>::from_wire(&p).unwrap();
        let params = widget.to_wire_update_params().unwrap();
        assert_eq!(params["widgetid"], p["WIDGETID"]);
        assert_eq!(params["label"], p["LABEL"]);
        assert_eq!(params["weight"], p["WEIGHT"]);
        assert_eq!(params["isshiny"], p["ISSHINY"]);
    }

    #[test]
    fn closed_schema_rejects_unknown_attributes() {
        let mut widget = Entity::<Widget>::from_wire(&widget_payload()).unwrap();
        let err = widget.set("colour", "red").unwrap_err();
        assert!(matches!(err, LinodeError::UnknownAttribute { .. }));
        widget.set("label", "cog").unwrap();
        assert_eq!(widget.text("label").unwrap(), "cog");
    }

    #[test]
    fn typed_getter_reports_wrong_kind() {
        let widget = Entity::<Widget>::from_wire(&widget_payload()).unwrap();
        let err = widget.int("label").unwrap_err();
        assert!(matches!(err, LinodeError::InvalidField { .. }));
    }

    #[test]
    fn display_prefers_label() {
        let widget = Entity::<Widget>::from_wire(&widget_payload()).unwrap();
        assert_eq!(widget.to_string(), "<Widget label='gear'>");
    }

    #[test]
    fn widget_wire_names_are_unique() {
        assert_unique_wire_names::<Widget>();
    }

    #[test]
    fn savable_requires_update_name() {
        let spec = AttrSpec::int("size", "SIZE");
        assert!(!spec.is_savable(&AttrValue::Int(1)));
        let gated = spec.update_as("size").update_only_if(ValueKind::Int);
        assert!(gated.is_savable(&AttrValue::Int(1)));
        assert!(!gated.is_savable(&AttrValue::from("")));
    }
}
