//! DNS zones and their records (`domain.*`, `domain.resource.*`).
//!
//! Unique responsibility: manage hosted zones and the records inside them.
//!
//! Zone transfer lists (`MASTER_IPS`, `AXFR_IPS`) travel as one
//! semicolon-separated string. They are kept raw on the entity and decoded on
//! demand by `master_ips` and friends.

use serde_json::Value;

use crate::{
    linode_client::LinodeApi,
    linode_error::LinodeError,
    linode_finder::Criteria,
    linode_model::{AttrSpec, Entity, Layout, Resource, Scope},
    linode_saver::require_text,
    linode_transport::{Action, Params},
    linode_value::{Conversion, ValueKind},
};

// ============================================================================
// Domains
// ============================================================================

/// A DNS zone.
pub struct Domain;

const DOMAIN_ATTRS: &[AttrSpec] = &[
    AttrSpec::int("api_id", "DOMAINID").update_as("domainid"),
    AttrSpec::text("domain", "DOMAIN").update_as("domain"),
    AttrSpec::text("description", "DESCRIPTION").update_as("description"),
    AttrSpec::text("zone_type", "TYPE").update_as("type"),
    AttrSpec::text("soa_email", "SOA_EMAIL").update_as("soa_email"),
    AttrSpec::int("refresh_sec", "REFRESH_SEC").update_as("refresh_sec"),
    AttrSpec::int("retry_sec", "RETRY_SEC").update_as("retry_sec"),
    AttrSpec::int("expire_sec", "EXPIRE_SEC").update_as("expire_sec"),
    AttrSpec::int("ttl_sec", "TTL_SEC").update_as("ttl_sec"),
    AttrSpec::int("status", "STATUS").update_as("status"),
    AttrSpec::text("master_ips_str", "MASTER_IPS").update_as("master_ips"),
    AttrSpec::text("axfr_ips_str", "AXFR_IPS").update_as("axfr_ips"),
];

impl Resource for Domain {
    const NAME: &'static str = "Domain";
    const ID_KEY: &'static str = "DOMAINID";
    const ID_PARAM: &'static str = "domainid";
    const LABEL_KEY: &'static str = "DOMAIN";
    const LIST: Action = Action::DomainList;
    const UPDATE: Option<Action> = Some(Action::DomainUpdate);
    const DELETE: Option<Action> = Some(Action::DomainDelete);
    const LAYOUT: Layout = Layout::Schema(DOMAIN_ATTRS);
}

/// Encode an IP list the way the API stores it.
#[must_use]
pub fn encode_ip_list<S: AsRef<str>>(ips: &[S]) -> String {
    ips.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(";")
}

/// Decode an API IP list. Blank lists come back as `""`, `none` or `"none"`.
#[must_use]
pub fn decode_ip_list(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    if matches!(raw, "" | "none" | "\"none\"") {
        return Vec::new();
    }
    raw.trim_end_matches(';')
        .split(';')
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
        .collect()
}

impl Domain {
    /// Create a zone and return it.
    ///
    /// # Errors
    ///
    /// Returns [`LinodeError::MissingParameter`] for a master zone without
    /// `soa_email`, or the error of the create or lookup call.
    pub async fn create(
        api: &LinodeApi,
        domain: &str,
        zone_type: &str,
        soa_email: Option<&str>,
    ) -> Result<Entity<Self>, LinodeError> {
        let mut params = Params::new();
        params.insert("domain".into(), domain.into());
        params.insert("type".into(), zone_type.into());
        match soa_email {
            Some(email) => {
                params.insert("soa_email".into(), email.into());
            }
            None if zone_type.eq_ignore_ascii_case("master") => {
                return Err(LinodeError::MissingParameter {
                    operation: Action::DomainCreate.as_str(),
                    param: "soa_email",
                });
            }
            None => {}
        }
        api.create_then_fetch(Action::DomainCreate, &params, "DomainID", None)
            .await
    }
}

/// Parameters for `Entity<Domain>::add_record`.
#[derive(Debug, Clone)]
pub struct RecordCreate {
    /// Record type (`A`, `AAAA`, `CNAME`, `MX`, `TXT`, `SRV`, ...).
    pub record_type: String,
    /// Host name, relative to the zone.
    pub name: Option<String>,
    /// Address, host or text the record points at.
    pub target: Option<String>,
    /// MX and SRV priority.
    pub priority: Option<i64>,
    /// SRV weight.
    pub weight: Option<i64>,
    /// SRV port.
    pub port: Option<i64>,
    /// SRV protocol.
    pub protocol: Option<String>,
    /// Time to live, in seconds.
    pub ttl_sec: Option<i64>,
}

impl RecordCreate {
    /// A record of `record_type` with every other field left to the API.
    #[must_use]
    pub fn new(record_type: impl Into<String>) -> Self {
        Self {
            record_type: record_type.into(),
            name: None,
            target: None,
            priority: None,
            weight: None,
            port: None,
            protocol: None,
            ttl_sec: None,
        }
    }
}

impl Entity<Domain> {
    fn ip_list(&self, name: &str) -> Result<Vec<String>, LinodeError> {
        Ok(decode_ip_list(self.text(name)?))
    }

    /// Master servers of a slave zone.
    ///
    /// # Errors
    ///
    /// Returns an error if the raw list is not text.
    pub fn master_ips(&self) -> Result<Vec<String>, LinodeError> {
        self.ip_list("master_ips_str")
    }

    /// Replace the master servers locally. Saved with the entity.
    ///
    /// # Errors
    ///
    /// Never fails for a domain; the error comes from the shared setter.
    pub fn set_master_ips<S: AsRef<str>>(&mut self, ips: &[S]) -> Result<(), LinodeError> {
        self.set("master_ips_str", encode_ip_list(ips))
    }

    /// Hosts allowed to transfer the zone.
    ///
    /// # Errors
    ///
    /// Returns an error if the raw list is not text.
    pub fn axfr_ips(&self) -> Result<Vec<String>, LinodeError> {
        self.ip_list("axfr_ips_str")
    }

    /// Replace the transfer hosts locally. Saved with the entity.
    ///
    /// # Errors
    ///
    /// Never fails for a domain; the error comes from the shared setter.
    pub fn set_axfr_ips<S: AsRef<str>>(&mut self, ips: &[S]) -> Result<(), LinodeError> {
        self.set("axfr_ips_str", encode_ip_list(ips))
    }

    fn records_criteria(&self, criteria: Criteria) -> Result<Criteria, LinodeError> {
        Ok(criteria.with(RECORD_SCOPE.criterion, self.api_id()?))
    }

    /// Records of the zone matching `criteria`.
    ///
    /// # Errors
    ///
    /// Returns the error of the list call or an unknown criterion.
    pub async fn search_records(
        &self,
        api: &LinodeApi,
        criteria: Criteria,
    ) -> Result<Vec<Entity<Record>>, LinodeError> {
        api.search::<Record>(self.records_criteria(criteria)?).await
    }

    /// The single record of the zone matching `criteria`.
    ///
    /// # Errors
    ///
    /// Returns [`LinodeError::NoMatch`] or [`LinodeError::MultipleMatches`]
    /// unless exactly one record matches.
    pub async fn find_record(
        &self,
        api: &LinodeApi,
        criteria: Criteria,
    ) -> Result<Entity<Record>, LinodeError> {
        api.find::<Record>(self.records_criteria(criteria)?).await
    }

    /// Add a record to the zone and return it.
    ///
    /// # Errors
    ///
    /// Returns [`LinodeError::MissingParameter`] for a blank record type, or
    /// the error of the create or lookup call.
    pub async fn add_record(
        &self,
        api: &LinodeApi,
        request: RecordCreate,
    ) -> Result<Entity<Record>, LinodeError> {
        require_text(Action::DomainResourceCreate, "record_type", &request.record_type)?;
        let domain_id = self.api_id()?;

        let mut params = Params::new();
        params.insert("domainid".into(), domain_id.into());
        params.insert("type".into(), request.record_type.into());
        let optional = [
            ("name", request.name.map(Value::from)),
            ("target", request.target.map(Value::from)),
            ("priority", request.priority.map(Value::from)),
            ("weight", request.weight.map(Value::from)),
            ("port", request.port.map(Value::from)),
            ("protocol", request.protocol.map(Value::from)),
            ("ttl_sec", request.ttl_sec.map(Value::from)),
        ];
        for (name, value) in optional {
            if let Some(value) = value {
                params.insert(name.into(), value);
            }
        }

        api.create_then_fetch(Action::DomainResourceCreate, &params, "ResourceID", Some(domain_id))
            .await
    }
}

// ============================================================================
// Records
// ============================================================================

/// A record inside a DNS zone. Created through `Entity<Domain>::add_record`.
pub struct Record;

const RECORD_SCOPE: Scope = Scope {
    criterion: "domain",
    param: "domainid",
    local: "domain_id",
};

const RECORD_ATTRS: &[AttrSpec] = &[
    AttrSpec::int("api_id", "RESOURCEID").update_as("resourceid"),
    AttrSpec::int("domain_id", "DOMAINID").update_as("domainid"),
    AttrSpec::text("record_type", "TYPE"),
    AttrSpec::text("name", "NAME").update_as("name"),
    AttrSpec::text("target", "TARGET").update_as("target"),
    // blank outside MX/SRV records
    AttrSpec::new("priority", "PRIORITY", Conversion::IntOrText, Conversion::Int)
        .update_as("priority")
        .update_only_if(ValueKind::Int),
    AttrSpec::new("weight", "WEIGHT", Conversion::IntOrText, Conversion::Int)
        .update_as("weight")
        .update_only_if(ValueKind::Int),
    AttrSpec::new("port", "PORT", Conversion::IntOrText, Conversion::Int)
        .update_as("port")
        .update_only_if(ValueKind::Int),
    AttrSpec::int("ttl_sec", "TTL_SEC").update_as("ttl_sec"),
];

impl Resource for Record {
    const NAME: &'static str = "Record";
    const ID_KEY: &'static str = "RESOURCEID";
    const ID_PARAM: &'static str = "resourceid";
    const LABEL_KEY: &'static str = "NAME";
    const LIST: Action = Action::DomainResourceList;
    const UPDATE: Option<Action> = Some(Action::DomainResourceUpdate);
    const DELETE: Option<Action> = Some(Action::DomainResourceDelete);
    const SCOPE: Option<Scope> = Some(RECORD_SCOPE);
    const LAYOUT: Layout = Layout::Schema(RECORD_ATTRS);
}

impl Entity<Record> {
    /// The zone holding the record, fetched on every call.
    ///
    /// # Errors
    ///
    /// Returns the error of the lookup.
    pub async fn domain(&self, api: &LinodeApi) -> Result<Entity<Domain>, LinodeError> {
        api.fetch::<Domain>(None, self.int("domain_id")?).await
    }
}
