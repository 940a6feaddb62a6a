//! Finders and searches.
//!
//! Unique responsibility: locate remote resources and build entities from
//! them.
//!
//! The Linode API has no single-resource GET for most types. Every lookup
//! lists the resource (under its parent, for nested types) and scans the
//! result in server order, so "first match" depends on the order the server
//! returns.
//!
//! Search criteria:
//! - `name=value` keeps entities whose attribute equals the value,
//! - `name_begins=prefix` / `name_ends=suffix` match text case-insensitively,
//! - the parent criterion of a nested type (e.g. `linode_id` for disks) is
//!   required and is sent to the API rather than filtered locally.

use std::{fmt, marker::PhantomData};

use crate::{
    linode_client::LinodeApi,
    linode_error::LinodeError,
    linode_model::{Entity, Resource},
    linode_transport::{Params, Payload},
    linode_value::{AttrValue, Conversion},
};

// ============================================================================
// Criteria
// ============================================================================

/// Ordered search criteria.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria(Vec<(String, AttrValue)>);

impl Criteria {
    /// No criteria: matches everything.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Require `name` to equal `value`.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.0.push((name.into(), value.into()));
        self
    }

    /// Require the text of `name` to start with `prefix`, ignoring case.
    #[must_use]
    pub fn begins(self, name: &str, prefix: &str) -> Self {
        self.with(format!("{name}_begins"), prefix)
    }

    /// Require the text of `name` to end with `suffix`, ignoring case.
    #[must_use]
    pub fn ends(self, name: &str, suffix: &str) -> Self {
        self.with(format!("{name}_ends"), suffix)
    }

    /// Remove and return the first criterion called `name`.
    pub fn take(&mut self, name: &str) -> Option<AttrValue> {
        let pos = self.0.iter().position(|(k, _)| k == name)?;
        Some(self.0.remove(pos).1)
    }

    /// Whether there are no criteria.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Criteria in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl fmt::Display for Criteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (k, v)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match v {
                AttrValue::Text(s) => write!(f, "{k}='{s}'")?,
                other => write!(f, "{k}={other}")?,
            }
        }
        f.write_str("}")
    }
}

impl<K: Into<String>, V: Into<AttrValue>> FromIterator<(K, V)> for Criteria {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

enum Filter {
    Equals(String, AttrValue),
    Begins(String, String),
    Ends(String, String),
}

impl Filter {
    fn parse(name: String, value: AttrValue) -> Self {
        if let Some(base) = name.strip_suffix("_begins") {
            return Self::Begins(base.to_string(), value.to_string().to_lowercase());
        }
        if let Some(base) = name.strip_suffix("_ends") {
            return Self::Ends(base.to_string(), value.to_string().to_lowercase());
        }
        Self::Equals(name, value)
    }

    fn attribute(&self) -> &str {
        match self {
            Self::Equals(a, _) | Self::Begins(a, _) | Self::Ends(a, _) => a,
        }
    }

    fn matches<R: Resource>(&self, entity: &Entity<R>) -> bool {
        let Some(actual) = entity.get(self.attribute()) else {
            return false;
        };
        match self {
            Self::Equals(_, expected) => actual == expected,
            Self::Begins(_, prefix) => actual.to_string().to_lowercase().starts_with(prefix),
            Self::Ends(_, suffix) => actual.to_string().to_lowercase().ends_with(suffix),
        }
    }
}

// ============================================================================
// Finder
// ============================================================================

/// Raw payload lookups for one resource type.
pub struct Finder<'a, R> {
    api: &'a LinodeApi,
    parent_id: Option<i64>,
    _resource: PhantomData<fn() -> R>,
}

impl<'a, R: Resource> Finder<'a, R> {
    /// Finder for a top-level resource.
    #[must_use]
    pub const fn new(api: &'a LinodeApi) -> Self {
        Self {
            api,
            parent_id: None,
            _resource: PhantomData,
        }
    }

    /// Finder for a nested resource under `parent_id`.
    #[must_use]
    pub const fn within(api: &'a LinodeApi, parent_id: i64) -> Self {
        Self {
            api,
            parent_id: Some(parent_id),
            _resource: PhantomData,
        }
    }

    fn list_params(&self) -> Result<Params, LinodeError> {
        let mut params = Params::new();
        if let Some(scope) = R::SCOPE {
            let parent_id = self.parent_id.ok_or(LinodeError::MissingParameter {
                operation: R::LIST.as_str(),
                param: scope.criterion,
            })?;
            params.insert(scope.param.to_string(), parent_id.into());
        }
        Ok(params)
    }

    /// Every payload of this resource type, in server order.
    ///
    /// # Errors
    ///
    /// Returns an error if a nested resource has no parent id or the call fails.
    pub async fn list_all(&self) -> Result<Vec<Payload>, LinodeError> {
        let params = self.list_params()?;
        let payloads = self.api.list(R::LIST, &params).await?;
        tracing::debug!(
            resource = R::NAME,
            parent_id = ?self.parent_id,
            count = payloads.len(),
            "listed resources"
        );
        Ok(payloads)
    }

    /// The payload whose id key equals `id`.
    ///
    /// # Errors
    ///
    /// Returns [`LinodeError::NotFound`] if there is none.
    pub async fn find_by_id(&self, id: i64) -> Result<Payload, LinodeError> {
        self.first(|p| payload_int(p, R::ID_KEY) == Some(id))
            .await?
            .ok_or_else(|| LinodeError::NotFound {
                entity: R::NAME,
                lookup: format!("API ID {id}"),
            })
    }

    /// The first payload whose label equals `label`.
    ///
    /// # Errors
    ///
    /// Returns [`LinodeError::NotFound`] if there is none.
    pub async fn find_by_label(&self, label: &str) -> Result<Payload, LinodeError> {
        self.first(|p| payload_text(p, R::LABEL_KEY).as_deref() == Some(label))
            .await?
            .ok_or_else(|| LinodeError::NotFound {
                entity: R::NAME,
                lookup: format!("label '{label}'"),
            })
    }

    /// The first payload whose label starts with `prefix`.
    ///
    /// # Errors
    ///
    /// Returns [`LinodeError::NotFound`] if there is none.
    pub async fn find_by_label_prefix(
        &self,
        prefix: &str,
        ignore_case: bool,
    ) -> Result<Payload, LinodeError> {
        let wanted = if ignore_case {
            prefix.to_lowercase()
        } else {
            prefix.to_string()
        };
        self.first(|p| {
            payload_text(p, R::LABEL_KEY).is_some_and(|label| {
                if ignore_case {
                    label.to_lowercase().starts_with(&wanted)
                } else {
                    label.starts_with(&wanted)
                }
            })
        })
        .await?
        .ok_or_else(|| LinodeError::NotFound {
            entity: R::NAME,
            lookup: format!("label beginning '{prefix}'"),
        })
    }

    async fn first(
        &self,
        pred: impl Fn(&Payload) -> bool + Send,
    ) -> Result<Option<Payload>, LinodeError> {
        Ok(self.list_all().await?.into_iter().find(|p| pred(p)))
    }
}

fn payload_int(payload: &Payload, key: &str) -> Option<i64> {
    payload
        .get(key)
        .and_then(|v| Conversion::Int.to_local(v).ok())
        .and_then(|v| v.as_int())
}

fn payload_text(payload: &Payload, key: &str) -> Option<String> {
    payload
        .get(key)
        .and_then(|v| Conversion::Text.to_local(v).ok())
        .and_then(|v| v.as_text().map(str::to_string))
}

// ============================================================================
// Entity-level lookups
// ============================================================================

impl LinodeApi {
    /// Every entity of type `R` matching `criteria`.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent criterion of a nested type is missing,
    /// a criterion names an undeclared attribute, or the call fails.
    pub async fn search<R: Resource>(
        &self,
        mut criteria: Criteria,
    ) -> Result<Vec<Entity<R>>, LinodeError> {
        let parent_id = match R::SCOPE {
            Some(scope) => {
                let value = criteria.take(scope.criterion).ok_or(LinodeError::MissingParameter {
                    operation: R::LIST.as_str(),
                    param: scope.criterion,
                })?;
                Some(value.as_int().ok_or_else(|| LinodeError::InvalidParameter {
                    operation: R::LIST.as_str(),
                    param: scope.criterion,
                    reason: format!("expected an id, found {value}"),
                })?)
            }
            None => None,
        };

        let filters: Vec<Filter> = criteria
            .0
            .into_iter()
            .map(|(name, value)| Filter::parse(name, value))
            .collect();
        for filter in &filters {
            if !Entity::<R>::declares(filter.attribute()) {
                return Err(LinodeError::UnknownAttribute {
                    entity: R::NAME,
                    name: filter.attribute().to_string(),
                });
            }
        }

        let finder = parent_id.map_or_else(|| Finder::<R>::new(self), |id| Finder::within(self, id));
        let mut found = Vec::new();
        for payload in finder.list_all().await? {
            let entity = Entity::<R>::from_wire(&payload)?;
            if filters.iter().all(|f| f.matches(&entity)) {
                found.push(entity);
            }
        }
        Ok(found)
    }

    /// The single entity of type `R` matching `criteria`.
    ///
    /// # Errors
    ///
    /// Returns [`LinodeError::NoMatch`] or [`LinodeError::MultipleMatches`]
    /// unless exactly one entity matches.
    pub async fn find<R: Resource>(&self, criteria: Criteria) -> Result<Entity<R>, LinodeError> {
        let rendered = criteria.to_string();
        let mut found = self.search::<R>(criteria).await?;
        match found.len() {
            0 => Err(LinodeError::NoMatch {
                entity: R::NAME,
                criteria: rendered,
            }),
            1 => found.pop().ok_or(LinodeError::EmptyResponse),
            count => Err(LinodeError::MultipleMatches {
                entity: R::NAME,
                criteria: rendered,
                count,
            }),
        }
    }

    /// The entity of type `R` with the given id (under `parent_id` for nested
    /// types).
    ///
    /// # Errors
    ///
    /// Returns [`LinodeError::NotFound`] if no such entity exists.
    pub async fn fetch<R: Resource>(
        &self,
        parent_id: Option<i64>,
        id: i64,
    ) -> Result<Entity<R>, LinodeError> {
        let finder = parent_id.map_or_else(|| Finder::<R>::new(self), |p| Finder::within(self, p));
        Entity::from_wire(&finder.find_by_id(id).await?)
    }

    /// Re-fetch `entity` and overwrite its attributes in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity no longer exists or the call fails.
    pub async fn refresh<R: Resource>(&self, entity: &mut Entity<R>) -> Result<(), LinodeError> {
        let fresh = self.fetch::<R>(entity.parent_id()?, entity.api_id()?).await?;
        entity.overwrite_from(fresh);
        Ok(())
    }
}
