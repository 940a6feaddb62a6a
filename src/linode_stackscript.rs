//! Stackscripts (`stackscript.*`) and their deployment input.
//!
//! A stackscript runs on first boot of a disk deployed from a distribution.
//! Its user-defined fields (UDFs) are answered with a JSON object built by
//! [`StackscriptInput`].

use serde_json::{Map, Value};

use crate::{
    linode_client::LinodeApi,
    linode_distribution::Distribution,
    linode_error::LinodeError,
    linode_finder::Criteria,
    linode_model::{AttrSpec, Entity, Layout, Resource},
    linode_saver::require_text,
    linode_transport::{Action, Params},
};

/// A deployment script.
pub struct Stackscript;

const STACKSCRIPT_ATTRS: &[AttrSpec] = &[
    AttrSpec::int("api_id", "STACKSCRIPTID").update_as("stackscriptid"),
    AttrSpec::text("distribution_id_list", "DISTRIBUTIONIDLIST").update_as("distributionidlist"),
    AttrSpec::text("label", "LABEL").update_as("label"),
    AttrSpec::text("description", "DESCRIPTION").update_as("description"),
    AttrSpec::text("script", "SCRIPT").update_as("script"),
    AttrSpec::flag("is_public", "ISPUBLIC").update_as("ispublic"),
    AttrSpec::text("rev_note", "REV_NOTE").update_as("rev_note"),
    // server-side bookkeeping
    AttrSpec::int("latest_rev", "LATESTREV"),
    AttrSpec::text("rev_dt", "REV_DT"),
    AttrSpec::text("create_dt", "CREATE_DT"),
    AttrSpec::int("user_id", "USERID"),
    AttrSpec::int("deployments_active", "DEPLOYMENTSACTIVE"),
    AttrSpec::int("deployments_total", "DEPLOYMENTSTOTAL"),
];

impl Resource for Stackscript {
    const NAME: &'static str = "Stackscript";
    const ID_KEY: &'static str = "STACKSCRIPTID";
    const ID_PARAM: &'static str = "stackscriptid";
    const LIST: Action = Action::StackscriptList;
    const UPDATE: Option<Action> = Some(Action::StackscriptUpdate);
    const DELETE: Option<Action> = Some(Action::StackscriptDelete);
    const LAYOUT: Layout = Layout::Schema(STACKSCRIPT_ATTRS);
}

fn join_ids(ids: &[i64]) -> String {
    ids.iter().map(i64::to_string).collect::<Vec<_>>().join(",")
}

/// Parameters for [`Stackscript::create`].
#[derive(Debug, Clone)]
pub struct StackscriptCreate {
    /// Script label.
    pub label: String,
    /// Distributions the script may be deployed with. Must not be empty.
    pub distribution_ids: Vec<i64>,
    /// Script body, starting with its shebang.
    pub script: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Publish the script to every Linode customer.
    pub is_public: Option<bool>,
    /// Note for this revision.
    pub rev_note: Option<String>,
}

impl StackscriptCreate {
    /// A private script with the required fields set.
    #[must_use]
    pub fn new(label: impl Into<String>, distribution_ids: Vec<i64>, script: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            distribution_ids,
            script: script.into(),
            description: None,
            is_public: None,
            rev_note: None,
        }
    }
}

impl Stackscript {
    /// Create a stackscript and return it.
    ///
    /// # Errors
    ///
    /// Returns [`LinodeError::MissingParameter`] when the label, script or
    /// distribution list is empty, or the error of the create or lookup call.
    pub async fn create(api: &LinodeApi, request: StackscriptCreate) -> Result<Entity<Self>, LinodeError> {
        require_text(Action::StackscriptCreate, "label", &request.label)?;
        require_text(Action::StackscriptCreate, "script", &request.script)?;
        if request.distribution_ids.is_empty() {
            return Err(LinodeError::MissingParameter {
                operation: Action::StackscriptCreate.as_str(),
                param: "distribution_ids",
            });
        }

        let mut params = Params::new();
        params.insert("label".into(), request.label.into());
        params.insert("distributionidlist".into(), join_ids(&request.distribution_ids).into());
        params.insert("script".into(), request.script.into());
        let optional = [
            ("description", request.description.map(Value::from)),
            ("ispublic", request.is_public.map(|public| Value::from(i64::from(public)))),
            ("rev_note", request.rev_note.map(Value::from)),
        ];
        for (name, value) in optional {
            if let Some(value) = value {
                params.insert(name.into(), value);
            }
        }

        api.create_then_fetch(Action::StackscriptCreate, &params, "StackScriptID", None)
            .await
    }
}

impl Entity<Stackscript> {
    /// Ids of the distributions the script supports, in stored order.
    ///
    /// # Errors
    ///
    /// Returns [`LinodeError::InvalidField`] if the stored list holds
    /// something other than ids.
    pub fn distribution_ids(&self) -> Result<Vec<i64>, LinodeError> {
        self.text("distribution_id_list")?
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| {
                id.parse::<i64>().map_err(|_| LinodeError::InvalidField {
                    entity: Stackscript::NAME,
                    field: "distribution_id_list".to_string(),
                    reason: format!("'{id}' is not a distribution id"),
                })
            })
            .collect()
    }

    /// Replace the supported distributions locally. Saved with the entity.
    ///
    /// # Errors
    ///
    /// Never fails for a stackscript; the error comes from the shared setter.
    pub fn set_distribution_ids(&mut self, ids: &[i64]) -> Result<(), LinodeError> {
        self.set("distribution_id_list", join_ids(ids))
    }

    /// The supported distributions, fetched on every call.
    ///
    /// Ids the API no longer lists are skipped.
    ///
    /// # Errors
    ///
    /// Returns the error of the list call or a malformed id list.
    pub async fn distributions(&self, api: &LinodeApi) -> Result<Vec<Entity<Distribution>>, LinodeError> {
        let ids = self.distribution_ids()?;
        let mut all = api.search::<Distribution>(Criteria::new()).await?;

        let mut found = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(at) = all.iter().position(|d| d.api_id().ok() == Some(id)) {
                found.push(all.swap_remove(at));
            }
        }
        Ok(found)
    }
}

/// Answers to a stackscript's user-defined fields, kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StackscriptInput {
    responses: Map<String, Value>,
}

impl StackscriptInput {
    /// No answers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an answer, builder style.
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.add_input(name, value);
        self
    }

    /// Add or replace an answer.
    pub fn add_input(&mut self, name: &str, value: impl Into<Value>) {
        self.responses.insert(name.to_string(), value.into());
    }

    /// Answers as the JSON object the API expects.
    ///
    /// # Errors
    ///
    /// Returns [`LinodeError::Json`] if serialization fails.
    pub fn to_json_string(&self) -> Result<String, LinodeError> {
        Ok(serde_json::to_string(&self.responses)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{linode_model::tests::assert_unique_wire_names, testing::MockTransport};

    fn stackscript_list() -> Value {
        json!([{
            "STACKSCRIPTID": 7,
            "DISTRIBUTIONIDLIST": "130,89",
            "LABEL": "lamp",
            "DESCRIPTION": "Apache, MySQL and PHP",
            "SCRIPT": "#!/bin/bash\n# <UDF name=\"db_password\" Label=\"MySQL password\" />",
            "ISPUBLIC": 0,
            "REV_NOTE": "Initial import",
            "LATESTREV": 3,
            "REV_DT": "2013-01-01 00:00:00.0",
            "CREATE_DT": "2013-01-01 00:00:00.0",
            "USERID": 42,
            "DEPLOYMENTSACTIVE": 1,
            "DEPLOYMENTSTOTAL": 5,
        }])
    }

    #[test]
    fn wire_names_are_unique() {
        assert_unique_wire_names::<Stackscript>();
    }

    #[test]
    fn input_keeps_insertion_order() {
        let mut input = StackscriptInput::new().with("user", "admin").with("port", 8080);
        input.add_input("db_password", "hunter2");
        assert_eq!(
            input.to_json_string().unwrap(),
            r#"{"user":"admin","port":8080,"db_password":"hunter2"}"#
        );
        assert_eq!(StackscriptInput::default().to_json_string().unwrap(), "{}");
    }

    #[tokio::test]
    async fn create_requires_a_distribution() {
        let mock = MockTransport::new();
        let api = mock.api();

        let err = Stackscript::create(&api, StackscriptCreate::new("lamp", Vec::new(), "#!/bin/bash"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LinodeError::MissingParameter { param: "distribution_ids", .. }
        ));

        let err = Stackscript::create(&api, StackscriptCreate::new("lamp", vec![130], ""))
            .await
            .unwrap_err();
        assert!(matches!(err, LinodeError::MissingParameter { param: "script", .. }));
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn create_joins_distribution_ids() {
        let mock = MockTransport::new();
        mock.respond(Action::StackscriptCreate, json!({ "StackScriptID": 7 }));
        mock.respond(Action::StackscriptList, stackscript_list());
        let api = mock.api();

        let script = Stackscript::create(
            &api,
            StackscriptCreate {
                is_public: Some(false),
                ..StackscriptCreate::new("lamp", vec![130, 89], "#!/bin/bash")
            },
        )
        .await
        .unwrap();
        assert_eq!(script.distribution_ids().unwrap(), [130, 89]);

        let sent = mock.last_params(Action::StackscriptCreate);
        assert_eq!(sent["distributionidlist"], json!("130,89"));
        assert_eq!(sent["ispublic"], json!(0));
        assert!(!sent.contains_key("description"));
    }

    #[tokio::test]
    async fn distributions_follow_the_stored_order() {
        let mock = MockTransport::new();
        mock.respond(Action::StackscriptList, stackscript_list());
        mock.respond(
            Action::AvailDistributions,
            json!([
                { "DISTRIBUTIONID": 89, "LABEL": "CentOS 6.2", "CREATE_DT": "2012-01-27 00:00:00.0",
                  "MINIMAGESIZE": 800, "IS64BIT": 1, "REQUIRESPVOPSKERNEL": 1 },
                { "DISTRIBUTIONID": 130, "LABEL": "Debian 7", "CREATE_DT": "2013-05-08 11:31:32.0",
                  "MINIMAGESIZE": 600, "IS64BIT": 1, "REQUIRESPVOPSKERNEL": 1 },
            ]),
        );
        let api = mock.api();

        let script = api.find::<Stackscript>(Criteria::new()).await.unwrap();
        let labels: Vec<String> = script
            .distributions(&api)
            .await
            .unwrap()
            .iter()
            .map(|d| d.text("label").unwrap().to_string())
            .collect();
        assert_eq!(labels, ["Debian 7", "CentOS 6.2"]);
    }

    #[tokio::test]
    async fn saving_sends_edited_distribution_list() {
        let mock = MockTransport::new();
        mock.respond(Action::StackscriptList, stackscript_list());
        mock.respond(Action::StackscriptUpdate, json!({ "StackScriptID": 7 }));
        let api = mock.api();

        let mut script = api.find::<Stackscript>(Criteria::new()).await.unwrap();
        script.set_distribution_ids(&[130]).unwrap();
        script.set("is_public", true).unwrap();
        api.save(&script).await.unwrap();

        let sent = mock.last_params(Action::StackscriptUpdate);
        assert_eq!(sent["distributionidlist"], json!("130"));
        assert_eq!(sent["ispublic"], json!(1));
        assert!(!sent.contains_key("deployments_total"));
    }
}
