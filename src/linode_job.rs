//! Linode jobs.
//!
//! Unique responsibility: track asynchronous operations the API runs on a
//! Linode (boot, shutdown, disk creation, ...) until they finish.
//!
//! A job's `HOST_SUCCESS` is blank while it runs, then `1` on success or `0`
//! on failure. Waiting re-fetches the job at a fixed interval; there is no
//! backoff and no way to stop early other than the timeout.

use std::time::Duration;

use crate::{
    linode_client::LinodeApi,
    linode_error::LinodeError,
    linode_model::{Entity, Layout, Resource, Scope},
    linode_reader::Reader,
    linode_transport::Action,
    linode_value::AttrValue,
};

/// Default time a job is given to finish.
pub const DEFAULT_JOB_TIMEOUT: Duration = Duration::from_secs(120);

/// Default delay between two job polls.
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(5);

/// A job on a Linode.
pub struct Job;

impl Resource for Job {
    const NAME: &'static str = "Job";
    const ID_KEY: &'static str = "JOBID";
    const ID_PARAM: &'static str = "jobid";
    const LIST: Action = Action::JobList;
    const SCOPE: Option<Scope> = Some(Scope {
        criterion: "linode_id",
        param: "linodeid",
        local: "linode_id",
    });
    const LAYOUT: Layout = Layout::Rules(Reader::new("Job"));
}

/// Completion state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    /// Still running.
    Pending,
    /// Finished successfully.
    Succeeded,
    /// Finished with an error.
    Failed,
}

impl JobStatus {
    /// Status encoded by a `HOST_SUCCESS` value.
    #[must_use]
    pub fn from_host_success(value: Option<&AttrValue>) -> Self {
        match value {
            Some(AttrValue::Int(1)) | Some(AttrValue::Bool(true)) => Self::Succeeded,
            Some(AttrValue::Int(0)) | Some(AttrValue::Bool(false)) => Self::Failed,
            Some(AttrValue::Text(s)) => match s.trim() {
                "1" => Self::Succeeded,
                "0" => Self::Failed,
                _ => Self::Pending,
            },
            _ => Self::Pending,
        }
    }
}

impl Job {
    /// Fetch one job of a Linode.
    ///
    /// # Errors
    ///
    /// Returns [`LinodeError::NotFound`] if the Linode has no such job.
    pub async fn find(api: &LinodeApi, linode_id: i64, job_id: i64) -> Result<Entity<Self>, LinodeError> {
        api.fetch::<Self>(Some(linode_id), job_id).await
    }
}

impl Entity<Job> {
    /// Current completion state.
    #[must_use]
    pub fn status(&self) -> JobStatus {
        JobStatus::from_host_success(self.get("host_success"))
    }

    /// Whether the job finished successfully.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.status() == JobStatus::Succeeded
    }

    /// Whether the job failed.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.status() == JobStatus::Failed
    }

    fn label_or_action(&self) -> String {
        self.get("label")
            .or_else(|| self.get("action"))
            .map_or_else(String::new, ToString::to_string)
    }

    /// Poll the job until it succeeds.
    ///
    /// The job is re-fetched, then the task sleeps `check_interval`, for as
    /// long as the accumulated sleep stays below `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`LinodeError::JobFailed`] as soon as the job reports failure,
    /// [`LinodeError::Timeout`] if it is still pending when time runs out, or
    /// [`LinodeError::InvalidParameter`] for a zero `check_interval`.
    pub async fn wait(
        &mut self,
        api: &LinodeApi,
        timeout: Duration,
        check_interval: Duration,
    ) -> Result<(), LinodeError> {
        if check_interval.is_zero() {
            return Err(LinodeError::InvalidParameter {
                operation: "wait",
                param: "check_interval",
                reason: "must be greater than zero".to_string(),
            });
        }

        let mut waited = Duration::ZERO;
        while waited < timeout {
            api.refresh(self).await?;
            match self.status() {
                JobStatus::Failed => {
                    let err = LinodeError::JobFailed {
                        label: self.label_or_action(),
                        linode_id: self.int("linode_id")?,
                        job_id: self.api_id()?,
                    };
                    tracing::warn!(error = %err, "job failed");
                    return Err(err);
                }
                JobStatus::Succeeded => {
                    tracing::debug!(job_id = ?self.get("api_id"), ?waited, "job finished");
                    return Ok(());
                }
                JobStatus::Pending => {
                    tracing::debug!(job_id = ?self.get("api_id"), ?waited, "job still pending");
                    tokio::time::sleep(check_interval).await;
                    waited = waited.saturating_add(check_interval);
                }
            }
        }

        Err(LinodeError::Timeout {
            label: self.label_or_action(),
            linode_id: self.int("linode_id")?,
            timeout_secs: timeout.as_secs(),
        })
    }

    /// [`Self::wait`] with the default timeout and interval.
    ///
    /// # Errors
    ///
    /// See [`Self::wait`].
    pub async fn wait_default(&mut self, api: &LinodeApi) -> Result<(), LinodeError> {
        self.wait(api, DEFAULT_JOB_TIMEOUT, DEFAULT_CHECK_INTERVAL).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use serde_json::{Value, json};

    use super::*;
    use crate::testing::MockTransport;

    fn job(host_success: &Value) -> Value {
        json!([{
            "JOBID": 1201,
            "LINODEID": 8098,
            "ACTION": "linode.boot",
            "LABEL": "System Boot - My Config",
            "ENTERED_DT": "2009-07-14 14:30:00.0",
            "HOST_START_DT": "",
            "HOST_FINISH_DT": "",
            "DURATION": "",
            "HOST_MESSAGE": "",
            "HOST_SUCCESS": host_success,
        }])
    }

    #[test]
    fn status_from_host_success() {
        assert_eq!(JobStatus::from_host_success(None), JobStatus::Pending);
        assert_eq!(JobStatus::from_host_success(Some(&AttrValue::from(""))), JobStatus::Pending);
        assert_eq!(JobStatus::from_host_success(Some(&AttrValue::Null)), JobStatus::Pending);
        assert_eq!(JobStatus::from_host_success(Some(&AttrValue::Int(1))), JobStatus::Succeeded);
        assert_eq!(JobStatus::from_host_success(Some(&AttrValue::from("1"))), JobStatus::Succeeded);
        assert_eq!(JobStatus::from_host_success(Some(&AttrValue::Int(0))), JobStatus::Failed);
        assert_eq!(JobStatus::from_host_success(Some(&AttrValue::from("0"))), JobStatus::Failed);
    }

    #[tokio::test]
    async fn find_reads_job_fields() {
        let mock = MockTransport::new();
        mock.respond(Action::JobList, job(&json!("")));
        let api = mock.api();

        let job = Job::find(&api, 8098, 1201).await.unwrap();
        assert_eq!(job.api_id().unwrap(), 1201);
        assert_eq!(job.int("linode_id").unwrap(), 8098);
        assert_eq!(job.status(), JobStatus::Pending);
        assert_eq!(mock.last_params(Action::JobList)["linodeid"], json!(8098));
    }

    #[tokio::test(start_paused = true)]
    async fn wait_fails_on_third_poll() {
        let mock = MockTransport::new();
        mock.respond(Action::JobList, job(&json!("")))
            .respond(Action::JobList, job(&json!("")))
            .respond(Action::JobList, job(&json!("")))
            .respond(Action::JobList, job(&json!(0)));
        let api = mock.api();

        let mut job = Job::find(&api, 8098, 1201).await.unwrap();
        let err = job
            .wait(&api, Duration::from_secs(120), Duration::from_secs(5))
            .await
            .unwrap_err();

        match err {
            LinodeError::JobFailed {
                label,
                linode_id,
                job_id,
            } => {
                assert_eq!(label, "System Boot - My Config");
                assert_eq!(linode_id, 8098);
                assert_eq!(job_id, 1201);
            }
            other => panic!("unexpected error: {other}"),
        }
        // one lookup plus three polls
        assert_eq!(mock.count(Action::JobList), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn wait_times_out_after_two_polls() {
        let mock = MockTransport::new();
        mock.respond(Action::JobList, job(&json!("")));
        let api = mock.api();

        let mut job = Job::find(&api, 8098, 1201).await.unwrap();
        let before = mock.count(Action::JobList);
        let err = job
            .wait(&api, Duration::from_secs(10), Duration::from_secs(5))
            .await
            .unwrap_err();

        assert!(matches!(err, LinodeError::Timeout { timeout_secs: 10, .. }));
        assert_eq!(mock.count(Action::JobList) - before, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn wait_returns_once_done() {
        let mock = MockTransport::new();
        mock.respond(Action::JobList, job(&json!("")))
            .respond(Action::JobList, job(&json!("1")));
        let api = mock.api();

        let mut job = Job::find(&api, 8098, 1201).await.unwrap();
        job.wait_default(&api).await.unwrap();
        assert!(job.is_done());
        assert!(!job.is_failed());
    }

    #[tokio::test]
    async fn zero_interval_is_rejected() {
        let mock = MockTransport::new();
        mock.respond(Action::JobList, job(&json!("")));
        let api = mock.api();

        let mut job = Job::find(&api, 8098, 1201).await.unwrap();
        let err = job
            .wait(&api, Duration::from_secs(10), Duration::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(err, LinodeError::InvalidParameter { .. }));
    }
}
