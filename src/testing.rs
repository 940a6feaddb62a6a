//! Scripted transport for unit tests.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use serde_json::Value;

use crate::{
    linode_client::LinodeApi,
    linode_error::{ApiFault, LinodeError},
    linode_transport::{Action, Params, Transport},
};

#[derive(Clone)]
enum Scripted {
    Data(Value),
    Fault(ApiFault),
}

#[derive(Default)]
struct MockState {
    queues: HashMap<Action, VecDeque<Scripted>>,
    calls: Vec<(Action, Params)>,
}

/// Answers each action from a queue of scripted responses.
///
/// Once a queue is down to its last response, that response repeats. Every
/// call is recorded.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle sharing this mock.
    #[must_use]
    pub fn api(&self) -> LinodeApi {
        LinodeApi::with_transport(self.clone())
    }

    /// Queue a `DATA` value for `action`.
    pub fn respond(&self, action: Action, data: Value) -> &Self {
        self.push(action, Scripted::Data(data))
    }

    /// Queue an API fault for `action`.
    pub fn fail(&self, action: Action, code: i64, message: &str) -> &Self {
        self.push(
            action,
            Scripted::Fault(ApiFault {
                code,
                message: message.to_string(),
            }),
        )
    }

    fn push(&self, action: Action, scripted: Scripted) -> &Self {
        self.state
            .lock()
            .unwrap()
            .queues
            .entry(action)
            .or_default()
            .push_back(scripted);
        self
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<(Action, Params)> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Number of calls made for `action`.
    pub fn count(&self, action: Action) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|(a, _)| *a == action)
            .count()
    }

    /// Parameters of the most recent call for `action`.
    pub fn last_params(&self, action: Action) -> Params {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .rev()
            .find(|(a, _)| *a == action)
            .map(|(_, p)| p.clone())
            .unwrap_or_else(|| panic!("no call recorded for {action}"))
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn call(&self, action: Action, params: &Params) -> Result<Value, LinodeError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push((action, params.clone()));

        let queue = state.queues.entry(action).or_default();
        let scripted = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };

        match scripted {
            Some(Scripted::Data(data)) => Ok(data),
            Some(Scripted::Fault(fault)) => Err(LinodeError::Remote {
                action,
                faults: vec![fault],
            }),
            None => Err(LinodeError::EmptyResponse),
        }
    }
}
