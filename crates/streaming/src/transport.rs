use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};

use async_trait::async_trait;

use crate::error::TransportError;
use crate::protocol::{InputAck, InputMutation, ModuleState, SchedulerState};
use crate::request::{FetchRequest, Payload};

/// Request/response access to the computation server.
///
/// Implementations run on a single-threaded executor, hence `?Send`.
#[async_trait(?Send)]
pub trait Transport {
    async fn fetch_module(&self, id: &str) -> Result<ModuleState, TransportError>;

    async fn fetch_scheduler(&self) -> Result<SchedulerState, TransportError>;

    async fn send_input(&self, mutation: &InputMutation) -> Result<InputAck, TransportError>;

    async fn fetch(&self, request: &FetchRequest) -> Result<Payload, TransportError> {
        match request {
            FetchRequest::Module(id) => self.fetch_module(id).await.map(Payload::Module),
            FetchRequest::Scheduler => self.fetch_scheduler().await.map(Payload::Scheduler),
        }
    }
}

/// In-process transport serving canned state; records every input it receives.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    modules: RefCell<BTreeMap<String, ModuleState>>,
    scheduler: RefCell<SchedulerState>,
    failures: RefCell<VecDeque<TransportError>>,
    inputs: RefCell<Vec<InputMutation>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_module(&self, state: ModuleState) {
        self.modules.borrow_mut().insert(state.id.clone(), state);
    }

    pub fn set_scheduler(&self, state: SchedulerState) {
        *self.scheduler.borrow_mut() = state;
    }

    /// The next call fails with `error` instead of answering.
    pub fn fail_next(&self, error: TransportError) {
        self.failures.borrow_mut().push_back(error);
    }

    pub fn inputs(&self) -> Vec<InputMutation> {
        self.inputs.borrow().clone()
    }

    fn take_failure(&self) -> Result<(), TransportError> {
        match self.failures.borrow_mut().pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait(?Send)]
impl Transport for MemoryTransport {
    async fn fetch_module(&self, id: &str) -> Result<ModuleState, TransportError> {
        self.take_failure()?;
        self.modules
            .borrow()
            .get(id)
            .cloned()
            .ok_or_else(|| TransportError::Status {
                status: 404,
                body: format!("unknown module {id}"),
            })
    }

    async fn fetch_scheduler(&self) -> Result<SchedulerState, TransportError> {
        self.take_failure()?;
        Ok(self.scheduler.borrow().clone())
    }

    async fn send_input(&self, mutation: &InputMutation) -> Result<InputAck, TransportError> {
        self.take_failure()?;
        self.inputs.borrow_mut().push(mutation.clone());
        Ok(InputAck(serde_json::json!({"status": "success"})))
    }
}
