/// What a view asks the transport to fetch on refresh.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FetchRequest {
    /// Full state of one module.
    Module(String),
    /// Long-form listing of every module and its slots.
    Scheduler,
}

impl FetchRequest {
    pub fn module(id: impl Into<String>) -> Self {
        FetchRequest::Module(id.into())
    }
}

/// Response matching a [`FetchRequest`].
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Module(crate::protocol::ModuleState),
    Scheduler(crate::protocol::SchedulerState),
}
