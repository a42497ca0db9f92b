use std::cell::RefCell;

use runtime::driver::Completion;
use streaming::transport::Transport;
use tracing::{debug, warn};

use crate::controller::ViewDriver;

/// One refresh of the active view: issue, fetch, complete.
///
/// The driver is only borrowed around the synchronous halves, never across
/// the fetch, so input handlers and other refreshes may run meanwhile.
pub async fn refresh_once<T>(driver: &RefCell<ViewDriver>, transport: &T) -> Completion
where
    T: Transport + ?Sized,
{
    let pending = match driver.try_borrow_mut() {
        Ok(mut driver) => driver.begin_refresh(),
        Err(_) => {
            warn!("refresh skipped: driver busy");
            return Completion::Idle;
        }
    };
    let Some(pending) = pending else {
        return Completion::Idle;
    };

    let result = transport.fetch(&pending.request).await;

    match driver.try_borrow_mut() {
        Ok(mut driver) => {
            let completion = driver.complete(pending.generation, result);
            debug!(generation = ?pending.generation, ?completion, "refresh completed");
            completion
        }
        Err(_) => {
            warn!(generation = ?pending.generation, "response dropped: driver busy");
            Completion::Idle
        }
    }
}
