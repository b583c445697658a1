use crate::telemetry::{ApiEvent, EventKind};
use crate::types::{ApiRequest, ApiResponse};

/// Produces event objects for the notification channels.
#[derive(Debug, Default, Clone, Copy)]
pub struct EventFactory;

impl EventFactory {
    pub fn new() -> Self {
        Self
    }

    /// `EventKind::Internal` is reserved and yields `None`.
    pub fn create<'a>(
        &self,
        kind: EventKind,
        name: &str,
        request: &'a dyn ApiRequest,
        response: Option<&'a ApiResponse>,
    ) -> Option<ApiEvent<'a>> {
        match kind {
            EventKind::Internal => None,
            EventKind::External => Some(ApiEvent::new(name, request, response)),
        }
    }
}
