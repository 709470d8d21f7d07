//! Request envelope carrying the one-retry marker

use jobhub_domain::HttpRequest;
use uuid::Uuid;

/// An outbound call plus its replay state.
///
/// A request is replayed after a refresh at most once; the marker is set
/// before the replay and never cleared.
#[derive(Debug, Clone)]
pub struct RequestEnvelope {
    id: Uuid,
    request: HttpRequest,
    retried: bool,
}

impl RequestEnvelope {
    pub fn new(request: HttpRequest) -> Self {
        Self { id: Uuid::new_v4(), request, retried: false }
    }

    /// Correlation id used in log fields
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn request(&self) -> &HttpRequest {
        &self.request
    }

    pub fn is_retried(&self) -> bool {
        self.retried
    }

    pub(crate) fn mark_retried(&mut self) {
        self.retried = true;
    }
}
