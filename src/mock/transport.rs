//! Scripted transport
//!
//! Replies are consumed from a queue; once the queue is empty every call
//! gets the fallback reply.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use beacon_protocol::{StatusRequest, StatusResponse};

use crate::context::ShutdownSignal;
use crate::transport::{StatusTransport, TransportError};

/// One scripted transport outcome
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Answer with this response
    Respond(StatusResponse),
    /// Fail as if the backend were unreachable
    Unreachable,
    /// Fail with an HTTP error status
    HttpStatus(u16),
}

impl MockReply {
    fn into_result(self) -> Result<StatusResponse, TransportError> {
        match self {
            MockReply::Respond(response) => Ok(response),
            MockReply::Unreachable => Err(TransportError::ConnectionFailed(
                "mock backend unreachable".to_string(),
            )),
            MockReply::HttpStatus(code) => Err(TransportError::Status { code }),
        }
    }
}

/// Mock transport for testing
#[derive(Debug)]
pub struct MockTransport {
    script: Mutex<VecDeque<MockReply>>,
    fallback: Mutex<MockReply>,
    calls: AtomicUsize,
    requests: Mutex<Vec<StatusRequest>>,
    shutdown_on_call: Mutex<Option<(usize, Arc<ShutdownSignal>)>>,
}

impl MockTransport {
    /// Create a transport that always answers with a default response
    pub fn new() -> Self {
        Self::with_fallback(MockReply::Respond(StatusResponse::default()))
    }

    /// Create a transport that always answers with `response`
    pub fn responding(response: StatusResponse) -> Self {
        Self::with_fallback(MockReply::Respond(response))
    }

    /// Create a transport whose backend is never reachable
    pub fn unreachable() -> Self {
        Self::with_fallback(MockReply::Unreachable)
    }

    /// Create a transport that fails `count` calls, then answers by default
    pub fn failing_times(count: usize) -> Self {
        let transport = Self::new();
        for _ in 0..count {
            transport.push(MockReply::Unreachable);
        }
        transport
    }

    /// Create a transport with a custom fallback reply
    pub fn with_fallback(fallback: MockReply) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(fallback),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            shutdown_on_call: Mutex::new(None),
        }
    }

    /// Queue a reply ahead of the fallback
    pub fn push(&self, reply: MockReply) {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(reply);
    }

    /// Replace the fallback reply
    pub fn set_fallback(&self, reply: MockReply) {
        *self.fallback.lock().unwrap_or_else(PoisonError::into_inner) = reply;
    }

    /// Request shutdown on the n-th call (1-based), as if it arrived mid-request
    pub fn shutdown_on_call(&self, n: usize, shutdown: Arc<ShutdownSignal>) {
        *self
            .shutdown_on_call
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some((n, shutdown));
    }

    /// Number of requests sent so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every request sent so far, in order
    pub fn requests(&self) -> Vec<StatusRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusTransport for MockTransport {
    fn send_status_request(&self, request: &StatusRequest) -> Result<StatusResponse, TransportError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        if let Some((n, shutdown)) = self
            .shutdown_on_call
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            if *n == call {
                shutdown.request();
            }
        }

        let scripted = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        let reply = match scripted {
            Some(reply) => reply,
            None => self
                .fallback
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
        };
        reply.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failing_times_then_success() {
        let transport = MockTransport::failing_times(2);
        let request = StatusRequest::new("app", 1);

        assert!(transport.send_status_request(&request).is_err());
        assert!(transport.send_status_request(&request).is_err());
        assert!(transport.send_status_request(&request).is_ok());
        assert_eq!(transport.call_count(), 3);
        assert_eq!(transport.requests().len(), 3);
    }

    #[test]
    fn test_http_status_reply() {
        let transport = MockTransport::with_fallback(MockReply::HttpStatus(503));
        let result = transport.send_status_request(&StatusRequest::new("app", 1));
        assert!(matches!(result, Err(TransportError::Status { code: 503 })));
    }

    #[test]
    fn test_shutdown_on_call() {
        let transport = MockTransport::new();
        let shutdown = Arc::new(ShutdownSignal::new());
        transport.shutdown_on_call(2, Arc::clone(&shutdown));
        let request = StatusRequest::new("app", 1);

        transport.send_status_request(&request).unwrap();
        assert!(!shutdown.is_requested());
        transport.send_status_request(&request).unwrap();
        assert!(shutdown.is_requested());
    }
}
