//! Scripted transport for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use tourhub_core::error::AppError;
use tourhub_core::result::AppResult;

use super::transport::{Transport, TransportReceipt, TransportRequest};

/// Records every request and answers from a script, accepting once the
/// script runs out.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    pub requests: Mutex<Vec<TransportRequest>>,
    script: Mutex<VecDeque<Result<String, String>>>,
}

impl RecordingTransport {
    pub fn failing_with(errors: &[&str]) -> Self {
        let t = Self::default();
        for e in errors {
            t.script.lock().unwrap().push_back(Err(e.to_string()));
        }
        t
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last(&self) -> Option<TransportRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn deliver(&self, request: TransportRequest) -> AppResult<TransportReceipt> {
        let n = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request);
            requests.len()
        };
        match self.script.lock().unwrap().pop_front() {
            Some(Err(message)) => Err(AppError::external_service(message)),
            Some(Ok(id)) => Ok(TransportReceipt { external_id: Some(id) }),
            None => Ok(TransportReceipt {
                external_id: Some(format!("ext-{n}")),
            }),
        }
    }
}
