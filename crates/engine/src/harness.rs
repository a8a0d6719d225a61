//! Test doubles for the completion seam.
//!
//! `ScriptedCompleter` answers every request with a scripted reply and
//! records what it was asked, so workflow tests can count service calls
//! without a network.

use std::cell::RefCell;

use crate::completion::{Completer, CompletionRequest};
use crate::error::WorkflowError;

#[derive(Debug)]
pub struct ScriptedCompleter {
    reply: RefCell<Result<String, WorkflowError>>,
    requests: RefCell<Vec<CompletionRequest>>,
}

impl ScriptedCompleter {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: RefCell::new(Ok(text.to_string())),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn failing(error: WorkflowError) -> Self {
        Self {
            reply: RefCell::new(Err(error)),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn set_reply(&self, reply: Result<String, WorkflowError>) {
        *self.reply.borrow_mut() = reply;
    }

    pub fn calls(&self) -> usize {
        self.requests.borrow().len()
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.requests.borrow().last().cloned()
    }
}

impl Completer for ScriptedCompleter {
    fn complete(&self, request: &CompletionRequest) -> Result<String, WorkflowError> {
        self.requests.borrow_mut().push(request.clone());
        self.reply.borrow().clone()
    }
}
