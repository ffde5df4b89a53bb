//! Scripted stand-in for the remote service, shared by unit tests.

use async_trait::async_trait;
use reqwest::StatusCode;
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use crate::api::{ApiError, HttpRequest, HttpResponse, HttpTransport, ObservationsApi};

pub const BASE_URL: &str = "http://service.test";

#[derive(Debug)]
pub enum Reply {
    Respond(StatusCode, String),
    Fail(ApiError),
    /// Never resolves; only cancellation gets the caller out.
    Hang,
}

#[derive(Debug, Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Arc<Self> {
        Arc::new(Self { replies: Mutex::new(replies.into_iter().collect()), ..Default::default() })
    }

    /// Transport that fails the test if any request is issued.
    pub fn silent() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        self.requests.lock().unwrap().push(request);
        let reply = self.replies.lock().unwrap().pop_front();

        match reply {
            Some(Reply::Respond(status, body)) => Ok(HttpResponse { status, body }),
            Some(Reply::Fail(err)) => Err(err),
            Some(Reply::Hang) => std::future::pending().await,
            None => panic!("unexpected request: no scripted reply left"),
        }
    }
}

pub fn json(status: StatusCode, body: serde_json::Value) -> Reply {
    Reply::Respond(status, body.to_string())
}

pub fn api_with(transport: &Arc<ScriptedTransport>) -> ObservationsApi {
    ObservationsApi::with_transport(BASE_URL, transport.clone())
}
