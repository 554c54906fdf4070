//! In-memory fakes shared by unit tests.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use serde_json::Value;

use crate::{
    backend::{
        BackendClient, BackendRequest, HttpResponse, HttpTransport, RetryPolicy, TransportError,
    },
    config::Endpoints,
    domain::{ChatId, MessageId, MessageRef},
    messaging::{outbound::OutboundMessage, port::MessagingPort},
    pipeline::EventContext,
    services::UserSyncCache,
    Result,
};

type Reply = std::result::Result<HttpResponse, TransportError>;

/// Answers per path; unknown paths get `200 {}`.
#[derive(Default)]
pub struct RoutedTransport {
    routes: Mutex<HashMap<String, Reply>>,
    seen: Mutex<Vec<BackendRequest>>,
}

impl RoutedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply_json(&self, path: &str, body: Value) {
        let reply = Ok(HttpResponse {
            status: 200,
            body: serde_json::to_vec(&body).unwrap(),
        });
        self.routes.lock().unwrap().insert(path.to_string(), reply);
    }

    pub fn reply_status(&self, path: &str, status: u16) {
        let reply = Ok(HttpResponse {
            status,
            body: Vec::new(),
        });
        self.routes.lock().unwrap().insert(path.to_string(), reply);
    }

    pub fn requests(&self) -> Vec<BackendRequest> {
        self.seen.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<BackendRequest> {
        self.requests().into_iter().filter(|r| r.path == path).collect()
    }
}

#[async_trait]
impl HttpTransport for RoutedTransport {
    async fn send(&self, req: &BackendRequest) -> Reply {
        self.seen.lock().unwrap().push(req.clone());
        self.routes
            .lock()
            .unwrap()
            .get(&req.path)
            .cloned()
            .unwrap_or_else(|| {
                Ok(HttpResponse {
                    status: 200,
                    body: b"{}".to_vec(),
                })
            })
    }
}

pub fn backend(transport: Arc<RoutedTransport>) -> Arc<BackendClient> {
    Arc::new(BackendClient::new(
        transport,
        RetryPolicy {
            attempts: 3,
            backoff: Duration::from_millis(500),
        },
        Endpoints::default(),
    ))
}

/// Context as the context stage would fill it.
pub fn context(transport: Arc<RoutedTransport>, partner_id: Option<&str>) -> EventContext {
    let backend = backend(transport);
    EventContext {
        partner_id: partner_id.map(str::to_string),
        user_sync: Some(Arc::new(UserSyncCache::new(
            backend.clone(),
            Duration::from_secs(3600),
            100,
        ))),
        backend: Some(backend),
    }
}

#[derive(Default)]
pub struct FakeMessenger {
    sent: Mutex<Vec<(ChatId, OutboundMessage)>>,
    answered: Mutex<Vec<String>>,
}

impl FakeMessenger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn sent(&self) -> Vec<(ChatId, OutboundMessage)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|(_, m)| m.text).collect()
    }

    pub fn answered(&self) -> Vec<String> {
        self.answered.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessagingPort for FakeMessenger {
    async fn send_message(&self, chat_id: ChatId, message: &OutboundMessage) -> Result<MessageRef> {
        let mut sent = self.sent.lock().unwrap();
        sent.push((chat_id, message.clone()));
        Ok(MessageRef {
            chat_id,
            message_id: MessageId(sent.len() as i32),
        })
    }

    async fn answer_callback_query(&self, callback_id: &str, _text: Option<&str>) -> Result<()> {
        self.answered.lock().unwrap().push(callback_id.to_string());
        Ok(())
    }
}
