//! In-memory fakes for unit tests.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use warden_domain::{ApiRequest, ApiResponse, Claims, encode_unsigned};

use crate::error::RefreshFailure;
use crate::ports::{
    HttpTransport, KeyValueStorage, RefreshClient, RefreshGrant, StorageError, TransportError,
};

/// Fixed starting instant for tests.
pub fn epoch() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

/// Credential for `subject` expiring `secs` after `now`.
pub fn token(subject: &str, now: DateTime<Utc>, secs: i64) -> String {
    encode_unsigned(
        &Claims::expiring_at(now + Duration::seconds(secs))
            .with_subject(subject)
            .with_issued_at(now),
    )
}

#[derive(Default)]
pub struct MapStorage {
    entries: Mutex<HashMap<String, String>>,
    fail_batch_removal: AtomicBool,
}

impl MapStorage {
    pub fn fail_batch_removal(&self, fail: bool) {
        self.fail_batch_removal.store(fail, Ordering::SeqCst);
    }
}

impl KeyValueStorage for MapStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }

    fn remove_all(&self, keys: &[&str]) -> Result<(), StorageError> {
        if self.fail_batch_removal.load(Ordering::SeqCst) {
            return Err(StorageError::Serialization("batch unsupported".into()));
        }
        for key in keys {
            self.remove(key)?;
        }
        Ok(())
    }
}

/// Refresh endpoint that replays scripted outcomes and counts calls.
#[derive(Default)]
pub struct FakeRefreshClient {
    outcomes: Mutex<VecDeque<Result<RefreshGrant, RefreshFailure>>>,
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl FakeRefreshClient {
    pub fn answering(outcome: Result<RefreshGrant, RefreshFailure>) -> Arc<Self> {
        let client = Self::default();
        client.push(outcome);
        Arc::new(client)
    }

    pub fn push(&self, outcome: Result<RefreshGrant, RefreshFailure>) {
        self.outcomes.lock().unwrap().push_back(outcome);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

pub fn grant(access: &str) -> Result<RefreshGrant, RefreshFailure> {
    Ok(RefreshGrant {
        access: access.to_string(),
        refresh: None,
    })
}

impl RefreshClient for Arc<FakeRefreshClient> {
    async fn refresh(&self, refresh: &str) -> Result<RefreshGrant, RefreshFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(refresh.to_string());
        // Give queued callers a chance to join before the exchange resolves.
        tokio::task::yield_now().await;
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(RefreshFailure::rejected_by_server(500)))
    }
}

type Responder = Box<dyn Fn(&ApiRequest) -> ApiResponse + Send + Sync>;

/// Transport that answers through a closure and records what it was sent.
pub struct FakeTransport {
    responder: Responder,
    sent: Mutex<Vec<ApiRequest>>,
}

impl FakeTransport {
    pub fn new(responder: impl Fn(&ApiRequest) -> ApiResponse + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            responder: Box::new(responder),
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn sent(&self) -> Vec<ApiRequest> {
        self.sent.lock().unwrap().clone()
    }
}

impl HttpTransport for Arc<FakeTransport> {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        self.sent.lock().unwrap().push(request.clone());
        tokio::task::yield_now().await;
        Ok((self.responder)(request))
    }
}
