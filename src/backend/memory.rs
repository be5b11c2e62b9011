//! Scripted in-memory backend for store tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use futures::future::BoxFuture;
use tokio::sync::oneshot;

use super::{Backend, BackendError, BackendResult, CLIENT_ID_KEY, CLIENT_SECRET_KEY, UpdateInfo};

/// In-memory backend with injectable failures
pub struct InMemoryBackend {
    settings: Mutex<HashMap<String, String>>,
    failing_reads: Mutex<HashSet<String>>,
    stall_reads: AtomicBool,
    /// Outcomes for upcoming `set_setting` calls; empty means succeed
    set_results: Mutex<VecDeque<bool>>,
    set_gate: Mutex<Option<oneshot::Receiver<()>>>,
    set_calls: Mutex<Vec<(String, String)>>,
    validate_response: Mutex<Result<bool, String>>,
    probe_response: Mutex<Result<bool, String>>,
    probe_calls: AtomicUsize,
    update_response: Mutex<Result<UpdateInfo, String>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self {
            settings: Mutex::new(HashMap::new()),
            failing_reads: Mutex::new(HashSet::new()),
            stall_reads: AtomicBool::new(false),
            set_results: Mutex::new(VecDeque::new()),
            set_gate: Mutex::new(None),
            set_calls: Mutex::new(Vec::new()),
            validate_response: Mutex::new(Ok(true)),
            probe_response: Mutex::new(Ok(true)),
            probe_calls: AtomicUsize::new(0),
            update_response: Mutex::new(Ok(UpdateInfo::default())),
        }
    }

    pub fn insert_setting(&self, key: &str, value: &str) {
        self.settings
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    pub fn setting(&self, key: &str) -> Option<String> {
        self.settings.lock().unwrap().get(key).cloned()
    }

    pub fn fail_reads_of(&self, key: &str) {
        self.failing_reads.lock().unwrap().insert(key.to_string());
    }

    /// Make every `get_setting` hang forever
    pub fn stall_reads(&self, stall: bool) {
        self.stall_reads.store(stall, Ordering::SeqCst);
    }

    /// Queue the outcome of the next `set_setting` call
    pub fn push_set_result(&self, ok: bool) {
        self.set_results.lock().unwrap().push_back(ok);
    }

    /// Hold the next `set_setting` call in flight until the sender fires
    pub fn hold_next_set(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.set_gate.lock().unwrap() = Some(rx);
        tx
    }

    pub fn set_calls(&self) -> Vec<(String, String)> {
        self.set_calls.lock().unwrap().clone()
    }

    pub fn respond_to_validate(&self, response: Result<bool, String>) {
        *self.validate_response.lock().unwrap() = response;
    }

    pub fn respond_to_probe(&self, response: Result<bool, String>) {
        *self.probe_response.lock().unwrap() = response;
    }

    pub fn probe_calls(&self) -> usize {
        self.probe_calls.load(Ordering::SeqCst)
    }

    pub fn respond_to_update_check(&self, response: Result<UpdateInfo, String>) {
        *self.update_response.lock().unwrap() = response;
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for InMemoryBackend {
    fn get_setting(&self, key: &str) -> BoxFuture<'static, BackendResult<Option<String>>> {
        if self.stall_reads.load(Ordering::SeqCst) {
            return Box::pin(futures::future::pending());
        }
        let result = if self.failing_reads.lock().unwrap().contains(key) {
            Err(BackendError::Call(format!("read of '{}' failed", key)))
        } else {
            Ok(self.setting(key))
        };
        Box::pin(async move { result })
    }

    fn set_setting(&self, key: &str, value: &str) -> BoxFuture<'static, BackendResult<()>> {
        self.set_calls
            .lock()
            .unwrap()
            .push((key.to_string(), value.to_string()));
        let ok = self.set_results.lock().unwrap().pop_front().unwrap_or(true);
        if ok {
            self.insert_setting(key, value);
        }
        let gate = self.set_gate.lock().unwrap().take();
        let key = key.to_string();

        Box::pin(async move {
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            if ok {
                Ok(())
            } else {
                Err(BackendError::Call(format!("write of '{}' failed", key)))
            }
        })
    }

    fn validate_and_store_credentials(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> BoxFuture<'static, BackendResult<bool>> {
        let response = self.validate_response.lock().unwrap().clone();
        if let Ok(true) = response {
            self.insert_setting(CLIENT_ID_KEY, client_id);
            self.insert_setting(CLIENT_SECRET_KEY, client_secret);
        }
        Box::pin(async move { response.map_err(BackendError::Call) })
    }

    fn has_valid_credentials(&self) -> BoxFuture<'static, BackendResult<bool>> {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        let response = self.probe_response.lock().unwrap().clone();
        Box::pin(async move { response.map_err(BackendError::Call) })
    }

    fn check_for_updates(&self) -> BoxFuture<'static, BackendResult<UpdateInfo>> {
        let response = self.update_response.lock().unwrap().clone();
        Box::pin(async move { response.map_err(BackendError::Call) })
    }
}
