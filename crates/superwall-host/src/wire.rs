// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Line-delimited JSON framing between this process and the host.
//
// Inbound lines are either requests or replies to an earlier `invoke`.
// Outbound lines are replies to requests, notifications, or invocations that
// expect a reply.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use superwall_bridge::{Arguments, HostMessenger, MethodCall, Response};
use superwall_core::types::BridgeId;

/// One line read from the host.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Inbound {
    /// Answer to an outbound [`Outbound::Invoke`].
    Reply {
        #[serde(rename = "replyTo")]
        reply_to: u64,
        response: Response,
    },
    /// A call into the bridge. Without a `bridgeId` it targets the creator
    /// channel.
    Request(Request),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    #[serde(default)]
    pub request_id: Option<Value>,
    #[serde(default)]
    pub bridge_id: Option<BridgeId>,
    pub method: String,
    #[serde(default)]
    pub args: Arguments,
}

impl Request {
    pub fn call(&self) -> MethodCall {
        MethodCall::new(self.method.clone(), self.args.clone())
    }
}

/// Call addressed to a host-side object.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostCall {
    pub bridge_id: BridgeId,
    pub method: String,
    pub args: Arguments,
}

impl HostCall {
    fn new(bridge_id: &BridgeId, call: MethodCall) -> Self {
        Self {
            bridge_id: bridge_id.clone(),
            method: call.method,
            args: call.arguments,
        }
    }
}

/// One line written to the host.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Outbound {
    Reply {
        #[serde(rename = "requestId")]
        request_id: Option<Value>,
        response: Response,
    },
    Notify {
        notify: HostCall,
    },
    Invoke {
        invoke: HostCall,
        #[serde(rename = "callId")]
        call_id: u64,
    },
}

/// Messenger that writes to the outbound line queue and matches host replies
/// to pending invocations by call id.
pub struct StdioMessenger {
    out: mpsc::UnboundedSender<Outbound>,
    pending: Mutex<HashMap<u64, oneshot::Sender<Response>>>,
    next_call_id: AtomicU64,
    closed: AtomicBool,
}

impl StdioMessenger {
    pub fn new(out: mpsc::UnboundedSender<Outbound>) -> Self {
        Self {
            out,
            pending: Mutex::new(HashMap::new()),
            next_call_id: AtomicU64::new(1),
            closed: AtomicBool::new(false),
        }
    }

    /// Route a host reply to the invocation waiting on it.
    pub fn complete(&self, call_id: u64, response: Response) {
        let waiter = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&call_id);
        match waiter {
            Some(waiter) => {
                let _ = waiter.send(response);
            }
            None => warn!(call_id, "reply for unknown or finished invocation"),
        }
    }

    /// Stop waiting on the host. Pending and later invocations answer
    /// `NotImplemented`.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        let dropped = {
            let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::take(&mut *pending)
        };
        if !dropped.is_empty() {
            debug!(count = dropped.len(), "abandoning pending host invocations");
        }
    }
}

#[async_trait]
impl HostMessenger for StdioMessenger {
    fn notify(&self, bridge_id: &BridgeId, call: MethodCall) {
        let line = Outbound::Notify {
            notify: HostCall::new(bridge_id, call),
        };
        if self.out.send(line).is_err() {
            warn!(%bridge_id, "output closed; notification dropped");
        }
    }

    async fn invoke(&self, bridge_id: &BridgeId, call: MethodCall) -> Response {
        if self.closed.load(Ordering::SeqCst) {
            return Response::NotImplemented;
        }
        let call_id = self.next_call_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(call_id, tx);

        let line = Outbound::Invoke {
            invoke: HostCall::new(bridge_id, call),
            call_id,
        };
        if self.out.send(line).is_err() {
            self.pending
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&call_id);
            return Response::NotImplemented;
        }
        // A dropped sender means the messenger was closed.
        rx.await.unwrap_or(Response::NotImplemented)
    }
}
