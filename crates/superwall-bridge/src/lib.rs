// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Superwall bridge: exposes the native Superwall SDK to a host application
// layer through addressable bridge instances.
//
// The host sees opaque string ids. Each id names one bridge in the
// `BridgeRegistry`; calls addressed to it are answered with exactly one
// `Response`. Callback objects owned by the host are represented natively by
// proxy bridges that forward over a `HostMessenger`.

pub mod host;
pub mod instance;
pub mod messenger;
pub mod method;
pub mod proxies;
pub mod registry;
pub mod sdk;
pub mod subscription_status;
pub mod superwall;

/// In-memory SDK for desktop and CI builds without the native SDK.
pub mod stub;

pub use host::BridgeHost;
pub use instance::{BridgeContext, BridgeObject, Lifecycle};
pub use messenger::HostMessenger;
pub use method::{Arguments, MethodCall, MethodError, Response};
pub use registry::BridgeRegistry;
pub use sdk::SuperwallSdk;
pub use stub::{InMemorySdk, RecordingMessenger};
