//! The call contract shared by every bridge.

use std::sync::Arc;

use serde_json::Value;

use super::error::BridgeResult;
use super::protocol::Request;

/// Synchronous request/response channel to a parser backend.
///
/// `call` blocks until the single reply for `request` arrives. A transported
/// failure comes back as [`BridgeError::Remote`](super::BridgeError::Remote).
/// Implementations must agree on the success and failure shapes for the same
/// request so callers can swap one for another.
pub trait Bridge: Send + Sync {
    fn call(&self, request: Request) -> BridgeResult<Value>;
}

impl<T: Bridge + ?Sized> Bridge for Box<T> {
    fn call(&self, request: Request) -> BridgeResult<Value> {
        (**self).call(request)
    }
}

impl<T: Bridge + ?Sized> Bridge for Arc<T> {
    fn call(&self, request: Request) -> BridgeResult<Value> {
        (**self).call(request)
    }
}

impl<T: Bridge + ?Sized> Bridge for &T {
    fn call(&self, request: Request) -> BridgeResult<Value> {
        (**self).call(request)
    }
}
