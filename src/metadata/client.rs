//! Cached facade over a bridge.
//!
//! The host only ever talks to [`ParserClient`]. Metadata queries are
//! fetched once and kept for the client's lifetime; parse requests always
//! go through to the bridge.

use once_cell::sync::OnceCell;
use serde::de::DeserializeOwned;

use super::types::{ParseOptions, ParseOutcome, TokenLabels, TypesInfo, VisitorKeys};
use crate::config::{BridgeMode, BridgeSettings};
use crate::worker::{
    Backend, BackendError, Bridge, BridgeError, BridgeResult, InProcessBridge, RemoteBridge,
    Request,
};

/// Parser client with memoized metadata.
///
/// Works over any [`Bridge`]; see [`connect`] for building one from settings.
///
/// A metadata query that fails is not cached, so the next call tries again.
/// If two threads race on the first access, one of them fetches and the
/// other waits for its value.
///
/// # Example
///
/// ```ignore
/// use parsebridge::metadata::ParserClient;
/// use parsebridge::worker::RemoteBridge;
///
/// let client = ParserClient::new(RemoteBridge::spawn(|| MyBackend::load())?);
///
/// let keys = client.visitor_keys()?;      // fetched from the worker
/// let keys = client.visitor_keys()?;      // served from the cache
///
/// let outcome = client.maybe_parse::<serde_json::Value>("let x = 1;", &options)?;
/// ```
pub struct ParserClient<B> {
    bridge: B,
    version: OnceCell<String>,
    types_info: OnceCell<TypesInfo>,
    visitor_keys: OnceCell<VisitorKeys>,
    token_labels: OnceCell<TokenLabels>,
}

impl<B: Bridge> ParserClient<B> {
    pub fn new(bridge: B) -> Self {
        Self {
            bridge,
            version: OnceCell::new(),
            types_info: OnceCell::new(),
            visitor_keys: OnceCell::new(),
            token_labels: OnceCell::new(),
        }
    }

    /// Get the underlying bridge.
    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    /// Backend version string.
    pub fn version(&self) -> BridgeResult<&str> {
        self.cached(&self.version, Request::GetVersion)
            .map(String::as_str)
    }

    pub fn types_info(&self) -> BridgeResult<&TypesInfo> {
        self.cached(&self.types_info, Request::GetTypesInfo)
    }

    pub fn visitor_keys(&self) -> BridgeResult<&VisitorKeys> {
        self.cached(&self.visitor_keys, Request::GetVisitorKeys)
    }

    pub fn token_labels(&self) -> BridgeResult<&TokenLabels> {
        self.cached(&self.token_labels, Request::GetTokenLabels)
    }

    /// Ask the backend to parse `source`. Never cached.
    ///
    /// A [`ParseOutcome::Deferred`] answer means the caller should run its
    /// own parser with the returned options.
    pub fn maybe_parse<A: DeserializeOwned>(
        &self,
        source: &str,
        options: &ParseOptions,
    ) -> BridgeResult<ParseOutcome<A>> {
        self.fetch(Request::maybe_parse(source, options.clone()))
    }

    /// Serve `slot`, filling it from `request` on first success.
    ///
    /// Only metadata actions may be cached; their answers never change for a
    /// loaded backend.
    fn cached<'a, T: DeserializeOwned>(
        &self,
        slot: &'a OnceCell<T>,
        request: Request,
    ) -> BridgeResult<&'a T> {
        let action = request.action();
        assert!(action.is_metadata(), "{action} answers must not be cached");
        slot.get_or_try_init(|| self.fetch(request))
    }

    fn fetch<T: DeserializeOwned>(&self, request: Request) -> BridgeResult<T> {
        let action = request.action();
        let value = self.bridge.call(request)?;
        serde_json::from_value(value).map_err(|source| BridgeError::Decode { action, source })
    }
}

/// Build a client over the bridge selected by `settings.mode`.
///
/// In worker mode `factory` runs on the worker thread; in process it runs on
/// the first call.
pub fn connect<B, F>(
    settings: &BridgeSettings,
    factory: F,
) -> BridgeResult<ParserClient<Box<dyn Bridge>>>
where
    B: Backend,
    F: FnOnce() -> Result<B, BackendError> + Send + 'static,
{
    let bridge: Box<dyn Bridge> = match settings.mode {
        BridgeMode::Worker => Box::new(RemoteBridge::spawn_with_settings(factory, settings)?),
        BridgeMode::InProcess => Box::new(InProcessBridge::lazy(factory)),
    };
    tracing::debug!(mode = ?settings.mode, "parser client connected");
    Ok(ParserClient::new(bridge))
}
