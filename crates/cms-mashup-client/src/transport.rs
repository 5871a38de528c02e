//! reqwest clients keyed by transport settings.
//!
//! Redirect policy, compression and cookie storage are fixed when a
//! `reqwest::Client` is built, while CMS callers may change them between
//! calls. One client is kept per distinct combination, up to
//! `MAX_CACHED_CLIENTS`, evicting the least recently used. All of them share
//! the same cookie jar so the session survives a settings change.

use crate::error::CmsError;
use crate::options::RequestOptions;
use reqwest::cookie::Jar;
use reqwest::redirect::Policy;
use reqwest::Client;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Upper bound on cached clients.
const MAX_CACHED_CLIENTS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TransportSettings {
    cookie_jar: bool,
    compression: bool,
    max_redirects: usize,
}

impl From<&RequestOptions> for TransportSettings {
    fn from(options: &RequestOptions) -> Self {
        Self {
            cookie_jar: options.jar,
            compression: options.gzip,
            max_redirects: options.max_redirects,
        }
    }
}

pub(crate) struct Transport {
    jar: Arc<Jar>,
    timeout: Duration,
    /// Least recently used first
    clients: Mutex<Vec<(TransportSettings, Client)>>,
}

impl Transport {
    pub(crate) fn new(timeout: Duration) -> Self {
        Self {
            jar: Arc::new(Jar::default()),
            timeout,
            clients: Mutex::new(Vec::new()),
        }
    }

    /// Client matching the transport part of `options`.
    pub(crate) fn client(&self, options: &RequestOptions) -> Result<Client, CmsError> {
        let settings = TransportSettings::from(options);
        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(index) = clients.iter().position(|(cached, _)| *cached == settings) {
            let entry = clients.remove(index);
            let client = entry.1.clone();
            clients.push(entry);
            return Ok(client);
        }

        let mut builder = Client::builder()
            .timeout(self.timeout)
            .gzip(settings.compression)
            .redirect(Policy::limited(settings.max_redirects));
        if settings.cookie_jar {
            builder = builder.cookie_provider(Arc::clone(&self.jar));
        }

        let client = builder
            .build()
            .map_err(|e| CmsError::Init(e.to_string()))?;

        tracing::debug!(
            cookie_jar = settings.cookie_jar,
            compression = settings.compression,
            max_redirects = settings.max_redirects,
            "Built HTTP client"
        );

        if clients.len() >= MAX_CACHED_CLIENTS {
            clients.remove(0);
        }
        clients.push((settings, client.clone()));
        Ok(client)
    }
}
