//! Wiring of the core pieces from a [`Config`].

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use studyaid_core::{
    ApiClient, Config, CookieJar, CookieMirror, LocalStorage, SessionRouter, SessionStore,
};

/// Everything the UI and the one-shot commands talk to.
pub struct Services {
    pub jar: Arc<CookieJar>,
    pub router: Arc<SessionRouter>,
    pub api: ApiClient,
}

impl Services {
    pub fn build(config: &Config) -> Result<Self> {
        let data_dir = config.data_dir().context("Failed to locate data directory")?;
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create {}", data_dir.display()))?;

        let jar = if config.persist_cookies {
            Arc::new(CookieJar::persistent(Config::cookie_jar_path(&data_dir)))
        } else {
            Arc::new(CookieJar::new())
        };

        let storage = LocalStorage::open(config.storage, &data_dir);
        let store = SessionStore::new(storage);
        let origin = config.web_origin().context("Invalid web app URL")?;
        let mirror = CookieMirror::new(jar.clone(), origin, config.cookie.clone());

        let router = SessionRouter::new(store, mirror).with_poll_interval(config.poll_interval());
        let api = ApiClient::new(&config.api_base_url, Some(jar.clone()))
            .context("Failed to create HTTP client")?;

        debug!(
            storage = ?config.storage,
            persist_cookies = config.persist_cookies,
            "Services ready"
        );

        Ok(Self {
            jar,
            router: Arc::new(router),
            api,
        })
    }
}
