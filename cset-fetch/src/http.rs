//! Blocking HTTP implementation of [`crate::ChangelogSource`] against a
//! Mercurial-style `json-log` endpoint.

use std::thread;

use cset_core::constants::{RETRY_SLEEP, RETRY_TIMES};
use cset_core::{CsetError, CsetResult, Revision};
use serde::Deserialize;

use crate::{ChangelogPage, ChangelogSource};

#[derive(Debug, Deserialize)]
struct JsonLogResponse {
    changesets: Vec<JsonLogEntry>,
}

#[derive(Debug, Deserialize)]
struct JsonLogEntry {
    node: String,
}

pub struct HgChangelogFetcher {
    client: reqwest::blocking::Client,
    base_url: String,
    branch: String,
}

impl HgChangelogFetcher {
    pub fn new(base_url: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            base_url: base_url.into(),
            branch: branch.into(),
        }
    }

    fn url_for(&self, cursor: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        format!("{base}/{}/json-log/{cursor}", self.branch)
    }

    fn fetch_once(&self, cursor: &str) -> Result<ChangelogPage, String> {
        let url = self.url_for(cursor);
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| e.to_string())?
            .error_for_status()
            .map_err(|e| e.to_string())?;
        let body: JsonLogResponse = response.json().map_err(|e| e.to_string())?;
        if body.changesets.is_empty() {
            return Err("empty changelog page".to_string());
        }
        let entries = body
            .changesets
            .into_iter()
            .map(|e| Revision::from_node(&e.node))
            .collect();
        Ok(ChangelogPage { entries })
    }
}

impl ChangelogSource for HgChangelogFetcher {
    fn fetch_page(&self, cursor: &str) -> CsetResult<ChangelogPage> {
        let mut last_err = String::new();
        for attempt in 0..RETRY_TIMES {
            match self.fetch_once(cursor) {
                Ok(page) => return Ok(page),
                Err(e) => {
                    last_err = e;
                    tracing::warn!(
                        attempt = attempt + 1,
                        cursor,
                        error = %last_err,
                        "changelog fetch failed, retrying"
                    );
                    if attempt + 1 < RETRY_TIMES {
                        thread::sleep(RETRY_SLEEP);
                    }
                }
            }
        }
        Err(CsetError::FetchFailed(last_err))
    }
}
