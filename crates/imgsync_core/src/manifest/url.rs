//! CDN URL construction.

use std::path::{Component, Path};

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::models::RemoteIdentity;

/// Characters escaped inside one path segment.
///
/// Everything except unreserved characters, including `/`, so each segment
/// is encoded independently before the segments are re-joined.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// `https://<cdn-host>/gh/<account>/<repository>[@<branch>]/<path>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CdnUrlTemplate {
    host: String,
    account: String,
    repository: String,
    /// Branch pinned into the URL, if any.
    pinned_branch: Option<String>,
}

impl CdnUrlTemplate {
    pub fn new(host: impl Into<String>, remote: &RemoteIdentity, pin_branch: bool) -> Self {
        Self {
            host: host.into(),
            account: remote.account.clone(),
            repository: remote.repository.clone(),
            pinned_branch: pin_branch.then(|| remote.branch.clone()),
        }
    }

    /// Base URL without a file path, ending in `/`.
    pub fn base(&self) -> String {
        let repo = match &self.pinned_branch {
            Some(branch) => format!("{}@{}", self.repository, branch),
            None => self.repository.clone(),
        };
        format!("https://{}/gh/{}/{}/", self.host, self.account, repo)
    }

    /// URL of a file given its path relative to the repository root.
    pub fn url_for(&self, relative: &Path) -> String {
        let encoded: Vec<String> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(segment) => Some(encode_segment(&segment.to_string_lossy())),
                _ => None,
            })
            .collect();
        format!("{}{}", self.base(), encoded.join("/"))
    }
}

/// Percent-encode a single path segment.
pub fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT).to_string()
}
