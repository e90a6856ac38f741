//! Turning an endpoint descriptor into a prepared request.

use url::Url;

use crate::endpoint::EndpointDescriptor;
use crate::error::OutcomeError;
use crate::http::PreparedRequest;

/// Characters that would change the meaning of the authority if they
/// appeared in a host.
const HOST_DELIMITERS: &[char] = &['/', '?', '#', '@', '\\'];

/// Assemble the URL and copy the remaining fields verbatim.
///
/// Fails with `BadUrl` before anything is sent when the scheme, host or path
/// cannot form an absolute URL. The result depends only on the descriptor.
///
/// The path goes through WHATWG URL parsing, so `.` and `..` segments are
/// resolved: `/a/../b` is sent as `/b`.
pub fn build(endpoint: &EndpointDescriptor) -> Result<PreparedRequest, OutcomeError> {
    let url = assemble_url(endpoint).ok_or(OutcomeError::BadUrl)?;
    tracing::trace!(method = %endpoint.method, %url, "built request");
    Ok(PreparedRequest {
        method: endpoint.method,
        url,
        headers: endpoint.headers.clone(),
        timeout: endpoint.timeout,
        cache_policy: endpoint.cache_policy,
    })
}

fn assemble_url(endpoint: &EndpointDescriptor) -> Option<Url> {
    let host = endpoint.host.as_str();
    if host.is_empty() || host.contains(HOST_DELIMITERS) || host.contains(char::is_whitespace) {
        return None;
    }
    // A path following an authority must be empty or absolute.
    if !endpoint.path.is_empty() && !endpoint.path.starts_with('/') {
        return None;
    }

    let mut url = Url::parse(&format!("{}://{}", endpoint.scheme, host)).ok()?;
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return None;
    }
    url.set_path(&endpoint.path);

    if let Some(query) = endpoint.query.as_deref().filter(|q| !q.is_empty()) {
        url.query_pairs_mut().extend_pairs(query);
    }
    Some(url)
}
