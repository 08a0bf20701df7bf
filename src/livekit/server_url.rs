//! Region-aware LiveKit server URL

use url::Url;

const CLOUD_DOMAIN: &str = "livekit.cloud";

/// Resolve the server URL a participant should connect to.
///
/// LiveKit Cloud project URLs (`<project>.livekit.cloud`) get the region
/// inserted after the project id, e.g. `<project>.eu.production.livekit.cloud`.
/// Staging hosts keep their `staging` label instead of `production`. Any other
/// host is returned unchanged apart from URL normalization.
pub fn resolve_server_url(server_url: &str, region: Option<&str>) -> Result<String, url::ParseError> {
    let mut url = Url::parse(server_url)?;
    let region = region.map(str::trim).filter(|r| !r.is_empty());

    let host = url.host_str().map(str::to_string);

    if let (Some(region), Some(host)) = (region, host) {
        if host.contains(CLOUD_DOMAIN) {
            let mut labels = host.split('.');
            let project = labels.next().unwrap_or_default().to_string();
            let mut rest: Vec<&str> = labels.collect();
            if rest.first() != Some(&"staging") {
                rest.insert(0, "production");
            }
            let new_host = std::iter::once(project.as_str())
                .chain(std::iter::once(region))
                .chain(rest)
                .collect::<Vec<_>>()
                .join(".");
            url.set_host(Some(&new_host))?;
        }
    }

    Ok(url.to_string())
}
