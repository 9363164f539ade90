//! Plain filter-field translation.
//!
//! Moves the flat v1 filter fields (`host`, `service`, `site` and their
//! regex variants) into the nested v2 `context` object. Exact-match filters
//! are mirrored into the selections tree; regex filters have no dropdown in
//! the editor and are not.

use super::paths::record_selection;
use crate::document::{
    Context, HostFilter, HostRegexFilter, ServiceFilter, ServiceRegexFilter, SiteFilter, Target,
};
use crate::error::Result;
use serde_json::Value;
use tracing::warn;

/// Take a legacy field off the target, keeping only non-empty strings.
///
/// Non-string values were never written by the v1 editor; they are dropped
/// with a warning rather than failing the whole document.
pub(crate) fn take_nonempty_string(field: &mut Option<Value>, name: &str) -> Option<String> {
    let value = field.take()?;
    match value {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::String(_) => None,
        other => {
            warn!("Ignoring non-string legacy field {} = {}", name, other);
            None
        }
    }
}

/// Move the flat v1 filter fields into `context`, discarding the fields the
/// v2 schema no longer carries.
pub fn translate_context(target: &mut Target) -> Result<()> {
    // Dropped outright: v2 derives these from the query itself.
    target.format = None;
    target.usehostregex = None;

    let host = take_nonempty_string(&mut target.host, "host");
    let hostregex = take_nonempty_string(&mut target.hostregex, "hostregex");
    let service = take_nonempty_string(&mut target.service, "service");
    let serviceregex = take_nonempty_string(&mut target.serviceregex, "serviceregex");
    let site = take_nonempty_string(&mut target.site, "site");

    if host.is_none()
        && hostregex.is_none()
        && service.is_none()
        && serviceregex.is_none()
        && site.is_none()
    {
        return Ok(());
    }

    let context = target.context.get_or_insert_with(Context::default);
    let params = target.params.get_or_insert_with(Default::default);

    if let Some(host) = host {
        record_selection(params, &["context", "host", "host"], &host, None)?;
        context.host = Some(HostFilter { host });
    }
    if let Some(host_regex) = hostregex {
        context.hostregex = Some(HostRegexFilter { host_regex });
    }
    if let Some(service) = service {
        record_selection(params, &["context", "service", "service"], &service, None)?;
        context.service = Some(ServiceFilter { service });
    }
    if let Some(service_regex) = serviceregex {
        context.serviceregex = Some(ServiceRegexFilter { service_regex });
    }
    if let Some(site) = site {
        record_selection(params, &["context", "siteopt", "site"], &site, None)?;
        context.siteopt = Some(SiteFilter { site });
    }
    Ok(())
}
