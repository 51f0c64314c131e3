//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use std::path::PathBuf;
use std::str::FromStr;

use ini::{Ini, Properties};

use super::file::ConfigFileError;
use super::settings::*;
use crate::origin::ApiAuth;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [store] section
    if let Some(section) = ini.section(Some("store")) {
        if let Some(v) = section.get("backend") {
            config.store.backend = match v.trim().to_lowercase().as_str() {
                "disk" => StoreBackend::Disk,
                "memory" => StoreBackend::Memory,
                _ => return Err(invalid("store", "backend", v, "must be 'disk' or 'memory'")),
            };
        }
        if let Some(v) = non_empty(section, "directory") {
            config.store.directory = expand_tilde(v);
        }
    }

    // [index] section
    if let Some(section) = ini.section(Some("index")) {
        if let Some(v) = section.get("backend") {
            config.index.backend = match v.trim().to_lowercase().as_str() {
                "sqlite" => IndexBackend::Sqlite,
                "memory" => IndexBackend::Memory,
                _ => return Err(invalid("index", "backend", v, "must be 'sqlite' or 'memory'")),
            };
        }
        if let Some(v) = non_empty(section, "path") {
            config.index.path = expand_tilde(v);
        }
    }

    // [limits] section
    if let Some(section) = ini.section(Some("limits")) {
        let limit_reason = "must be a positive integer";
        if let Some(v) = section.get("terrain") {
            config.limits.terrain = parse_positive(v, "limits", "terrain", limit_reason)?;
        }
        if let Some(v) = section.get("elevation") {
            config.limits.elevation = parse_positive(v, "limits", "elevation", limit_reason)?;
        }
        if let Some(v) = section.get("imagery") {
            config.limits.imagery = parse_positive(v, "limits", "imagery", limit_reason)?;
        }
        if let Some(v) = section.get("wait_timeout_secs") {
            config.limits.wait_timeout_secs = parse_positive(
                v,
                "limits",
                "wait_timeout_secs",
                "must be a positive integer (seconds)",
            )?;
        }
        if let Some(v) = section.get("negative_ttl_secs") {
            config.limits.negative_ttl_secs =
                parse_value(v, "limits", "negative_ttl_secs", "must be an integer (seconds)")?;
        }
    }

    // [terrain] section
    if let Some(section) = ini.section(Some("terrain")) {
        if let Some(v) = section.get("version") {
            config.terrain.version =
                parse_value(v, "terrain", "version", "must be a non-negative integer")?;
        }
        if let Some(v) = section.get("max_resolution") {
            config.terrain.max_resolution =
                parse_positive(v, "terrain", "max_resolution", "must be between 1 and 65535")?;
        }
        if let Some(v) = section.get("seed") {
            config.terrain.seed = parse_value(v, "terrain", "seed", "must be an unsigned integer")?;
        }
    }

    // [elevation] section
    if let Some(section) = ini.section(Some("elevation")) {
        if let Some(v) = non_empty(section, "base_url") {
            if !is_http_url(v) {
                return Err(invalid("elevation", "base_url", v, "must be an http(s) URL"));
            }
            config.elevation.base_url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = section.get("index") {
            config.elevation.index = match v.trim().to_lowercase().as_str() {
                "listing" => ElevationIndex::Listing,
                "shared" => ElevationIndex::Shared,
                _ => return Err(invalid("elevation", "index", v, "must be 'listing' or 'shared'")),
            };
        }
    }

    // [imagery] section
    if let Some(section) = ini.section(Some("imagery")) {
        if let Some(v) = non_empty(section, "provider") {
            if v.contains('/') {
                return Err(invalid("imagery", "provider", v, "must not contain '/'"));
            }
            config.imagery.provider = v.to_string();
        }
        if let Some(v) = non_empty(section, "url_template") {
            let has_placeholders = ["{z}", "{x}", "{y}"].iter().all(|p| v.contains(p));
            if !has_placeholders || !is_http_url(v) {
                return Err(invalid(
                    "imagery",
                    "url_template",
                    v,
                    "must be an http(s) URL containing {z}, {x} and {y}",
                ));
            }
            config.imagery.url_template = v.to_string();
        }
        if let Some(v) = non_empty(section, "api_key") {
            config.imagery.api_key = Some(v.to_string());
        }
        if let Some(v) = section.get("auth") {
            config.imagery.auth = match v.trim().to_lowercase().as_str() {
                "query" => ApiAuth::Query,
                "bearer" => ApiAuth::Bearer,
                _ => return Err(invalid("imagery", "auth", v, "must be 'query' or 'bearer'")),
            };
        }
        if let Some(v) = section.get("max_zoom") {
            let zoom: u8 = parse_value(v, "imagery", "max_zoom", "must be between 0 and 30")?;
            if zoom > 30 {
                return Err(invalid("imagery", "max_zoom", v, "must be between 0 and 30"));
            }
            config.imagery.max_zoom = zoom;
        }
    }

    // [delivery] section
    if let Some(section) = ini.section(Some("delivery")) {
        if let Some(v) = section.get("mode") {
            config.delivery.mode = match v.trim().to_lowercase().as_str() {
                "stream" => DeliveryMode::Stream,
                "redirect" => DeliveryMode::Redirect,
                _ => return Err(invalid("delivery", "mode", v, "must be 'stream' or 'redirect'")),
            };
        }
        if let Some(v) = non_empty(section, "cdn_base") {
            if !is_http_url(v) {
                return Err(invalid("delivery", "cdn_base", v, "must be an http(s) URL"));
            }
            config.delivery.cdn_base = Some(v.trim_end_matches('/').to_string());
        }
    }
    if config.delivery.mode == DeliveryMode::Redirect && config.delivery.cdn_base.is_none() {
        return Err(invalid("delivery", "cdn_base", "", "required when mode = redirect"));
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = non_empty(section, "directory") {
            config.logging.directory = expand_tilde(v);
        }
        if let Some(v) = non_empty(section, "level") {
            config.logging.level = v.to_string();
        }
    }

    Ok(config)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn non_empty<'a>(section: &'a Properties, key: &str) -> Option<&'a str> {
    section.get(key).map(str::trim).filter(|v| !v.is_empty())
}

fn parse_value<T: FromStr>(
    value: &str,
    section: &str,
    key: &str,
    reason: &str,
) -> Result<T, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, value, reason))
}

/// Like [`parse_value`] but rejects zero.
fn parse_positive<T: FromStr + Default + PartialEq>(
    value: &str,
    section: &str,
    key: &str,
    reason: &str,
) -> Result<T, ConfigFileError> {
    let parsed: T = parse_value(value, section, key, reason)?;
    if parsed == T::default() {
        return Err(invalid(section, key, value, reason));
    }
    Ok(parsed)
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// Expand ~ to home directory in paths.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
