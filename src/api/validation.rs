//! Request Validation
//!
//! Pure functions turning raw query strings and request bodies into typed
//! parameters. Everything that reaches [`crate::service::BroadcastService`]
//! has passed through here.

use serde::Deserialize;

use crate::config::TowerConfig;
use crate::error::ValidationError;
use crate::store::{MessageQuery, Order};

/// Validated body of a broadcast request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastRequest {
    pub message_text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BroadcastBody {
    message_text: Option<String>,
}

/// Body encodings accepted for broadcasts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Json,
    Form,
}

impl BodyKind {
    /// Classify a `Content-Type` header value
    pub fn from_content_type(content_type: Option<&str>) -> Option<Self> {
        let mime = content_type?.split(';').next()?.trim();
        if mime.eq_ignore_ascii_case("application/json") {
            Some(BodyKind::Json)
        } else if mime.eq_ignore_ascii_case("application/x-www-form-urlencoded") {
            Some(BodyKind::Form)
        } else {
            None
        }
    }
}

/// Parse and validate a broadcast body
pub fn parse_broadcast(
    content_type: Option<&str>,
    body: &[u8],
    max_message_size_bytes: usize,
) -> Result<BroadcastRequest, ValidationError> {
    let message_text = match BodyKind::from_content_type(content_type) {
        Some(BodyKind::Json) => {
            let parsed: BroadcastBody = serde_json::from_slice(body)
                .map_err(|e| ValidationError::MalformedBody(e.to_string()))?;
            parsed.message_text
        }
        Some(BodyKind::Form) => {
            let body = std::str::from_utf8(body)
                .map_err(|e| ValidationError::MalformedBody(e.to_string()))?;
            let mut message_text = None;
            for (key, value) in form_pairs(body)? {
                if key == "messageText" {
                    if message_text.is_some() {
                        return Err(ValidationError::DuplicateParameter("messageText"));
                    }
                    message_text = Some(value);
                }
            }
            message_text
        }
        None => None,
    };

    let message_text = message_text.ok_or(ValidationError::MissingMessage)?;
    if message_text.len() > max_message_size_bytes {
        return Err(ValidationError::MessageTooLarge {
            size: message_text.len(),
            limit: max_message_size_bytes,
        });
    }

    Ok(BroadcastRequest { message_text })
}

/// Parse and validate `/api/v1/messages` query parameters
pub fn parse_messages_query(
    query: Option<&str>,
    config: &TowerConfig,
) -> Result<MessageQuery, ValidationError> {
    let mut starts_with = None;
    let mut timestamp_from = None;
    let mut timestamp_to = None;
    let mut order = None;
    let mut limit = None;

    for (key, value) in form_pairs(query.unwrap_or(""))? {
        match key.as_str() {
            "startsWith" => set_once(&mut starts_with, "startsWith", value)?,
            "timestampFrom" => set_once(&mut timestamp_from, "timestampFrom", value)?,
            "timestampTo" => set_once(&mut timestamp_to, "timestampTo", value)?,
            "order" => set_once(&mut order, "order", value)?,
            "limit" => set_once(&mut limit, "limit", value)?,
            _ => {}
        }
    }

    let starts_with = match starts_with {
        Some(prefix) if prefix.len() > config.max_message_size_bytes => {
            return Err(ValidationError::invalid(
                "startsWith",
                format!("longer than {} bytes", config.max_message_size_bytes),
            ));
        }
        Some(prefix) if prefix.is_empty() => None,
        other => other,
    };

    let order = match order {
        Some(value) => value
            .parse::<Order>()
            .map_err(|reason| ValidationError::invalid("order", reason))?,
        None => Order::default(),
    };

    Ok(MessageQuery {
        order,
        timestamp_from: parse_timestamp("timestampFrom", timestamp_from)?,
        timestamp_to: parse_timestamp("timestampTo", timestamp_to)?,
        starts_with,
        limit: parse_limit(limit, config.max_messages_per_query)?,
    })
}

fn set_once(
    slot: &mut Option<String>,
    name: &'static str,
    value: String,
) -> Result<(), ValidationError> {
    if slot.is_some() {
        return Err(ValidationError::DuplicateParameter(name));
    }
    *slot = Some(value);
    Ok(())
}

fn parse_timestamp(
    name: &'static str,
    value: Option<String>,
) -> Result<Option<i64>, ValidationError> {
    match value.as_deref() {
        None | Some("") => Ok(None),
        Some(raw) => raw
            .parse::<i64>()
            .map(Some)
            .map_err(|_| ValidationError::invalid(name, format!("'{}' is not an integer", raw))),
    }
}

/// Missing or empty means the maximum; values above it are clamped
fn parse_limit(value: Option<String>, max: usize) -> Result<usize, ValidationError> {
    match value.as_deref() {
        None | Some("") => Ok(max),
        Some(raw) => match raw.parse::<i64>() {
            Ok(n) if n >= 1 => Ok(usize::try_from(n).unwrap_or(usize::MAX).min(max)),
            Ok(_) => Err(ValidationError::invalid("limit", "must be a positive integer")),
            Err(_) => Err(ValidationError::invalid(
                "limit",
                format!("'{}' is not an integer", raw),
            )),
        },
    }
}

/// Split an `application/x-www-form-urlencoded` string into decoded pairs
pub fn form_pairs(input: &str) -> Result<Vec<(String, String)>, ValidationError> {
    input
        .split('&')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let (key, value) = segment.split_once('=').unwrap_or((segment, ""));
            Ok((decode_component(key)?, decode_component(value)?))
        })
        .collect()
}

fn decode_component(raw: &str) -> Result<String, ValidationError> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| ValidationError::MalformedBody(format!("invalid percent-encoding: {}", e)))
}

// =============================================================================
// Tests
// =============================================================================
