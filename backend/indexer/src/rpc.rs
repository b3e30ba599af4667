//! Soroban RPC client: polls `getEvents` and decodes CrowdFund ledger events.
//!
//! ## Resilience
//!
//! * Exponential back-off is applied when the RPC returns an error or rate-limit
//!   response, up to [`MAX_BACKOFF_SECS`] seconds.
//! * Transient network errors (connection reset, timeout) are retried silently.
//!
//! ## Decoding
//!
//! Topics and payloads arrive either JSON-decoded
//! (`{"type":"symbol","value":"contrib"}`) or as base64 XDR `ScVal`s, the
//! RPC default; both forms are understood (see [`crate::xdr`]).
//! Events from failed contract calls are dropped: the ledger rolled back the
//! state they describe.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::errors::{IndexerError, Result};
use crate::events::{EventKind, LedgerEvent};
use crate::xdr::{self, ScVal};

const MAX_BACKOFF_SECS: u64 = 60;
const INITIAL_BACKOFF_SECS: u64 = 2;

// ─────────────────────────────────────────────────────────
// JSON-RPC response shapes
// ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    pub result: Option<EventsResult>,
    pub error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct EventsResult {
    pub events: Vec<RawEvent>,
    pub cursor: Option<String>,
    #[serde(rename = "latestLedger")]
    pub latest_ledger: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RawEvent {
    pub topic: Vec<String>,
    pub value: Value,
    #[serde(rename = "contractId")]
    pub contract_id: Option<String>,
    #[serde(rename = "txHash")]
    pub tx_hash: Option<String>,
    pub id: Option<String>,
    pub ledger: Option<u64>,
    #[serde(rename = "ledgerClosedAt")]
    pub ledger_closed_at: Option<String>,
    #[serde(rename = "inSuccessfulContractCall")]
    pub in_successful_contract_call: Option<bool>,
    #[serde(rename = "pagingToken")]
    pub paging_token: Option<String>,
}

/// One page of `getEvents` output.
#[derive(Debug)]
pub struct EventPage {
    pub events: Vec<RawEvent>,
    pub cursor: Option<String>,
    pub latest_ledger: Option<u64>,
}

// ─────────────────────────────────────────────────────────
// Fetching
// ─────────────────────────────────────────────────────────

/// Fetch a page of ledger events.
///
/// * `start_ledger`: the ledger sequence to scan from (inclusive), used only
///   when there is no `cursor`.
/// * `cursor`: opaque pagination cursor from a previous page.
/// * `limit`: maximum number of events to return.
pub async fn fetch_events(
    client: &Client,
    rpc_url: &str,
    contract_id: &str,
    start_ledger: u32,
    cursor: Option<&str>,
    limit: u32,
) -> Result<EventPage> {
    let mut backoff = INITIAL_BACKOFF_SECS;
    let params = build_params(contract_id, start_ledger, cursor, limit);

    loop {
        let response = client
            .post(rpc_url)
            .json(&json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "getEvents",
                "params": params,
            }))
            .send()
            .await;

        let resp = match response {
            Ok(resp) => resp,
            Err(e) => {
                warn!("RPC request failed (will retry in {backoff}s): {e}");
                backoff = sleep_and_grow(backoff).await;
                continue;
            }
        };

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            warn!("Rate-limited by RPC (will retry in {backoff}s)");
            backoff = sleep_and_grow(backoff).await;
            continue;
        }

        let body: RpcResponse = resp.json().await?;

        if let Some(err) = body.error {
            // Invalid request / unknown method: retrying cannot succeed.
            if err.code == -32600 || err.code == -32601 {
                return Err(IndexerError::Rpc {
                    code: err.code,
                    message: err.message,
                });
            }
            warn!(
                "RPC soft error (will retry in {backoff}s): {} {}",
                err.code, err.message
            );
            backoff = sleep_and_grow(backoff).await;
            continue;
        }

        let result = body
            .result
            .ok_or_else(|| IndexerError::EventParse("Empty result from getEvents".to_string()))?;

        debug!(
            "Fetched {} events (latest_ledger={:?})",
            result.events.len(),
            result.latest_ledger
        );

        return Ok(EventPage {
            events: result.events,
            cursor: result.cursor,
            latest_ledger: result.latest_ledger,
        });
    }
}

async fn sleep_and_grow(backoff: u64) -> u64 {
    tokio::time::sleep(Duration::from_secs(backoff)).await;
    (backoff * 2).min(MAX_BACKOFF_SECS)
}

fn build_params(contract_id: &str, start_ledger: u32, cursor: Option<&str>, limit: u32) -> Value {
    let mut params = json!({
        "filters": [
            {
                "type": "contract",
                "contractIds": [contract_id]
            }
        ],
        "pagination": {
            "limit": limit
        }
    });

    if let Some(cur) = cursor {
        params["pagination"]["cursor"] = json!(cur);
    } else {
        params["startLedger"] = json!(start_ledger);
    }

    params
}

// ─────────────────────────────────────────────────────────
// Event decoding
// ─────────────────────────────────────────────────────────

/// Decode a page of raw RPC events into [`LedgerEvent`]s.
pub fn decode_events(raw: &[RawEvent], contract_id: &str) -> Vec<LedgerEvent> {
    raw.iter()
        .enumerate()
        .filter(|(_, e)| e.in_successful_contract_call != Some(false))
        .filter_map(|(i, e)| decode_single(e, i, contract_id))
        .collect()
}

fn decode_single(raw: &RawEvent, index: usize, contract_id: &str) -> Option<LedgerEvent> {
    let first_topic = raw.topic.first()?;
    let kind = EventKind::from_topic(&extract_symbol(first_topic)?);

    let ledger = raw.ledger.unwrap_or(0) as i64;
    let timestamp = raw
        .ledger_closed_at
        .as_deref()
        .and_then(parse_iso_to_unix)
        .unwrap_or(0);
    let tx_hash = raw.tx_hash.as_deref().map(normalize_tx_hash);

    // The RPC id is globally unique; the fallback is only stable within a page.
    let event_id = raw
        .id
        .clone()
        .or_else(|| raw.paging_token.clone())
        .unwrap_or_else(|| format!("{ledger}-{}-{index}", tx_hash.as_deref().unwrap_or("")));

    let (actor, amount) = decode_data(&raw.value, kind);

    Some(LedgerEvent {
        event_id,
        event_type: kind.as_str().to_string(),
        actor,
        amount,
        ledger,
        timestamp,
        contract_id: raw
            .contract_id
            .clone()
            .unwrap_or_else(|| contract_id.to_string()),
        tx_hash,
    })
}

/// Pull the actor and amount out of the event data payload.
fn decode_data(value: &Value, kind: EventKind) -> (Option<String>, Option<String>) {
    let (actor_keys, amount_keys): (&[&str], &[&str]) = match kind {
        EventKind::LedgerCreated => (&["beneficiary"], &["threshold"]),
        EventKind::ContributionReceived | EventKind::WithdrawalIssued => {
            (&["contributor", "address"], &["amount"])
        }
        EventKind::PayoutSent => (&["recipient", "beneficiary"], &["amount"]),
        EventKind::CollectionOpen | EventKind::Unknown => return (None, None),
    };

    match value {
        Value::String(raw) => match xdr::decode(raw) {
            Some(payload) => (payload.field(actor_keys), payload.field(amount_keys)),
            None => {
                warn!("Undecodable {} payload: {raw}", kind.as_str());
                (None, None)
            }
        },
        _ => (
            extract_field(value, actor_keys),
            extract_field(value, amount_keys),
        ),
    }
}

fn extract_field(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match value.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        // Typed wrapper: {"type":"i128","value":"1000"}
        Value::Object(inner) => match inner.get("value")? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        },
        _ => None,
    })
}

/// Extract a Soroban symbol from a topic entry.
///
/// Accepts `{"type":"symbol","value":"open"}`, a base64 XDR `ScVal::Symbol`,
/// or a bare symbol string.
fn extract_symbol(raw: &str) -> Option<String> {
    if let Ok(v) = serde_json::from_str::<Value>(raw) {
        return v.get("value").and_then(|x| x.as_str()).map(String::from);
    }
    if let Some(ScVal::Symbol(symbol)) = xdr::decode(raw) {
        return Some(symbol);
    }
    Some(raw.to_string())
}

/// Lower-case hex transaction hashes so the same tx always compares equal.
fn normalize_tx_hash(raw: &str) -> String {
    match hex::decode(raw) {
        Ok(bytes) => hex::encode(bytes),
        Err(_) => raw.to_string(),
    }
}

/// Parse an RFC 3339 timestamp into a Unix epoch (seconds).
fn parse_iso_to_unix(s: &str) -> Option<i64> {
    chrono::DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.timestamp())
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_event(topic: &str, value: Value) -> RawEvent {
        RawEvent {
            topic: vec![topic.to_string()],
            value,
            contract_id: Some("CCROWD".to_string()),
            tx_hash: Some("AB12CD".to_string()),
            id: Some("0000004294971392-0000000001".to_string()),
            ledger: Some(1000),
            ledger_closed_at: Some("2024-01-01T00:00:00Z".to_string()),
            in_successful_contract_call: Some(true),
            paging_token: None,
        }
    }

    fn xdr_symbol(symbol: &str) -> String {
        xdr::tests::encode(&xdr::tests::symbol(symbol))
    }

    #[test]
    fn extract_symbol_from_json() {
        let raw = r#"{"type":"symbol","value":"contrib"}"#;
        assert_eq!(extract_symbol(raw).as_deref(), Some("contrib"));
    }

    #[test]
    fn extract_symbol_from_xdr() {
        assert_eq!(extract_symbol(&xdr_symbol("withdrawn")).as_deref(), Some("withdrawn"));
        assert_eq!(extract_symbol(&xdr_symbol("open")).as_deref(), Some("open"));
    }

    #[test]
    fn extract_symbol_raw_fallback() {
        assert_eq!(extract_symbol("payout").as_deref(), Some("payout"));
    }

    #[test]
    fn decode_contribution_event() {
        let raw = raw_event(
            r#"{"type":"symbol","value":"contrib"}"#,
            json!({ "contributor": "GALICE", "amount": "5000" }),
        );

        let events = decode_events(&[raw], "CCROWD");
        assert_eq!(events.len(), 1);
        let ev = &events[0];
        assert_eq!(ev.event_type, "contribution_received");
        assert_eq!(ev.event_id, "0000004294971392-0000000001");
        assert_eq!(ev.actor.as_deref(), Some("GALICE"));
        assert_eq!(ev.amount.as_deref(), Some("5000"));
        assert_eq!(ev.ledger, 1000);
        assert_eq!(ev.timestamp, 1_704_067_200);
        assert_eq!(ev.tx_hash.as_deref(), Some("ab12cd"));
    }

    #[test]
    fn decode_payout_with_typed_amount() {
        let raw = raw_event(
            &xdr_symbol("payout"),
            json!({
                "recipient": "GBENEFICIARY",
                "amount": { "type": "i128", "value": "170141183460469231731687303715884105727" }
            }),
        );

        let events = decode_events(&[raw], "CCROWD");
        assert_eq!(events[0].event_type, "payout_sent");
        assert_eq!(events[0].actor.as_deref(), Some("GBENEFICIARY"));
        assert_eq!(
            events[0].amount.as_deref(),
            Some("170141183460469231731687303715884105727")
        );
    }

    #[test]
    fn decode_contribution_with_xdr_payload() {
        use crate::xdr::tests::{account, encode, int128, map, ZERO_ACCOUNT};

        let payload = encode(&map(&[
            ("amount", int128(5_000)),
            ("contributor", account([0; 32])),
        ]));
        let raw = raw_event(&xdr_symbol("contrib"), Value::String(payload));

        let events = decode_events(&[raw], "CCROWD");
        assert_eq!(events[0].event_type, "contribution_received");
        assert_eq!(events[0].actor.as_deref(), Some(ZERO_ACCOUNT));
        assert_eq!(events[0].amount.as_deref(), Some("5000"));
    }

    #[test]
    fn decode_created_with_xdr_payload() {
        use crate::xdr::tests::{account, encode, int128, map, ZERO_ACCOUNT};

        // ScVal::U64
        let mut deadline = 5u32.to_be_bytes().to_vec();
        deadline.extend_from_slice(&3_600u64.to_be_bytes());
        let payload = encode(&map(&[
            ("beneficiary", account([0; 32])),
            ("deadline", deadline),
            ("threshold", int128(10_000_000)),
        ]));
        let raw = raw_event(&xdr_symbol("created"), Value::String(payload));

        let events = decode_events(&[raw], "CCROWD");
        assert_eq!(events[0].event_type, "ledger_created");
        assert_eq!(events[0].actor.as_deref(), Some(ZERO_ACCOUNT));
        assert_eq!(events[0].amount.as_deref(), Some("10000000"));
    }

    #[test]
    fn undecodable_payload_keeps_event_without_fields() {
        let raw = raw_event(&xdr_symbol("withdrawn"), json!("not-xdr"));
        let events = decode_events(&[raw], "CCROWD");
        assert_eq!(events[0].event_type, "withdrawal_issued");
        assert!(events[0].actor.is_none());
        assert!(events[0].amount.is_none());
    }

    #[test]
    fn decode_open_event_has_no_payload() {
        let raw = raw_event(r#"{"type":"symbol","value":"open"}"#, Value::Null);
        let events = decode_events(&[raw], "CCROWD");
        assert_eq!(events[0].event_type, "collection_open");
        assert!(events[0].actor.is_none());
        assert!(events[0].amount.is_none());
    }

    #[test]
    fn events_from_failed_calls_are_dropped() {
        let mut raw = raw_event(
            r#"{"type":"symbol","value":"contrib"}"#,
            json!({ "contributor": "GALICE", "amount": "1" }),
        );
        raw.in_successful_contract_call = Some(false);
        assert!(decode_events(&[raw], "CCROWD").is_empty());
    }

    #[test]
    fn missing_id_falls_back_to_paging_token() {
        let mut raw = raw_event(r#"{"type":"symbol","value":"open"}"#, Value::Null);
        raw.id = None;
        raw.paging_token = Some("PT-7".to_string());
        assert_eq!(decode_events(&[raw], "CCROWD")[0].event_id, "PT-7");
    }

    #[test]
    fn cursor_replaces_start_ledger() {
        let params = build_params("CCROWD", 42, Some("abc"), 10);
        assert_eq!(params["pagination"]["cursor"], "abc");
        assert!(params.get("startLedger").is_none());

        let params = build_params("CCROWD", 42, None, 10);
        assert_eq!(params["startLedger"], 42);
    }

    #[test]
    fn parse_iso_timestamp() {
        let ts = parse_iso_to_unix("2024-01-01T00:00:00Z").unwrap();
        assert_eq!(ts, 1_704_067_200);
    }
}
