//! Background task that polls the Soroban RPC and stores decoded ledger events.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::db;
use crate::errors::Result;
use crate::rpc;

pub struct IndexerState {
    pub pool: SqlitePool,
    pub config: Config,
    pub client: Client,
}

/// Where the next poll starts.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Position {
    ledger: u32,
    cursor: Option<String>,
}

/// Poll until `shutdown` is cancelled.
pub async fn run(state: Arc<IndexerState>, shutdown: CancellationToken) {
    info!("Indexer starting for contract {}", state.config.contract_id);

    let mut position = resume_position(&state.pool, state.config.start_ledger).await;
    info!("Resuming from ledger {}", position.ledger);

    let interval = Duration::from_secs(state.config.poll_interval_secs);
    loop {
        let polled = tokio::select! {
            _ = shutdown.cancelled() => break,
            polled = poll_once(&state, &position) => polled,
        };
        match polled {
            Ok(next) => position = next,
            Err(e) => error!("Indexer poll error: {e}"),
        }

        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }

    info!("Indexer stopped at ledger {}", position.ledger);
}

/// The saved cursor, or `start_ledger` on a fresh database or when the saved
/// cursor cannot be read.
async fn resume_position(pool: &SqlitePool, start_ledger: u32) -> Position {
    let last_ledger = db::get_last_ledger(pool).await.unwrap_or_else(|e| {
        warn!("Could not read last ledger, starting from {start_ledger}: {e}");
        0
    });
    let cursor = db::get_cursor_string(pool).await.unwrap_or_else(|e| {
        warn!("Could not read saved cursor, paging from ledger instead: {e}");
        None
    });

    Position {
        ledger: if last_ledger > 0 {
            last_ledger as u32
        } else {
            start_ledger
        },
        cursor,
    }
}

async fn poll_once(state: &IndexerState, position: &Position) -> Result<Position> {
    let page = rpc::fetch_events(
        &state.client,
        &state.config.rpc_url,
        &state.config.contract_id,
        position.ledger,
        position.cursor.as_deref(),
        state.config.events_per_page,
    )
    .await?;

    if !page.events.is_empty() {
        let decoded = rpc::decode_events(&page.events, &state.config.contract_id);
        let inserted = db::insert_events(&state.pool, &decoded).await?;
        info!(
            "Polled {} raw events → {} new records stored",
            page.events.len(),
            inserted
        );
    }

    let next = Position {
        ledger: next_ledger(position.ledger, page.latest_ledger),
        // Keep the previous cursor when the RPC omits one, so we never rescan
        // from `ledger` and re-fetch the whole range.
        cursor: page.cursor.or_else(|| position.cursor.clone()),
    };

    // Persist so restarts are deterministic.
    db::save_cursor(&state.pool, next.ledger as i64, next.cursor.as_deref()).await?;

    Ok(next)
}

/// Never move the start ledger backwards.
fn next_ledger(current: u32, latest: Option<u64>) -> u32 {
    latest
        .map(|l| u32::try_from(l).unwrap_or(u32::MAX).max(current))
        .unwrap_or(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::memory_pool;

    #[test]
    fn next_ledger_is_monotonic() {
        assert_eq!(next_ledger(100, Some(150)), 150);
        assert_eq!(next_ledger(100, Some(90)), 100);
        assert_eq!(next_ledger(100, None), 100);
    }

    #[tokio::test]
    async fn resume_uses_start_ledger_on_fresh_db() {
        let pool = memory_pool().await;
        let position = resume_position(&pool, 777).await;
        assert_eq!(
            position,
            Position {
                ledger: 777,
                cursor: None
            }
        );
    }

    #[tokio::test]
    async fn resume_prefers_saved_cursor() {
        let pool = memory_pool().await;
        db::save_cursor(&pool, 900, Some("c-900")).await.unwrap();

        let position = resume_position(&pool, 777).await;
        assert_eq!(position.ledger, 900);
        assert_eq!(position.cursor.as_deref(), Some("c-900"));
    }

    #[tokio::test]
    async fn resume_falls_back_when_cursor_unreadable() {
        let pool = memory_pool().await;
        db::save_cursor(&pool, 900, Some("c-900")).await.unwrap();
        pool.close().await;

        let position = resume_position(&pool, 777).await;
        assert_eq!(
            position,
            Position {
                ledger: 777,
                cursor: None
            }
        );
    }
}
