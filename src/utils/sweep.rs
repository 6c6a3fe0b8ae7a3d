use chrono::{DateTime, Local};
use tokio::time::{self, Duration, MissedTickBehavior};

use crate::{
    error::AppResult,
    messages::{Message, LEFT},
    participants::Participant,
    state::Store,
};

/// Background loop: every `every`, evict whoever has been quiet longer than `stale_after`.
pub async fn task(store: Store, every: Duration, stale_after: Duration) {
    let mut tick = time::interval(every);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tick.tick().await; // the first tick is immediate, nobody can be stale yet

    loop {
        tick.tick().await;
        match sweep(&store, Local::now(), stale_after).await {
            Ok(0)  => tracing::debug!("sweep: nobody to evict"),
            Ok(n)  => tracing::info!(evicted = n, "sweep: removed idle participants"),
            Err(e) => tracing::error!(error = %e, "sweep failed, retrying next tick"),
        }
    }
}

/// One pass. Returns how many participants were evicted.
pub async fn sweep(store: &Store, now: DateTime<Local>, stale_after: Duration) -> AppResult<usize> {
    let cutoff = i64::try_from(stale_after.as_millis()).unwrap_or(i64::MAX);
    let now_ms = now.timestamp_millis();

    let stale: Vec<Participant> = store
        .participants()
        .await?
        .into_iter()
        .filter(|p| now_ms.saturating_sub(p.last_status) > cutoff)
        .collect();
    if stale.is_empty() {
        return Ok(0);
    }

    let farewells: Vec<Message> = stale.iter().map(|p| Message::status(&p.name, LEFT, &now)).collect();
    let ids: Vec<&str> = stale.iter().map(|p| p.id.as_str()).collect();
    store.evict(&ids, &farewells).await?;

    for p in &stale {
        tracing::debug!(name = %p.name, "evicted");
    }
    Ok(stale.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        messages::{Kind, BROADCAST},
        state::test_store,
    };

    const STALE: Duration = Duration::from_secs(10);

    #[tokio::test]
    async fn evicts_only_the_stale() {
        let store = test_store().await;
        let t0 = Local::now();
        store.register(Some("Alice"), &t0).await.unwrap();
        store.register(Some("Bob"), &t0).await.unwrap();
        store.heartbeat(Some("Bob"), &(t0 + chrono::Duration::seconds(8))).await.unwrap();

        let n = sweep(&store, t0 + chrono::Duration::seconds(11), STALE).await.unwrap();
        assert_eq!(n, 1);

        let names: Vec<_> = store.participants().await.unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(names, ["Bob"]);

        let log = store.all_messages().await.unwrap();
        let bye = log.last().unwrap();
        assert_eq!(bye.from, "Alice");
        assert_eq!(bye.to, BROADCAST);
        assert_eq!(bye.text, LEFT);
        assert_eq!(bye.kind, Kind::Status);
    }

    #[tokio::test]
    async fn threshold_is_strict() {
        let store = test_store().await;
        let t0 = Local::now();
        store.register(Some("Alice"), &t0).await.unwrap();

        assert_eq!(sweep(&store, t0 + chrono::Duration::seconds(10), STALE).await.unwrap(), 0);
        assert_eq!(sweep(&store, t0 + chrono::Duration::milliseconds(10_001), STALE).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn idle_sweep_changes_nothing() {
        let store = test_store().await;
        let t0 = Local::now();
        store.register(Some("Alice"), &t0).await.unwrap();
        let before = (store.participants().await.unwrap(), store.all_messages().await.unwrap());

        assert_eq!(sweep(&store, t0 + chrono::Duration::seconds(3), STALE).await.unwrap(), 0);
        let after = (store.participants().await.unwrap(), store.all_messages().await.unwrap());
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn empty_room_is_a_no_op() {
        let store = test_store().await;
        assert_eq!(sweep(&store, Local::now(), STALE).await.unwrap(), 0);
        assert!(store.all_messages().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn evicts_everyone_in_one_batch() {
        let store = test_store().await;
        let t0 = Local::now();
        for name in ["A", "B", "C"] {
            store.register(Some(name), &t0).await.unwrap();
        }

        assert_eq!(sweep(&store, t0 + chrono::Duration::minutes(1), STALE).await.unwrap(), 3);
        assert!(store.participants().await.unwrap().is_empty());

        let farewells: Vec<_> = store.all_messages().await.unwrap()
            .into_iter()
            .filter(|m| m.text == LEFT)
            .map(|m| m.from)
            .collect();
        assert_eq!(farewells, ["A", "B", "C"]);
    }

    #[tokio::test]
    async fn task_survives_a_failed_sweep() {
        let store = test_store().await;
        store.register(Some("Alice"), &(Local::now() - chrono::Duration::minutes(1))).await.unwrap();

        // farewells have nowhere to go, so every pass errors out
        sqlx::query("DROP TABLE messages").execute(store.pool()).await.unwrap();
        let sweeper = tokio::spawn(task(store.clone(), Duration::from_millis(20), STALE));

        time::sleep(Duration::from_millis(150)).await;
        assert!(!sweeper.is_finished());
        assert_eq!(store.participants().await.unwrap().len(), 1);

        store.init().await.unwrap();
        let evicted = time::timeout(Duration::from_secs(5), async {
            while !store.participants().await.unwrap().is_empty() {
                time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await;
        sweeper.abort();

        assert!(evicted.is_ok(), "a later tick should still evict Alice");
        let log = store.all_messages().await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].from, "Alice");
        assert_eq!(log[0].text, LEFT);
    }

    #[tokio::test]
    async fn evicted_name_can_register_again() {
        let store = test_store().await;
        let t0 = Local::now();
        store.register(Some("Alice"), &t0).await.unwrap();
        sweep(&store, t0 + chrono::Duration::seconds(30), STALE).await.unwrap();

        store.register(Some("Alice"), &Local::now()).await.unwrap();
        assert_eq!(store.participants().await.unwrap().len(), 1);
    }
}
