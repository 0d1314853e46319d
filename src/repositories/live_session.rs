//! In-memory registry of live sessions.
//!
//! Every operation, including timed eviction, goes through the same lock.
//! Each session carries an abortable eviction task scheduled at creation.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::live_session::{HostIdentity, LiveSession, SessionKind};

/// Length of the random suffix of a session id.
const SESSION_ID_SUFFIX_LEN: usize = 8;

const SESSION_ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

struct Entry {
    session: LiveSession,
    eviction: JoinHandle<()>,
}

struct SessionMap {
    entries: RwLock<HashMap<String, Entry>>,
}

impl Drop for SessionMap {
    fn drop(&mut self) {
        for entry in self.entries.get_mut().values() {
            entry.eviction.abort();
        }
    }
}

/// The registry of live sessions, shared by cloning.
#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<SessionMap>,
    retention: Duration,
}

impl SessionRegistry {
    /// Creates a new `SessionRegistry`.
    ///
    /// # Arguments
    ///
    /// * `retention` - How long a session lives before it is evicted.
    pub fn new(retention: Duration) -> Self {
        Self {
            sessions: Arc::new(SessionMap {
                entries: RwLock::new(HashMap::new()),
            }),
            retention,
        }
    }

    /// Returns the retention window.
    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Creates a live session hosted by `host` and schedules its eviction.
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn create(
        &self,
        title: String,
        kind: SessionKind,
        host: HostIdentity,
        organization_id: Uuid,
    ) -> LiveSession {
        let mut sessions = self.sessions.entries.write().await;

        let mut id = generate_session_id();
        while sessions.contains_key(&id) {
            id = generate_session_id();
        }

        let session = LiveSession {
            id: id.clone(),
            title,
            kind,
            host,
            organization_id,
            participant_count: 0,
            created_at: Utc::now(),
            is_live: true,
        };

        let eviction = schedule_eviction(Arc::downgrade(&self.sessions), id.clone(), self.retention);
        sessions.insert(
            id,
            Entry {
                session: session.clone(),
                eviction,
            },
        );

        tracing::info!(
            "🎙️ Live session created: {} ({}) in org {}",
            session.id,
            session.kind,
            session.organization_id
        );
        session
    }

    /// Lists the live sessions of an organization, in no particular order.
    pub async fn list(&self, organization_id: Uuid) -> Vec<LiveSession> {
        let sessions = self.sessions.entries.read().await;
        sessions
            .values()
            .filter(|entry| entry.session.organization_id == organization_id)
            .map(|entry| entry.session.clone())
            .collect()
    }

    /// Closes a session on behalf of `requester`.
    ///
    /// # Returns
    ///
    /// `AppError::NotFound` if the session is not live, `AppError::Forbidden`
    /// if `requester` is not its host.
    pub async fn close(&self, session_id: &str, requester: Uuid) -> Result<()> {
        let mut sessions = self.sessions.entries.write().await;

        let entry = sessions.get(session_id).ok_or(AppError::NotFound)?;
        if !entry.session.is_hosted_by(requester) {
            tracing::warn!(
                "❌ User {} tried to close session {} hosted by {}",
                requester,
                session_id,
                entry.session.host.user_id
            );
            return Err(AppError::Forbidden);
        }

        if let Some(entry) = sessions.remove(session_id) {
            entry.eviction.abort();
        }

        tracing::info!("✅ Live session closed by host: {}", session_id);
        Ok(())
    }

    /// Returns the host of a live session.
    pub async fn lookup_host(&self, session_id: &str) -> Option<HostIdentity> {
        let sessions = self.sessions.entries.read().await;
        sessions.get(session_id).map(|entry| entry.session.host.clone())
    }

    /// Returns the number of live sessions across all organizations.
    pub async fn len(&self) -> usize {
        self.sessions.entries.read().await.len()
    }
}

/// Spawns the fire-once eviction of `id`. Holds only a weak handle so a
/// dropped registry is never kept alive by its timers.
fn schedule_eviction(sessions: Weak<SessionMap>, id: String, retention: Duration) -> JoinHandle<()> {
    let deadline = tokio::time::Instant::now() + retention;
    tokio::spawn(async move {
        tokio::time::sleep_until(deadline).await;

        if let Some(sessions) = sessions.upgrade() {
            evict(&sessions, &id).await;
        }
    })
}

/// Removes `id` when its retention window elapses. A session that is
/// already gone makes this a no-op.
async fn evict(sessions: &SessionMap, id: &str) -> bool {
    if sessions.entries.write().await.remove(id).is_some() {
        tracing::info!("🧹 Live session evicted after retention window: {}", id);
        true
    } else {
        tracing::debug!("Eviction of {} skipped, session already closed", id);
        false
    }
}

/// A millisecond timestamp plus a random suffix. Unique in practice, not
/// a security boundary.
fn generate_session_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SESSION_ID_SUFFIX_LEN)
        .map(|_| char::from(SESSION_ID_ALPHABET[rng.gen_range(0..SESSION_ID_ALPHABET.len())]))
        .collect();
    format!("live_{}_{}", Utc::now().timestamp_millis(), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const RETENTION: Duration = Duration::from_secs(4 * 3600);

    fn host(name: &str) -> HostIdentity {
        HostIdentity {
            user_id: Uuid::new_v4(),
            display_name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn created_session_is_listed_only_for_its_organization() {
        let registry = SessionRegistry::new(RETENTION);
        let org = Uuid::new_v4();
        let other_org = Uuid::new_v4();

        let session = registry
            .create("Sprint Retro".to_string(), SessionKind::Audio, host("ana"), org)
            .await;

        assert!(session.is_live);
        assert_eq!(session.participant_count, 0);

        let listed = registry.list(org).await;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, session.id);
        assert!(registry.list(other_org).await.is_empty());
    }

    #[tokio::test]
    async fn only_the_host_can_close() {
        let registry = SessionRegistry::new(RETENTION);
        let org = Uuid::new_v4();
        let owner = host("ana");
        let session = registry
            .create("Standup".to_string(), SessionKind::Video, owner.clone(), org)
            .await;

        let err = registry.close(&session.id, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
        assert_eq!(registry.list(org).await.len(), 1);

        registry.close(&session.id, owner.user_id).await.unwrap();
        assert!(registry.list(org).await.is_empty());

        let err = registry.close(&session.id, owner.user_id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }

    #[tokio::test]
    async fn lookup_host_reports_the_creator() {
        let registry = SessionRegistry::new(RETENTION);
        let owner = host("ana");
        let session = registry
            .create("Demo".to_string(), SessionKind::Audio, owner.clone(), Uuid::new_v4())
            .await;

        assert_eq!(registry.lookup_host(&session.id).await, Some(owner));
        assert_eq!(registry.lookup_host("live_missing").await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn session_is_evicted_after_retention_window() {
        let registry = SessionRegistry::new(RETENTION);
        let org = Uuid::new_v4();
        let owner = host("ana");
        let session = registry
            .create("Retro".to_string(), SessionKind::Audio, owner.clone(), org)
            .await;

        tokio::time::advance(RETENTION - Duration::from_secs(1)).await;
        tokio::task::yield_now().await;
        assert_eq!(registry.list(org).await.len(), 1);

        tokio::time::advance(Duration::from_secs(2)).await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(registry.list(org).await.is_empty());
        assert_eq!(registry.len().await, 0);

        let err = registry.close(&session.id, owner.user_id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }

    #[tokio::test(start_paused = true)]
    async fn closed_session_timer_does_not_touch_other_sessions() {
        let registry = SessionRegistry::new(Duration::from_secs(60));
        let org = Uuid::new_v4();
        let owner = host("ana");
        let first = registry
            .create("First".to_string(), SessionKind::Audio, owner.clone(), org)
            .await;
        registry.close(&first.id, owner.user_id).await.unwrap();

        tokio::time::advance(Duration::from_secs(30)).await;
        let second = registry
            .create("Second".to_string(), SessionKind::Audio, owner.clone(), org)
            .await;

        tokio::time::advance(Duration::from_secs(31)).await;
        tokio::time::sleep(Duration::from_millis(10)).await;

        let listed = registry.list(org).await;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, second.id);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_creates_get_unique_ids() {
        let registry = SessionRegistry::new(RETENTION);
        let org = Uuid::new_v4();

        let handles: Vec<_> = (0..100)
            .map(|i| {
                let registry = registry.clone();
                tokio::spawn(async move {
                    registry
                        .create(format!("Session {}", i), SessionKind::Video, host("ana"), org)
                        .await
                        .id
                })
            })
            .collect();

        let mut ids = HashSet::new();
        for handle in handles {
            assert!(ids.insert(handle.await.unwrap()));
        }
        assert_eq!(registry.list(org).await.len(), 100);
    }

    #[test]
    fn session_ids_have_timestamp_and_suffix() {
        let id = generate_session_id();
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "live");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), SESSION_ID_SUFFIX_LEN);
        assert!(parts[2].bytes().all(|b| b.is_ascii_digit() || b.is_ascii_lowercase()));
    }

    #[test]
    fn session_id_suffix_draws_digits_evenly() {
        let mut digits = 0usize;
        let mut total = 0usize;
        for _ in 0..2000 {
            let id = generate_session_id();
            let suffix = id.rsplit('_').next().unwrap();
            digits += suffix.bytes().filter(u8::is_ascii_digit).count();
            total += suffix.len();
        }
        // 10 of 36 symbols are digits.
        let share = digits as f64 / total as f64;
        assert!(share > 0.24 && share < 0.32, "digit share {share}");
    }

    #[tokio::test]
    async fn late_eviction_of_closed_session_is_a_noop() {
        let registry = SessionRegistry::new(RETENTION);
        let org = Uuid::new_v4();
        let owner = host("ana");
        let closed = registry
            .create("Closed".to_string(), SessionKind::Audio, owner.clone(), org)
            .await;
        let kept = registry
            .create("Kept".to_string(), SessionKind::Audio, owner.clone(), org)
            .await;
        registry.close(&closed.id, owner.user_id).await.unwrap();

        assert!(!evict(&registry.sessions, &closed.id).await);
        assert!(!evict(&registry.sessions, "live_0_missing").await);

        let listed = registry.list(org).await;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, kept.id);

        let err = registry.close(&closed.id, owner.user_id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }

    #[tokio::test]
    async fn dropping_registry_aborts_pending_evictions() {
        let metrics = tokio::runtime::Handle::current().metrics();
        let before = metrics.num_alive_tasks();

        let registry = SessionRegistry::new(RETENTION);
        for i in 0..3 {
            registry
                .create(format!("Session {}", i), SessionKind::Video, host("ana"), Uuid::new_v4())
                .await;
        }
        assert_eq!(metrics.num_alive_tasks(), before + 3);

        drop(registry);
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(metrics.num_alive_tasks(), before);
    }
}
