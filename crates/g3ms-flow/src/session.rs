//! Idle-session tracking.
//!
//! One timer per session: started on login, reset by activity, and on
//! expiry the persisted access and CSRF tokens are cleared and a
//! timeout event is emitted for the host to navigate to the login
//! screen.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use g3ms_client::TokenManager;
use tokio::sync::{watch, Notify};

/// Idle window before a session is forcibly ended.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Session lifecycle events observable by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// The session is live (initial state, and after each `start`).
    Active,
    /// The idle window elapsed; tokens were cleared.
    TimedOut,
}

/// Tracks user activity and force-ends idle sessions.
#[derive(Debug)]
pub struct SessionManager {
    tokens: TokenManager,
    timeout: Duration,
    activity: Arc<Notify>,
    events: watch::Sender<SessionEvent>,
    receiver: watch::Receiver<SessionEvent>,
    task: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl SessionManager {
    pub fn new(tokens: TokenManager, timeout: Duration) -> Self {
        let (events, receiver) = watch::channel(SessionEvent::Active);
        Self {
            tokens,
            timeout,
            activity: Arc::new(Notify::new()),
            events,
            receiver,
            task: Mutex::new(None),
        }
    }

    /// Start the idle timer. Restarting replaces any live timer, so at
    /// most one is ever running.
    pub fn start(&self) {
        let mut task = self.task.lock().unwrap();
        if let Some(handle) = task.take() {
            handle.abort();
        }
        let _ = self.events.send(SessionEvent::Active);

        let tokens = self.tokens.clone();
        let timeout = self.timeout;
        let activity = Arc::clone(&self.activity);
        let events = self.events.clone();

        *task = Some(tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = activity.notified() => {
                        // Activity resets the window.
                    }
                    _ = tokio::time::sleep(timeout) => {
                        tracing::info!("idle timeout reached, ending session");
                        tokens.clear_session_tokens().await;
                        let _ = events.send(SessionEvent::TimedOut);
                        break;
                    }
                }
            }
        }));
    }

    /// Record user activity, resetting the idle window. Inert when no
    /// timer is running.
    pub fn touch(&self) {
        self.activity.notify_one();
    }

    /// Stop the idle timer. Idempotent; `touch` calls afterwards are
    /// inert.
    pub fn end(&self) {
        if let Some(handle) = self.task.lock().unwrap().take() {
            handle.abort();
        }
    }

    /// Whether a timer is currently live.
    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .unwrap()
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Subscribe to session lifecycle events.
    pub fn subscribe(&self) -> watch::Receiver<SessionEvent> {
        self.receiver.clone()
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        if let Some(handle) = self.task.lock().unwrap().take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use g3ms_core::storage::MemoryStore;
    use g3ms_client::TokenPair;

    fn manager(timeout: Duration) -> (SessionManager, TokenManager) {
        let tokens = TokenManager::new(Arc::new(MemoryStore::new()));
        (SessionManager::new(tokens.clone(), timeout), tokens)
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_clears_tokens_and_emits_event() {
        let (session, tokens) = manager(Duration::from_secs(60));
        tokens
            .set_tokens(&TokenPair {
                access_token: "at".into(),
                refresh_token: "rt".into(),
            })
            .await
            .unwrap();
        tokens.ensure_csrf_token().await;

        let mut rx = session.subscribe();
        session.start();

        rx.changed().await.unwrap(); // Active on start
        rx.changed().await.unwrap(); // TimedOut after the idle window
        assert_eq!(*rx.borrow(), SessionEvent::TimedOut);

        assert_eq!(tokens.access_token().await, None);
        assert_eq!(tokens.csrf_token().await, None);
        // The refresh-token record is untouched by the idle path.
        assert_eq!(tokens.refresh_token().await, Some("rt".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_activity_resets_the_window() {
        let (session, _tokens) = manager(Duration::from_secs(60));
        session.start();

        tokio::time::advance(Duration::from_secs(40)).await;
        session.touch();
        // Let the timer task observe the activity before advancing again.
        tokio::task::yield_now().await;
        tokio::time::advance(Duration::from_secs(40)).await;
        tokio::task::yield_now().await;

        // 80s elapsed but never 60s without activity.
        assert_eq!(*session.subscribe().borrow(), SessionEvent::Active);
        assert!(session.is_running());
    }

    #[tokio::test]
    async fn test_end_is_idempotent() {
        let (session, _tokens) = manager(Duration::from_secs(60));
        session.start();
        session.end();
        session.end();
        assert!(!session.is_running());
        session.touch(); // inert
    }

    #[tokio::test]
    async fn test_restart_replaces_timer() {
        let (session, _tokens) = manager(Duration::from_secs(60));
        session.start();
        session.start();
        assert!(session.is_running());
    }
}
