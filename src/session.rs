//! Sessions that own a paginated reply.
//!
//! Every analysis reply gets its own session id; navigation requests name the
//! session they belong to. The store is bounded and evicts the least recently
//! used session once full.

use crate::paginator::{PageView, Paginator};
use anyhow::{anyhow, Result};
use log::{debug, info};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use uuid::Uuid;

pub const DEFAULT_MAX_SESSIONS: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Current,
    Next,
    Previous,
}

#[derive(Debug)]
pub struct SessionStore {
    sessions: Mutex<LruCache<Uuid, Paginator>>,
}

impl SessionStore {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self { sessions: Mutex::new(LruCache::new(capacity)) }
    }

    /// Store a paginator and hand back the id that addresses it.
    pub fn open(&self, paginator: Paginator) -> Result<(Uuid, PageView)> {
        let id = Uuid::new_v4();
        let view = paginator.view();
        let mut sessions = self.lock()?;
        if let Some((evicted, _)) = sessions.push(id, paginator) {
            info!("Session store full, evicted session {}", evicted);
        }
        debug!("Opened session {} ({} pages)", id, view.pages);
        Ok((id, view))
    }

    /// Move within a session and return what is now on screen.
    ///
    /// `Ok(None)` means the session is unknown (closed or evicted).
    pub fn navigate(&self, id: Uuid, navigation: Navigation) -> Result<Option<PageView>> {
        let mut sessions = self.lock()?;
        let Some(paginator) = sessions.get_mut(&id) else {
            debug!("Navigation on unknown session {}", id);
            return Ok(None);
        };
        match navigation {
            Navigation::Current => {}
            Navigation::Next => paginator.next(),
            Navigation::Previous => paginator.previous(),
        }
        Ok(Some(paginator.view()))
    }

    pub fn close(&self, id: Uuid) -> Result<bool> {
        let closed = self.lock()?.pop(&id).is_some();
        if closed {
            debug!("Closed session {}", id);
        }
        Ok(closed)
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, LruCache<Uuid, Paginator>>> {
        self.sessions.lock().map_err(|_| anyhow!("Session store lock poisoned"))
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SESSIONS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilteredRow;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn paginator(n: usize, page_size: usize) -> Paginator {
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let rows: Vec<FilteredRow> =
            (0..n).map(|i| FilteredRow::new(format!("R{}", i), date)).collect();
        Paginator::new(&rows, page_size).unwrap()
    }

    #[test]
    fn navigates_an_open_session() -> Result<()> {
        let store = SessionStore::default();
        let (id, first) = store.open(paginator(5, 2))?;
        assert_eq!(first.page, 0);
        assert_eq!(first.pages, 3);

        let view = store.navigate(id, Navigation::Previous)?.unwrap();
        assert_eq!(view.page, 2);
        assert_eq!(view.content, "5. R4 2025-06-01");

        let view = store.navigate(id, Navigation::Next)?.unwrap();
        assert_eq!(view.page, 0);
        assert_eq!(store.navigate(id, Navigation::Current)?.unwrap().page, 0);
        Ok(())
    }

    #[test]
    fn sessions_are_independent() -> Result<()> {
        let store = SessionStore::default();
        let (a, _) = store.open(paginator(4, 1))?;
        let (b, _) = store.open(paginator(4, 1))?;
        store.navigate(a, Navigation::Next)?;
        store.navigate(a, Navigation::Next)?;
        assert_eq!(store.navigate(a, Navigation::Current)?.unwrap().page, 2);
        assert_eq!(store.navigate(b, Navigation::Current)?.unwrap().page, 0);
        Ok(())
    }

    #[test]
    fn closed_session_is_gone() -> Result<()> {
        let store = SessionStore::default();
        let (id, _) = store.open(paginator(1, 30))?;
        assert!(store.close(id)?);
        assert!(!store.close(id)?);
        assert_eq!(store.navigate(id, Navigation::Next)?, None);
        assert!(store.is_empty()?);
        Ok(())
    }

    #[test]
    fn evicts_least_recently_used() -> Result<()> {
        let store = SessionStore::new(2);
        let (first, _) = store.open(paginator(1, 30))?;
        let (second, _) = store.open(paginator(1, 30))?;
        store.navigate(first, Navigation::Current)?;
        let (third, _) = store.open(paginator(1, 30))?;

        assert_eq!(store.len()?, 2);
        assert!(store.navigate(second, Navigation::Current)?.is_none());
        assert!(store.navigate(first, Navigation::Current)?.is_some());
        assert!(store.navigate(third, Navigation::Current)?.is_some());
        Ok(())
    }
}
