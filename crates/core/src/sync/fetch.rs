//! Windowed incremental fetch against the provider's events API

use std::sync::Arc;

use syncline_domain::{FetchWindow, RemoteEvent, Result, SyncError};
use tracing::{debug, warn};

use super::ports::CalendarProvider;

/// Pages through the provider's events API for a bounded window.
pub struct EventFetcher {
    provider: Arc<dyn CalendarProvider>,
}

impl EventFetcher {
    /// Upper bound on pagination; a provider that keeps returning page
    /// tokens past this point is misbehaving.
    const MAX_PAGES: usize = 100;

    pub fn new(provider: Arc<dyn CalendarProvider>) -> Self {
        Self { provider }
    }

    /// Fetch every event in the window, following pagination to the end.
    ///
    /// The full list is accumulated before returning so a partially-paged
    /// result never reaches the reconciler, and any page failure fails the
    /// whole fetch. The result is ordered chronologically by start time.
    pub async fn fetch_window(
        &self,
        access_token: &str,
        calendar_id: &str,
        window: FetchWindow,
    ) -> Result<Vec<RemoteEvent>> {
        let mut events: Vec<RemoteEvent> = Vec::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = self
                .provider
                .fetch_events_page(access_token, calendar_id, window, page_token.as_deref())
                .await?;

            debug!(calendar_id, page_events = page.events.len(), "fetched events page");
            events.extend(page.events);

            pages += 1;
            if pages >= Self::MAX_PAGES && page.next_page_token.is_some() {
                warn!(calendar_id, pages, "pagination exceeded page cap");
                return Err(SyncError::ProviderUnavailable(format!(
                    "events pagination did not terminate after {pages} pages"
                )));
            }

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        events.sort_by(|a, b| {
            a.start_at.cmp(&b.start_at).then_with(|| a.external_id.cmp(&b.external_id))
        });

        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::sync::testkit::{remote_event, FakeProvider};
    use crate::sync::ports::EventsPage;

    fn window() -> FetchWindow {
        FetchWindow::around(Utc::now(), 24, 24)
    }

    #[tokio::test]
    async fn follows_pagination_to_the_end() {
        let provider = Arc::new(FakeProvider::default());
        let base = Utc::now();
        provider.queue_page(EventsPage {
            events: vec![remote_event("e2", base + Duration::hours(2))],
            next_page_token: Some("page-2".into()),
        });
        provider.queue_page(EventsPage {
            events: vec![remote_event("e1", base + Duration::hours(1))],
            next_page_token: None,
        });

        let events = EventFetcher::new(provider.clone())
            .fetch_window("token", "primary", window())
            .await
            .expect("fetch succeeds");

        assert_eq!(provider.fetch_calls(), 2);
        // Accumulated across pages, then ordered chronologically.
        let ids: Vec<_> = events.iter().map(|e| e.external_id.as_str()).collect();
        assert_eq!(ids, vec!["e1", "e2"]);
    }

    #[tokio::test]
    async fn page_failure_fails_the_whole_fetch() {
        let provider = Arc::new(FakeProvider::default());
        provider.queue_page(EventsPage {
            events: vec![remote_event("e1", Utc::now())],
            next_page_token: Some("page-2".into()),
        });
        provider.fail_next_fetch("HTTP 503 from provider");

        let err = EventFetcher::new(provider)
            .fetch_window("token", "primary", window())
            .await
            .expect_err("mid-pagination failure aborts");
        assert!(matches!(err, SyncError::ProviderUnavailable(_)));
    }

    #[tokio::test]
    async fn empty_window_yields_empty_list() {
        let provider = Arc::new(FakeProvider::default());
        provider.queue_page(EventsPage { events: vec![], next_page_token: None });

        let events = EventFetcher::new(provider)
            .fetch_window("token", "primary", window())
            .await
            .expect("fetch succeeds");
        assert!(events.is_empty());
    }
}
