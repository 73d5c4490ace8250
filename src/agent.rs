//! Page agent: owns the page on a dedicated thread and answers scrape requests.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use tokio::sync::oneshot;

use crate::cli::PageArgs;
use crate::dom::{HtmlPage, PageDom};
use crate::formats::{ScrapeReply, ScrapeRequest};
use crate::layout::PageLayout;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    #[error("page not ready or blocked")]
    PageNotReady,
}

struct Envelope {
    request: ScrapeRequest,
    reply: oneshot::Sender<ScrapeReply>,
}

/// Control-side end of the page agent channel.
#[derive(Debug)]
pub struct PageAgentHandle {
    location: String,
    requests: mpsc::Sender<Envelope>,
}

impl PageAgentHandle {
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Sends one request and waits for its reply. `&mut self` keeps a single exchange in
    /// flight.
    pub async fn request(&mut self, request: ScrapeRequest) -> Result<ScrapeReply, ChannelError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.requests
            .send(Envelope {
                request,
                reply: reply_tx,
            })
            .map_err(|_| ChannelError::PageNotReady)?;
        reply_rx.await.map_err(|_| ChannelError::PageNotReady)
    }
}

/// Starts a page agent for the page produced by `load`.
///
/// The page is built on the agent thread, so it does not need to be `Send`. A failing
/// `load` leaves the agent dead and every request reports [`ChannelError::PageNotReady`].
pub fn spawn<D, F>(location: String, layout: PageLayout, load: F) -> PageAgentHandle
where
    D: PageDom + 'static,
    F: FnOnce() -> anyhow::Result<D> + Send + 'static,
{
    let (requests_tx, requests_rx) = mpsc::channel::<Envelope>();

    let thread_location = location.clone();
    let spawned = thread::Builder::new()
        .name("page-agent".to_owned())
        .spawn(move || {
            let dom = match load() {
                Ok(dom) => dom,
                Err(err) => {
                    tracing::error!(location = %thread_location, err = %format!("{err:#}"), "page agent failed to load page");
                    return;
                }
            };
            serve(&dom, &layout, &requests_rx);
        });
    if let Err(err) = spawned {
        tracing::error!(%err, "spawn page agent thread");
    }

    PageAgentHandle {
        location,
        requests: requests_tx,
    }
}

/// Loads the page named by `page` and hands it to a new page agent.
///
/// A page that cannot be loaded still yields a handle; its requests fail as not ready.
pub async fn open_page(page: &PageArgs, layout: &PageLayout) -> PageAgentHandle {
    match crate::net::load_page(page).await {
        Ok(loaded) => {
            let location = loaded.location.to_string();
            spawn(location, layout.clone(), move || {
                Ok(HtmlPage::parse(&loaded.html, loaded.location))
            })
        }
        Err(err) => {
            tracing::warn!("load page: {err:#}");
            spawn(
                requested_location(page),
                layout.clone(),
                move || -> anyhow::Result<HtmlPage> { Err(err) },
            )
        }
    }
}

fn requested_location(page: &PageArgs) -> String {
    if let Some(url) = &page.source.url {
        return url.clone();
    }
    if let Some(page_url) = &page.page_url {
        return page_url.clone();
    }
    page.source
        .html
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_default()
}

fn serve<D: PageDom>(dom: &D, layout: &PageLayout, requests: &mpsc::Receiver<Envelope>) {
    crate::expand::auto_expand(dom, layout);

    // The second expansion attempt is due a fixed delay after load, whatever the traffic.
    let retry_at = Instant::now() + Duration::from_millis(layout.expand_retry_delay_ms);
    let mut retry_pending = true;

    loop {
        let envelope = if retry_pending {
            match requests.recv_timeout(retry_at.saturating_duration_since(Instant::now())) {
                Ok(envelope) => envelope,
                Err(RecvTimeoutError::Timeout) => {
                    retry_pending = false;
                    crate::expand::auto_expand(dom, layout);
                    continue;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        } else {
            match requests.recv() {
                Ok(envelope) => envelope,
                Err(_) => break,
            }
        };

        tracing::debug!(action = %envelope.request.action, swap = envelope.request.swap, "page agent request");
        let now = chrono::Local::now().naive_local();
        let reply = crate::extract::handle_request(dom, layout, &envelope.request, now);
        if envelope.reply.send(reply).is_err() {
            tracing::debug!("requester dropped before reply");
        }
    }

    tracing::debug!("page agent stopped");
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::dom::fake::{FakeNode, FakePage};

    fn fake_set(layout: &PageLayout, rows: usize) -> FakePage {
        let s = &layout.selectors;
        let rows = (0..rows)
            .map(|i| {
                FakeNode::default().with_child(&s.term_text, FakeNode::text(&format!("t{i}")))
            })
            .collect();
        FakePage::new("https://quizlet.com/9/").with(&s.rows, rows)
    }

    #[tokio::test]
    async fn round_trip_returns_payload() {
        let layout = PageLayout::default();
        let page_layout = layout.clone();
        let mut handle = spawn("https://quizlet.com/9/".to_owned(), layout, move || {
            Ok(fake_set(&page_layout, 2))
        });

        let reply = handle.request(ScrapeRequest::scrape(true)).await.unwrap();
        let ScrapeReply::Success { payload } = reply else {
            panic!("expected success, got {reply:?}");
        };
        assert_eq!(payload.quiz_data.len(), 2);
        assert!(payload.info.swapped);

        // The agent keeps serving after the first exchange.
        let again = handle.request(ScrapeRequest::scrape(false)).await.unwrap();
        assert!(matches!(again, ScrapeReply::Success { .. }));
    }

    #[tokio::test]
    async fn failed_load_reports_page_not_ready() {
        let mut handle = spawn(
            "https://quizlet.com/9/".to_owned(),
            PageLayout::default(),
            || -> anyhow::Result<FakePage> { anyhow::bail!("navigation aborted") },
        );
        let err = handle.request(ScrapeRequest::scrape(false)).await.unwrap_err();
        assert_eq!(err, ChannelError::PageNotReady);
    }

    /// Counts auto-expand passes by watching lookups of the "show more" control.
    struct CountingPage {
        inner: FakePage,
        show_more: String,
        lookups: Arc<AtomicUsize>,
    }

    impl PageDom for CountingPage {
        type Node<'a> = FakeNode;

        fn location(&self) -> &str {
            self.inner.location()
        }

        fn select_first(&self, selector: &str) -> Option<FakeNode> {
            self.inner.select_first(selector)
        }

        fn select_all(&self, selector: &str) -> Vec<FakeNode> {
            if selector == self.show_more {
                self.lookups.fetch_add(1, Ordering::SeqCst);
            }
            self.inner.select_all(selector)
        }
    }

    #[tokio::test]
    async fn second_expansion_fires_on_schedule_under_steady_requests() {
        let mut layout = PageLayout::default();
        layout.expand_retry_delay_ms = 100;
        let lookups = Arc::new(AtomicUsize::new(0));

        let page_layout = layout.clone();
        let page_lookups = Arc::clone(&lookups);
        let mut handle = spawn("https://quizlet.com/9/".to_owned(), layout, move || {
            let inner = fake_set(&page_layout, 1).with(
                &page_layout.selectors.set_count,
                vec![FakeNode::text("Terms in this set (150)")],
            );
            Ok(CountingPage {
                inner,
                show_more: page_layout.selectors.show_more_button.clone(),
                lookups: page_lookups,
            })
        });

        // Requests arrive faster than the retry delay for several delays in a row.
        for _ in 0..15 {
            handle.request(ScrapeRequest::scrape(false)).await.unwrap();
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(lookups.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn retry_expansion_does_not_block_requests() {
        let mut layout = PageLayout::default();
        layout.expand_retry_delay_ms = 10;
        let page_layout = layout.clone();
        let mut handle = spawn("https://quizlet.com/9/".to_owned(), layout, move || {
            Ok(fake_set(&page_layout, 1))
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        let reply = handle.request(ScrapeRequest::scrape(false)).await.unwrap();
        assert!(matches!(reply, ScrapeReply::Success { .. }));
    }
}
