//! Crawl dispatcher - main crawl orchestration logic
//!
//! The dispatcher is the single owner of all crawl state: frontier, robots
//! gate, link graph, image cache, and supervisor. It runs one event loop:
//! - `Visit` events go through the frontier and robots gate
//! - Admitted URLs become fetch tasks after their politeness delay
//! - Fetched pages are parsed on the loop; edges are recorded and every
//!   anchor is emitted as a new `Visit`
//! - Images are deduplicated by the image cache and downloaded in tasks
//! - Dirty graphs are snapshotted to disk at most once per flush interval
//!
//! Tasks never touch crawl state; they send their outcome back as an event.

use crate::config::Config;
use crate::crawler::events::{event_channel, CrawlEvent, EventSender, VisitCandidate};
use crate::crawler::frontier::{Consideration, Frontier};
use crate::crawler::processor::PageProcessor;
use crate::crawler::supervisor::Supervisor;
use crate::crawler::build_http_client;
use crate::graph::{write_snapshot, LinkGraph, SnapshotSchedule};
use crate::images::{download_image, ImageCache, ImageLookup};
use crate::output::{CrawlSummary, StopReason};
use crate::robots::{fetch_robots, RobotsGate};
use crate::url::parse_absolute;
use crate::CrawlError;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::Semaphore;
use tokio::task::{self, JoinError, JoinSet};
use url::Url;

/// What woke the event loop
enum Wake {
    Event(CrawlEvent),
    Joined(Result<task::Id, JoinError>),
    Deadline,
    SnapshotDue,
}

/// Loop state a running task has claimed and must hand back when it finishes
///
/// A task that panics never sends its event, so the claim is released from
/// the join error instead.
#[derive(Debug, Clone, PartialEq, Eq)]
enum TaskClaim {
    /// The robots.txt fetch for this URL, with pages parked behind it
    Robots(String),
    /// The download of this image URL, with pages waiting on it
    Image(String),
    /// The in-flight snapshot write
    Snapshot,
}

/// Main crawl dispatcher structure
pub struct Dispatcher {
    processor: PageProcessor,
    frontier: Frontier,
    robots: RobotsGate,
    graph: LinkGraph,
    images: ImageCache,
    supervisor: Supervisor,

    events: EventSender,
    inbox: UnboundedReceiver<CrawlEvent>,
    tasks: JoinSet<()>,
    claims: HashMap<task::Id, TaskClaim>,
    fetch_permits: Arc<Semaphore>,
    download_permits: Arc<Semaphore>,

    snapshots: SnapshotSchedule,
    data_path: PathBuf,
    deadline: Option<Duration>,

    summary: CrawlSummary,
    started: Instant,
}

impl Dispatcher {
    /// Creates a dispatcher with empty crawl state
    ///
    /// # Returns
    ///
    /// * `Ok(Dispatcher)` - Ready to run
    /// * `Err(CrawlError)` - The HTTP client could not be built
    pub fn new(config: Config) -> Result<Self, CrawlError> {
        let client = build_http_client(&config)?;
        let (events, inbox) = event_channel();

        Ok(Self {
            processor: PageProcessor::new(client),
            frontier: Frontier::new(&config.crawler, &config.limits),
            robots: RobotsGate::new(config.user_agent.crawler_name.clone()),
            graph: LinkGraph::new(),
            images: ImageCache::new(&config.output.image_dir),
            supervisor: Supervisor::new(config.supervisor.escalate.iter().copied()),
            events,
            inbox,
            tasks: JoinSet::new(),
            claims: HashMap::new(),
            fetch_permits: Arc::new(Semaphore::new(
                config.crawler.max_concurrent_fetches as usize,
            )),
            download_permits: Arc::new(Semaphore::new(
                config.crawler.max_concurrent_downloads as usize,
            )),
            snapshots: SnapshotSchedule::new(Duration::from_millis(
                config.output.flush_interval_ms,
            )),
            data_path: PathBuf::from(&config.output.data_path),
            deadline: config.limits.deadline(),
            summary: CrawlSummary::default(),
            started: Instant::now(),
        })
    }

    /// Crawls from `seed` until the frontier is exhausted, the deadline
    /// passes, or the supervisor escalates an error
    ///
    /// A final snapshot of the link graph is written in every case.
    pub async fn run(&mut self, seed: &str) -> Result<CrawlSummary, CrawlError> {
        let seed = parse_absolute(seed)?;
        self.started = Instant::now();
        let deadline = match self.deadline {
            Some(budget) => {
                let deadline = self.started.checked_add(budget);
                if deadline.is_none() {
                    tracing::warn!(
                        "Deadline of {:?} is out of range, crawling without one",
                        budget
                    );
                }
                deadline
            }
            None => None,
        };

        tracing::info!("Starting crawl from {}", seed);
        self.events
            .emit(CrawlEvent::Visit(VisitCandidate::seed(seed)));

        let outcome = self.event_loop(deadline).await;

        if !self.tasks.is_empty() {
            tracing::info!("Aborting {} outstanding tasks", self.tasks.len());
            self.tasks.abort_all();
            while self.tasks.join_next().await.is_some() {}
        }
        self.claims.clear();
        while self.inbox.try_recv().is_ok() {}
        self.snapshots.finished();

        let flushed = self.flush().await;
        self.summary.errors = self.supervisor.counts().clone();
        self.summary.elapsed = self.started.elapsed();

        self.summary.stop_reason = outcome?;
        flushed?;

        tracing::info!(
            "Crawl completed ({}): {} pages fetched, {} images downloaded in {:?}",
            self.summary.stop_reason,
            self.summary.pages_fetched,
            self.summary.images_downloaded,
            self.summary.elapsed
        );

        Ok(self.summary.clone())
    }

    /// The link graph built so far
    pub fn graph(&self) -> &LinkGraph {
        &self.graph
    }

    pub fn images(&self) -> &ImageCache {
        &self.images
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    async fn event_loop(&mut self, deadline: Option<Instant>) -> Result<StopReason, CrawlError> {
        loop {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                tracing::info!("Deadline reached, stopping crawl");
                return Ok(StopReason::Deadline);
            }

            let wake = match self.inbox.try_recv() {
                Ok(event) => Wake::Event(event),
                Err(_) if self.tasks.is_empty() => {
                    tracing::info!("No queued events or running tasks, crawl complete");
                    return Ok(StopReason::Exhausted);
                }
                Err(_) => self.wait(deadline).await,
            };

            match wake {
                Wake::Event(event) => self.dispatch(event)?,
                Wake::Joined(result) => self.on_task_joined(result)?,
                Wake::Deadline => continue,
                Wake::SnapshotDue => {}
            }

            self.maybe_snapshot()?;
        }
    }

    /// Waits for the next event, finished task, deadline, or snapshot slot
    async fn wait(&mut self, deadline: Option<Instant>) -> Wake {
        let snapshot_in = (self.graph.is_dirty() && !self.snapshots.is_in_flight())
            .then(|| self.snapshots.time_until_due(Instant::now()));

        tokio::select! {
            Some(event) = self.inbox.recv() => Wake::Event(event),
            Some(joined) = self.tasks.join_next_with_id() => {
                Wake::Joined(joined.map(|(id, ())| id))
            }
            _ = sleep_until(deadline) => Wake::Deadline,
            _ = sleep_for(snapshot_in) => Wake::SnapshotDue,
            else => Wake::SnapshotDue,
        }
    }

    fn dispatch(&mut self, event: CrawlEvent) -> Result<(), CrawlError> {
        match event {
            CrawlEvent::Visit(candidate) => self.on_visit(candidate),
            CrawlEvent::RobotsFetched { robots_url, result } => {
                self.on_robots_fetched(&robots_url, result)
            }
            CrawlEvent::PageFetched { candidate, result } => {
                self.on_page_fetched(candidate, result)
            }
            CrawlEvent::ImageDownloaded { image_url, result } => {
                self.on_image_downloaded(&image_url, result)
            }
            CrawlEvent::SnapshotWritten { result } => self.on_snapshot_written(result),
        }
    }

    fn on_visit(&mut self, candidate: VisitCandidate) -> Result<(), CrawlError> {
        match self.frontier.consider(&candidate, &mut self.robots) {
            Consideration::AlreadyVisited => {}
            Consideration::OutOfBounds(reason) => {
                tracing::debug!("Skipping {}: {}", candidate.url, reason);
                self.summary.limit_skips += 1;
            }
            Consideration::Denied => {
                tracing::info!("URL {} disallowed by robots.txt", candidate.url);
                self.summary.robots_denied += 1;
            }
            Consideration::Parked {
                robots_url,
                fetch_robots,
            } => {
                tracing::trace!("Parked {} until {} resolves", candidate.url, robots_url);
                if fetch_robots {
                    self.spawn_robots_fetch(robots_url);
                }
            }
            Consideration::Admitted { delay } => {
                tracing::debug!("Scheduling {} in {:?}", candidate.url, delay);
                self.spawn_page_fetch(candidate, delay);
            }
        }

        Ok(())
    }

    fn on_robots_fetched(
        &mut self,
        robots_url: &str,
        result: Result<String, CrawlError>,
    ) -> Result<(), CrawlError> {
        self.robots.resolve(robots_url, result);

        for candidate in self.frontier.release(robots_url) {
            self.on_visit(candidate)?;
        }

        Ok(())
    }

    fn on_page_fetched(
        &mut self,
        candidate: VisitCandidate,
        result: Result<Option<String>, CrawlError>,
    ) -> Result<(), CrawlError> {
        let html = match result {
            Ok(Some(html)) => html,
            Ok(None) => {
                self.summary.pages_skipped += 1;
                return Ok(());
            }
            Err(e) => {
                self.summary.pages_failed += 1;
                return self
                    .supervisor
                    .report(&format!("fetching {}", candidate.url), e);
            }
        };

        self.summary.pages_fetched += 1;
        self.log_progress();

        let page = PageProcessor::extract(&candidate.url, &html);
        let page_url = candidate.url.as_str();
        let referrer = candidate.referrer.as_ref().map(Url::as_str);

        tracing::debug!(
            "Processing {} ({}): {} links, {} images",
            page_url,
            page.title.as_deref().unwrap_or("untitled"),
            page.anchors.len(),
            page.images.len()
        );

        for failure in page.failures {
            let context = format!(
                "resolving {} reference {:?} on {}",
                failure.element, failure.reference, page_url
            );
            self.supervisor.report(&context, failure.into_error())?;
        }

        for anchor in page.anchors {
            self.graph.record_edge(page_url, anchor.as_str(), referrer);
            self.events
                .emit(CrawlEvent::Visit(candidate.child(anchor)));
        }

        for image in page.images {
            match self.images.lookup(image.as_str(), page_url) {
                ImageLookup::Cached(path) => {
                    self.graph.record_image(page_url, image.as_str(), &path)
                }
                ImageLookup::Pending => {
                    tracing::trace!("Image {} already downloading", image)
                }
                ImageLookup::Download(path) => self.spawn_image_download(image, path),
            }
        }

        Ok(())
    }

    fn on_image_downloaded(
        &mut self,
        image_url: &str,
        result: Result<PathBuf, CrawlError>,
    ) -> Result<(), CrawlError> {
        match result {
            Ok(path) => {
                self.summary.images_downloaded += 1;
                for page in self.images.complete(image_url, Some(path.clone())) {
                    self.graph.record_image(&page, image_url, &path);
                }
                Ok(())
            }
            Err(e) => {
                self.summary.image_failures += 1;
                let waiting = self.images.complete(image_url, None);
                let context = format!("downloading image for {} page(s)", waiting.len());
                self.supervisor.report(&context, e)
            }
        }
    }

    fn on_snapshot_written(&mut self, result: Result<(), CrawlError>) -> Result<(), CrawlError> {
        self.snapshots.finished();

        match result {
            Ok(()) => {
                tracing::debug!("Snapshot written to {}", self.data_path.display());
                Ok(())
            }
            Err(e) => self.supervisor.report("writing snapshot", e),
        }
    }

    fn on_task_joined(&mut self, result: Result<task::Id, JoinError>) -> Result<(), CrawlError> {
        let e = match result {
            Ok(id) => {
                self.claims.remove(&id);
                return Ok(());
            }
            Err(e) => e,
        };

        let claim = self.claims.remove(&e.id());
        if e.is_cancelled() {
            return Ok(());
        }

        let message = e.to_string();
        if let Some(claim) = claim {
            self.release_claim(claim, &message)?;
        }
        self.supervisor
            .report("running crawl task", CrawlError::Task(message))
    }

    /// Hands back what a dead task was holding
    fn release_claim(&mut self, claim: TaskClaim, message: &str) -> Result<(), CrawlError> {
        tracing::debug!("Releasing {:?} after task failure", claim);

        match claim {
            // Resolves as unknown, which allows the host and releases its parked pages
            TaskClaim::Robots(robots_url) => {
                self.on_robots_fetched(&robots_url, Err(CrawlError::Task(message.to_string())))
            }
            TaskClaim::Image(image_url) => {
                self.summary.image_failures += 1;
                let waiting = self.images.complete(&image_url, None);
                tracing::warn!(
                    "Image {} abandoned, {} page(s) go without it",
                    image_url,
                    waiting.len()
                );
                Ok(())
            }
            TaskClaim::Snapshot => {
                self.snapshots.finished();
                Ok(())
            }
        }
    }

    fn spawn_robots_fetch(&mut self, robots_url: String) {
        let client = self.processor.client().clone();
        let events = self.events.clone();

        let claim = TaskClaim::Robots(robots_url.clone());
        let handle = self.tasks.spawn(async move {
            let result = fetch_robots(&client, &robots_url).await;
            events.emit(CrawlEvent::RobotsFetched { robots_url, result });
        });
        self.claims.insert(handle.id(), claim);
    }

    fn spawn_page_fetch(&mut self, candidate: VisitCandidate, delay: Duration) {
        let processor = self.processor.clone();
        let permits = Arc::clone(&self.fetch_permits);
        let events = self.events.clone();

        self.tasks.spawn(async move {
            tokio::time::sleep(delay).await;
            let Ok(_permit) = permits.acquire_owned().await else {
                return;
            };
            let result = processor.fetch(&candidate.url).await;
            events.emit(CrawlEvent::PageFetched { candidate, result });
        });
    }

    fn spawn_image_download(&mut self, image: Url, path: PathBuf) {
        let client = self.processor.client().clone();
        let permits = Arc::clone(&self.download_permits);
        let events = self.events.clone();

        let claim = TaskClaim::Image(image.to_string());
        let handle = self.tasks.spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                return;
            };
            let result = download_image(&client, image.as_str(), &path).await;
            events.emit(CrawlEvent::ImageDownloaded {
                image_url: image.to_string(),
                result,
            });
        });
        self.claims.insert(handle.id(), claim);
    }

    /// Starts a background snapshot write when one is due
    fn maybe_snapshot(&mut self) -> Result<(), CrawlError> {
        let now = Instant::now();
        if !self.snapshots.is_due(self.graph.is_dirty(), now) {
            return Ok(());
        }

        let json = match self.graph.take_snapshot() {
            Ok(json) => json,
            Err(e) => return self.supervisor.report("serializing link graph", e.into()),
        };

        self.snapshots.started(now);
        let path = self.data_path.clone();
        let events = self.events.clone();

        let handle = self.tasks.spawn(async move {
            let result = write_snapshot(&path, &json).await;
            events.emit(CrawlEvent::SnapshotWritten { result });
        });
        self.claims.insert(handle.id(), TaskClaim::Snapshot);

        Ok(())
    }

    /// Writes the final snapshot on the loop, waiting for completion
    async fn flush(&mut self) -> Result<(), CrawlError> {
        let written = match self.graph.take_snapshot() {
            Ok(json) => write_snapshot(&self.data_path, &json).await,
            Err(e) => Err(e.into()),
        };

        match written {
            Ok(()) => {
                tracing::info!(
                    "Saved {} pages to {}",
                    self.graph.len(),
                    self.data_path.display()
                );
                Ok(())
            }
            Err(e) => self.supervisor.report("writing final snapshot", e),
        }
    }

    fn log_progress(&self) {
        let fetched = self.summary.pages_fetched;
        if fetched % 10 != 0 {
            return;
        }

        let rate = fetched as f64 / self.started.elapsed().as_secs_f64();
        tracing::info!(
            "Progress: {} pages fetched, {} admitted, {} waiting on robots.txt, {:.2} pages/sec",
            fetched,
            self.frontier.visited_count(),
            self.frontier.parked_count(),
            rate
        );
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline.into()).await,
        None => std::future::pending().await,
    }
}

async fn sleep_for(duration: Option<Duration>) {
    match duration {
        Some(duration) => tokio::time::sleep(duration).await,
        None => std::future::pending().await,
    }
}
