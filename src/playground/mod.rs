//! Alchemy Playground
//!
//! Owns the tokens placed on the play surface and turns pairs of nearby
//! tokens into their recipe result.
//!
//! Input events (`place`, `begin_move`, `update_move_position`, `end_move`,
//! `clear`) mutate the surface directly. Proximity scans and merge
//! resolution talk to the store, so they run as background tasks tracked in
//! a [`JoinSet`]; call [`Playground::settle`] to wait for them and
//! [`Playground::shutdown`] to abandon them.
//!
//! A merge swaps the pair for its result in one step under the surface lock,
//! before its first store call, so two resolutions touching the same token
//! can't both succeed. The result stays locked until the store has recorded
//! the discovery; if that write fails the pair is put back. Every background
//! step checks its tokens are still on the surface before mutating it.

pub mod events;
pub mod surface;

pub use events::{MergeEvent, MergeOutcome, ScanOutcome};
pub use surface::{PlacedToken, SurfaceSnapshot, TokenHandle, TokenView};

use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::{self, JoinError, JoinSet};
use tracing::{debug, info, warn};

use crate::catalog::Item;
use crate::config::PlaygroundConfig;
use crate::error::PlaygroundError;
use crate::geometry::{Point, Size};
use crate::protocol::DropEvent;
use crate::resolver::RecipeResolver;
use crate::store::RecipeStore;
use surface::Surface;

/// How a new token is created
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceOptions {
    /// Treat the coordinates as the pointer position and shift the token so
    /// the pointer lands on the configured anchor
    pub use_anchor: bool,
    /// Run a proximity scan for the new token
    pub check_merge: bool,
    /// Measured token size; defaults to the configured size
    pub measured: Option<Size>,
}

type ScanResult = Result<ScanOutcome, PlaygroundError>;

/// State shared with background tasks
struct Shared {
    surface: RwLock<Surface>,
    resolver: RecipeResolver,
    config: PlaygroundConfig,
    merge_tx: broadcast::Sender<MergeEvent>,
}

pub struct Playground {
    shared: Arc<Shared>,
    tasks: Mutex<JoinSet<ScanResult>>,
}

impl Playground {
    pub fn new(store: Arc<dyn RecipeStore>, config: PlaygroundConfig) -> Self {
        let (merge_tx, _) = broadcast::channel(config.merge_channel_capacity.max(1));
        Self {
            shared: Arc::new(Shared {
                surface: RwLock::new(Surface::new(config.surface)),
                resolver: RecipeResolver::new(store, config.cache_recipes),
                config,
                merge_tx,
            }),
            tasks: Mutex::new(JoinSet::new()),
        }
    }

    pub fn config(&self) -> &PlaygroundConfig {
        &self.shared.config
    }

    /// Receive one [`MergeEvent`] per successful merge.
    ///
    /// Events are buffered up to `merge_channel_capacity`. A receiver that
    /// falls further behind gets `RecvError::Lagged` and should resync from
    /// the store, e.g. with [`Inventory::reload`](crate::Inventory::reload).
    pub fn subscribe(&self) -> broadcast::Receiver<MergeEvent> {
        self.shared.merge_tx.subscribe()
    }

    /// Put an item on the surface at exactly `at`. Never merges.
    pub async fn place_item(&self, item: Item, at: Point) -> TokenHandle {
        self.place(item, at, PlaceOptions::default()).await
    }

    pub async fn place(&self, item: Item, at: Point, options: PlaceOptions) -> TokenHandle {
        let handle = {
            let mut surface = self.shared.surface.write().await;
            let measured = options.measured.unwrap_or(self.shared.config.token_size);
            let size = surface.token_size().unwrap_or(measured);
            let position = if options.use_anchor {
                let anchor = self.shared.config.anchor;
                at.offset(-size.width * anchor.x, -size.height * anchor.y)
            } else {
                at
            };
            let handle = surface.insert(Arc::new(item), position, measured);
            debug!("Placed token {} at ({}, {})", handle, position.x, position.y);
            handle
        };

        if options.check_merge {
            self.schedule_scan(handle).await;
        }
        handle
    }

    /// Place the item carried by a drop, anchored under the pointer, and
    /// check it for merges. Drops that aren't item payloads are ignored.
    pub async fn handle_drop(&self, event: &DropEvent) -> Option<TokenHandle> {
        let payload = event.payload()?;
        let options = PlaceOptions {
            use_anchor: true,
            check_merge: true,
            measured: None,
        };
        Some(self.place(payload.item, event.position, options).await)
    }

    /// Start dragging a token. Any previous drag is released.
    pub async fn begin_move(&self, handle: TokenHandle) -> Result<(), PlaygroundError> {
        self.shared.surface.write().await.begin_move(handle)
    }

    /// Follow the pointer with the dragged token. Returns the stored
    /// (anchored and clamped) position.
    pub async fn update_move_position(
        &self,
        handle: TokenHandle,
        pointer: Point,
    ) -> Result<Point, PlaygroundError> {
        let mut surface = self.shared.surface.write().await;
        let size = surface.token_size().unwrap_or(self.shared.config.token_size);
        let anchor = self.shared.config.anchor;
        let position = pointer.offset(-size.width * anchor.x, -size.height * anchor.y);
        surface.move_to(handle, position, self.shared.config.clamp)
    }

    /// Drop the dragged token and schedule a proximity scan for it.
    /// Returns false (and does nothing) if the token wasn't being moved.
    pub async fn end_move(&self, handle: TokenHandle) -> Result<bool, PlaygroundError> {
        {
            let mut surface = self.shared.surface.write().await;
            if surface.get(handle).is_none() {
                return Err(PlaygroundError::UnknownToken(handle));
            }
            if !surface.end_move(handle) {
                return Ok(false);
            }
        }
        self.schedule_scan(handle).await;
        Ok(true)
    }

    /// Remove every token. Merges in flight find their tokens gone and abort.
    pub async fn clear(&self) {
        self.shared.surface.write().await.clear();
        debug!("Playground cleared");
    }

    pub async fn resize(&self, bounds: Size) {
        self.shared.surface.write().await.set_bounds(bounds);
    }

    pub async fn snapshot(&self) -> SurfaceSnapshot {
        self.shared.surface.read().await.snapshot()
    }

    pub async fn token_count(&self) -> usize {
        self.shared.surface.read().await.len()
    }

    pub async fn token(&self, handle: TokenHandle) -> Option<PlacedToken> {
        self.shared.surface.read().await.get(handle).cloned()
    }

    /// Run a proximity scan for `handle` now, on the caller's task
    pub async fn scan(&self, handle: TokenHandle) -> ScanResult {
        self.shared.scan(handle).await
    }

    /// Merge two tokens into `result`, on the caller's task
    pub async fn resolve_merge(
        &self,
        a: TokenHandle,
        b: TokenHandle,
        result: Item,
    ) -> Result<MergeOutcome, PlaygroundError> {
        self.shared.resolve_merge(a, b, result).await
    }

    async fn schedule_scan(&self, handle: TokenHandle) {
        let shared = self.shared.clone();
        let mut tasks = self.tasks.lock().await;
        // Reap finished work so the set doesn't grow over a long session
        while let Some(finished) = tasks.try_join_next() {
            log_task_result(&finished);
        }
        tasks.spawn(async move { shared.scan(handle).await });
    }

    pub async fn pending_tasks(&self) -> usize {
        self.tasks.lock().await.len()
    }

    /// Wait for every background scan and return their results
    pub async fn settle(&self) -> Vec<ScanResult> {
        let mut tasks = self.tasks.lock().await;
        let mut results = Vec::new();
        let mut failed = Vec::new();
        while let Some(finished) = tasks.join_next().await {
            log_task_result(&finished);
            results.push(finished.unwrap_or_else(|e| {
                failed.push(e.id());
                Err(PlaygroundError::Task(e.to_string()))
            }));
        }
        self.revert_abandoned(&failed).await;
        results
    }

    /// Abort background work and wait for it to stop
    pub async fn shutdown(&self) {
        let mut tasks = self.tasks.lock().await;
        tasks.abort_all();
        let mut stopped = Vec::new();
        while let Some(finished) = tasks.join_next().await {
            if let Err(e) = finished {
                stopped.push(e.id());
            }
        }
        self.revert_abandoned(&stopped).await;
        info!("Playground shut down");
    }

    /// Put back the pairs of merges whose task died before the store write.
    /// Merges run on other tasks keep their lock.
    async fn revert_abandoned(&self, tasks: &[task::Id]) {
        if tasks.is_empty() {
            return;
        }
        let reverted = self.shared.surface.write().await.revert_owned_by(tasks);
        if reverted > 0 {
            debug!("Reverted {} abandoned merges", reverted);
        }
    }
}

fn log_task_result(result: &Result<ScanResult, JoinError>) {
    match result {
        Ok(Ok(outcome)) => debug!("Scan finished: {}", outcome.kind()),
        Ok(Err(e)) => warn!("Scan failed: {}", e),
        Err(e) if e.is_cancelled() => debug!("Scan cancelled"),
        Err(e) => warn!("Scan task failed: {}", e),
    }
}

impl Shared {
    async fn scan(&self, handle: TokenHandle) -> ScanResult {
        let (item_id, candidates) = {
            let surface = self.surface.read().await;
            let Some(candidates) = surface.intersecting(handle, self.config.proximity) else {
                return Ok(ScanOutcome::Skipped);
            };
            let Some(token) = surface.get(handle) else {
                return Ok(ScanOutcome::Skipped);
            };
            (token.item.id.clone(), candidates)
        };

        if candidates.is_empty() {
            return Ok(ScanOutcome::NoCandidates);
        }

        let recipes = self.resolver.recipes_involving(&item_id).await?;
        // First viable candidate in surface order wins
        let Some(other) = candidates
            .into_iter()
            .find(|c| recipes.iter().any(|r| r.involves(&c.item_id)))
        else {
            return Ok(ScanOutcome::NoRecipe);
        };

        let Some(result) = self.resolver.result_of(&other.item_id, &item_id).await? else {
            return Ok(ScanOutcome::NoRecipe);
        };

        Ok(self.resolve_merge(handle, other.handle, result).await?.into())
    }

    async fn resolve_merge(
        &self,
        a: TokenHandle,
        b: TokenHandle,
        mut result: Item,
    ) -> Result<MergeOutcome, PlaygroundError> {
        result.unlocked = true;
        let committed = self.surface.write().await.commit_merge(
            a,
            b,
            Arc::new(result.clone()),
            task::try_id(),
        );
        let Some((token, position)) = committed else {
            debug!("Merge of {} and {} aborted: token unavailable", a, b);
            return Ok(MergeOutcome::Aborted);
        };

        let newly_unlocked = match self.resolver.store().unlock(&result.id).await {
            Ok(newly) => newly,
            Err(e) => {
                self.surface.write().await.revert_merge(token);
                return Err(e.into());
            }
        };
        // No-op if clear() removed the result meanwhile
        self.surface.write().await.finish_merge(token);

        info!(
            "Merged {} and {} into {} ({})",
            a, b, result.id, token
        );
        let event = MergeEvent {
            result,
            consumed: [a, b],
            token,
            position,
            newly_unlocked,
        };
        // No subscribers is fine
        let _ = self.merge_tx.send(event.clone());
        Ok(MergeOutcome::Merged(event))
    }
}
