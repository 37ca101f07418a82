//! Surface State
//!
//! Plain bookkeeping for the tokens on the play surface. Nothing in here
//! awaits; the [`Playground`](super::Playground) wraps it in a lock and drives
//! the async parts.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::task;
use uuid::Uuid;

use crate::catalog::Item;
use crate::error::PlaygroundError;
use crate::geometry::{clamp_to_surface, intersects, AxisFactors, Point, Size};

/// Identifies a token for its whole life. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenHandle(Uuid);

impl TokenHandle {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for TokenHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An item placed on the surface
#[derive(Debug, Clone)]
pub struct PlacedToken {
    pub handle: TokenHandle,
    pub item: Arc<Item>,
    pub position: Point,
    /// Locked by an in-flight merge
    pub merging: bool,
}

/// A token near the scanned one
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub handle: TokenHandle,
    pub item_id: String,
}

/// Render view of one token
#[derive(Debug, Clone, Serialize)]
pub struct TokenView {
    pub handle: TokenHandle,
    pub item: Item,
    pub position: Point,
    pub moving: bool,
    pub merging: bool,
}

/// Everything the host needs to redraw the surface
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceSnapshot {
    pub bounds: Size,
    pub token_size: Option<Size>,
    pub tokens: Vec<TokenView>,
}

/// A merge already applied to the surface whose store write hasn't landed
struct PendingMerge {
    /// Task running the merge, if it runs on one
    owner: Option<task::Id>,
    /// Consumed tokens and their surface index, lowest index first
    consumed: [(usize, PlacedToken); 2],
}

pub struct Surface {
    /// Insertion order is the scan order
    tokens: Vec<PlacedToken>,
    moving: Option<TokenHandle>,
    /// Latched from the first token created
    token_size: Option<Size>,
    bounds: Size,
    /// Keyed by result token
    pending: HashMap<TokenHandle, PendingMerge>,
}

impl Surface {
    pub fn new(bounds: Size) -> Self {
        Self {
            tokens: Vec::new(),
            moving: None,
            token_size: None,
            bounds,
            pending: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn set_bounds(&mut self, bounds: Size) {
        self.bounds = bounds;
    }

    pub fn token_size(&self) -> Option<Size> {
        self.token_size
    }

    pub fn moving(&self) -> Option<TokenHandle> {
        self.moving
    }

    pub fn get(&self, handle: TokenHandle) -> Option<&PlacedToken> {
        self.tokens.iter().find(|t| t.handle == handle)
    }

    fn get_mut(&mut self, handle: TokenHandle) -> Option<&mut PlacedToken> {
        self.tokens.iter_mut().find(|t| t.handle == handle)
    }

    fn index_of(&self, handle: TokenHandle) -> Option<usize> {
        self.tokens.iter().position(|t| t.handle == handle)
    }

    /// Add a token. The first insert fixes the token size for the surface.
    pub fn insert(&mut self, item: Arc<Item>, position: Point, measured: Size) -> TokenHandle {
        self.token_size.get_or_insert(measured);
        let handle = TokenHandle::new();
        self.tokens.push(PlacedToken {
            handle,
            item,
            position,
            merging: false,
        });
        handle
    }

    /// Live, unlocked token or the reason it can't be used
    fn usable(&self, handle: TokenHandle) -> Result<&PlacedToken, PlaygroundError> {
        match self.get(handle) {
            None => Err(PlaygroundError::UnknownToken(handle)),
            Some(t) if t.merging => Err(PlaygroundError::TokenBusy(handle)),
            Some(t) => Ok(t),
        }
    }

    /// Make `handle` the moved token, releasing any previous one
    pub fn begin_move(&mut self, handle: TokenHandle) -> Result<(), PlaygroundError> {
        self.usable(handle)?;
        self.moving = Some(handle);
        Ok(())
    }

    /// Move the active token, clamped to the surface
    pub fn move_to(
        &mut self,
        handle: TokenHandle,
        position: Point,
        clamp: AxisFactors,
    ) -> Result<Point, PlaygroundError> {
        self.usable(handle)?;
        if self.moving != Some(handle) {
            return Err(PlaygroundError::NotMoving(handle));
        }

        let token_size = self.token_size.unwrap_or(Size::new(0.0, 0.0));
        let clamped = clamp_to_surface(position, self.bounds, token_size, clamp);
        if let Some(token) = self.get_mut(handle) {
            token.position = clamped;
        }
        Ok(clamped)
    }

    /// Release the moved token. False if `handle` wasn't being moved.
    pub fn end_move(&mut self, handle: TokenHandle) -> bool {
        if self.moving == Some(handle) {
            self.moving = None;
            true
        } else {
            false
        }
    }

    /// Unlocked tokens within reach of `handle`, in surface order.
    /// `None` if `handle` itself is gone or locked.
    pub fn intersecting(&self, handle: TokenHandle, reach: AxisFactors) -> Option<Vec<Candidate>> {
        let target = self.usable(handle).ok()?;
        let token_size = self.token_size?;

        Some(
            self.tokens
                .iter()
                .filter(|c| c.handle != handle && !c.merging)
                .filter(|c| intersects(target.position, c.position, token_size, reach))
                .map(|c| Candidate {
                    handle: c.handle,
                    item_id: c.item.id.clone(),
                })
                .collect(),
        )
    }

    /// Replace `a` and `b` by a locked result token at their midpoint.
    /// `None` (and nothing changes) unless both are present, distinct and
    /// not locked.
    ///
    /// The merge stays pending until [`finish_merge`](Self::finish_merge)
    /// unlocks the result or [`revert_merge`](Self::revert_merge) puts the
    /// pair back.
    pub fn commit_merge(
        &mut self,
        a: TokenHandle,
        b: TokenHandle,
        result: Arc<Item>,
        owner: Option<task::Id>,
    ) -> Option<(TokenHandle, Point)> {
        if a == b || self.usable(a).is_err() || self.usable(b).is_err() {
            return None;
        }
        let midpoint = self.get(a)?.position.midpoint(&self.get(b)?.position);

        let mut indices = [self.index_of(a)?, self.index_of(b)?];
        indices.sort_unstable();
        // Higher index first so the lower one stays valid
        let second = (indices[1], self.tokens.remove(indices[1]));
        let first = (indices[0], self.tokens.remove(indices[0]));
        if self.moving == Some(a) || self.moving == Some(b) {
            self.moving = None;
        }

        let measured = self.token_size.unwrap_or(Size::new(0.0, 0.0));
        let handle = self.insert(result, midpoint, measured);
        if let Some(token) = self.get_mut(handle) {
            token.merging = true;
        }
        self.pending.insert(
            handle,
            PendingMerge {
                owner,
                consumed: [first, second],
            },
        );
        Some((handle, midpoint))
    }

    /// Unlock the result of a pending merge. No-op if it was cleared.
    pub fn finish_merge(&mut self, result: TokenHandle) {
        self.pending.remove(&result);
        if let Some(token) = self.get_mut(result) {
            token.merging = false;
        }
    }

    /// Undo a pending merge: remove the result and restore the consumed pair
    /// where it was. False if the merge is no longer pending.
    pub fn revert_merge(&mut self, result: TokenHandle) -> bool {
        let Some(pending) = self.pending.remove(&result) else {
            return false;
        };
        let Some(index) = self.index_of(result) else {
            return false;
        };
        self.tokens.remove(index);
        for (at, token) in pending.consumed {
            let at = at.min(self.tokens.len());
            self.tokens.insert(at, token);
        }
        true
    }

    /// Revert pending merges run by any of `owners`. Returns how many.
    pub fn revert_owned_by(&mut self, owners: &[task::Id]) -> usize {
        let results: Vec<TokenHandle> = self
            .pending
            .iter()
            .filter(|(_, p)| p.owner.is_some_and(|id| owners.contains(&id)))
            .map(|(handle, _)| *handle)
            .collect();
        results
            .into_iter()
            .filter(|handle| self.revert_merge(*handle))
            .count()
    }

    /// Remove every token and any move in progress
    pub fn clear(&mut self) {
        self.tokens.clear();
        self.pending.clear();
        self.moving = None;
    }

    pub fn snapshot(&self) -> SurfaceSnapshot {
        SurfaceSnapshot {
            bounds: self.bounds,
            token_size: self.token_size,
            tokens: self
                .tokens
                .iter()
                .map(|t| TokenView {
                    handle: t.handle,
                    item: (*t.item).clone(),
                    position: t.position,
                    moving: self.moving == Some(t.handle),
                    merging: t.merging,
                })
                .collect(),
        }
    }
}
