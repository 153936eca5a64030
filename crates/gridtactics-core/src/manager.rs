//! The displacement orchestrator.
//!
//! [`GridManager`] batches displacement requests and resolves them in one
//! synchronous pass. It is the only stateful component of the core: it owns
//! the pending queue, the advisory reservation table and the event log.
//! Collaborators are injected per call, never stored.
//!
//! # Pipeline
//!
//! [`GridManager::process_displacements`] runs:
//!
//! 1. **PLAN**: every pending request is planned against a frozen view of the
//!    world. Planning is read-only, so the batch is planned in parallel.
//! 2. **RESOLVE**: destination conflicts are arbitrated, then collisions turn
//!    into Forced knockbacks. Knockbacks are processed generation by
//!    generation (re-fetch cell, re-plan, resolve, classify) until no chain
//!    continues or the recursion bound is hit. A struck actor's own move is
//!    cancelled in favour of its knockback. A final conflict pass runs over
//!    the merged batch, and strikers whose target stayed put are pulled back
//!    off its cell until no executing path ends on an occupied cell.
//! 3. **EXECUTE**: every request that is not cancelled and actually moves is
//!    handed to the movement executor.
//!
//! # Reservations
//!
//! The reservation table is an advisory lock for single-step movement
//! ([`GridManager::begin_step`] / [`GridManager::finish_step`]). The batch
//! pipeline never consults it; it checks live occupancy instead.
//!
//! # Example
//!
//! ```
//! use gridmap::{GridCoord, GridMap};
//! use gridtactics_core::manager::GridManager;
//! use gridtactics_core::query::GridQuery;
//! use gridtactics_core::world::World;
//!
//! let mut world = World::new(GridMap::open(8, 8));
//! let hero = world.spawn(GridCoord::new(0, 0)).unwrap();
//!
//! let mut manager = GridManager::new();
//! manager.request_dash(&world, hero, GridCoord::EAST, 3, None).unwrap();
//!
//! let outcome = manager.process_displacements(&mut world);
//! assert_eq!(outcome.requests[0].actual_end, GridCoord::new(3, 0));
//! assert_eq!(world.current_cell(hero), Some(GridCoord::new(3, 0)));
//! assert_eq!(manager.pending_count(), 0);
//! ```

use std::collections::{HashMap, HashSet};

use gridmap::GridCoord;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::actor::ActorId;
use crate::config::ManagerConfig;
use crate::error::{DisplacementError, DisplacementResult, StepError};
use crate::event::{DisplacementEvent, EventLog};
use crate::planner::plan_request;
use crate::query::{DisplacementWorld, GridQuery, MovementExecutor};
use crate::request::{BlockReason, DisplacementRequest, ExecutionResult, RequestId};
use crate::resolver::{
    detect_end_point_conflicts, generate_chain_knockbacks, generate_knockback_requests,
    resolve_single_conflict,
};

/// Summary of one [`GridManager::process_displacements`] run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutcome {
    /// Final batch: original requests followed by accepted knockbacks
    pub requests: Vec<DisplacementRequest>,
    /// Number of destination conflicts arbitrated across all passes
    pub conflicts_resolved: usize,
    /// Deepest knockback generation processed
    pub max_depth_reached: u32,
    /// Knockbacks discarded because they exceeded the recursion bound
    pub dropped_knockbacks: usize,
    /// Queued requests skipped because their requester left the board
    pub skipped_requests: usize,
}

impl PipelineOutcome {
    /// Requests that were handed to the movement executor.
    pub fn executed(&self) -> impl Iterator<Item = &DisplacementRequest> + '_ {
        self.requests.iter().filter(|r| r.should_execute())
    }

    /// The final request for `actor`, if it took part in the run.
    #[must_use]
    pub fn request_for(&self, actor: ActorId) -> Option<&DisplacementRequest> {
        self.requests.iter().rev().find(|r| r.requester == actor)
    }
}

/// Batches and resolves displacement requests.
#[derive(Debug, Default)]
pub struct GridManager {
    config: ManagerConfig,
    pending: Vec<DisplacementRequest>,
    reservations: HashMap<GridCoord, ActorId>,
    current_recursion_depth: u32,
    next_request_id: u64,
    events: EventLog,
}

impl GridManager {
    /// Creates a manager with the default config.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a manager with a validated config.
    ///
    /// # Errors
    ///
    /// Returns [`DisplacementError::InvalidConfig`] if a value is out of range.
    pub fn with_config(config: ManagerConfig) -> DisplacementResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Requests waiting for the next pipeline run, in submission order.
    #[must_use]
    pub fn pending(&self) -> &[DisplacementRequest] {
        &self.pending
    }

    /// Number of requests waiting for the next pipeline run.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Knockback generation reached by the last pipeline run.
    #[must_use]
    pub fn current_recursion_depth(&self) -> u32 {
        self.current_recursion_depth
    }

    /// Events recorded since the last drain.
    #[must_use]
    pub fn events(&self) -> &[DisplacementEvent] {
        self.events.events()
    }

    /// Drains the event log.
    pub fn take_events(&mut self) -> Vec<DisplacementEvent> {
        self.events.take_events()
    }

    // =========================================================================
    // Submission
    // =========================================================================

    /// Queues a dash of up to `distance` cells.
    ///
    /// With `knockback_on_hit = Some(n)` the dash collides with actors in its
    /// way and knocks them back `n` cells; otherwise actors block it.
    ///
    /// # Errors
    ///
    /// Returns [`DisplacementError::InvalidRequest`] if `requester` is not on
    /// the board.
    pub fn request_dash(
        &mut self,
        grid: &impl GridQuery,
        requester: ActorId,
        direction: GridCoord,
        distance: i32,
        knockback_on_hit: Option<i32>,
    ) -> DisplacementResult<RequestId> {
        let start = Self::locate(grid, requester)?;
        let mut request = DisplacementRequest::dash(requester, start, direction, distance)
            .with_duration(self.config.dash_duration);
        if let Some(knockback) = knockback_on_hit {
            request = request.with_knockback_on_hit(knockback);
        }
        Ok(self.enqueue(request))
    }

    /// Queues a push that knocks struck actors back `knockback_on_hit` cells.
    ///
    /// With `chain` set, the struck actors pass a decayed knockback on to
    /// whatever they are slammed into.
    ///
    /// # Errors
    ///
    /// Returns [`DisplacementError::InvalidRequest`] if `requester` is not on
    /// the board.
    pub fn request_push(
        &mut self,
        grid: &impl GridQuery,
        requester: ActorId,
        direction: GridCoord,
        distance: i32,
        knockback_on_hit: i32,
        chain: bool,
    ) -> DisplacementResult<RequestId> {
        let start = Self::locate(grid, requester)?;
        let mut request = DisplacementRequest::push(requester, start, direction, distance)
            .with_knockback_on_hit(knockback_on_hit)
            .with_duration(self.config.dash_duration);
        if chain {
            request = request.with_chain(self.config.chain_decay);
        }
        Ok(self.enqueue(request))
    }

    /// Queues a teleport to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`DisplacementError::InvalidRequest`] if `requester` is not on
    /// the board.
    pub fn request_teleport(
        &mut self,
        grid: &impl GridQuery,
        requester: ActorId,
        target: GridCoord,
    ) -> DisplacementResult<RequestId> {
        let start = Self::locate(grid, requester)?;
        let request = DisplacementRequest::teleport(requester, start, target)
            .with_duration(self.config.teleport_duration);
        Ok(self.enqueue(request))
    }

    /// Queues a Passive knockback of `requester`.
    ///
    /// # Errors
    ///
    /// Returns [`DisplacementError::InvalidRequest`] if `requester` is not on
    /// the board.
    pub fn request_knockback(
        &mut self,
        grid: &impl GridQuery,
        requester: ActorId,
        direction: GridCoord,
        distance: i32,
    ) -> DisplacementResult<RequestId> {
        let start = Self::locate(grid, requester)?;
        let request = DisplacementRequest::knockback(requester, start, direction, distance)
            .with_duration(self.config.knockback_duration);
        Ok(self.enqueue(request))
    }

    /// Queues a caller-built request as is.
    ///
    /// The request's `start` is kept; only the requester's presence is checked.
    ///
    /// # Errors
    ///
    /// Returns [`DisplacementError::InvalidRequest`] if `requester` is not on
    /// the board.
    pub fn submit_custom_request(
        &mut self,
        grid: &impl GridQuery,
        request: DisplacementRequest,
    ) -> DisplacementResult<RequestId> {
        Self::locate(grid, request.requester)?;
        Ok(self.enqueue(request))
    }

    fn locate(grid: &impl GridQuery, requester: ActorId) -> DisplacementResult<GridCoord> {
        grid.current_cell(requester).ok_or_else(|| {
            warn!(%requester, "request skipped: requester not on the board");
            DisplacementError::InvalidRequest {
                actor: requester,
                reason: "requester is not on the board",
            }
        })
    }

    fn assign_id(&mut self, request: &mut DisplacementRequest) -> RequestId {
        self.next_request_id += 1;
        request.id = RequestId::new(self.next_request_id);
        request.id
    }

    fn enqueue(&mut self, mut request: DisplacementRequest) -> RequestId {
        let id = self.assign_id(&mut request);
        debug!(%id, actor = %request.requester, kind = %request.kind, "request queued");
        self.pending.push(request);
        id
    }

    // =========================================================================
    // Pipeline
    // =========================================================================

    /// Runs Plan → Resolve → Execute over every pending request.
    ///
    /// The queue is empty afterwards. The whole pass, knockback chains
    /// included, completes within this call.
    pub fn process_displacements<W: DisplacementWorld>(
        &mut self,
        world: &mut W,
    ) -> PipelineOutcome {
        self.current_recursion_depth = 0;
        let mut batch = std::mem::take(&mut self.pending);
        let mut outcome = PipelineOutcome::default();

        // PHASE 1: PLAN
        outcome.skipped_requests = Self::drop_absent_requesters(&*world, &mut batch);
        Self::plan_batch(&*world, &mut batch);
        self.record_planned(&batch);
        debug!(requests = batch.len(), "plan phase complete");

        // PHASE 2: RESOLVE
        outcome.conflicts_resolved += self.resolve_conflicts(&mut batch);
        let generated = generate_knockback_requests(&batch, self.config.knockback_duration);
        if !generated.is_empty() {
            debug!(knockbacks = generated.len(), "collisions generated knockbacks");
            let accepted = self.process_knockback_queue(world, generated, &mut outcome);
            let original_len = batch.len();
            batch.extend(accepted);
            Self::supersede_struck_moves(&mut batch, original_len);
            outcome.conflicts_resolved += self.resolve_conflicts(&mut batch);
            while Self::hold_back_strikers(&*world, &mut batch) {
                outcome.conflicts_resolved += self.resolve_conflicts(&mut batch);
            }
        }
        debug!(conflicts = outcome.conflicts_resolved, "resolve phase complete");

        // PHASE 3: EXECUTE
        let mut executed = 0usize;
        for request in batch.iter().filter(|r| r.should_execute()) {
            world.execute_path(request.requester, &request.path, request.execution_duration);
            self.events.push(DisplacementEvent::Executed {
                request: request.id,
                actor: request.requester,
                end: request.actual_end,
                steps: request.steps_taken(),
            });
            executed += 1;
        }

        outcome.max_depth_reached = self.current_recursion_depth;
        outcome.requests = batch;
        info!(
            requests = outcome.requests.len(),
            executed,
            conflicts = outcome.conflicts_resolved,
            depth = outcome.max_depth_reached,
            dropped = outcome.dropped_knockbacks,
            skipped = outcome.skipped_requests,
            "displacements processed"
        );
        outcome
    }

    /// Processes generated knockbacks one generation at a time.
    ///
    /// Returns the knockbacks that moved their actor, for Execute. Zero-step
    /// knockbacks cost the actor wall-crash damage and are not returned; a
    /// partial knockback stopped by terrain costs damage and is returned.
    /// Generations past `max_recursion_depth` are dropped.
    fn process_knockback_queue<W: DisplacementWorld>(
        &mut self,
        world: &mut W,
        generated: Vec<DisplacementRequest>,
        outcome: &mut PipelineOutcome,
    ) -> Vec<DisplacementRequest> {
        let mut accepted = Vec::new();
        let mut generation = generated;

        while !generation.is_empty() {
            if self.current_recursion_depth >= self.config.max_recursion_depth {
                let depth = self.current_recursion_depth + 1;
                for dropped in &generation {
                    self.events.push(DisplacementEvent::ChainDropped {
                        actor: dropped.requester,
                        depth,
                    });
                }
                warn!(
                    count = generation.len(),
                    depth,
                    max = self.config.max_recursion_depth,
                    "knockback chain exceeded recursion bound"
                );
                outcome.dropped_knockbacks += generation.len();
                break;
            }
            self.current_recursion_depth += 1;
            let depth = self.current_recursion_depth;

            for knockback in &mut generation {
                self.assign_id(knockback);
                self.events.push(DisplacementEvent::KnockbackGenerated {
                    actor: knockback.requester,
                    from: knockback.start,
                    direction: knockback.direction,
                    distance: knockback.max_distance,
                    depth,
                });
            }

            generation.retain_mut(|knockback| match world.current_cell(knockback.requester) {
                Some(cell) => {
                    knockback.start = cell;
                    knockback.actual_end = cell;
                    knockback.path = vec![cell];
                    true
                }
                None => {
                    warn!(actor = %knockback.requester, "knockback target left the board");
                    false
                }
            });

            Self::plan_batch(&*world, &mut generation);
            self.record_planned(&generation);
            outcome.conflicts_resolved += self.resolve_conflicts(&mut generation);

            for knockback in generation.iter().filter(|k| !k.is_cancelled()) {
                let steps = knockback.steps_taken();
                let stopped_short =
                    usize::try_from(knockback.max_distance).is_ok_and(|max| steps < max);

                if steps == 0 {
                    self.wall_crash(world, knockback);
                } else {
                    if stopped_short && knockback.block_reason.is_wall() {
                        self.wall_crash(world, knockback);
                    }
                    accepted.push(knockback.clone());
                }
            }

            debug!(depth, knockbacks = generation.len(), "knockback generation processed");
            generation = generate_chain_knockbacks(&generation, self.config.knockback_duration);
        }

        accepted
    }

    /// Cancels moves overridden by a later knockback of the same actor.
    ///
    /// Knockbacks start at the struck actor's cell before anything executed, so
    /// only the latest knockback per actor runs, and the actor's own request
    /// from the original batch is cancelled.
    fn supersede_struck_moves(batch: &mut [DisplacementRequest], original_len: usize) {
        let mut knocked: HashSet<ActorId> = HashSet::new();
        for index in (0..batch.len()).rev() {
            let request = &mut batch[index];
            if !request.should_execute() {
                continue;
            }
            let superseded = knocked.contains(&request.requester);
            if index >= original_len {
                knocked.insert(request.requester);
            }
            if superseded {
                debug!(actor = %request.requester, "move superseded by knockback");
                request.cancel();
            }
        }
    }

    /// Pulls strikers back off cells whose occupant is not moving away.
    ///
    /// A dash enters a struck actor's cell on the promise that the actor will
    /// be knocked out of it. When that knockback was dropped, cancelled or
    /// stopped at zero steps, the striker stops one cell earlier instead.
    /// Returns true if any path was shortened.
    fn hold_back_strikers<G: GridQuery>(grid: &G, batch: &mut [DisplacementRequest]) -> bool {
        let leaving: HashSet<ActorId> = batch
            .iter()
            .filter(|r| r.should_execute())
            .map(|r| r.requester)
            .collect();

        let mut any_held = false;
        for request in batch.iter_mut().filter(|r| r.should_execute()) {
            let mut held_back = false;
            while request.path.len() > 1 {
                let end = request.actual_end;
                let staying = grid
                    .actor_at(end)
                    .filter(|&o| o != request.requester && !leaving.contains(&o));
                let Some(occupant) = staying else {
                    break;
                };
                request.path.pop();
                request.actual_end = request.path.last().copied().unwrap_or(request.start);
                held_back = true;
                debug!(actor = %request.requester, %occupant, cell = %end, "striker held back");
            }
            if held_back {
                any_held = true;
                if request.path.len() == 1 {
                    request.execution_result = ExecutionResult::Blocked;
                    request.block_reason = BlockReason::AnotherActor;
                }
            }
        }
        any_held
    }

    fn wall_crash<W: DisplacementWorld>(&mut self, world: &mut W, knockback: &DisplacementRequest) {
        let damage = self.config.wall_crash_damage;
        world.apply_damage(knockback.requester, damage);
        self.events.push(DisplacementEvent::WallCrash {
            actor: knockback.requester,
            cell: knockback.actual_end,
            damage,
            reason: knockback.block_reason,
        });
        warn!(
            actor = %knockback.requester,
            cell = %knockback.actual_end,
            reason = ?knockback.block_reason,
            damage,
            "knockback wall crash"
        );
    }

    /// Removes requests whose requester is no longer on the board.
    ///
    /// Returns how many were removed.
    fn drop_absent_requesters<G: GridQuery>(
        grid: &G,
        batch: &mut Vec<DisplacementRequest>,
    ) -> usize {
        let before = batch.len();
        batch.retain(|request| {
            let present = grid.current_cell(request.requester).is_some();
            if !present {
                warn!(
                    request = %request.id,
                    actor = %request.requester,
                    "requester left the board, request skipped"
                );
            }
            present
        });
        before - batch.len()
    }

    fn plan_batch<G: GridQuery>(grid: &G, batch: &mut [DisplacementRequest]) {
        batch.par_iter_mut().for_each(|request| {
            let plan = plan_request(grid, request);
            request.apply_plan(plan);
        });
    }

    fn record_planned(&mut self, batch: &[DisplacementRequest]) {
        for request in batch {
            self.events.push(DisplacementEvent::Planned {
                request: request.id,
                actor: request.requester,
                kind: request.kind,
                result: request.execution_result,
                end: request.actual_end,
            });
        }
    }

    fn resolve_conflicts(&mut self, batch: &mut [DisplacementRequest]) -> usize {
        let conflicts = detect_end_point_conflicts(batch);
        for conflict in &conflicts {
            let Some(winner) = resolve_single_conflict(batch, conflict) else {
                continue;
            };
            let cancelled = conflict
                .involved
                .iter()
                .filter(|&&index| index != winner)
                .map(|&index| batch[index].requester)
                .collect();
            self.events.push(DisplacementEvent::ConflictResolved {
                cell: conflict.cell,
                winner: batch[winner].requester,
                cancelled,
            });
        }
        conflicts.len()
    }

    // =========================================================================
    // Reservations
    // =========================================================================

    /// Reserves `cell` for `actor`. Fails if anyone already holds it.
    pub fn reserve_grid(&mut self, cell: GridCoord, actor: ActorId) -> bool {
        if self.reservations.contains_key(&cell) {
            return false;
        }
        self.reservations.insert(cell, actor);
        true
    }

    /// Reserves `cell` for `actor`, overwriting any holder.
    pub fn force_reserve_grid(&mut self, cell: GridCoord, actor: ActorId) {
        self.reservations.insert(cell, actor);
    }

    /// Clears the reservation on `cell`, returning the previous holder.
    pub fn release_grid(&mut self, cell: GridCoord) -> Option<ActorId> {
        self.reservations.remove(&cell)
    }

    /// Current holder of the reservation on `cell`.
    #[must_use]
    pub fn reserved_by(&self, cell: GridCoord) -> Option<ActorId> {
        self.reservations.get(&cell).copied()
    }

    /// Number of reserved cells.
    #[must_use]
    pub fn reservation_count(&self) -> usize {
        self.reservations.len()
    }

    // =========================================================================
    // Single-step movement
    // =========================================================================

    /// Starts a one-cell step of `actor` along `direction`.
    ///
    /// The destination is reserved first; if it then turns out to be
    /// unwalkable or occupied the reservation is released again. On success
    /// the caller animates the step and calls [`GridManager::finish_step`].
    ///
    /// # Errors
    ///
    /// Returns a [`StepError`] describing why the step cannot start.
    pub fn begin_step(
        &mut self,
        grid: &impl GridQuery,
        actor: ActorId,
        direction: GridCoord,
    ) -> Result<GridCoord, StepError> {
        if !direction.is_axis_unit() {
            return Err(StepError::InvalidDirection(direction));
        }
        let from = grid
            .current_cell(actor)
            .ok_or(StepError::UnknownActor(actor))?;
        let target = from + direction;

        if !self.reserve_grid(target, actor) {
            let holder = self.reserved_by(target).unwrap_or(actor);
            return Err(StepError::Reserved {
                cell: target,
                holder,
            });
        }

        if !grid.is_cell_valid(target) || !grid.is_cell_walkable(target) {
            self.release_grid(target);
            return Err(StepError::NotWalkable(target));
        }
        if let Some(occupant) = grid.actor_at(target).filter(|&o| o != actor) {
            self.release_grid(target);
            return Err(StepError::Occupied {
                cell: target,
                occupant,
            });
        }

        debug!(%actor, %from, %target, "step started");
        Ok(target)
    }

    /// Completes a step started with [`GridManager::begin_step`].
    ///
    /// Moves the actor onto `target` over `duration` seconds and releases the
    /// reservation.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::UnknownActor`] if the actor left the board; the
    /// reservation is released either way.
    pub fn finish_step<W: GridQuery + MovementExecutor>(
        &mut self,
        world: &mut W,
        actor: ActorId,
        target: GridCoord,
        duration: f32,
    ) -> Result<(), StepError> {
        if self.reserved_by(target) == Some(actor) {
            self.release_grid(target);
        }
        let from = world
            .current_cell(actor)
            .ok_or(StepError::UnknownActor(actor))?;
        world.execute_path(actor, &[from, target], duration);
        debug!(%actor, %target, "step finished");
        Ok(())
    }
}
