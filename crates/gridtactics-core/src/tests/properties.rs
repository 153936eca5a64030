//! Property-based checks of planner, resolver and pipeline invariants.

use std::collections::{BTreeMap, HashSet};

use gridmap::{GridCoord, GridMap};
use proptest::prelude::*;

use crate::actor::ActorId;
use crate::config::DEFAULT_MAX_RECURSION_DEPTH;
use crate::planner::{plan_dash, plan_knockback, PathPlanResult};
use crate::query::GridQuery;
use crate::request::{DisplacementFlags, DisplacementPriority, DisplacementRequest};
use crate::resolver::resolve_all_conflicts;
use crate::world::World;

use super::helpers::seeded_skirmish;

fn direction() -> impl Strategy<Value = GridCoord> {
    prop::sample::select(vec![
        GridCoord::EAST,
        GridCoord::WEST,
        GridCoord::NORTH,
        GridCoord::SOUTH,
    ])
}

fn priority() -> impl Strategy<Value = DisplacementPriority> {
    prop::sample::select(vec![
        DisplacementPriority::Passive,
        DisplacementPriority::Active,
        DisplacementPriority::Forced,
    ])
}

/// A 10x10 board with scattered walls and an actor at `start`, if it fits.
fn board_with(seed: u64, start: GridCoord) -> Option<(World, ActorId)> {
    let mut map = GridMap::open(10, 10);
    map.scatter_obstacles(seed, 0.2, &[start]);
    let mut world = World::new(map);
    let mover = world.spawn(start)?;
    for offset in [GridCoord::new(2, 0), GridCoord::new(0, 3), GridCoord::new(-1, -2)] {
        let _ = world.spawn(start + offset);
    }
    Some((world, mover))
}

fn is_straight_walk(plan: &PathPlanResult, start: GridCoord, direction: GridCoord) -> bool {
    plan.path.first().map_or(true, |&first| first == start)
        && plan.path.windows(2).all(|pair| pair[1] - pair[0] == direction)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn dash_walks_a_bounded_straight_line(
        seed in any::<u64>(),
        x in 0i32..10,
        y in 0i32..10,
        dir in direction(),
        distance in -2i32..12,
        collide in any::<bool>(),
    ) {
        let start = GridCoord::new(x, y);
        let Some((world, mover)) = board_with(seed, start) else {
            return Ok(());
        };
        let flags = if collide {
            DisplacementFlags::CAN_COLLIDE | DisplacementFlags::STOP_ON_COLLISION
        } else {
            DisplacementFlags::STOP_ON_COLLISION
        };
        let plan = plan_dash(&world, start, dir, distance, flags, 1, Some(mover));

        prop_assert!(is_straight_walk(&plan, start, dir));
        prop_assert!(plan.steps_taken() <= usize::try_from(distance.max(0)).unwrap_or(0));
        if !collide {
            prop_assert!(plan.collisions.is_empty());
            for &cell in plan.path.iter().skip(1) {
                prop_assert!(world.is_cell_passable(cell, Some(mover)));
            }
        }
    }

    #[test]
    fn knockback_is_valid_iff_it_moves(
        seed in any::<u64>(),
        x in 0i32..10,
        y in 0i32..10,
        dir in direction(),
        distance in -1i32..6,
    ) {
        let start = GridCoord::new(x, y);
        let Some((world, mover)) = board_with(seed, start) else {
            return Ok(());
        };
        let plan = plan_knockback(&world, start, dir, distance, Some(mover));

        prop_assert!(is_straight_walk(&plan, start, dir));
        prop_assert_eq!(plan.valid, plan.steps_taken() >= 1);
        prop_assert!(plan.collisions.len() <= 1);
    }

    #[test]
    fn each_contested_cell_keeps_one_winner(
        moves in prop::collection::vec((0i32..6, 0i32..4, priority()), 1..12),
    ) {
        let mut batch: Vec<DisplacementRequest> = moves
            .iter()
            .enumerate()
            .map(|(i, &(from, to, prio))| {
                let start = GridCoord::new(from, 1);
                let end = GridCoord::new(to, 0);
                let actor = ActorId::new(i as u64 + 1);
                let mut request =
                    DisplacementRequest::teleport(actor, start, end).with_priority(prio);
                request.apply_plan(PathPlanResult {
                    valid: true,
                    path: vec![start, end],
                    ..PathPlanResult::default()
                });
                request
            })
            .collect();

        let mut groups: BTreeMap<GridCoord, Vec<usize>> = BTreeMap::new();
        for (index, request) in batch.iter().enumerate() {
            groups.entry(request.actual_end).or_default().push(index);
        }
        let mut expected_winners: Vec<usize> = groups
            .values()
            .map(|members| {
                let best = members
                    .iter()
                    .map(|&i| batch[i].priority)
                    .max()
                    .unwrap_or(DisplacementPriority::Passive);
                members.iter().copied().find(|&i| batch[i].priority == best).unwrap_or(members[0])
            })
            .collect();
        expected_winners.sort_unstable();

        resolve_all_conflicts(&mut batch);

        let survivors: Vec<usize> =
            (0..batch.len()).filter(|&i| !batch[i].is_cancelled()).collect();
        prop_assert_eq!(survivors, expected_winners);
        for request in batch.iter().filter(|r| r.is_cancelled()) {
            prop_assert_eq!(&request.path, &vec![request.start]);
            prop_assert_eq!(request.destination(), None);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn pipeline_keeps_its_invariants(seed in any::<u64>()) {
        let (mut world, mut manager) = seeded_skirmish(seed, 10, 18);
        let outcome = manager.process_displacements(&mut world);

        prop_assert!(outcome.max_depth_reached <= DEFAULT_MAX_RECURSION_DEPTH);
        prop_assert!(manager.current_recursion_depth() <= DEFAULT_MAX_RECURSION_DEPTH);
        prop_assert_eq!(manager.pending_count(), 0);

        for request in &outcome.requests {
            prop_assert_eq!(request.path.first().copied(), Some(request.start));
            prop_assert_eq!(request.path.last().copied(), Some(request.actual_end));
            if request.is_cancelled() {
                prop_assert_eq!(request.actual_end, request.start);
            }
        }

        let mut seen = HashSet::new();
        for id in world.actor_ids() {
            let cell = world.current_cell(id);
            prop_assert!(cell.is_some());
            prop_assert!(seen.insert(cell), "two actors share {:?}", cell);
        }
    }
}
