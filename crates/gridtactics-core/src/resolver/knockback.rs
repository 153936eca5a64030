//! Knockback synthesis from recorded collisions.

use tracing::trace;

use crate::request::{BlockReason, DisplacementKind, DisplacementPriority, DisplacementRequest};

/// Builds one Forced knockback per actor struck by a Dash or Push.
///
/// Only non-cancelled requests that can collide and carry a positive
/// `knockback_distance_on_hit` contribute. The knockback starts on the struck
/// actor's cell and follows the striker's direction. A striker with
/// [`CHAIN_KNOCKBACK`](crate::request::DisplacementFlags::CHAIN_KNOCKBACK)
/// passes the flag and its decay on.
///
/// The batch itself is not modified; the caller decides what to do with the
/// generated requests.
#[must_use]
pub fn generate_knockback_requests(
    requests: &[DisplacementRequest],
    duration: f32,
) -> Vec<DisplacementRequest> {
    let mut generated = Vec::new();

    for striker in requests.iter().filter(|r| {
        !r.is_cancelled()
            && r.kind.strikes_actors()
            && r.can_collide_with_actors()
            && r.knockback_distance_on_hit > 0
    }) {
        for hit in &striker.collisions {
            let mut knockback = DisplacementRequest::knockback(
                hit.hit_actor,
                hit.cell,
                striker.direction,
                striker.knockback_distance_on_hit,
            )
            .with_priority(DisplacementPriority::Forced)
            .with_duration(duration);

            if striker.chains_knockback() {
                knockback = knockback.with_chain(striker.chain_decay);
            }

            trace!(
                striker = %striker.requester,
                target = %hit.hit_actor,
                cell = %hit.cell,
                distance = striker.knockback_distance_on_hit,
                "knockback generated"
            );
            generated.push(knockback);
        }
    }

    generated
}

/// Builds the next generation of a knockback chain.
///
/// A planned, non-cancelled knockback with
/// [`CHAIN_KNOCKBACK`](crate::request::DisplacementFlags::CHAIN_KNOCKBACK)
/// that was stopped by another actor passes a Forced knockback on to that
/// actor. The distance is
/// `floor(max_distance * chain_decay)`; links that decay to zero are not
/// generated.
#[must_use]
pub fn generate_chain_knockbacks(
    knockbacks: &[DisplacementRequest],
    duration: f32,
) -> Vec<DisplacementRequest> {
    knockbacks
        .iter()
        .filter(|k| {
            k.kind == DisplacementKind::Knockback
                && k.is_planned()
                && !k.is_cancelled()
                && k.chains_knockback()
                && k.block_reason == BlockReason::AnotherActor
        })
        .filter_map(|k| {
            let hit = k.collisions.last()?;
            let distance = chain_distance(k.max_distance, k.chain_decay);
            if distance <= 0 {
                trace!(source = %k.requester, target = %hit.hit_actor, "chain decayed out");
                return None;
            }
            Some(
                DisplacementRequest::knockback(hit.hit_actor, hit.cell, k.direction, distance)
                    .with_priority(DisplacementPriority::Forced)
                    .with_chain(k.chain_decay)
                    .with_duration(duration),
            )
        })
        .collect()
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn chain_distance(distance: i32, decay: f32) -> i32 {
    (distance as f32 * decay).floor() as i32
}
