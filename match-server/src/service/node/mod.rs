//! Resolution of the network node sequence a route passes through.
//!
//! The pure parts — which nodes must be visited and in which candidate
//! orders — live in [`visited`] and [`combinations`]. Picking the best
//! candidate is delegated to the database, which routes each candidate with
//! pgRouting and keeps the cheapest one covering both terminus links.

pub mod candidates;
pub mod combinations;
pub mod visited;

use sqlx::PgPool;
use tracing::debug;

use crate::domain::{NodeIdSequence, SnappedPointOnLink, VehicleType};
use crate::repository::RepositoryError;
use crate::repository::node::resolve_best_node_sequence;
use crate::repository::routing::BufferAreaRestriction;

pub use candidates::NodeSequenceCandidates;

/// Outcome of resolving the best node sequence from candidates.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeSequenceResolution {
    Succeeded {
        node_ids: NodeIdSequence,
        point_on_start_link: SnappedPointOnLink,
        point_on_end_link: SnappedPointOnLink,
    },
    Failed {
        message: String,
    },
}

/// Resolve the best node sequence from candidate sets, trying them in the
/// given preference order.
///
/// When a buffer area restriction is given, each candidate pair's terminus
/// links are admitted into the edge set explicitly, since terminus links
/// regularly lie partly outside the buffer.
pub async fn resolve_node_id_sequence(
    pool: &PgPool,
    node_sequence_candidates: &[NodeSequenceCandidates],
    vehicle_type: VehicleType,
    buffer_area_restriction: Option<&BufferAreaRestriction>,
) -> Result<NodeSequenceResolution, RepositoryError> {
    // A lone candidate pair with a single possible sequence needs no
    // database round trip.
    if let [only] = node_sequence_candidates {
        if let [only_sequence] = only.node_id_sequences.as_slice() {
            return Ok(NodeSequenceResolution::Succeeded {
                node_ids: only_sequence.clone(),
                point_on_start_link: only.point_on_start_link.clone(),
                point_on_end_link: only.point_on_end_link.clone(),
            });
        }
    }

    for candidates in node_sequence_candidates {
        debug!(
            start_link = %candidates.point_on_start_link.link_id,
            end_link = %candidates.point_on_end_link.link_id,
            sequences = candidates.node_id_sequences.len(),
            "resolving best node sequence between terminus links"
        );

        let buffer_with_terminus_links = buffer_area_restriction.map(|buffer| {
            BufferAreaRestriction::with_terminus_links(
                buffer.line_geometry.clone(),
                buffer.buffer_radius_meters,
                &candidates.point_on_start_link,
                &candidates.point_on_end_link,
            )
        });

        let resolved = resolve_best_node_sequence(
            pool,
            candidates.point_on_start_link.link_id,
            candidates.point_on_end_link.link_id,
            &candidates.node_id_sequences,
            vehicle_type,
            buffer_with_terminus_links.as_ref(),
        )
        .await?;

        if let Some(node_ids) = resolved {
            return Ok(NodeSequenceResolution::Succeeded {
                node_ids,
                point_on_start_link: candidates.point_on_start_link.clone(),
                point_on_end_link: candidates.point_on_end_link.clone(),
            });
        }
    }

    Ok(NodeSequenceResolution::Failed {
        message: "could not resolve node identifier sequence from candidates".to_string(),
    })
}
