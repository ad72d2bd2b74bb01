//! Expansion of visited nodes into candidate node identifier sequences.

use crate::domain::{NodeIdSequence, filter_consecutive_duplicates};

use super::visited::VisitedNodes;

/// Produce the candidate node id sequences for a visit plan.
///
/// Each bidirectional terminus link contributes two orderings of its
/// endpoint nodes, so a visit over two terminus links yields at most four
/// sequences. Which ordering produces the shortest route is decided later
/// against the database.
pub fn node_id_sequence_combinations(nodes_to_visit: &VisitedNodes) -> Vec<NodeIdSequence> {
    match nodes_to_visit {
        VisitedNodes::OnSingleLink(on_link) => on_link.node_id_sequences(),

        VisitedNodes::OnMultipleLinks {
            on_start_link,
            via_node_ids,
            on_end_link,
        } => on_start_link
            .node_id_sequences()
            .iter()
            .flat_map(|start_seq| {
                on_end_link.node_id_sequences().into_iter().map(|end_seq| {
                    let mut combined = start_seq.as_slice().to_vec();
                    combined.extend_from_slice(via_node_ids);
                    combined.extend_from_slice(end_seq.as_slice());

                    NodeIdSequence::new(filter_consecutive_duplicates(&combined))
                })
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::InfrastructureNodeId;
    use crate::service::node::visited::VisitedNodesOnLink;

    fn node(id: i64) -> InfrastructureNodeId {
        InfrastructureNodeId::new(id).unwrap()
    }

    fn seq(ids: &[i64]) -> NodeIdSequence {
        NodeIdSequence::new(ids.iter().map(|&id| node(id)).collect())
    }

    #[test]
    fn single_node_yields_one_sequence() {
        let combos = node_id_sequence_combinations(&VisitedNodes::OnSingleLink(
            VisitedNodesOnLink::SingleNode(node(1)),
        ));
        assert_eq!(combos, vec![seq(&[1])]);
    }

    #[test]
    fn bidirectional_single_link_yields_both_orderings() {
        let combos = node_id_sequence_combinations(&VisitedNodes::OnSingleLink(
            VisitedNodesOnLink::Bidirectional {
                first: node(1),
                second: node(2),
            },
        ));
        assert_eq!(combos, vec![seq(&[1, 2]), seq(&[2, 1])]);
    }

    #[test]
    fn two_bidirectional_terminus_links_yield_four_combinations() {
        let combos = node_id_sequence_combinations(&VisitedNodes::OnMultipleLinks {
            on_start_link: VisitedNodesOnLink::Bidirectional {
                first: node(1),
                second: node(2),
            },
            via_node_ids: vec![node(5)],
            on_end_link: VisitedNodesOnLink::Bidirectional {
                first: node(3),
                second: node(4),
            },
        });

        assert_eq!(
            combos,
            vec![
                seq(&[1, 2, 5, 3, 4]),
                seq(&[1, 2, 5, 4, 3]),
                seq(&[2, 1, 5, 3, 4]),
                seq(&[2, 1, 5, 4, 3]),
            ]
        );
    }

    #[test]
    fn unidirectional_terminus_links_fix_the_ordering() {
        let combos = node_id_sequence_combinations(&VisitedNodes::OnMultipleLinks {
            on_start_link: VisitedNodesOnLink::Unidirectional {
                from: node(1),
                to: node(2),
            },
            via_node_ids: vec![],
            on_end_link: VisitedNodesOnLink::Unidirectional {
                from: node(3),
                to: node(4),
            },
        });

        assert_eq!(combos, vec![seq(&[1, 2, 3, 4])]);
    }

    #[test]
    fn shared_nodes_between_links_are_deduplicated() {
        // Terminus links sharing node 2: the duplicate is filtered out of
        // the combined sequence.
        let combos = node_id_sequence_combinations(&VisitedNodes::OnMultipleLinks {
            on_start_link: VisitedNodesOnLink::Unidirectional {
                from: node(1),
                to: node(2),
            },
            via_node_ids: vec![],
            on_end_link: VisitedNodesOnLink::Unidirectional {
                from: node(2),
                to: node(3),
            },
        });

        assert_eq!(combos, vec![seq(&[1, 2, 3])]);
    }
}
