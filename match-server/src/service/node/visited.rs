//! Resolution of the network nodes a route must visit.

use crate::domain::{
    InfrastructureNodeId, NodeIdSequence, SnappedPointOnLink, TrafficFlowDirection,
};

/// Nodes to visit while traversing a single infrastructure link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisitedNodesOnLink {
    /// The traversal collapses onto one node.
    SingleNode(InfrastructureNodeId),
    /// The link can only be traversed one way, fixing the node order.
    Unidirectional {
        from: InfrastructureNodeId,
        to: InfrastructureNodeId,
    },
    /// The link is bidirectional and either node order is viable.
    Bidirectional {
        first: InfrastructureNodeId,
        second: InfrastructureNodeId,
    },
}

impl VisitedNodesOnLink {
    /// The viable node orderings for this link, one sequence per ordering.
    pub fn node_id_sequences(&self) -> Vec<NodeIdSequence> {
        match self {
            VisitedNodesOnLink::SingleNode(node_id) => {
                vec![NodeIdSequence::new(vec![*node_id])]
            }
            VisitedNodesOnLink::Unidirectional { from, to } => {
                vec![NodeIdSequence::new(vec![*from, *to])]
            }
            VisitedNodesOnLink::Bidirectional { first, second } => vec![
                NodeIdSequence::new(vec![*first, *second]),
                NodeIdSequence::new(vec![*second, *first]),
            ],
        }
    }
}

/// Nodes to visit on a route, resolved from snapped terminus points and
/// interim via nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisitedNodes {
    OnSingleLink(VisitedNodesOnLink),
    OnMultipleLinks {
        on_start_link: VisitedNodesOnLink,
        via_node_ids: Vec<InfrastructureNodeId>,
        on_end_link: VisitedNodesOnLink,
    },
}

/// Nodes to visit while traversing a single link from a snapped point.
///
/// A snap onto an endpoint node, or a closed-loop link, collapses to a
/// single node. Otherwise the traffic flow direction determines which node
/// orderings are viable.
fn visited_nodes_on_link(point_on_link: &SnappedPointOnLink) -> VisitedNodesOnLink {
    if !point_on_link.has_discrete_nodes() || point_on_link.is_snapped_to_start_node() {
        VisitedNodesOnLink::SingleNode(point_on_link.start_node_id)
    } else if point_on_link.is_snapped_to_end_node() {
        VisitedNodesOnLink::SingleNode(point_on_link.end_node_id)
    } else {
        match point_on_link.direction {
            TrafficFlowDirection::Bidirectional => VisitedNodesOnLink::Bidirectional {
                first: point_on_link.start_node_id,
                second: point_on_link.end_node_id,
            },
            TrafficFlowDirection::AlongDigitisedDirection => VisitedNodesOnLink::Unidirectional {
                from: point_on_link.start_node_id,
                to: point_on_link.end_node_id,
            },
            TrafficFlowDirection::AgainstDigitisedDirection => VisitedNodesOnLink::Unidirectional {
                from: point_on_link.end_node_id,
                to: point_on_link.start_node_id,
            },
        }
    }
}

/// Resolve the nodes a route must visit between two snapped terminus points,
/// optionally passing through interim via nodes.
pub fn resolve_visited_nodes(
    point_on_start_link: &SnappedPointOnLink,
    via_node_ids: &[InfrastructureNodeId],
    point_on_end_link: &SnappedPointOnLink,
) -> VisitedNodes {
    let reduced_via_node_ids =
        reduce_via_node_ids(point_on_start_link, point_on_end_link, via_node_ids);

    if reduced_via_node_ids.is_empty() && point_on_start_link.is_on_same_link_as(point_on_end_link)
    {
        return from_single_link_without_via_nodes(
            point_on_start_link,
            point_on_end_link.fractional_measure,
        );
    }

    VisitedNodes::OnMultipleLinks {
        on_start_link: visited_nodes_on_start_link(point_on_start_link, &reduced_via_node_ids),
        via_node_ids: via_node_ids.to_vec(),
        on_end_link: visited_nodes_on_end_link(point_on_end_link, &reduced_via_node_ids),
    }
}

/// Drop via nodes that merely repeat the snapped terminus nodes.
fn reduce_via_node_ids(
    point_on_start_link: &SnappedPointOnLink,
    point_on_end_link: &SnappedPointOnLink,
    via_node_ids: &[InfrastructureNodeId],
) -> Vec<InfrastructureNodeId> {
    let first_node_id = point_on_start_link.closer_node_id();
    let last_node_id = point_on_end_link.closer_node_id();

    let ids: Vec<InfrastructureNodeId> = via_node_ids
        .iter()
        .copied()
        .skip_while(|id| *id == first_node_id)
        .collect();

    let trailing = ids.iter().rev().take_while(|id| **id == last_node_id).count();
    ids[..ids.len() - trailing].to_vec()
}

fn from_single_link_without_via_nodes(
    point_on_link: &SnappedPointOnLink,
    second_snap_fractional_location: f64,
) -> VisitedNodes {
    if !point_on_link.has_discrete_nodes() {
        return VisitedNodes::OnSingleLink(VisitedNodesOnLink::SingleNode(
            point_on_link.start_node_id,
        ));
    }

    let start_node_id = point_on_link.start_node_id;
    let end_node_id = point_on_link.end_node_id;
    let first_fraction = point_on_link.fractional_measure;

    match point_on_link.direction {
        TrafficFlowDirection::Bidirectional => {
            let on_link = if first_fraction < second_snap_fractional_location {
                VisitedNodesOnLink::Unidirectional {
                    from: start_node_id,
                    to: end_node_id,
                }
            } else if first_fraction > second_snap_fractional_location {
                VisitedNodesOnLink::Unidirectional {
                    from: end_node_id,
                    to: start_node_id,
                }
            } else {
                VisitedNodesOnLink::SingleNode(point_on_link.closer_node_id())
            };
            VisitedNodes::OnSingleLink(on_link)
        }
        TrafficFlowDirection::AlongDigitisedDirection => {
            let one_way = VisitedNodesOnLink::Unidirectional {
                from: start_node_id,
                to: end_node_id,
            };

            // The second snap lies behind the first on a one-way link, so
            // the link must be left and re-entered.
            if first_fraction > second_snap_fractional_location {
                VisitedNodes::OnMultipleLinks {
                    on_start_link: one_way.clone(),
                    via_node_ids: Vec::new(),
                    on_end_link: one_way,
                }
            } else {
                VisitedNodes::OnSingleLink(one_way)
            }
        }
        TrafficFlowDirection::AgainstDigitisedDirection => {
            let one_way = VisitedNodesOnLink::Unidirectional {
                from: end_node_id,
                to: start_node_id,
            };

            if first_fraction < second_snap_fractional_location {
                VisitedNodes::OnMultipleLinks {
                    on_start_link: one_way.clone(),
                    via_node_ids: Vec::new(),
                    on_end_link: one_way,
                }
            } else {
                VisitedNodes::OnSingleLink(one_way)
            }
        }
    }
}

fn visited_nodes_on_start_link(
    point_on_start_link: &SnappedPointOnLink,
    reduced_via_node_ids: &[InfrastructureNodeId],
) -> VisitedNodesOnLink {
    let snapped_terminus_node_id = point_on_start_link.closer_node_id();

    let via_continues_from_further_node = reduced_via_node_ids
        .first()
        .is_some_and(|id| *id == point_on_start_link.further_node_id());

    let one_way_ends_at_snapped_node = match point_on_start_link.direction {
        TrafficFlowDirection::AlongDigitisedDirection => {
            point_on_start_link.end_node_id == snapped_terminus_node_id
        }
        TrafficFlowDirection::AgainstDigitisedDirection => {
            point_on_start_link.start_node_id == snapped_terminus_node_id
        }
        TrafficFlowDirection::Bidirectional => false,
    };

    if one_way_ends_at_snapped_node || !via_continues_from_further_node {
        visited_nodes_on_link(point_on_start_link)
    } else {
        VisitedNodesOnLink::SingleNode(snapped_terminus_node_id)
    }
}

fn visited_nodes_on_end_link(
    point_on_end_link: &SnappedPointOnLink,
    reduced_via_node_ids: &[InfrastructureNodeId],
) -> VisitedNodesOnLink {
    let snapped_terminus_node_id = point_on_end_link.closer_node_id();

    let via_arrives_from_further_node = reduced_via_node_ids
        .last()
        .is_some_and(|id| *id == point_on_end_link.further_node_id());

    let one_way_starts_at_snapped_node = match point_on_end_link.direction {
        TrafficFlowDirection::AlongDigitisedDirection => {
            point_on_end_link.start_node_id == snapped_terminus_node_id
        }
        TrafficFlowDirection::AgainstDigitisedDirection => {
            point_on_end_link.end_node_id == snapped_terminus_node_id
        }
        TrafficFlowDirection::Bidirectional => false,
    };

    if one_way_starts_at_snapped_node || !via_arrives_from_further_node {
        visited_nodes_on_link(point_on_end_link)
    } else {
        VisitedNodesOnLink::SingleNode(snapped_terminus_node_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::InfrastructureLinkId;

    fn node(id: i64) -> InfrastructureNodeId {
        InfrastructureNodeId::new(id).unwrap()
    }

    fn snap_on_link(
        link: i64,
        fraction: f64,
        direction: TrafficFlowDirection,
        start_node: i64,
        end_node: i64,
    ) -> SnappedPointOnLink {
        SnappedPointOnLink::new(
            InfrastructureLinkId::new(link).unwrap(),
            1.0,
            fraction,
            direction,
            100.0,
            node(start_node),
            node(end_node),
        )
        .unwrap()
    }

    mod single_link {
        use super::*;

        #[test]
        fn closed_loop_collapses_to_its_node() {
            let start = snap_on_link(1, 0.2, TrafficFlowDirection::Bidirectional, 5, 5);
            let end = snap_on_link(1, 0.8, TrafficFlowDirection::Bidirectional, 5, 5);

            assert_eq!(
                resolve_visited_nodes(&start, &[], &end),
                VisitedNodes::OnSingleLink(VisitedNodesOnLink::SingleNode(node(5)))
            );
        }

        #[test]
        fn bidirectional_link_traversed_towards_link_end() {
            let start = snap_on_link(1, 0.2, TrafficFlowDirection::Bidirectional, 5, 6);
            let end = snap_on_link(1, 0.8, TrafficFlowDirection::Bidirectional, 5, 6);

            assert_eq!(
                resolve_visited_nodes(&start, &[], &end),
                VisitedNodes::OnSingleLink(VisitedNodesOnLink::Unidirectional {
                    from: node(5),
                    to: node(6),
                })
            );
        }

        #[test]
        fn bidirectional_link_traversed_towards_link_start() {
            let start = snap_on_link(1, 0.8, TrafficFlowDirection::Bidirectional, 5, 6);
            let end = snap_on_link(1, 0.2, TrafficFlowDirection::Bidirectional, 5, 6);

            assert_eq!(
                resolve_visited_nodes(&start, &[], &end),
                VisitedNodes::OnSingleLink(VisitedNodesOnLink::Unidirectional {
                    from: node(6),
                    to: node(5),
                })
            );
        }

        #[test]
        fn bidirectional_link_with_equal_snaps_collapses_to_closer_node() {
            let start = snap_on_link(1, 0.3, TrafficFlowDirection::Bidirectional, 5, 6);
            let end = snap_on_link(1, 0.3, TrafficFlowDirection::Bidirectional, 5, 6);

            assert_eq!(
                resolve_visited_nodes(&start, &[], &end),
                VisitedNodes::OnSingleLink(VisitedNodesOnLink::SingleNode(node(5)))
            );
        }

        #[test]
        fn one_way_link_in_snap_order_is_a_plain_traversal() {
            let start = snap_on_link(1, 0.2, TrafficFlowDirection::AlongDigitisedDirection, 5, 6);
            let end = snap_on_link(1, 0.8, TrafficFlowDirection::AlongDigitisedDirection, 5, 6);

            assert_eq!(
                resolve_visited_nodes(&start, &[], &end),
                VisitedNodes::OnSingleLink(VisitedNodesOnLink::Unidirectional {
                    from: node(5),
                    to: node(6),
                })
            );
        }

        #[test]
        fn one_way_link_against_snap_order_must_be_reentered() {
            let start = snap_on_link(1, 0.8, TrafficFlowDirection::AlongDigitisedDirection, 5, 6);
            let end = snap_on_link(1, 0.2, TrafficFlowDirection::AlongDigitisedDirection, 5, 6);

            let one_way = VisitedNodesOnLink::Unidirectional {
                from: node(5),
                to: node(6),
            };
            assert_eq!(
                resolve_visited_nodes(&start, &[], &end),
                VisitedNodes::OnMultipleLinks {
                    on_start_link: one_way.clone(),
                    via_node_ids: vec![],
                    on_end_link: one_way,
                }
            );
        }

        #[test]
        fn reverse_one_way_link_flips_the_node_order() {
            let start = snap_on_link(1, 0.8, TrafficFlowDirection::AgainstDigitisedDirection, 5, 6);
            let end = snap_on_link(1, 0.2, TrafficFlowDirection::AgainstDigitisedDirection, 5, 6);

            assert_eq!(
                resolve_visited_nodes(&start, &[], &end),
                VisitedNodes::OnSingleLink(VisitedNodesOnLink::Unidirectional {
                    from: node(6),
                    to: node(5),
                })
            );
        }

        #[test]
        fn fully_redundant_via_nodes_are_ignored() {
            let start = snap_on_link(1, 0.2, TrafficFlowDirection::Bidirectional, 5, 6);
            let end = snap_on_link(1, 0.8, TrafficFlowDirection::Bidirectional, 5, 6);

            // Via nodes repeating the snapped terminus nodes carry no information.
            assert_eq!(
                resolve_visited_nodes(&start, &[node(5), node(6)], &end),
                resolve_visited_nodes(&start, &[], &end)
            );
        }
    }

    mod multiple_links {
        use super::*;

        #[test]
        fn distinct_links_produce_visits_on_both_terminus_links() {
            let start = snap_on_link(1, 0.4, TrafficFlowDirection::Bidirectional, 5, 6);
            let end = snap_on_link(2, 0.4, TrafficFlowDirection::Bidirectional, 7, 8);

            assert_eq!(
                resolve_visited_nodes(&start, &[], &end),
                VisitedNodes::OnMultipleLinks {
                    on_start_link: VisitedNodesOnLink::Bidirectional {
                        first: node(5),
                        second: node(6),
                    },
                    via_node_ids: vec![],
                    on_end_link: VisitedNodesOnLink::Bidirectional {
                        first: node(7),
                        second: node(8),
                    },
                }
            );
        }

        #[test]
        fn terminus_link_collapses_when_via_continues_from_further_node() {
            // Snap closer to node 5; via list starts at the further node 6,
            // so the start link contributes only the snapped node.
            let start = snap_on_link(1, 0.4, TrafficFlowDirection::Bidirectional, 5, 6);
            let end = snap_on_link(2, 0.4, TrafficFlowDirection::Bidirectional, 7, 8);

            let result = resolve_visited_nodes(&start, &[node(6), node(9)], &end);

            match result {
                VisitedNodes::OnMultipleLinks { on_start_link, .. } => {
                    assert_eq!(on_start_link, VisitedNodesOnLink::SingleNode(node(5)));
                }
                other => panic!("expected OnMultipleLinks, got {other:?}"),
            }
        }

        #[test]
        fn end_link_collapses_when_via_arrives_from_further_node() {
            let start = snap_on_link(1, 0.4, TrafficFlowDirection::Bidirectional, 5, 6);
            // Snap closer to node 7; via list ends at the further node 8.
            let end = snap_on_link(2, 0.4, TrafficFlowDirection::Bidirectional, 7, 8);

            let result = resolve_visited_nodes(&start, &[node(9), node(8)], &end);

            match result {
                VisitedNodes::OnMultipleLinks { on_end_link, .. } => {
                    assert_eq!(on_end_link, VisitedNodesOnLink::SingleNode(node(7)));
                }
                other => panic!("expected OnMultipleLinks, got {other:?}"),
            }
        }

        #[test]
        fn one_way_start_link_keeps_full_traversal_when_direction_demands_it() {
            // One-way along digitised direction and the snap is closer to the
            // end node: the traversal necessarily ends at the snapped node,
            // so the full traversal is kept even though the via list
            // continues from the further node.
            let start = snap_on_link(1, 0.8, TrafficFlowDirection::AlongDigitisedDirection, 5, 6);
            let end = snap_on_link(2, 0.4, TrafficFlowDirection::Bidirectional, 7, 8);

            let result = resolve_visited_nodes(&start, &[node(5), node(9)], &end);

            match result {
                VisitedNodes::OnMultipleLinks { on_start_link, .. } => {
                    assert_eq!(
                        on_start_link,
                        VisitedNodesOnLink::Unidirectional {
                            from: node(5),
                            to: node(6),
                        }
                    );
                }
                other => panic!("expected OnMultipleLinks, got {other:?}"),
            }
        }

        #[test]
        fn snapped_endpoint_node_collapses_terminus_link() {
            let start = snap_on_link(1, 0.0, TrafficFlowDirection::Bidirectional, 5, 6);
            let end = snap_on_link(2, 1.0, TrafficFlowDirection::Bidirectional, 7, 8);

            assert_eq!(
                resolve_visited_nodes(&start, &[], &end),
                VisitedNodes::OnMultipleLinks {
                    on_start_link: VisitedNodesOnLink::SingleNode(node(5)),
                    via_node_ids: vec![],
                    on_end_link: VisitedNodesOnLink::SingleNode(node(8)),
                }
            );
        }
    }
}
