use crate::net::{NodeId, RoutingTable};

fn undirected(n: usize, edges: &[(usize, usize)]) -> Vec<Vec<NodeId>> {
    let mut adj = vec![Vec::new(); n];
    for &(a, b) in edges {
        adj[a].push(NodeId(b));
        adj[b].push(NodeId(a));
    }
    adj
}

#[test]
fn routing_table_builds_next_hops_for_shortest_paths() {
    // 0 - 1 - 2 - 3
    let adj = undirected(4, &[(0, 1), (1, 2), (2, 3)]);
    let mut rt = RoutingTable::new();
    assert!(!rt.is_built());
    rt.build(&adj);
    assert!(rt.is_built());

    assert_eq!(rt.next_hop(NodeId(0), NodeId(3)), Some(NodeId(1)));
    assert_eq!(rt.next_hop(NodeId(1), NodeId(3)), Some(NodeId(2)));
    assert_eq!(rt.next_hop(NodeId(3), NodeId(0)), Some(NodeId(2)));
    assert_eq!(rt.next_hop(NodeId(2), NodeId(3)), Some(NodeId(3)));
    assert_eq!(rt.next_hop(NodeId(0), NodeId(0)), None);
    assert_eq!(rt.len(), 12);
}

#[test]
fn routing_table_breaks_ties_by_lowest_node_id() {
    // Diamond:
    //   1
    // 0   3
    //   2
    let adj = undirected(4, &[(0, 2), (0, 1), (2, 3), (1, 3)]);
    let mut rt = RoutingTable::new();
    rt.build(&adj);

    assert_eq!(rt.next_hop(NodeId(0), NodeId(3)), Some(NodeId(1)));
    assert_eq!(rt.next_hop(NodeId(3), NodeId(0)), Some(NodeId(1)));
}

#[test]
fn routing_table_skips_unreachable_pairs() {
    let adj = undirected(3, &[(0, 1)]);
    let mut rt = RoutingTable::new();
    rt.build(&adj);

    assert_eq!(rt.next_hop(NodeId(0), NodeId(1)), Some(NodeId(1)));
    assert_eq!(rt.next_hop(NodeId(0), NodeId(2)), None);
    assert_eq!(rt.next_hop(NodeId(2), NodeId(0)), None);
    assert_eq!(rt.len(), 2);
}

#[test]
fn routing_table_mark_dirty_then_rebuild_picks_up_new_links() {
    let mut adj = undirected(3, &[(0, 1)]);
    let mut rt = RoutingTable::new();
    rt.build(&adj);
    assert_eq!(rt.next_hop(NodeId(0), NodeId(2)), None);

    adj[1].push(NodeId(2));
    adj[2].push(NodeId(1));
    rt.mark_dirty();
    assert!(!rt.is_built());
    rt.build(&adj);
    assert_eq!(rt.next_hop(NodeId(0), NodeId(2)), Some(NodeId(1)));
}
