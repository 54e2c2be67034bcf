use crate::aodv::{RouteEntry, RoutingTable, SELF_SEQ};
use crate::net::NodeId;

#[test]
fn routing_table_starts_with_self_row() {
    let rt = RoutingTable::new(NodeId(3));
    assert_eq!(rt.len(), 1);
    assert_eq!(
        rt.get(NodeId(3)),
        Some(&RouteEntry {
            next: NodeId(3),
            seq: SELF_SEQ,
            hops: 0,
        })
    );
}

#[test]
fn routing_table_admits_unknown_newer_or_shorter() {
    let mut rt = RoutingTable::new(NodeId(0));

    assert!(rt.admit(NodeId(5), NodeId(1), 4, 3));
    // 更旧的序列号
    assert!(!rt.admit(NodeId(5), NodeId(2), 3, 1));
    // 相同序列号、跳数不更少
    assert!(!rt.admit(NodeId(5), NodeId(2), 4, 3));
    assert!(!rt.admit(NodeId(5), NodeId(2), 4, 4));
    assert_eq!(rt.get(NodeId(5)).map(|r| r.next), Some(NodeId(1)));

    // 相同序列号、跳数更少
    assert!(rt.admit(NodeId(5), NodeId(2), 4, 2));
    assert_eq!(
        rt.get(NodeId(5)),
        Some(&RouteEntry {
            next: NodeId(2),
            seq: 4,
            hops: 2,
        })
    );

    // 更新的序列号即使跳数更多也替换
    assert!(rt.admit(NodeId(5), NodeId(4), 6, 9));
    assert_eq!(rt.get(NodeId(5)).map(|r| (r.next, r.hops)), Some((NodeId(4), 9)));
}

#[test]
fn routing_table_admission_is_idempotent() {
    let mut once = RoutingTable::new(NodeId(0));
    once.admit(NodeId(7), NodeId(2), 11, 3);

    let mut twice = RoutingTable::new(NodeId(0));
    assert!(twice.admit(NodeId(7), NodeId(2), 11, 3));
    assert!(!twice.admit(NodeId(7), NodeId(2), 11, 3));

    assert_eq!(once.snapshot(), twice.snapshot());
}

#[test]
fn routing_table_never_replaces_or_removes_self_row() {
    let mut rt = RoutingTable::new(NodeId(2));
    assert!(!rt.admit(NodeId(2), NodeId(1), 1_000, 0));
    assert!(rt.remove(NodeId(2)).is_none());
    assert_eq!(rt.get(NodeId(2)).map(|r| r.seq), Some(SELF_SEQ));
}

#[test]
fn routing_table_remove_and_snapshot_are_sorted() {
    let mut rt = RoutingTable::new(NodeId(4));
    rt.admit(NodeId(9), NodeId(5), 1, 2);
    rt.admit(NodeId(1), NodeId(3), 1, 1);

    let dests: Vec<usize> = rt.snapshot().iter().map(|(d, _)| d.0).collect();
    assert_eq!(dests, vec![1, 4, 9]);

    assert_eq!(rt.remove(NodeId(9)).map(|r| r.next), Some(NodeId(5)));
    assert!(!rt.contains(NodeId(9)));
    assert!(rt.remove(NodeId(9)).is_none());
}

#[test]
fn routing_table_render_lists_every_row() {
    let mut rt = RoutingTable::new(NodeId(0));
    rt.admit(NodeId(6), NodeId(2), 21, 4);
    let text = rt.render();

    assert!(text.starts_with("Routing table of node 0"));
    assert!(text.contains("Dest"));
    let rows: Vec<&str> = text.lines().filter(|l| l.starts_with("| ") && !l.contains("Dest")).collect();
    assert_eq!(rows.len(), 2);
    assert!(rows[1].contains("21"));
}
