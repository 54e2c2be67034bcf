use crate::mac::{MacConfig, MacawNode};
use crate::net::{Node, NodeId, RadioWorld};
use crate::topo::{GridOpts, LineOpts, StarOpts, build_grid, build_line, build_star};

fn macaw(id: NodeId) -> Box<dyn Node> {
    Box::new(MacawNode::new(id, MacConfig::default()))
}

#[test]
fn line_only_links_adjacent_nodes() {
    let mut world = RadioWorld::default();
    let nodes = build_line(&mut world, &LineOpts::default(), macaw);
    assert_eq!(nodes, vec![NodeId(0), NodeId(1), NodeId(2), NodeId(3)]);

    assert_eq!(world.medium.neighbors_of(NodeId(0)), vec![NodeId(1)]);
    assert_eq!(world.medium.neighbors_of(NodeId(1)), vec![NodeId(0), NodeId(2)]);
    assert_eq!(world.medium.neighbors_of(NodeId(3)), vec![NodeId(2)]);
}

#[test]
fn star_hub_reaches_every_leaf() {
    let mut world = RadioWorld::default();
    let opts = StarOpts {
        leaves: 5,
        ..StarOpts::default()
    };
    let topo = build_star(&mut world, &opts, macaw);
    assert_eq!(topo.hub, NodeId(0));
    assert_eq!(topo.leaves.len(), 5);
    for leaf in &topo.leaves {
        assert!(world.medium.is_neighbor(topo.hub, *leaf));
        assert!(world.medium.is_neighbor(*leaf, topo.hub));
    }
}

#[test]
fn grid_is_column_major_and_jitter_is_bounded() {
    let mut world = RadioWorld::with_seed(4);
    let opts = GridOpts::default();
    let topo = build_grid(&mut world, &opts, macaw);
    assert_eq!(topo.nodes.len(), 49);
    assert_eq!(topo.node(0, 1), NodeId(1));
    assert_eq!(topo.node(1, 0), NodeId(7));
    assert_eq!(topo.last(), Some(NodeId(48)));

    for col in 0..opts.cols {
        for row in 0..opts.rows {
            let pos = world.medium.position(topo.node(col, row)).expect("position");
            let x0 = opts.origin.x + opts.spacing * col as f64;
            let y0 = opts.origin.y + opts.spacing * row as f64;
            assert!((pos.x - x0).abs() <= opts.jitter);
            assert!((pos.y - y0).abs() <= opts.jitter);
        }
    }
}

#[test]
fn grid_without_jitter_links_orthogonal_neighbors() {
    let mut world = RadioWorld::default();
    let opts = GridOpts {
        cols: 3,
        rows: 3,
        jitter: 0.0,
        ..GridOpts::default()
    };
    let topo = build_grid(&mut world, &opts, macaw);
    // 中心节点：上下左右四个邻居，对角线超出半径
    let center = topo.node(1, 1);
    let expected = vec![topo.node(0, 1), topo.node(1, 0), topo.node(1, 2), topo.node(2, 1)];
    assert_eq!(world.medium.neighbors_of(center), expected);
}
