use crate::aodv::{AodvConfig, AodvNode, TransferState};
use crate::mac::MacConfig;
use crate::net::{Frame, FrameKind, Node, NodeId, Position, RadioWorld, RouteKind, RouteMsg};
use crate::sim::{SimTime, Simulator};
use crate::topo::{LineOpts, build_line};

fn aodv(id: NodeId) -> Box<dyn Node> {
    Box::new(AodvNode::new(id, AodvConfig::default()))
}

fn chain(count: usize, seed: u64) -> (Simulator, RadioWorld) {
    let mut world = RadioWorld::with_seed(seed);
    let opts = LineOpts {
        count,
        origin: Position::new(0.0, 0.0),
        spacing: 100.0,
        tx_range: 100.0,
    };
    build_line(&mut world, &opts, aodv);
    (Simulator::default(), world)
}

#[test]
fn discovery_installs_forward_and_reverse_routes() {
    let (mut sim, mut world) = chain(4, 1);
    assert!(world.medium.send_to(NodeId(0), NodeId(3), &mut sim));
    sim.run_until(SimTime::from_secs(9), &mut world);

    let src = world.medium.router(NodeId(0)).expect("router 0");
    let row = src.table().get(NodeId(3)).expect("route to 3");
    assert_eq!(row.next, NodeId(1));
    assert_eq!(row.hops, 3);
    // 目的地回复时序列号加 10
    assert_eq!(row.seq, 11);
    assert_eq!(src.stats().routes_found, 1);

    let dst = world.medium.router(NodeId(3)).expect("router 3");
    let back = dst.table().get(NodeId(0)).expect("reverse route to 0");
    assert_eq!((back.next, back.hops, back.seq), (NodeId(2), 3, 1));

    let mid = world.medium.router(NodeId(2)).expect("router 2");
    assert_eq!(mid.table().get(NodeId(3)).map(|r| (r.next, r.hops)), Some((NodeId(3), 1)));
    assert_eq!(mid.table().get(NodeId(0)).map(|r| (r.next, r.hops)), Some((NodeId(1), 2)));
}

#[test]
fn rreq_flood_is_relayed_once_per_node() {
    let (mut sim, mut world) = chain(4, 2);
    world.medium.send_to(NodeId(0), NodeId(3), &mut sim);
    sim.run_until(SimTime::from_secs(9), &mut world);

    // 源节点 1 次 + 中间节点 n1、n2 各转播 1 次；目的地不转播
    assert_eq!(world.medium.stats.sent(FrameKind::Rreq), 3);
    assert_eq!(world.medium.stats.sent(FrameKind::Rrep), 3);
}

#[test]
fn data_transfer_follows_discovery() {
    let (mut sim, mut world) = chain(4, 3);
    world.medium.send_to(NodeId(0), NodeId(3), &mut sim);
    sim.run_until(SimTime::from_secs(40), &mut world);

    let src = world.medium.router(NodeId(0)).expect("router 0");
    let transfer = src.transfer().expect("transfer started");
    assert_eq!(transfer.state(), TransferState::Completed);
    assert!((4..=9).contains(&transfer.burst));
    assert_eq!(transfer.sent, transfer.burst);

    let dst = world.medium.router(NodeId(3)).expect("router 3");
    assert_eq!(dst.received().len(), transfer.burst as usize);
    assert!(dst.received().iter().all(|m| m.src == NodeId(0) && m.hops == 3));
    // 数据帧序列号逐帧递增
    let seqs: Vec<u32> = dst.received().iter().map(|m| m.seq).collect();
    assert!(seqs.windows(2).all(|w| w[1] == w[0] + 1));
}

#[test]
fn stale_rreq_is_dropped_without_rebroadcast() {
    let (mut sim, mut world) = chain(2, 4);
    let rreq = |seq: u32, hops: u32| RouteMsg {
        kind: RouteKind::Rreq,
        src: NodeId(0),
        seq,
        dest: NodeId(9),
        hops,
        length: 24,
    };

    world
        .medium
        .deliver(NodeId(1), NodeId(0), Frame::Route(rreq(5, 1)), &mut sim);
    sim.run_until(SimTime::from_secs(2), &mut world);
    assert_eq!(world.medium.stats.sent(FrameKind::Rreq), 1);

    let before = world.medium.router(NodeId(1)).expect("router 1").table().snapshot();

    // 旧序列号，以及相同序列号但跳数不更少的重复帧
    world
        .medium
        .deliver(NodeId(1), NodeId(0), Frame::Route(rreq(4, 1)), &mut sim);
    world
        .medium
        .deliver(NodeId(1), NodeId(0), Frame::Route(rreq(5, 1)), &mut sim);
    sim.run_until(SimTime::from_secs(4), &mut world);

    let node = world.medium.router(NodeId(1)).expect("router 1");
    assert_eq!(node.table().snapshot(), before);
    assert_eq!(node.stats().stale_dropped, 2);
    assert_eq!(world.medium.stats.sent(FrameKind::Rreq), 1);
}

#[test]
fn own_rreq_echo_never_overwrites_self_row() {
    let (mut sim, mut world) = chain(2, 5);
    world.medium.send_to(NodeId(0), NodeId(7), &mut sim);
    sim.run_until(SimTime::from_secs(3), &mut world);

    // n1 转播的 RREQ 回到源节点，被自身行拒绝
    let src = world.medium.router(NodeId(0)).expect("router 0");
    assert_eq!(src.table().len(), 1);
    assert_eq!(src.stats().stale_dropped, 1);
}

#[test]
fn send_to_self_is_ignored() {
    let (mut sim, mut world) = chain(2, 6);
    world.medium.send_to(NodeId(1), NodeId(1), &mut sim);
    sim.run_until(SimTime::from_secs(3), &mut world);
    assert_eq!(world.medium.stats.sent(FrameKind::Rreq), 0);
}

#[test]
fn discovery_and_data_work_over_macaw() {
    let mut world = RadioWorld::with_seed(8);
    let opts = LineOpts {
        count: 3,
        origin: Position::new(0.0, 0.0),
        spacing: 100.0,
        tx_range: 100.0,
    };
    build_line(&mut world, &opts, |id| -> Box<dyn Node> {
        Box::new(AodvNode::with_mac(id, AodvConfig::default(), MacConfig::default()))
    });
    let mut sim = Simulator::default();
    world.medium.send_to(NodeId(0), NodeId(2), &mut sim);
    sim.run_until(SimTime::from_secs(200), &mut world);

    let src = world.medium.router(NodeId(0)).expect("router 0");
    assert_eq!(src.table().get(NodeId(2)).map(|r| (r.next, r.hops)), Some((NodeId(1), 2)));
    // RREP 与 DATA 都走 MACAW 握手
    assert!(world.medium.stats.sent(FrameKind::Rts) >= 2);
    assert!(world.medium.stats.sent(FrameKind::Rrep) == 0);
    let dst = world.medium.router(NodeId(2)).expect("router 2");
    assert!(dst.stats().data_received >= 1);
}

#[test]
fn intermediate_reply_counts_as_rrep_sent() {
    let mut world = RadioWorld::with_seed(9);
    let opts = LineOpts {
        count: 5,
        origin: Position::new(0.0, 0.0),
        spacing: 100.0,
        tx_range: 100.0,
    };
    let cfg = AodvConfig {
        intermediate_reply: true,
        ..AodvConfig::default()
    };
    build_line(&mut world, &opts, |id| -> Box<dyn Node> { Box::new(AodvNode::new(id, cfg.clone())) });
    let mut sim = Simulator::default();
    world.medium.send_to(NodeId(1), NodeId(4), &mut sim);
    sim.run_until(SimTime::from_secs(40), &mut world);

    // n1 已知到 n4 的路由，代 n4 回复 n0 的 RREQ
    world.medium.send_to(NodeId(0), NodeId(4), &mut sim);
    sim.run_until(SimTime::from_secs(70), &mut world);

    let mid = world.medium.router(NodeId(1)).expect("router 1");
    assert_eq!(mid.stats().rrep_sent, 1);
    let dst = world.medium.router(NodeId(4)).expect("router 4");
    assert_eq!(dst.stats().rrep_sent, 1);

    let src = world.medium.router(NodeId(0)).expect("router 0");
    assert_eq!(src.table().get(NodeId(4)).map(|r| (r.next, r.hops)), Some((NodeId(1), 4)));
    assert_eq!(
        src.transfer().map(|t| t.state()),
        Some(TransferState::Completed)
    );
}
