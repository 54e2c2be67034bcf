use crate::aodv::{Transfer, TransferState};
use crate::net::NodeId;

#[test]
fn transfer_runs_to_completion() {
    let mut t = Transfer::new(0, NodeId(4), 3);
    assert_eq!(t.state(), TransferState::NotStarted);
    // 未开始时记录发送无效
    assert!(!t.record_sent());

    assert!(t.start());
    assert!(!t.start());
    assert!(!t.record_sent());
    assert!(!t.record_sent());
    assert!(t.record_sent());
    assert_eq!(t.state(), TransferState::Completed);
    assert_eq!(t.sent, 3);
    assert!(!t.cancel());
}

#[test]
fn transfer_cancel_only_from_in_progress() {
    let mut t = Transfer::new(1, NodeId(2), 5);
    assert!(!t.cancel());
    t.start();
    t.record_sent();
    assert!(t.cancel());
    assert_eq!(t.state(), TransferState::Cancelled);
    assert!(!t.record_sent());
    assert_eq!(t.sent, 1);
}
