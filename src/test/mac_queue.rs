use crate::mac::{QueueEntry, SendQueue};
use crate::net::NodeId;
use crate::sim::SimTime;

fn entry(length: u32, dest: usize) -> QueueEntry {
    QueueEntry {
        length,
        destination: NodeId(dest),
        not_before: SimTime::ZERO,
        payload: None,
    }
}

#[test]
fn send_queue_is_fifo_and_tracks_bytes() {
    let mut q = SendQueue::default();
    assert!(q.is_empty());
    q.push(entry(256, 1));
    q.push(entry(100, 2));
    q.push(entry(8, 1));

    assert_eq!(q.len(), 3);
    assert_eq!(q.bytes(), 364);
    assert_eq!(q.head().map(|e| e.destination), Some(NodeId(1)));

    let first = q.pop_head().expect("head");
    assert_eq!(first.length, 256);
    assert_eq!(q.head().map(|e| e.length), Some(100));
    assert_eq!(q.bytes(), 108);

    let dests: Vec<usize> = q.iter().map(|e| e.destination.0).collect();
    assert_eq!(dests, vec![2, 1]);
}
