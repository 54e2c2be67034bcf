use crate::net::NodeId;

/// 数据传输进程的状态：`NotStarted → InProgress → {Completed | Cancelled}`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferState {
    NotStarted,
    InProgress,
    Completed,
    Cancelled,
}

/// 一次多帧数据传输
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub id: u64,
    pub dest: NodeId,
    /// 本次突发的帧数
    pub burst: u32,
    pub sent: u32,
    state: TransferState,
}

impl Transfer {
    pub fn new(id: u64, dest: NodeId, burst: u32) -> Self {
        Self {
            id,
            dest,
            burst,
            sent: 0,
            state: TransferState::NotStarted,
        }
    }

    pub fn state(&self) -> TransferState {
        self.state
    }

    pub fn is_in_progress(&self) -> bool {
        self.state == TransferState::InProgress
    }

    pub fn start(&mut self) -> bool {
        if self.state != TransferState::NotStarted {
            return false;
        }
        self.state = TransferState::InProgress;
        true
    }

    /// 记一帧已发出；发满 `burst` 帧即完成。返回是否刚刚完成。
    pub fn record_sent(&mut self) -> bool {
        if self.state != TransferState::InProgress {
            return false;
        }
        self.sent = self.sent.saturating_add(1);
        if self.sent >= self.burst {
            self.state = TransferState::Completed;
            return true;
        }
        false
    }

    pub fn cancel(&mut self) -> bool {
        if self.state != TransferState::InProgress {
            return false;
        }
        self.state = TransferState::Cancelled;
        true
    }
}
