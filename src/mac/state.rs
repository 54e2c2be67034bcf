use serde::{Deserialize, Serialize};

/// MACAW 状态寄存器：任意时刻每个节点只有一个状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MacState {
    #[default]
    Idle,
    /// 已回复 CTS，等待 DS/DATA
    RtsReceived,
    /// 已发 RTS 等待 CTS，或因他人握手而静默
    Wait,
    /// 握手发起方，传输中
    Sending,
    /// 正在接收 DATA
    Receiving,
    /// 未得到 CTS，随机退避中
    Backoff,
}
