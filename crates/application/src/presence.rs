//! 在线状态注册表
//!
//! userId 到可达连接句柄的单一映射。`set` 直接覆盖（最后的
//! 连接获胜，不做多设备扇出），断开时 `remove`。`get` 只用于
//! 尽力而为的寻址：目标不在线时推送被静默丢弃，从不排队重试。
//!
//! 注册表是显式注入的组件，由连接生命周期钩子持有，
//! 而不是进程级隐藏单例。

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use domain::UserId;

use crate::events::ServerEvent;

/// 推送失败
#[derive(Debug, Error)]
#[error("push failed: {message}")]
pub struct PushError {
    pub message: String,
}

impl PushError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// 出站事件的投递端点，由传输层实现（通常包一个发送通道）。
pub trait EventSink: Send + Sync {
    fn deliver(&self, event: ServerEvent) -> Result<(), PushError>;
}

/// 连接标识。同一用户重连后旧连接的断开回调不能误删新连接，
/// 因此移除时要求匹配。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct OnlineConnection {
    id: ConnectionId,
    sink: Arc<dyn EventSink>,
}

/// 在线状态注册表
#[derive(Default)]
pub struct PresenceRegistry {
    online: RwLock<HashMap<UserId, OnlineConnection>>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self {
            online: RwLock::new(HashMap::new()),
        }
    }

    /// 登记用户连接，覆盖旧条目（最后的连接获胜）。
    pub async fn set(&self, user: UserId, sink: Arc<dyn EventSink>) -> ConnectionId {
        let id = ConnectionId::generate();
        let mut online = self.online.write().await;
        online.insert(user, OnlineConnection { id, sink });
        tracing::debug!(user_id = %user, connection_id = %id, "用户上线");
        id
    }

    /// 移除连接。只有当前条目属于该连接时才移除，
    /// 过期连接的断开回调不会挤掉更新的连接。
    pub async fn remove(&self, user: UserId, connection: ConnectionId) -> bool {
        let mut online = self.online.write().await;
        match online.get(&user) {
            Some(entry) if entry.id == connection => {
                online.remove(&user);
                tracing::debug!(user_id = %user, connection_id = %connection, "用户下线");
                true
            }
            _ => false,
        }
    }

    /// 当前可达的连接句柄；不在线时返回 `None`。
    pub async fn get(&self, user: UserId) -> Option<Arc<dyn EventSink>> {
        let online = self.online.read().await;
        online.get(&user).map(|entry| entry.sink.clone())
    }

    pub async fn is_online(&self, user: UserId) -> bool {
        let online = self.online.read().await;
        online.contains_key(&user)
    }
}
