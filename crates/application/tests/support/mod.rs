//! 集成测试公共装配

use std::sync::{Arc, Mutex};

use chrono::Utc;

use application::{
    BlockService, ChatOrchestrator, ConversationService, EventSink, FriendshipService,
    MessageService, PresenceRegistry, PushError, ServerEvent,
};
use config::AppConfig;
use domain::{User, UserId};
use infrastructure::MemoryStores;

/// 记录收到的全部事件，测试随后断言。
pub struct RecordingSink {
    events: Mutex<Vec<ServerEvent>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(Vec::new()),
        })
    }

    pub fn take(&self) -> Vec<ServerEvent> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }
}

impl EventSink for RecordingSink {
    fn deliver(&self, event: ServerEvent) -> Result<(), PushError> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

/// 永远投递失败的连接，模拟断掉的传输通道。
pub struct FailingSink;

impl EventSink for FailingSink {
    fn deliver(&self, _event: ServerEvent) -> Result<(), PushError> {
        Err(PushError::new("transport gone"))
    }
}

/// 完整装配好的应用图
pub struct TestApp {
    pub stores: MemoryStores,
    pub friendship: Arc<FriendshipService>,
    pub blocks: Arc<BlockService>,
    pub conversations: Arc<ConversationService>,
    pub messages: Arc<MessageService>,
    pub presence: Arc<PresenceRegistry>,
    pub orchestrator: Arc<ChatOrchestrator>,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn build_app() -> TestApp {
    init_tracing();
    let stores = MemoryStores::new();
    let friendship = Arc::new(FriendshipService::new(
        stores.requests.clone(),
        stores.blocks.clone(),
        stores.users.clone(),
    ));
    let blocks = Arc::new(BlockService::new(stores.blocks.clone(), friendship.clone()));
    let conversations = Arc::new(ConversationService::new(
        stores.conversations.clone(),
        stores.messages.clone(),
        stores.users.clone(),
    ));
    let messages = Arc::new(MessageService::new(
        stores.messages.clone(),
        conversations.clone(),
        friendship.clone(),
        blocks.clone(),
        AppConfig::from_env(),
    ));
    let presence = Arc::new(PresenceRegistry::new());
    let orchestrator = Arc::new(ChatOrchestrator::new(
        stores.users.clone(),
        friendship.clone(),
        conversations.clone(),
        messages.clone(),
        blocks.clone(),
        presence.clone(),
    ));
    TestApp {
        stores,
        friendship,
        blocks,
        conversations,
        messages,
        presence,
        orchestrator,
    }
}

pub async fn create_user(app: &TestApp, username: &str, tag: &str) -> UserId {
    let user = User::new(username, tag, Utc::now()).unwrap();
    app.stores.users.create(user.clone()).await.unwrap();
    user.id
}
