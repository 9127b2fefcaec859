//! 内存存储契约测试
//!
//! 验证存储层承诺的隔离语义：同方向 PENDING 的唯一性、交叉
//! 请求的原子翻转、无序对上的会话去重，以及批量已读与级联
//! 删除的行为。

use chrono::{Duration, Utc};
use uuid::Uuid;

use domain::{
    BlockedPair, BlockedPairRepository, Conversation, ConversationRepository, DeliveryStatus,
    FriendRequestRepository, Message, MessageDraft, MessageRepository, PendingInsert,
    RepositoryError, UserId, UserPair,
};
use infrastructure::{
    MemoryBlockedPairStore, MemoryConversationStore, MemoryFriendRequestStore, MemoryMessageStore,
};

fn user() -> UserId {
    UserId::from(Uuid::new_v4())
}

#[tokio::test]
async fn same_direction_pending_is_unique() {
    let store = MemoryFriendRequestStore::new();
    let (alice, bob) = (user(), user());

    let inserted = store.create_pending(alice, bob, Utc::now()).await.unwrap();
    assert!(matches!(inserted, PendingInsert::Created(_)));

    let err = store.create_pending(alice, bob, Utc::now()).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict { .. }));
}

#[tokio::test]
async fn crossing_insert_flips_both_rows_atomically() {
    let store = MemoryFriendRequestStore::new();
    let (alice, bob) = (user(), user());

    let first = match store.create_pending(alice, bob, Utc::now()).await.unwrap() {
        PendingInsert::Created(request) => request,
        other => panic!("unexpected insert: {other:?}"),
    };

    let (request, reverse) = match store.create_pending(bob, alice, Utc::now()).await.unwrap() {
        PendingInsert::AutoAccepted { request, reverse } => (request, reverse),
        other => panic!("unexpected insert: {other:?}"),
    };
    assert!(request.is_accepted());
    assert!(reverse.is_accepted());
    assert_eq!(reverse.id, first.id);

    // 存储里两条记录都已是 ACCEPTED，方向上不再有 PENDING
    let pair = UserPair::new(alice, bob).unwrap();
    assert!(store.find_accepted_between(pair).await.unwrap().is_some());
    assert_eq!(store.count_pending_for_receiver(alice).await.unwrap(), 0);
    assert_eq!(store.count_pending_for_receiver(bob).await.unwrap(), 0);

    // 删除该对上的 ACCEPTED 记录会把两条一起清掉
    assert!(store.delete_accepted_between(pair).await.unwrap());
    assert!(store.find_accepted_between(pair).await.unwrap().is_none());
    assert!(store.list_accepted_touching(alice).await.unwrap().is_empty());
}

#[tokio::test]
async fn conversation_is_deduplicated_per_pair() {
    let store = MemoryConversationStore::new();
    let (alice, bob) = (user(), user());
    let pair = UserPair::new(alice, bob).unwrap();

    let (first, created) = store.find_or_create(pair, Utc::now()).await.unwrap();
    assert!(created);
    let (second, created) = store.find_or_create(pair, Utc::now()).await.unwrap();
    assert!(!created);
    assert_eq!(first.id, second.id);

    // 反序的对命中同一条记录
    let reversed = UserPair::new(bob, alice).unwrap();
    assert_eq!(
        store.find_by_pair(reversed).await.unwrap().unwrap().id,
        first.id
    );

    store.delete(first.id).await.unwrap();
    assert!(store.find_by_id(first.id).await.unwrap().is_none());
    assert!(store.find_by_pair(pair).await.unwrap().is_none());
    assert!(store.list_by_user(alice).await.unwrap().is_empty());
}

#[tokio::test]
async fn message_window_filters_then_paginates() {
    let store = MemoryMessageStore::new();
    let conversation = Conversation::new(UserPair::new(user(), user()).unwrap(), Utc::now());
    let (alice, bob) = (conversation.pair.lower(), conversation.pair.upper());
    let now = Utc::now();

    let mut ids = Vec::new();
    for i in 0..5 {
        let message = Message::new(
            conversation.id,
            alice,
            format!("m{i}"),
            MessageDraft::default(),
            now,
        )
        .unwrap();
        ids.push(store.create(message).await.unwrap().id);
    }
    // 第三条过期，第四条被 bob 隐藏
    let mut expired = store.find_by_id(ids[2]).await.unwrap().unwrap();
    expired.expires_at = Some(now - Duration::seconds(1));
    store.update(expired).await.unwrap();
    let mut hidden = store.find_by_id(ids[3]).await.unwrap().unwrap();
    hidden.hide_for(bob);
    store.update(hidden).await.unwrap();

    // 可见集合是 m0, m1, m4；窗口从最新端取，最旧在前返回
    let page = store.list_visible(conversation.id, bob, now, 2, 0).await.unwrap();
    assert_eq!(page.iter().map(|m| m.id).collect::<Vec<_>>(), vec![ids[1], ids[4]]);
    let page = store.list_visible(conversation.id, bob, now, 2, 2).await.unwrap();
    assert_eq!(page.iter().map(|m| m.id).collect::<Vec<_>>(), vec![ids[0]]);

    let last = store.last_visible(conversation.id, bob, now).await.unwrap();
    assert_eq!(last.unwrap().id, ids[4]);
}

#[tokio::test]
async fn unread_count_skips_expired_and_hidden() {
    let store = MemoryMessageStore::new();
    let conversation = Conversation::new(UserPair::new(user(), user()).unwrap(), Utc::now());
    let (alice, bob) = (conversation.pair.lower(), conversation.pair.upper());
    let now = Utc::now();

    let mut ids = Vec::new();
    for i in 0..3 {
        let message = Message::new(
            conversation.id,
            alice,
            format!("m{i}"),
            MessageDraft::default(),
            now,
        )
        .unwrap();
        ids.push(store.create(message).await.unwrap().id);
    }
    assert_eq!(store.count_unread_for(conversation.id, bob, now).await.unwrap(), 3);

    // 过期与被 bob 隐藏的消息都不计入未读
    let mut expired = store.find_by_id(ids[0]).await.unwrap().unwrap();
    expired.expires_at = Some(now - Duration::seconds(1));
    store.update(expired).await.unwrap();
    let mut hidden = store.find_by_id(ids[1]).await.unwrap().unwrap();
    hidden.hide_for(bob);
    store.update(hidden).await.unwrap();

    assert_eq!(store.count_unread_for(conversation.id, bob, now).await.unwrap(), 1);
    // 对发送者自己始终为 0
    assert_eq!(store.count_unread_for(conversation.id, alice, now).await.unwrap(), 0);
}

#[tokio::test]
async fn bulk_read_and_monotonic_status() {
    let store = MemoryMessageStore::new();
    let conversation = Conversation::new(UserPair::new(user(), user()).unwrap(), Utc::now());
    let (alice, bob) = (conversation.pair.lower(), conversation.pair.upper());
    let now = Utc::now();

    let mut from_alice = Vec::new();
    for i in 0..3 {
        let message = Message::new(
            conversation.id,
            alice,
            format!("a{i}"),
            MessageDraft::default(),
            now,
        )
        .unwrap();
        from_alice.push(store.create(message).await.unwrap().id);
    }
    let from_bob = store
        .create(
            Message::new(conversation.id, bob, "b0", MessageDraft::default(), now).unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(store.count_unread_for(conversation.id, bob, now).await.unwrap(), 3);
    assert_eq!(store.count_unread_for(conversation.id, alice, now).await.unwrap(), 1);

    // 批量置读只影响指定发送者的消息
    let updated = store
        .mark_read_from_sender(conversation.id, alice)
        .await
        .unwrap();
    assert_eq!(updated, 3);
    assert_eq!(store.count_unread_for(conversation.id, bob, now).await.unwrap(), 0);
    assert_eq!(store.count_unread_for(conversation.id, alice, now).await.unwrap(), 1);

    // 迟到的投递确认不回退 READ
    let message = store
        .update_status(from_alice[0], DeliveryStatus::Delivered)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(message.delivery_status, DeliveryStatus::Read);

    // 不存在的消息返回 None 而不是错误
    assert!(store
        .update_status(domain::MessageId::from(Uuid::new_v4()), DeliveryStatus::Read)
        .await
        .unwrap()
        .is_none());

    let deleted = store.delete_by_conversation(conversation.id).await.unwrap();
    assert_eq!(deleted, 4);
    assert!(store.find_by_id(from_bob.id).await.unwrap().is_none());
}

#[tokio::test]
async fn blocked_pairs_are_directional_and_idempotent() {
    let store = MemoryBlockedPairStore::new();
    let (alice, bob) = (user(), user());

    let first = store
        .insert(BlockedPair::new(alice, bob, Utc::now()))
        .await
        .unwrap();
    // 重复插入返回现有记录
    let second = store
        .insert(BlockedPair::new(alice, bob, Utc::now()))
        .await
        .unwrap();
    assert_eq!(first.created_at, second.created_at);

    assert!(store.is_blocked(alice, bob).await.unwrap());
    assert!(!store.is_blocked(bob, alice).await.unwrap());
    assert_eq!(store.list_blocked_by(alice).await.unwrap(), vec![bob]);
    assert_eq!(store.list_blockers_of(bob).await.unwrap(), vec![alice]);

    assert!(store.remove(alice, bob).await.unwrap());
    assert!(!store.remove(alice, bob).await.unwrap());
    assert!(!store.is_blocked(alice, bob).await.unwrap());
}
