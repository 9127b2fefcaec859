//! 协调器端到端流程测试
//!
//! 入站事件驱动的完整场景：关键变更与尽力推送的分段行为、
//! 单个坏连接的隔离、以及"解除好友后重新发起请求"的回归场景。

mod support;

use application::{ClientEvent, ServerEvent};
use domain::{ConversationRepository, FriendRequestStatus};
use support::{build_app, create_user, FailingSink, RecordingSink};

use std::sync::Arc;

#[tokio::test]
async fn friend_request_flow_notifies_both_sides() {
    let app = build_app();
    let alice = create_user(&app, "alice", "1001").await;
    let bob = create_user(&app, "bob", "1002").await;

    let alice_sink = RecordingSink::new();
    let bob_sink = RecordingSink::new();
    app.orchestrator.register_connection(alice, alice_sink.clone()).await;
    app.orchestrator.register_connection(bob, bob_sink.clone()).await;

    app.orchestrator
        .handle(alice, ClientEvent::SendFriendRequest { recipient_id: bob })
        .await
        .unwrap();

    let alice_events = alice_sink.take();
    assert!(matches!(
        alice_events.as_slice(),
        [ServerEvent::FriendRequestSent(view)] if view.status == FriendRequestStatus::Pending
    ));
    let bob_events = bob_sink.take();
    assert!(bob_events
        .iter()
        .any(|e| matches!(e, ServerEvent::NewFriendRequest(_))));
    assert!(bob_events
        .iter()
        .any(|e| matches!(e, ServerEvent::PendingRequestsCount { count: 1 })));

    // 接收方接受：双方都收到接受通知和打开会话指令
    let pending = app.friendship.pending_requests(bob).await.unwrap();
    app.orchestrator
        .handle(
            bob,
            ClientEvent::AcceptFriendRequest {
                request_id: pending[0].id,
            },
        )
        .await
        .unwrap();

    for events in [alice_sink.take(), bob_sink.take()] {
        assert!(events
            .iter()
            .any(|e| matches!(e, ServerEvent::FriendRequestAccepted(_))));
        assert!(events
            .iter()
            .any(|e| matches!(e, ServerEvent::OpenConversation { .. })));
        assert!(events
            .iter()
            .any(|e| matches!(e, ServerEvent::FriendsList(friends) if friends.len() == 1)));
    }
}

#[tokio::test]
async fn resend_after_unfriend_and_conversation_delete() {
    let app = build_app();
    let alice = create_user(&app, "alice", "1001").await;
    let bob = create_user(&app, "bob", "1002").await;

    let request = app.friendship.send_request(alice, bob).await.unwrap();
    app.friendship.accept_request(request.id, bob).await.unwrap();
    let conversation = app.conversations.find_or_create(alice, bob).await.unwrap();

    // 一方删除会话，随后解除好友
    app.orchestrator
        .handle(
            alice,
            ClientEvent::DeleteConversation {
                conversation_id: conversation.id,
            },
        )
        .await
        .unwrap();
    app.orchestrator
        .handle(alice, ClientEvent::Unfriend { user_id: bob })
        .await
        .unwrap();

    assert!(!app.friendship.are_friends(alice, bob).await.unwrap());
    assert!(app
        .conversations
        .find_by_users(alice, bob)
        .await
        .unwrap()
        .is_none());

    // 残留状态不能挡住新请求
    app.orchestrator
        .handle(bob, ClientEvent::SendFriendRequest { recipient_id: alice })
        .await
        .unwrap();
    let pending = app.friendship.pending_requests(alice).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].sender_id, bob);
    assert_eq!(pending[0].status, FriendRequestStatus::Pending);
}

#[tokio::test]
async fn unfriend_is_idempotent_and_still_tears_down() {
    let app = build_app();
    let alice = create_user(&app, "alice", "1001").await;
    let bob = create_user(&app, "bob", "1002").await;

    let alice_sink = RecordingSink::new();
    let bob_sink = RecordingSink::new();
    app.orchestrator.register_connection(alice, alice_sink.clone()).await;
    app.orchestrator.register_connection(bob, bob_sink.clone()).await;

    // 没有好友记录但残留着会话：解除好友照常成功并完成清理
    let conversation = app.conversations.find_or_create(alice, bob).await.unwrap();
    app.orchestrator
        .handle(alice, ClientEvent::Unfriend { user_id: bob })
        .await
        .unwrap();

    assert!(app
        .conversations
        .find_by_users(alice, bob)
        .await
        .unwrap()
        .is_none());
    assert!(app
        .stores
        .conversations
        .find_by_id(conversation.id)
        .await
        .unwrap()
        .is_none());

    // 双方仍收到 unfriended 通知，终态一致
    assert!(alice_sink
        .take()
        .iter()
        .any(|e| matches!(e, ServerEvent::Unfriended { user_id } if *user_id == bob)));
    assert!(bob_sink
        .take()
        .iter()
        .any(|e| matches!(e, ServerEvent::Unfriended { user_id } if *user_id == alice)));

    // 重复解除同样成功
    app.orchestrator
        .handle(alice, ClientEvent::Unfriend { user_id: bob })
        .await
        .unwrap();
}

#[tokio::test]
async fn failing_sink_does_not_fail_event_or_suppress_siblings() {
    let app = build_app();
    let alice = create_user(&app, "alice", "1001").await;
    let bob = create_user(&app, "bob", "1002").await;

    // 调用方的连接已经坏掉，接收方正常
    app.orchestrator
        .register_connection(alice, Arc::new(FailingSink))
        .await;
    let bob_sink = RecordingSink::new();
    app.orchestrator.register_connection(bob, bob_sink.clone()).await;

    let result = app
        .orchestrator
        .handle(alice, ClientEvent::SendFriendRequest { recipient_id: bob })
        .await;

    // 关键变更已提交，推送失败不反映为事件失败
    assert!(result.is_ok());
    assert_eq!(app.friendship.pending_count(bob).await.unwrap(), 1);

    // 兄弟推送不受坏连接影响
    let bob_events = bob_sink.take();
    assert!(bob_events
        .iter()
        .any(|e| matches!(e, ServerEvent::NewFriendRequest(_))));
}

#[tokio::test]
async fn offline_recipient_drops_push_silently() {
    let app = build_app();
    let alice = create_user(&app, "alice", "1001").await;
    let bob = create_user(&app, "bob", "1002").await;

    let alice_sink = RecordingSink::new();
    app.orchestrator.register_connection(alice, alice_sink.clone()).await;
    // bob 不在线

    app.orchestrator
        .handle(alice, ClientEvent::SendFriendRequest { recipient_id: bob })
        .await
        .unwrap();

    // 请求照常落库，上线后通过 getFriendRequests 拉取
    assert_eq!(app.friendship.pending_count(bob).await.unwrap(), 1);

    let bob_sink = RecordingSink::new();
    app.orchestrator.register_connection(bob, bob_sink.clone()).await;
    app.orchestrator
        .handle(bob, ClientEvent::GetFriendRequests)
        .await
        .unwrap();
    let events = bob_sink.take();
    assert!(events
        .iter()
        .any(|e| matches!(e, ServerEvent::FriendRequestsList(list) if list.len() == 1)));
    assert!(events
        .iter()
        .any(|e| matches!(e, ServerEvent::PendingRequestsCount { count: 1 })));
}

#[tokio::test]
async fn dispatch_maps_failure_to_error_event_for_caller() {
    let app = build_app();
    let alice = create_user(&app, "alice", "1001").await;

    let alice_sink = RecordingSink::new();
    app.orchestrator.register_connection(alice, alice_sink.clone()).await;

    app.orchestrator
        .dispatch(alice, ClientEvent::SendFriendRequest { recipient_id: alice })
        .await;

    let events = alice_sink.take();
    assert!(matches!(
        events.as_slice(),
        [ServerEvent::Error { message }] if message == "Cannot send friend request to yourself"
    ));
}

#[tokio::test]
async fn message_flow_reaches_online_recipient() {
    let app = build_app();
    let alice = create_user(&app, "alice", "1001").await;
    let bob = create_user(&app, "bob", "1002").await;

    let request = app.friendship.send_request(alice, bob).await.unwrap();
    app.friendship.accept_request(request.id, bob).await.unwrap();

    let alice_sink = RecordingSink::new();
    let bob_sink = RecordingSink::new();
    app.orchestrator.register_connection(alice, alice_sink.clone()).await;
    app.orchestrator.register_connection(bob, bob_sink.clone()).await;

    app.orchestrator
        .handle(
            alice,
            ClientEvent::SendMessage {
                recipient_id: bob,
                content: "hello".into(),
                message_type: Default::default(),
                expires_in_secs: None,
                media_url: None,
                media_duration_secs: None,
                reply_to_message_id: None,
            },
        )
        .await
        .unwrap();

    let sent = alice_sink.take();
    let [ServerEvent::MessageSent(view)] = sent.as_slice() else {
        panic!("unexpected events: {sent:?}");
    };
    assert_eq!(view.content, "hello");

    let received = bob_sink.take();
    assert!(matches!(
        received.as_slice(),
        [ServerEvent::NewMessage(view)] if view.content == "hello"
    ));

    // 接收方确认投递：发送方收到状态推进
    app.orchestrator
        .handle(bob, ClientEvent::MessageDelivered { message_id: view.id })
        .await
        .unwrap();
    let acks = alice_sink.take();
    assert!(matches!(
        acks.as_slice(),
        [ServerEvent::MessageDelivered { message_id, .. }] if *message_id == view.id
    ));
}
