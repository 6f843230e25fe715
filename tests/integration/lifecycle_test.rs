//! Integration tests for creating, joining, leaving and ending jams.

mod helpers;

use jamhub_core::error::ErrorKind;
use jamhub_service::{CreateJam, EndReason, JamEventKind, JoinJam};

use helpers::{id, join, public_jam, recorded_services, start_jam};

#[tokio::test]
async fn test_guest_leave_keeps_jam_and_host_leave_ends_it() {
    let (services, events) = recorded_services();
    let (host, alice, bob) = (id("host"), id("alice"), id("bob"));
    let code = start_jam(&services, &host).await;

    services.lifecycle.join(&alice, join(&code, "Alice")).await.unwrap();
    services.lifecycle.join(&bob, join(&code, "Bob")).await.unwrap();
    events.clear();

    services.lifecycle.leave(&bob, &code).await.unwrap();
    let jam = services.repository.get_active(&code).await.unwrap();
    assert_eq!(jam.members.len(), 2);
    assert!(!events.room(&code).contains(&bob));
    assert!(matches!(
        events.delivered_to(&alice).as_slice(),
        [JamEventKind::MembersChanged { members, .. }] if !members.contains_key(&bob)
    ));
    assert!(events.delivered_to(&bob).is_empty());

    events.clear();
    services.lifecycle.leave(&host, &code).await.unwrap();

    for who in [&host, &alice] {
        assert_eq!(
            events.delivered_to(who),
            vec![JamEventKind::SessionEnded {
                reason: EndReason::HostLeft
            }]
        );
    }
    let jam = services.repository.find(&code).await.unwrap().unwrap();
    assert!(!jam.is_active);
    assert!(jam.ended_at.is_some());

    let err = services
        .lifecycle
        .join(&bob, join(&code, "Bob"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_joining_another_jam_leaves_the_first() {
    let (services, events) = recorded_services();
    let (first_host, second_host, guest) = (id("first"), id("second"), id("guest"));
    let first = start_jam(&services, &first_host).await;
    let second = start_jam(&services, &second_host).await;

    services.lifecycle.join(&guest, join(&first, "Guest")).await.unwrap();
    services.lifecycle.join(&guest, join(&second, "Guest")).await.unwrap();

    let first_jam = services.repository.get_active(&first).await.unwrap();
    let second_jam = services.repository.get_active(&second).await.unwrap();
    assert!(!first_jam.is_member(&guest));
    assert!(second_jam.is_member(&guest));
    assert!(!events.room(&first).contains(&guest));
    assert!(events.room(&second).contains(&guest));
}

#[tokio::test]
async fn test_rejoin_refreshes_nickname_without_duplicate() {
    let (services, _events) = recorded_services();
    let (host, guest) = (id("host"), id("guest"));
    let code = start_jam(&services, &host).await;

    services.lifecycle.join(&guest, join(&code, "Guest1")).await.unwrap();
    let snapshot = services
        .lifecycle
        .join(&guest, join(&code, "Guest2"))
        .await
        .unwrap();

    assert_eq!(snapshot.members.len(), 2);
    assert_eq!(snapshot.members[&guest].nickname, "Guest2");
}

#[tokio::test]
async fn test_host_disconnect_ends_jam() {
    let (services, events) = recorded_services();
    let (host, guest) = (id("host"), id("guest"));
    let code = start_jam(&services, &host).await;
    services.lifecycle.join(&guest, join(&code, "Guest")).await.unwrap();
    events.clear();

    services.lifecycle.handle_disconnect(&host).await.unwrap();

    assert_eq!(
        events.delivered_to(&guest),
        vec![JamEventKind::SessionEnded {
            reason: EndReason::HostDisconnected
        }]
    );
    assert!(services.repository.get_active(&code).await.is_err());

    // A second disconnect for the same identity is a no-op.
    services.lifecycle.handle_disconnect(&host).await.unwrap();
}

#[tokio::test]
async fn test_only_host_can_end() {
    let (services, events) = recorded_services();
    let (host, guest) = (id("host"), id("guest"));
    let code = start_jam(&services, &host).await;
    services.lifecycle.join(&guest, join(&code, "Guest")).await.unwrap();

    let err = services.lifecycle.end(&guest, &code).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Forbidden);

    events.clear();
    services.lifecycle.end(&host, &code).await.unwrap();
    assert_eq!(
        events.delivered_to(&guest),
        vec![JamEventKind::SessionEnded {
            reason: EndReason::EndedByHost
        }]
    );
}

#[tokio::test]
async fn test_private_jam_password_and_join_requests() {
    let (services, events) = recorded_services();
    let (host, friend, stranger) = (id("host"), id("friend"), id("stranger"));
    let code = services
        .lifecycle
        .create(
            &host,
            CreateJam {
                is_private: true,
                password: Some("hunter2".to_string()),
                ..public_jam("Late Night", "Host")
            },
        )
        .await
        .unwrap()
        .jam
        .code;

    let err = services
        .lifecycle
        .join(&stranger, join(&code, "Stranger"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Forbidden);

    let snapshot = services
        .lifecycle
        .join(
            &friend,
            JoinJam {
                password: Some("hunter2".to_string()),
                ..join(&code, "Friend")
            },
        )
        .await
        .unwrap();
    assert!(snapshot.members.contains_key(&friend));

    services
        .join_requests
        .request_join(&stranger, &code, "Stranger")
        .await
        .unwrap();
    assert!(events.delivered_to(&host).iter().any(|kind| matches!(
        kind,
        JamEventKind::JoinRequested { requester, nickname }
            if requester == &stranger && nickname == "Stranger"
    )));

    let pending = services.join_requests.list(&host, &code).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].requester, stranger);

    services
        .join_requests
        .approve(&host, &code, &stranger)
        .await
        .unwrap();
    let jam = services.repository.get_active(&code).await.unwrap();
    assert!(jam.is_member(&stranger));
    assert!(jam.join_requests.is_empty());
    assert!(matches!(
        events.delivered_to(&stranger).as_slice(),
        [JamEventKind::JoinSucceeded { .. }]
    ));
}

#[tokio::test]
async fn test_public_directory_lists_active_public_jams() {
    let (services, _events) = recorded_services();
    let (host, other, viewer) = (id("host"), id("other"), id("viewer"));
    let open = start_jam(&services, &host).await;
    let closed = start_jam(&services, &other).await;
    services.lifecycle.end(&other, &closed).await.unwrap();

    let listed = services.directory.list_public(Some(&viewer)).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].code, open);
    assert_eq!(listed[0].member_count, 1);

    let own = services.directory.list_public(Some(&host)).await.unwrap();
    assert!(own.is_empty());
}
