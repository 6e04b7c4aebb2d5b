mod common;

use chrono::{Duration, Utc};
use sea_orm::{ConnectionTrait, Statement};

use engine::{
    ChangeRequestFilter, ChangeRequestKind, ChangeRequestStatus, Engine, EngineError,
    ResolveAction, TransactionChanges, TransactionListFilter, TransactionStatus,
};

use common::{Fixture, db_with_users, fixture_on, rent_of, team_fixture};

/// Every non-approved transaction has exactly one pending request and every
/// approved one has none.
async fn assert_status_invariant(f: &Fixture) {
    let txs = f
        .engine
        .list_transactions(&f.owner, &TransactionListFilter::default())
        .await
        .unwrap();
    let pending = f
        .engine
        .list_change_requests(
            &f.owner,
            &ChangeRequestFilter::default().status(ChangeRequestStatus::Pending),
        )
        .await
        .unwrap();
    for tx in txs {
        let count = pending
            .iter()
            .filter(|r| r.target_transaction_id == tx.id)
            .count();
        if tx.status == TransactionStatus::Approved {
            assert_eq!(count, 0, "approved {} has pending requests", tx.id);
        } else {
            assert_eq!(count, 1, "{} is {:?}", tx.id, tx.status);
            let request = pending
                .iter()
                .find(|r| r.target_transaction_id == tx.id)
                .unwrap();
            assert_eq!(request.kind.pending_status(), tx.status);
        }
    }
}

#[tokio::test]
async fn approved_edit_applies_proposed_amount() {
    let f = team_fixture().await;
    let x = rent_of(&f.engine, &f.member).await;

    let r = f
        .engine
        .request_edit_others(
            &f.admin,
            x.id,
            TransactionChanges::new().amount_minor(500_000),
            "wrong amount",
        )
        .await
        .unwrap();
    assert_eq!(r.kind, ChangeRequestKind::Edit);
    assert_eq!(r.status, ChangeRequestStatus::Pending);
    assert_eq!(r.requester_id, "adam");
    assert_eq!(r.target_owner_id, "mario");
    assert_eq!(
        f.engine.transaction(&f.member, x.id).await.unwrap().status,
        TransactionStatus::EditRequested
    );
    assert_status_invariant(&f).await;

    let resolution = f
        .engine
        .confirm_change(&f.member, r.id, ResolveAction::Approve)
        .await
        .unwrap();
    assert!(!resolution.deleted);
    assert_eq!(resolution.request.status, ChangeRequestStatus::Approved);
    assert_eq!(resolution.request.resolved_by.as_deref(), Some("mario"));
    let tx = resolution.transaction.unwrap();
    assert_eq!(tx.amount_minor, 500_000);
    assert_eq!(tx.status, TransactionStatus::Approved);

    let x = f.engine.transaction(&f.member, x.id).await.unwrap();
    assert_eq!(x.amount_minor, 500_000);
    assert_eq!(x.status, TransactionStatus::Approved);
    let r = f.engine.change_request(&f.member, r.id).await.unwrap();
    assert_eq!(r.status, ChangeRequestStatus::Approved);
    assert!(r.resolved_at.is_some());
    assert_status_invariant(&f).await;
}

#[tokio::test]
async fn rejected_edit_leaves_transaction_untouched() {
    let f = team_fixture().await;
    let x = rent_of(&f.engine, &f.member).await;
    let r = f
        .engine
        .request_edit_others(
            &f.admin,
            x.id,
            TransactionChanges::new().amount_minor(500_000),
            "wrong amount",
        )
        .await
        .unwrap();

    let resolution = f
        .engine
        .confirm_change(&f.member, r.id, ResolveAction::Reject)
        .await
        .unwrap();
    assert_eq!(resolution.request.status, ChangeRequestStatus::Rejected);

    let x_after = f.engine.transaction(&f.member, x.id).await.unwrap();
    assert_eq!(x_after.amount_minor, 300_000);
    assert_eq!(x_after.status, TransactionStatus::Approved);
    assert_eq!(x_after.updated_at, x.updated_at);
    assert_status_invariant(&f).await;
}

#[tokio::test]
async fn approved_delete_removes_transaction_and_keeps_request() {
    let f = team_fixture().await;
    let x = rent_of(&f.engine, &f.member).await;
    let r = f
        .engine
        .request_delete_others(&f.deputy, x.id, "duplicate entry")
        .await
        .unwrap();
    assert_eq!(r.kind, ChangeRequestKind::Delete);
    assert_eq!(r.proposed_changes, None);
    assert_eq!(
        f.engine.transaction(&f.member, x.id).await.unwrap().status,
        TransactionStatus::DeleteRequested
    );

    let resolution = f
        .engine
        .confirm_change(&f.member, r.id, ResolveAction::Approve)
        .await
        .unwrap();
    assert!(resolution.deleted);
    assert!(resolution.transaction.is_none());

    let err = f.engine.transaction(&f.member, x.id).await.unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
    let r = f.engine.change_request(&f.member, r.id).await.unwrap();
    assert_eq!(r.status, ChangeRequestStatus::Approved);

    let incoming = f
        .engine
        .list_change_requests(&f.member, &ChangeRequestFilter::incoming())
        .await
        .unwrap();
    assert_eq!(incoming.len(), 1);
}

#[tokio::test]
async fn only_the_transaction_owner_resolves() {
    let f = team_fixture().await;
    let x = rent_of(&f.engine, &f.member).await;
    let r = f
        .engine
        .request_delete_others(&f.deputy, x.id, "duplicate entry")
        .await
        .unwrap();

    for actor in [&f.owner, &f.admin, &f.deputy] {
        for action in [ResolveAction::Approve, ResolveAction::Reject] {
            let err = f.engine.confirm_change(actor, r.id, action).await.unwrap_err();
            assert!(matches!(err, EngineError::Forbidden(_)), "{}", actor.user_id);
        }
    }
    let r = f.engine.change_request(&f.member, r.id).await.unwrap();
    assert!(r.is_pending());
    assert_status_invariant(&f).await;
}

#[tokio::test]
async fn resolving_twice_is_a_conflict_and_never_reapplies() {
    let f = team_fixture().await;
    let x = rent_of(&f.engine, &f.member).await;
    let r = f
        .engine
        .request_edit_others(
            &f.admin,
            x.id,
            TransactionChanges::new().amount_minor(500_000),
            "wrong amount",
        )
        .await
        .unwrap();
    f.engine
        .confirm_change(&f.member, r.id, ResolveAction::Approve)
        .await
        .unwrap();
    f.engine
        .edit_own_transaction(&f.member, x.id, TransactionChanges::new().amount_minor(420_000))
        .await
        .unwrap();

    for action in [ResolveAction::Approve, ResolveAction::Reject] {
        let err = f
            .engine
            .confirm_change(&f.member, r.id, action)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Conflict(_)));
    }
    let x = f.engine.transaction(&f.member, x.id).await.unwrap();
    assert_eq!(x.amount_minor, 420_000);

    let rejected = f
        .engine
        .request_delete_others(&f.admin, x.id, "duplicate")
        .await
        .unwrap();
    f.engine
        .confirm_change(&f.member, rejected.id, ResolveAction::Reject)
        .await
        .unwrap();
    let err = f
        .engine
        .confirm_change(&f.member, rejected.id, ResolveAction::Approve)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));
    assert!(f.engine.transaction(&f.member, x.id).await.is_ok());
}

#[tokio::test]
async fn unknown_request_is_not_found() {
    let f = team_fixture().await;
    let err = f
        .engine
        .confirm_change(&f.member, uuid::Uuid::new_v4(), ResolveAction::Approve)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn second_request_on_same_transaction_conflicts() {
    let f = team_fixture().await;
    let x = rent_of(&f.engine, &f.member).await;
    f.engine
        .request_edit_others(
            &f.admin,
            x.id,
            TransactionChanges::new().amount_minor(500_000),
            "wrong amount",
        )
        .await
        .unwrap();

    let err = f
        .engine
        .request_delete_others(&f.deputy, x.id, "duplicate")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));
    let err = f
        .engine
        .request_edit_others(
            &f.owner,
            x.id,
            TransactionChanges::new().category("housing"),
            "category",
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));
    assert_status_invariant(&f).await;
}

#[tokio::test]
async fn concurrent_requests_accept_exactly_one() {
    let f = team_fixture().await;
    let x = rent_of(&f.engine, &f.member).await;

    let (a, b) = tokio::join!(
        f.engine.request_edit_others(
            &f.admin,
            x.id,
            TransactionChanges::new().amount_minor(500_000),
            "wrong amount",
        ),
        f.engine.request_edit_others(
            &f.deputy,
            x.id,
            TransactionChanges::new().amount_minor(350_000),
            "fees missing",
        ),
    );

    let results = [a, b];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        results
            .iter()
            .any(|r| matches!(r, Err(EngineError::Conflict(_))))
    );
    assert_status_invariant(&f).await;
}

#[tokio::test]
async fn owners_cannot_request_against_their_own_entry() {
    let f = team_fixture().await;
    let own = rent_of(&f.engine, &f.deputy).await;

    let err = f
        .engine
        .request_delete_others(&f.deputy, own.id, "mistake")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
    let err = f
        .engine
        .request_edit_others(
            &f.deputy,
            own.id,
            TransactionChanges::new().amount_minor(1),
            "mistake",
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let own = f.engine.transaction(&f.deputy, own.id).await.unwrap();
    assert_eq!(own.status, TransactionStatus::Approved);
}

#[tokio::test]
async fn requests_need_a_reason_and_real_changes() {
    let f = team_fixture().await;
    let x = rent_of(&f.engine, &f.member).await;

    let err = f
        .engine
        .request_delete_others(&f.admin, x.id, "   ")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
    let err = f
        .engine
        .request_edit_others(&f.admin, x.id, TransactionChanges::new(), "because")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
    let err = f
        .engine
        .request_edit_others(
            &f.admin,
            x.id,
            TransactionChanges::new().amount_minor(0),
            "because",
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
    assert_status_invariant(&f).await;
}

#[tokio::test]
async fn requester_cancels_pending_request() {
    let f = team_fixture().await;
    let x = rent_of(&f.engine, &f.member).await;
    let r = f
        .engine
        .request_delete_others(&f.admin, x.id, "duplicate")
        .await
        .unwrap();

    let err = f
        .engine
        .cancel_change_request(&f.member, r.id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let cancelled = f.engine.cancel_change_request(&f.admin, r.id).await.unwrap();
    assert_eq!(cancelled.status, ChangeRequestStatus::Cancelled);
    assert_eq!(
        f.engine.transaction(&f.member, x.id).await.unwrap().status,
        TransactionStatus::Approved
    );

    let err = f
        .engine
        .cancel_change_request(&f.admin, r.id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));
    let err = f
        .engine
        .confirm_change(&f.member, r.id, ResolveAction::Approve)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));
    assert_status_invariant(&f).await;

    // A fresh request is possible once the old one is closed.
    f.engine
        .request_delete_others(&f.deputy, x.id, "still a duplicate")
        .await
        .unwrap();
    assert_status_invariant(&f).await;
}

#[tokio::test]
async fn owner_direct_delete_cancels_pending_request() {
    let f = team_fixture().await;
    let x = rent_of(&f.engine, &f.member).await;
    let r = f
        .engine
        .request_edit_others(
            &f.admin,
            x.id,
            TransactionChanges::new().amount_minor(500_000),
            "wrong amount",
        )
        .await
        .unwrap();

    f.engine.delete_own_transaction(&f.member, x.id).await.unwrap();
    let r = f.engine.change_request(&f.admin, r.id).await.unwrap();
    assert_eq!(r.status, ChangeRequestStatus::Cancelled);
    assert_eq!(r.resolved_by.as_deref(), Some("mario"));
}

#[tokio::test]
async fn owner_direct_edit_keeps_pending_request() {
    let f = team_fixture().await;
    let x = rent_of(&f.engine, &f.member).await;
    let r = f
        .engine
        .request_delete_others(&f.admin, x.id, "duplicate")
        .await
        .unwrap();

    let edited = f
        .engine
        .edit_own_transaction(&f.member, x.id, TransactionChanges::new().note("kept"))
        .await
        .unwrap();
    assert_eq!(edited.status, TransactionStatus::DeleteRequested);
    assert_eq!(edited.note.as_deref(), Some("kept"));
    assert!(f.engine.change_request(&f.member, r.id).await.unwrap().is_pending());
    assert_status_invariant(&f).await;
}

#[tokio::test]
async fn removing_a_member_cancels_their_requests() {
    let f = team_fixture().await;
    let marios = rent_of(&f.engine, &f.member).await;
    let admins = rent_of(&f.engine, &f.admin).await;

    let raised = f
        .engine
        .request_delete_others(&f.member, admins.id, "not ours")
        .await
        .unwrap();
    let against = f
        .engine
        .request_edit_others(
            &f.deputy,
            marios.id,
            TransactionChanges::new().amount_minor(1),
            "typo",
        )
        .await
        .unwrap();

    f.engine.remove_member(&f.owner, "mario").await.unwrap();

    for id in [raised.id, against.id] {
        let r = f.engine.change_request(&f.owner, id).await.unwrap();
        assert_eq!(r.status, ChangeRequestStatus::Cancelled);
        assert_eq!(r.resolved_by.as_deref(), Some("olivia"));
    }
    let kept = f.engine.transaction(&f.owner, marios.id).await.unwrap();
    assert_eq!(kept.status, TransactionStatus::Approved);
    assert_eq!(kept.owner_user_id, "mario");
    assert_status_invariant(&f).await;
}

#[tokio::test]
async fn former_members_entries_take_no_new_requests() {
    let f = team_fixture().await;
    let x = rent_of(&f.engine, &f.member).await;
    f.engine.remove_member(&f.owner, "mario").await.unwrap();

    let err = f
        .engine
        .request_edit_others(
            &f.admin,
            x.id,
            TransactionChanges::new().amount_minor(500_000),
            "wrong amount",
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));
    let err = f
        .engine
        .request_delete_others(&f.owner, x.id, "left the team")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));

    let x = f.engine.transaction(&f.owner, x.id).await.unwrap();
    assert_eq!(x.status, TransactionStatus::Approved);
    assert!(
        f.engine
            .list_change_requests(&f.owner, &ChangeRequestFilter::default())
            .await
            .unwrap()
            .is_empty()
    );
    assert_status_invariant(&f).await;
}

#[tokio::test]
async fn stale_requests_expire_after_ttl() {
    let db = db_with_users(&["olivia", "adam", "diana", "mario", "zoe"]).await;
    let engine = Engine::builder()
        .database(db.clone())
        .request_ttl(Duration::hours(24))
        .build()
        .await
        .unwrap();
    let f = fixture_on(engine, db).await;
    let x = rent_of(&f.engine, &f.member).await;
    let r = f
        .engine
        .request_delete_others(&f.admin, x.id, "duplicate")
        .await
        .unwrap();

    let none = f
        .engine
        .expire_change_requests(Utc::now() + Duration::hours(1))
        .await
        .unwrap();
    assert!(none.is_empty());

    let expired = f
        .engine
        .expire_change_requests(Utc::now() + Duration::hours(25))
        .await
        .unwrap();
    assert_eq!(expired, vec![r.id]);

    let r = f.engine.change_request(&f.member, r.id).await.unwrap();
    assert_eq!(r.status, ChangeRequestStatus::Expired);
    assert_eq!(r.resolved_by, None);
    assert_eq!(
        f.engine.transaction(&f.member, x.id).await.unwrap().status,
        TransactionStatus::Approved
    );
    let err = f
        .engine
        .confirm_change(&f.member, r.id, ResolveAction::Approve)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));
    assert_status_invariant(&f).await;
}

#[tokio::test]
async fn expiry_without_ttl_is_a_no_op() {
    let f = team_fixture().await;
    let x = rent_of(&f.engine, &f.member).await;
    f.engine
        .request_delete_others(&f.admin, x.id, "duplicate")
        .await
        .unwrap();
    let expired = f
        .engine
        .expire_change_requests(Utc::now() + Duration::days(365))
        .await
        .unwrap();
    assert!(expired.is_empty());
}

#[tokio::test]
async fn ttl_beyond_the_calendar_expires_nothing() {
    let db = db_with_users(&["olivia", "adam", "diana", "mario", "zoe"]).await;
    let engine = Engine::builder()
        .database(db.clone())
        .request_ttl(Duration::MAX)
        .build()
        .await
        .unwrap();
    let f = fixture_on(engine, db).await;
    let x = rent_of(&f.engine, &f.member).await;
    f.engine
        .request_delete_others(&f.admin, x.id, "duplicate")
        .await
        .unwrap();
    let expired = f.engine.expire_change_requests(Utc::now()).await.unwrap();
    assert!(expired.is_empty());
    assert_status_invariant(&f).await;
}

#[tokio::test]
async fn list_scopes_split_incoming_and_outgoing() {
    let f = team_fixture().await;
    let marios = rent_of(&f.engine, &f.member).await;
    let dianas = rent_of(&f.engine, &f.deputy).await;
    f.engine
        .request_delete_others(&f.admin, marios.id, "duplicate")
        .await
        .unwrap();
    f.engine
        .request_delete_others(&f.member, dianas.id, "duplicate")
        .await
        .unwrap();

    let incoming = f
        .engine
        .list_change_requests(&f.member, &ChangeRequestFilter::incoming())
        .await
        .unwrap();
    assert_eq!(incoming.len(), 1);
    assert_eq!(incoming[0].requester_id, "adam");

    let outgoing = f
        .engine
        .list_change_requests(&f.member, &ChangeRequestFilter::outgoing())
        .await
        .unwrap();
    assert_eq!(outgoing.len(), 1);
    assert_eq!(outgoing[0].target_transaction_id, dianas.id);

    let all = f
        .engine
        .list_change_requests(&f.owner, &ChangeRequestFilter::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn storage_rejects_a_second_pending_row() {
    let f = team_fixture().await;
    let x = rent_of(&f.engine, &f.member).await;
    let r = f
        .engine
        .request_delete_others(&f.admin, x.id, "duplicate")
        .await
        .unwrap();

    let backend = f.db.get_database_backend();
    let res = f
        .db
        .execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO change_requests \
             (id, team_id, target_transaction_id, target_owner_id, requester_id, kind, reason, status, created_at) \
             VALUES (?, ?, ?, ?, ?, 'delete', 'again', 'pending', ?)",
            vec![
                uuid::Uuid::new_v4().to_string().into(),
                r.team_id.clone().into(),
                x.id.to_string().into(),
                "mario".into(),
                "diana".into(),
                Utc::now().into(),
            ],
        ))
        .await;
    assert!(res.is_err());
}
