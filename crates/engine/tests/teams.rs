mod common;

use engine::{EngineError, Role, ViewMode};

use common::{engine_with_users, team_fixture};

#[tokio::test]
async fn creator_becomes_the_only_owner() {
    let (engine, _db) = engine_with_users(&["olivia"]).await;
    let team = engine.create_team("  Household ", "olivia").await.unwrap();
    assert_eq!(team.name, "Household");

    let owner = engine.actor(&team.id.to_string(), "olivia").await.unwrap();
    assert_eq!(owner.role, Role::Owner);

    let members = engine.list_members(&owner).await.unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].role, Role::Owner);
}

#[tokio::test]
async fn create_team_rejects_blank_name_and_unknown_user() {
    let (engine, _db) = engine_with_users(&["olivia"]).await;
    assert!(matches!(
        engine.create_team("  ", "olivia").await,
        Err(EngineError::Validation(_))
    ));
    assert!(matches!(
        engine.create_team("Household", "ghost").await,
        Err(EngineError::KeyNotFound(_))
    ));
}

#[tokio::test]
async fn members_are_listed_by_rank() {
    let f = team_fixture().await;
    let roles: Vec<Role> = f
        .engine
        .list_members(&f.member)
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.role)
        .collect();
    assert_eq!(roles, vec![Role::Owner, Role::Admin, Role::Deputy, Role::Member]);
}

#[tokio::test]
async fn add_member_requires_outranking_the_granted_role() {
    let f = team_fixture().await;

    let err = f
        .engine
        .add_member(&f.deputy, "zoe", Role::Deputy)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let added = f
        .engine
        .add_member(&f.deputy, "zoe", Role::Member)
        .await
        .unwrap();
    assert_eq!(added.role, Role::Member);

    let err = f
        .engine
        .add_member(&f.owner, "zoe", Role::Admin)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));

    let err = f
        .engine
        .add_member(&f.owner, "ghost", Role::Member)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn admin_promotes_member_to_deputy() {
    let f = team_fixture().await;
    let updated = f
        .engine
        .assign_role(&f.admin, "mario", Role::Deputy)
        .await
        .unwrap();
    assert_eq!(updated.role, Role::Deputy);

    let mario = f
        .engine
        .actor(&f.team.id.to_string(), "mario")
        .await
        .unwrap();
    assert_eq!(mario.role, Role::Deputy);
}

#[tokio::test]
async fn nobody_reaches_owner_or_promotes_themselves() {
    let f = team_fixture().await;

    for (actor, target, role) in [
        (&f.owner, "adam", Role::Owner),
        (&f.admin, "diana", Role::Admin),
        (&f.admin, "adam", Role::Deputy),
        (&f.deputy, "diana", Role::Admin),
        (&f.admin, "olivia", Role::Member),
        (&f.member, "mario", Role::Member),
    ] {
        let err = f.engine.assign_role(actor, target, role).await.unwrap_err();
        assert!(
            matches!(err, EngineError::Forbidden(_)),
            "{} -> {target} as {role}: {err:?}",
            actor.user_id
        );
    }

    let owner = f
        .engine
        .actor(&f.team.id.to_string(), "olivia")
        .await
        .unwrap();
    assert_eq!(owner.role, Role::Owner);
}

#[tokio::test]
async fn assign_role_to_non_member_is_not_found() {
    let f = team_fixture().await;
    let err = f
        .engine
        .assign_role(&f.owner, "zoe", Role::Member)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn remove_member_requires_higher_rank() {
    let f = team_fixture().await;

    let err = f.engine.remove_member(&f.deputy, "adam").await.unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
    let err = f.engine.remove_member(&f.admin, "olivia").await.unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    f.engine.remove_member(&f.admin, "mario").await.unwrap();
    let err = f
        .engine
        .actor(&f.team.id.to_string(), "mario")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn teams_of_lists_actual_roles() {
    let f = team_fixture().await;
    let second = f.engine.create_team("Trip", "mario").await.unwrap();

    let teams = f.engine.teams_of("mario").await.unwrap();
    assert_eq!(teams.len(), 2);
    assert_eq!(teams[0].0.id, f.team.id);
    assert_eq!(teams[0].1, Role::Member);
    assert_eq!(teams[1].0.id, second.id);
    assert_eq!(teams[1].1, Role::Owner);
}

#[tokio::test]
async fn view_mode_never_changes_authority() {
    let f = team_fixture().await;

    // The owner displays an admin view; the actor still carries Owner.
    let mut view = ViewMode::new(f.owner.role);
    view.select(Role::Admin).unwrap();
    assert_eq!(view.selected_mode(), Role::Admin);

    let updated = f
        .engine
        .assign_role(&f.owner, "adam", Role::Deputy)
        .await
        .unwrap();
    assert_eq!(updated.role, Role::Deputy);
}
