#![allow(dead_code)]

use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{Actor, Engine, Role, Team, Transaction, NewTransactionCmd};
use migration::MigratorTrait;

pub async fn db_with_users(users: &[&str]) -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    for user in users {
        db.execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO users (username, password) VALUES (?, ?)",
            vec![(*user).into(), "password".into()],
        ))
        .await
        .unwrap();
    }
    db
}

pub async fn engine_with_users(users: &[&str]) -> (Engine, DatabaseConnection) {
    let db = db_with_users(users).await;
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

/// A team where `olivia` is owner, `adam` admin, `diana` deputy and `mario`
/// a plain member.
pub struct Fixture {
    pub engine: Engine,
    pub db: DatabaseConnection,
    pub team: Team,
    pub owner: Actor,
    pub admin: Actor,
    pub deputy: Actor,
    pub member: Actor,
}

pub async fn team_fixture() -> Fixture {
    let (engine, db) = engine_with_users(&["olivia", "adam", "diana", "mario", "zoe"]).await;
    fixture_on(engine, db).await
}

pub async fn fixture_on(engine: Engine, db: DatabaseConnection) -> Fixture {
    let team = engine.create_team("Household", "olivia").await.unwrap();
    let team_id = team.id.to_string();
    let owner = engine.actor(&team_id, "olivia").await.unwrap();
    engine.add_member(&owner, "adam", Role::Admin).await.unwrap();
    engine.add_member(&owner, "diana", Role::Deputy).await.unwrap();
    engine.add_member(&owner, "mario", Role::Member).await.unwrap();

    Fixture {
        admin: engine.actor(&team_id, "adam").await.unwrap(),
        deputy: engine.actor(&team_id, "diana").await.unwrap(),
        member: engine.actor(&team_id, "mario").await.unwrap(),
        owner,
        engine,
        db,
        team,
    }
}

pub async fn rent_of(engine: &Engine, actor: &Actor) -> Transaction {
    engine
        .create_transaction(actor, NewTransactionCmd::expense(300_000, "rent"))
        .await
        .unwrap()
}
