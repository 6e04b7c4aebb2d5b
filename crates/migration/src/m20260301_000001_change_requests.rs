//! Change requests against transactions.
//!
//! Rows outlive their target transaction (an approved delete keeps its
//! request), so `target_transaction_id` is indexed but carries no foreign key.
//! A partial unique index allows a single `pending` row per target.

use sea_orm::ConnectionTrait;
use sea_orm_migration::prelude::*;

use crate::m20260301_000000_init::Teams;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum ChangeRequests {
    Table,
    Id,
    TeamId,
    TargetTransactionId,
    TargetOwnerId,
    RequesterId,
    Kind,
    ProposedChanges,
    Reason,
    Status,
    CreatedAt,
    ResolvedAt,
    ResolvedBy,
}

const PENDING_INDEX: &str = "idx-change_requests-target-pending-unique";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ChangeRequests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ChangeRequests::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ChangeRequests::TeamId).string().not_null())
                    .col(
                        ColumnDef::new(ChangeRequests::TargetTransactionId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ChangeRequests::TargetOwnerId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ChangeRequests::RequesterId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ChangeRequests::Kind)
                            .string()
                            .not_null()
                            .check(Expr::col(ChangeRequests::Kind).is_in(["edit", "delete"])),
                    )
                    .col(ColumnDef::new(ChangeRequests::ProposedChanges).text())
                    .col(ColumnDef::new(ChangeRequests::Reason).string().not_null())
                    .col(
                        ColumnDef::new(ChangeRequests::Status)
                            .string()
                            .not_null()
                            .default("pending")
                            .check(Expr::col(ChangeRequests::Status).is_in([
                                "pending",
                                "approved",
                                "rejected",
                                "cancelled",
                                "expired",
                            ])),
                    )
                    .col(
                        ColumnDef::new(ChangeRequests::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ChangeRequests::ResolvedAt).timestamp())
                    .col(ColumnDef::new(ChangeRequests::ResolvedBy).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-change_requests-team_id")
                            .from(ChangeRequests::Table, ChangeRequests::TeamId)
                            .to(Teams::Table, Teams::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-change_requests-target_transaction_id")
                    .table(ChangeRequests::Table)
                    .col(ChangeRequests::TargetTransactionId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-change_requests-team_id-status")
                    .table(ChangeRequests::Table)
                    .col(ChangeRequests::TeamId)
                    .col(ChangeRequests::Status)
                    .to_owned(),
            )
            .await?;

        // sea-query has no portable partial index builder.
        manager
            .get_connection()
            .execute_unprepared(&format!(
                "CREATE UNIQUE INDEX IF NOT EXISTS \"{PENDING_INDEX}\" \
                 ON \"change_requests\" (\"target_transaction_id\") \
                 WHERE \"status\" = 'pending'"
            ))
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name(PENDING_INDEX)
                    .table(ChangeRequests::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(ChangeRequests::Table).to_owned())
            .await?;
        Ok(())
    }
}
