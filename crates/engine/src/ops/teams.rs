use chrono::Utc;
use sea_orm::{ActiveValue, Condition, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    Actor, ChangeRequest, ChangeRequestStatus, EngineError, ResultEngine, Role, Team,
    TeamMembership, change_requests, team_memberships, teams,
};

use super::{Engine, with_tx};

impl Engine {
    /// Creates a team. The creator becomes its one and only `Owner`.
    pub async fn create_team(&self, name: &str, creator: &str) -> ResultEngine<Team> {
        with_tx!(self, |db_tx| {
            self.require_user_exists(&db_tx, creator).await?;
            let team = Team::new(name.to_string(), creator.to_string(), Utc::now())?;
            teams::ActiveModel::from(&team).insert(&db_tx).await?;

            let owner = TeamMembership {
                team_id: team.id.to_string(),
                user_id: creator.to_string(),
                role: Role::Owner,
            };
            team_memberships::ActiveModel::from(&owner)
                .insert(&db_tx)
                .await?;

            tracing::info!(team_id = %team.id, owner = creator, "team created");
            Ok(team)
        })
    }

    /// Teams the user belongs to, with the user's actual role in each.
    pub async fn teams_of(&self, user_id: &str) -> ResultEngine<Vec<(Team, Role)>> {
        with_tx!(self, |db_tx| {
            let rows = team_memberships::Entity::find()
                .filter(team_memberships::Column::UserId.eq(user_id.to_string()))
                .find_also_related(teams::Entity)
                .all(&db_tx)
                .await?;
            let mut out = Vec::with_capacity(rows.len());
            for (membership, team) in rows {
                let Some(team) = team else { continue };
                let membership = TeamMembership::try_from(membership)?;
                out.push((Team::try_from(team)?, membership.role));
            }
            out.sort_by(|(a, _), (b, _)| a.created_at.cmp(&b.created_at));
            Ok(out)
        })
    }

    /// Builds the Identity Context of `user_id` in `team_id` from the
    /// persisted membership.
    pub async fn actor(&self, team_id: &str, user_id: &str) -> ResultEngine<Actor> {
        with_tx!(self, |db_tx| {
            let membership = self.require_membership(&db_tx, team_id, user_id).await?;
            Ok(Actor::new(membership.user_id, membership.team_id, membership.role))
        })
    }

    /// Lists members of the actor's team, most authoritative first.
    pub async fn list_members(&self, actor: &Actor) -> ResultEngine<Vec<TeamMembership>> {
        with_tx!(self, |db_tx| {
            self.require_membership(&db_tx, &actor.team_id, &actor.user_id)
                .await?;
            let rows = team_memberships::Entity::find()
                .filter(team_memberships::Column::TeamId.eq(actor.team_id.clone()))
                .order_by_asc(team_memberships::Column::UserId)
                .all(&db_tx)
                .await?;
            let mut members = rows
                .into_iter()
                .map(TeamMembership::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;
            members.sort_by_key(|m| m.role.rank());
            Ok(members)
        })
    }

    /// Adds a user to the actor's team. The actor must outrank `role`.
    pub async fn add_member(
        &self,
        actor: &Actor,
        username: &str,
        role: Role,
    ) -> ResultEngine<TeamMembership> {
        with_tx!(self, |db_tx| {
            if !actor.role.can_assign_role(role) {
                return Err(EngineError::Forbidden(format!(
                    "{} cannot grant {role}",
                    actor.role
                )));
            }
            self.require_user_exists(&db_tx, username).await?;
            if self
                .find_membership(&db_tx, &actor.team_id, username)
                .await?
                .is_some()
            {
                return Err(EngineError::Conflict(format!(
                    "{username} is already a member"
                )));
            }

            let membership = TeamMembership {
                team_id: actor.team_id.clone(),
                user_id: username.to_string(),
                role,
            };
            team_memberships::ActiveModel::from(&membership)
                .insert(&db_tx)
                .await
                .map_err(|err| EngineError::from_write(err, "member already exists"))?;

            tracing::info!(team_id = %actor.team_id, member = username, %role, "member added");
            Ok(membership)
        })
    }

    /// Changes the actual role of a member.
    ///
    /// The actor must outrank both the member's current role and the new
    /// one, so the owner is never demoted, nobody becomes owner and nobody
    /// promotes themselves.
    pub async fn assign_role(
        &self,
        actor: &Actor,
        target_user_id: &str,
        new_role: Role,
    ) -> ResultEngine<TeamMembership> {
        with_tx!(self, |db_tx| {
            if !actor.role.can_assign_role(new_role) {
                return Err(EngineError::Forbidden(format!(
                    "{} cannot grant {new_role}",
                    actor.role
                )));
            }
            let current = self
                .require_membership(&db_tx, &actor.team_id, target_user_id)
                .await?;
            if !actor.role.can_override_rank(current.role) {
                return Err(EngineError::Forbidden(format!(
                    "{} cannot change the role of a {}",
                    actor.role, current.role
                )));
            }

            let active = team_memberships::ActiveModel {
                team_id: ActiveValue::Set(current.team_id.clone()),
                user_id: ActiveValue::Set(current.user_id.clone()),
                role: ActiveValue::Set(new_role.as_str().to_string()),
            };
            active.update(&db_tx).await?;

            tracing::info!(
                team_id = %actor.team_id,
                member = target_user_id,
                from = %current.role,
                to = %new_role,
                "role assigned"
            );
            Ok(TeamMembership {
                role: new_role,
                ..current
            })
        })
    }

    /// Removes a member the actor outranks.
    ///
    /// The member's transactions stay in the ledger. Pending requests they
    /// raised, or that target their transactions, are cancelled.
    pub async fn remove_member(&self, actor: &Actor, target_user_id: &str) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let current = self
                .require_membership(&db_tx, &actor.team_id, target_user_id)
                .await?;
            if !actor.role.can_override_rank(current.role) {
                return Err(EngineError::Forbidden(format!(
                    "{} cannot remove a {}",
                    actor.role, current.role
                )));
            }

            let pending = change_requests::Entity::find()
                .filter(change_requests::Column::TeamId.eq(actor.team_id.clone()))
                .filter(
                    change_requests::Column::Status.eq(ChangeRequestStatus::Pending.as_str()),
                )
                .filter(
                    Condition::any()
                        .add(
                            change_requests::Column::RequesterId.eq(target_user_id.to_string()),
                        )
                        .add(
                            change_requests::Column::TargetOwnerId.eq(target_user_id.to_string()),
                        ),
                )
                .all(&db_tx)
                .await?;

            let now = Utc::now();
            for model in pending {
                let request = ChangeRequest::try_from(model)?;
                self.release_request(
                    &db_tx,
                    &request,
                    ChangeRequestStatus::Cancelled,
                    Some(&actor.user_id),
                    now,
                )
                .await?;
            }

            team_memberships::Entity::delete_by_id((
                actor.team_id.clone(),
                target_user_id.to_string(),
            ))
            .exec(&db_tx)
            .await?;

            tracing::info!(team_id = %actor.team_id, member = target_user_id, "member removed");
            Ok(())
        })
    }
}
