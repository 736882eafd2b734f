use chrono::Utc;
use rand::Rng;
use rand::distr::Alphanumeric;
use sea_orm::*;
use tracing::{info, warn};

use crate::entity::{game, room};
use crate::error::AppError;

/// Upper bound on fresh codes tried before giving up.
const MAX_CODE_ATTEMPTS: usize = 16;
const SEGMENT_LEN: usize = 4;

/// Two `[A-Za-z0-9]{4}` segments joined by `-`, e.g. `aZ3k-9QxB`.
pub fn generate_room_code() -> String {
    let mut rng = rand::rng();
    let mut segment = || -> String {
        (&mut rng)
            .sample_iter(Alphanumeric)
            .take(SEGMENT_LEN)
            .map(char::from)
            .collect()
    };
    let first = segment();
    let second = segment();
    format!("{first}-{second}")
}

#[cfg(test)]
fn is_valid_room_code(code: &str) -> bool {
    match code.split_once('-') {
        Some((a, b)) => [a, b]
            .iter()
            .all(|s| s.len() == SEGMENT_LEN && s.chars().all(|c| c.is_ascii_alphanumeric())),
        None => false,
    }
}

/// Snapshot `game` into a new room under a fresh code.
///
/// A code already in use is skipped before insert; a concurrent insert that
/// trips the unique constraint is retried with another code.
pub async fn materialize<C: ConnectionTrait>(
    db: &C,
    game: &game::Model,
) -> Result<room::Model, AppError> {
    materialize_with(db, game, generate_room_code).await
}

async fn materialize_with<C, F>(
    db: &C,
    game: &game::Model,
    mut next_code: F,
) -> Result<room::Model, AppError>
where
    C: ConnectionTrait,
    F: FnMut() -> String,
{
    for attempt in 1..=MAX_CODE_ATTEMPTS {
        let code = next_code();

        let taken = room::Entity::find()
            .filter(room::Column::RoomId.eq(&code))
            .one(db)
            .await?
            .is_some();
        if taken {
            warn!(attempt, code = %code, "Room code already in use, retrying");
            continue;
        }

        let new_room = room::ActiveModel {
            room_id: Set(code.clone()),
            game_id: Set(game.id),
            user_id: Set(game.user_id),
            name: Set(game.name.clone()),
            description: Set(game.description.clone()),
            max_users: Set(game.max_users),
            picture: Set(game.picture.clone()),
            map: Set(game.map.clone()),
            rules: Set(game.rules.clone()),
            chips: Set(game.chips.clone()),
            cube: Set(game.cube.clone()),
            decks: Set(game.decks.clone()),
            objects_json: Set(game.objects_json.clone()),
            date_created: Set(Utc::now()),
            ..Default::default()
        };

        match new_room.insert(db).await {
            Ok(model) => {
                info!(game_id = game.id, room_id = %model.room_id, "Room materialized");
                return Ok(model);
            }
            Err(e) => match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    warn!(attempt, code = %code, "Room code collided on insert, retrying");
                }
                _ => return Err(AppError::from(e)),
            },
        }
    }

    Err(AppError::Internal(format!(
        "No free room code after {MAX_CODE_ATTEMPTS} attempts for game {}",
        game.id
    )))
}
