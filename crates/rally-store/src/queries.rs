use chrono::Utc;
use rally_types::models::{Challenge, Completion, Group, NewChallenge, User};
use tracing::debug;

use crate::invite::generate_invite_code;
use crate::{Store, StoreError, Tables};

impl Store {
    // -- Groups --

    pub async fn create_group(&self, name: &str) -> Result<Group, StoreError> {
        if name.trim().is_empty() {
            return Err(StoreError::InvalidInput("Group name is required".into()));
        }

        self.with_tables_mut(|tables| {
            let invite_code = loop {
                let code = generate_invite_code();
                if !tables.groups.values().any(|g| g.invite_code == code) {
                    break code;
                }
                debug!("Invite code collision on {}, retrying", code);
            };

            let group = Group {
                id: tables.ids.next_group(),
                name: name.to_string(),
                invite_code,
            };
            tables.groups.insert(group.id, group.clone());
            Ok(group)
        })
    }

    pub async fn get_group_by_invite_code(&self, code: &str) -> Result<Option<Group>, StoreError> {
        self.with_tables(|tables| {
            Ok(tables
                .groups
                .values()
                .find(|g| g.invite_code == code)
                .cloned())
        })
    }

    pub async fn get_group_by_id(&self, id: i64) -> Result<Option<Group>, StoreError> {
        self.with_tables(|tables| Ok(tables.groups.get(&id).cloned()))
    }

    // -- Users --

    /// Inserts a user with zero points. `(username, group_id)` uniqueness is
    /// the caller's concern.
    pub async fn create_user(
        &self,
        username: &str,
        password: &str,
        group_id: i64,
    ) -> Result<User, StoreError> {
        self.with_tables_mut(|tables| {
            let user = User {
                id: tables.ids.next_user(),
                username: username.to_string(),
                password: password.to_string(),
                group_id,
                points: 0,
            };
            tables.users.insert(user.id, user.clone());
            Ok(user)
        })
    }

    pub async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        self.with_tables(|tables| Ok(tables.users.get(&id).cloned()))
    }

    pub async fn get_user_by_username_and_group(
        &self,
        username: &str,
        group_id: i64,
    ) -> Result<Option<User>, StoreError> {
        self.with_tables(|tables| {
            Ok(tables
                .users
                .values()
                .find(|u| u.username == username && u.group_id == group_id)
                .cloned())
        })
    }

    pub async fn update_user_points(&self, user_id: i64, points: i64) -> Result<User, StoreError> {
        self.with_tables_mut(|tables| {
            let user = tables.users.get_mut(&user_id).ok_or(StoreError::NotFound {
                entity: "User",
                id: user_id,
            })?;
            user.points = points;
            Ok(user.clone())
        })
    }

    /// Members of a group, highest points first. Ties keep join order.
    pub async fn get_users_by_group(&self, group_id: i64) -> Result<Vec<User>, StoreError> {
        self.with_tables(|tables| {
            let mut users: Vec<User> = tables
                .users
                .values()
                .filter(|u| u.group_id == group_id)
                .cloned()
                .collect();
            users.sort_by(|a, b| b.points.cmp(&a.points));
            Ok(users)
        })
    }

    // -- Challenges --

    pub async fn create_challenge(&self, new: NewChallenge) -> Result<Challenge, StoreError> {
        self.with_tables_mut(|tables| {
            let challenge = Challenge {
                id: tables.ids.next_challenge(),
                title: new.title,
                description: new.description,
                points: new.points,
                difficulty: new.difficulty,
                icon: new.icon,
                group_id: new.group_id,
            };
            tables.challenges.insert(challenge.id, challenge.clone());
            Ok(challenge)
        })
    }

    pub async fn get_challenges_by_group(&self, group_id: i64) -> Result<Vec<Challenge>, StoreError> {
        self.with_tables(|tables| {
            Ok(tables
                .challenges
                .values()
                .filter(|c| c.group_id == group_id)
                .cloned()
                .collect())
        })
    }

    pub async fn get_challenge_by_id(&self, id: i64) -> Result<Option<Challenge>, StoreError> {
        self.with_tables(|tables| Ok(tables.challenges.get(&id).cloned()))
    }

    /// Removes the challenge only. Completions that reference it are kept.
    pub async fn delete_challenge(&self, id: i64) -> Result<bool, StoreError> {
        self.with_tables_mut(|tables| Ok(tables.challenges.remove(&id).is_some()))
    }

    // -- Completions --

    pub async fn create_completion(
        &self,
        user_id: i64,
        challenge_id: i64,
    ) -> Result<Completion, StoreError> {
        self.with_tables_mut(|tables| Ok(insert_completion(tables, user_id, challenge_id)))
    }

    pub async fn get_completions_by_user(&self, user_id: i64) -> Result<Vec<Completion>, StoreError> {
        self.with_tables(|tables| {
            Ok(tables
                .completions
                .values()
                .filter(|c| c.user_id == user_id)
                .cloned()
                .collect())
        })
    }

    pub async fn get_completions_by_challenge(
        &self,
        challenge_id: i64,
    ) -> Result<Vec<Completion>, StoreError> {
        self.with_tables(|tables| {
            Ok(tables
                .completions
                .values()
                .filter(|c| c.challenge_id == challenge_id)
                .cloned()
                .collect())
        })
    }

    pub async fn is_user_challenge_completed(
        &self,
        user_id: i64,
        challenge_id: i64,
    ) -> Result<bool, StoreError> {
        self.with_tables(|tables| Ok(has_completion(tables, user_id, challenge_id)))
    }

    /// Records a completion and awards the challenge's points in a single
    /// critical section, so concurrent completions by one user cannot
    /// overwrite each other's point totals.
    pub async fn complete_challenge(
        &self,
        user_id: i64,
        challenge_id: i64,
    ) -> Result<(Completion, User), StoreError> {
        self.with_tables_mut(|tables| {
            let award = tables
                .challenges
                .get(&challenge_id)
                .map(|c| c.points)
                .ok_or(StoreError::NotFound {
                    entity: "Challenge",
                    id: challenge_id,
                })?;

            let current = tables
                .users
                .get(&user_id)
                .map(|u| u.points)
                .ok_or(StoreError::NotFound {
                    entity: "User",
                    id: user_id,
                })?;

            if has_completion(tables, user_id, challenge_id) {
                return Err(StoreError::AlreadyCompleted);
            }

            let points = current
                .checked_add(award)
                .ok_or_else(|| StoreError::InvalidInput("Point total out of range".into()))?;

            let completion = insert_completion(tables, user_id, challenge_id);
            let user = tables
                .users
                .get_mut(&user_id)
                .ok_or(StoreError::NotFound {
                    entity: "User",
                    id: user_id,
                })?;
            user.points = points;

            Ok((completion, user.clone()))
        })
    }
}

fn has_completion(tables: &Tables, user_id: i64, challenge_id: i64) -> bool {
    tables
        .completions
        .values()
        .any(|c| c.user_id == user_id && c.challenge_id == challenge_id)
}

fn insert_completion(tables: &mut Tables, user_id: i64, challenge_id: i64) -> Completion {
    let completion = Completion {
        id: tables.ids.next_completion(),
        user_id,
        challenge_id,
        completed_at: Utc::now(),
    };
    tables.completions.insert(completion.id, completion.clone());
    completion
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use super::*;

    fn run_5k(group_id: i64, points: i64) -> NewChallenge {
        NewChallenge {
            title: "Run 5k".into(),
            description: "Any pace".into(),
            points,
            difficulty: "medium".into(),
            icon: "star".into(),
            group_id,
        }
    }

    #[tokio::test]
    async fn test_invite_codes_are_unique() {
        let store = Store::new();
        let mut codes = HashSet::new();
        for i in 0..300 {
            let group = store.create_group(&format!("group {i}")).await.unwrap();
            assert_eq!(group.invite_code.len(), 6);
            codes.insert(group.invite_code);
        }
        assert_eq!(codes.len(), 300);
    }

    #[tokio::test]
    async fn test_group_lookup() {
        let store = Store::new();
        let group = store.create_group("Squad").await.unwrap();
        assert_eq!(group.id, 1);

        let found = store
            .get_group_by_invite_code(&group.invite_code)
            .await
            .unwrap();
        assert_eq!(found, Some(group.clone()));
        assert_eq!(store.get_group_by_id(1).await.unwrap(), Some(group));
        assert!(store.get_group_by_id(2).await.unwrap().is_none());
        assert!(store.get_group_by_invite_code("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_group_name_rejected() {
        let store = Store::new();
        let err = store.create_group("  ").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_users_scoped_by_group() {
        let store = Store::new();
        let a = store.create_group("A").await.unwrap();
        let b = store.create_group("B").await.unwrap();

        let al_a = store.create_user("al", "pw", a.id).await.unwrap();
        let al_b = store.create_user("al", "other", b.id).await.unwrap();
        assert_eq!(al_a.points, 0);
        assert_ne!(al_a.id, al_b.id);

        let found = store
            .get_user_by_username_and_group("al", b.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.password, "other");
        assert!(
            store
                .get_user_by_username_and_group("bo", a.id)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_update_points_missing_user() {
        let store = Store::new();
        let err = store.update_user_points(42, 10).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "User", id: 42 }));
    }

    #[tokio::test]
    async fn test_leaderboard_order_keeps_ties_in_join_order() {
        let store = Store::new();
        let group = store.create_group("Squad").await.unwrap();
        let first = store.create_user("first", "pw", group.id).await.unwrap();
        let second = store.create_user("second", "pw", group.id).await.unwrap();
        let third = store.create_user("third", "pw", group.id).await.unwrap();
        store.create_user("elsewhere", "pw", group.id + 1).await.unwrap();

        store.update_user_points(first.id, 10).await.unwrap();
        store.update_user_points(second.id, 30).await.unwrap();
        store.update_user_points(third.id, 10).await.unwrap();

        let names: Vec<String> = store
            .get_users_by_group(group.id)
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(names, vec!["second", "first", "third"]);
    }

    #[tokio::test]
    async fn test_delete_challenge_keeps_completions() {
        let store = Store::new();
        let group = store.create_group("Squad").await.unwrap();
        let user = store.create_user("al", "pw", group.id).await.unwrap();
        let challenge = store.create_challenge(run_5k(group.id, 50)).await.unwrap();
        store.create_completion(user.id, challenge.id).await.unwrap();

        assert!(store.delete_challenge(challenge.id).await.unwrap());
        assert!(!store.delete_challenge(challenge.id).await.unwrap());
        assert!(store.get_challenges_by_group(group.id).await.unwrap().is_empty());

        assert_eq!(store.get_completions_by_challenge(challenge.id).await.unwrap().len(), 1);
        assert_eq!(store.get_completions_by_user(user.id).await.unwrap().len(), 1);
        assert!(store.is_user_challenge_completed(user.id, challenge.id).await.unwrap());

        // Ids are not reused after a delete.
        let next = store.create_challenge(run_5k(group.id, 5)).await.unwrap();
        assert_eq!(next.id, challenge.id + 1);
    }

    #[tokio::test]
    async fn test_complete_challenge_awards_once() {
        let store = Store::new();
        let group = store.create_group("Squad").await.unwrap();
        let user = store.create_user("al", "pw", group.id).await.unwrap();
        let challenge = store.create_challenge(run_5k(group.id, 50)).await.unwrap();

        let (completion, updated) = store.complete_challenge(user.id, challenge.id).await.unwrap();
        assert_eq!(completion.challenge_id, challenge.id);
        assert_eq!(updated.points, 50);

        let err = store.complete_challenge(user.id, challenge.id).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyCompleted));

        let user = store.get_user_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(user.points, 50);
        assert_eq!(store.get_completions_by_user(user.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_complete_missing_challenge() {
        let store = Store::new();
        let group = store.create_group("Squad").await.unwrap();
        let user = store.create_user("al", "pw", group.id).await.unwrap();
        let err = store.complete_challenge(user.id, 9).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "Challenge", .. }));
        assert!(store.get_completions_by_user(user.id).await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_completions_do_not_lose_points() {
        let store = Arc::new(Store::new());
        let group = store.create_group("Squad").await.unwrap();
        let user_id = store.create_user("al", "pw", group.id).await.unwrap().id;

        let mut ids = Vec::new();
        for points in 1..=40 {
            ids.push(store.create_challenge(run_5k(group.id, points)).await.unwrap().id);
        }

        let handles: Vec<_> = ids
            .into_iter()
            .map(|challenge_id| {
                let store = store.clone();
                tokio::spawn(async move { store.complete_challenge(user_id, challenge_id).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let user = store.get_user_by_id(user_id).await.unwrap().unwrap();
        assert_eq!(user.points, (1..=40).sum::<i64>());
    }
}
