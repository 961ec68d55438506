use tracing::info;

use super::validation::{optional_text, parse_id, resolve_identity};
use super::{store_failure, ApiError, ReportsApi};
use crate::models::{Profile, ProfileChanges, ProfileInput, UpsertProfile};
use crate::session::Session;

fn upsert_body(id: uuid::Uuid, input: ProfileInput) -> UpsertProfile {
    UpsertProfile {
        id,
        full_name: optional_text(input.full_name),
        avatar_url: optional_text(input.avatar_url),
    }
}

impl ReportsApi {
    /// Inserts the profile row for `profile_id`, or the session's user when
    /// none is given.
    pub async fn create_profile(
        &self,
        session: &Session,
        profile_id: Option<&str>,
        input: ProfileInput,
    ) -> Result<Profile, ApiError> {
        let id = resolve_identity("profile id", profile_id, session)?;
        let profile = self
            .store
            .insert_profile(session, upsert_body(id, input))
            .await
            .map_err(|err| store_failure("create_profile", "profile", err))?;
        info!(profile_id = %profile.id, "profile created");
        Ok(profile)
    }

    /// Insert, or merge into an existing row with the same id.
    pub async fn upsert_profile(
        &self,
        session: &Session,
        profile_id: Option<&str>,
        input: ProfileInput,
    ) -> Result<Profile, ApiError> {
        let id = resolve_identity("profile id", profile_id, session)?;
        let profile = self
            .store
            .upsert_profile(session, upsert_body(id, input))
            .await
            .map_err(|err| store_failure("upsert_profile", "profile", err))?;
        info!(profile_id = %profile.id, "profile upserted");
        Ok(profile)
    }

    pub async fn get_profile(
        &self,
        session: &Session,
        profile_id: &str,
    ) -> Result<Profile, ApiError> {
        let id = parse_id("profile id", profile_id)?;
        self.store
            .find_profile(session, id)
            .await
            .map_err(|err| store_failure("get_profile", "profile", err))
    }

    pub async fn update_profile(
        &self,
        session: &Session,
        profile_id: &str,
        input: ProfileInput,
    ) -> Result<Profile, ApiError> {
        let id = parse_id("profile id", profile_id)?;
        let changes = ProfileChanges {
            full_name: optional_text(input.full_name),
            avatar_url: optional_text(input.avatar_url),
        };
        if changes.is_empty() {
            return Err(ApiError::Validation(
                "at least one of full name or avatar url is required".into(),
            ));
        }

        let profile = self
            .store
            .update_profile(session, id, changes)
            .await
            .map_err(|err| store_failure("update_profile", "profile", err))?;
        info!(profile_id = %profile.id, "profile updated");
        Ok(profile)
    }

    /// Profile of whoever owns the session. `Ok(None)` when the user has no
    /// profile row yet.
    pub async fn get_current_user_profile(
        &self,
        session: &Session,
    ) -> Result<Option<Profile>, ApiError> {
        if !session.is_authenticated() {
            return Err(ApiError::Unauthenticated);
        }

        let user = self
            .store
            .current_user(session)
            .await
            .map_err(|err| store_failure("get_current_user_profile", "user", err))?;

        match self.store.find_profile(session, user.id).await {
            Ok(profile) => Ok(Some(profile)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(store_failure("get_current_user_profile", "profile", err)),
        }
    }
}
