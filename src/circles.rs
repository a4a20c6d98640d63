use crate::api::ApiClient;
use crate::errors::ApiError;
use crate::models::{Circle, CircleMember};
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::info;

pub const MAX_BUDDIES: usize = 3;
const MAX_NAME_LEN: usize = 60;

#[derive(Debug, thiserror::Error)]
pub enum CircleError {
    #[error("Circle name must be between 1 and 60 characters")]
    InvalidName,
    #[error("You can choose at most 3 buddies")]
    TooManyBuddies,
    #[error("{0} is not a member of this circle")]
    UnknownMember(String),
    #[error("Join the circle before choosing buddies")]
    NotAMember,
    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Debug, Default)]
struct Inner {
    circles: Vec<Circle>,
    members: HashMap<String, Vec<CircleMember>>,
    buddies: HashMap<String, Vec<String>>,
}

impl Inner {
    fn upsert(&mut self, circle: Circle) {
        match self.circles.iter_mut().find(|existing| existing.id == circle.id) {
            Some(existing) => *existing = circle,
            None => self.circles.push(circle),
        }
    }
}

#[derive(Debug, Default)]
pub struct CirclesStore {
    inner: Mutex<Inner>,
}

/// Dedupes `requested` and checks it against the cap and the known members.
pub fn validate_buddies(
    members: Option<&[CircleMember]>,
    requested: &[String],
) -> Result<Vec<String>, CircleError> {
    let mut buddies: Vec<String> = Vec::with_capacity(requested.len());
    for id in requested.iter().map(|id| id.trim()).filter(|id| !id.is_empty()) {
        if !buddies.iter().any(|existing| existing == id) {
            buddies.push(id.to_string());
        }
    }
    if buddies.len() > MAX_BUDDIES {
        return Err(CircleError::TooManyBuddies);
    }
    if let Some(members) = members {
        if let Some(unknown) = buddies
            .iter()
            .find(|id| !members.iter().any(|member| &member.user_id == *id))
        {
            return Err(CircleError::UnknownMember(unknown.clone()));
        }
    }
    Ok(buddies)
}

impl CirclesStore {
    pub async fn circles(&self) -> Vec<Circle> {
        self.inner.lock().await.circles.clone()
    }

    pub async fn buddies(&self, circle_id: &str) -> Vec<String> {
        self.inner
            .lock()
            .await
            .buddies
            .get(circle_id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn refresh(&self, api: &ApiClient) -> Result<Vec<Circle>, ApiError> {
        let circles = api.circles().await?;
        self.inner.lock().await.circles = circles.clone();
        Ok(circles)
    }

    pub async fn create(
        &self,
        api: &ApiClient,
        name: &str,
        description: Option<&str>,
    ) -> Result<Circle, CircleError> {
        let name = name.trim();
        if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
            return Err(CircleError::InvalidName);
        }
        let circle = api.create_circle(name, description).await?;
        info!("created circle {} ({})", circle.id, circle.name);
        self.inner.lock().await.upsert(circle.clone());
        Ok(circle)
    }

    pub async fn join(&self, api: &ApiClient, circle_id: &str) -> Result<Circle, CircleError> {
        let mut circle = api.join_circle(circle_id).await?;
        circle.is_member = true;
        info!("joined circle {circle_id}");
        self.inner.lock().await.upsert(circle.clone());
        Ok(circle)
    }

    pub async fn leave(&self, api: &ApiClient, circle_id: &str) -> Result<(), CircleError> {
        api.leave_circle(circle_id).await?;
        info!("left circle {circle_id}");
        let mut inner = self.inner.lock().await;
        if let Some(circle) = inner.circles.iter_mut().find(|circle| circle.id == circle_id) {
            circle.is_member = false;
            circle.member_count = circle.member_count.saturating_sub(1);
        }
        inner.members.remove(circle_id);
        inner.buddies.remove(circle_id);
        Ok(())
    }

    pub async fn members(
        &self,
        api: &ApiClient,
        circle_id: &str,
    ) -> Result<Vec<CircleMember>, CircleError> {
        let members = api.circle_members(circle_id).await?;
        self.inner
            .lock()
            .await
            .members
            .insert(circle_id.to_string(), members.clone());
        Ok(members)
    }

    pub async fn set_buddies(
        &self,
        api: &ApiClient,
        circle_id: &str,
        requested: &[String],
    ) -> Result<Vec<String>, CircleError> {
        let buddies = {
            let inner = self.inner.lock().await;
            let known = inner.circles.iter().find(|circle| circle.id == circle_id);
            if known.is_some_and(|circle| !circle.is_member) {
                return Err(CircleError::NotAMember);
            }
            validate_buddies(inner.members.get(circle_id).map(Vec::as_slice), requested)?
        };

        api.set_buddies(circle_id, &buddies).await?;
        self.inner
            .lock()
            .await
            .buddies
            .insert(circle_id.to_string(), buddies.clone());
        Ok(buddies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(id: &str) -> CircleMember {
        CircleMember {
            user_id: id.to_string(),
            display_name: format!("user {id}"),
            fasting: false,
            fast_started_at: None,
        }
    }

    #[test]
    fn buddies_are_deduped_and_capped() {
        let members = vec![member("a"), member("b"), member("c"), member("d")];
        let ids: Vec<String> = ["a", "b", "a", " c "].iter().map(|s| s.to_string()).collect();
        assert_eq!(validate_buddies(Some(&members), &ids).unwrap(), vec!["a", "b", "c"]);

        let too_many: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        assert!(matches!(
            validate_buddies(Some(&members), &too_many),
            Err(CircleError::TooManyBuddies)
        ));
    }

    #[test]
    fn buddies_must_be_members_when_known() {
        let members = vec![member("a")];
        let ids = vec!["z".to_string()];
        assert!(matches!(
            validate_buddies(Some(&members), &ids),
            Err(CircleError::UnknownMember(id)) if id == "z"
        ));
        assert_eq!(validate_buddies(None, &ids).unwrap(), vec!["z"]);
    }
}
