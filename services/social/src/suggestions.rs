//! Suggested users
//!
//! Candidates come from a one-hop expansion of the requester's graph: every
//! follower or followee of anyone the requester follows or is followed by.
//! Users the requester already follows, and the requester, are dropped. When
//! the graph yields fewer than the limit, the remainder is a uniform random
//! sample of everyone else. Ordering carries no meaning.

use std::collections::HashSet;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::{Connections, UserSummary},
    repositories::SocialStore,
};

/// Ids of users adjacent to the requester, deduplicated in first-seen order
pub fn relevant_ids(mine: &Connections) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    mine.following
        .iter()
        .chain(mine.followers.iter())
        .copied()
        .filter(|id| seen.insert(*id))
        .collect()
}

/// Second-hop ids, minus the requester and everyone already followed
pub fn candidate_ids(me: Uuid, mine: &Connections, neighbours: &[Connections]) -> Vec<Uuid> {
    let excluded: HashSet<Uuid> = mine
        .following
        .iter()
        .copied()
        .chain(std::iter::once(me))
        .collect();

    let mut seen = HashSet::new();
    neighbours
        .iter()
        .flat_map(|c| c.followers.iter().chain(c.following.iter()))
        .copied()
        .filter(|id| !excluded.contains(id))
        .filter(|id| seen.insert(*id))
        .collect()
}

/// Up to `limit` users for `user_id` to consider following
pub async fn suggested_users(
    store: &dyn SocialStore,
    user_id: Uuid,
    limit: usize,
) -> ApiResult<Vec<UserSummary>> {
    if store.find_user_by_id(user_id).await?.is_none() {
        return Err(ApiError::user_not_found());
    }

    let mine = store
        .load_connections(&[user_id])
        .await?
        .pop()
        .unwrap_or_default();

    let relevant = relevant_ids(&mine);
    let neighbours = if relevant.is_empty() {
        Vec::new()
    } else {
        store.load_connections(&relevant).await?
    };

    let candidates = candidate_ids(user_id, &mine, &neighbours);
    let mut suggested = store.find_summaries(&candidates, limit).await?;
    let from_graph = suggested.len();

    if suggested.len() < limit {
        let exclude: Vec<Uuid> = mine
            .following
            .iter()
            .copied()
            .chain(std::iter::once(user_id))
            .chain(suggested.iter().map(|u| u.id))
            .collect();
        let backfill = store
            .sample_summaries(&exclude, limit - suggested.len())
            .await?;
        suggested.extend(backfill);
    }

    info!(
        "Suggested {} users to {} ({} from graph)",
        suggested.len(),
        user_id,
        from_graph
    );
    Ok(suggested)
}
