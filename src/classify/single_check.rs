//! Detects releases whose tracks are wholly contained in another release
//! of the same artists, so tracks are not credited twice.

use crate::catalog_store::{group_member_ids, CatalogStore, Release, ReleaseKey, SingleLink};
use anyhow::Result;
use std::collections::HashSet;
use tracing::{debug, info};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SingleCheck {
    /// The new ranking should be inserted.
    Insert,
    /// The new ranking is a single of this equal-or-better ranked album.
    Absorbed(ReleaseKey),
}

fn related_rankings(store: &dyn CatalogStore, release: &Release) -> Result<Vec<Release>> {
    let own_key = release.key();
    let mut seen = HashSet::new();
    let mut related = Vec::new();
    for artist_id in group_member_ids(&release.artist_group) {
        for existing in store.rankings_with_artist(artist_id)? {
            let key = existing.key();
            if key != own_key && seen.insert(key) {
                related.push(existing);
            }
        }
    }
    Ok(related)
}

/// Runs before a new ranking is inserted. Removes or links existing rankings
/// that are singles of `new`, and reports whether `new` is itself absorbed.
pub fn single_check(store: &dyn CatalogStore, new: &Release) -> Result<SingleCheck> {
    let Some(new_rank) = new.ranking() else {
        return Ok(SingleCheck::Insert);
    };
    let related: Vec<(Release, _)> = related_rankings(store, new)?
        .into_iter()
        .filter_map(|existing| existing.ranking().map(|rank| (existing, rank)))
        .collect();

    // Absorption is decided before anything is written.
    for (existing, existing_rank) in &related {
        if !existing.tracks_contained_in(new)
            && new.tracks_contained_in(existing)
            && *existing_rank >= new_rank
        {
            info!("{} is absorbed by {}", new.key(), existing.key());
            return Ok(SingleCheck::Absorbed(existing.key()));
        }
    }

    for (existing, existing_rank) in &related {
        if existing.tracks_contained_in(new) {
            if new_rank >= *existing_rank {
                info!("Removing single {} now credited via {}", existing.key(), new.key());
                store.delete_ranking(&existing.key())?;
            } else {
                debug!("Linking single {} to album {}", existing.key(), new.key());
                store.store_single_link(&SingleLink::between(existing, new))?;
            }
        } else if new.tracks_contained_in(existing) {
            debug!("Linking single {} to album {}", new.key(), existing.key());
            store.store_single_link(&SingleLink::between(new, existing))?;
        }
    }
    Ok(SingleCheck::Insert)
}
