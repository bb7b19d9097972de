//! Canonical artist identity for releases and confirmed renames.

use crate::catalog_store::{ArtistGroupMember, CatalogStore, GROUP_KEY_SEPARATOR};
use crate::errors::{TuneCapsuleError, TuneCapsuleResult};
use crate::providers::AlbumMetadata;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, warn};

/// Asked before an artist's stored display name is replaced.
pub trait RenameConfirmation: Send + Sync {
    fn confirm_rename(&self, artist_id: &str, old_name: &str, new_name: &str) -> bool;
}

/// Album artists sorted by id, with the group key derived from those ids.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CanonicalArtists {
    pub group_key: String,
    /// `(artist id, display name)` in id order.
    pub members: Vec<(String, String)>,
}

impl CanonicalArtists {
    pub fn from_album(album: &AlbumMetadata) -> TuneCapsuleResult<Self> {
        let mut by_id = BTreeMap::new();
        for artist in &album.artists {
            if artist.id.is_empty() || artist.id.contains(GROUP_KEY_SEPARATOR) {
                return Err(TuneCapsuleError::UpstreamData(format!(
                    "Album {} has an unusable artist id '{}'",
                    album.id, artist.id
                )));
            }
            by_id.entry(artist.id.clone()).or_insert_with(|| artist.name.clone());
        }
        if by_id.is_empty() {
            return Err(TuneCapsuleError::UpstreamData(format!(
                "Album {} lists no artists",
                album.id
            )));
        }

        let members: Vec<(String, String)> = by_id.into_iter().collect();
        let group_key = members
            .iter()
            .map(|(id, _)| id.as_str())
            .collect::<Vec<_>>()
            .join(&GROUP_KEY_SEPARATOR.to_string());
        Ok(CanonicalArtists { group_key, members })
    }

    pub fn names(&self) -> Vec<String> {
        self.members.iter().map(|(_, name)| name.clone()).collect()
    }
}

/// Records the group on first sighting; afterwards validates membership
/// and applies confirmed renames.
pub fn ensure_artist_group(
    store: &dyn CatalogStore,
    artists: &CanonicalArtists,
    confirmation: &dyn RenameConfirmation,
) -> TuneCapsuleResult<()> {
    let stored = store.artist_group_members(&artists.group_key)?;
    if stored.is_empty() {
        for (artist_id, artist_name) in &artists.members {
            store.insert_artist_group_member(&ArtistGroupMember {
                artist_group: artists.group_key.clone(),
                artist_name: artist_name.clone(),
                artist_id: artist_id.clone(),
            })?;
        }
        info!("Registered artist group {}", artists.group_key);
        return Ok(());
    }

    let stored_ids: BTreeSet<&str> = stored.iter().map(|m| m.artist_id.as_str()).collect();
    let new_ids: BTreeSet<&str> = artists.members.iter().map(|(id, _)| id.as_str()).collect();
    if stored_ids != new_ids {
        return Err(TuneCapsuleError::UpstreamData(format!(
            "Membership of artist group {} changed from {:?} to {:?}",
            artists.group_key, stored_ids, new_ids
        )));
    }

    for (artist_id, new_name) in &artists.members {
        let Some(member) = stored.iter().find(|m| &m.artist_id == artist_id) else {
            continue;
        };
        if &member.artist_name == new_name {
            continue;
        }
        if !confirmation.confirm_rename(artist_id, &member.artist_name, new_name) {
            warn!(
                "Rename of artist {} from '{}' to '{}' refused",
                artist_id, member.artist_name, new_name
            );
            return Err(TuneCapsuleError::NameConflict(format!(
                "artist {} is stored as '{}' but now appears as '{}'",
                artist_id, member.artist_name, new_name
            )));
        }
        store.rename_artist(artist_id, &member.artist_name, new_name)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog_store::SqliteCatalogStore;
    use crate::providers::AlbumArtist;

    struct Answer(bool);

    impl RenameConfirmation for Answer {
        fn confirm_rename(&self, _: &str, _: &str, _: &str) -> bool {
            self.0
        }
    }

    fn album_with(artists: &[(&str, &str)]) -> AlbumMetadata {
        AlbumMetadata {
            id: "alb".to_string(),
            name: "Album".to_string(),
            release_date: "2020".to_string(),
            artists: artists
                .iter()
                .map(|(name, id)| AlbumArtist {
                    name: name.to_string(),
                    id: id.to_string(),
                })
                .collect(),
            tracks: vec![],
        }
    }

    #[test]
    fn test_group_key_is_sorted_ids() {
        let artists =
            CanonicalArtists::from_album(&album_with(&[("Zed", "b2"), ("Amy", "a1")])).unwrap();
        assert_eq!(artists.group_key, "a1+b2");
        assert_eq!(artists.names(), vec!["Amy", "Zed"]);
    }

    #[test]
    fn test_album_without_artists_is_upstream_error() {
        assert!(matches!(
            CanonicalArtists::from_album(&album_with(&[])),
            Err(TuneCapsuleError::UpstreamData(_))
        ));
    }

    #[test]
    fn test_first_sighting_stores_members() {
        let store = SqliteCatalogStore::in_memory().unwrap();
        let artists =
            CanonicalArtists::from_album(&album_with(&[("Zed", "b2"), ("Amy", "a1")])).unwrap();
        ensure_artist_group(&store, &artists, &Answer(false)).unwrap();

        let members = store.artist_group_members("a1+b2").unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].artist_name, "Amy");

        // Same names again is a no-op
        ensure_artist_group(&store, &artists, &Answer(false)).unwrap();
    }

    #[test]
    fn test_refused_rename_is_name_conflict() {
        let store = SqliteCatalogStore::in_memory().unwrap();
        let original = CanonicalArtists::from_album(&album_with(&[("Amy", "a1")])).unwrap();
        ensure_artist_group(&store, &original, &Answer(true)).unwrap();

        let renamed = CanonicalArtists::from_album(&album_with(&[("Amelia", "a1")])).unwrap();
        let result = ensure_artist_group(&store, &renamed, &Answer(false));
        assert!(matches!(result, Err(TuneCapsuleError::NameConflict(_))));
        assert_eq!(store.artist_group_members("a1").unwrap()[0].artist_name, "Amy");
    }

    #[test]
    fn test_confirmed_rename_updates_group() {
        let store = SqliteCatalogStore::in_memory().unwrap();
        let original = CanonicalArtists::from_album(&album_with(&[("Amy", "a1")])).unwrap();
        ensure_artist_group(&store, &original, &Answer(true)).unwrap();

        let renamed = CanonicalArtists::from_album(&album_with(&[("Amelia", "a1")])).unwrap();
        ensure_artist_group(&store, &renamed, &Answer(true)).unwrap();
        assert_eq!(
            store.artist_group_members("a1").unwrap()[0].artist_name,
            "Amelia"
        );
    }

    #[test]
    fn test_changed_membership_is_upstream_error() {
        let store = SqliteCatalogStore::in_memory().unwrap();
        store
            .insert_artist_group_member(&ArtistGroupMember {
                artist_group: "a1+b2".to_string(),
                artist_name: "Amy".to_string(),
                artist_id: "a1".to_string(),
            })
            .unwrap();

        let artists =
            CanonicalArtists::from_album(&album_with(&[("Zed", "b2"), ("Amy", "a1")])).unwrap();
        assert!(matches!(
            ensure_artist_group(&store, &artists, &Answer(true)),
            Err(TuneCapsuleError::UpstreamData(_))
        ));
    }
}
