use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::explore::{self, ExploreError, PageRequest};
use crate::models::{
    CreatePlaylistRequest, CreateVideoRequest, FollowId, FollowResponse, Playlist, PlaylistId,
    PlaylistResponse, RegisterRequest, Tag, TagId, TagResponse, UpdatePlaylistRequest,
    UpdateProfileRequest, UpdateVideoRequest, User, UserFollow, UserId, UserProfile, UserSummary,
    Video, VideoId,
};

pub const MAX_TAG_LENGTH: usize = 50;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Invalid(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderField {
    CreatedAt,
    UpdatedAt,
    Title,
    Popularity,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaylistOrdering {
    pub field: OrderField,
    pub descending: bool,
}

impl PlaylistOrdering {
    pub const NEWEST: Self = Self {
        field: OrderField::CreatedAt,
        descending: true,
    };
    pub const POPULAR: Self = Self {
        field: OrderField::Popularity,
        descending: true,
    };
}

impl Default for PlaylistOrdering {
    fn default() -> Self {
        Self::NEWEST
    }
}

impl FromStr for PlaylistOrdering {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (descending, name) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let field = match name {
            "created_at" => OrderField::CreatedAt,
            "updated_at" => OrderField::UpdatedAt,
            "title" => OrderField::Title,
            _ => return Err(format!("Unsupported ordering: {}", s)),
        };
        Ok(Self { field, descending })
    }
}

/// Which playlists a listing draws from, relative to the viewer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scope {
    /// Public playlists plus the viewer's own.
    Visible,
    Public,
    OwnedBy(UserId),
    PublicOwnedBy(UserId),
    LikedByViewer,
}

#[derive(Clone, Debug, Default)]
pub struct Listing {
    pub scope: Option<Scope>,
    /// Lower-cased substring matched against title and description.
    pub search: Option<String>,
    pub search_tags: bool,
    pub ordering: PlaylistOrdering,
    pub limit: Option<usize>,
}

impl Listing {
    pub fn of(scope: Scope) -> Self {
        Self {
            scope: Some(scope),
            ..Self::default()
        }
    }
}

#[derive(Default)]
struct Sequences {
    user: i64,
    playlist: i64,
    video: i64,
    tag: i64,
    follow: i64,
}

fn next(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

#[derive(Default)]
struct Tables {
    ids: Sequences,
    users: BTreeMap<UserId, User>,
    playlists: BTreeMap<PlaylistId, Playlist>,
    videos: BTreeMap<VideoId, Video>,
    tags: BTreeMap<TagId, Tag>,
    follows: BTreeMap<FollowId, UserFollow>,
}

/// In-process storage for every entity the API serves.
///
/// One lock guards all tables, so each method observes and updates a
/// consistent snapshot; counters and toggles never lose concurrent updates.
#[derive(Default)]
pub struct Store {
    tables: RwLock<Tables>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    // Users

    pub async fn create_user(&self, request: &RegisterRequest) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        tables.ensure_username_free(&request.username, None)?;
        if tables
            .users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&request.email))
        {
            return Err(StoreError::Conflict(
                "A user with that email already exists.".to_string(),
            ));
        }

        let id = next(&mut tables.ids.user);
        let user = User {
            id,
            email: request.email.clone(),
            username: request.username.clone(),
            first_name: request.first_name.clone(),
            last_name: request.last_name.clone(),
            profile_picture: request.profile_picture.clone(),
            date_joined: Utc::now(),
        };
        tables.users.insert(id, user.clone());
        Ok(user)
    }

    pub async fn user(&self, id: UserId) -> Option<User> {
        self.tables.read().await.users.get(&id).cloned()
    }

    pub async fn profile(&self, id: UserId) -> Option<UserProfile> {
        let tables = self.tables.read().await;
        tables.users.get(&id).map(|user| tables.profile(user))
    }

    pub async fn profile_by_username(&self, username: &str) -> Option<UserProfile> {
        let tables = self.tables.read().await;
        tables
            .user_by_username(username)
            .map(|user| tables.profile(user))
    }

    pub async fn update_user(
        &self,
        id: UserId,
        changes: &UpdateProfileRequest,
    ) -> StoreResult<UserProfile> {
        let mut tables = self.tables.write().await;
        if let Some(username) = &changes.username {
            tables.ensure_username_free(username, Some(id))?;
        }

        let user = tables.users.get_mut(&id).ok_or(StoreError::NotFound("User"))?;
        if let Some(username) = &changes.username {
            user.username = username.clone();
        }
        if let Some(first_name) = &changes.first_name {
            user.first_name = first_name.clone();
        }
        if let Some(last_name) = &changes.last_name {
            user.last_name = last_name.clone();
        }
        if let Some(picture) = &changes.profile_picture {
            user.profile_picture = picture.clone();
        }

        let user = user.clone();
        Ok(tables.profile(&user))
    }

    // Playlists

    pub async fn create_playlist(
        &self,
        owner: UserId,
        request: &CreatePlaylistRequest,
    ) -> StoreResult<PlaylistResponse> {
        let mut tables = self.tables.write().await;
        let tags = tables.resolve_tags(&request.tags)?;

        let now = Utc::now();
        let id = next(&mut tables.ids.playlist);
        let playlist = Playlist {
            id,
            title: request.title.clone(),
            description: request.description.clone(),
            cover_image: request.cover_image.clone(),
            owner,
            created_at: now,
            updated_at: now,
            is_public: request.is_public,
            view_count: 0,
            share_count: 0,
            likes: Vec::new(),
            tags,
        };
        let response = tables.render(&playlist, owner);
        tables.playlists.insert(id, playlist);
        Ok(response)
    }

    pub async fn list_playlists(&self, viewer: UserId, listing: &Listing) -> Vec<PlaylistResponse> {
        let tables = self.tables.read().await;
        let scope = listing.scope.unwrap_or(Scope::Visible);

        let mut selected: Vec<&Playlist> = tables
            .playlists
            .values()
            .filter(|p| match scope {
                Scope::Visible => p.visible_to(viewer),
                Scope::Public => p.is_public,
                Scope::OwnedBy(owner) => p.owner == owner && p.visible_to(viewer),
                Scope::PublicOwnedBy(owner) => p.owner == owner && p.is_public,
                Scope::LikedByViewer => p.is_liked_by(viewer) && p.visible_to(viewer),
            })
            .filter(|p| match &listing.search {
                Some(needle) => tables.matches(p, needle, listing.search_tags),
                None => true,
            })
            .collect();

        sort_playlists(&mut selected, listing.ordering);
        if let Some(limit) = listing.limit {
            selected.truncate(limit);
        }

        selected
            .into_iter()
            .map(|p| tables.render(p, viewer))
            .collect()
    }

    /// Looks up a visible playlist and counts the view.
    pub async fn view_playlist(
        &self,
        viewer: UserId,
        id: PlaylistId,
    ) -> StoreResult<PlaylistResponse> {
        let mut tables = self.tables.write().await;
        let playlist = tables.visible_playlist_mut(viewer, id)?;
        playlist.view_count = playlist.view_count.saturating_add(1);
        let playlist = playlist.clone();
        Ok(tables.render(&playlist, viewer))
    }

    pub async fn update_playlist(
        &self,
        viewer: UserId,
        id: PlaylistId,
        changes: &UpdatePlaylistRequest,
    ) -> StoreResult<PlaylistResponse> {
        let mut tables = self.tables.write().await;
        tables.owned_playlist(viewer, id, "You do not have permission to modify this playlist.")?;
        let tags = match &changes.tags {
            Some(names) => Some(tables.resolve_tags(names)?),
            None => None,
        };

        let playlist = tables
            .playlists
            .get_mut(&id)
            .ok_or(StoreError::NotFound("Playlist"))?;
        if let Some(title) = &changes.title {
            playlist.title = title.clone();
        }
        if let Some(description) = &changes.description {
            playlist.description = description.clone();
        }
        if let Some(cover) = &changes.cover_image {
            playlist.cover_image = cover.clone();
        }
        if let Some(is_public) = changes.is_public {
            playlist.is_public = is_public;
        }
        if let Some(tags) = tags {
            playlist.tags = tags;
        }
        playlist.updated_at = Utc::now();

        let playlist = playlist.clone();
        Ok(tables.render(&playlist, viewer))
    }

    pub async fn delete_playlist(&self, viewer: UserId, id: PlaylistId) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        tables.owned_playlist(viewer, id, "You do not have permission to delete this playlist.")?;
        tables.playlists.remove(&id);
        tables.videos.retain(|_, v| v.playlist != id);
        Ok(())
    }

    /// Returns whether the viewer likes the playlist afterwards.
    pub async fn toggle_like(&self, viewer: UserId, id: PlaylistId) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let playlist = tables.visible_playlist_mut(viewer, id)?;
        if let Some(pos) = playlist.likes.iter().position(|&u| u == viewer) {
            playlist.likes.remove(pos);
            Ok(false)
        } else {
            playlist.likes.push(viewer);
            Ok(true)
        }
    }

    pub async fn record_share(&self, viewer: UserId, id: PlaylistId) -> StoreResult<u32> {
        let mut tables = self.tables.write().await;
        let playlist = tables.visible_playlist_mut(viewer, id)?;
        playlist.share_count = playlist.share_count.saturating_add(1);
        Ok(playlist.share_count)
    }

    /// One explore page, drawn from public playlists that hold at least one video.
    pub async fn explore(
        &self,
        request: &PageRequest,
    ) -> Result<Vec<PlaylistResponse>, ExploreError> {
        let tables = self.tables.read().await;
        let with_videos: HashSet<PlaylistId> = tables.videos.values().map(|v| v.playlist).collect();
        let eligible: Vec<&Playlist> = tables
            .playlists
            .values()
            .filter(|p| p.is_public && with_videos.contains(&p.id))
            .collect();

        let page = explore::paginate(eligible, request)?;
        Ok(page
            .into_iter()
            .map(|p| tables.render(p, request.user_id))
            .collect())
    }

    // Videos

    pub async fn list_videos(&self, viewer: UserId, playlist: Option<PlaylistId>) -> Vec<Video> {
        let tables = self.tables.read().await;
        let mut videos: Vec<Video> = tables
            .videos
            .values()
            .filter(|v| playlist.map_or(true, |id| v.playlist == id))
            .filter(|v| {
                tables
                    .playlists
                    .get(&v.playlist)
                    .is_some_and(|p| p.visible_to(viewer))
            })
            .cloned()
            .collect();
        videos.sort_by(|a, b| {
            a.order
                .cmp(&b.order)
                .then(a.added_at.cmp(&b.added_at))
                .then(a.id.cmp(&b.id))
        });
        videos
    }

    pub async fn add_video(
        &self,
        viewer: UserId,
        request: &CreateVideoRequest,
        tiktok_id: String,
    ) -> StoreResult<Video> {
        let mut tables = self.tables.write().await;
        tables.owned_playlist(
            viewer,
            request.playlist,
            "You do not have permission to add videos to this playlist.",
        )?;

        let order = request
            .order
            .unwrap_or_else(|| tables.video_count(request.playlist) as u32);
        let now = Utc::now();
        let id = next(&mut tables.ids.video);
        let video = Video {
            id,
            title: request.title.clone(),
            tiktok_url: request.tiktok_url.clone(),
            tiktok_id,
            thumbnail_url: request.thumbnail_url.clone(),
            playlist: request.playlist,
            added_at: now,
            order,
        };
        tables.videos.insert(id, video.clone());
        if let Some(playlist) = tables.playlists.get_mut(&request.playlist) {
            playlist.updated_at = now;
        }
        Ok(video)
    }

    pub async fn video(&self, viewer: UserId, id: VideoId) -> StoreResult<Video> {
        let tables = self.tables.read().await;
        tables
            .videos
            .get(&id)
            .filter(|v| {
                tables
                    .playlists
                    .get(&v.playlist)
                    .is_some_and(|p| p.visible_to(viewer))
            })
            .cloned()
            .ok_or(StoreError::NotFound("Video"))
    }

    pub async fn update_video(
        &self,
        viewer: UserId,
        id: VideoId,
        changes: &UpdateVideoRequest,
    ) -> StoreResult<Video> {
        let mut tables = self.tables.write().await;
        let playlist = tables.video_playlist(viewer, id)?;
        tables.owned_playlist(
            viewer,
            playlist,
            "You do not have permission to modify this video.",
        )?;

        let video = tables.videos.get_mut(&id).ok_or(StoreError::NotFound("Video"))?;
        if let Some(title) = &changes.title {
            video.title = title.clone();
        }
        if let Some(thumbnail) = &changes.thumbnail_url {
            video.thumbnail_url = thumbnail.clone();
        }
        if let Some(order) = changes.order {
            video.order = order;
        }
        Ok(video.clone())
    }

    pub async fn delete_video(&self, viewer: UserId, id: VideoId) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let playlist = tables.video_playlist(viewer, id)?;
        tables.owned_playlist(
            viewer,
            playlist,
            "You do not have permission to delete this video.",
        )?;
        tables.videos.remove(&id);
        Ok(())
    }

    // Tags

    pub async fn tags(&self) -> Vec<TagResponse> {
        let tables = self.tables.read().await;
        let mut tags: Vec<TagResponse> = tables.tags.values().map(tag_response).collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        tags
    }

    pub async fn autocomplete_tags(&self, prefix: &str, limit: usize) -> Vec<TagResponse> {
        let prefix = prefix.trim().to_lowercase();
        let mut tags = self.tags().await;
        tags.retain(|t| t.name.starts_with(&prefix));
        tags.truncate(limit);
        tags
    }

    // Follows

    pub async fn follows_involving(&self, user: UserId) -> Vec<FollowResponse> {
        let tables = self.tables.read().await;
        tables
            .follows
            .values()
            .filter(|f| f.follower == user || f.followed == user)
            .map(|f| tables.follow_response(f))
            .collect()
    }

    pub async fn follow(&self, follower: UserId, followed: UserId) -> StoreResult<FollowResponse> {
        let mut tables = self.tables.write().await;
        tables.check_followable(follower, followed)?;
        if tables.find_follow(follower, followed).is_some() {
            return Err(StoreError::Conflict(
                "You are already following this user.".to_string(),
            ));
        }
        let follow = tables.insert_follow(follower, followed);
        Ok(tables.follow_response(&follow))
    }

    pub async fn unfollow(&self, follower: UserId, followed: UserId) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let id = tables
            .find_follow(follower, followed)
            .ok_or(StoreError::NotFound("Follow"))?;
        tables.follows.remove(&id);
        Ok(())
    }

    /// Returns whether `follower` follows `followed` afterwards.
    pub async fn toggle_follow(&self, follower: UserId, followed: UserId) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        tables.check_followable(follower, followed)?;
        match tables.find_follow(follower, followed) {
            Some(id) => {
                tables.follows.remove(&id);
                Ok(false)
            }
            None => {
                tables.insert_follow(follower, followed);
                Ok(true)
            }
        }
    }

    pub async fn is_following(&self, follower: UserId, followed: UserId) -> bool {
        self.tables
            .read()
            .await
            .find_follow(follower, followed)
            .is_some()
    }
}

impl Tables {
    fn user_by_username(&self, username: &str) -> Option<&User> {
        self.users.values().find(|u| u.username == username)
    }

    fn ensure_username_free(&self, username: &str, except: Option<UserId>) -> StoreResult<()> {
        match self.user_by_username(username) {
            Some(existing) if Some(existing.id) != except => Err(StoreError::Conflict(
                "A user with that username already exists.".to_string(),
            )),
            _ => Ok(()),
        }
    }

    fn summary(&self, id: UserId) -> UserSummary {
        UserSummary {
            id,
            username: self
                .users
                .get(&id)
                .map(|u| u.username.clone())
                .unwrap_or_default(),
        }
    }

    fn profile(&self, user: &User) -> UserProfile {
        UserProfile {
            id: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            profile_picture: user.profile_picture.clone(),
            date_joined: user.date_joined,
            playlist_count: self.playlists.values().filter(|p| p.owner == user.id).count(),
            follower_count: self.follows.values().filter(|f| f.followed == user.id).count(),
            following_count: self.follows.values().filter(|f| f.follower == user.id).count(),
            liked_playlist_count: self
                .playlists
                .values()
                .filter(|p| p.is_liked_by(user.id))
                .count(),
        }
    }

    fn video_count(&self, playlist: PlaylistId) -> usize {
        self.videos.values().filter(|v| v.playlist == playlist).count()
    }

    fn visible_playlist_mut(
        &mut self,
        viewer: UserId,
        id: PlaylistId,
    ) -> StoreResult<&mut Playlist> {
        self.playlists
            .get_mut(&id)
            .filter(|p| p.visible_to(viewer))
            .ok_or(StoreError::NotFound("Playlist"))
    }

    /// Private playlists of other users read as missing; public ones as forbidden.
    fn owned_playlist(
        &self,
        viewer: UserId,
        id: PlaylistId,
        denied: &str,
    ) -> StoreResult<&Playlist> {
        let playlist = self
            .playlists
            .get(&id)
            .filter(|p| p.visible_to(viewer))
            .ok_or(StoreError::NotFound("Playlist"))?;
        if playlist.owner != viewer {
            return Err(StoreError::Forbidden(denied.to_string()));
        }
        Ok(playlist)
    }

    fn video_playlist(&self, viewer: UserId, id: VideoId) -> StoreResult<PlaylistId> {
        self.videos
            .get(&id)
            .map(|v| v.playlist)
            .filter(|pid| self.playlists.get(pid).is_some_and(|p| p.visible_to(viewer)))
            .ok_or(StoreError::NotFound("Video"))
    }

    fn matches(&self, playlist: &Playlist, needle: &str, search_tags: bool) -> bool {
        let contains = |text: &str| text.to_lowercase().contains(needle);
        contains(playlist.title.as_str())
            || playlist.description.as_deref().is_some_and(contains)
            || (search_tags
                && playlist
                    .tags
                    .iter()
                    .filter_map(|id| self.tags.get(id))
                    .any(|t| t.name.contains(needle)))
    }

    /// Maps tag names to ids, creating missing tags. Names are trimmed and lower-cased.
    fn resolve_tags(&mut self, names: &[String]) -> StoreResult<Vec<TagId>> {
        let mut ids = Vec::new();
        for raw in names {
            let name = raw.trim().to_lowercase();
            if name.is_empty() {
                continue;
            }
            if name.chars().count() > MAX_TAG_LENGTH {
                return Err(StoreError::Invalid(format!(
                    "Tag names may be at most {} characters.",
                    MAX_TAG_LENGTH
                )));
            }

            let existing = self.tags.values().find(|t| t.name == name).map(|t| t.id);
            let id = match existing {
                Some(id) => id,
                None => {
                    let id = next(&mut self.ids.tag);
                    self.tags.insert(
                        id,
                        Tag {
                            id,
                            name,
                            created_at: Utc::now(),
                        },
                    );
                    id
                }
            };
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    fn render(&self, playlist: &Playlist, viewer: UserId) -> PlaylistResponse {
        let mut videos: Vec<Video> = self
            .videos
            .values()
            .filter(|v| v.playlist == playlist.id)
            .cloned()
            .collect();
        videos.sort_by(|a, b| {
            a.order
                .cmp(&b.order)
                .then(a.added_at.cmp(&b.added_at))
                .then(a.id.cmp(&b.id))
        });

        let mut tags: Vec<TagResponse> = playlist
            .tags
            .iter()
            .filter_map(|id| self.tags.get(id))
            .map(tag_response)
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));

        PlaylistResponse {
            id: playlist.id,
            title: playlist.title.clone(),
            description: playlist.description.clone(),
            cover_image: playlist.cover_image.clone(),
            user: self.summary(playlist.owner),
            created_at: playlist.created_at,
            updated_at: playlist.updated_at,
            is_public: playlist.is_public,
            video_count: videos.len(),
            videos,
            tags,
            like_count: playlist.likes.len(),
            is_liked: playlist.is_liked_by(viewer),
            view_count: playlist.view_count,
            share_count: playlist.share_count,
        }
    }

    fn check_followable(&self, follower: UserId, followed: UserId) -> StoreResult<()> {
        if follower == followed {
            return Err(StoreError::Invalid("You cannot follow yourself.".to_string()));
        }
        if !self.users.contains_key(&followed) {
            return Err(StoreError::NotFound("User"));
        }
        Ok(())
    }

    fn find_follow(&self, follower: UserId, followed: UserId) -> Option<FollowId> {
        self.follows
            .values()
            .find(|f| f.follower == follower && f.followed == followed)
            .map(|f| f.id)
    }

    fn insert_follow(&mut self, follower: UserId, followed: UserId) -> UserFollow {
        let id = next(&mut self.ids.follow);
        let follow = UserFollow {
            id,
            follower,
            followed,
            created_at: Utc::now(),
        };
        self.follows.insert(id, follow.clone());
        follow
    }

    fn follow_response(&self, follow: &UserFollow) -> FollowResponse {
        FollowResponse {
            id: follow.id,
            follower: follow.follower,
            followed: follow.followed,
            created_at: follow.created_at,
            follower_detail: self.summary(follow.follower),
            followed_detail: self.summary(follow.followed),
        }
    }
}

fn tag_response(tag: &Tag) -> TagResponse {
    TagResponse {
        id: tag.id,
        name: tag.name.clone(),
    }
}

fn sort_playlists(playlists: &mut [&Playlist], ordering: PlaylistOrdering) {
    playlists.sort_by(|a, b| {
        let ord = match ordering.field {
            OrderField::CreatedAt => a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)),
            OrderField::UpdatedAt => a.updated_at.cmp(&b.updated_at).then(a.id.cmp(&b.id)),
            OrderField::Title => a
                .title
                .to_lowercase()
                .cmp(&b.title.to_lowercase())
                .then(a.id.cmp(&b.id)),
            OrderField::Popularity => a
                .likes
                .len()
                .cmp(&b.likes.len())
                .then(a.view_count.cmp(&b.view_count))
                .then(b.id.cmp(&a.id)),
        };
        if ordering.descending {
            ord.reverse()
        } else {
            ord
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(username: &str) -> RegisterRequest {
        RegisterRequest {
            email: format!("{}@example.com", username),
            username: username.to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            profile_picture: None,
        }
    }

    fn playlist(title: &str, is_public: bool, tags: &[&str]) -> CreatePlaylistRequest {
        CreatePlaylistRequest {
            title: title.to_string(),
            description: None,
            cover_image: None,
            is_public,
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn video(playlist: PlaylistId) -> CreateVideoRequest {
        CreateVideoRequest {
            playlist,
            tiktok_url: "https://www.tiktok.com/@someone/video/123".to_string(),
            tiktok_id: None,
            title: None,
            thumbnail_url: None,
            order: None,
        }
    }

    async fn seeded() -> (Store, UserId, UserId) {
        let store = Store::new();
        let alice = store.create_user(&register("alice")).await.unwrap().id;
        let bob = store.create_user(&register("bob")).await.unwrap().id;
        (store, alice, bob)
    }

    #[tokio::test]
    async fn duplicate_usernames_and_emails_conflict() {
        let (store, _, _) = seeded().await;
        let err = store.create_user(&register("alice")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        let mut shouting = register("alice2");
        shouting.email = "ALICE@example.com".to_string();
        assert!(matches!(
            store.create_user(&shouting).await,
            Err(StoreError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn private_playlists_are_hidden_from_others() {
        let (store, alice, bob) = seeded().await;
        let secret = store.create_playlist(alice, &playlist("Secret", false, &[])).await.unwrap();

        assert_eq!(
            store.view_playlist(bob, secret.id).await.unwrap_err(),
            StoreError::NotFound("Playlist")
        );
        assert!(store.list_playlists(bob, &Listing::of(Scope::Visible)).await.is_empty());
        assert_eq!(store.list_playlists(alice, &Listing::of(Scope::Visible)).await.len(), 1);
    }

    #[tokio::test]
    async fn viewing_and_sharing_increment_counters() {
        let (store, alice, bob) = seeded().await;
        let p = store.create_playlist(alice, &playlist("Mix", true, &[])).await.unwrap();

        assert_eq!(store.view_playlist(bob, p.id).await.unwrap().view_count, 1);
        assert_eq!(store.view_playlist(alice, p.id).await.unwrap().view_count, 2);
        assert_eq!(store.record_share(bob, p.id).await.unwrap(), 1);
        assert_eq!(store.record_share(bob, p.id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn likes_toggle() {
        let (store, alice, bob) = seeded().await;
        let p = store.create_playlist(alice, &playlist("Mix", true, &[])).await.unwrap();

        assert!(store.toggle_like(bob, p.id).await.unwrap());
        let liked = store.list_playlists(bob, &Listing::of(Scope::LikedByViewer)).await;
        assert_eq!(liked.len(), 1);
        assert!(liked[0].is_liked);
        assert_eq!(liked[0].like_count, 1);

        assert!(!store.toggle_like(bob, p.id).await.unwrap());
        assert!(store.list_playlists(bob, &Listing::of(Scope::LikedByViewer)).await.is_empty());
    }

    #[tokio::test]
    async fn only_owners_modify_playlists() {
        let (store, alice, bob) = seeded().await;
        let p = store.create_playlist(alice, &playlist("Mix", true, &[])).await.unwrap();
        let changes = UpdatePlaylistRequest {
            title: Some("Hijacked".to_string()),
            ..Default::default()
        };

        assert!(matches!(
            store.update_playlist(bob, p.id, &changes).await,
            Err(StoreError::Forbidden(_))
        ));
        assert!(matches!(
            store.delete_playlist(bob, p.id).await,
            Err(StoreError::Forbidden(_))
        ));

        let updated = store.update_playlist(alice, p.id, &changes).await.unwrap();
        assert_eq!(updated.title, "Hijacked");
        assert!(updated.updated_at >= p.updated_at);
    }

    #[tokio::test]
    async fn deleting_a_playlist_removes_its_videos() {
        let (store, alice, _) = seeded().await;
        let p = store.create_playlist(alice, &playlist("Mix", true, &[])).await.unwrap();
        let v = store.add_video(alice, &video(p.id), "123".into()).await.unwrap();

        store.delete_playlist(alice, p.id).await.unwrap();
        assert_eq!(store.video(alice, v.id).await.unwrap_err(), StoreError::NotFound("Video"));
    }

    #[tokio::test]
    async fn videos_append_in_order() {
        let (store, alice, bob) = seeded().await;
        let p = store.create_playlist(alice, &playlist("Mix", true, &[])).await.unwrap();

        let first = store.add_video(alice, &video(p.id), "1".into()).await.unwrap();
        let second = store.add_video(alice, &video(p.id), "2".into()).await.unwrap();
        assert_eq!((first.order, second.order), (0, 1));

        assert!(matches!(
            store.add_video(bob, &video(p.id), "3".into()).await,
            Err(StoreError::Forbidden(_))
        ));
        assert_eq!(store.list_videos(bob, Some(p.id)).await.len(), 2);
    }

    #[tokio::test]
    async fn videos_list_by_position_across_playlists() {
        let (store, alice, _) = seeded().await;
        let first = store.create_playlist(alice, &playlist("One", true, &[])).await.unwrap();
        let second = store.create_playlist(alice, &playlist("Two", true, &[])).await.unwrap();

        let late = CreateVideoRequest {
            order: Some(5),
            ..video(first.id)
        };
        let early = CreateVideoRequest {
            order: Some(0),
            ..video(second.id)
        };
        store.add_video(alice, &late, "late".into()).await.unwrap();
        store.add_video(alice, &early, "early".into()).await.unwrap();

        let orders: Vec<u32> = store
            .list_videos(alice, None)
            .await
            .into_iter()
            .map(|v| v.order)
            .collect();
        assert_eq!(orders, vec![0, 5]);
    }

    #[tokio::test]
    async fn updates_can_clear_optional_fields() {
        let (store, alice, _) = seeded().await;
        let mut request = playlist("Mix", true, &[]);
        request.description = Some("Weekend picks".to_string());
        request.cover_image = Some("https://cdn.example.com/cover.png".to_string());
        let p = store.create_playlist(alice, &request).await.unwrap();

        let keep = UpdatePlaylistRequest {
            title: Some("Renamed".to_string()),
            ..Default::default()
        };
        let kept = store.update_playlist(alice, p.id, &keep).await.unwrap();
        assert_eq!(kept.description.as_deref(), Some("Weekend picks"));

        let clear = UpdatePlaylistRequest {
            description: Some(None),
            cover_image: Some(None),
            ..Default::default()
        };
        let cleared = store.update_playlist(alice, p.id, &clear).await.unwrap();
        assert_eq!(cleared.description, None);
        assert_eq!(cleared.cover_image, None);
        assert_eq!(cleared.title, "Renamed");
    }

    #[tokio::test]
    async fn user_listings_hide_private_playlists_from_others() {
        let (store, alice, bob) = seeded().await;
        store.create_playlist(alice, &playlist("Open", true, &[])).await.unwrap();
        store.create_playlist(alice, &playlist("Closed", false, &[])).await.unwrap();

        let own = store.list_playlists(alice, &Listing::of(Scope::OwnedBy(alice))).await;
        assert_eq!(own.len(), 2);
        let public = store
            .list_playlists(bob, &Listing::of(Scope::PublicOwnedBy(alice)))
            .await;
        assert_eq!(public.len(), 1);
        assert_eq!(public[0].title, "Open");
    }

    #[tokio::test]
    async fn tags_are_normalized_and_shared() {
        let (store, alice, _) = seeded().await;
        store
            .create_playlist(alice, &playlist("One", true, &[" Dance ", "dance", "funny"]))
            .await
            .unwrap();
        store.create_playlist(alice, &playlist("Two", true, &["DANCE"])).await.unwrap();

        let names: Vec<String> = store.tags().await.into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["dance", "funny"]);
        assert_eq!(store.autocomplete_tags("Da", 10).await.len(), 1);

        let long = "x".repeat(MAX_TAG_LENGTH + 1);
        assert!(matches!(
            store.create_playlist(alice, &playlist("Three", true, &[long.as_str()])).await,
            Err(StoreError::Invalid(_))
        ));
    }

    #[tokio::test]
    async fn search_can_include_tags() {
        let (store, alice, bob) = seeded().await;
        store.create_playlist(alice, &playlist("Cats", true, &["pets"])).await.unwrap();
        store.create_playlist(alice, &playlist("Dogs", true, &[])).await.unwrap();

        let mut listing = Listing {
            search: Some("pets".to_string()),
            ..Listing::default()
        };
        assert!(store.list_playlists(bob, &listing).await.is_empty());
        listing.search_tags = true;
        let found = store.list_playlists(bob, &listing).await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Cats");
    }

    #[tokio::test]
    async fn popular_orders_by_likes_then_views() {
        let (store, alice, bob) = seeded().await;
        let quiet = store.create_playlist(alice, &playlist("Quiet", true, &[])).await.unwrap();
        let viewed = store.create_playlist(alice, &playlist("Viewed", true, &[])).await.unwrap();
        let liked = store.create_playlist(alice, &playlist("Liked", true, &[])).await.unwrap();

        store.toggle_like(bob, liked.id).await.unwrap();
        store.view_playlist(bob, viewed.id).await.unwrap();

        let listing = Listing {
            scope: Some(Scope::Public),
            ordering: PlaylistOrdering::POPULAR,
            ..Listing::default()
        };
        let ids: Vec<PlaylistId> = store
            .list_playlists(bob, &listing)
            .await
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![liked.id, viewed.id, quiet.id]);
    }

    #[tokio::test]
    async fn explore_only_serves_public_playlists_with_videos() {
        let (store, alice, bob) = seeded().await;
        let empty = store.create_playlist(alice, &playlist("Empty", true, &[])).await.unwrap();
        let hidden = store.create_playlist(alice, &playlist("Hidden", false, &[])).await.unwrap();
        let shown = store.create_playlist(alice, &playlist("Shown", true, &[])).await.unwrap();
        store.add_video(alice, &video(hidden.id), "1".into()).await.unwrap();
        store.add_video(alice, &video(shown.id), "2".into()).await.unwrap();

        let request = PageRequest::new(1, 10, bob, 120).unwrap();
        let page = store.explore(&request).await.unwrap();
        let ids: Vec<PlaylistId> = page.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![shown.id]);
        assert!(!ids.contains(&empty.id));
    }

    #[tokio::test]
    async fn follows_toggle_and_reject_self() {
        let (store, alice, bob) = seeded().await;

        assert_eq!(
            store.toggle_follow(alice, alice).await.unwrap_err(),
            StoreError::Invalid("You cannot follow yourself.".to_string())
        );
        assert_eq!(
            store.toggle_follow(alice, 999).await.unwrap_err(),
            StoreError::NotFound("User")
        );

        assert!(store.toggle_follow(alice, bob).await.unwrap());
        assert!(store.is_following(alice, bob).await);
        assert!(matches!(store.follow(alice, bob).await, Err(StoreError::Conflict(_))));
        assert_eq!(store.profile(bob).await.unwrap().follower_count, 1);
        assert_eq!(store.follows_involving(bob).await.len(), 1);

        assert!(!store.toggle_follow(alice, bob).await.unwrap());
        assert_eq!(store.unfollow(alice, bob).await.unwrap_err(), StoreError::NotFound("Follow"));
    }

    #[tokio::test]
    async fn renaming_to_a_taken_username_fails() {
        let (store, alice, _) = seeded().await;
        let changes = UpdateProfileRequest {
            username: Some("bob".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            store.update_user(alice, &changes).await,
            Err(StoreError::Conflict(_))
        ));

        let keep = UpdateProfileRequest {
            username: Some("alice".to_string()),
            first_name: Some("Alice".to_string()),
            ..Default::default()
        };
        assert_eq!(store.update_user(alice, &keep).await.unwrap().first_name, "Alice");
    }
}
