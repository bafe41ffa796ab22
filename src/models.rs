use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{config::Config, store::Store};

pub type UserId = i64;
pub type PlaylistId = i64;
pub type VideoId = i64;
pub type TagId = i64;
pub type FollowId = i64;

pub struct AppState {
    pub store: Store,
    pub config: Config,
}

// Stored entities

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub profile_picture: Option<String>,
    pub date_joined: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct Playlist {
    pub id: PlaylistId,
    pub title: String,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub owner: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_public: bool,
    pub view_count: u32,
    pub share_count: u32,
    pub likes: Vec<UserId>,
    pub tags: Vec<TagId>,
}

impl Playlist {
    pub fn visible_to(&self, viewer: UserId) -> bool {
        self.is_public || self.owner == viewer
    }

    pub fn is_liked_by(&self, user: UserId) -> bool {
        self.likes.contains(&user)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Video {
    pub id: VideoId,
    pub title: Option<String>,
    pub tiktok_url: String,
    pub tiktok_id: String,
    pub thumbnail_url: Option<String>,
    pub playlist: PlaylistId,
    pub added_at: DateTime<Utc>,
    pub order: u32,
}

#[derive(Clone, Debug)]
pub struct UserFollow {
    pub id: FollowId,
    pub follower: UserId,
    pub followed: UserId,
    pub created_at: DateTime<Utc>,
}

// Requests

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub profile_picture: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "clearable")]
    pub profile_picture: Option<Option<String>>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePlaylistRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default = "default_is_public")]
    pub is_public: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_is_public() -> bool {
    true
}

/// Absent keeps the field (`None`), `null` clears it (`Some(None)`).
fn clearable<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdatePlaylistRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "clearable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "clearable")]
    pub cover_image: Option<Option<String>>,
    pub is_public: Option<bool>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct CreateVideoRequest {
    pub playlist: PlaylistId,
    pub tiktok_url: String,
    #[serde(default)]
    pub tiktok_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub order: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateVideoRequest {
    #[serde(default, deserialize_with = "clearable")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "clearable")]
    pub thumbnail_url: Option<Option<String>>,
    pub order: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct FollowRequest {
    pub followed: UserId,
}

#[derive(Debug, Deserialize)]
pub struct ToggleFollowRequest {
    pub user_id: Option<UserId>,
}

#[derive(Debug, Deserialize)]
pub struct ExploreQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PlaylistListQuery {
    pub search: Option<String>,
    pub ordering: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct VideoListQuery {
    pub playlist: Option<PlaylistId>,
}

// Responses

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UserSummary {
    pub id: UserId,
    pub username: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub profile_picture: Option<String>,
    pub date_joined: DateTime<Utc>,
    pub playlist_count: usize,
    pub follower_count: usize,
    pub following_count: usize,
    pub liked_playlist_count: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TagResponse {
    pub id: TagId,
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlaylistResponse {
    pub id: PlaylistId,
    pub title: String,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub user: UserSummary,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_public: bool,
    pub videos: Vec<Video>,
    pub tags: Vec<TagResponse>,
    pub like_count: usize,
    pub video_count: usize,
    pub is_liked: bool,
    pub view_count: u32,
    pub share_count: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FollowResponse {
    pub id: FollowId,
    pub follower: UserId,
    pub followed: UserId,
    pub created_at: DateTime<Utc>,
    pub follower_detail: UserSummary,
    pub followed_detail: UserSummary,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn new(status: &str) -> Self {
        Self {
            status: status.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ShareResponse {
    pub share_count: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FollowStatusResponse {
    pub is_following: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
