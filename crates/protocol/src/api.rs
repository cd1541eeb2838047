//! REST API request and response bodies.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Upload profile as returned by `GET /get_profile/{name}`.
///
/// Counts and schedule fields are strings on the wire; the backend stores
/// them verbatim in its profile file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
	#[serde(default)]
	pub name: String,
	#[serde(default)]
	pub token_file: String,
	#[serde(default)]
	pub client_secret_file: String,
	#[serde(default)]
	pub video_folder: String,
	#[serde(default)]
	pub audio_folder: String,
	#[serde(default)]
	pub thumb_folder: String,
	#[serde(default)]
	pub output_folder: String,
	#[serde(default)]
	pub title_file: String,
	#[serde(default)]
	pub desc_file: String,
	#[serde(default)]
	pub num_audio: String,
	#[serde(default)]
	pub num_video: String,
	#[serde(default)]
	pub category: String,
	#[serde(default)]
	pub start_time: String,
	#[serde(default)]
	pub schedule_slots: String,
	#[serde(default)]
	pub monetization: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub auth_status: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub auth_class: Option<String>,
}

impl Profile {
	/// Whether the backend reports a completed OAuth flow for this profile.
	pub fn is_authenticated(&self) -> bool {
		self.auth_status.as_deref() == Some("Authenticated")
	}
}

/// Body of `POST /save_profile`: the edited profile plus its key.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileUpdate<'a> {
	pub profile_name: &'a str,
	#[serde(flatten)]
	pub profile: &'a Profile,
}

/// Body of `POST /delete_profile`.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteProfileRequest<'a> {
	pub profile_name: &'a str,
}

/// Media listing returned by `GET /list_files/{name}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilesData {
	#[serde(default)]
	pub videos: Vec<String>,
	#[serde(default)]
	pub audios: Vec<String>,
	#[serde(default)]
	pub thumbs: Vec<String>,
}

impl FilesData {
	pub fn files(&self, kind: MediaKind) -> &[String] {
		match kind {
			MediaKind::Video => &self.videos,
			MediaKind::Audio => &self.audios,
			MediaKind::Thumbnail => &self.thumbs,
		}
	}
}

/// Body of `POST /delete_file`.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteFileRequest<'a> {
	pub profile_name: &'a str,
	pub file_name: &'a str,
	pub file_type: &'a str,
}

/// Response of `GET /get_text_file/{name}/{kind}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextFile {
	#[serde(default)]
	pub content: String,
}

/// Body of `POST /save_text_file`.
#[derive(Debug, Clone, Serialize)]
pub struct SaveTextFileRequest<'a> {
	pub profile_name: &'a str,
	pub file_type: &'a str,
	pub content: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiStatus {
	Success,
	Error,
}

/// Generic status envelope returned by mutating endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse {
	pub status: ApiStatus,
	#[serde(default)]
	pub message: String,
}

impl ApiResponse {
	pub fn is_success(&self) -> bool {
		self.status == ApiStatus::Success
	}
}

/// Media folder a file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
	Video,
	Audio,
	Thumbnail,
}

impl MediaKind {
	pub const ALL: [MediaKind; 3] = [MediaKind::Video, MediaKind::Audio, MediaKind::Thumbnail];

	/// `file_type` value used by the upload and delete endpoints.
	pub fn wire_name(self) -> &'static str {
		match self {
			MediaKind::Video => "videos",
			MediaKind::Audio => "audios",
			MediaKind::Thumbnail => "thumbs",
		}
	}

	/// Extensions the backend accepts for this kind (lowercase, with dot).
	pub fn extensions(self) -> &'static [&'static str] {
		match self {
			MediaKind::Video => &[".mp4", ".mov", ".mkv"],
			MediaKind::Audio => &[".mp3", ".wav", ".m4a"],
			MediaKind::Thumbnail => &[".png", ".jpg", ".jpeg"],
		}
	}

	/// Guesses the kind from a file extension.
	pub fn from_path(path: &Path) -> Option<Self> {
		let ext = path.extension()?.to_str()?.to_ascii_lowercase();
		let dotted = format!(".{ext}");
		Self::ALL.into_iter().find(|kind| kind.extensions().contains(&dotted.as_str()))
	}

	pub fn accepts(self, path: &Path) -> bool {
		Self::from_path(path) == Some(self)
	}
}

impl std::str::FromStr for MediaKind {
	type Err = String;

	fn from_str(value: &str) -> Result<Self, Self::Err> {
		match value {
			"video" | "videos" => Ok(MediaKind::Video),
			"audio" | "audios" => Ok(MediaKind::Audio),
			"thumb" | "thumbs" | "thumbnail" => Ok(MediaKind::Thumbnail),
			other => Err(format!("unknown media kind '{other}' (expected videos, audios or thumbs)")),
		}
	}
}

/// Title and description pools edited through the text endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextPool {
	Titles,
	Descriptions,
}

impl TextPool {
	pub fn wire_name(self) -> &'static str {
		match self {
			TextPool::Titles => "titles",
			TextPool::Descriptions => "descriptions",
		}
	}
}

impl std::str::FromStr for TextPool {
	type Err = String;

	fn from_str(value: &str) -> Result<Self, Self::Err> {
		match value {
			"titles" | "title" => Ok(TextPool::Titles),
			"descriptions" | "description" | "desc" => Ok(TextPool::Descriptions),
			other => Err(format!("unknown text pool '{other}' (expected titles or descriptions)")),
		}
	}
}
