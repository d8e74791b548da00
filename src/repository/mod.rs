use crate::error::{BbdepsError, Result};
use percent_encoding::percent_decode_str;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use url::Url;

pub mod bitbucket;
pub mod factory;

pub use bitbucket::BitbucketClient;
pub use factory::RepositoryFactory;

pub const DEFAULT_API_URL: &str = "https://api.bitbucket.org/2.0";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

const REPOSITORY_HOST: &str = "bitbucket.org";

/// Workspace and slug addressing one hosted repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryRef {
    pub workspace: String,
    pub slug: String,
}

impl RepositoryRef {
    pub fn new(workspace: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            workspace: workspace.into(),
            slug: slug.into(),
        }
    }

    /// Parse `https://bitbucket.org/{workspace}/{repository}`.
    ///
    /// Extra path segments (`/src/main/`, a trailing slash) are ignored and a
    /// `.git` suffix on the repository is dropped. The error is the message to
    /// show the user.
    pub fn parse(input: &str) -> std::result::Result<Self, String> {
        let input = input.trim();
        if input.is_empty() {
            return Err(EMPTY_INPUT_MESSAGE.to_string());
        }

        let invalid = || INVALID_URL_MESSAGE.to_string();
        let url = Url::parse(input).map_err(|_| invalid())?;

        if url.scheme() != "https" || url.host_str() != Some(REPOSITORY_HOST) {
            return Err(invalid());
        }

        let mut segments = url
            .path_segments()
            .ok_or_else(invalid)?
            .filter(|segment| !segment.is_empty());

        // endpoints re-escape each segment, so keep the decoded form here
        let decode = |segment: &str| {
            percent_decode_str(segment)
                .decode_utf8()
                .map(|decoded| decoded.into_owned())
                .map_err(|_| invalid())
        };

        let workspace = decode(segments.next().ok_or_else(invalid)?)?;
        let slug = decode(segments.next().ok_or_else(invalid)?)?;
        let slug = slug.strip_suffix(".git").unwrap_or(slug.as_str());

        if workspace.is_empty() || slug.is_empty() {
            return Err(invalid());
        }

        Ok(Self::new(workspace.as_str(), slug))
    }
}

pub const EMPTY_INPUT_MESSAGE: &str = "Invalid input: a non-empty string is expected";
pub const INVALID_URL_MESSAGE: &str = "Invalid input: a valid BitBucket repository URL is expected in form https://bitbucket.org/{workspace}/{repository}/";

/// Prompt validator for repository URLs.
pub fn validate_repository_url(input: &str) -> std::result::Result<(), String> {
    RepositoryRef::parse(input).map(|_| ())
}

/// Contents of a file at some commit.
#[derive(Debug, Clone, PartialEq)]
pub enum FileContent {
    Text(String),
    Json(Value),
}

impl FileContent {
    /// Decode raw file text, parsing it when the path has a `json` extension.
    pub fn decode(path: &str, text: String) -> serde_json::Result<Self> {
        let is_json = Path::new(path)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            serde_json::from_str(&text).map(FileContent::Json)
        } else {
            Ok(FileContent::Text(text))
        }
    }

    /// Text to upload: structured values become 2-space indented JSON with a
    /// trailing newline, text is passed through untouched.
    pub fn to_text(&self) -> serde_json::Result<String> {
        match self {
            FileContent::Text(text) => Ok(text.clone()),
            FileContent::Json(value) => {
                let mut text = serde_json::to_string_pretty(value)?;
                text.push('\n');
                Ok(text)
            }
        }
    }

    pub fn into_json(self, path: &str) -> Result<Value> {
        match self {
            FileContent::Json(value) => Ok(value),
            FileContent::Text(_) => Err(BbdepsError::Manifest(format!(
                "\"{path}\" was not returned as JSON"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommitRequest {
    pub branch: String,
    pub message: String,
    pub files: Vec<(String, FileContent)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommitReceipt {
    /// Location of the created commit, when the service reports it.
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestRequest {
    pub source_branch: String,
    pub destination_branch: String,
    pub title: String,
}

/// Transport settings shared by every request of a run.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub api_url: String,
    pub timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Operations the update workflow needs from a hosted repository.
///
/// Each call performs one request. On failure the implementation logs the
/// failed operation once and returns [`BbdepsError::Repository`]; nothing is retried.
pub trait RemoteRepository: Send + Sync {
    fn main_branch_name(&self) -> Result<String>;

    /// Hash of the newest commit on the first page of history.
    fn latest_commit_hash(&self) -> Result<String>;

    fn read_file(&self, path: &str, commit: &str) -> Result<FileContent>;

    /// Create `request.branch` if needed and commit every file to it at once.
    fn commit(&self, request: &CommitRequest) -> Result<CommitReceipt>;

    /// Open a pull request and return its web URL, if the response has one.
    fn create_pull_request(&self, request: &PullRequestRequest) -> Result<Option<String>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn parses_workspace_and_slug() {
        let parsed = RepositoryRef::parse("https://bitbucket.org/team/repo").unwrap();
        assert_eq!(parsed, RepositoryRef::new("team", "repo"));
    }

    #[test]
    fn tolerates_trailing_path() {
        for url in [
            "https://bitbucket.org/team/repo/",
            "https://bitbucket.org/team/repo/src/main/",
            "https://bitbucket.org/team/repo.git",
            "  https://bitbucket.org/team/repo  ",
        ] {
            assert_eq!(
                RepositoryRef::parse(url).unwrap(),
                RepositoryRef::new("team", "repo"),
                "{url}"
            );
        }
    }

    #[test]
    fn rejects_other_hosts_and_shapes() {
        for url in [
            "https://github.com/team/repo",
            "http://bitbucket.org/team/repo",
            "https://bitbucket.org/team",
            "https://bitbucket.org/",
            "bitbucket.org/team/repo",
            "team/repo",
        ] {
            assert_eq!(
                RepositoryRef::parse(url),
                Err(INVALID_URL_MESSAGE.to_string()),
                "{url}"
            );
        }
    }

    #[test]
    fn decodes_escaped_segments() {
        let parsed = RepositoryRef::parse("https://bitbucket.org/my%20team/my%2Drepo").unwrap();
        assert_eq!(parsed, RepositoryRef::new("my team", "my-repo"));
    }

    #[test]
    fn rejects_segments_that_are_not_utf8() {
        assert_eq!(
            RepositoryRef::parse("https://bitbucket.org/team/%FF"),
            Err(INVALID_URL_MESSAGE.to_string())
        );
    }

    #[test]
    fn rejects_empty_url() {
        assert_eq!(
            validate_repository_url(""),
            Err(EMPTY_INPUT_MESSAGE.to_string())
        );
    }

    #[test]
    fn serializes_structured_content_with_two_space_indent() {
        let content = FileContent::Json(json!({ "name": "x" }));
        assert_eq!(content.to_text().unwrap(), "{\n  \"name\": \"x\"\n}\n");
    }

    #[test]
    fn passes_text_content_through() {
        let content = FileContent::Text("no newline".to_string());
        assert_eq!(content.to_text().unwrap(), "no newline");
    }

    #[test]
    fn decodes_json_by_extension() {
        let decoded = FileContent::decode("package.json", "{\"a\":1}".to_string()).unwrap();
        assert_eq!(decoded, FileContent::Json(json!({ "a": 1 })));

        let text = FileContent::decode(".npmrc", "{\"a\":1}".to_string()).unwrap();
        assert_eq!(text, FileContent::Text("{\"a\":1}".to_string()));
    }

    #[test]
    fn decode_reports_invalid_json() {
        assert!(FileContent::decode("package-lock.json", "{".to_string()).is_err());
    }

    #[test]
    fn text_is_not_json() {
        let err = FileContent::Text("x".into()).into_json("package.json").unwrap_err();
        assert!(matches!(err, BbdepsError::Manifest(_)));
    }
}
