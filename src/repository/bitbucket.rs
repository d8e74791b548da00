use crate::error::{BbdepsError, BoxError, Result};
use crate::repository::{
    ClientSettings, CommitReceipt, CommitRequest, FileContent, PullRequestRequest,
    RemoteRepository, RepositoryRef,
};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::LOCATION;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// BitBucket Cloud REST 2.0 client bound to one repository.
pub struct BitbucketClient {
    client: Client,
    api_url: Url,
    token: String,
    repository: RepositoryRef,
}

impl BitbucketClient {
    pub fn new(
        settings: &ClientSettings,
        token: impl Into<String>,
        repository: RepositoryRef,
    ) -> Result<Self> {
        let api_url = Self::validate_api_url(&settings.api_url)?;
        let client = Self::build_client(settings.timeout)?;

        Ok(Self {
            client,
            api_url,
            token: token.into(),
            repository,
        })
    }

    pub fn repository(&self) -> &RepositoryRef {
        &self.repository
    }

    fn build_client(timeout: Duration) -> Result<Client> {
        Ok(Client::builder()
            .timeout(timeout)
            .user_agent(concat!("bbdeps/", env!("CARGO_PKG_VERSION")))
            .build()?)
    }

    fn validate_api_url(url: &str) -> Result<Url> {
        let parsed =
            Url::parse(url).map_err(|e| BbdepsError::InvalidApiUrl(format!("{url}: {e}")))?;

        match parsed.scheme() {
            "https" | "http" => {}
            scheme => {
                return Err(BbdepsError::InvalidApiUrl(format!(
                    "unsupported scheme: {scheme}"
                )));
            }
        }

        if parsed.cannot_be_a_base() {
            return Err(BbdepsError::InvalidApiUrl(url.to_string()));
        }

        Ok(parsed)
    }

    /// `{api}/repositories/{workspace}/{slug}/{tail...}`, each segment escaped.
    fn endpoint(&self, tail: &[&str]) -> std::result::Result<Url, BoxError> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| "API URL cannot be a base")?
            .pop_if_empty()
            .push("repositories")
            .push(&self.repository.workspace)
            .push(&self.repository.slug)
            .extend(tail.iter().flat_map(|part| part.split('/')));
        Ok(url)
    }

    fn get(&self, tail: &[&str]) -> std::result::Result<RequestBuilder, BoxError> {
        let url = self.endpoint(tail)?;
        log::debug!("GET {url}");
        Ok(self.client.get(url).bearer_auth(&self.token))
    }

    /// Form-encoded `POST src`: one field per file plus `branch` and `message`.
    fn commit_request(
        &self,
        request: &CommitRequest,
    ) -> std::result::Result<RequestBuilder, BoxError> {
        let url = self.endpoint(&["src"])?;
        let form = commit_form(request)?;
        log::debug!("POST {url} ({} files)", request.files.len());
        Ok(self.client.post(url).bearer_auth(&self.token).form(&form))
    }

    fn pull_request_request(
        &self,
        request: &PullRequestRequest,
    ) -> std::result::Result<RequestBuilder, BoxError> {
        let url = self.endpoint(&["pullrequests"])?;
        log::debug!("POST {url}");
        let body = PullRequestBody::from(request);
        Ok(self.client.post(url).bearer_auth(&self.token).json(&body))
    }

    fn send(request: RequestBuilder) -> std::result::Result<Response, BoxError> {
        Ok(request.send()?.error_for_status()?)
    }

    /// Run one remote operation under the shared failure contract: a single
    /// diagnostic line naming the operation, then the error is returned.
    fn attempt<T>(
        &self,
        operation: impl Into<String>,
        call: impl FnOnce() -> std::result::Result<T, BoxError>,
    ) -> Result<T> {
        let operation = operation.into();
        call().map_err(|source| {
            log::error!("{operation}");
            BbdepsError::Repository { operation, source }
        })
    }
}

impl RemoteRepository for BitbucketClient {
    fn main_branch_name(&self) -> Result<String> {
        self.attempt("Cannot retrieve main branch name", || {
            let metadata: RepositoryMetadata = Self::send(self.get(&[])?)?.json()?;
            main_branch_of(metadata)
        })
    }

    fn latest_commit_hash(&self) -> Result<String> {
        self.attempt("Cannot retrieve latest commit", || {
            let page: CommitPage = Self::send(self.get(&["commits"])?)?.json()?;
            latest_hash_of(page)
        })
    }

    fn read_file(&self, path: &str, commit: &str) -> Result<FileContent> {
        self.attempt(format!("Cannot read \"{path}\" in repository"), || {
            let text = Self::send(self.get(&["src", commit, path])?)?.text()?;
            Ok(FileContent::decode(path, text)?)
        })
    }

    fn commit(&self, request: &CommitRequest) -> Result<CommitReceipt> {
        self.attempt("Cannot create new commit", || {
            let response = Self::send(self.commit_request(request)?)?;

            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string);

            Ok(CommitReceipt { location })
        })
    }

    fn create_pull_request(&self, request: &PullRequestRequest) -> Result<Option<String>> {
        self.attempt("Cannot create new pull request", || {
            let created: PullRequestResponse =
                Self::send(self.pull_request_request(request)?)?.json()?;
            Ok(pull_request_link(created))
        })
    }
}

/// Form fields for the `src` endpoint: one `path=content` pair per file, then
/// the target branch and the commit message.
fn commit_form(request: &CommitRequest) -> serde_json::Result<Vec<(String, String)>> {
    let mut form = Vec::with_capacity(request.files.len() + 2);

    for (path, content) in &request.files {
        form.push((path.clone(), content.to_text()?));
    }

    form.push(("branch".to_string(), request.branch.clone()));
    form.push(("message".to_string(), request.message.clone()));
    Ok(form)
}

fn main_branch_of(metadata: RepositoryMetadata) -> std::result::Result<String, BoxError> {
    metadata
        .mainbranch
        .map(|branch| branch.name)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| "repository metadata has no main branch".into())
}

fn latest_hash_of(page: CommitPage) -> std::result::Result<String, BoxError> {
    page.values
        .into_iter()
        .next()
        .map(|commit| commit.hash)
        .ok_or_else(|| "No commits in the repository. Cannot perform update".into())
}

fn pull_request_link(response: PullRequestResponse) -> Option<String> {
    response.links?.html.map(|link| link.href)
}

#[derive(Debug, Deserialize)]
struct RepositoryMetadata {
    mainbranch: Option<BranchRef>,
}

#[derive(Debug, Serialize, Deserialize)]
struct BranchRef {
    name: String,
}

#[derive(Debug, Deserialize)]
struct CommitPage {
    #[serde(default)]
    values: Vec<CommitSummary>,
}

#[derive(Debug, Deserialize)]
struct CommitSummary {
    hash: String,
}

#[derive(Debug, Serialize)]
struct PullRequestBody {
    title: String,
    source: BranchSpec,
    destination: BranchSpec,
}

#[derive(Debug, Serialize)]
struct BranchSpec {
    branch: BranchRef,
}

impl BranchSpec {
    fn named(name: &str) -> Self {
        Self {
            branch: BranchRef {
                name: name.to_string(),
            },
        }
    }
}

impl From<&PullRequestRequest> for PullRequestBody {
    fn from(request: &PullRequestRequest) -> Self {
        Self {
            title: request.title.clone(),
            source: BranchSpec::named(&request.source_branch),
            destination: BranchSpec::named(&request.destination_branch),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PullRequestResponse {
    links: Option<PullRequestLinks>,
}

#[derive(Debug, Deserialize)]
struct PullRequestLinks {
    html: Option<Link>,
}

#[derive(Debug, Deserialize)]
struct Link {
    href: String,
}
