use crate::cli::Cli;
use crate::error::{BbdepsError, Result};
use crate::interaction::{Prompter, TerminalPrompter, validate_non_empty};
use crate::npm::{LOCKFILE_PATH, MANIFEST_PATH, NpmProject, VersionComparator};
use crate::repository::{
    ClientSettings, CommitRequest, FileContent, PullRequestRequest, RemoteRepository,
    RepositoryFactory, RepositoryRef, validate_repository_url,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::panic;
use std::thread;
use std::time::Duration;

/// Credentials and target collected before any request is made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Setup {
    pub token: String,
    pub repository: RepositoryRef,
}

/// The single dependency bump a run performs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatePlan {
    pub package: String,
    pub version: String,
}

impl UpdatePlan {
    pub fn new(package: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            version: version.into(),
        }
    }

    pub fn branch_name(&self) -> String {
        format!("deps/{}-{}", self.package, self.version)
    }

    pub fn commit_message(&self) -> String {
        format!("Update \"{}\" to v{}", self.package, self.version)
    }

    pub fn pull_request_title(&self) -> String {
        format!("Update `{}` to v{}", self.package, self.version)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub plan: UpdatePlan,
    pub pull_request_url: Option<String>,
}

/// Execute the interactive update workflow against the terminal.
pub fn execute_update(cli: &Cli) -> Result<()> {
    let prompter = TerminalPrompter::new();
    let setup = collect_setup(&prompter, cli.token.clone(), cli.repository.clone())?;

    let settings = ClientSettings {
        api_url: cli.api_url.clone(),
        timeout: Duration::from_secs(cli.timeout),
    };
    let client = RepositoryFactory::create_bitbucket(&settings, setup.token, setup.repository)?;

    let outcome = perform_update(client.as_ref(), &prompter)?;
    print_outcome(&outcome);
    Ok(())
}

/// Resolve the access token and repository, prompting for whatever the
/// command line did not supply.
pub fn collect_setup(
    prompter: &dyn Prompter,
    token: Option<String>,
    repository: Option<RepositoryRef>,
) -> Result<Setup> {
    let token = match token.filter(|token| !token.trim().is_empty()) {
        Some(token) => token,
        None => prompter.secret(
            "Repository/Project/Workspace Access Token",
            &validate_non_empty,
        )?,
    };

    let repository = match repository {
        Some(repository) => repository,
        None => {
            let url = prompter.text("URL of BitBucket repository", &validate_repository_url)?;
            RepositoryRef::parse(&url).map_err(BbdepsError::InvalidInput)?
        }
    };

    Ok(Setup { token, repository })
}

/// Run the update against `repository`, from reading the manifest to opening
/// the pull request. Any failure aborts the run.
pub fn perform_update(
    repository: &dyn RemoteRepository,
    prompter: &dyn Prompter,
) -> Result<UpdateOutcome> {
    let progress = spinner("Resolving main branch and latest commit...");
    let (main_branch, latest_commit) = run_concurrently(
        || repository.main_branch_name(),
        || repository.latest_commit_hash(),
    );
    progress.finish_and_clear();
    let main_branch = main_branch?;
    let latest_commit = latest_commit?;
    log::info!("Main branch is {main_branch}, latest commit is {latest_commit}");

    let progress = spinner("Reading package manifests...");
    let (manifest, lockfile) = run_concurrently(
        || repository.read_file(MANIFEST_PATH, &latest_commit),
        || repository.read_file(LOCKFILE_PATH, &latest_commit),
    );
    progress.finish_and_clear();
    let manifest = manifest?.into_json(MANIFEST_PATH)?;
    let lockfile = lockfile?.into_json(LOCKFILE_PATH)?;

    let mut project = NpmProject::new(manifest, lockfile)?;
    let packages = project.updatable_packages();
    if packages.is_empty() {
        return Err(BbdepsError::Manifest(format!(
            "{MANIFEST_PATH} declares no dependencies"
        )));
    }

    let choice = prompter.select("Which package do you want to update?", &packages)?;
    let package = packages[choice].clone();
    let current = project.locked_version(&package)?.to_string();
    if !VersionComparator::is_valid(&current) {
        return Err(BbdepsError::Manifest(format!(
            "locked version of \"{package}\" is not a semantic version: {current}"
        )));
    }

    let version = prompter.text(
        &format!("What version do you want to update to? (current version: {current})"),
        &|value: &str| VersionComparator::validate_upgrade(value, &current),
    )?;
    log::info!("Updating {package} from {current} to {version}");

    project.set_version(&package, &version)?;
    let plan = UpdatePlan::new(package, version);
    let (manifest, lockfile) = project.into_documents();

    let progress = spinner("Committing changes...");
    let committed = repository.commit(&CommitRequest {
        branch: plan.branch_name(),
        message: plan.commit_message(),
        files: vec![
            (MANIFEST_PATH.to_string(), FileContent::Json(manifest)),
            (LOCKFILE_PATH.to_string(), FileContent::Json(lockfile)),
        ],
    });
    progress.finish_and_clear();
    let receipt = committed?;
    if let Some(location) = &receipt.location {
        log::debug!("Commit created at {location}");
    }

    let progress = spinner("Opening pull request...");
    let pull_request_url = repository.create_pull_request(&PullRequestRequest {
        source_branch: plan.branch_name(),
        destination_branch: main_branch,
        title: plan.pull_request_title(),
    });
    progress.finish_and_clear();

    Ok(UpdateOutcome {
        plan,
        pull_request_url: pull_request_url?,
    })
}

fn print_outcome(outcome: &UpdateOutcome) {
    if outcome.pull_request_url.is_none() {
        log::warn!("The pull request response did not include a link");
    }
    println!("{}", outcome_line(outcome));
}

/// The single line written to stdout once the pull request exists.
fn outcome_line(outcome: &UpdateOutcome) -> String {
    match &outcome.pull_request_url {
        Some(url) => format!("Pull Request is created, visit: {url}"),
        None => "Pull Request is created".to_string(),
    }
}

/// Run two independent calls at once and wait for both.
fn run_concurrently<A, B>(
    first: impl FnOnce() -> A + Send,
    second: impl FnOnce() -> B,
) -> (A, B)
where
    A: Send,
{
    thread::scope(|scope| {
        let handle = scope.spawn(first);
        let second = second();
        let first = handle
            .join()
            .unwrap_or_else(|payload| panic::resume_unwind(payload));
        (first, second)
    })
}

fn spinner(message: &'static str) -> ProgressBar {
    let progress = ProgressBar::new_spinner();
    progress.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    progress.set_message(message);
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}
