use crate::commands::{Commands, GithubCommands, ProfileCommands};
use crate::error::{Result as WatchResult, WatchError};
use crate::render;

use es_config::Config;
use es_core::{Entity, NewScan, ProfileUpdate, ScanLogEntry, ScanType, TargetType};
use es_realtime::RealtimeFeed;
use es_store::{AuthClient, RestStore};
use es_sync::{
    DashboardStats, FileCorrelationStore, HttpCodeExchange, LinkFlow, LiveView, NoTrends,
    OAuthCallback, RepoService, SessionContext, SubscriptionState, SyncClient, SyncError,
    UsageService,
};

use std::collections::HashMap;
use std::pin::pin;
use std::sync::Arc;

use log::{info, warn};
use serde_json::{Value, json};
use uuid::Uuid;

const EMAIL_ENV: &str = "ESPRIT_EMAIL";
const PASSWORD_ENV: &str = "ESPRIT_PASSWORD";
const REFRESH_TOKEN_ENV: &str = "ESPRIT_REFRESH_TOKEN";

/// A signed-in sync client plus the output settings of one invocation.
pub struct App {
    config: Config,
    client: SyncClient,
    pretty: bool,
}

impl App {
    /// Wire the REST store, auth client and realtime feed, then sign in with
    /// `ESPRIT_REFRESH_TOKEN` or `ESPRIT_EMAIL`/`ESPRIT_PASSWORD`.
    pub async fn connect(config: Config, pretty: bool) -> WatchResult<Self> {
        let backend = &config.backend;
        let provider = Arc::new(AuthClient::new(&backend.url, &backend.anon_key));
        let store = Arc::new(RestStore::new(&backend.url, &backend.anon_key));
        let feed = Arc::new(RealtimeFeed::new(
            &backend.url,
            &backend.anon_key,
            &config.realtime,
        ));

        let session = SessionContext::new(provider, store.clone(), config.session.clone());
        let profile = match std::env::var(REFRESH_TOKEN_ENV) {
            Ok(refresh_token) => session.restore(&refresh_token).await?,
            Err(_) => {
                let email = required_env(EMAIL_ENV)?;
                let password = required_env(PASSWORD_ENV)?;
                session.sign_in_with_password(&email, &password).await?
            }
        };
        info!("Signed in as {}", profile.display_name());

        let client = SyncClient::new(session, store, feed, &config);
        Ok(Self {
            config,
            client,
            pretty,
        })
    }

    pub async fn shutdown(&self) {
        self.client.session().sign_out().await;
    }

    pub async fn run(&self, command: Commands) -> WatchResult<()> {
        match command {
            Commands::Scans { limit, follow } => self.scans(limit, follow).await,
            Commands::Scan { id } => self.follow_scan(id).await,
            Commands::Start {
                target,
                target_type,
                scan_type,
            } => self.start_scan(target, target_type, scan_type).await,
            Commands::Cancel { id } => {
                let scan = self.client.cancel_scan(id).await?;
                self.print(&render::scan(&scan))
            }
            Commands::Stats => self.stats().await,
            Commands::Usage => {
                let summary = self.usage().current().await?;
                self.print(&render::usage(&summary))
            }
            Commands::Profile { action } => self.profile(action).await,
            Commands::Github { action } => self.github(action).await,
        }
    }

    async fn scans(&self, limit: Option<usize>, follow: bool) -> WatchResult<()> {
        let view = self.client.watch_scans(limit)?;
        ready(&view).await?;
        self.print(&render::scans(&view.items()))?;
        if !follow {
            return Ok(());
        }

        let mut seen: HashMap<Uuid, Value> = view
            .items()
            .iter()
            .map(|scan| (scan.id, render::scan(scan)))
            .collect();
        let mut changes = view.changed();
        let mut interrupt = pin!(tokio::signal::ctrl_c());

        loop {
            tokio::select! {
                _ = &mut interrupt => return Ok(()),
                changed = changes.changed() => {
                    if changed.is_err() {
                        return Ok(());
                    }
                    ensure_open(&view)?;
                    for scan in view.items() {
                        let rendered = render::scan(&scan);
                        if seen.get(&scan.id) != Some(&rendered) {
                            self.print(&rendered)?;
                            seen.insert(scan.id, rendered);
                        }
                    }
                }
            }
        }
    }

    /// Print the scan and its log as they change; returns once the scan
    /// reaches a terminal status.
    async fn follow_scan(&self, id: Uuid) -> WatchResult<()> {
        let scan_view = self.client.watch_scan(id)?;
        let log_view = self.client.watch_scan_logs(id)?;
        ready(&scan_view).await?;
        ready(&log_view).await?;

        let mut current = scan_view
            .get(id)
            .ok_or_else(|| SyncError::not_found("scans", id))?;
        self.print(&render::scan(&current))?;
        let mut printed = self.print_logs(&log_view, 0)?;

        let mut scan_changes = scan_view.changed();
        let mut log_changes = log_view.changed();
        let mut interrupt = pin!(tokio::signal::ctrl_c());

        while !current.status.is_terminal() {
            tokio::select! {
                _ = &mut interrupt => return Ok(()),
                changed = scan_changes.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    ensure_open(&scan_view)?;
                    if let Some(scan) = scan_view.get(id)
                        && scan != current
                    {
                        self.print(&render::scan(&scan))?;
                        current = scan;
                    }
                }
                changed = log_changes.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    printed = self.print_logs(&log_view, printed)?;
                }
            }
        }

        self.print_logs(&log_view, printed)?;
        Ok(())
    }

    /// Print log entries past the first `printed`; returns the new count.
    fn print_logs(&self, view: &LiveView<ScanLogEntry>, printed: usize) -> WatchResult<usize> {
        let entries = view.items();
        for entry in entries.iter().skip(printed) {
            self.print(&render::log_entry(entry))?;
        }
        Ok(entries.len().max(printed))
    }

    async fn start_scan(
        &self,
        target: String,
        target_type: TargetType,
        scan_type: ScanType,
    ) -> WatchResult<()> {
        let quota = self.usage().current().await?.quota();
        if let Some(message) = quota.message {
            return Err(WatchError::QuotaExceeded { message });
        }

        let request = NewScan::new(target, target_type, scan_type).map_err(SyncError::from)?;
        let scan = self.client.create_scan(request).await?;
        self.print(&render::scan(&scan))
    }

    async fn stats(&self) -> WatchResult<()> {
        let view = self.client.watch_scans(None)?;
        ready(&view).await?;
        let stats = DashboardStats::from_scans(&view.items(), &NoTrends);
        self.print(&render::stats(&stats))
    }

    async fn profile(&self, action: ProfileCommands) -> WatchResult<()> {
        let profile = match action {
            ProfileCommands::Show => self.client.session().refresh_profile().await?,
            ProfileCommands::Set { name, avatar_url } => {
                let mut changes = ProfileUpdate::default();
                if let Some(name) = name {
                    changes = changes.full_name(name).map_err(SyncError::from)?;
                }
                if let Some(url) = avatar_url {
                    changes = changes.avatar_url(url).map_err(SyncError::from)?;
                }
                self.client.queries().update_profile(changes).await?
            }
        };
        self.print(&render::profile(&profile))
    }

    async fn github(&self, action: GithubCommands) -> WatchResult<()> {
        match action {
            GithubCommands::Link => {
                let flow = self.link_flow()?;
                let url = flow.start()?;
                flow.redirected();
                self.print(&json!({
                    "authorize_url": url,
                    "next": "open the URL, then run: es-watch github callback --url '<redirect url>'",
                }))
            }
            GithubCommands::Callback { url, code, state } => {
                let callback = match (url, code, state) {
                    (Some(url), _, _) => OAuthCallback::from_url(&url)?,
                    (None, Some(code), Some(state)) => OAuthCallback::new(code, state),
                    _ => {
                        return Err(WatchError::Arguments {
                            message: "pass --url or both --code and --state".to_string(),
                        });
                    }
                };
                let profile = self.link_flow()?.complete(callback).await?;
                self.print(&render::profile(&profile))
            }
            GithubCommands::Disconnect => {
                let profile = self.link_flow()?.disconnect().await?;
                self.print(&render::profile(&profile))
            }
            GithubCommands::Repos { remote: true } => {
                let repos = self.repos().list_remote_repos().await?;
                self.print(&Value::Array(repos.iter().map(render::remote_repo).collect()))
            }
            GithubCommands::Repos { remote: false } => {
                let repos = self.repos().linked_repos().await?;
                self.print(&Value::Array(repos.iter().map(render::linked_repo).collect()))
            }
            GithubCommands::LinkRepo { full_name } => {
                let repos = self.repos();
                let remote = repos
                    .list_remote_repos()
                    .await?
                    .into_iter()
                    .find(|repo| repo.full_name.eq_ignore_ascii_case(&full_name))
                    .ok_or_else(|| SyncError::not_found("repos", &full_name))?;
                let linked = repos.link_repo(&remote).await?;
                self.print(&render::linked_repo(&linked))
            }
            GithubCommands::UnlinkRepo { id } => {
                self.repos().unlink_repo(id).await?;
                self.print(&json!({ "unlinked": id }))
            }
        }
    }

    fn link_flow(&self) -> WatchResult<LinkFlow> {
        let correlation = Arc::new(FileCorrelationStore::new(Config::config_dir()?));
        let exchange = Arc::new(HttpCodeExchange::new(&self.config.backend.api_url));
        Ok(LinkFlow::new(
            Arc::clone(self.client.queries()),
            correlation,
            exchange,
            self.config.github.clone(),
        ))
    }

    fn repos(&self) -> RepoService {
        RepoService::new(Arc::clone(self.client.queries()), &self.config.github)
    }

    fn usage(&self) -> UsageService {
        UsageService::new(Arc::clone(self.client.queries()), self.config.plans.clone())
    }

    fn print(&self, value: &Value) -> WatchResult<()> {
        let output = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        println!("{output}");
        Ok(())
    }
}

fn required_env(name: &str) -> WatchResult<String> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.is_empty())
        .ok_or_else(|| WatchError::EnvVar {
            message: format!("{name} must be set"),
        })
}

async fn ready<T: Entity>(view: &LiveView<T>) -> WatchResult<()> {
    view.ready().await.map_err(|e| {
        warn!("{} did not become live: {}", view.name(), e.message);
        WatchError::View {
            name: view.name().to_string(),
            message: e.message,
        }
    })
}

fn ensure_open<T: Entity>(view: &LiveView<T>) -> WatchResult<()> {
    if view.state() != SubscriptionState::Closed {
        return Ok(());
    }
    Err(WatchError::View {
        name: view.name().to_string(),
        message: view
            .last_error()
            .map(|e| e.message)
            .unwrap_or_else(|| "subscription closed".to_string()),
    })
}
