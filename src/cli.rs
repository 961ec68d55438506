use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use crate::api::ReportsApi;
use crate::config::Config;
use crate::dashboard::{shell, Dashboard, ReportCard};
use crate::db::memory_report_store::InMemoryReportStore;
use crate::db::postgrest_report_store::PostgrestReportStore;
use crate::models::{Comment, NewComment, NewReport, Profile, ProfileInput};
use crate::services::postgrest::PostgrestClient;
use crate::session::Session;

#[derive(Parser, Debug)]
#[command(name = "reportboard", version, about = "Reports and comments dashboard")]
pub struct Cli {
    /// Print rows as JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create, list and update reports
    Reports {
        #[command(subcommand)]
        command: ReportCommands,
    },
    /// Read and write comment threads
    Comments {
        #[command(subcommand)]
        command: CommentCommands,
    },
    /// Manage user profiles
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// Interactive dashboard shell
    Dashboard {
        /// Use a throwaway in-process store instead of the configured backend
        #[arg(long)]
        in_memory: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum ReportCommands {
    /// List every report, newest first
    List,
    /// Show one report
    Show { id: String },
    /// Show one report with its comments
    Detail { id: String },
    /// Create a report
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        location: Option<String>,
        /// open, in_progress, resolved or closed
        #[arg(long)]
        status: Option<String>,
        /// Owner; defaults to the session user
        #[arg(long)]
        user_id: Option<String>,
    },
    /// Change a report's status
    Status { id: String, status: String },
    /// Delete a report
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
pub enum CommentCommands {
    /// Comments on a report, oldest first
    List { report_id: String },
    /// Add a comment
    Add {
        report_id: String,
        content: String,
        /// Author; defaults to the session user
        #[arg(long)]
        author: Option<String>,
    },
    /// Replace a comment's text
    Edit { id: String, content: String },
    /// Delete a comment
    Delete { id: String },
}

#[derive(Args, Debug, Clone, Default)]
pub struct ProfileFields {
    #[arg(long)]
    pub full_name: Option<String>,
    #[arg(long)]
    pub avatar_url: Option<String>,
}

impl From<ProfileFields> for ProfileInput {
    fn from(fields: ProfileFields) -> Self {
        ProfileInput {
            full_name: fields.full_name,
            avatar_url: fields.avatar_url,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// Profile of the signed-in user
    Me,
    /// Profile by id
    Show { id: String },
    /// Insert a profile (session user unless --id)
    Create {
        #[arg(long)]
        id: Option<String>,
        #[command(flatten)]
        fields: ProfileFields,
    },
    /// Insert or merge a profile (session user unless --id)
    Upsert {
        #[arg(long)]
        id: Option<String>,
        #[command(flatten)]
        fields: ProfileFields,
    },
    /// Update fields of an existing profile
    Update {
        id: String,
        #[command(flatten)]
        fields: ProfileFields,
    },
}

pub fn build_api(config: &Config) -> Result<ReportsApi> {
    let http_client = reqwest::Client::builder()
        .build()
        .context("failed to build HTTP client")?;
    let client = PostgrestClient::new(
        http_client,
        config.supabase_url.clone(),
        config.supabase_anon_key.clone(),
    );
    Ok(ReportsApi::new(Arc::new(PostgrestReportStore::new(client))))
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)? + "\n")
}

fn render_comments(comments: &[Comment]) -> String {
    if comments.is_empty() {
        return "No comments yet.\n".to_string();
    }
    comments
        .iter()
        .map(|c| {
            format!(
                "{}  {}\n    {}\n    id {}\n",
                c.author_name(),
                c.created_at,
                c.content,
                c.id
            )
        })
        .collect()
}

fn render_profile(profile: &Profile) -> String {
    format!(
        "{}\n  name:   {}\n  avatar: {}\n  role:   {}\n",
        profile.id,
        profile.full_name.as_deref().unwrap_or("-"),
        profile.avatar_url.as_deref().unwrap_or("-"),
        profile.role
    )
}

/// Runs a one-shot command and returns what should be printed.
pub async fn execute(
    api: &ReportsApi,
    session: &Session,
    json: bool,
    command: Commands,
) -> Result<String> {
    let out = match command {
        Commands::Reports { command } => match command {
            ReportCommands::List => {
                let reports = api
                    .list_reports(session)
                    .await
                    .context("Failed to load reports")?;
                if json {
                    to_json(&reports)?
                } else if reports.is_empty() {
                    "No reports found\n".to_string()
                } else {
                    reports
                        .iter()
                        .enumerate()
                        .map(|(i, r)| ReportCard::new(r).render(i + 1))
                        .collect()
                }
            }
            ReportCommands::Show { id } => {
                let report = api
                    .get_report(session, &id)
                    .await
                    .context("Failed to load report")?;
                if json {
                    to_json(&report)?
                } else {
                    ReportCard::new(&report).render(1)
                }
            }
            ReportCommands::Detail { id } => {
                let detail = api
                    .get_report_detail(session, &id)
                    .await
                    .context("Failed to load report")?;
                if json {
                    to_json(&detail)?
                } else {
                    ReportCard::new(&detail.report).render(1) + &render_comments(&detail.comments)
                }
            }
            ReportCommands::Create {
                title,
                description,
                location,
                status,
                user_id,
            } => {
                let report = api
                    .create_report(
                        session,
                        NewReport {
                            user_id,
                            title,
                            description,
                            location,
                            status,
                        },
                    )
                    .await
                    .context("Failed to create report")?;
                if json {
                    to_json(&report)?
                } else {
                    format!(
                        "Report created successfully\n{}",
                        ReportCard::new(&report).render(1)
                    )
                }
            }
            ReportCommands::Status { id, status } => {
                let report = api
                    .update_report_status(session, &id, &status)
                    .await
                    .context("Failed to update report status")?;
                if json {
                    to_json(&report)?
                } else {
                    format!("Report {} is now {}\n", report.id, report.status.label())
                }
            }
            ReportCommands::Delete { id } => {
                api.delete_report(session, &id)
                    .await
                    .context("Failed to delete report")?;
                format!("Report {} deleted\n", id.trim())
            }
        },
        Commands::Comments { command } => match command {
            CommentCommands::List { report_id } => {
                let comments = api
                    .get_comments_by_report(session, &report_id)
                    .await
                    .context("Failed to load comments")?;
                if json {
                    to_json(&comments)?
                } else {
                    render_comments(&comments)
                }
            }
            CommentCommands::Add {
                report_id,
                content,
                author,
            } => {
                let comment = api
                    .add_comment(
                        session,
                        NewComment {
                            report_id,
                            author,
                            content,
                        },
                    )
                    .await
                    .context("Failed to add comment")?;
                if json {
                    to_json(&comment)?
                } else {
                    format!(
                        "Comment added successfully\n{}",
                        render_comments(&[comment])
                    )
                }
            }
            CommentCommands::Edit { id, content } => {
                let comment = api
                    .update_comment(session, &id, &content)
                    .await
                    .context("Failed to update comment")?;
                if json {
                    to_json(&comment)?
                } else {
                    render_comments(&[comment])
                }
            }
            CommentCommands::Delete { id } => {
                api.delete_comment(session, &id)
                    .await
                    .context("Failed to delete comment")?;
                format!("Comment {} deleted\n", id.trim())
            }
        },
        Commands::Profile { command } => {
            let profile = match command {
                ProfileCommands::Me => match api
                    .get_current_user_profile(session)
                    .await
                    .context("Failed to load profile")?
                {
                    Some(profile) => profile,
                    None => return Ok("No profile yet for the signed-in user\n".to_string()),
                },
                ProfileCommands::Show { id } => api
                    .get_profile(session, &id)
                    .await
                    .context("Failed to load profile")?,
                ProfileCommands::Create { id, fields } => api
                    .create_profile(session, id.as_deref(), fields.into())
                    .await
                    .context("Failed to create profile")?,
                ProfileCommands::Upsert { id, fields } => api
                    .upsert_profile(session, id.as_deref(), fields.into())
                    .await
                    .context("Failed to save profile")?,
                ProfileCommands::Update { id, fields } => api
                    .update_profile(session, &id, fields.into())
                    .await
                    .context("Failed to update profile")?,
            };
            if json {
                to_json(&profile)?
            } else {
                render_profile(&profile)
            }
        }
        Commands::Dashboard { .. } => {
            anyhow::bail!("the dashboard is interactive, use `run` instead of `execute`")
        }
    };
    Ok(out)
}

/// Entry point shared by the binary: resolves config, then runs the command.
pub async fn run(cli: Cli) -> Result<()> {
    if let Commands::Dashboard { in_memory } = cli.command {
        let (api, session) = if in_memory {
            let api = ReportsApi::new(Arc::new(InMemoryReportStore::new()));
            (api, Session::for_user(uuid::Uuid::new_v4()))
        } else {
            let config = Config::from_env().context("failed to load configuration")?;
            (build_api(&config)?, config.session())
        };
        let mut dashboard = Dashboard::new(api, session);
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        shell::run(&mut dashboard, stdin, tokio::io::stdout())
            .await
            .context("dashboard shell failed")?;
        return Ok(());
    }

    let config = Config::from_env().context("failed to load configuration")?;
    let api = build_api(&config)?;
    let output = execute(&api, &config.session(), cli.json, cli.command).await?;
    print!("{output}");
    Ok(())
}
