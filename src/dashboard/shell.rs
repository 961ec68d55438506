use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use super::page::{Dashboard, Tab};
use super::report_form::FormField;

pub const HELP: &str = "\
commands:
  list                      reload and show reports
  tab reports|create        switch tab
  title|description|location|status <value>
                            edit the creation form
  submit                    create the report
  open <n|id>               show comments for a report
  comment <text>            add a comment to the open report
  close                     back to the report list
  help                      this text
  quit                      leave
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    List,
    Tab(Tab),
    Set(FormField, String),
    Submit,
    Open(String),
    Comment(String),
    Close,
    Help,
    Quit,
}

pub fn parse(line: &str) -> Result<ShellCommand, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word {
        "list" | "ls" => ShellCommand::List,
        "tab" => match rest {
            "reports" => ShellCommand::Tab(Tab::Reports),
            "create" => ShellCommand::Tab(Tab::Create),
            other => return Err(format!("unknown tab '{other}'")),
        },
        "title" => ShellCommand::Set(FormField::Title, rest.to_string()),
        "description" => ShellCommand::Set(FormField::Description, rest.to_string()),
        "location" => ShellCommand::Set(FormField::Location, rest.to_string()),
        "status" => ShellCommand::Set(FormField::Status, rest.to_string()),
        "submit" => ShellCommand::Submit,
        "open" if !rest.is_empty() => ShellCommand::Open(rest.to_string()),
        "open" => return Err("usage: open <n|id>".to_string()),
        "comment" => ShellCommand::Comment(rest.to_string()),
        "close" => ShellCommand::Close,
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" => ShellCommand::Quit,
        "" => return Err(String::new()),
        other => return Err(format!("unknown command '{other}', try `help`")),
    };
    Ok(command)
}

/// Drives the dashboard from line input until `quit` or end of input.
pub async fn run<R, W>(
    dashboard: &mut Dashboard,
    input: R,
    mut output: W,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    dashboard.load_reports().await;
    flush(dashboard, &mut output).await?;

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        let command = match parse(&line) {
            Ok(command) => command,
            Err(message) if message.is_empty() => continue,
            Err(message) => {
                output.write_all(format!("{message}\n").as_bytes()).await?;
                continue;
            }
        };

        match command {
            ShellCommand::Quit => break,
            ShellCommand::Help => {
                output.write_all(HELP.as_bytes()).await?;
                continue;
            }
            ShellCommand::List => {
                dashboard.close_comments();
                dashboard.select_tab(Tab::Reports);
                dashboard.load_reports().await;
            }
            ShellCommand::Tab(tab) => dashboard.select_tab(tab),
            ShellCommand::Set(field, value) => dashboard.form.set(field, &value),
            ShellCommand::Submit => {
                dashboard.submit_report().await;
            }
            ShellCommand::Open(target) => {
                let id = match target.parse::<usize>() {
                    Ok(position) => dashboard.list.get(position).map(|r| r.id.to_string()),
                    Err(_) => Some(target),
                };
                let opened = match id {
                    Some(id) => dashboard.view_comments(&id).await,
                    None => false,
                };
                if !opened {
                    output.write_all(b"no such report in the list\n").await?;
                }
            }
            ShellCommand::Comment(text) => {
                if dashboard.selected.is_none() {
                    output.write_all(b"open a report first\n").await?;
                    continue;
                }
                dashboard.submit_comment(&text).await;
            }
            ShellCommand::Close => dashboard.close_comments(),
        }
        flush(dashboard, &mut output).await?;
    }
    output.flush().await
}

async fn flush<W: AsyncWrite + Unpin>(
    dashboard: &mut Dashboard,
    output: &mut W,
) -> std::io::Result<()> {
    for toast in dashboard.take_toasts() {
        output.write_all(format!("{toast}\n").as_bytes()).await?;
    }
    output.write_all(dashboard.render().as_bytes()).await?;
    output.flush().await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::api::ReportsApi;
    use crate::db::memory_report_store::InMemoryReportStore;
    use crate::session::Session;
    use uuid::Uuid;

    #[test]
    fn parses_commands_with_arguments() {
        assert_eq!(parse("  list "), Ok(ShellCommand::List));
        assert_eq!(parse("tab create"), Ok(ShellCommand::Tab(Tab::Create)));
        assert_eq!(
            parse("title   Broken light on 5th"),
            Ok(ShellCommand::Set(FormField::Title, "Broken light on 5th".into()))
        );
        assert_eq!(parse("open 2"), Ok(ShellCommand::Open("2".into())));
        assert_eq!(parse("comment"), Ok(ShellCommand::Comment(String::new())));
        assert!(parse("open").is_err());
        assert!(parse("tab archive").is_err());
        assert!(parse("frobnicate").unwrap_err().contains("help"));
    }

    #[tokio::test]
    async fn scripted_session_creates_and_comments() {
        let store = Arc::new(InMemoryReportStore::new());
        let api = ReportsApi::new(store);
        let mut dashboard = Dashboard::new(api, Session::for_user(Uuid::new_v4()));

        let script = concat!(
            "tab create\n",
            "title Pothole\n",
            "location Main St\n",
            "submit\n",
            "tab reports\n",
            "open 1\n",
            "comment seen it\n",
            "close\n",
            "quit\n",
            "list\n",
        )
        .as_bytes();
        let mut output = Vec::new();
        run(&mut dashboard, script, &mut output).await.expect("run");

        let output = String::from_utf8(output).expect("utf8");
        assert!(output.contains("Report created successfully"));
        assert!(output.contains("Comments for: Pothole"));
        assert!(output.contains("Comment added successfully"));
        assert!(output.contains("seen it"));
        assert!(dashboard.selected.is_none());
        assert_eq!(dashboard.list.reports.len(), 1);
    }

    #[tokio::test]
    async fn comment_without_open_report_is_refused() {
        let api = ReportsApi::new(Arc::new(InMemoryReportStore::new()));
        let mut dashboard = Dashboard::new(api, Session::for_user(Uuid::new_v4()));

        let mut output = Vec::new();
        run(&mut dashboard, &b"comment hello\nopen 3\n"[..], &mut output)
            .await
            .expect("run");

        let output = String::from_utf8(output).expect("utf8");
        assert!(output.contains("open a report first"));
        assert!(output.contains("no such report in the list"));
    }
}
