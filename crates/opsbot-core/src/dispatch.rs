//! Command dispatcher and conversation state machine.
//!
//! Routes slash commands and plain text through the session store and the
//! remote/contact gateways. Remote and database failures come back as data
//! and are rendered into the reply; only messenger send failures propagate
//! as `Err`.

use std::sync::Arc;

use crate::{
    commands::{parse_command, BotCommand, MonitorCommand, MONITOR_COMMANDS},
    domain::ChatId,
    extract,
    formatting,
    messaging::{ChatAction, MessagingPort},
    remote::{RemoteGateway, NO_DATA},
    session::{Flow, SessionStore},
    store::{ContactGateway, ContactKind},
    Result,
};

/// Affirmative replies for a save confirmation, matched case-insensitively.
const CONFIRM_TOKENS: &[&str] = &["y", "yes", "да", "д"];

const RECENT_LIMIT: i64 = 20;

const LOCATE_PG_LOG: &str =
    "ls /var/log/postgresql/postgresql-*.log 2>/dev/null | sort | tail -n 1";

pub struct CommandDispatcher {
    sessions: SessionStore,
    remote: Arc<dyn RemoteGateway>,
    store: Arc<dyn ContactGateway>,
    messenger: Arc<dyn MessagingPort>,
}

impl CommandDispatcher {
    pub fn new(
        remote: Arc<dyn RemoteGateway>,
        store: Arc<dyn ContactGateway>,
        messenger: Arc<dyn MessagingPort>,
    ) -> Self {
        Self {
            sessions: SessionStore::default(),
            remote,
            store,
            messenger,
        }
    }

    /// Handle a `/command` message. Any in-flight flow for the chat is
    /// abandoned first, so commands always start from a clean state.
    pub async fn handle_command(&self, chat_id: ChatId, user_name: &str, text: &str) -> Result<()> {
        self.sessions.clear(chat_id).await;

        let Some(cmd) = parse_command(text) else {
            self.send(chat_id, "Unknown command. See /start for the list.")
                .await?;
            return Ok(());
        };

        match cmd {
            BotCommand::Start => {
                let greeting = format!(
                    "Hello, {user_name}! I can search text for contact data and run \
                     diagnostics on the monitored host."
                );
                self.send(chat_id, &greeting).await?;
                self.send(chat_id, &command_list()).await?;
            }
            BotCommand::Help => {
                self.send(chat_id, "See /start for the full command list.")
                    .await?;
            }
            BotCommand::FindEmail => {
                self.enter_flow(
                    chat_id,
                    "Send me the text to search for email addresses.",
                    Flow::AwaitingEmailText,
                )
                .await?;
            }
            BotCommand::FindPhoneNumber => {
                self.enter_flow(
                    chat_id,
                    "Send me the text to search for phone numbers.",
                    Flow::AwaitingPhoneText,
                )
                .await?;
            }
            BotCommand::VerifyPassword => {
                self.enter_flow(
                    chat_id,
                    "Send me the password to check.",
                    Flow::AwaitingPassword,
                )
                .await?;
            }
            BotCommand::AptList => {
                self.enter_flow(
                    chat_id,
                    "Send a package name, or 'all' for the full package list.",
                    Flow::AwaitingAptPackage,
                )
                .await?;
            }
            BotCommand::Monitor(m) => self.run_monitor(chat_id, m).await?,
            BotCommand::ReplLogs => self.run_repl_logs(chat_id).await?,
            BotCommand::GetEmails => self.list_contacts(chat_id, ContactKind::Email).await?,
            BotCommand::GetPhoneNumbers => self.list_contacts(chat_id, ContactKind::Phone).await?,
        }
        Ok(())
    }

    /// Handle plain (non-command) text. Ignored unless a flow is active.
    pub async fn handle_text(&self, chat_id: ChatId, text: &str) -> Result<()> {
        let Some(flow) = self.sessions.take(chat_id).await else {
            return Ok(());
        };

        match flow {
            Flow::AwaitingEmailText => {
                self.collect_findings(chat_id, ContactKind::Email, text)
                    .await?;
            }
            Flow::AwaitingPhoneText => {
                self.collect_findings(chat_id, ContactKind::Phone, text)
                    .await?;
            }
            Flow::AwaitingEmailConfirm { findings } => {
                self.confirm_save(chat_id, ContactKind::Email, findings, text)
                    .await?;
            }
            Flow::AwaitingPhoneConfirm { findings } => {
                self.confirm_save(chat_id, ContactKind::Phone, findings, text)
                    .await?;
            }
            Flow::AwaitingPassword => {
                let reply = match extract::password_strength(text) {
                    extract::Strength::Strong => "Password is strong.",
                    extract::Strength::Weak => "Password is weak.",
                };
                self.send(chat_id, reply).await?;
            }
            Flow::AwaitingAptPackage => {
                let pkg = text.trim();
                let command = if pkg.eq_ignore_ascii_case("all") {
                    "dpkg -l".to_string()
                } else {
                    format!("apt show {pkg} 2>/dev/null || echo 'Package not found'")
                };
                self.send(chat_id, "Package information").await?;
                self.typing(chat_id).await;
                let result = self.remote.execute(&command).await;
                self.send(chat_id, &result.user_text()).await?;
            }
        }
        Ok(())
    }

    async fn enter_flow(&self, chat_id: ChatId, prompt: &str, flow: Flow) -> Result<()> {
        self.send(chat_id, prompt).await?;
        self.sessions.begin(chat_id, flow).await;
        Ok(())
    }

    async fn collect_findings(&self, chat_id: ChatId, kind: ContactKind, text: &str) -> Result<()> {
        let findings = match kind {
            ContactKind::Email => extract::extract_emails(text),
            ContactKind::Phone => extract::extract_phones(text),
        };

        if findings.is_empty() {
            self.send(chat_id, &format!("No {} found.", kind.label()))
                .await?;
            return Ok(());
        }

        let reply = format!(
            "Found these {}:\n{}\nSave to database? (y/n)",
            kind.label(),
            formatting::format_numbered(&findings)
        );
        self.send(chat_id, &formatting::truncate_reply(&reply)).await?;

        let next = match kind {
            ContactKind::Email => Flow::AwaitingEmailConfirm { findings },
            ContactKind::Phone => Flow::AwaitingPhoneConfirm { findings },
        };
        self.sessions.begin(chat_id, next).await;
        Ok(())
    }

    async fn confirm_save(
        &self,
        chat_id: ChatId,
        kind: ContactKind,
        findings: Vec<String>,
        reply: &str,
    ) -> Result<()> {
        let affirmative = CONFIRM_TOKENS.contains(&reply.trim().to_lowercase().as_str());
        if !affirmative {
            self.send(chat_id, "Save cancelled.").await?;
            return Ok(());
        }

        let text = match self.store.insert(kind, &findings).await {
            Ok(report) => format!(
                "Saved {} new of {} submitted {}.",
                report.inserted,
                report.submitted,
                kind.label()
            ),
            Err(e) => {
                tracing::warn!("contact insert failed: {e}");
                format!("Database error: {e}")
            }
        };
        self.send(chat_id, &text).await?;
        Ok(())
    }

    async fn run_monitor(&self, chat_id: ChatId, m: &'static MonitorCommand) -> Result<()> {
        self.send(chat_id, m.announce).await?;
        self.typing(chat_id).await;
        let result = self.remote.execute(m.command).await;
        if !result.succeeded {
            tracing::warn!(command = m.name, "remote command failed");
        }
        self.send(chat_id, &result.user_text()).await?;
        Ok(())
    }

    async fn run_repl_logs(&self, chat_id: ChatId) -> Result<()> {
        self.send(chat_id, "PostgreSQL replication log entries").await?;
        self.typing(chat_id).await;

        let located = self.remote.execute(LOCATE_PG_LOG).await;
        if !located.succeeded {
            self.send(chat_id, &located.user_text()).await?;
            return Ok(());
        }

        let log_path = located.output.lines().last().unwrap_or("").trim();
        if log_path.is_empty() || log_path == NO_DATA || log_path.contains("No such file") {
            self.send(chat_id, "PostgreSQL logs not found.").await?;
            return Ok(());
        }

        let grep = format!(
            "grep -i 'replication\\|standby\\|ready' {log_path} | tail -n 20"
        );
        let result = self.remote.execute(&grep).await;
        if result.succeeded && result.output == NO_DATA {
            self.send(chat_id, "No replication entries found.").await?;
        } else {
            self.send(chat_id, &result.user_text()).await?;
        }
        Ok(())
    }

    async fn list_contacts(&self, chat_id: ChatId, kind: ContactKind) -> Result<()> {
        self.send(chat_id, &format!("Stored {}", kind.label())).await?;

        let text = match self.store.query_recent(kind, RECENT_LIMIT).await {
            Ok(rows) if rows.is_empty() => NO_DATA.to_string(),
            Ok(rows) => formatting::truncate_reply(&formatting::format_numbered(&rows)),
            Err(e) => {
                tracing::warn!("contact query failed: {e}");
                format!("Database error: {e}")
            }
        };
        self.send(chat_id, &text).await?;
        Ok(())
    }

    async fn send(&self, chat_id: ChatId, text: &str) -> Result<()> {
        self.messenger.send_text(chat_id, text).await?;
        Ok(())
    }

    /// Typing indicator is best-effort; a failure must not abort the command.
    async fn typing(&self, chat_id: ChatId) {
        if let Err(e) = self
            .messenger
            .send_chat_action(chat_id, ChatAction::Typing)
            .await
        {
            tracing::debug!("chat action failed: {e}");
        }
    }
}

fn command_list() -> String {
    let mut lines = vec![
        "Text analysis:".to_string(),
        "/find_email - search text for email addresses".to_string(),
        "/find_phone_number - search text for phone numbers".to_string(),
        "/verify_password - check password strength".to_string(),
        String::new(),
        "Host monitoring:".to_string(),
    ];
    for m in MONITOR_COMMANDS {
        lines.push(format!("/{} - {}", m.name, m.announce));
    }
    lines.push("/get_apt_list - installed package info".to_string());
    lines.push("/get_repl_logs - PostgreSQL replication log entries".to_string());
    lines.push(String::new());
    lines.push("Stored contacts:".to_string());
    lines.push("/get_emails - recently saved email addresses".to_string());
    lines.push("/get_phone_numbers - recently saved phone numbers".to_string());
    lines.join("\n")
}
