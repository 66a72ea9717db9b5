//! Command vocabulary: slash-command parsing and the monitoring command table.

/// One read-only monitoring command: the bot command name, the line announced
/// to the user before running it, and the exact shell pipeline executed on the
/// remote host.
pub struct MonitorCommand {
    pub name: &'static str,
    pub announce: &'static str,
    pub command: &'static str,
}

/// Fixed table of host-monitoring commands. Adding a row here is all it takes
/// to expose a new read-only probe.
pub const MONITOR_COMMANDS: &[MonitorCommand] = &[
    MonitorCommand {
        name: "get_release",
        announce: "OS release",
        command: "cat /etc/os-release | head -n 5",
    },
    MonitorCommand {
        name: "get_uname",
        announce: "Kernel and architecture",
        command: "uname -a",
    },
    MonitorCommand {
        name: "get_uptime",
        announce: "Uptime",
        command: "uptime",
    },
    MonitorCommand {
        name: "get_df",
        announce: "Filesystem usage",
        command: "df -h",
    },
    MonitorCommand {
        name: "get_free",
        announce: "Memory usage",
        command: "free -h",
    },
    MonitorCommand {
        name: "get_mpstat",
        announce: "CPU statistics",
        command: "mpstat",
    },
    MonitorCommand {
        name: "get_w",
        announce: "Logged-in users",
        command: "w",
    },
    MonitorCommand {
        name: "get_auths",
        announce: "Last 10 logins",
        command: "last -n 10",
    },
    MonitorCommand {
        name: "get_critical",
        announce: "Last 5 critical events",
        command: "journalctl -p crit -n 5 --no-pager",
    },
    MonitorCommand {
        name: "get_ps",
        announce: "Running processes",
        command: "ps aux | head -n 20",
    },
    MonitorCommand {
        name: "get_ss",
        announce: "Listening sockets",
        command: "ss -tuln",
    },
    MonitorCommand {
        name: "get_services",
        announce: "Running services",
        command: "systemctl list-units --type=service --state=running --no-pager | head -n 20",
    },
];

/// A recognized bot command.
pub enum BotCommand {
    Start,
    Help,
    FindEmail,
    FindPhoneNumber,
    VerifyPassword,
    AptList,
    Monitor(&'static MonitorCommand),
    ReplLogs,
    GetEmails,
    GetPhoneNumbers,
}

/// Parse a `/command` message. Accepts the `/cmd@botname` form Telegram sends
/// in group chats and ignores anything after the first whitespace. Returns
/// `None` for text that is not a known command.
pub fn parse_command(text: &str) -> Option<BotCommand> {
    let first = text.trim().split_whitespace().next()?;
    let name = first.strip_prefix('/')?;
    let name = name.split('@').next().unwrap_or(name).to_ascii_lowercase();

    let cmd = match name.as_str() {
        "start" => BotCommand::Start,
        "help" => BotCommand::Help,
        "find_email" => BotCommand::FindEmail,
        "find_phone_number" => BotCommand::FindPhoneNumber,
        "verify_password" => BotCommand::VerifyPassword,
        "get_apt_list" => BotCommand::AptList,
        "get_repl_logs" => BotCommand::ReplLogs,
        "get_emails" => BotCommand::GetEmails,
        "get_phone_numbers" => BotCommand::GetPhoneNumbers,
        other => {
            let m = MONITOR_COMMANDS.iter().find(|m| m.name == other)?;
            BotCommand::Monitor(m)
        }
    };
    Some(cmd)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_addressed_forms() {
        assert!(matches!(parse_command("/start"), Some(BotCommand::Start)));
        assert!(matches!(
            parse_command("/find_email@opsbot trailing words"),
            Some(BotCommand::FindEmail)
        ));
        assert!(matches!(
            parse_command("  /GET_UPTIME  "),
            Some(BotCommand::Monitor(m)) if m.name == "get_uptime"
        ));
    }

    #[test]
    fn unknown_or_non_command_text_is_none() {
        assert!(parse_command("/frobnicate").is_none());
        assert!(parse_command("hello there").is_none());
        assert!(parse_command("").is_none());
    }

    #[test]
    fn monitor_table_is_complete_and_unique() {
        assert_eq!(MONITOR_COMMANDS.len(), 12);
        for m in MONITOR_COMMANDS {
            assert!(m.name.starts_with("get_"));
            assert!(!m.command.is_empty());
            assert_eq!(
                MONITOR_COMMANDS.iter().filter(|o| o.name == m.name).count(),
                1
            );
        }
        assert!(matches!(
            parse_command("/get_df"),
            Some(BotCommand::Monitor(m)) if m.command == "df -h"
        ));
    }
}
