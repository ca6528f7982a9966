//! Status indicator text and tooltip

use lemonade_core::Session;

const TITLE: &str = "Lemonade";
const NO_SESSIONS: &str = "No running sessions";

/// Rendered status indicator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusView {
    pub text: String,
    pub tooltip: String,
}

impl StatusView {
    pub fn render(sessions: &[Session]) -> Self {
        let text = match sessions.len() {
            0 => TITLE.to_string(),
            n => format!("{TITLE} ({n})"),
        };

        let tooltip = if sessions.is_empty() {
            NO_SESSIONS.to_string()
        } else {
            sessions
                .iter()
                .map(session_block)
                .collect::<Vec<_>>()
                .join("---\n")
        };

        Self { text, tooltip }
    }
}

fn session_block(session: &Session) -> String {
    let mut block = format!(
        "## {}\nID: {}\nType: {}\nFile: {}\n",
        session.name(),
        session.id(),
        session.kind(),
        session.project()
    );

    if let Some(address) = session.address() {
        block.push_str(&format!("Address: {address}\n"));
    }

    block.push_str(&format!("Uptime: {}\n", format_uptime(session.duration())));
    block
}

/// `1h 02m 03s`, `4m 05s`, `6s`
pub fn format_uptime(duration: chrono::Duration) -> String {
    let total = duration.num_seconds().max(0);
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);

    if hours > 0 {
        format!("{hours}h {minutes:02}m {seconds:02}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds:02}s")
    } else {
        format!("{seconds}s")
    }
}
