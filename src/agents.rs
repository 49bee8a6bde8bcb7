//! Known AI coding agents and how they are grouped in reports.

use crate::models::Agent;

/// Agents queried for every collected date, in collection order.
pub const AGENTS: &[Agent] = &[
    Agent {
        name: "Claude Code",
        key: "claude",
        query: "\"noreply@anthropic.com\"",
    },
    Agent {
        name: "GitHub Copilot",
        key: "copilot",
        query: "author:copilot-swe-agent[bot]",
    },
    Agent {
        name: "OpenAI Codex",
        key: "codex",
        query: "author:chatgpt-codex-connector[bot]",
    },
    Agent {
        name: "Cursor",
        key: "cursor",
        query: "\"cursoragent@cursor.com\"",
    },
    Agent {
        name: "Cursor Background Agent",
        key: "cursor_bg",
        query: "author:cursor[bot]",
    },
    Agent {
        name: "Devin",
        key: "devin",
        query: "author:devin-ai-integration[bot]",
    },
    Agent {
        name: "Jules",
        key: "jules",
        query: "author:google-labs-jules[bot]",
    },
    Agent {
        name: "Aider",
        key: "aider",
        query: "\"Co-authored-by: aider\"",
    },
    Agent {
        name: "Amp",
        key: "amp",
        query: "\"amp@ampcode.com\"",
    },
    Agent {
        name: "OpenHands",
        key: "openhands",
        query: "\"openhands@all-hands.dev\"",
    },
    Agent {
        name: "Factory",
        key: "factory",
        query: "author:factory-droid[bot]",
    },
];

/// Report rows: display name and the agent keys summed into it.
pub const DISPLAY_GROUPS: &[(&str, &[&str])] = &[
    ("Claude Code", &["claude"]),
    ("GitHub Copilot", &["copilot"]),
    ("OpenAI Codex", &["codex"]),
    ("Cursor", &["cursor", "cursor_bg"]),
    ("Devin", &["devin"]),
    ("Jules", &["jules"]),
    ("Aider", &["aider"]),
    ("Amp", &["amp"]),
    ("OpenHands", &["openhands"]),
    ("Factory", &["factory"]),
];

/// Every agent key, in collection order.
pub fn all_keys() -> impl Iterator<Item = &'static str> {
    AGENTS.iter().map(|agent| agent.key)
}
