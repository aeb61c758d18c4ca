//! Agent counts and the agent filter.

use crate::snapshot::Agent;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Activity filter for the agent list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    /// At least one active task
    Active,
    /// No active tasks
    Idle,
}

impl StatusFilter {
    fn matches(self, agent: &Agent) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Active => agent.is_active(),
            StatusFilter::Idle => !agent.is_active(),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "active" => Ok(StatusFilter::Active),
            "idle" => Ok(StatusFilter::Idle),
            _ => Err(format!(
                "Invalid status filter: {}. Use 'all', 'active' or 'idle'",
                s
            )),
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StatusFilter::All => "all",
            StatusFilter::Active => "active",
            StatusFilter::Idle => "idle",
        })
    }
}

/// Conjunctive agent filter: search text, activity status and model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentFilter {
    /// Case-insensitive substring of name or description; empty matches all
    pub search: String,
    pub status: StatusFilter,
    /// Model the agent must be allowed to use; `None` or `"all"` matches all
    pub model: Option<String>,
}

impl AgentFilter {
    pub fn matches(&self, agent: &Agent) -> bool {
        self.matches_search(agent) && self.status.matches(agent) && self.matches_model(agent)
    }

    fn matches_search(&self, agent: &Agent) -> bool {
        let needle = self.search.trim().to_lowercase();
        needle.is_empty()
            || agent.name.to_lowercase().contains(&needle)
            || agent.description.to_lowercase().contains(&needle)
    }

    fn matches_model(&self, agent: &Agent) -> bool {
        match self.model.as_deref() {
            None | Some("all") | Some("") => true,
            Some(model) => agent.models.iter().any(|m| m == model),
        }
    }
}

pub fn filter_agents<'a>(agents: &'a [Agent], filter: &AgentFilter) -> Vec<&'a Agent> {
    agents.iter().filter(|agent| filter.matches(agent)).collect()
}

/// Agents holding at least one task.
pub fn active_agent_count(agents: &[Agent]) -> usize {
    agents.iter().filter(|agent| agent.is_active()).count()
}

/// Tasks held across all agents.
pub fn total_active_tasks(agents: &[Agent]) -> usize {
    agents.iter().map(|agent| agent.active_tasks().len()).sum()
}

/// Distinct models referenced by any agent, sorted; the model filter's options.
pub fn available_models(agents: &[Agent]) -> Vec<String> {
    agents
        .iter()
        .flat_map(|agent| agent.models.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
