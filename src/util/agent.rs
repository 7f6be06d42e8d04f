use crate::model::{Agent, Source, SourceLink};

/// Display styling for a source badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Swatch {
    Solid(&'static str),
    Gradient(&'static str, &'static str),
    /// The theme's accent colour; used for sources outside the known set.
    Accent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Badge {
    pub label: &'static str,
    pub background: Swatch,
    pub foreground: &'static str,
}

const WHITE: &str = "#FFFFFF";

pub fn agent_badge(agent: Agent) -> Badge {
    let background = match agent {
        Agent::YouTube => Swatch::Solid("#FF0000"),
        Agent::Google => Swatch::Solid("#4285F4"),
        Agent::Forbes => Swatch::Solid("#000000"),
        Agent::Wikipedia => Swatch::Solid("#636466"),
        Agent::DallE => Swatch::Gradient("#C084FC", "#DB2777"),
        Agent::Unsplash => Swatch::Solid("#000000"),
    };
    Badge {
        label: agent.as_str(),
        background,
        foreground: WHITE,
    }
}

/// Badge for any source. Unknown publishers get the accent style and the
/// generic "Source" label.
pub fn source_badge(source: &Source) -> Badge {
    match source {
        Source::Known(agent) => agent_badge(*agent),
        Source::Other(_) => Badge {
            label: "Source",
            background: Swatch::Accent,
            foreground: WHITE,
        },
    }
}

/// Known agents referenced by `links`, deduplicated, in first-seen order.
pub fn unique_agents(links: &[SourceLink]) -> Vec<Agent> {
    let mut agents = Vec::new();
    for agent in links.iter().filter_map(|link| link.source.agent()) {
        if !agents.contains(&agent) {
            agents.push(agent);
        }
    }
    agents
}
