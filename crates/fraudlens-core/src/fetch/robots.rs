//! Minimal `robots.txt` interpretation.
//!
//! Groups are selected by user-agent token (most specific match, else `*`);
//! within a group the longest matching rule wins and ties go to `Allow`.
//! `*` wildcards and a trailing `$` anchor are honoured.

#[derive(Debug, Clone, PartialEq)]
struct Rule {
    allow: bool,
    pattern: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Group {
    agents: Vec<String>,
    rules: Vec<Rule>,
}

/// A parsed crawl-permission declaration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RobotsPolicy {
    groups: Vec<Group>,
}

impl RobotsPolicy {
    /// A policy that allows everything.
    pub fn allow_all() -> Self {
        Self::default()
    }

    pub fn parse(text: &str) -> Self {
        let mut groups: Vec<Group> = Vec::new();
        let mut current: Option<Group> = None;
        let mut in_rules = false;

        for line in text.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user-agent" => {
                    // A user-agent line after rules starts a new group.
                    if in_rules {
                        groups.extend(current.take());
                        in_rules = false;
                    }
                    let group = current.get_or_insert_with(Group::default);
                    // An empty token names no crawler; its rules still form a group.
                    if !value.is_empty() {
                        group.agents.push(value.to_lowercase());
                    }
                }
                "allow" | "disallow" => {
                    let Some(group) = current.as_mut() else {
                        continue;
                    };
                    in_rules = true;
                    if value.is_empty() {
                        // `Disallow:` with no path means allow all.
                        continue;
                    }
                    group.rules.push(Rule {
                        allow: key == "allow",
                        pattern: value.to_string(),
                    });
                }
                _ => {}
            }
        }
        groups.extend(current);

        Self { groups }
    }

    /// Whether `user_agent` may fetch `path` (path plus optional query).
    pub fn is_allowed(&self, user_agent: &str, path: &str) -> bool {
        let Some(group) = self.select_group(user_agent) else {
            return true;
        };

        let path = if path.is_empty() { "/" } else { path };
        let mut best: Option<&Rule> = None;
        for rule in &group.rules {
            if !pattern_matches(&rule.pattern, path) {
                continue;
            }
            best = match best {
                None => Some(rule),
                Some(prev) if rule.pattern.len() > prev.pattern.len() => Some(rule),
                Some(prev) if rule.pattern.len() == prev.pattern.len() && rule.allow => Some(rule),
                Some(prev) => Some(prev),
            };
        }
        best.map(|r| r.allow).unwrap_or(true)
    }

    fn select_group(&self, user_agent: &str) -> Option<&Group> {
        let ua = user_agent.to_lowercase();
        let specific = self
            .groups
            .iter()
            .flat_map(|g| g.agents.iter().map(move |a| (a, g)))
            .filter(|(agent, _)| agent.as_str() != "*" && ua.contains(agent.as_str()))
            .max_by_key(|(agent, _)| agent.len())
            .map(|(_, g)| g);

        specific.or_else(|| {
            self.groups
                .iter()
                .find(|g| g.agents.iter().any(|a| a == "*"))
        })
    }
}

fn pattern_matches(pattern: &str, path: &str) -> bool {
    let (pattern, anchored) = match pattern.strip_suffix('$') {
        Some(p) => (p, true),
        None => (pattern, false),
    };

    let mut parts = pattern.split('*');
    let first = parts.next().unwrap_or("");
    if !path.starts_with(first) {
        return false;
    }
    let mut pos = first.len();
    let rest: Vec<&str> = parts.collect();
    if rest.is_empty() {
        return !anchored || pos == path.len();
    }

    for (i, part) in rest.iter().enumerate() {
        if anchored && i == rest.len() - 1 {
            return path[pos..].ends_with(part);
        }
        match path[pos..].find(part) {
            Some(idx) => pos += idx + part.len(),
            None => return false,
        }
    }
    true
}
