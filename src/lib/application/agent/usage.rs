use std::collections::HashMap;

/// Result of asking for one more use of a (server, tool) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageGrant {
    /// The use was counted; `count` includes it.
    Granted { count: u32, limit: u32 },
    /// The pair is at its limit; nothing was counted.
    Exhausted { limit: u32 },
}

/// Per-conversation invocation counters keyed by server, then tool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolUsage {
    counts: HashMap<String, HashMap<String, u32>>,
}

impl ToolUsage {
    /// Counts the use before the call happens, so a call that later fails
    /// still consumes budget.
    pub fn try_acquire(&mut self, server: &str, tool: &str, limit: u32) -> UsageGrant {
        let count = self
            .counts
            .entry(server.to_string())
            .or_default()
            .entry(tool.to_string())
            .or_insert(0);
        if *count >= limit {
            return UsageGrant::Exhausted { limit };
        }
        *count += 1;
        UsageGrant::Granted {
            count: *count,
            limit,
        }
    }

    pub fn count(&self, server: &str, tool: &str) -> u32 {
        self.counts
            .get(server)
            .and_then(|tools| tools.get(tool))
            .copied()
            .unwrap_or(0)
    }

    pub fn counts(&self) -> &HashMap<String, HashMap<String, u32>> {
        &self.counts
    }
}

/// Text folded into history instead of calling an exhausted tool.
pub fn limit_reached_message(tool: &str, limit: u32) -> String {
    format!("Tool usage limit reached: {tool} can only be used {limit} times.")
}
