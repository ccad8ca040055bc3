//! Replays recorded interactions from a cassette.

use std::collections::HashMap;
use std::path::Path;

use super::format::{Cassette, Interaction};

/// Replays interactions from a loaded cassette, serving them sequentially
/// per method.
pub struct CassetteReplayer {
    /// Per-method queue of interactions (in order).
    queues: HashMap<String, Vec<Interaction>>,
    /// Per-method cursor tracking position.
    cursors: HashMap<String, usize>,
}

impl CassetteReplayer {
    /// Create a new replayer from a loaded cassette.
    #[must_use]
    pub fn new(cassette: &Cassette) -> Self {
        let mut queues: HashMap<String, Vec<Interaction>> = HashMap::new();
        for interaction in &cassette.interactions {
            queues.entry(interaction.method.clone()).or_default().push(interaction.clone());
        }
        let cursors = queues.keys().map(|k| (k.clone(), 0)).collect();
        Self { queues, cursors }
    }

    /// Load a cassette file and create a replayer for it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read cassette file {}: {e}", path.display()))?;
        let cassette = Cassette::from_yaml(&content)
            .map_err(|e| format!("{e} ({})", path.display()))?;
        Ok(Self::new(&cassette))
    }

    /// Return the next interaction for the given method.
    ///
    /// # Errors
    ///
    /// Returns a message naming what was requested and what the cassette
    /// still holds when no interaction is left for `method`.
    pub fn next_interaction(&mut self, method: &str) -> Result<&Interaction, String> {
        let Some(queue) = self.queues.get(method) else {
            let mut available: Vec<&str> = self.queues.keys().map(String::as_str).collect();
            available.sort_unstable();
            return Err(format!(
                "Cassette exhausted: no interactions recorded for method={method:?}. \
                 Available methods: [{}]",
                available.join(", ")
            ));
        };

        let cursor = self.cursors.entry(method.to_string()).or_insert(0);
        let Some(interaction) = queue.get(*cursor) else {
            return Err(format!(
                "Cassette exhausted: all {count} interactions for method={method:?} \
                 have been consumed. Last interaction was seq={last_seq}.",
                count = queue.len(),
                last_seq = queue.last().map_or(0, |i| i.seq),
            ));
        };
        *cursor += 1;
        Ok(interaction)
    }
}
