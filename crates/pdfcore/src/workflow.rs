use crate::Values;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub type WorkflowId = Uuid;

/// A user-submitted action graph plus its execution settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    #[serde(default = "Uuid::new_v4")]
    pub id: WorkflowId,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub actions: Vec<Action>,
    #[serde(default)]
    pub settings: WorkflowSettings,
}

impl Workflow {
    pub fn new(name: impl Into<String>, actions: Vec<Action>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            actions,
            settings: WorkflowSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: WorkflowSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Total number of action nodes in the tree
    pub fn node_count(&self) -> usize {
        fn count(actions: &[Action]) -> usize {
            actions
                .iter()
                .map(|a| 1 + a.actions.as_deref().map(count).unwrap_or(0))
                .sum()
        }
        count(&self.actions)
    }
}

/// One node of the action graph
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Action {
    #[serde(rename = "type")]
    pub action_type: String,
    #[serde(default, skip_serializing_if = "Values::is_empty")]
    pub values: Values,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<Action>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
}

impl Action {
    pub fn new(action_type: impl Into<String>) -> Self {
        Self {
            action_type: action_type.into(),
            values: Values::new(),
            actions: None,
            id: None,
        }
    }

    /// Terminal node
    pub fn done() -> Self {
        Self::new(ActionType::Done.as_str())
    }

    /// Delivers the current artifacts into join `id`
    pub fn wait(id: impl Into<String>) -> Self {
        let mut action = Self::new(ActionType::Wait.as_str());
        action.id = Some(serde_json::Value::String(id.into()));
        action
    }

    /// Defines join `id`; `continuation` runs once every waiter has arrived
    pub fn join(id: impl Into<String>, continuation: Vec<Action>) -> Self {
        let mut action = Self::new(ActionType::Done.as_str());
        action.id = Some(serde_json::Value::String(id.into()));
        action.actions = Some(continuation);
        action
    }

    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.values = self.values.with(key, value);
        self
    }

    pub fn then(mut self, actions: Vec<Action>) -> Self {
        self.actions = Some(actions);
        self
    }

    /// Join identifier from the top-level `id`, falling back to `values.id`
    pub fn join_id(&self) -> Option<String> {
        match &self.id {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(serde_json::Value::Number(n)) => Some(n.to_string()),
            _ => self.values.join_id(),
        }
    }

    pub fn children(&self) -> &[Action] {
        self.actions.as_deref().unwrap_or(&[])
    }
}

/// Recognized action types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionType {
    Done,
    Wait,
    Extract,
    Impose,
    Merge,
    Rotate,
    Split,
    UpdateMetadata,
    SortPagesWithPreset,
    RemoveBlankPages,
    SplitOn,
}

impl ActionType {
    pub const ALL: [ActionType; 11] = [
        ActionType::Done,
        ActionType::Wait,
        ActionType::Extract,
        ActionType::Impose,
        ActionType::Merge,
        ActionType::Rotate,
        ActionType::Split,
        ActionType::UpdateMetadata,
        ActionType::SortPagesWithPreset,
        ActionType::RemoveBlankPages,
        ActionType::SplitOn,
    ];

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Done => "done",
            ActionType::Wait => "wait",
            ActionType::Extract => "extract",
            ActionType::Impose => "impose",
            ActionType::Merge => "merge",
            ActionType::Rotate => "rotate",
            ActionType::Split => "split",
            ActionType::UpdateMetadata => "updateMetadata",
            ActionType::SortPagesWithPreset => "sortPagesWithPreset",
            ActionType::RemoveBlankPages => "removeBlankPages",
            ActionType::SplitOn => "splitOn",
        }
    }

    /// `done` and `wait` are executed by the traversal itself, not by a handler
    pub fn is_structural(&self) -> bool {
        matches!(self, ActionType::Done | ActionType::Wait)
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-workflow execution settings; unset fields fall back to the runtime config
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_execution_time_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_parallel_branches: Option<usize>,
    #[serde(default)]
    pub input_mode: InputMode,
}

/// How the initial artifacts enter the graph
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputMode {
    /// All inputs travel together as one root branch
    #[default]
    Batch,
    /// Every input is its own root branch
    PerArtifact,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_authored_graph() {
        let workflow: Workflow = serde_json::from_value(json!({
            "actions": [
                { "type": "extract", "values": { "pagesToExtractArray": [1, 2] }, "actions": [
                    { "type": "wait", "values": { "id": 1 } }
                ]},
                { "type": "done", "id": "1", "actions": [ { "type": "merge" } ] }
            ]
        }))
        .unwrap();

        assert_eq!(workflow.node_count(), 4);
        assert_eq!(workflow.settings.input_mode, InputMode::Batch);
        assert_eq!(workflow.actions[0].children()[0].join_id(), Some("1".into()));
        assert_eq!(workflow.actions[1].join_id(), Some("1".into()));
        assert!(workflow.actions[1].children()[0].actions.is_none());
    }

    #[test]
    fn action_type_names_round_trip() {
        for action_type in ActionType::ALL {
            assert_eq!(ActionType::parse(action_type.as_str()), Some(action_type));
            let encoded = serde_json::to_value(action_type).unwrap();
            assert_eq!(encoded, json!(action_type.as_str()));
        }
        assert_eq!(ActionType::parse("bogus"), None);
    }

    #[test]
    fn settings_accept_per_artifact_mode() {
        let settings: WorkflowSettings =
            serde_json::from_value(json!({ "input_mode": "per_artifact", "max_parallel_branches": 2 }))
                .unwrap();
        assert_eq!(settings.input_mode, InputMode::PerArtifact);
        assert_eq!(settings.max_parallel_branches, Some(2));
        assert_eq!(settings.max_execution_time_ms, None);
    }
}
