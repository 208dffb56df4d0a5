use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Palette a column accent is picked from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash)]
#[serde(try_from = "String", into = "&'static str")]
pub enum ColumnColor {
    Neutral,
    Red,
    Orange,
    Amber,
    Green,
    Emerald,
    Teal,
    Cyan,
    Sky,
    Blue,
    Indigo,
    Violet,
    Purple,
    Fuchsia,
    Pink,
    Rose,
}

impl ColumnColor {
    pub const ALL: [ColumnColor; 16] = [
        ColumnColor::Neutral,
        ColumnColor::Red,
        ColumnColor::Orange,
        ColumnColor::Amber,
        ColumnColor::Green,
        ColumnColor::Emerald,
        ColumnColor::Teal,
        ColumnColor::Cyan,
        ColumnColor::Sky,
        ColumnColor::Blue,
        ColumnColor::Indigo,
        ColumnColor::Violet,
        ColumnColor::Purple,
        ColumnColor::Fuchsia,
        ColumnColor::Pink,
        ColumnColor::Rose,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ColumnColor::Neutral => "neutral",
            ColumnColor::Red => "red",
            ColumnColor::Orange => "orange",
            ColumnColor::Amber => "amber",
            ColumnColor::Green => "green",
            ColumnColor::Emerald => "emerald",
            ColumnColor::Teal => "teal",
            ColumnColor::Cyan => "cyan",
            ColumnColor::Sky => "sky",
            ColumnColor::Blue => "blue",
            ColumnColor::Indigo => "indigo",
            ColumnColor::Violet => "violet",
            ColumnColor::Purple => "purple",
            ColumnColor::Fuchsia => "fuchsia",
            ColumnColor::Pink => "pink",
            ColumnColor::Rose => "rose",
        }
    }

    /// Picks a palette entry using the random bits of a fresh v4 UUID.
    pub fn random() -> Self {
        let index = (Uuid::new_v4().as_u128() % Self::ALL.len() as u128) as usize;
        Self::ALL[index]
    }

    pub fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|color| *color == self)
            .unwrap_or_default()
    }
}

impl FromStr for ColumnColor {
    type Err = UnknownColor;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let key = normalize_color_key(value);
        ColumnColor::ALL
            .into_iter()
            .find(|color| color.as_str() == key)
            .ok_or_else(|| UnknownColor(value.to_string()))
    }
}

impl TryFrom<String> for ColumnColor {
    type Error = UnknownColor;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ColumnColor> for &'static str {
    fn from(color: ColumnColor) -> Self {
        color.as_str()
    }
}

impl fmt::Display for ColumnColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label chip colors a task can be tagged with.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash)]
#[serde(try_from = "String", into = "&'static str")]
pub enum LabelColor {
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
    Pink,
}

impl LabelColor {
    pub const ALL: [LabelColor; 7] = [
        LabelColor::Red,
        LabelColor::Orange,
        LabelColor::Yellow,
        LabelColor::Green,
        LabelColor::Blue,
        LabelColor::Purple,
        LabelColor::Pink,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LabelColor::Red => "red",
            LabelColor::Orange => "orange",
            LabelColor::Yellow => "yellow",
            LabelColor::Green => "green",
            LabelColor::Blue => "blue",
            LabelColor::Purple => "purple",
            LabelColor::Pink => "pink",
        }
    }
}

impl FromStr for LabelColor {
    type Err = UnknownColor;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let key = normalize_color_key(value);
        LabelColor::ALL
            .into_iter()
            .find(|color| color.as_str() == key)
            .ok_or_else(|| UnknownColor(value.to_string()))
    }
}

impl TryFrom<String> for LabelColor {
    type Error = UnknownColor;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LabelColor> for &'static str {
    fn from(color: LabelColor) -> Self {
        color.as_str()
    }
}

impl fmt::Display for LabelColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct UnknownColor(pub String);

impl fmt::Display for UnknownColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown color '{}'", self.0)
    }
}

impl std::error::Error for UnknownColor {}

/// Accepts plain tokens (`red`) as well as utility-class spellings
/// (`bg-red-500 text-red-500`).
fn normalize_color_key(raw: &str) -> String {
    let first = raw.split_whitespace().next().unwrap_or_default();
    let lowered = first.to_ascii_lowercase();
    let without_prefix = lowered
        .strip_prefix("bg-")
        .or_else(|| lowered.strip_prefix("text-"))
        .unwrap_or(&lowered);
    without_prefix
        .strip_suffix("-500")
        .unwrap_or(without_prefix)
        .to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct Column {
    pub id: String,
    pub title: String,
    pub color: ColumnColor,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub column_id: String,
    pub content: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub tags: Vec<LabelColor>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct BoardState {
    pub columns: Vec<Column>,
    pub tasks: Vec<Task>,
}

impl BoardState {
    pub fn empty() -> Self {
        Self {
            columns: Vec::new(),
            tasks: Vec::new(),
        }
    }

    pub fn column_index(&self, id: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.id == id)
    }

    pub fn task_index(&self, id: &str) -> Option<usize> {
        self.tasks.iter().position(|task| task.id == id)
    }
}

impl Default for BoardState {
    fn default() -> Self {
        Self {
            columns: vec![
                Column {
                    id: "todo".to_string(),
                    title: "To Do".to_string(),
                    color: ColumnColor::Neutral,
                },
                Column {
                    id: "doing".to_string(),
                    title: "In Progress".to_string(),
                    color: ColumnColor::Blue,
                },
                Column {
                    id: "done".to_string(),
                    title: "Done".to_string(),
                    color: ColumnColor::Green,
                },
            ],
            tasks: vec![Task {
                id: "1".to_string(),
                column_id: "todo".to_string(),
                content: "Set up the project".to_string(),
                image: None,
                tags: vec![LabelColor::Blue],
            }],
        }
    }
}

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_color_parses_tokens_and_class_spellings() {
        assert_eq!("red".parse::<ColumnColor>(), Ok(ColumnColor::Red));
        assert_eq!("  Sky ".parse::<ColumnColor>(), Ok(ColumnColor::Sky));
        assert_eq!(
            "bg-emerald-500 text-emerald-500".parse::<ColumnColor>(),
            Ok(ColumnColor::Emerald)
        );
        assert!("chartreuse".parse::<ColumnColor>().is_err());
    }

    #[test]
    fn test_label_color_parses_class_spelling() {
        assert_eq!("bg-blue-500".parse::<LabelColor>(), Ok(LabelColor::Blue));
        assert!("amber".parse::<LabelColor>().is_err());
    }

    #[test]
    fn test_random_color_is_in_palette() {
        for _ in 0..64 {
            assert!(ColumnColor::ALL.contains(&ColumnColor::random()));
        }
    }

    #[test]
    fn test_column_color_index_matches_palette_order() {
        assert_eq!(ColumnColor::Neutral.index(), 0);
        assert_eq!(ColumnColor::Rose.index(), 15);
    }

    #[test]
    fn test_default_board_layout() {
        let board = BoardState::default();
        let titles: Vec<&str> = board.columns.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["To Do", "In Progress", "Done"]);
        assert_eq!(board.tasks.len(), 1);
        assert_eq!(board.tasks[0].column_id, "todo");
    }

    #[test]
    fn test_task_serializes_with_camel_case_keys() {
        let task = Task {
            id: "t1".to_string(),
            column_id: "todo".to_string(),
            content: "Write docs".to_string(),
            image: None,
            tags: vec![LabelColor::Green],
        };
        let value = serde_json::to_value(&task).expect("task should serialize");
        assert_eq!(value["columnId"], "todo");
        assert_eq!(value["tags"][0], "green");
        assert!(value["image"].is_null());
    }

    #[test]
    fn test_task_deserializes_without_optional_fields() {
        let task: Task =
            serde_json::from_str(r#"{"id":"a","columnId":"doing","content":"x"}"#)
                .expect("task should deserialize");
        assert_eq!(task.image, None);
        assert!(task.tags.is_empty());
    }
}
