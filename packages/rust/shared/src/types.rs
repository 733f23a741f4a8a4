//! Domain types for the book tree as the content API serves it.
//!
//! A book edition is a four-level tree: book → chapters → sections →
//! questions. Chapters and sections are addressed by ordinal `position`;
//! questions carry a name plus a remote exercise id whose detail payload is
//! fetched separately.

use serde::Deserialize;

/// Display title used when an exercise payload carries no topic.
pub const DEFAULT_TITLE: &str = "titulo";

// ---------------------------------------------------------------------------
// Book tree
// ---------------------------------------------------------------------------

/// The `bookEdition` payload: tree root plus the output root name.
#[derive(Debug, Clone, Deserialize)]
pub struct BookEdition {
    /// Book display name, used as the output root directory.
    #[serde(rename = "amplitudeName")]
    pub name: String,
    /// Top-level chapter nodes, in source order.
    pub chapters: Vec<Chapter>,
}

/// A chapter node. Its `position` names the chapter directory.
#[derive(Debug, Clone, Deserialize)]
pub struct Chapter {
    pub position: u32,
    pub sections: Vec<Section>,
}

/// A section node. Its `position` names the section directory.
#[derive(Debug, Clone, Deserialize)]
pub struct Section {
    pub position: u32,
    pub questions: Vec<QuestionRef>,
}

/// A question as listed in the section tree — leaf of the walk.
/// The renderable content lives in a separate exercise detail payload.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionRef {
    pub name: String,
    pub exercise: ExerciseRef,
}

/// Remote identifier of a question's exercise detail resource.
#[derive(Debug, Clone, Deserialize)]
pub struct ExerciseRef {
    pub id: u64,
}

impl QuestionRef {
    /// Directory name for this leaf: `"{name} {id}"`.
    pub fn dir_name(&self) -> String {
        format!("{} {}", self.name, self.exercise.id)
    }
}

// ---------------------------------------------------------------------------
// Exercise detail
// ---------------------------------------------------------------------------

/// The `bookExercise` detail payload for one question.
#[derive(Debug, Clone, Deserialize)]
pub struct ExerciseDetail {
    /// Present when the exercise is classified under a topic. Only its
    /// presence matters for the title rule, not its contents.
    #[serde(default)]
    pub topic: Option<serde_json::Value>,
    #[serde(default)]
    pub name: Option<String>,
    /// Ordered renderable content fragments. Absence is a decode error.
    #[serde(rename = "lightSolution")]
    pub light_solution: Vec<String>,
}

impl ExerciseDetail {
    /// Display title for the rendered artifact.
    ///
    /// Without a `topic` the payload's `name` is not trusted and the literal
    /// default is used; with a `topic`, `name` applies, defaulting when absent.
    pub fn display_title(&self) -> &str {
        match (&self.topic, &self.name) {
            (Some(_), Some(name)) => name,
            _ => DEFAULT_TITLE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn book_edition_deserializes() {
        let json = r#"{
            "amplitudeName": "BookX",
            "chapters": [
                {
                    "position": 1,
                    "sections": [
                        {
                            "position": 1,
                            "questions": [
                                {"name": "Q1", "exercise": {"id": 100}},
                                {"name": "Q2", "exercise": {"id": 200}}
                            ]
                        }
                    ]
                }
            ]
        }"#;

        let book: BookEdition = serde_json::from_str(json).expect("deserialize");
        assert_eq!(book.name, "BookX");
        assert_eq!(book.chapters.len(), 1);
        assert_eq!(book.chapters[0].sections[0].questions.len(), 2);
        assert_eq!(book.chapters[0].sections[0].questions[0].dir_name(), "Q1 100");
    }

    #[test]
    fn exercise_title_with_topic() {
        let json = r#"{"topic": {}, "name": "Q1", "lightSolution": ["a", "b"]}"#;
        let detail: ExerciseDetail = serde_json::from_str(json).expect("deserialize");
        assert_eq!(detail.display_title(), "Q1");
        assert_eq!(detail.light_solution, vec!["a", "b"]);
    }

    #[test]
    fn exercise_title_falls_back_without_topic() {
        let json = r#"{"name": "Q2", "lightSolution": ["c"]}"#;
        let detail: ExerciseDetail = serde_json::from_str(json).expect("deserialize");
        assert_eq!(detail.display_title(), DEFAULT_TITLE);
    }

    #[test]
    fn exercise_title_falls_back_without_name() {
        let json = r#"{"topic": {"id": 7}, "lightSolution": []}"#;
        let detail: ExerciseDetail = serde_json::from_str(json).expect("deserialize");
        assert_eq!(detail.display_title(), DEFAULT_TITLE);
    }

    #[test]
    fn missing_light_solution_is_decode_error() {
        let json = r#"{"topic": {}, "name": "Q1"}"#;
        let result: std::result::Result<ExerciseDetail, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}
