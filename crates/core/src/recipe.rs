//! Recipe models returned by the image-analysis endpoint.

use serde::{Deserialize, Serialize};

/// Preparation difficulty as reported by the analysis backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    #[serde(alias = "easy", alias = "EASY")]
    Easy,
    #[serde(alias = "medium", alias = "MEDIUM")]
    Medium,
    #[serde(alias = "hard", alias = "HARD")]
    Hard,
}

impl Difficulty {
    pub fn label(self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
        }
    }
}

/// A single suggested recipe.
///
/// `time_mins` and `difficulty` are optional on the wire; the backend
/// schema does not require them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub title: String,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(rename = "timeMins", default, skip_serializing_if = "Option::is_none")]
    pub time_mins: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    pub steps: Vec<String>,
}

/// Response body of `POST /api/analyze`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeResult {
    /// Ingredients detected in the photo.
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub recipes: Vec<Recipe>,
}

impl AnalyzeResult {
    /// Titles of all returned recipes, in order.
    pub fn recipe_titles(&self) -> Vec<&str> {
        self.recipes.iter().map(|r| r.title.as_str()).collect()
    }

    /// Recipes that use no ingredient outside the detected set.
    ///
    /// Comparison is case-insensitive and ignores surrounding whitespace.
    pub fn cookable_recipes(&self) -> Vec<&Recipe> {
        let detected: Vec<String> = self
            .ingredients
            .iter()
            .map(|i| i.trim().to_lowercase())
            .collect();

        self.recipes
            .iter()
            .filter(|r| {
                r.ingredients
                    .iter()
                    .all(|i| detected.contains(&i.trim().to_lowercase()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_analysis_response() {
        let body = serde_json::json!({
            "ingredients": ["egg", "milk"],
            "recipes": [{
                "title": "Omelette",
                "ingredients": ["egg"],
                "timeMins": 10,
                "difficulty": "Easy",
                "steps": ["beat eggs", "cook"]
            }]
        });

        let result: AnalyzeResult = serde_json::from_value(body).unwrap();
        assert_eq!(result.ingredients, vec!["egg", "milk"]);
        assert_eq!(result.recipe_titles(), vec!["Omelette"]);

        let recipe = &result.recipes[0];
        assert_eq!(recipe.time_mins, Some(10));
        assert_eq!(recipe.difficulty, Some(Difficulty::Easy));
        assert_eq!(recipe.steps.len(), 2);
    }

    #[test]
    fn optional_fields_may_be_missing() {
        let recipe: Recipe = serde_json::from_value(serde_json::json!({
            "title": "Toast",
            "ingredients": ["bread"],
            "steps": ["toast it"]
        }))
        .unwrap();
        assert_eq!(recipe.time_mins, None);
        assert_eq!(recipe.difficulty, None);

        let out = serde_json::to_value(&recipe).unwrap();
        assert!(out.get("timeMins").is_none());
    }

    #[test]
    fn lowercase_difficulty_is_accepted() {
        let d: Difficulty = serde_json::from_str(r#""hard""#).unwrap();
        assert_eq!(d, Difficulty::Hard);
        assert_eq!(d.label(), "Hard");
    }

    #[test]
    fn cookable_recipes_use_only_detected_ingredients() {
        let result: AnalyzeResult = serde_json::from_value(serde_json::json!({
            "ingredients": ["Egg", "milk"],
            "recipes": [
                {"title": "Omelette", "ingredients": ["egg"], "steps": []},
                {"title": "Pancakes", "ingredients": ["egg", "flour"], "steps": []}
            ]
        }))
        .unwrap();

        let titles: Vec<&str> = result
            .cookable_recipes()
            .iter()
            .map(|r| r.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Omelette"]);
    }
}
