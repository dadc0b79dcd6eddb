//! The fixed recipe export schema.
//!
//! Every stage that touches a structured record — the structuring prompt, the
//! response parser, the enrichment merge and the CSV writer — goes through
//! `RecipeField`, so the field set can never drift between them.

use serde_json::Value;

/// The 29 columns of an exported recipe, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecipeField {
    Title,
    Course,
    Cuisine,
    MainIngredient,
    Description,
    Source,
    SourceUrl,
    PrepTime,
    CookTime,
    TotalTime,
    Servings,
    Yield,
    Ingredients,
    Directions,
    Notes,
    Tags,
    Rating,
    ServingSize,
    Calories,
    Fat,
    SaturatedFat,
    Cholesterol,
    Sodium,
    Carbohydrate,
    Fiber,
    Sugar,
    Protein,
    NutritionScore,
    Cost,
}

impl RecipeField {
    pub const COUNT: usize = 29;

    pub const ALL: [RecipeField; Self::COUNT] = [
        Self::Title,
        Self::Course,
        Self::Cuisine,
        Self::MainIngredient,
        Self::Description,
        Self::Source,
        Self::SourceUrl,
        Self::PrepTime,
        Self::CookTime,
        Self::TotalTime,
        Self::Servings,
        Self::Yield,
        Self::Ingredients,
        Self::Directions,
        Self::Notes,
        Self::Tags,
        Self::Rating,
        Self::ServingSize,
        Self::Calories,
        Self::Fat,
        Self::SaturatedFat,
        Self::Cholesterol,
        Self::Sodium,
        Self::Carbohydrate,
        Self::Fiber,
        Self::Sugar,
        Self::Protein,
        Self::NutritionScore,
        Self::Cost,
    ];

    /// The per-serving nutrition subset overwritten by the enrichment stage.
    pub const NUTRITION: [RecipeField; 11] = [
        Self::ServingSize,
        Self::Calories,
        Self::Fat,
        Self::SaturatedFat,
        Self::Cholesterol,
        Self::Sodium,
        Self::Carbohydrate,
        Self::Fiber,
        Self::Sugar,
        Self::Protein,
        Self::NutritionScore,
    ];

    /// Wire key used in service requests and responses.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Course => "course",
            Self::Cuisine => "cuisine",
            Self::MainIngredient => "main_ingredient",
            Self::Description => "description",
            Self::Source => "source",
            Self::SourceUrl => "source_url",
            Self::PrepTime => "prep_time",
            Self::CookTime => "cook_time",
            Self::TotalTime => "total_time",
            Self::Servings => "servings",
            Self::Yield => "yield",
            Self::Ingredients => "ingredients",
            Self::Directions => "directions",
            Self::Notes => "notes",
            Self::Tags => "tags",
            Self::Rating => "rating",
            Self::ServingSize => "serving_size",
            Self::Calories => "calories",
            Self::Fat => "fat",
            Self::SaturatedFat => "saturated_fat",
            Self::Cholesterol => "cholesterol",
            Self::Sodium => "sodium",
            Self::Carbohydrate => "carbohydrate",
            Self::Fiber => "fiber",
            Self::Sugar => "sugar",
            Self::Protein => "protein",
            Self::NutritionScore => "nutrition_score",
            Self::Cost => "cost",
        }
    }

    /// Column header in the exported CSV and label in the text export.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Title => "Title",
            Self::Course => "Course",
            Self::Cuisine => "Cuisine",
            Self::MainIngredient => "Main Ingredient",
            Self::Description => "Description",
            Self::Source => "Source",
            Self::SourceUrl => "Source URL",
            Self::PrepTime => "Prep Time",
            Self::CookTime => "Cook Time",
            Self::TotalTime => "Total Time",
            Self::Servings => "Servings",
            Self::Yield => "Yield",
            Self::Ingredients => "Ingredients",
            Self::Directions => "Directions",
            Self::Notes => "Notes",
            Self::Tags => "Tags",
            Self::Rating => "Rating",
            Self::ServingSize => "Serving Size",
            Self::Calories => "Calories",
            Self::Fat => "Fat",
            Self::SaturatedFat => "Saturated Fat",
            Self::Cholesterol => "Cholesterol",
            Self::Sodium => "Sodium",
            Self::Carbohydrate => "Carbohydrate",
            Self::Fiber => "Fiber",
            Self::Sugar => "Sugar",
            Self::Protein => "Protein",
            Self::NutritionScore => "Nutrition Score",
            Self::Cost => "Cost",
        }
    }
}

impl std::fmt::Display for RecipeField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// A structured record: one string value per schema field, empty by default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeRecord {
    values: [String; RecipeField::COUNT],
}

impl Default for RecipeRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl RecipeRecord {
    pub fn new() -> Self {
        Self {
            values: std::array::from_fn(|_| String::new()),
        }
    }

    pub fn get(&self, field: RecipeField) -> &str {
        &self.values[field as usize]
    }

    pub fn set(&mut self, field: RecipeField, value: impl Into<String>) {
        self.values[field as usize] = value.into();
    }

    /// Iterate (field, value) pairs in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (RecipeField, &str)> {
        RecipeField::ALL
            .iter()
            .map(move |f| (*f, self.get(*f)))
    }

    /// Build a record from a parsed JSON object, coercing scalar values to
    /// strings. Unknown keys are ignored; missing keys stay empty.
    pub fn from_json_object(obj: &serde_json::Map<String, Value>) -> Self {
        let mut record = Self::new();
        for field in RecipeField::ALL {
            if let Some(value) = obj.get(field.key()) {
                record.set(field, coerce_to_string(value));
            }
        }
        record
    }
}

/// Coerce a JSON value to the string form stored in a record.
/// Arrays joined with line breaks cover models that return list fields
/// as JSON arrays instead of embedded newlines.
fn coerce_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items
            .iter()
            .map(coerce_to_string)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Null | Value::Object(_) => String::new(),
    }
}
