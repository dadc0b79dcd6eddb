//! Prompt builders for the four service operations.
//!
//! The structuring prompt's field list is generated from `RecipeField`, so
//! the contract the model sees, the parser and the CSV writer all share one
//! definition.

use crate::schema::RecipeField;

pub const EXTRACTION_PROMPT: &str = "\
Transcribe every piece of text visible in this photo of a recipe card or page. \
Return the raw text only, preserving line breaks exactly as written. \
Do not describe the image and do not add commentary. \
If no text is visible, return an empty response.";

const CLASSIFICATION_INSTRUCTIONS: &str = "\
Decide whether the text below is a recipe: a dish with ingredients and/or \
preparation steps. Respond with a single JSON object and nothing else:\n\
{\"is_recipe\": true or false, \"reason\": \"one short sentence\"}";

const SECOND_PASS_NOTE: &str = "\
Look again closely. Partial or handwritten recipes, bare ingredient lists, \
scaled-down card fragments and photographed cookbook pages all count as \
recipes, even when badly transcribed.";

pub fn build_classification_prompt(text: &str, second_pass: bool) -> String {
    if second_pass {
        format!("{SECOND_PASS_NOTE}\n\n{CLASSIFICATION_INSTRUCTIONS}\n\nText:\n{text}")
    } else {
        format!("{CLASSIFICATION_INSTRUCTIONS}\n\nText:\n{text}")
    }
}

pub fn build_structuring_prompt(text: &str) -> String {
    format!(
        "Extract the recipe from the text below into a single JSON object with \
exactly these keys, every one present, empty string when unknown:\n\n\
{{\n{}\n}}\n\n\
Conventions:\n\
- title: verbatim from the text, with exactly one fitting food emoji appended at the end.\n\
- main_ingredient: one single ingredient, never a list.\n\
- course and cuisine: one value each, no separators.\n\
- tags: comma-separated list.\n\
- ingredients and directions: one item per line, separated by line breaks.\n\
- rating: always the empty string.\n\
- Use plain ASCII-friendly prose throughout.\n\
Respond with the JSON object only.\n\n\
Text:\n{text}",
        field_contract()
    )
}

pub fn build_enrichment_prompt(ingredients: &str, servings: u32) -> String {
    let keys = RecipeField::NUTRITION
        .iter()
        .map(|f| f.key())
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Estimate per-serving nutrition for the ingredient list below, assuming \
{servings} servings in total. Respond with a single JSON object with exactly \
these keys: {keys}. Each value is a string with its unit (for example \"10g\" \
or \"250mg\"); nutrition_score is a healthiness score like \"7/10\"; use the \
empty string for anything you cannot estimate.\n\n\
Ingredients:\n{ingredients}"
    )
}

/// One `"key": "hint"` line per schema field, in schema order.
fn field_contract() -> String {
    RecipeField::ALL
        .iter()
        .map(|f| format!("  \"{}\": \"{}\"", f.key(), field_hint(*f)))
        .collect::<Vec<_>>()
        .join(",\n")
}

fn field_hint(field: RecipeField) -> &'static str {
    match field {
        RecipeField::Title => "recipe title",
        RecipeField::Course => "single course, e.g. Main",
        RecipeField::Cuisine => "single cuisine, e.g. Italian",
        RecipeField::MainIngredient => "single main ingredient",
        RecipeField::Description => "one-sentence description",
        RecipeField::Source => "source name if stated",
        RecipeField::SourceUrl => "source URL if stated",
        RecipeField::PrepTime => "e.g. 15 min",
        RecipeField::CookTime => "e.g. 1 hr",
        RecipeField::TotalTime => "e.g. 1 hr 15 min",
        RecipeField::Servings => "number of servings",
        RecipeField::Yield => "yield if stated, e.g. 12 muffins",
        RecipeField::Ingredients => "one ingredient per line",
        RecipeField::Directions => "one step per line",
        RecipeField::Notes => "any extra notes",
        RecipeField::Tags => "comma-separated tags",
        RecipeField::Rating => "always empty",
        RecipeField::ServingSize => "e.g. 1 bowl",
        RecipeField::Calories => "e.g. 320",
        RecipeField::Fat => "e.g. 10g",
        RecipeField::SaturatedFat => "e.g. 4g",
        RecipeField::Cholesterol => "e.g. 40mg",
        RecipeField::Sodium => "e.g. 600mg",
        RecipeField::Carbohydrate => "e.g. 30g",
        RecipeField::Fiber => "e.g. 3g",
        RecipeField::Sugar => "e.g. 8g",
        RecipeField::Protein => "e.g. 20g",
        RecipeField::NutritionScore => "e.g. 7/10",
        RecipeField::Cost => "estimated cost if stated",
    }
}
