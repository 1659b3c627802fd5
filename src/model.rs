//! Recipe value types shared by the catalog, caches and providers.
//! Field names serialize in camelCase, which is also the JSON shape the
//! LLM is asked to produce and translate.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Language codes are plain ISO 639-1 strings; English is the pivot.
pub const ENGLISH: &str = "en";

/// Full recipe as shown on the detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeDetail {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub category: String,
    pub short_description: String,
    pub prep_time: String,
    pub calories: String,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    #[serde(default)]
    pub tips: Vec<String>,
}

/// Card-sized subset of [`RecipeDetail`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeSummary {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub category: String,
    pub short_description: String,
    pub prep_time: String,
    pub calories: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
}

impl RecipeDetail {
    pub fn summary(&self) -> RecipeSummary {
        RecipeSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            category: self.category.clone(),
            short_description: self.short_description.clone(),
            prep_time: self.prep_time.clone(),
            calories: self.calories.clone(),
        }
    }
}

/// Content that can be sent through the structured translator.
///
/// A translated value must keep the shape of its source. Fields that
/// identify or measure something (ids, category ids, calories) are copied
/// back from the source instead of trusting the model with them.
pub trait Localizable: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    fn same_shape(&self, source: &Self) -> bool;
    fn pin_untranslated(&mut self, source: &Self);
}

impl Localizable for RecipeDetail {
    fn same_shape(&self, source: &Self) -> bool {
        self.ingredients.len() == source.ingredients.len()
            && self.instructions.len() == source.instructions.len()
            && self.tips.len() == source.tips.len()
    }

    fn pin_untranslated(&mut self, source: &Self) {
        self.id.clone_from(&source.id);
        self.category.clone_from(&source.category);
        self.calories.clone_from(&source.calories);
    }
}

impl Localizable for RecipeSummary {
    fn same_shape(&self, _source: &Self) -> bool {
        true
    }

    fn pin_untranslated(&mut self, source: &Self) {
        self.id.clone_from(&source.id);
        self.category.clone_from(&source.category);
        self.calories.clone_from(&source.calories);
    }
}

impl Localizable for Category {
    fn same_shape(&self, _source: &Self) -> bool {
        true
    }

    fn pin_untranslated(&mut self, source: &Self) {
        self.id.clone_from(&source.id);
    }
}

impl<T: Localizable> Localizable for Vec<T> {
    fn same_shape(&self, source: &Self) -> bool {
        self.len() == source.len() && self.iter().zip(source).all(|(t, s)| t.same_shape(s))
    }

    fn pin_untranslated(&mut self, source: &Self) {
        for (t, s) in self.iter_mut().zip(source) {
            t.pin_untranslated(s);
        }
    }
}

/// URL-safe id derived from a recipe name, used when a generated recipe
/// arrives without one.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut dash = false;
    for c in name.trim().chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            slug.push(c);
            dash = false;
        } else if !dash && !slug.is_empty() {
            slug.push('-');
            dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}
