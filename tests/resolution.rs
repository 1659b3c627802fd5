mod common;

use std::time::Duration;

use recipe_cache::catalog::StaticCatalog;
use recipe_cache::config::CoreConfig;
use recipe_cache::image::placeholder_url;

use common::{core, core_with, small_config, FakeGenerator, FakeTranslator};

#[tokio::test]
async fn repeated_resolution_is_served_from_cache() {
    let translator = FakeTranslator::new();
    let core = core(None, Some(translator.clone()));

    let first = core.resolve_recipe("Spaghetti Carbonara", "es").await.unwrap();
    let second = core.resolve_recipe("spaghetti carbonara ", "es").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.name, "tr:Spaghetti Carbonara");
    assert_eq!(translator.calls(), 1);
}

#[tokio::test]
async fn translated_recipe_keeps_ids_and_calories() {
    let core = core(None, Some(FakeTranslator::new()));
    let english = core.resolve_recipe("Spaghetti Carbonara", "en").await.unwrap();
    let spanish = core.resolve_recipe("Spaghetti Carbonara", "es-MX").await.unwrap();

    assert_eq!(spanish.id, english.id);
    assert_eq!(spanish.calories, english.calories);
    assert_eq!(spanish.category, "italian");
    assert_eq!(spanish.ingredients.len(), english.ingredients.len());
    assert!(spanish.ingredients.iter().all(|i| i.starts_with("tr:")));
}

#[tokio::test]
async fn english_is_available_after_translated_request() {
    let generator = FakeGenerator::new();
    let translator = FakeTranslator::new();
    let core = core(Some(generator.clone()), Some(translator.clone()));

    let spanish = core.resolve_recipe("Shakshuka", "es").await.unwrap();
    assert_eq!(spanish.name, "tr:Shakshuka");
    assert_eq!((generator.calls(), translator.calls()), (1, 1));

    let english = core.resolve_recipe("Shakshuka", "en").await.unwrap();
    assert_eq!(english.name, "Shakshuka");
    assert_eq!((generator.calls(), translator.calls()), (1, 1));
}

#[tokio::test]
async fn english_survives_failed_translation_even_when_fallbacks_are_not_cached() {
    let generator = FakeGenerator::new();
    let translator = FakeTranslator::failing();
    let config = CoreConfig {
        cache_translation_fallbacks: false,
        ..CoreConfig::default()
    };
    let core = core_with(config, Some(generator.clone()), Some(translator.clone()));

    let french = core.resolve_recipe("Shakshuka", "fr").await.unwrap();
    assert_eq!(french.name, "Shakshuka");

    // Not cached under "fr": the translator is tried again, generation is not.
    core.resolve_recipe("Shakshuka", "fr").await.unwrap();
    assert_eq!(translator.calls(), 2);
    assert_eq!(generator.calls(), 1);

    assert!(core.resolve_recipe("Shakshuka", "en").await.is_some());
    assert_eq!(generator.calls(), 1);
}

#[tokio::test]
async fn failed_translation_returns_english_and_is_cached_by_default() {
    let translator = FakeTranslator::failing();
    let core = core(None, Some(translator.clone()));

    let english = StaticCatalog::builtin()
        .unwrap()
        .recipe("Spaghetti Carbonara")
        .cloned()
        .unwrap();
    let french = core.resolve_recipe("Spaghetti Carbonara", "fr").await.unwrap();
    assert_eq!(french, english);

    core.resolve_recipe("Spaghetti Carbonara", "fr").await.unwrap();
    assert_eq!(translator.calls(), 1);
}

#[tokio::test]
async fn no_translator_serves_english() {
    let core = core(None, None);
    let german = core.resolve_recipe("Pad Thai", "de").await.unwrap();
    assert_eq!(german.name, "Pad Thai");
}

#[tokio::test]
async fn unknown_recipe_is_generated_once() {
    let generator = FakeGenerator::new();
    let core = core(Some(generator.clone()), None);

    let recipe = core.resolve_recipe("Shakshuka", "en").await.unwrap();
    assert_eq!(recipe.id, "shakshuka");
    assert_eq!(recipe.ingredients.len(), 3);

    core.resolve_recipe("SHAKSHUKA", "en").await.unwrap();
    assert_eq!(generator.calls(), 1);
}

#[tokio::test]
async fn unknown_recipe_without_generation_is_not_found() {
    let generator = FakeGenerator::failing();
    let core = core(Some(generator.clone()), None);
    assert!(core.resolve_recipe("Shakshuka", "en").await.is_none());

    // Failures are not cached.
    assert!(core.resolve_recipe("Shakshuka", "en").await.is_none());
    assert_eq!(generator.calls(), 2);

    assert!(common::core(None, None).resolve_recipe("Shakshuka", "en").await.is_none());
}

#[tokio::test]
async fn least_recently_written_recipe_is_evicted() {
    let generator = FakeGenerator::new();
    let core = core_with(
        small_config(2, Duration::from_secs(1800)),
        Some(generator.clone()),
        None,
    );

    for name in ["Shakshuka", "Moussaka", "Feijoada"] {
        core.resolve_recipe(name, "en").await.unwrap();
    }
    assert_eq!(generator.calls(), 3);

    core.resolve_recipe("Shakshuka", "en").await.unwrap();
    assert_eq!(generator.calls(), 4);

    core.resolve_recipe("Feijoada", "en").await.unwrap();
    assert_eq!(generator.calls(), 4);
}

#[tokio::test(start_paused = true)]
async fn records_expire_after_configured_duration() {
    let generator = FakeGenerator::new();
    let core = core_with(
        small_config(50, Duration::from_secs(60)),
        Some(generator.clone()),
        None,
    );

    core.resolve_recipe("Shakshuka", "en").await.unwrap();
    tokio::time::advance(Duration::from_secs(59)).await;
    core.resolve_recipe("Shakshuka", "en").await.unwrap();
    assert_eq!(generator.calls(), 1);

    tokio::time::advance(Duration::from_secs(2)).await;
    core.resolve_recipe("Shakshuka", "en").await.unwrap();
    assert_eq!(generator.calls(), 2);
}

#[tokio::test]
async fn category_query_is_answered_from_catalog() {
    let generator = FakeGenerator::new();
    let core = core(Some(generator.clone()), None);

    let results = core.resolve_search_results("Italian", "en").await;
    assert_eq!(results.len(), 6);
    assert_eq!(results[0].name, "Spaghetti Carbonara");
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn foreign_query_is_pivoted_through_english() {
    let generator = FakeGenerator::new();
    let translator = FakeTranslator::new();
    let core = core(Some(generator.clone()), Some(translator.clone()));

    let results = core.resolve_search_results("cocina italiana", "es").await;
    assert_eq!(results.len(), 6);
    assert!(results.iter().all(|r| r.name.starts_with("tr:")));
    assert_eq!(generator.calls(), 0);
    // Query into English, then the result list into Spanish.
    assert_eq!(translator.calls(), 2);
}

#[tokio::test]
async fn same_words_in_two_languages_resolve_independently() {
    let generator = FakeGenerator::new();
    let app = core(Some(generator.clone()), Some(FakeTranslator::new()));

    // In English "postres" means nothing to the catalog.
    let english = app.resolve_search_results("postres", "en").await;
    assert_eq!(english[0].name, "postres idea 1");

    // In Spanish it is the Desserts category.
    let spanish = app.resolve_search_results("postres", "es").await;
    let fresh = core(None, Some(FakeTranslator::new()))
        .resolve_search_results("postres", "es")
        .await;
    assert_eq!(spanish, fresh);
    assert_eq!(spanish[0].name, "tr:Chocolate Lava Cake");
    assert_eq!(spanish[0].category, "desserts");
    assert_eq!(generator.calls(), 1);
}

#[tokio::test]
async fn foreign_query_is_generated_and_cached_under_english_meaning() {
    let generator = FakeGenerator::new();
    let translator = FakeTranslator::new();
    let app = core(Some(generator.clone()), Some(translator.clone()));

    let spanish = app.resolve_search_results("pollo", "es").await;
    assert_eq!(spanish.len(), 6);
    assert_eq!(spanish[0].name, "tr:chicken idea 1");
    assert_eq!(spanish[0].id, "chicken-idea-1");
    assert!(generator.last_prompt().unwrap().contains("Chicken Tacos"));

    let english = app.resolve_search_results("chicken", "en").await;
    assert_eq!(english[0].name, "chicken idea 1");
    assert_eq!(generator.calls(), 1);

    // The query translation is memoized as well.
    app.resolve_search_results("pollo", "es").await;
    assert_eq!(translator.calls(), 2);
    assert_eq!(generator.calls(), 1);
}

#[tokio::test]
async fn broad_query_generates_results_avoiding_static_names() {
    let generator = FakeGenerator::new();
    let core = core(Some(generator.clone()), None);

    let results = core.resolve_search_results("chicken", "en").await;
    assert_eq!(results.len(), 6);
    assert_eq!(results[0].name, "chicken idea 1");
    assert_eq!(results[0].id, "chicken-idea-1");

    let prompt = generator.last_prompt().unwrap();
    assert!(prompt.contains("Do not suggest any of:"));
    assert!(prompt.contains("Chicken Tacos"));

    core.resolve_search_results(" Chicken", "en").await;
    assert_eq!(generator.calls(), 1);
}

#[tokio::test]
async fn unmatched_search_falls_back_to_featured_without_caching() {
    let generator = FakeGenerator::failing();
    let core = core(Some(generator.clone()), None);

    let featured = core.resolve_featured("en").await;
    let results = core.resolve_search_results("xyzzy", "en").await;
    assert_eq!(results, featured);

    core.resolve_search_results("xyzzy", "en").await;
    assert_eq!(generator.calls(), 2);
}

#[tokio::test]
async fn empty_query_returns_featured() {
    let generator = FakeGenerator::new();
    let core = core(Some(generator.clone()), None);
    let results = core.resolve_search_results("   ", "en").await;
    assert_eq!(results.len(), 6);
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn categories_translate_names_but_keep_ids() {
    let translator = FakeTranslator::new();
    let core = core(None, Some(translator.clone()));

    let categories = core.resolve_categories("es").await;
    assert_eq!(categories.len(), 4);
    assert_eq!(categories[0].id, "italian");
    assert_eq!(categories[0].name, "tr:Italian");

    core.resolve_categories("es").await;
    assert_eq!(translator.calls(), 1);
}

#[tokio::test]
async fn category_listing_lookup() {
    let core = core(None, None);
    let desserts = core.resolve_category_recipes("desserts", "en").await.unwrap();
    assert_eq!(desserts.len(), 6);
    assert!(core.resolve_category_recipes("martian", "en").await.is_none());
}

#[tokio::test]
async fn image_without_provider_is_deterministic_placeholder() {
    let core = core(None, None);
    let first = core.resolve_image("Pad Thai", 400, 300).await;
    let second = core.resolve_image("pad thai", 400, 300).await;

    assert_eq!(first, placeholder_url(400, 300));
    assert_eq!(first, second);
    assert!(first.contains("w=400&h=300"));
    assert_ne!(first, core.resolve_image("Pad Thai", 800, 600).await);
}

#[tokio::test]
async fn clearing_caches_forces_regeneration() {
    let generator = FakeGenerator::new();
    let core = core(Some(generator.clone()), None);

    core.resolve_recipe("Shakshuka", "en").await.unwrap();
    core.resolve_image("Shakshuka", 400, 300).await;
    let stats = core.cache_stats();
    assert_eq!(stats.stores.len(), 4);
    assert_eq!(stats.stores[0].size, 1);
    assert_eq!(stats.images.size, 1);

    core.clear_caches();
    assert_eq!(core.cache_stats().stores[0].size, 0);
    core.resolve_recipe("Shakshuka", "en").await.unwrap();
    assert_eq!(generator.calls(), 2);
}

#[test]
fn zero_capacity_is_rejected() {
    let config = CoreConfig {
        recipe_capacity: 0,
        ..CoreConfig::default()
    };
    let result = recipe_cache::RecipeCore::new(
        config,
        StaticCatalog::builtin().unwrap(),
        recipe_cache::Providers::default(),
    );
    assert!(result.is_err());
}
