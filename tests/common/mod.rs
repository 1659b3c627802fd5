#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::Notify;

use recipe_cache::catalog::StaticCatalog;
use recipe_cache::config::CoreConfig;
use recipe_cache::error::ProviderError;
use recipe_cache::providers::{GenerationProvider, TranslationProvider};
use recipe_cache::{Providers, RecipeCore};

/// Generation mock. Answers recipe requests with a fixed recipe named after
/// whatever the prompt asks for, and search requests with `search_count`
/// summaries. Optionally blocks until `gate` is notified.
pub struct FakeGenerator {
    pub calls: AtomicUsize,
    pub prompts: Mutex<Vec<String>>,
    pub fail: bool,
    pub search_count: usize,
    pub gate: Option<Arc<Notify>>,
}

impl FakeGenerator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
            fail: false,
            search_count: 6,
            gate: None,
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
            fail: true,
            search_count: 6,
            gate: None,
        })
    }

    pub fn gated(gate: Arc<Notify>) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
            fail: false,
            search_count: 6,
            gate: Some(gate),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().last().cloned()
    }
}

/// Text between the first pair of double quotes in `prompt`.
fn quoted(prompt: &str) -> String {
    prompt.split('"').nth(1).unwrap_or("Mystery Dish").to_string()
}

pub fn generated_recipe(name: &str) -> Value {
    json!({
        "name": name,
        "category": "Generated",
        "shortDescription": format!("A homemade take on {name}."),
        "prepTime": "30 min",
        "calories": "410 kcal",
        "ingredients": ["2 eggs", "200 g tomatoes", "1 onion"],
        "instructions": ["Chop everything", "Cook gently", "Serve warm"],
        "tips": ["Use ripe tomatoes"]
    })
}

fn generated_summaries(query: &str, count: usize) -> Value {
    let recipes: Vec<Value> = (1..=count)
        .map(|i| {
            json!({
                "name": format!("{query} idea {i}"),
                "category": "Generated",
                "shortDescription": "Quick and tasty.",
                "prepTime": "25 min",
                "calories": "450 kcal"
            })
        })
        .collect();
    json!({ "recipes": recipes })
}

impl GenerationProvider for FakeGenerator {
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
        schema: &'a Value,
    ) -> BoxFuture<'a, Result<Value, ProviderError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().push(prompt.to_string());
        async move {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if self.fail {
                return Err(ProviderError::Status {
                    status: 503,
                    body: "overloaded".into(),
                });
            }
            let subject = quoted(prompt);
            if schema["properties"].get("recipes").is_some() {
                Ok(generated_summaries(&subject, self.search_count))
            } else {
                Ok(generated_recipe(&subject))
            }
        }
        .boxed()
    }
}

/// Translation mock. Structured prompts get every string value prefixed
/// with `"tr:"`; text prompts are looked up in a tiny dictionary.
pub struct FakeTranslator {
    pub calls: AtomicUsize,
    pub fail: bool,
}

impl FakeTranslator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail: false,
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail: true,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn prefix_strings(value: &mut Value) {
    match value {
        Value::String(s) => *s = format!("tr:{s}"),
        Value::Array(items) => items.iter_mut().for_each(prefix_strings),
        Value::Object(map) => map.values_mut().for_each(prefix_strings),
        _ => {}
    }
}

impl TranslationProvider for FakeTranslator {
    fn complete<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, ProviderError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        async move {
            if self.fail {
                return Err(ProviderError::Timeout);
            }
            let payload = prompt.rsplit("\n\n").next().unwrap_or_default();
            if let Ok(mut value) = serde_json::from_str::<Value>(payload) {
                prefix_strings(&mut value);
                return Ok(value.to_string());
            }
            let reply = match payload {
                "cocina italiana" => "Italian",
                "postres" => "desserts",
                "pollo" => "chicken",
                other => other,
            };
            Ok(reply.to_string())
        }
        .boxed()
    }
}

pub fn core_with(
    config: CoreConfig,
    generator: Option<Arc<FakeGenerator>>,
    translator: Option<Arc<FakeTranslator>>,
) -> RecipeCore {
    let providers = Providers {
        generator: generator.map(|g| g as Arc<dyn GenerationProvider>),
        translator: translator.map(|t| t as Arc<dyn TranslationProvider>),
        images: None,
    };
    RecipeCore::new(config, StaticCatalog::builtin().unwrap(), providers).unwrap()
}

pub fn core(
    generator: Option<Arc<FakeGenerator>>,
    translator: Option<Arc<FakeTranslator>>,
) -> RecipeCore {
    core_with(CoreConfig::default(), generator, translator)
}

pub fn small_config(capacity: usize, expiry: Duration) -> CoreConfig {
    CoreConfig {
        recipe_capacity: capacity,
        list_capacity: capacity,
        record_expiry: expiry,
        ..CoreConfig::default()
    }
}
