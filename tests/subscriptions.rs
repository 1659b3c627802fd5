mod common;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

use recipe_cache::image::placeholder_url;
use recipe_cache::metrics::metric_names;
use recipe_cache::Fetched;

use common::{core, FakeGenerator};

#[tokio::test]
async fn superseded_recipe_load_is_discarded() {
    let gate = Arc::new(Notify::new());
    let generator = FakeGenerator::gated(Arc::clone(&gate));
    let core = core(Some(generator.clone()), None);
    let view = Arc::new(core.recipe_subscription());

    let slow = {
        let view = Arc::clone(&view);
        tokio::spawn(async move { view.load("Shakshuka", "en").await })
    };
    while view.guard().current_generation() == 0 {
        tokio::task::yield_now().await;
    }

    // The user navigated to a catalog recipe before generation finished.
    let current = view.load("Spaghetti Carbonara", "en").await;
    let carbonara = current.current().flatten().unwrap();
    assert_eq!(carbonara.name, "Spaghetti Carbonara");

    gate.notify_one();
    assert!(slow.await.unwrap().is_stale());
    assert_eq!(core.cache_stats().counters[metric_names::STALE_DISCARD], 1);

    // The discarded result still reached the store.
    assert!(core.resolve_recipe("Shakshuka", "en").await.is_some());
    assert_eq!(generator.calls(), 1);
}

#[tokio::test]
async fn cancelled_load_is_discarded() {
    let gate = Arc::new(Notify::new());
    let generator = FakeGenerator::gated(Arc::clone(&gate));
    let core = core(Some(generator), None);
    let view = Arc::new(core.recipe_subscription());

    let pending = {
        let view = Arc::clone(&view);
        tokio::spawn(async move { view.load("Moussaka", "en").await })
    };
    while view.guard().current_generation() == 0 {
        tokio::task::yield_now().await;
    }
    view.cancel();
    gate.notify_one();

    assert_eq!(pending.await.unwrap(), Fetched::Stale);
}

#[tokio::test]
async fn concurrent_views_share_one_generation() {
    let gate = Arc::new(Notify::new());
    let generator = FakeGenerator::gated(Arc::clone(&gate));
    let core = core(Some(generator.clone()), None);
    let hero = core.recipe_subscription();
    let sidebar = core.recipe_subscription();

    let (a, b, _) = tokio::join!(
        hero.load("Shakshuka", "en"),
        sidebar.load("shakshuka", "EN"),
        async {
            tokio::task::yield_now().await;
            gate.notify_one();
        }
    );

    let a = a.current().flatten().unwrap();
    let b = b.current().flatten().unwrap();
    assert_eq!(a, b);
    assert_eq!(generator.calls(), 1);
    assert_eq!(core.cache_stats().in_flight_recipes, 0);
}

#[tokio::test(start_paused = true)]
async fn dropped_load_releases_in_flight_entry() {
    let gate = Arc::new(Notify::new());
    let generator = FakeGenerator::gated(gate);
    let core = core(Some(generator.clone()), None);
    let view = core.recipe_subscription();

    let timed_out =
        tokio::time::timeout(Duration::from_millis(20), view.load("Shakshuka", "en")).await;

    assert!(timed_out.is_err());
    assert_eq!(generator.calls(), 1);
    assert_eq!(core.cache_stats().in_flight_recipes, 0);
}

#[tokio::test]
async fn missing_recipe_is_current_none() {
    let core = core(None, None);
    let view = core.recipe_subscription();
    assert_eq!(view.load("Shakshuka", "en").await, Fetched::Current(None));
}

#[tokio::test]
async fn image_subscription_returns_placeholder() {
    let core = core(None, None);
    let card = core.image_subscription();
    assert_eq!(
        card.load("Guacamole", 320, 240).await,
        Fetched::Current(placeholder_url(320, 240))
    );
}
