//! Fade Menu Demo
//!
//! Slides three menu items in with staggered durations, then cancels the
//! whole "menu" group half way through a second animation.
//!
//! Run with: RUST_LOG=lapse_animation=debug cargo run -p lapse --example fade_menu

use lapse::{Lapse, LapseConfig, TickerConfig, Tween, TweenParams};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::thread;
use std::time::Duration;

const FRAME: Duration = Duration::from_millis(16);

fn main() -> anyhow::Result<()> {
    lapse::init_logging();

    let config = LapseConfig::new()
        .with_default_ease("ease_out_cubic")
        .with_ticker(TickerConfig::default().with_max_elapsed_ms(50.0));
    let lapse = Lapse::new(config)?;

    let items: Vec<_> = (0..3)
        .map(|_| {
            Rc::new(RefCell::new(HashMap::from([
                ("x".to_string(), -200.0),
                ("alpha".to_string(), 0.0),
            ])))
        })
        .collect();

    for (i, item) in items.iter().enumerate() {
        lapse.create(
            TweenParams::new()
                .duration(300.0 + 100.0 * i as f64)
                .target(item)
                .property("x", 0.0)
                .property("alpha", 1.0)
                .group("menu")
                .on_complete(move |_: &Tween| tracing::info!(item = i, "slide-in done")),
        )?;
    }

    while lapse.tick() {
        thread::sleep(FRAME);
    }
    report(&items);

    // Slide out again, but cancel half way
    for item in &items {
        lapse.create(
            TweenParams::new()
                .duration(1000.0)
                .target(item)
                .ease("linear")
                .property("x", 200.0)
                .group("menu"),
        )?;
    }
    for _ in 0..30 {
        lapse.tick();
        thread::sleep(FRAME);
    }
    lapse.destroy_group("menu");
    tracing::info!(active = lapse.active(), "menu group destroyed");
    report(&items);

    Ok(())
}

fn report(items: &[Rc<RefCell<HashMap<String, f64>>>]) {
    for (i, item) in items.iter().enumerate() {
        let item = item.borrow();
        tracing::info!(item = i, x = item["x"], alpha = item["alpha"], "state");
    }
}
