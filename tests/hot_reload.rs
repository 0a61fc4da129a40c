use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use liveloom::runtime::{self, ReloadState};
use liveloom::script::{compile_patch, engine};
use liveloom::{BuildError, EngineConfig, Graph, GraphBuilder};

const PATCH: &str = r#"
    let tone = sine(220) + square(331) * 0.25;
    delay(lowpass(tone, 1200, 0.8), 0.01, 0.4, 0.6)
"#;

fn build(text: &str) -> Result<Graph, BuildError> {
    compile_patch(&engine(), text, GraphBuilder::with_seed(11))
}

fn config() -> EngineConfig {
    EngineConfig {
        sample_rate: 8_000,
        channels: 2,
        export: None,
    }
}

/// A source that builds `PATCH` until `broken` is raised.
fn breakable(broken: Arc<AtomicBool>) -> impl FnMut() -> Result<Graph, BuildError> + Send {
    move || {
        if broken.load(Ordering::Relaxed) {
            build("sine(440) +")
        } else {
            build(PATCH)
        }
    }
}

#[test]
fn failed_reload_leaves_the_stream_untouched() {
    let (mut reference, _) = runtime::launch(&config(), Box::new(|| build(PATCH))).unwrap();
    let expected: Vec<f64> = (0..400)
        .flat_map(|_| reference.render_frame().unwrap().to_vec())
        .collect();

    let broken = Arc::new(AtomicBool::new(false));
    let (mut driver, mut reloader) =
        runtime::launch(&config(), Box::new(breakable(Arc::clone(&broken)))).unwrap();
    let mut rendered = Vec::new();
    for frame in 0..400 {
        if frame == 150 {
            broken.store(true, Ordering::Relaxed);
            assert!(matches!(reloader.reload(), Err(BuildError::Script(_))));
            assert_eq!(reloader.state(), ReloadState::Running);
        }
        rendered.extend_from_slice(driver.render_frame().unwrap());
    }

    assert_eq!(rendered, expected);
    assert!(!driver.has_fallback());
}

#[test]
fn successful_reload_swaps_at_the_next_frame() {
    let text = Arc::new(std::sync::Mutex::new("0.25".to_string()));
    let shared = Arc::clone(&text);
    let source = move || {
        let current = shared.lock().map(|t| t.clone()).unwrap_or_default();
        build(&current)
    };
    let (mut driver, mut reloader) = runtime::launch(&config(), Box::new(source)).unwrap();
    assert_eq!(driver.render_frame().unwrap(), &[0.25, 0.25]);

    *text.lock().unwrap() = r#"load("channel") - 1"#.to_string();
    reloader.reload().unwrap();
    assert_eq!(driver.render_frame().unwrap(), &[-1.0, 0.0]);
    assert!(driver.has_fallback());
    assert_eq!(reloader.published(), 1);
}

#[test]
fn evaluation_failure_after_reload_rolls_back() {
    let text = Arc::new(std::sync::Mutex::new("0.5".to_string()));
    let shared = Arc::clone(&text);
    let source = move || {
        let current = shared.lock().map(|t| t.clone()).unwrap_or_default();
        build(&current)
    };
    let (mut driver, mut reloader) = runtime::launch(&config(), Box::new(source)).unwrap();
    driver.render_frame().unwrap();

    // Builds fine, fails on the first frame: a negative lag.
    *text.lock().unwrap() = r#"history(1, -3)"#.to_string();
    reloader.reload().unwrap();
    assert_eq!(driver.render_frame().unwrap(), &[0.5, 0.5]);
    assert!(!driver.has_fallback());
}
