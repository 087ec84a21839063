//! Registry behaviour under concurrent readers and writers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use client_identity::agent::patterns;
use client_identity::{ClientClassifier, PatternCategory, PatternRegistry};

const CHROME: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const WRITERS: usize = 4;
const PER_WRITER: usize = 100;

#[test]
fn test_concurrent_adds_and_releases() {
    let registry = Arc::new(PatternRegistry::with_defaults());
    let classifier = ClientClassifier::new(registry.clone());
    let stop = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let classifier = classifier.clone();
            let stop = stop.clone();
            thread::spawn(move || {
                let mut checks = 0usize;
                while !stop.load(Ordering::Relaxed) {
                    assert!(classifier.is_browser(CHROME));
                    assert!(classifier.is_automated("curl/8.0", true));
                    checks += 1;
                }
                checks
            })
        })
        .collect();

    let writers: Vec<_> = (0..WRITERS)
        .map(|w| {
            let registry = registry.clone();
            thread::spawn(move || {
                let mut kept = Vec::new();
                for i in 0..PER_WRITER {
                    let pattern = format!("writer-{w}-probe-{i}");
                    let mut handle = registry.add(PatternCategory::Automation, &pattern);
                    // A completed add is visible to the next read.
                    assert!(registry.matches(PatternCategory::Automation, &pattern));
                    if i % 2 == 0 {
                        assert!(handle.release(&registry));
                        assert!(!handle.release(&registry));
                    } else {
                        kept.push(pattern);
                    }
                }
                kept
            })
        })
        .collect();

    let kept: Vec<String> = writers
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    stop.store(true, Ordering::Relaxed);
    for reader in readers {
        reader.join().unwrap();
    }

    let automation = registry.snapshot(PatternCategory::Automation);
    assert_eq!(
        automation.len(),
        patterns::AUTOMATION.len() + WRITERS * PER_WRITER / 2
    );
    for pattern in &kept {
        assert!(automation.contains(pattern), "lost update for {pattern}");
    }
    assert!(!automation.iter().any(|p| p.ends_with("-probe-0")));
    assert_eq!(&automation[..patterns::AUTOMATION.len()], patterns::AUTOMATION);
}

#[test]
fn test_release_removes_one_occurrence() {
    let registry = Arc::new(PatternRegistry::empty());

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let registry = registry.clone();
            thread::spawn(move || registry.add(PatternCategory::Crawler, "SharedBot"))
        })
        .map(|h| h.join().unwrap())
        .collect();
    assert_eq!(registry.len(PatternCategory::Crawler), 2);

    let mut handles = handles.into_iter();
    let mut first = handles.next().unwrap();
    assert!(first.release(&registry));
    assert!(registry.matches(PatternCategory::Crawler, "sharedbot/1.0"));
    assert_eq!(registry.len(PatternCategory::Crawler), 1);

    let mut second = handles.next().unwrap();
    assert!(second.release(&registry));
    assert!(registry.is_empty(PatternCategory::Crawler));
}
