use catedit_tui::{
    editor::{self, SegmentEditor},
    render,
    session::EditSession,
    suggestion::{self, Acceptance},
    tags,
    theme::Theme,
};
use std::time::{Duration, Instant};

/// Performance benchmark suite for segment editing
///
/// Run with: cargo test --release --bench performance -- --nocapture
///
/// This measures:
/// - Tag decoding and encoding
/// - Editor construction and typing
/// - Marker-heavy deletion
/// - Segment rendering with a suggestion overlay
const SHORT_SEGMENT_WORDS: usize = 12;
const LONG_SEGMENT_WORDS: usize = 400;
const HUGE_SEGMENT_WORDS: usize = 4000;

const ITERATIONS: usize = 100;

/// Create tagged text with a tag every few words
fn create_tagged_text(words: usize) -> String {
    let sample_words = [
        "Press", "the", "button", "to", "open", "settings", "and", "choose", "a", "layout",
        "before", "saving",
    ];

    let mut text = String::new();
    for i in 0..words {
        if i > 0 {
            text.push(' ');
        }
        let word = sample_words[i % sample_words.len()];
        match i % 9 {
            0 => text.push_str(&format!("[k]{word}[/k]")),
            4 => text.push_str(&format!("[b]{word}[/b]")),
            7 => text.push_str(&format!("[term]{word}[/term]")),
            _ => text.push_str(word),
        }
    }
    text
}

struct BenchmarkResult {
    name: String,
    iterations: usize,
    total_duration: Duration,
    avg_duration: Duration,
    min_duration: Duration,
    max_duration: Duration,
}

impl BenchmarkResult {
    fn print(&self) {
        println!("\n{}", "=".repeat(70));
        println!("Benchmark: {}", self.name);
        println!("{}", "=".repeat(70));
        println!("Iterations:     {}", self.iterations);
        println!("Total time:     {:?}", self.total_duration);
        println!("Average:        {:?}", self.avg_duration);
        println!("Min:            {:?}", self.min_duration);
        println!("Max:            {:?}", self.max_duration);

        if self.avg_duration.as_millis() > 16 {
            println!("\n⚠️  WARNING: Average duration > 16ms (may drop frames)");
        }
    }
}

fn benchmark<F>(name: &str, iterations: usize, mut f: F) -> BenchmarkResult
where
    F: FnMut(),
{
    let mut durations = Vec::with_capacity(iterations);

    for _ in 0..10 {
        f();
    }

    for _ in 0..iterations {
        let start = Instant::now();
        f();
        durations.push(start.elapsed());
    }

    let total_duration: Duration = durations.iter().sum();
    let avg_duration = total_duration / iterations as u32;
    let min_duration = *durations.iter().min().unwrap();
    let max_duration = *durations.iter().max().unwrap();

    BenchmarkResult {
        name: name.to_string(),
        iterations,
        total_duration,
        avg_duration,
        min_duration,
        max_duration,
    }
}

fn samples() -> Vec<(&'static str, String, usize)> {
    vec![
        ("Short", create_tagged_text(SHORT_SEGMENT_WORDS), ITERATIONS * 10),
        ("Long", create_tagged_text(LONG_SEGMENT_WORDS), ITERATIONS),
        ("Huge", create_tagged_text(HUGE_SEGMENT_WORDS), 10),
    ]
}

#[test]
fn bench_tag_codec() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║                  TAG CODEC BENCHMARKS                          ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    for (name, text, iterations) in samples() {
        let result = benchmark(&format!("decode - {name}"), iterations, || {
            let _ = tags::decode(&text);
        });
        result.print();

        let nodes = tags::render_nodes(&tags::decode(&text));
        let result = benchmark(&format!("encode - {name}"), iterations, || {
            let encoded = tags::encode(&nodes);
            assert_eq!(encoded.len(), text.len());
        });
        result.print();

        let result = benchmark(&format!("visible_len - {name}"), iterations, || {
            let _ = tags::visible_len(&text);
        });
        result.print();
    }
}

#[test]
fn bench_editor_construction() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║              EDITOR CONSTRUCTION BENCHMARKS                    ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    for (name, text, iterations) in samples() {
        let result = benchmark(&format!("SegmentEditor::new - {name}"), iterations, || {
            let editor = SegmentEditor::new(&text);
            assert!(!editor.is_empty());
        });
        result.print();
    }
}

#[test]
fn bench_typing_at_end() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║                  TYPING BENCHMARKS                             ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    for (name, text, iterations) in samples() {
        let mut editor = SegmentEditor::new(&text);
        editor.move_to_end();
        let result = benchmark(&format!("insert_char + tagged_text - {name}"), iterations, || {
            editor.insert_char('x');
            let _ = editor.tagged_text();
        });
        result.print();
    }
}

#[test]
fn bench_marker_deletion() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║               MARKER DELETION BENCHMARKS                       ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    let text = create_tagged_text(LONG_SEGMENT_WORDS);
    let result = benchmark("select_marker + backspace (Long)", ITERATIONS, || {
        let mut editor = SegmentEditor::new(&text);
        while let Some((position, _)) = editor.markers().first().copied() {
            editor.select_marker(position);
            editor.backspace();
        }
        assert!(editor.markers().is_empty());
    });
    result.print();
}

#[test]
fn bench_word_boundary_detection() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║         WORD BOUNDARY DETECTION BENCHMARKS                     ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    for (name, text, iterations) in samples() {
        let editor = SegmentEditor::new(&text);
        let result = benchmark(&format!("word boundaries - {name}"), iterations, || {
            let chars = editor.unit_chars();
            let middle = chars.len() / 2;
            let _ = editor::previous_word_boundary(&chars, middle);
            let _ = editor::next_word_boundary(&chars, middle);
        });
        result.print();
    }
}

#[test]
fn bench_render_with_suggestion() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║            SEGMENT RENDERING BENCHMARKS                        ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    let theme = Theme::new();
    for (name, text, iterations) in samples() {
        let split = text.len() / 2;
        let split = (0..=split)
            .rev()
            .find(|idx| text.is_char_boundary(*idx))
            .unwrap_or(0);
        let typed = &text[..split];
        let editor = SegmentEditor::new(typed);
        let remainder = suggestion::compute_remainder(typed, Some(text.as_str()));

        for width in [40, 80, 160] {
            let result = benchmark(&format!("render_segment - {name} @ {width}"), iterations, || {
                let _ = render::render_segment(&editor, remainder, &theme, width);
            });
            result.print();
        }
    }
}

#[test]
fn bench_word_acceptance_cycle() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║             SUGGESTION ACCEPTANCE BENCHMARKS                   ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    let suggested = create_tagged_text(LONG_SEGMENT_WORDS);
    let result = benchmark("accept every word (Long)", 10, || {
        let mut session = EditSession::new("", Some(&suggested));
        session.set_active(true, "");
        session.on_frame();
        let mut listener = |_: &str| {};
        while session.accept_suggestion(Acceptance::NextWord, &mut listener) {
            session.on_frame();
        }
        assert_eq!(session.current_text(), suggested);
    });
    result.print();
}
