//! Fuzz target for fenced code block segmentation
//!
//! # Invariants
//!
//! - NEVER panic (slicing stays on char boundaries)
//! - Fenced text never yields a whitespace-only segment
//! - Text without a fence is exactly one text segment
//! - Code segments never outnumber fence pairs

#![no_main]

use convoroom_core::render::{RenderHints, Segment};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|text: &str| {
    let hints = RenderHints::analyze(text);

    let fences = text.matches("```").count();
    assert_eq!(hints.has_code_blocks, fences > 0);

    let mut code_blocks = 0;
    for segment in &hints.segments {
        match segment {
            Segment::Text(content) => assert!(fences == 0 || !content.trim().is_empty()),
            Segment::Code { language, content } => {
                code_blocks += 1;
                assert!(!language.is_empty());
                assert!(!content.trim().is_empty());
            }
        }
    }
    assert!(code_blocks * 2 <= fences);

    if fences == 0 {
        assert_eq!(hints.segments, vec![Segment::Text(text.to_string())]);
    }
});
