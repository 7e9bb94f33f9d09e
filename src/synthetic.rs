//! Synthetic highlight populations.
//!
//! Generates plausible student selections for demoing the heatmap without
//! a real classroom: fixed base rectangles per page with jittered variants,
//! plus a fully random mode.

use chrono::{Duration, Utc};
use rand::Rng;

use crate::highlights::{SelectionArea, StudentHighlight};
use crate::ids::random_id;
use crate::select::Point;

const STUDENT_COUNT: usize = 50;
const HIGHLIGHTS_PER_STUDENT: usize = 3;

const PAGE_WIDTH: f32 = 600.0;
const PAGE_HEIGHT: f32 = 800.0;

const X_VARIANCE: f32 = 200.0;
const Y_VARIANCE: f32 = 125.0;

/// Base highlight patterns per page: `[start_x, start_y, end_x, end_y, variants]`.
/// Start/end Y are given bottom-up and flipped into canvas space per variant.
const BASE_HIGHLIGHTS: &[&[[f32; 5]]] = &[
    // Page 1
    &[[20.0, 520.0, 320.0, 500.0, 8.0], [400.0, 350.0, 550.0, 370.0, 6.0]],
    // Page 2
    &[[60.0, 50.0, 500.0, 5.0, 14.0], [400.0, 100.0, 550.0, 150.0, 12.0]],
    // Page 3
    &[
        [50.0, 600.0, 500.0, 580.0, 10.0],
        [100.0, 400.0, 450.0, 380.0, 8.0],
        [20.0, 320.0, 300.0, 20.0, 5.0],
    ],
    // Page 4
    &[
        [40.0, 700.0, 560.0, 680.0, 12.0],
        [80.0, 500.0, 520.0, 480.0, 7.0],
        [300.0, 300.0, 500.0, 280.0, 6.0],
    ],
    // Page 5
    &[
        [150.0, 650.0, 450.0, 630.0, 9.0],
        [50.0, 450.0, 550.0, 430.0, 11.0],
        [200.0, 250.0, 400.0, 230.0, 8.0],
    ],
    // Page 6
    &[
        [100.0, 750.0, 500.0, 730.0, 7.0],
        [50.0, 550.0, 300.0, 530.0, 10.0],
        [350.0, 550.0, 550.0, 530.0, 10.0],
    ],
    // Page 7
    &[
        [80.0, 600.0, 520.0, 580.0, 13.0],
        [120.0, 400.0, 480.0, 380.0, 9.0],
        [200.0, 150.0, 400.0, 130.0, 6.0],
    ],
    // Page 8
    &[
        [50.0, 700.0, 550.0, 680.0, 8.0],
        [100.0, 500.0, 500.0, 480.0, 12.0],
        [150.0, 200.0, 450.0, 180.0, 7.0],
    ],
];

fn jitter(rng: &mut impl Rng, variance: f32) -> f32 {
    (rng.r#gen::<f32>() - 0.5) * variance
}

fn variant_of(rng: &mut impl Rng, base: &[f32; 5]) -> SelectionArea {
    let clamp_x = |v: f32| v.clamp(0.0, PAGE_WIDTH);
    let clamp_y = |v: f32| v.clamp(0.0, PAGE_HEIGHT);

    SelectionArea {
        start: Point::new(
            clamp_x(base[0] + jitter(rng, X_VARIANCE)),
            PAGE_HEIGHT - clamp_y(base[1] + jitter(rng, Y_VARIANCE)),
        ),
        end: Point::new(
            clamp_x(base[2] + jitter(rng, X_VARIANCE)),
            PAGE_HEIGHT - clamp_y(base[3] + jitter(rng, Y_VARIANCE)),
        ),
    }
}

fn random_word(rng: &mut impl Rng, length: usize) -> String {
    const VOWELS: &[u8] = b"aeiou";
    const CONSONANTS: &[u8] = b"bcdfghjklmnpqrstvwxyz";
    (0..length)
        .map(|i| {
            let pool = if i % 2 == 0 { CONSONANTS } else { VOWELS };
            pool[rng.gen_range(0..pool.len())] as char
        })
        .collect()
}

fn random_question(rng: &mut impl Rng) -> String {
    let words: Vec<String> = (0..9).map(|_| random_word(rng, 5)).collect();
    format!("{}?", words.join(" "))
}

fn random_timestamp(rng: &mut impl Rng) -> chrono::DateTime<Utc> {
    // Spread over the last week.
    let seconds_back = rng.gen_range(0..7 * 24 * 60 * 60);
    Utc::now() - Duration::seconds(seconds_back)
}

/// Jittered variants of the per-page base patterns, up to `page_count` pages.
pub fn generate_patterned(rng: &mut impl Rng, page_count: u32) -> Vec<StudentHighlight> {
    let mut highlights = Vec::new();

    for (page_index, patterns) in BASE_HIGHLIGHTS
        .iter()
        .enumerate()
        .take(page_count as usize)
    {
        for base in patterns.iter() {
            let variants = base[4] as usize;
            for _ in 0..variants {
                highlights.push(StudentHighlight {
                    id: random_id(rng),
                    student_id: format!("student_{}", rng.gen_range(0..100)),
                    page_number: page_index as u32 + 1,
                    selection: variant_of(rng, base),
                    question: random_question(rng),
                    timestamp: random_timestamp(rng),
                });
            }
        }
    }

    highlights
}

/// Uniformly random population: 50 students, 3 highlights each.
pub fn generate_random(rng: &mut impl Rng, page_count: u32) -> Vec<StudentHighlight> {
    let mut highlights = Vec::with_capacity(STUDENT_COUNT * HIGHLIGHTS_PER_STUDENT);

    for student in 0..STUDENT_COUNT {
        let student_id = format!("student_{student}");
        for _ in 0..HIGHLIGHTS_PER_STUDENT {
            let start_x = rng.r#gen::<f32>() * PAGE_WIDTH;
            let start_y = rng.r#gen::<f32>() * PAGE_HEIGHT;
            let width = rng.r#gen::<f32>() * 200.0 + 50.0;
            let height = rng.r#gen::<f32>() * 100.0 + 20.0;

            highlights.push(StudentHighlight {
                id: random_id(rng),
                student_id: student_id.clone(),
                page_number: rng.gen_range(0..page_count) + 1,
                selection: SelectionArea {
                    start: Point::new(start_x, start_y),
                    end: Point::new(start_x + width, start_y + height),
                },
                question: random_question(rng),
                timestamp: random_timestamp(rng),
            });
        }
    }

    highlights
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn patterned_population_stays_on_requested_pages() {
        let mut rng = StdRng::seed_from_u64(7);
        let highlights = generate_patterned(&mut rng, 3);
        assert!(!highlights.is_empty());
        assert!(highlights.iter().all(|h| (1..=3).contains(&h.page_number)));
        assert!(highlights.iter().all(StudentHighlight::has_valid_geometry));
    }

    #[test]
    fn patterned_variant_counts_match_patterns() {
        let mut rng = StdRng::seed_from_u64(7);
        let highlights = generate_patterned(&mut rng, 1);
        // Page 1 patterns declare 8 + 6 variants.
        assert_eq!(highlights.len(), 14);
    }

    #[test]
    fn random_population_size_and_coordinates() {
        let mut rng = StdRng::seed_from_u64(11);
        let highlights = generate_random(&mut rng, 8);
        assert_eq!(highlights.len(), STUDENT_COUNT * HIGHLIGHTS_PER_STUDENT);
        for h in &highlights {
            assert!((1..=8).contains(&h.page_number));
            assert!(h.selection.end.x > h.selection.start.x);
            assert!(h.selection.end.y > h.selection.start.y);
            assert!(h.question.ends_with('?'));
        }
    }

    #[test]
    fn questions_alternate_consonant_vowel() {
        let mut rng = StdRng::seed_from_u64(3);
        let word = random_word(&mut rng, 5);
        let bytes = word.as_bytes();
        assert!(b"aeiou".contains(&bytes[1]));
        assert!(!b"aeiou".contains(&bytes[0]));
    }
}
