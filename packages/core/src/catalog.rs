use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::CoreError;

/// A single lecture inside a chapter. `video_url` is only transmitted to
/// enrolled viewers unless the lecture is a free preview.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Lecture {
    pub id: String,
    pub title: String,
    pub duration_minutes: f64,
    pub video_url: String,
    pub is_preview_free: bool,
    pub position: i32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub id: String,
    pub title: String,
    pub position: i32,
    pub lectures: Vec<Lecture>,
}

/// Author-supplied course payload, before ids are assigned.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseDraft {
    pub title: String,
    pub description: String,
    pub price_cents: i64,
    pub discount: i32,
    #[serde(default)]
    pub is_published: bool,
    pub chapters: Vec<ChapterDraft>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChapterDraft {
    pub title: String,
    pub lectures: Vec<LectureDraft>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LectureDraft {
    pub title: String,
    pub duration_minutes: f64,
    #[serde(default)]
    pub video_url: String,
    #[serde(default)]
    pub is_preview_free: bool,
}

impl CourseDraft {
    /// Structural validation. A course needs a title, a sane price and
    /// discount, and at least one chapter where every chapter carries at
    /// least one lecture.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.title.trim().is_empty() {
            return Err(CoreError::validation("course title must not be empty"));
        }
        if self.price_cents < 0 {
            return Err(CoreError::validation("course price must not be negative"));
        }
        if !(0..=100).contains(&self.discount) {
            return Err(CoreError::validation("discount must be between 0 and 100"));
        }
        if self.chapters.is_empty() {
            return Err(CoreError::validation("course must contain at least one chapter"));
        }
        for chapter in &self.chapters {
            if chapter.title.trim().is_empty() {
                return Err(CoreError::validation("chapter title must not be empty"));
            }
            if chapter.lectures.is_empty() {
                return Err(CoreError::validation(
                    "every chapter must contain at least one lecture",
                ));
            }
            for lecture in &chapter.lectures {
                if lecture.title.trim().is_empty() {
                    return Err(CoreError::validation("lecture title must not be empty"));
                }
                if lecture.duration_minutes < 0.0 {
                    return Err(CoreError::validation(
                        "lecture duration must not be negative",
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Price after applying the percentage discount, rounded half-up to whole
/// cents. Never exceeds the list price for discounts in [0, 100].
pub fn effective_price_cents(price_cents: i64, discount: i32) -> i64 {
    (price_cents * (100 - discount as i64) + 50) / 100
}

pub fn total_lecture_count(chapters: &[Chapter]) -> usize {
    chapters.iter().map(|c| c.lectures.len()).sum()
}

pub fn total_duration_minutes(chapters: &[Chapter]) -> f64 {
    chapters
        .iter()
        .flat_map(|c| c.lectures.iter())
        .map(|l| l.duration_minutes)
        .sum()
}

/// Mean of all ratings rounded to one decimal place, `None` when the
/// course has not been rated yet.
pub fn average_rating(ratings: &[i16]) -> Option<f64> {
    if ratings.is_empty() {
        return None;
    }
    let sum: i64 = ratings.iter().map(|r| *r as i64).sum();
    let mean = sum as f64 / ratings.len() as f64;
    Some((mean * 10.0).round() / 10.0)
}

pub fn lecture_ids(chapters: &[Chapter]) -> HashSet<String> {
    chapters
        .iter()
        .flat_map(|c| c.lectures.iter())
        .map(|l| l.id.clone())
        .collect()
}

/// Privacy rule for non-enrolled viewers: every lecture that is not a free
/// preview loses its video source before the course leaves the data layer.
pub fn redact_locked_lectures(chapters: &mut [Chapter]) {
    for chapter in chapters.iter_mut() {
        for lecture in chapter.lectures.iter_mut() {
            if !lecture.is_preview_free {
                lecture.video_url = String::new();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lecture(id: &str, preview: bool) -> Lecture {
        Lecture {
            id: id.to_string(),
            title: format!("Lecture {id}"),
            duration_minutes: 10.0,
            video_url: format!("https://videos.example.com/{id}"),
            is_preview_free: preview,
            position: 0,
        }
    }

    fn draft() -> CourseDraft {
        CourseDraft {
            title: "Rust from Scratch".into(),
            description: "<p>Learn Rust.</p>".into(),
            price_cents: 10000,
            discount: 20,
            is_published: true,
            chapters: vec![ChapterDraft {
                title: "Basics".into(),
                lectures: vec![LectureDraft {
                    title: "Hello".into(),
                    duration_minutes: 5.0,
                    video_url: "https://videos.example.com/hello".into(),
                    is_preview_free: true,
                }],
            }],
        }
    }

    #[test]
    fn effective_price_applies_percentage_discount() {
        assert_eq!(effective_price_cents(10000, 20), 8000);
        assert_eq!(effective_price_cents(10000, 0), 10000);
        assert_eq!(effective_price_cents(10000, 100), 0);
        // 999 * 0.67 = 669.33 -> rounds to 669
        assert_eq!(effective_price_cents(999, 33), 669);
    }

    #[test]
    fn effective_price_never_exceeds_list_price() {
        for price in [0i64, 1, 99, 100, 12345, 1_000_000] {
            for discount in 0..=100 {
                let effective = effective_price_cents(price, discount);
                assert!(effective <= price, "{price} {discount} -> {effective}");
                assert!(effective >= 0);
            }
        }
    }

    #[test]
    fn draft_validation_rejects_bad_input() {
        let mut d = draft();
        d.title = "  ".into();
        assert!(d.validate().is_err());

        let mut d = draft();
        d.price_cents = -1;
        assert!(d.validate().is_err());

        let mut d = draft();
        d.discount = 101;
        assert!(d.validate().is_err());

        let mut d = draft();
        d.chapters.clear();
        assert!(d.validate().is_err());

        let mut d = draft();
        d.chapters[0].lectures.clear();
        assert!(d.validate().is_err());

        assert!(draft().validate().is_ok());
    }

    #[test]
    fn redaction_clears_only_locked_lectures() {
        let mut chapters = vec![Chapter {
            id: "ch1".into(),
            title: "Basics".into(),
            position: 0,
            lectures: vec![lecture("free", true), lecture("paid", false)],
        }];

        redact_locked_lectures(&mut chapters);

        assert_eq!(
            chapters[0].lectures[0].video_url,
            "https://videos.example.com/free"
        );
        assert_eq!(chapters[0].lectures[1].video_url, "");
    }

    #[test]
    fn summary_math() {
        let chapters = vec![
            Chapter {
                id: "ch1".into(),
                title: "A".into(),
                position: 0,
                lectures: vec![lecture("l1", true), lecture("l2", false)],
            },
            Chapter {
                id: "ch2".into(),
                title: "B".into(),
                position: 1,
                lectures: vec![lecture("l3", false)],
            },
        ];
        assert_eq!(total_lecture_count(&chapters), 3);
        assert_eq!(total_duration_minutes(&chapters), 30.0);
        assert_eq!(
            lecture_ids(&chapters),
            ["l1", "l2", "l3"].iter().map(|s| s.to_string()).collect()
        );
    }

    #[test]
    fn rating_mean_is_rounded_for_display() {
        assert_eq!(average_rating(&[]), None);
        assert_eq!(average_rating(&[5, 3]), Some(4.0));
        assert_eq!(average_rating(&[5, 4, 4]), Some(4.3));
    }
}
