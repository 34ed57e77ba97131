//! Educator dashboard analytics.
//!
//! A pure, synchronous reduction over an already-loaded course list. No
//! failure modes: absent or malformed numeric fields were already coerced
//! to zero when the courses were decoded, and the empty list produces a
//! neutral zero summary instead of a division error.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::Course;

/// Aggregated figures for one educator's courses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    /// Number of courses.
    pub total_courses: usize,
    /// Sum of per-course enrollment counts.
    pub total_students: usize,
    /// Mean rating across courses (unrated courses count as 0);
    /// 0 for an empty list.
    pub average_rating: f64,
    /// Sum over courses of enrollment count x price.
    pub total_earnings: Decimal,
}

impl DashboardSummary {
    /// Reduce a course list to its dashboard figures.
    #[must_use]
    pub fn from_courses(courses: &[Course]) -> Self {
        let total_courses = courses.len();
        let total_students: usize = courses.iter().map(Course::enrollment_count).sum();

        let rating_sum: f64 = courses.iter().map(|c| c.rating).sum();
        #[allow(clippy::cast_precision_loss)] // Course counts stay far below f64 precision
        let average_rating = if total_courses == 0 {
            0.0
        } else {
            rating_sum / total_courses as f64
        };

        let total_earnings: Decimal = courses
            .iter()
            .map(|c| Decimal::from(c.enrollment_count()) * c.price.amount())
            .sum();

        Self {
            total_courses,
            total_students,
            average_rating,
            total_earnings,
        }
    }
}
