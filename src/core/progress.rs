//! Completion percentage over a project's pages.

use crate::core::db::BrochurePage;

/// Percentage of filled fields against a fixed two-fields-per-page baseline.
///
/// Tracked fields depend on the page number: page 1 counts project_name,
/// description and company_name; page 2 counts about_us and email; every
/// other page counts heading and body_content. A field is filled when it is
/// present and non-empty. Total pages is the highest page number present, or
/// 1 when the project has no pages yet.
///
/// Because page 1 tracks three fields against the two-per-page baseline, the
/// result is deliberately not capped and can exceed 100.
pub fn completion_percentage(pages: &[BrochurePage]) -> u32 {
    let total_pages = pages
        .iter()
        .map(|page| page.page_number)
        .max()
        .unwrap_or(1)
        .max(1);
    let expected_fields = total_pages * 2;

    let mut filled_fields: i64 = 0;
    for page in pages {
        let content = &page.content;
        filled_fields += match page.page_number {
            1 => count_filled(&[&content.project_name, &content.description, &content.company_name]),
            2 => count_filled(&[&content.about_us, &content.email]),
            _ => count_filled(&[&content.heading, &content.body_content]),
        };
    }

    ((filled_fields as f64 / expected_fields as f64) * 100.0).round() as u32
}

fn count_filled(fields: &[&Option<String>]) -> i64 {
    fields
        .iter()
        .filter(|field| field.as_deref().is_some_and(|value| !value.is_empty()))
        .count() as i64
}
