//! Secondary source: the HTML gift page.
//!
//! The page carries a two-column table:
//!
//! ```html
//! <div class="tgme_gift_table_wrap">
//!   <table class="tgme_gift_table"><tbody>
//!     <tr><th>Owner</th><td><a><img src="..."><span>Name</span></a></td></tr>
//!     <tr><th>Model</th><td>Ninja <mark>1.2%</mark></td></tr>
//!   </tbody></table>
//! </div>
//! ```
//!
//! An absent container is a missing-structure condition: logged, and the
//! result is empty. It is never an error.

use scraper::{ElementRef, Html, Selector};

use giftsync_core::Attribute;

const OWNER_LABEL: &str = "Owner";

/// Supplementary data scraped from the secondary page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SecondaryData {
    pub owner: Option<String>,
    pub owner_avatar: Option<String>,
    /// Table rows other than the owner row, in page order.
    pub attributes: Vec<Attribute>,
}

impl SecondaryData {
    pub fn is_empty(&self) -> bool {
        self.owner.is_none() && self.owner_avatar.is_none() && self.attributes.is_empty()
    }
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

/// Parse the gift table out of a secondary page.
pub fn parse_gift_table(html: &str) -> SecondaryData {
    let document = Html::parse_document(html);
    match extract_table(&document) {
        Some(data) => data,
        None => {
            tracing::warn!("gift table container not found on secondary page");
            SecondaryData::default()
        }
    }
}

fn extract_table(document: &Html) -> Option<SecondaryData> {
    let wrap_sel = selector("div.tgme_gift_table_wrap")?;
    let table_sel = selector("table.tgme_gift_table")?;
    let row_sel = selector("tr")?;
    let th_sel = selector("th")?;
    let td_sel = selector("td")?;

    let wrap = document.select(&wrap_sel).next()?;
    let table = wrap.select(&table_sel).next()?;

    let mut data = SecondaryData::default();
    for row in table.select(&row_sel) {
        let (Some(header), Some(cell)) = (row.select(&th_sel).next(), row.select(&td_sel).next())
        else {
            continue;
        };
        let label = joined_text(header);
        if label == OWNER_LABEL {
            let (owner, avatar) = parse_owner_cell(cell);
            data.owner = owner;
            data.owner_avatar = avatar;
            continue;
        }

        let attribute = parse_value_cell(&label, cell);
        match data
            .attributes
            .iter_mut()
            .find(|existing| existing.trait_type == attribute.trait_type)
        {
            Some(existing) => *existing = attribute,
            None => data.attributes.push(attribute),
        }
    }
    Some(data)
}

fn parse_owner_cell(cell: ElementRef<'_>) -> (Option<String>, Option<String>) {
    let avatar = selector("img").and_then(|sel| {
        cell.select(&sel)
            .next()
            .and_then(|img| img.value().attr("src"))
            .map(|src| src.trim().to_string())
            .filter(|src| !src.is_empty())
    });
    let owner = selector("span").and_then(|sel| {
        cell.select(&sel)
            .next()
            .map(joined_text)
            .filter(|name| !name.is_empty())
    });
    (owner, avatar)
}

fn parse_value_cell(label: &str, cell: ElementRef<'_>) -> Attribute {
    let text = joined_text(cell);
    let mark = selector("mark").and_then(|sel| cell.select(&sel).next());
    let Some(mark) = mark else {
        return Attribute::new(label, text, 0.0);
    };

    let mark_text = joined_text(mark);
    let value = text.replace(&mark_text, "").trim().to_string();
    Attribute::new(label, value, parse_percent(&mark_text))
}

/// `"42%"` → `42.0`; anything unparsable or non-finite → `0.0`.
pub fn parse_percent(raw: &str) -> f64 {
    raw.replace('%', "")
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite())
        .unwrap_or(0.0)
}

/// Text nodes, each trimmed, empty ones skipped, joined with one space.
fn joined_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn page(rows: &str) -> String {
        format!(
            r#"<html><body><div class="tgme_gift_table_wrap">
                <table class="tgme_gift_table"><tbody>{rows}</tbody></table>
            </div></body></html>"#
        )
    }

    #[test]
    fn owner_row_yields_name_and_avatar() {
        let html = page(
            r#"<tr><th>Owner</th><td><a href="/u"><img src=" https://cdn/a.jpg "><span>Carol</span></a></td></tr>"#,
        );
        let data = parse_gift_table(&html);
        assert_eq!(data.owner.as_deref(), Some("Carol"));
        assert_eq!(data.owner_avatar.as_deref(), Some("https://cdn/a.jpg"));
        assert!(data.attributes.is_empty());
    }

    #[test]
    fn marked_percent_is_split_from_value() {
        let html = page(
            r#"<tr><th>Model</th><td>Ninja Frog <mark>1.5%</mark></td></tr>
               <tr><th>Symbol</th><td>Star</td></tr>"#,
        );
        let data = parse_gift_table(&html);
        assert_eq!(
            data.attributes,
            vec![
                Attribute::new("Model", "Ninja Frog", 1.5),
                Attribute::new("Symbol", "Star", 0.0),
            ]
        );
    }

    #[rstest]
    #[case::word("rare")]
    #[case::nan("NaN%")]
    #[case::inf("inf%")]
    #[case::negative_infinity("-infinity %")]
    fn unusable_percent_defaults_to_zero(#[case] mark: &str) {
        let html = page(&format!(
            "<tr><th>Backdrop</th><td>Onyx <mark>{mark}</mark></td></tr>"
        ));
        let data = parse_gift_table(&html);
        assert_eq!(data.attributes, vec![Attribute::new("Backdrop", "Onyx", 0.0)]);
    }

    #[test]
    fn repeated_label_replaces_earlier_row() {
        let html = page(
            r#"<tr><th>Model</th><td>Old <mark>2%</mark></td></tr>
               <tr><th>Symbol</th><td>Star</td></tr>
               <tr><th>Model</th><td>New <mark>3%</mark></td></tr>"#,
        );
        let data = parse_gift_table(&html);
        assert_eq!(data.attributes[0], Attribute::new("Model", "New", 3.0));
        assert_eq!(data.attributes.len(), 2);
    }

    #[test]
    fn missing_container_yields_empty_result() {
        let data = parse_gift_table("<html><body><p>Gift not found</p></body></html>");
        assert!(data.is_empty());
    }

    #[rstest]
    #[case("42%", 42.0)]
    #[case(" 0.3 % ", 0.3)]
    #[case("n/a", 0.0)]
    #[case("NaN", 0.0)]
    #[case("infinity%", 0.0)]
    #[case("1e400%", 0.0)]
    fn percent_parsing(#[case] raw: &str, #[case] expected: f64) {
        assert_eq!(parse_percent(raw), expected);
    }
}
