use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

use crate::locate::{FieldLocation, LocateError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    #[error("invalid selector {selector:?}: {message}")]
    InvalidSelector { selector: String, message: String },
    #[error("invalid {field} location: {source}")]
    InvalidLocation {
        field: &'static str,
        source: LocateError,
    },
    #[error("container {selector:?} not found")]
    ContainerNotFound { selector: String },
    #[error("item {index}: {field} not found at {location}")]
    FieldMissing {
        index: usize,
        field: &'static str,
        location: String,
    },
}

/// Where the listing fields live. Selectors are CSS; field locations are
/// positional child paths relative to each item (see [`FieldLocation`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingLayout {
    pub top_container: String,
    pub item_selector: String,
    pub date: String,
    pub title: String,
    pub image: String,
    pub excerpt: String,
    pub link: String,
}

impl Default for ListingLayout {
    fn default() -> Self {
        Self {
            top_container: "div.news-list".to_string(),
            item_selector: "div.block-new".to_string(),
            date: "a[1]/p".to_string(),
            title: "div[2]".to_string(),
            image: "div[1]/a/img/@src".to_string(),
            excerpt: "div[3]/a/p".to_string(),
            link: "div[1]/a/@href".to_string(),
        }
    }
}

/// Raw listing entry, before date parsing and URL derivation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingItem {
    pub date_text: String,
    pub title: String,
    pub image_src: String,
    pub excerpt: String,
    pub href: String,
}

pub type ItemResult = Result<ListingItem, ExtractError>;

/// Compiled [`ListingLayout`].
#[derive(Debug)]
pub struct ListingExtractor {
    top_container: Selector,
    top_container_raw: String,
    item: Selector,
    date: FieldLocation,
    title: FieldLocation,
    image: FieldLocation,
    excerpt: FieldLocation,
    link: FieldLocation,
}

impl ListingExtractor {
    pub fn new(layout: &ListingLayout) -> Result<Self, ExtractError> {
        Ok(Self {
            top_container: compile_selector(&layout.top_container)?,
            top_container_raw: layout.top_container.clone(),
            item: compile_selector(&layout.item_selector)?,
            date: compile_location("date", &layout.date)?,
            title: compile_location("title", &layout.title)?,
            image: compile_location("image", &layout.image)?,
            excerpt: compile_location("excerpt", &layout.excerpt)?,
            link: compile_location("link", &layout.link)?,
        })
    }

    /// Extracts every item in document order.
    ///
    /// The outer error means the listing container itself is missing; inner
    /// errors are per item so the caller decides whether one bad item sinks
    /// the page.
    pub fn extract(&self, html: &str) -> Result<Vec<ItemResult>, ExtractError> {
        let document = Html::parse_document(html);
        let container = document.select(&self.top_container).next().ok_or_else(|| {
            ExtractError::ContainerNotFound {
                selector: self.top_container_raw.clone(),
            }
        })?;

        Ok(container
            .select(&self.item)
            .enumerate()
            .map(|(i, item)| self.extract_item(i + 1, item))
            .collect())
    }

    fn extract_item(&self, index: usize, item: ElementRef<'_>) -> ItemResult {
        let field = |name: &'static str, location: &FieldLocation| {
            location
                .read(item)
                .ok_or_else(|| ExtractError::FieldMissing {
                    index,
                    field: name,
                    location: location.to_string(),
                })
        };
        Ok(ListingItem {
            date_text: field("date", &self.date)?,
            title: field("title", &self.title)?,
            image_src: field("image", &self.image)?,
            excerpt: field("excerpt", &self.excerpt)?,
            href: field("link", &self.link)?,
        })
    }
}

/// Pulls the article body out of a detail page.
#[derive(Debug)]
pub struct DetailExtractor {
    container: Selector,
    container_raw: String,
}

impl DetailExtractor {
    pub fn new(selector: &str) -> Result<Self, ExtractError> {
        Ok(Self {
            container: compile_selector(selector)?,
            container_raw: selector.to_string(),
        })
    }

    /// Inner markup of the detail container, trimmed.
    pub fn extract(&self, html: &str) -> Result<String, ExtractError> {
        let document = Html::parse_document(html);
        document
            .select(&self.container)
            .next()
            .map(|node| node.inner_html().trim().to_string())
            .ok_or_else(|| ExtractError::ContainerNotFound {
                selector: self.container_raw.clone(),
            })
    }
}

fn compile_selector(raw: &str) -> Result<Selector, ExtractError> {
    Selector::parse(raw).map_err(|err| ExtractError::InvalidSelector {
        selector: raw.to_string(),
        message: err.to_string(),
    })
}

fn compile_location(field: &'static str, raw: &str) -> Result<FieldLocation, ExtractError> {
    raw.parse()
        .map_err(|source| ExtractError::InvalidLocation { field, source })
}

#[cfg(test)]
mod tests {
    use super::{DetailExtractor, ExtractError, ListingExtractor, ListingLayout};

    const LISTING: &str = r#"<html><body>
        <div class="sidebar"><div class="block-new"><div>ad</div></div></div>
        <div class="news-list">
            <div class="block-new">
                <a href="/n/1"><p>12.01.2021</p></a>
                <div><a href="/n/1"><img src="/i/1.jpg"></a></div>
                <div>Перша</div>
                <div><a href="/n/1"><p>Коротко</p></a></div>
            </div>
            <div class="block-new">
                <a href="/n/2"><p>13.01.2021</p></a>
            </div>
        </div>
    </body></html>"#;

    fn extractor() -> ListingExtractor {
        ListingExtractor::new(&ListingLayout::default()).unwrap()
    }

    #[test]
    fn items_are_read_inside_the_container_only() {
        let items = extractor().extract(LISTING).unwrap();
        assert_eq!(items.len(), 2);

        let first = items[0].as_ref().unwrap();
        assert_eq!(first.date_text, "12.01.2021");
        assert_eq!(first.title, "Перша");
        assert_eq!(first.image_src, "/i/1.jpg");
        assert_eq!(first.excerpt, "Коротко");
        assert_eq!(first.href, "/n/1");

        assert_eq!(
            items[1],
            Err(ExtractError::FieldMissing {
                index: 2,
                field: "title",
                location: "div[2]".to_string(),
            })
        );
    }

    #[test]
    fn missing_container_is_an_error() {
        let err = extractor().extract("<html><body></body></html>").unwrap_err();
        assert_eq!(
            err,
            ExtractError::ContainerNotFound {
                selector: "div.news-list".to_string()
            }
        );
    }

    #[test]
    fn invalid_layout_is_rejected_up_front() {
        let layout = ListingLayout {
            item_selector: "div[".to_string(),
            ..ListingLayout::default()
        };
        assert!(matches!(
            ListingExtractor::new(&layout),
            Err(ExtractError::InvalidSelector { .. })
        ));

        let layout = ListingLayout {
            link: "div[1]/@href/a".to_string(),
            ..ListingLayout::default()
        };
        assert!(matches!(
            ListingExtractor::new(&layout),
            Err(ExtractError::InvalidLocation { field: "link", .. })
        ));
    }

    #[test]
    fn detail_returns_trimmed_inner_markup() {
        let detail = DetailExtractor::new("div.body").unwrap();
        let html = r#"<div class="body">
            <p>Текст</p>
        </div>"#;
        assert_eq!(detail.extract(html).unwrap(), "<p>Текст</p>");
        assert!(matches!(
            detail.extract("<p>none</p>"),
            Err(ExtractError::ContainerNotFound { .. })
        ));
    }
}
