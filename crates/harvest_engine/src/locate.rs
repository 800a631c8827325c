//! Positional child paths: `div[1]/a/img/@src`.
//!
//! Each `/`-separated step names a child element tag (`*` for any tag) and
//! an optional 1-based index among the children with that tag. A trailing
//! `@name` step reads an attribute instead of the element text. Resolution
//! yields the first match in document order, so an unindexed step tries
//! every matching child before giving up.

use std::fmt;
use std::str::FromStr;

use scraper::ElementRef;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocateError {
    #[error("empty location")]
    Empty,
    #[error("invalid step {step:?} in location {location:?}")]
    InvalidStep { location: String, step: String },
    #[error("attribute step must be last in location {0:?}")]
    AttributeNotLast(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    /// Lowercase tag name; `None` matches any element.
    tag: Option<String>,
    /// 1-based position among siblings matching `tag`.
    index: Option<usize>,
}

impl Step {
    fn parse(raw: &str) -> Option<Self> {
        let (name, index) = match raw.split_once('[') {
            Some((name, rest)) => {
                let digits = rest.strip_suffix(']')?;
                let index: usize = digits.trim().parse().ok()?;
                if index == 0 {
                    return None;
                }
                (name, Some(index))
            }
            None => (raw, None),
        };
        let name = name.trim();
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '*') {
            return None;
        }
        let tag = (name != "*").then(|| name.to_ascii_lowercase());
        Some(Self { tag, index })
    }

    fn matches(&self, element: &ElementRef<'_>) -> bool {
        match &self.tag {
            Some(tag) => element.value().name().eq_ignore_ascii_case(tag),
            None => true,
        }
    }

    fn candidates<'a>(&self, parent: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        let mut matching = parent
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|child| self.matches(child));
        match self.index {
            Some(index) => matching.nth(index - 1).into_iter().collect(),
            None => matching.collect(),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag.as_deref().unwrap_or("*"))?;
        if let Some(index) = self.index {
            write!(f, "[{index}]")?;
        }
        Ok(())
    }
}

/// A child path without the attribute part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildPath {
    steps: Vec<Step>,
}

impl ChildPath {
    /// First element reached from `root` by following every step.
    pub fn resolve<'a>(&self, root: ElementRef<'a>) -> Option<ElementRef<'a>> {
        resolve_steps(root, &self.steps)
    }
}

fn resolve_steps<'a>(element: ElementRef<'a>, steps: &[Step]) -> Option<ElementRef<'a>> {
    let Some((step, rest)) = steps.split_first() else {
        return Some(element);
    };
    step.candidates(element)
        .into_iter()
        .find_map(|child| resolve_steps(child, rest))
}

impl fmt::Display for ChildPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{step}")?;
        }
        Ok(())
    }
}

/// Where a field value lives relative to an item element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLocation {
    path: ChildPath,
    attribute: Option<String>,
}

impl FieldLocation {
    /// Reads the value at this location: trimmed descendant text, or the
    /// attribute value as written. `None` when the element or attribute is
    /// absent.
    pub fn read(&self, item: ElementRef<'_>) -> Option<String> {
        let element = self.path.resolve(item)?;
        match &self.attribute {
            Some(name) => element.value().attr(name).map(ToOwned::to_owned),
            None => Some(element.text().collect::<String>().trim().to_string()),
        }
    }
}

impl FromStr for FieldLocation {
    type Err = LocateError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(LocateError::Empty);
        }
        let parts: Vec<&str> = raw.split('/').map(str::trim).collect();
        let mut steps = Vec::with_capacity(parts.len());
        let mut attribute = None;
        for (i, part) in parts.iter().enumerate() {
            if let Some(name) = part.strip_prefix('@') {
                if i + 1 != parts.len() {
                    return Err(LocateError::AttributeNotLast(raw.to_string()));
                }
                if name.is_empty() {
                    return Err(LocateError::InvalidStep {
                        location: raw.to_string(),
                        step: part.to_string(),
                    });
                }
                attribute = Some(name.to_ascii_lowercase());
                continue;
            }
            let step = Step::parse(part).ok_or_else(|| LocateError::InvalidStep {
                location: raw.to_string(),
                step: part.to_string(),
            })?;
            steps.push(step);
        }
        Ok(Self {
            path: ChildPath { steps },
            attribute,
        })
    }
}

impl fmt::Display for FieldLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)?;
        if let Some(attribute) = &self.attribute {
            if !self.path.steps.is_empty() {
                f.write_str("/")?;
            }
            write!(f, "@{attribute}")?;
        }
        Ok(())
    }
}
