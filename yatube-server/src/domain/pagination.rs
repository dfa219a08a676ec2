use serde::Serialize;

/// Splits a listing of `total` items into pages of `per_page`.
///
/// An empty listing still has one (empty) page, so page 1 is always valid.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Paginator {
    total: i64,
    per_page: u32,
}

impl Paginator {
    pub(crate) fn new(total: i64, per_page: u32) -> Self {
        Self {
            total: total.max(0),
            per_page: per_page.max(1),
        }
    }

    pub(crate) fn num_pages(&self) -> u32 {
        let per_page = i64::from(self.per_page);
        let pages = (self.total + per_page - 1) / per_page;
        u32::try_from(pages.max(1)).unwrap_or(u32::MAX)
    }

    /// Resolves a raw `?page=` value: anything that is not an integer means
    /// the first page, an integer out of range means the last one.
    pub(crate) fn page_number(&self, raw: Option<&str>) -> u32 {
        let Some(number) = raw.and_then(parse_page_number) else {
            return 1;
        };

        let last = self.num_pages();
        match u32::try_from(number) {
            Ok(number) if (1..=last).contains(&number) => number,
            _ => last,
        }
    }

    pub(crate) fn per_page(&self) -> u32 {
        self.per_page
    }

    pub(crate) fn total(&self) -> i64 {
        self.total
    }
}

fn parse_page_number(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(number) = raw.parse::<i64>() {
        return Some(number);
    }
    // "2.0" is accepted as page 2, "2.5" is not a page number.
    let float = raw.parse::<f64>().ok()?;
    (float.is_finite() && float.fract() == 0.0).then_some(float as i64)
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct Page<T> {
    pub(crate) items: Vec<T>,
    pub(crate) number: u32,
    pub(crate) num_pages: u32,
    pub(crate) total: i64,
}

impl<T> Page<T> {
    pub(crate) fn new(items: Vec<T>, number: u32, paginator: &Paginator) -> Self {
        Self {
            items,
            number,
            num_pages: paginator.num_pages(),
            total: paginator.total(),
        }
    }

    pub(crate) fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub(crate) fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub(crate) fn previous_page_number(&self) -> Option<u32> {
        self.has_previous().then(|| self.number - 1)
    }

    pub(crate) fn next_page_number(&self) -> Option<u32> {
        self.has_next().then(|| self.number + 1)
    }

    pub(crate) fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            num_pages: self.num_pages,
            total: self.total,
        }
    }
}
