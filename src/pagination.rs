//! Fixed-size paging of ordered collections.
//!
//! Page numbers are 1-based and come straight from the `?page=` query
//! parameter. Anything that is not an integer selects the first page; an
//! integer outside `1..=num_pages` selects the last one. Requesting a page
//! never fails.

use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    count: u64,
    per_page: u64,
}

impl Paginator {
    pub fn new(count: u64, per_page: u32) -> Self {
        Self {
            count,
            per_page: u64::from(per_page.max(1)),
        }
    }

    /// An empty collection still has one (empty) page.
    pub fn num_pages(&self) -> u64 {
        if self.count == 0 {
            1
        } else {
            self.count.div_ceil(self.per_page)
        }
    }

    pub fn resolve(&self, requested: Option<&str>) -> u64 {
        let Some(raw) = requested.map(str::trim) else {
            return 1;
        };

        match raw.parse::<i64>() {
            Ok(number) if number >= 1 && number as u64 <= self.num_pages() => number as u64,
            Ok(_) => self.num_pages(),
            // too many digits for i64 is still an integer, just out of range
            Err(_) if is_integer(raw) => self.num_pages(),
            Err(_) => 1,
        }
    }

    pub fn window(&self, number: u64) -> PageWindow {
        PageWindow {
            number,
            limit: self.per_page as i64,
            offset: ((number - 1) * self.per_page) as i64,
        }
    }

    pub fn page<T>(&self, window: PageWindow, object_list: Vec<T>) -> Page<T> {
        let number = window.number;
        let num_pages = self.num_pages();
        let has_next = number < num_pages;
        let has_previous = number > 1;

        let start_index = if self.count == 0 {
            0
        } else {
            self.per_page * (number - 1) + 1
        };
        let end_index = if number == num_pages {
            self.count
        } else {
            number * self.per_page
        };

        Page {
            object_list,
            number,
            num_pages,
            count: self.count,
            has_next,
            has_previous,
            has_other_pages: has_next || has_previous,
            next_page_number: has_next.then_some(number + 1),
            previous_page_number: has_previous.then(|| number - 1),
            start_index,
            end_index,
        }
    }
}

/// The slice of rows a page covers, ready to bind as `LIMIT ? OFFSET ?`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: u64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub object_list: Vec<T>,
    pub number: u64,
    pub num_pages: u64,
    pub count: u64,
    pub has_next: bool,
    pub has_previous: bool,
    pub has_other_pages: bool,
    pub next_page_number: Option<u64>,
    pub previous_page_number: Option<u64>,
    pub start_index: u64,
    pub end_index: u64,
}

fn is_integer(raw: &str) -> bool {
    let digits = raw.strip_prefix(['+', '-']).unwrap_or(raw);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}
